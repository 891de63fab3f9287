use serde::{Deserialize, Serialize};

use crate::pattern::{OrderedPattern, UnorderedPattern};

/// Famille de règles appliquée par le validateur générique. Les deux
/// variantes non ordonnées sont sélectionnables séparément : la variante
/// plage est historiquement antérieure et toujours exercée par les analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleSet {
    /// COMBO : multiset trié, motif BBA/BAA, écart de position borné.
    UnorderedStrict,
    /// COMBO + plage : exige en plus d0 ≤ range_low_max et d2 ≥ range_high_min.
    UnorderedRangeSpread,
    /// STRAIGHT : ordre de sortie, motif mixte, écart borné sur la paire
    /// de même catégorie.
    Ordered,
}

impl RuleSet {
    pub fn is_unordered(&self) -> bool {
        !matches!(self, RuleSet::Ordered)
    }
}

impl std::fmt::Display for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleSet::UnorderedStrict => write!(f, "COMBO"),
            RuleSet::UnorderedRangeSpread => write!(f, "COMBO-PLAGE"),
            RuleSet::Ordered => write!(f, "STRAIGHT"),
        }
    }
}

/// Seuils des règles, explicites pour que chaque variante soit testable
/// indépendamment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Écart maximal autorisé entre les deux positions de même catégorie.
    pub max_diff: u8,
    /// Variante plage : borne supérieure du premier chiffre trié.
    pub range_low_max: u8,
    /// Variante plage : borne inférieure du dernier chiffre trié.
    pub range_high_min: u8,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            max_diff: 2,
            range_low_max: 2,
            range_high_min: 7,
        }
    }
}

/// Motif attaché à une issue de validation : non ordonné pour les familles
/// COMBO, ordonné pour STRAIGHT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternTag {
    Unordered(UnorderedPattern),
    Ordered(OrderedPattern),
}

impl std::fmt::Display for PatternTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternTag::Unordered(p) => write!(f, "{}", p),
            PatternTag::Ordered(p) => write!(f, "{}", p),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reject {
    /// Longueur ≠ 3 ou chiffre hors 0-9.
    Malformed,
    /// Chiffre présent deux fois ou plus.
    Repeating,
    /// Motif hors de la famille admise.
    Pattern(PatternTag),
    /// Écart de position au-dessus du seuil.
    Spread { diff: u8, max: u8 },
    /// Variante plage : bornes basse/haute non respectées.
    RangeSpread { low: u8, high: u8 },
}

impl std::fmt::Display for Reject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reject::Malformed => write!(f, "entrée invalide (3 chiffres 0-9 attendus)"),
            Reject::Repeating => write!(f, "chiffre répété"),
            Reject::Pattern(p) => write!(f, "motif {} non admis", p),
            Reject::Spread { diff, max } => write!(f, "écart {} > {}", diff, max),
            Reject::RangeSpread { low, high } => {
                write!(f, "plage {}-{} hors bornes", low, high)
            }
        }
    }
}

/// Issue totale : toute entrée, bien formée ou non, produit exactement une
/// issue — jamais de panique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub pattern: Option<PatternTag>,
    pub reason: Option<Reject>,
}

impl ValidationOutcome {
    fn pass(pattern: PatternTag) -> Self {
        Self {
            valid: true,
            pattern: Some(pattern),
            reason: None,
        }
    }

    fn fail(reason: Reject, pattern: Option<PatternTag>) -> Self {
        Self {
            valid: false,
            pattern,
            reason: Some(reason),
        }
    }
}

fn well_formed(digits: &[u8]) -> Option<[u8; 3]> {
    if digits.len() != 3 {
        return None;
    }
    let trio = [digits[0], digits[1], digits[2]];
    if trio.iter().any(|&d| d > 9) {
        return None;
    }
    Some(trio)
}

fn has_repeat(trio: &[u8; 3]) -> bool {
    trio[0] == trio[1] || trio[0] == trio[2] || trio[1] == trio[2]
}

/// Validateur générique : une chaîne ordonnée de vérifications à
/// court-circuit, paramétrée par la famille de règles.
pub fn validate(digits: &[u8], rules: RuleSet, cfg: &RuleConfig) -> ValidationOutcome {
    let Some(trio) = well_formed(digits) else {
        return ValidationOutcome::fail(Reject::Malformed, None);
    };
    match rules {
        RuleSet::UnorderedStrict | RuleSet::UnorderedRangeSpread => {
            validate_unordered(trio, rules, cfg)
        }
        RuleSet::Ordered => validate_ordered(trio, cfg),
    }
}

fn validate_unordered(mut trio: [u8; 3], rules: RuleSet, cfg: &RuleConfig) -> ValidationOutcome {
    // Les familles COMBO travaillent sur la représentation triée
    trio.sort();
    let pattern = match UnorderedPattern::of(&trio) {
        Ok(p) => PatternTag::Unordered(p),
        Err(_) => return ValidationOutcome::fail(Reject::Malformed, None),
    };

    if has_repeat(&trio) {
        // Le motif reste attaché pour le diagnostic
        return ValidationOutcome::fail(Reject::Repeating, Some(pattern));
    }

    let diff = match pattern {
        PatternTag::Unordered(UnorderedPattern::Bba) => trio[1] - trio[0],
        PatternTag::Unordered(UnorderedPattern::Baa) => trio[2] - trio[1],
        _ => return ValidationOutcome::fail(Reject::Pattern(pattern), Some(pattern)),
    };

    if diff > cfg.max_diff {
        return ValidationOutcome::fail(
            Reject::Spread {
                diff,
                max: cfg.max_diff,
            },
            Some(pattern),
        );
    }

    if rules == RuleSet::UnorderedRangeSpread
        && (trio[0] > cfg.range_low_max || trio[2] < cfg.range_high_min)
    {
        return ValidationOutcome::fail(
            Reject::RangeSpread {
                low: trio[0],
                high: trio[2],
            },
            Some(pattern),
        );
    }

    ValidationOutcome::pass(pattern)
}

fn validate_ordered(trio: [u8; 3], cfg: &RuleConfig) -> ValidationOutcome {
    let ordered = match OrderedPattern::of(&trio) {
        Ok(p) => p,
        Err(_) => return ValidationOutcome::fail(Reject::Malformed, None),
    };
    let pattern = PatternTag::Ordered(ordered);

    if has_repeat(&trio) {
        return ValidationOutcome::fail(Reject::Repeating, Some(pattern));
    }

    // BBB et AAA échouent toujours en STRAIGHT
    if !ordered.is_mixed() {
        return ValidationOutcome::fail(Reject::Pattern(pattern), Some(pattern));
    }

    // Un partage 2:1 garantit exactement une paire de positions de même
    // catégorie ; l'écart s'applique à cette paire.
    let cats = ordered.categories();
    let mut same_pair: Option<(usize, usize)> = None;
    for i in 0..3 {
        for j in (i + 1)..3 {
            if cats[i] == cats[j] {
                same_pair = Some((i, j));
            }
        }
    }
    let Some((i, j)) = same_pair else {
        return ValidationOutcome::fail(Reject::Pattern(pattern), Some(pattern));
    };

    let diff = trio[i].abs_diff(trio[j]);
    if diff > cfg.max_diff {
        return ValidationOutcome::fail(
            Reject::Spread {
                diff,
                max: cfg.max_diff,
            },
            Some(pattern),
        );
    }

    ValidationOutcome::pass(pattern)
}

/// Écart de position soumis au seuil pour un triplet bien formé, selon la
/// famille de règles. None pour les motifs purs, les doublons ou une entrée
/// hors limites.
pub fn positional_diff(digits: &[u8; 3], rules: RuleSet) -> Option<u8> {
    let mut trio = *digits;
    if trio.iter().any(|&d| d > 9) {
        return None;
    }
    match rules {
        RuleSet::UnorderedStrict | RuleSet::UnorderedRangeSpread => {
            trio.sort();
            match UnorderedPattern::of(&trio).ok()? {
                UnorderedPattern::Bba => Some(trio[1] - trio[0]),
                UnorderedPattern::Baa => Some(trio[2] - trio[1]),
                _ => None,
            }
        }
        RuleSet::Ordered => {
            let ordered = OrderedPattern::of(&trio).ok()?;
            if !ordered.is_mixed() || has_repeat(&trio) {
                return None;
            }
            let cats = ordered.categories();
            for i in 0..3 {
                for j in (i + 1)..3 {
                    if cats[i] == cats[j] {
                        return Some(trio[i].abs_diff(trio[j]));
                    }
                }
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> RuleConfig {
        RuleConfig::default()
    }

    #[test]
    fn test_combo_pass() {
        let out = validate(&[1, 3, 8], RuleSet::UnorderedStrict, &cfg());
        assert!(out.valid);
        assert_eq!(
            out.pattern,
            Some(PatternTag::Unordered(UnorderedPattern::Bba))
        );
        assert!(out.reason.is_none());
    }

    #[test]
    fn test_combo_insensitive_to_input_order() {
        let a = validate(&[8, 1, 3], RuleSet::UnorderedStrict, &cfg());
        let b = validate(&[1, 3, 8], RuleSet::UnorderedStrict, &cfg());
        assert_eq!(a, b);
    }

    #[test]
    fn test_combo_spread_too_wide() {
        // BBA mais 4-1=3 > 2
        let out = validate(&[1, 4, 8], RuleSet::UnorderedStrict, &cfg());
        assert!(!out.valid);
        assert_eq!(out.reason, Some(Reject::Spread { diff: 3, max: 2 }));
    }

    #[test]
    fn test_combo_baa_spread_check_on_high_pair() {
        // BAA : écart vérifié entre d1 et d2
        assert!(validate(&[1, 7, 9], RuleSet::UnorderedStrict, &cfg()).valid);
        let out = validate(&[1, 5, 9], RuleSet::UnorderedStrict, &cfg());
        assert_eq!(out.reason, Some(Reject::Spread { diff: 4, max: 2 }));
    }

    #[test]
    fn test_combo_rejects_pure_patterns() {
        let out = validate(&[0, 1, 2], RuleSet::UnorderedStrict, &cfg());
        assert!(!out.valid);
        assert_eq!(
            out.reason,
            Some(Reject::Pattern(PatternTag::Unordered(UnorderedPattern::Bbb)))
        );
        assert!(!validate(&[5, 7, 9], RuleSet::UnorderedStrict, &cfg()).valid);
    }

    #[test]
    fn test_combo_repeating_keeps_pattern() {
        let out = validate(&[4, 4, 8], RuleSet::UnorderedStrict, &cfg());
        assert!(!out.valid);
        assert_eq!(out.reason, Some(Reject::Repeating));
        assert_eq!(
            out.pattern,
            Some(PatternTag::Unordered(UnorderedPattern::Bba))
        );
    }

    #[test]
    fn test_validator_totality() {
        // Toute entrée malformée produit une issue structurée, jamais de panique
        let malformed: [&[u8]; 6] = [
            &[],
            &[1],
            &[1, 2],
            &[1, 2, 3, 4],
            &[1, 4, 18],
            &[255, 255, 255],
        ];
        for rules in [
            RuleSet::UnorderedStrict,
            RuleSet::UnorderedRangeSpread,
            RuleSet::Ordered,
        ] {
            for input in malformed {
                let out = validate(input, rules, &cfg());
                assert!(!out.valid, "{:?} {:?}", rules, input);
                assert_eq!(out.reason, Some(Reject::Malformed));
            }
        }
    }

    #[test]
    fn test_range_spread_variant() {
        // Passe la variante stricte mais pas la plage (d0=3 > 2)
        assert!(validate(&[3, 5, 6], RuleSet::UnorderedStrict, &cfg()).valid);
        let out = validate(&[3, 5, 6], RuleSet::UnorderedRangeSpread, &cfg());
        assert!(!out.valid);
        assert_eq!(out.reason, Some(Reject::RangeSpread { low: 3, high: 6 }));

        // Plage respectée : d0 ≤ 2 et d2 ≥ 7
        assert!(validate(&[0, 2, 8], RuleSet::UnorderedRangeSpread, &cfg()).valid);
        assert!(validate(&[1, 7, 9], RuleSet::UnorderedRangeSpread, &cfg()).valid);
    }

    #[test]
    fn test_straight_pass_and_pair_selection() {
        // BAB : paire B aux positions 0 et 2, |1-2|=1
        let out = validate(&[1, 8, 2], RuleSet::Ordered, &cfg());
        assert!(out.valid);
        assert_eq!(out.pattern.unwrap().to_string(), "BAB");
    }

    #[test]
    fn test_straight_spread_on_same_category_pair() {
        // BBA : paire B aux positions 0 et 1, |0-4|=4 > 2
        let out = validate(&[0, 4, 9], RuleSet::Ordered, &cfg());
        assert!(!out.valid);
        assert_eq!(out.reason, Some(Reject::Spread { diff: 4, max: 2 }));
    }

    #[test]
    fn test_straight_rejects_pure_patterns() {
        let out = validate(&[0, 1, 2], RuleSet::Ordered, &cfg());
        assert_eq!(
            out.reason,
            Some(Reject::Pattern(PatternTag::Ordered(
                OrderedPattern::of(&[0, 1, 2]).unwrap()
            )))
        );
        assert!(!validate(&[9, 7, 5], RuleSet::Ordered, &cfg()).valid);
    }

    #[test]
    fn test_straight_all_mixed_permutations_reachable() {
        // Chaque permutation mixte possède un représentant valide
        let samples: [([u8; 3], &str); 6] = [
            ([1, 2, 8], "BBA"),
            ([1, 8, 2], "BAB"),
            ([8, 1, 2], "ABB"),
            ([1, 7, 8], "BAA"),
            ([7, 1, 8], "ABA"),
            ([7, 8, 1], "AAB"),
        ];
        for (digits, expected) in samples {
            let out = validate(&digits, RuleSet::Ordered, &cfg());
            assert!(out.valid, "{:?}", digits);
            assert_eq!(out.pattern.unwrap().to_string(), expected);
        }
    }

    #[test]
    fn test_custom_max_diff() {
        let wide = RuleConfig {
            max_diff: 3,
            ..RuleConfig::default()
        };
        assert!(validate(&[1, 4, 8], RuleSet::UnorderedStrict, &wide).valid);
    }

    #[test]
    fn test_reject_display() {
        let out = validate(&[1, 4, 8], RuleSet::UnorderedStrict, &cfg());
        assert_eq!(out.reason.unwrap().to_string(), "écart 3 > 2");
    }
}
