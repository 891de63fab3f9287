use serde::{Deserialize, Serialize};

use crate::validator::{validate, PatternTag, RuleConfig, RuleSet};

/// Candidat retenu : position substituée, triplet résultant (retrié pour les
/// familles COMBO) et motif obtenu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireballDetail {
    pub position: usize,
    pub digits: [u8; 3],
    pub pattern: PatternTag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireballResult {
    pub has_valid_fireball: bool,
    pub substitutions_passed: u8,
    /// Seuls les candidats gagnants sont conservés.
    pub details: Vec<FireballDetail>,
}

impl FireballResult {
    fn none() -> Self {
        Self {
            has_valid_fireball: false,
            substitutions_passed: 0,
            details: Vec::new(),
        }
    }
}

/// Génère les 3 substitutions à une position du chiffre fireball et rejoue
/// le validateur sur chacune (même famille de règles que le tirage).
pub fn substitute(
    digits: &[u8; 3],
    fireball: u8,
    rules: RuleSet,
    cfg: &RuleConfig,
) -> FireballResult {
    if fireball > 9 {
        return FireballResult::none();
    }

    let mut result = FireballResult::none();
    for position in 0..3 {
        let mut candidate = *digits;
        candidate[position] = fireball;
        if rules.is_unordered() {
            candidate.sort();
        }
        let outcome = validate(&candidate, rules, cfg);
        if outcome.valid {
            result.substitutions_passed += 1;
            if let Some(pattern) = outcome.pattern {
                result.details.push(FireballDetail {
                    position,
                    digits: candidate,
                    pattern,
                });
            }
        }
    }
    result.has_valid_fireball = result.substitutions_passed > 0;
    result
}
