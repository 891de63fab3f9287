use anyhow::Result;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;

use letrio_db::models::{combination_key, Draw};

use crate::cascade::cascade;
use crate::frequency::{combination_frequencies, FrequencyConfig};
use crate::validator::{validate, RuleConfig, RuleSet};

#[derive(Debug, Clone)]
pub struct Suggestion {
    pub digits: [u8; 3],
    pub pattern: String,
    pub cascade_number: u8,
    /// Poids relatif au candidat moyen (1.0 = neutre).
    pub score: f64,
}

/// Tous les jeux admis par la famille de règles : triplets triés pour les
/// familles COMBO, vecteurs ordonnés pour STRAIGHT. L'espace est petit,
/// l'énumération directe suffit.
pub fn enumerate_valid_plays(rules: RuleSet, cfg: &RuleConfig) -> Vec<[u8; 3]> {
    let mut plays = Vec::new();
    if rules.is_unordered() {
        for a in 0..=9u8 {
            for b in (a + 1)..=9u8 {
                for c in (b + 1)..=9u8 {
                    let trio = [a, b, c];
                    if validate(&trio, rules, cfg).valid {
                        plays.push(trio);
                    }
                }
            }
        }
    } else {
        for a in 0..=9u8 {
            for b in 0..=9u8 {
                for c in 0..=9u8 {
                    let trio = [a, b, c];
                    if validate(&trio, rules, cfg).valid {
                        plays.push(trio);
                    }
                }
            }
        }
    }
    plays
}

/// Tire `count` jeux distincts parmi les jeux valides, pondérés par la
/// fréquence lissée observée dans le corpus (échantillonnage sans remise,
/// reproductible par seed).
pub fn generate_suggestions(
    draws: &[Draw],
    rules: RuleSet,
    rule_cfg: &RuleConfig,
    freq_cfg: &FrequencyConfig,
    count: usize,
    seed: Option<u64>,
) -> Result<Vec<Suggestion>> {
    let mut rng: StdRng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    let plays = enumerate_valid_plays(rules, rule_cfg);
    if plays.is_empty() {
        return Ok(Vec::new());
    }

    let (frequencies, _, _) = combination_frequencies(draws, freq_cfg);

    // Poids : fréquence lissée (+1), clé canonique quelle que soit la famille
    let mut available: Vec<([u8; 3], f64)> = plays
        .iter()
        .map(|&play| {
            let mut sorted = play;
            sorted.sort();
            let observed = frequencies
                .get(&combination_key(&sorted))
                .map(|f| f.count)
                .unwrap_or(0);
            (play, observed as f64 + 1.0)
        })
        .collect();

    let mean_weight: f64 =
        available.iter().map(|(_, w)| w).sum::<f64>() / available.len() as f64;

    let picks = count.min(available.len());
    let mut suggestions = Vec::with_capacity(picks);
    for _ in 0..picks {
        let weights: Vec<f64> = available.iter().map(|(_, w)| *w).collect();
        let dist = WeightedIndex::new(&weights)?;
        let idx = dist.sample(&mut rng);
        let (digits, weight) = available.remove(idx);

        let outcome = validate(&digits, rules, rule_cfg);
        let pattern = outcome
            .pattern
            .map(|p| p.to_string())
            .unwrap_or_default();
        let cascade_number = cascade(&digits).unwrap_or(0);

        suggestions.push(Suggestion {
            digits,
            pattern,
            cascade_number,
            score: weight / mean_weight,
        });
    }

    Ok(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::make_test_draws;

    fn cfgs() -> (RuleConfig, FrequencyConfig) {
        (RuleConfig::default(), FrequencyConfig::combinations())
    }

    #[test]
    fn test_enumerate_unordered_plays_all_valid() {
        let (rule_cfg, _) = cfgs();
        let plays = enumerate_valid_plays(RuleSet::UnorderedStrict, &rule_cfg);
        assert!(!plays.is_empty());
        for play in &plays {
            assert!(validate(play, RuleSet::UnorderedStrict, &rule_cfg).valid);
            assert!(play[0] < play[1] && play[1] < play[2]);
        }
    }

    #[test]
    fn test_range_spread_is_subset_of_strict() {
        let (rule_cfg, _) = cfgs();
        let strict = enumerate_valid_plays(RuleSet::UnorderedStrict, &rule_cfg);
        let spread = enumerate_valid_plays(RuleSet::UnorderedRangeSpread, &rule_cfg);
        assert!(spread.len() < strict.len());
        for play in &spread {
            assert!(strict.contains(play));
        }
    }

    #[test]
    fn test_ordered_plays_include_permutations() {
        let (rule_cfg, _) = cfgs();
        let plays = enumerate_valid_plays(RuleSet::Ordered, &rule_cfg);
        assert!(plays.contains(&[1, 2, 8]));
        assert!(plays.contains(&[8, 1, 2]));
    }

    #[test]
    fn test_suggestions_are_distinct_and_reproducible() {
        let draws = make_test_draws(80);
        let (rule_cfg, freq_cfg) = cfgs();
        let a = generate_suggestions(&draws, RuleSet::UnorderedStrict, &rule_cfg, &freq_cfg, 5, Some(42))
            .unwrap();
        let b = generate_suggestions(&draws, RuleSet::UnorderedStrict, &rule_cfg, &freq_cfg, 5, Some(42))
            .unwrap();
        assert_eq!(a.len(), 5);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.digits, y.digits);
        }
        for i in 0..a.len() {
            for j in (i + 1)..a.len() {
                assert_ne!(a[i].digits, a[j].digits);
            }
        }
    }

    #[test]
    fn test_suggestions_annotated() {
        let draws = make_test_draws(50);
        let (rule_cfg, freq_cfg) = cfgs();
        let suggestions =
            generate_suggestions(&draws, RuleSet::UnorderedStrict, &rule_cfg, &freq_cfg, 3, Some(7))
                .unwrap();
        for s in &suggestions {
            assert!(s.pattern == "BBA" || s.pattern == "BAA", "motif {}", s.pattern);
            assert!(s.cascade_number <= 9);
            assert!(s.score > 0.0);
        }
    }

    #[test]
    fn test_count_capped_by_play_space() {
        let draws = make_test_draws(30);
        let (rule_cfg, freq_cfg) = cfgs();
        let all = enumerate_valid_plays(RuleSet::UnorderedRangeSpread, &rule_cfg).len();
        let suggestions = generate_suggestions(
            &draws,
            RuleSet::UnorderedRangeSpread,
            &rule_cfg,
            &freq_cfg,
            1000,
            Some(1),
        )
        .unwrap();
        assert_eq!(suggestions.len(), all);
    }

    #[test]
    fn test_empty_corpus_still_suggests() {
        let (rule_cfg, freq_cfg) = cfgs();
        let suggestions =
            generate_suggestions(&[], RuleSet::UnorderedStrict, &rule_cfg, &freq_cfg, 4, Some(9))
                .unwrap();
        assert_eq!(suggestions.len(), 4);
    }
}
