use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use letrio_db::models::Draw;

use crate::cascade::cascade;
use crate::fireball::substitute;
use crate::frequency::{combination_frequencies, Frequency, FrequencyCategory, FrequencyConfig};
use crate::pattern::UnorderedPattern;
use crate::validator::{positional_diff, validate, RuleConfig, RuleSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Key,
    Count,
    Percentage,
    Recency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternStat {
    pub count: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorStats {
    pub passed: u32,
    pub pass_percentage: f64,
    /// Tirages porteurs d'un fireball.
    pub draws_with_fireball: u32,
    /// Tirages dont au moins une substitution fireball passe.
    pub fireball_passed: u32,
    pub fireball_pass_percentage: f64,
    /// Substitutions gagnantes cumulées (0 à 3 par tirage).
    pub fireball_substitutions_passed: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CascadeStats {
    pub overall: BTreeMap<u8, u32>,
    pub per_pattern: BTreeMap<String, BTreeMap<u8, u32>>,
    /// Distribution restreinte aux tirages qui passent le validateur.
    pub passing_only: BTreeMap<u8, u32>,
}

/// Rapport d'une passe d'analyse : totalité du corpus réduit en une fois,
/// sans jamais relire un résultat précédent. Toutes les tables sont des
/// BTreeMap pour une sérialisation identique octet à octet d'une passe à
/// l'autre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub rules: RuleSet,
    pub total_draws: u32,
    /// Tirages bien formés, dénominateur des pourcentages.
    pub analyzed_draws: u32,
    /// Tirages écartés (signal d'avertissement, jamais bloquant).
    pub skipped_draws: u32,
    pub valid_draws: u32,
    pub unique_combinations: u32,
    pub patterns: BTreeMap<String, PatternStat>,
    /// Histogramme des écarts de position, par motif.
    pub diff_histograms: BTreeMap<String, BTreeMap<u8, u32>>,
    pub validator: ValidatorStats,
    pub cascade: CascadeStats,
    pub combinations: BTreeMap<String, Frequency>,
}

fn percentage(count: u32, total: u32) -> f64 {
    if total > 0 {
        count as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// Analyse complète du corpus sous une famille de règles. Une seule passe ;
/// un corpus vide produit un rapport à zéro, pas une erreur.
pub fn analyze(
    draws: &[Draw],
    rules: RuleSet,
    rule_cfg: &RuleConfig,
    freq_cfg: &FrequencyConfig,
) -> AnalysisReport {
    let mut pattern_counts: BTreeMap<String, u32> = BTreeMap::new();
    let mut diff_histograms: BTreeMap<String, BTreeMap<u8, u32>> = BTreeMap::new();
    let mut cascade_stats = CascadeStats::default();
    let mut analyzed = 0u32;
    let mut skipped = 0u32;
    let mut valid = 0u32;
    let mut draws_with_fireball = 0u32;
    let mut fireball_passed = 0u32;
    let mut fireball_substitutions = 0u32;

    for draw in draws {
        if !draw.is_well_formed() {
            skipped += 1;
            continue;
        }
        analyzed += 1;

        // Les familles COMBO travaillent sur le triplet trié, STRAIGHT sur
        // l'ordre de sortie — l'analyse suit le même vecteur
        let digits = if rules.is_unordered() {
            draw.sorted_digits
        } else {
            draw.original_digits
        };

        let outcome = validate(&digits, rules, rule_cfg);
        if outcome.valid {
            valid += 1;
        }

        if let Some(pattern) = outcome.pattern {
            let bucket = pattern.to_string();
            *pattern_counts.entry(bucket.clone()).or_insert(0) += 1;

            if let Some(diff) = positional_diff(&digits, rules) {
                *diff_histograms
                    .entry(bucket.clone())
                    .or_default()
                    .entry(diff)
                    .or_insert(0) += 1;
            }

            if let Ok(digest) = cascade(&digits) {
                *cascade_stats.overall.entry(digest).or_insert(0) += 1;
                *cascade_stats
                    .per_pattern
                    .entry(bucket)
                    .or_default()
                    .entry(digest)
                    .or_insert(0) += 1;
                if outcome.valid {
                    *cascade_stats.passing_only.entry(digest).or_insert(0) += 1;
                }
            }
        }

        if let Some(fireball) = draw.fireball {
            draws_with_fireball += 1;
            let result = substitute(&digits, fireball, rules, rule_cfg);
            if result.has_valid_fireball {
                fireball_passed += 1;
            }
            fireball_substitutions += result.substitutions_passed as u32;
        }
    }

    let patterns: BTreeMap<String, PatternStat> = pattern_counts
        .into_iter()
        .map(|(key, count)| {
            (
                key,
                PatternStat {
                    count,
                    percentage: percentage(count, analyzed),
                },
            )
        })
        .collect();

    let (combinations, _, _) = combination_frequencies(draws, freq_cfg);

    AnalysisReport {
        rules,
        total_draws: draws.len() as u32,
        analyzed_draws: analyzed,
        skipped_draws: skipped,
        valid_draws: valid,
        unique_combinations: combinations.len() as u32,
        patterns,
        diff_histograms,
        validator: ValidatorStats {
            passed: valid,
            pass_percentage: percentage(valid, analyzed),
            draws_with_fireball,
            fireball_passed,
            fireball_pass_percentage: percentage(fireball_passed, draws_with_fireball),
            fireball_substitutions_passed: fireball_substitutions,
        },
        cascade: cascade_stats,
        combinations,
    }
}

/// Vue triée/filtrée des combinaisons du rapport, sans relancer
/// l'agrégation.
pub fn combination_view<'a>(
    report: &'a AnalysisReport,
    sort: SortKey,
    order: SortOrder,
    pattern: Option<UnorderedPattern>,
    category: Option<FrequencyCategory>,
    limit: usize,
) -> Vec<(&'a str, &'a Frequency)> {
    let mut view: Vec<(&str, &Frequency)> = report
        .combinations
        .iter()
        .filter(|(key, freq)| {
            if let Some(cat) = category {
                if freq.category != cat {
                    return false;
                }
            }
            if let Some(p) = pattern {
                match key_pattern(key) {
                    Some(kp) => kp == p,
                    None => false,
                }
            } else {
                true
            }
        })
        .map(|(key, freq)| (key.as_str(), freq))
        .collect();

    view.sort_by(|a, b| {
        let ord = match sort {
            SortKey::Key => a.0.cmp(b.0),
            SortKey::Count => a.1.count.cmp(&b.1.count).then(a.0.cmp(b.0)),
            SortKey::Percentage => a
                .1
                .percentage
                .partial_cmp(&b.1.percentage)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(b.0)),
            SortKey::Recency => a
                .1
                .draws_since_last
                .cmp(&b.1.draws_since_last)
                .then(a.0.cmp(b.0)),
        };
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    view.truncate(limit);
    view
}

/// Motif non ordonné d'une clé canonique "a-b-c".
pub fn key_pattern(key: &str) -> Option<UnorderedPattern> {
    let parts: Vec<u8> = key.split('-').filter_map(|s| s.parse().ok()).collect();
    if parts.len() != 3 {
        return None;
    }
    UnorderedPattern::of(&[parts[0], parts[1], parts[2]]).ok()
}

pub fn save_report(report: &AnalysisReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .context("Impossible de sérialiser le rapport")?;
    std::fs::write(path, json)
        .with_context(|| format!("Impossible d'écrire le rapport dans {:?}", path))?;
    Ok(())
}

pub fn load_report(path: &Path) -> Result<AnalysisReport> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire le rapport {:?}", path))?;
    let report: AnalysisReport =
        serde_json::from_str(&json).context("Rapport illisible")?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::make_test_draws;

    fn run(n: usize, rules: RuleSet) -> AnalysisReport {
        analyze(
            &make_test_draws(n),
            rules,
            &RuleConfig::default(),
            &FrequencyConfig::combinations(),
        )
    }

    #[test]
    fn test_pattern_counts_cover_analyzed_draws() {
        let report = run(200, RuleSet::UnorderedStrict);
        assert_eq!(report.total_draws, 200);
        assert_eq!(report.skipped_draws, 0);
        let pattern_sum: u32 = report.patterns.values().map(|p| p.count).sum();
        assert_eq!(pattern_sum, report.analyzed_draws);
        let pct_sum: f64 = report.patterns.values().map(|p| p.percentage).sum();
        assert!((pct_sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_cascade_distributions_consistent() {
        let report = run(150, RuleSet::UnorderedStrict);
        let overall_sum: u32 = report.cascade.overall.values().sum();
        assert_eq!(overall_sum, report.analyzed_draws);
        let per_pattern_sum: u32 = report
            .cascade
            .per_pattern
            .values()
            .flat_map(|m| m.values())
            .sum();
        assert_eq!(per_pattern_sum, overall_sum);
        let passing_sum: u32 = report.cascade.passing_only.values().sum();
        assert_eq!(passing_sum, report.valid_draws);
        for digest in report.cascade.overall.keys() {
            assert!(*digest <= 9);
        }
    }

    #[test]
    fn test_validator_stats() {
        let report = run(120, RuleSet::UnorderedStrict);
        assert!(report.valid_draws <= report.analyzed_draws);
        assert_eq!(report.validator.passed, report.valid_draws);
        assert!(report.validator.fireball_passed <= report.validator.draws_with_fireball);
        assert!(
            report.validator.fireball_substitutions_passed
                >= report.validator.fireball_passed
        );
    }

    #[test]
    fn test_diff_histograms_only_for_split_patterns() {
        let report = run(200, RuleSet::UnorderedStrict);
        assert!(!report.diff_histograms.contains_key("BBB"));
        assert!(!report.diff_histograms.contains_key("AAA"));
        for (pattern, histogram) in &report.diff_histograms {
            let sum: u32 = histogram.values().sum();
            assert_eq!(
                Some(sum),
                report.patterns.get(pattern).map(|p| p.count),
                "motif {}",
                pattern
            );
        }
    }

    #[test]
    fn test_ordered_analysis_buckets_by_permutation() {
        let report = run(200, RuleSet::Ordered);
        for key in report.patterns.keys() {
            assert_eq!(key.len(), 3);
            assert!(key.chars().all(|c| c == 'A' || c == 'B'));
        }
        // Jusqu'à 8 permutations
        assert!(report.patterns.len() <= 8);
    }

    #[test]
    fn test_empty_corpus_zero_report() {
        let report = analyze(
            &[],
            RuleSet::UnorderedStrict,
            &RuleConfig::default(),
            &FrequencyConfig::combinations(),
        );
        assert_eq!(report.total_draws, 0);
        assert_eq!(report.valid_draws, 0);
        assert_eq!(report.unique_combinations, 0);
        assert!(report.patterns.is_empty());
        assert!(report.combinations.is_empty());
        assert_eq!(report.validator.pass_percentage, 0.0);
    }

    #[test]
    fn test_combination_view_sort_filter_limit() {
        let report = run(180, RuleSet::UnorderedStrict);
        let top = combination_view(&report, SortKey::Count, SortOrder::Desc, None, None, 5);
        assert!(top.len() <= 5);
        for w in top.windows(2) {
            assert!(w[0].1.count >= w[1].1.count);
        }
        let bba = combination_view(
            &report,
            SortKey::Key,
            SortOrder::Asc,
            Some(UnorderedPattern::Bba),
            None,
            1000,
        );
        for (key, _) in bba {
            assert_eq!(key_pattern(key), Some(UnorderedPattern::Bba));
        }
    }

    #[test]
    fn test_key_pattern() {
        assert_eq!(key_pattern("1-4-8"), Some(UnorderedPattern::Bba));
        assert_eq!(key_pattern("5-7-9"), Some(UnorderedPattern::Aaa));
        assert_eq!(key_pattern("1-4"), None);
    }

    #[test]
    fn test_report_idempotent_byte_identical() {
        let draws = make_test_draws(100);
        let cfg = RuleConfig::default();
        let freq = FrequencyConfig::combinations();
        let a = analyze(&draws, RuleSet::UnorderedStrict, &cfg, &freq);
        let b = analyze(&draws, RuleSet::UnorderedStrict, &cfg, &freq);
        let ja = serde_json::to_string(&a).unwrap();
        let jb = serde_json::to_string(&b).unwrap();
        assert_eq!(ja, jb);
    }

    #[test]
    fn test_save_and_load_report_roundtrip() {
        let report = run(60, RuleSet::UnorderedRangeSpread);
        let dir = std::env::temp_dir();
        let path = dir.join("letrio-report-test.json");
        save_report(&report, &path).unwrap();
        let loaded = load_report(&path).unwrap();
        assert_eq!(loaded, report);
        let _ = std::fs::remove_file(&path);
    }
}
