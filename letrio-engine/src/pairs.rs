use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use letrio_db::models::Draw;

use crate::frequency::{finalize, Frequency, FrequencyConfig, Occurrence, OccurrenceLog};
use crate::report::{SortKey, SortOrder};
use crate::validator::RuleConfig;

/// Axe d'appariement sur la représentation triée du tirage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairAxis {
    FirstSecond,
    FirstThird,
    SecondThird,
}

impl PairAxis {
    pub fn positions(&self) -> (usize, usize) {
        match self {
            PairAxis::FirstSecond => (0, 1),
            PairAxis::FirstThird => (0, 2),
            PairAxis::SecondThird => (1, 2),
        }
    }

    pub fn all() -> [PairAxis; 3] {
        [
            PairAxis::FirstSecond,
            PairAxis::FirstThird,
            PairAxis::SecondThird,
        ]
    }
}

impl std::fmt::Display for PairAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PairAxis::FirstSecond => write!(f, "first-second"),
            PairAxis::FirstThird => write!(f, "first-third"),
            PairAxis::SecondThird => write!(f, "second-third"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PairCategory {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for PairCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PairCategory::High => write!(f, "high"),
            PairCategory::Medium => write!(f, "medium"),
            PairCategory::Low => write!(f, "low"),
        }
    }
}

/// Clé canonique "min-max" d'une paire de chiffres distincts.
pub fn pair_key(low: u8, high: u8) -> String {
    format!("{}-{}", low, high)
}

/// Paire canonique, ou None si les chiffres sont égaux ou hors 0-9.
pub fn canonical_pair(a: u8, b: u8) -> Option<(u8, u8)> {
    if a > 9 || b > 9 || a == b {
        return None;
    }
    Some((a.min(b), a.max(b)))
}

/// Nombre de chiffres pouvant compléter la paire en un tirage valide sous
/// les règles COMBO, en forme fermée (aucune recherche). m = écart maximal.
pub fn possible_completions(low: u8, high: u8, axis: PairAxis, cfg: &RuleConfig) -> u8 {
    let m = cfg.max_diff;
    match axis {
        // La paire occupe les deux positions basses : le complément est le
        // chiffre haut du triplet.
        PairAxis::FirstSecond => {
            if high <= 4 {
                if high - low <= m {
                    5
                } else {
                    0
                }
            } else if low <= 4 {
                m.min(9 - high)
            } else {
                0
            }
        }
        // La paire encadre le triplet : le complément est le chiffre médian,
        // bas (BBA) ou haut (BAA).
        PairAxis::FirstThird => {
            if low > 4 || high < 5 {
                0
            } else {
                m.min(4 - low) + m.min(high - 5)
            }
        }
        // La paire occupe les deux positions hautes : le complément est le
        // premier chiffre.
        PairAxis::SecondThird => {
            if low >= 5 {
                if high - low <= m {
                    5
                } else {
                    0
                }
            } else if high >= 5 {
                m.min(low)
            } else {
                0
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairStat {
    pub low: u8,
    pub high: u8,
    pub key: String,
    pub count: u32,
    pub percentage: f64,
    pub possible_completions: u8,
    pub category: PairCategory,
    pub frequency: Frequency,
    /// Paires précédentes les plus fréquentes (clé, comptage), issues du
    /// seul historique embarqué.
    pub top_predecessors: Vec<(String, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairReport {
    pub axis: PairAxis,
    pub total_draws_for_axis: u32,
    pub skipped_draws: u32,
    /// Les 45 paires canoniques, toujours toutes présentes, par clé.
    pub pairs: Vec<PairStat>,
    /// Comptages de transition "paire précédente→paire courante", construits
    /// uniquement depuis previous_sorted[0] de chaque tirage.
    pub transitions: BTreeMap<String, u32>,
    /// Activité par chiffre sur chacune des deux positions suivies, cumulée
    /// sur les fenêtres d'historique embarquées.
    pub digit_activity: [[u32; 10]; 2],
}

const TOP_PREDECESSORS: usize = 3;

/// Analyse d'un axe de paires : fréquences, complétions possibles,
/// transitions et activité par chiffre. Une seule passe sur le corpus, les
/// transitions venant de l'instantané embarqué de chaque tirage (jamais
/// d'une relecture du corpus).
pub fn analyze_pairs(
    draws: &[Draw],
    axis: PairAxis,
    rule_cfg: &RuleConfig,
    freq_cfg: &FrequencyConfig,
) -> PairReport {
    let (p1, p2) = axis.positions();

    let mut logs: BTreeMap<String, OccurrenceLog> = BTreeMap::new();
    let mut transitions: BTreeMap<String, u32> = BTreeMap::new();
    let mut predecessors: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();
    let mut digit_activity = [[0u32; 10]; 2];
    let mut total = 0u32;
    let mut skipped = 0u32;

    for draw in draws {
        if !draw.is_well_formed() {
            skipped += 1;
            continue;
        }
        let Some((low, high)) = canonical_pair(draw.sorted_digits[p1], draw.sorted_digits[p2])
        else {
            // Paire dégénérée (chiffre doublé) : hors du total de l'axe
            skipped += 1;
            continue;
        };
        total += 1;
        let key = pair_key(low, high);
        logs.entry(key.clone()).or_default().push(
            Occurrence {
                index: draw.index,
                date: draw.date.clone(),
                month_key: draw.month_key(),
            },
            freq_cfg.occurrence_log_cap,
        );

        // Transition depuis la paire du tirage immédiatement précédent
        if let Some(prev) = draw.previous_sorted.first() {
            if let Some((pl, ph)) = canonical_pair(prev[p1], prev[p2]) {
                let prev_key = pair_key(pl, ph);
                *transitions
                    .entry(format!("{}→{}", prev_key, key))
                    .or_insert(0) += 1;
                *predecessors
                    .entry(key.clone())
                    .or_default()
                    .entry(prev_key)
                    .or_insert(0) += 1;
            }
        }

        // Activité par chiffre sur la fenêtre embarquée
        for prev in &draw.previous_sorted {
            if prev[p1] <= 9 {
                digit_activity[0][prev[p1] as usize] += 1;
            }
            if prev[p2] <= 9 {
                digit_activity[1][prev[p2] as usize] += 1;
            }
        }
    }

    // Part uniforme d'une paire parmi les 45 : base du marquage high/low
    let uniform = 100.0 / 45.0;
    let mut pairs = Vec::with_capacity(45);
    for low in 0..=9u8 {
        for high in (low + 1)..=9u8 {
            let key = pair_key(low, high);
            let log = logs.get(&key).cloned().unwrap_or_default();
            let frequency = finalize(&log, total, freq_cfg);

            let category = if total == 0 {
                PairCategory::Medium
            } else {
                let deviation = (frequency.percentage - uniform) / uniform;
                if deviation > 0.3 {
                    PairCategory::High
                } else if deviation < -0.3 {
                    PairCategory::Low
                } else {
                    PairCategory::Medium
                }
            };

            let mut top: Vec<(String, u32)> = predecessors
                .get(&key)
                .map(|m| m.iter().map(|(k, &v)| (k.clone(), v)).collect())
                .unwrap_or_default();
            top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            top.truncate(TOP_PREDECESSORS);

            pairs.push(PairStat {
                low,
                high,
                key,
                count: frequency.count,
                percentage: frequency.percentage,
                possible_completions: possible_completions(low, high, axis, rule_cfg),
                category,
                frequency,
                top_predecessors: top,
            });
        }
    }

    PairReport {
        axis,
        total_draws_for_axis: total,
        skipped_draws: skipped,
        pairs,
        transitions,
        digit_activity,
    }
}

/// Vue triée/filtrée de la table des paires, sans relancer l'agrégation.
pub fn pair_view<'a>(
    report: &'a PairReport,
    sort: SortKey,
    order: SortOrder,
    category: Option<PairCategory>,
    limit: usize,
) -> Vec<&'a PairStat> {
    let mut view: Vec<&PairStat> = report
        .pairs
        .iter()
        .filter(|p| category.map_or(true, |c| p.category == c))
        .collect();
    view.sort_by(|a, b| {
        let ord = match sort {
            SortKey::Key => (a.low, a.high).cmp(&(b.low, b.high)),
            SortKey::Count => a.count.cmp(&b.count).then((a.low, a.high).cmp(&(b.low, b.high))),
            SortKey::Percentage => a
                .percentage
                .partial_cmp(&b.percentage)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then((a.low, a.high).cmp(&(b.low, b.high))),
            SortKey::Recency => a
                .frequency
                .draws_since_last
                .cmp(&b.frequency.draws_since_last)
                .then((a.low, a.high).cmp(&(b.low, b.high))),
        };
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    view.truncate(limit);
    view
}
