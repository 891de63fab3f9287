use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use letrio_db::models::{combination_key, Draw};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FrequencyCategory {
    Never,
    Rare,
    Occasional,
    Frequent,
}

impl FrequencyCategory {
    pub fn all() -> [FrequencyCategory; 4] {
        [
            FrequencyCategory::Never,
            FrequencyCategory::Rare,
            FrequencyCategory::Occasional,
            FrequencyCategory::Frequent,
        ]
    }
}

impl std::fmt::Display for FrequencyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrequencyCategory::Never => write!(f, "never"),
            FrequencyCategory::Rare => write!(f, "rare"),
            FrequencyCategory::Occasional => write!(f, "occasional"),
            FrequencyCategory::Frequent => write!(f, "frequent"),
        }
    }
}

/// Seuils de catégorisation et de marquage chaud/froid, explicites pour que
/// combinaisons et paires soient paramétrées indépendamment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencyConfig {
    pub hot_ratio: f64,
    pub cold_threshold: u32,
    pub rare_max: u32,
    pub occasional_max: u32,
    /// Borne du journal d'occurrences conservé par clé (les plus récentes).
    pub occurrence_log_cap: usize,
}

impl FrequencyConfig {
    pub fn combinations() -> Self {
        Self {
            hot_ratio: 0.01,
            cold_threshold: 100,
            rare_max: 1,
            occasional_max: 5,
            occurrence_log_cap: 120,
        }
    }

    pub fn pairs() -> Self {
        Self {
            hot_ratio: 0.02,
            cold_threshold: 50,
            rare_max: 3,
            occasional_max: 10,
            occurrence_log_cap: 120,
        }
    }
}

/// Métadonnées d'une occurrence, poussées dans le journal borné par clé.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub index: u32,
    pub date: String,
    pub month_key: String,
}

/// Accumulateur par clé : comptage, journal borné (plus récent d'abord) et
/// ventilation mensuelle non bornée, pour que Σ mensuel == count reste un
/// invariant.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceLog {
    pub count: u32,
    pub occurrences: Vec<Occurrence>,
    pub monthly: BTreeMap<String, u32>,
}

impl OccurrenceLog {
    pub fn push(&mut self, occ: Occurrence, cap: usize) {
        self.count += 1;
        *self.monthly.entry(occ.month_key.clone()).or_insert(0) += 1;
        if self.occurrences.len() < cap {
            self.occurrences.push(occ);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frequency {
    pub count: u32,
    pub percentage: f64,
    pub last_occurrence_index: Option<u32>,
    /// Récence en nombre de tirages (total_valid − index de la dernière
    /// occurrence), PAS en jours calendaires : les seuils chaud/froid sont
    /// calés sur ce proxy.
    pub draws_since_last: u32,
    pub monthly_breakdown: BTreeMap<String, u32>,
    pub category: FrequencyCategory,
    pub is_hot: bool,
    pub is_cold: bool,
}

impl Frequency {
    /// Fréquence vide d'une clé jamais tirée.
    pub fn never(total_valid: u32, cfg: &FrequencyConfig) -> Frequency {
        finalize(&OccurrenceLog::default(), total_valid, cfg)
    }
}

/// Réduit un accumulateur en fréquence finale. Pur et idempotent : ne lit
/// jamais une fréquence précédemment calculée.
pub fn finalize(log: &OccurrenceLog, total_valid: u32, cfg: &FrequencyConfig) -> Frequency {
    let percentage = if total_valid > 0 {
        log.count as f64 / total_valid as f64 * 100.0
    } else {
        0.0
    };

    // Le journal est rempli du plus récent au plus ancien : la première
    // entrée porte l'index gagnant en cas d'égalité
    let last_occurrence_index = log.occurrences.first().map(|o| o.index);
    let draws_since_last = match last_occurrence_index {
        Some(idx) => total_valid.saturating_sub(idx),
        None => total_valid,
    };

    let category = if log.count == 0 {
        FrequencyCategory::Never
    } else if log.count <= cfg.rare_max {
        FrequencyCategory::Rare
    } else if log.count <= cfg.occasional_max {
        FrequencyCategory::Occasional
    } else {
        FrequencyCategory::Frequent
    };

    Frequency {
        count: log.count,
        percentage,
        last_occurrence_index,
        draws_since_last,
        monthly_breakdown: log.monthly.clone(),
        category,
        is_hot: log.count as f64 > total_valid as f64 * cfg.hot_ratio,
        is_cold: draws_since_last > cfg.cold_threshold,
    }
}

/// Journaux d'occurrences par combinaison canonique. Retourne aussi le
/// nombre de tirages exploités et le nombre écarté (signal d'avertissement,
/// jamais une erreur).
pub fn collect_combination_logs(
    draws: &[Draw],
    cfg: &FrequencyConfig,
) -> (BTreeMap<String, OccurrenceLog>, u32, u32) {
    let mut logs: BTreeMap<String, OccurrenceLog> = BTreeMap::new();
    let mut total = 0u32;
    let mut skipped = 0u32;

    for draw in draws {
        if !draw.is_well_formed() {
            skipped += 1;
            continue;
        }
        total += 1;
        logs.entry(combination_key(&draw.sorted_digits))
            .or_default()
            .push(
                Occurrence {
                    index: draw.index,
                    date: draw.date.clone(),
                    month_key: draw.month_key(),
                },
                cfg.occurrence_log_cap,
            );
    }

    (logs, total, skipped)
}

/// Fréquences par combinaison observée dans le corpus. La finalisation par
/// clé est indépendante, donc parallélisée.
pub fn combination_frequencies(
    draws: &[Draw],
    cfg: &FrequencyConfig,
) -> (BTreeMap<String, Frequency>, u32, u32) {
    let (logs, total, skipped) = collect_combination_logs(draws, cfg);
    let frequencies: BTreeMap<String, Frequency> = logs
        .par_iter()
        .map(|(key, log)| (key.clone(), finalize(log, total, cfg)))
        .collect();
    (frequencies, total, skipped)
}

/// Recalcule en bloc la fréquence d'une combinaison enregistrée (jamais de
/// mise à jour incrémentale).
pub fn frequency_for_digits(
    digits: &[u8; 3],
    draws: &[Draw],
    cfg: &FrequencyConfig,
) -> Frequency {
    let mut log = OccurrenceLog::default();
    let mut total = 0u32;
    for draw in draws {
        if !draw.is_well_formed() {
            continue;
        }
        total += 1;
        if draw.sorted_digits == *digits {
            log.push(
                Occurrence {
                    index: draw.index,
                    date: draw.date.clone(),
                    month_key: draw.month_key(),
                },
                cfg.occurrence_log_cap,
            );
        }
    }
    finalize(&log, total, cfg)
}
