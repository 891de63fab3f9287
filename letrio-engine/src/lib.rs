pub mod cascade;
pub mod category;
pub mod fireball;
pub mod frequency;
pub mod pairs;
pub mod pattern;
pub mod report;
pub mod suggest;
pub mod validator;

use letrio_db::models::Draw;

/// Fabrique des tirages de test déterministes. draws[0] = le plus récent.
pub fn make_test_draws(n: usize) -> Vec<Draw> {
    let months = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    let mut draws: Vec<Draw> = (0..n)
        .map(|i| {
            // Mélange déterministe couvrant motifs, doublons et fireballs
            let original = [
                ((i * 3 + 1) % 10) as u8,
                ((i * 7 + 4) % 10) as u8,
                ((i * 5 + 8) % 10) as u8,
            ];
            let mut sorted = original;
            sorted.sort();
            let month_idx = i % 12;
            Draw {
                index: (n - i) as u32,
                date: format!("2024-{:02}-{:02}", month_idx + 1, (i % 28) + 1),
                time: if i % 2 == 0 { "midi".to_string() } else { "soir".to_string() },
                month: months[month_idx].to_string(),
                year: 2024,
                original_digits: original,
                sorted_digits: sorted,
                fireball: if i % 3 == 0 { Some((i % 10) as u8) } else { None },
                previous_original: vec![],
                previous_sorted: vec![],
            }
        })
        .collect();

    // Historique embarqué : instantané des 8 tirages précédents (plus récent
    // d'abord), comme construit à l'ingestion.
    for i in 0..n {
        let depth = letrio_db::models::HISTORY_DEPTH.min(n - i - 1);
        let previous_original: Vec<[u8; 3]> = (1..=depth)
            .map(|k| draws[i + k].original_digits)
            .collect();
        let previous_sorted: Vec<[u8; 3]> = (1..=depth)
            .map(|k| draws[i + k].sorted_digits)
            .collect();
        draws[i].previous_original = previous_original;
        draws[i].previous_sorted = previous_sorted;
    }

    draws
}
