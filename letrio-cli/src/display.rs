use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use letrio_db::models::{Combination, Draw};
use letrio_engine::fireball::FireballResult;
use letrio_engine::frequency::{Frequency, FrequencyCategory};
use letrio_engine::pairs::{PairCategory, PairReport, PairStat};
use letrio_engine::report::AnalysisReport;
use letrio_engine::suggest::Suggestion;
use letrio_engine::validator::{RuleSet, ValidationOutcome};

use crate::import::ImportResult;

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn digits_str(digits: &[u8; 3]) -> String {
    format!("{} {} {}", digits[0], digits[1], digits[2])
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = base_table();
    table.set_header(vec!["Idx", "Date", "Tranche", "Tirage", "Trié", "Fireball"]);

    for draw in draws {
        let fireball = draw
            .fireball
            .map(|f| f.to_string())
            .unwrap_or_else(|| "—".to_string());
        table.add_row(vec![
            draw.index.to_string(),
            draw.date.clone(),
            draw.time.clone(),
            digits_str(&draw.original_digits),
            digits_str(&draw.sorted_digits),
            fireball,
        ]);
    }

    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

pub fn display_validation(digits: &[u8], rules: RuleSet, outcome: &ValidationOutcome) {
    let input = digits
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let pattern = outcome
        .pattern
        .map(|p| p.to_string())
        .unwrap_or_else(|| "—".to_string());

    if outcome.valid {
        println!("[{}] {} : VALIDE (motif {})", rules, input, pattern);
    } else {
        let reason = outcome
            .reason
            .map(|r| r.to_string())
            .unwrap_or_default();
        println!("[{}] {} : refusé — {} (motif {})", rules, input, reason, pattern);
    }
}

pub fn display_fireball(fireball: u8, result: &FireballResult) {
    if !result.has_valid_fireball {
        println!("Fireball {} : aucune substitution gagnante.", fireball);
        return;
    }
    println!(
        "Fireball {} : {} substitution(s) gagnante(s)",
        fireball, result.substitutions_passed
    );

    let mut table = base_table();
    table.set_header(vec!["Position", "Triplet", "Motif"]);
    for detail in &result.details {
        table.add_row(vec![
            (detail.position + 1).to_string(),
            digits_str(&detail.digits),
            detail.pattern.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_report(report: &AnalysisReport) {
    println!("\n== Analyse {} ==\n", report.rules);
    println!("  Tirages             : {}", report.total_draws);
    println!("  Exploités           : {}", report.analyzed_draws);
    if report.skipped_draws > 0 {
        println!("  Écartés (malformés) : {}", report.skipped_draws);
    }
    println!(
        "  Valides             : {} ({:.1} %)",
        report.valid_draws, report.validator.pass_percentage
    );
    println!("  Combinaisons vues   : {}", report.unique_combinations);
    if report.validator.draws_with_fireball > 0 {
        println!(
            "  Fireball gagnant    : {}/{} ({:.1} %), {} substitutions",
            report.validator.fireball_passed,
            report.validator.draws_with_fireball,
            report.validator.fireball_pass_percentage,
            report.validator.fireball_substitutions_passed,
        );
    }

    println!("\n── Motifs ──");
    let mut table = base_table();
    table.set_header(vec!["Motif", "Tirages", "%", "Écarts observés"]);
    for (pattern, stat) in &report.patterns {
        let diffs = report
            .diff_histograms
            .get(pattern)
            .map(|h| {
                h.iter()
                    .map(|(d, n)| format!("{}×{}", d, n))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_else(|| "—".to_string());
        table.add_row(vec![
            pattern.clone(),
            stat.count.to_string(),
            format!("{:.1}", stat.percentage),
            diffs,
        ]);
    }
    println!("{table}");

    println!("\n── Cascade ──");
    let mut table = base_table();
    table.set_header(vec!["Chiffre", "Tous", "Valides"]);
    for digest in 0..=9u8 {
        let overall = report.cascade.overall.get(&digest).copied().unwrap_or(0);
        let passing = report
            .cascade
            .passing_only
            .get(&digest)
            .copied()
            .unwrap_or(0);
        if overall > 0 {
            table.add_row(vec![
                digest.to_string(),
                overall.to_string(),
                passing.to_string(),
            ]);
        }
    }
    println!("{table}");
}

fn category_cell(category: FrequencyCategory) -> Cell {
    let cell = Cell::new(category.to_string());
    match category {
        FrequencyCategory::Frequent => cell.fg(Color::Green),
        FrequencyCategory::Never => cell.fg(Color::DarkGrey),
        _ => cell,
    }
}

fn heat_cell(freq: &Frequency) -> Cell {
    if freq.is_hot {
        Cell::new("HOT").fg(Color::Red)
    } else if freq.is_cold {
        Cell::new("COLD").fg(Color::Blue)
    } else {
        Cell::new("—")
    }
}

pub fn display_combinations(rows: &[(&str, &Frequency)]) {
    if rows.is_empty() {
        println!("Aucune combinaison ne correspond aux filtres.");
        return;
    }

    let mut table = base_table();
    table.set_header(vec![
        "Combinaison",
        "Tirages",
        "%",
        "Récence",
        "Catégorie",
        "Température",
    ]);
    for (key, freq) in rows {
        table.add_row(vec![
            Cell::new(key),
            Cell::new(freq.count),
            Cell::new(format!("{:.2}", freq.percentage)),
            Cell::new(freq.draws_since_last),
            category_cell(freq.category),
            heat_cell(freq),
        ]);
    }
    println!("{table}");
}

pub fn display_registered(combinations: &[(Combination, Frequency)]) {
    if combinations.is_empty() {
        println!("Aucune combinaison enregistrée. Lancez d'abord : letrio register");
        return;
    }

    let mut table = base_table();
    table.set_header(vec![
        "Combinaison",
        "Motif",
        "Cascade",
        "Tirages",
        "%",
        "Catégorie",
        "Température",
    ]);
    for (comb, freq) in combinations {
        table.add_row(vec![
            Cell::new(comb.key()),
            Cell::new(&comb.pattern),
            Cell::new(comb.cascade_number),
            Cell::new(freq.count),
            Cell::new(format!("{:.2}", freq.percentage)),
            category_cell(freq.category),
            heat_cell(freq),
        ]);
    }
    println!("{table}");
}

fn pair_category_cell(category: PairCategory) -> Cell {
    let cell = Cell::new(category.to_string());
    match category {
        PairCategory::High => cell.fg(Color::Green),
        PairCategory::Low => cell.fg(Color::DarkGrey),
        PairCategory::Medium => cell,
    }
}

pub fn display_pairs(report: &PairReport, view: &[&PairStat]) {
    println!(
        "\n== Paires {} — {} tirages ==\n",
        report.axis, report.total_draws_for_axis
    );
    if report.skipped_draws > 0 {
        println!("  Écartés (malformés ou chiffre doublé) : {}", report.skipped_draws);
    }

    let mut table = base_table();
    table.set_header(vec![
        "Paire",
        "Tirages",
        "%",
        "Compléments",
        "Catégorie",
        "Température",
        "Prédécesseurs",
    ]);
    for pair in view {
        let predecessors = if pair.top_predecessors.is_empty() {
            "—".to_string()
        } else {
            pair.top_predecessors
                .iter()
                .map(|(k, n)| format!("{} ({})", k, n))
                .collect::<Vec<_>>()
                .join(", ")
        };
        table.add_row(vec![
            Cell::new(&pair.key),
            Cell::new(pair.count),
            Cell::new(format!("{:.2}", pair.percentage)),
            Cell::new(pair.possible_completions),
            pair_category_cell(pair.category),
            heat_cell(&pair.frequency),
            Cell::new(predecessors),
        ]);
    }
    println!("{table}");
}

pub fn display_transitions(report: &PairReport, limit: usize) {
    if report.transitions.is_empty() {
        println!("Aucune transition observée (historique embarqué vide).");
        return;
    }

    let mut transitions: Vec<(&String, &u32)> = report.transitions.iter().collect();
    transitions.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    transitions.truncate(limit);

    println!("\n── Transitions les plus fréquentes ──");
    let mut table = base_table();
    table.set_header(vec!["Transition", "Occurrences"]);
    for (key, count) in transitions {
        table.add_row(vec![key.clone(), count.to_string()]);
    }
    println!("{table}");
}

pub fn display_suggestions(suggestions: &[Suggestion]) {
    if suggestions.is_empty() {
        println!("Aucun jeu à suggérer.");
        return;
    }

    println!("\n== Jeux suggérés ==\n");
    let mut table = base_table();
    table.set_header(vec!["Jeu", "Motif", "Cascade", "Score"]);
    for s in suggestions {
        table.add_row(vec![
            digits_str(&s.digits),
            s.pattern.clone(),
            s.cascade_number.to_string(),
            format!("{:.2}", s.score),
        ]);
    }
    println!("{table}");
}
