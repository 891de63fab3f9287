mod display;
mod import;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand, ValueEnum};

use letrio_db::db::{
    count_draws, db_path, fetch_combinations, fetch_last_draws, insert_combination, insert_draw,
    max_index, migrate, open_db,
};
use letrio_db::models::{
    validate_combination, validate_digits, Combination, Draw, HISTORY_DEPTH,
};
use letrio_db::rusqlite::Connection;
use letrio_engine::cascade::cascade;
use letrio_engine::fireball::substitute;
use letrio_engine::frequency::{frequency_for_digits, FrequencyCategory, FrequencyConfig};
use letrio_engine::pairs::{analyze_pairs, pair_view, PairAxis, PairCategory};
use letrio_engine::pattern::UnorderedPattern;
use letrio_engine::report::{analyze, combination_view, save_report, SortKey, SortOrder};
use letrio_engine::suggest::generate_suggestions;
use letrio_engine::validator::{validate, RuleConfig, RuleSet};

use crate::display::{
    display_combinations, display_draws, display_fireball, display_import_summary, display_pairs,
    display_registered, display_report, display_suggestions, display_transitions,
    display_validation,
};

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum RuleArg {
    /// COMBO : multiset trié, motif BBA/BAA
    #[default]
    Combo,
    /// COMBO + bornes de plage (variante historique)
    ComboPlage,
    /// STRAIGHT : ordre de sortie exact
    Straight,
}

impl RuleArg {
    fn rules(self) -> RuleSet {
        match self {
            RuleArg::Combo => RuleSet::UnorderedStrict,
            RuleArg::ComboPlage => RuleSet::UnorderedRangeSpread,
            RuleArg::Straight => RuleSet::Ordered,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum AxisArg {
    #[default]
    FirstSecond,
    FirstThird,
    SecondThird,
}

impl AxisArg {
    fn axis(self) -> PairAxis {
        match self {
            AxisArg::FirstSecond => PairAxis::FirstSecond,
            AxisArg::FirstThird => PairAxis::FirstThird,
            AxisArg::SecondThird => PairAxis::SecondThird,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum SortArg {
    Key,
    #[default]
    Count,
    Percentage,
    Recency,
}

impl SortArg {
    fn key(self) -> SortKey {
        match self {
            SortArg::Key => SortKey::Key,
            SortArg::Count => SortKey::Count,
            SortArg::Percentage => SortKey::Percentage,
            SortArg::Recency => SortKey::Recency,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OrderArg {
    Asc,
    #[default]
    Desc,
}

impl OrderArg {
    fn order(self) -> SortOrder {
        match self {
            OrderArg::Asc => SortOrder::Asc,
            OrderArg::Desc => SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    Never,
    Rare,
    Occasional,
    Frequent,
}

impl CategoryArg {
    fn category(self) -> FrequencyCategory {
        match self {
            CategoryArg::Never => FrequencyCategory::Never,
            CategoryArg::Rare => FrequencyCategory::Rare,
            CategoryArg::Occasional => FrequencyCategory::Occasional,
            CategoryArg::Frequent => FrequencyCategory::Frequent,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PairCategoryArg {
    High,
    Medium,
    Low,
}

impl PairCategoryArg {
    fn category(self) -> PairCategory {
        match self {
            PairCategoryArg::High => PairCategory::High,
            PairCategoryArg::Medium => PairCategory::Medium,
            PairCategoryArg::Low => PairCategory::Low,
        }
    }
}

#[derive(Parser)]
#[command(name = "letrio", about = "Analyseur de motifs Pick 3 (fireball compris)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis un fichier CSV (du plus ancien au plus récent)
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long, default_value = "assets/pick3.csv")]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Ajouter un tirage manuellement
    Add,

    /// Enregistrer une combinaison candidate
    Register {
        /// 3 chiffres (0-9)
        digits: Vec<u8>,
    },

    /// Afficher les combinaisons enregistrées et leur fréquence recalculée
    Plays {
        /// Fenêtre d'analyse (nombre de tirages)
        #[arg(short, long, default_value = "1000")]
        window: u32,
    },

    /// Valider un triplet sous une famille de règles
    Validate {
        /// 3 chiffres (0-9)
        digits: Vec<u8>,

        /// Famille de règles
        #[arg(short, long, default_value = "combo")]
        rule: RuleArg,

        /// Chiffre fireball à substituer
        #[arg(short, long)]
        fireball: Option<u8>,
    },

    /// Analyser le corpus : motifs, écarts, cascade, validateur, fireball
    Analyze {
        /// Fenêtre d'analyse (nombre de tirages)
        #[arg(short, long, default_value = "1000")]
        window: u32,

        /// Famille de règles
        #[arg(short, long, default_value = "combo")]
        rule: RuleArg,

        /// Exporter le rapport en JSON
        #[arg(short, long)]
        json: Option<PathBuf>,
    },

    /// Table des combinaisons observées
    Combos {
        #[arg(short, long, default_value = "1000")]
        window: u32,

        /// Clé de tri
        #[arg(short, long, default_value = "count")]
        sort: SortArg,

        /// Sens du tri
        #[arg(short, long, default_value = "desc")]
        order: OrderArg,

        /// Filtrer par motif (BBB, BBA, BAA, AAA)
        #[arg(short, long)]
        pattern: Option<String>,

        /// Filtrer par catégorie de fréquence
        #[arg(short, long)]
        category: Option<CategoryArg>,

        /// Nombre de lignes
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Table des 45 paires canoniques et transitions
    Pairs {
        #[arg(short, long, default_value = "1000")]
        window: u32,

        /// Axe d'appariement
        #[arg(short, long, default_value = "first-second")]
        axis: AxisArg,

        #[arg(short, long, default_value = "count")]
        sort: SortArg,

        #[arg(short, long, default_value = "desc")]
        order: OrderArg,

        /// Filtrer par catégorie de paire
        #[arg(short, long)]
        category: Option<PairCategoryArg>,

        #[arg(short, long, default_value = "45")]
        limit: usize,

        /// Nombre de transitions affichées (0 pour masquer)
        #[arg(short, long, default_value = "10")]
        transitions: usize,
    },

    /// Suggérer des jeux pondérés par les fréquences observées
    Suggest {
        /// Nombre de jeux à suggérer
        #[arg(short, long, default_value = "3")]
        count: usize,

        #[arg(short, long, default_value = "1000")]
        window: u32,

        /// Famille de règles
        #[arg(short, long, default_value = "combo")]
        rule: RuleArg,

        /// Seed pour la reproductibilité (défaut: date du jour AAAAMMJJ)
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Add => cmd_add(&conn),
        Command::Register { digits } => cmd_register(&conn, &digits),
        Command::Plays { window } => cmd_plays(&conn, window),
        Command::Validate {
            digits,
            rule,
            fireball,
        } => cmd_validate(&digits, rule, fireball),
        Command::Analyze { window, rule, json } => cmd_analyze(&conn, window, rule, json),
        Command::Combos {
            window,
            sort,
            order,
            pattern,
            category,
            limit,
        } => cmd_combos(&conn, window, sort, order, pattern, category, limit),
        Command::Pairs {
            window,
            axis,
            sort,
            order,
            category,
            limit,
            transitions,
        } => cmd_pairs(&conn, window, axis, sort, order, category, limit, transitions),
        Command::Suggest {
            count,
            window,
            rule,
            seed,
        } => cmd_suggest(&conn, count, window, rule, seed),
    }
}

fn empty_db(conn: &Connection) -> Result<bool> {
    let n = count_draws(conn)?;
    if n == 0 {
        println!("Base vide. Lancez d'abord : letrio import");
        return Ok(true);
    }
    Ok(false)
}

fn cmd_import(conn: &Connection, file: &PathBuf) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    if empty_db(conn)? {
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_validate(digits: &[u8], rule: RuleArg, fireball: Option<u8>) -> Result<()> {
    let rules = rule.rules();
    let cfg = RuleConfig::default();
    let outcome = validate(digits, rules, &cfg);
    display_validation(digits, rules, &outcome);

    if let Some(f) = fireball {
        if digits.len() == 3 {
            let trio = [digits[0], digits[1], digits[2]];
            let result = substitute(&trio, f, rules, &cfg);
            display_fireball(f, &result);
        } else {
            println!("Fireball ignoré : 3 chiffres attendus.");
        }
    }
    Ok(())
}

fn cmd_analyze(conn: &Connection, window: u32, rule: RuleArg, json: Option<PathBuf>) -> Result<()> {
    if empty_db(conn)? {
        return Ok(());
    }
    let draws = fetch_last_draws(conn, window)?;
    let report = analyze(
        &draws,
        rule.rules(),
        &RuleConfig::default(),
        &FrequencyConfig::combinations(),
    );
    display_report(&report);

    if let Some(path) = json {
        save_report(&report, &path)?;
        println!("\nRapport écrit dans {}", path.display());
    }
    Ok(())
}

fn cmd_combos(
    conn: &Connection,
    window: u32,
    sort: SortArg,
    order: OrderArg,
    pattern: Option<String>,
    category: Option<CategoryArg>,
    limit: usize,
) -> Result<()> {
    if empty_db(conn)? {
        return Ok(());
    }
    let pattern = pattern
        .map(|p| p.parse::<UnorderedPattern>())
        .transpose()?;

    let draws = fetch_last_draws(conn, window)?;
    let report = analyze(
        &draws,
        RuleSet::UnorderedStrict,
        &RuleConfig::default(),
        &FrequencyConfig::combinations(),
    );
    let view = combination_view(
        &report,
        sort.key(),
        order.order(),
        pattern,
        category.map(|c| c.category()),
        limit,
    );
    display_combinations(&view);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_pairs(
    conn: &Connection,
    window: u32,
    axis: AxisArg,
    sort: SortArg,
    order: OrderArg,
    category: Option<PairCategoryArg>,
    limit: usize,
    transitions: usize,
) -> Result<()> {
    if empty_db(conn)? {
        return Ok(());
    }
    let draws = fetch_last_draws(conn, window)?;
    let report = analyze_pairs(
        &draws,
        axis.axis(),
        &RuleConfig::default(),
        &FrequencyConfig::pairs(),
    );
    let view = pair_view(
        &report,
        sort.key(),
        order.order(),
        category.map(|c| c.category()),
        limit,
    );
    display_pairs(&report, &view);
    if transitions > 0 {
        display_transitions(&report, transitions);
    }
    Ok(())
}

fn cmd_suggest(
    conn: &Connection,
    count: usize,
    window: u32,
    rule: RuleArg,
    seed: Option<u64>,
) -> Result<()> {
    if empty_db(conn)? {
        return Ok(());
    }
    let seed = seed.unwrap_or_else(|| {
        let today = chrono::Local::now();
        today.year() as u64 * 10_000 + today.month() as u64 * 100 + today.day() as u64
    });
    let draws = fetch_last_draws(conn, window)?;
    let suggestions = generate_suggestions(
        &draws,
        rule.rules(),
        &RuleConfig::default(),
        &FrequencyConfig::combinations(),
        count,
        Some(seed),
    )?;
    display_suggestions(&suggestions);
    println!("(seed {})", seed);
    Ok(())
}

fn cmd_register(conn: &Connection, digits: &[u8]) -> Result<()> {
    if digits.len() != 3 {
        bail!("3 chiffres attendus, {} reçus", digits.len());
    }
    let mut canonical = [digits[0], digits[1], digits[2]];
    canonical.sort();
    validate_combination(&canonical)?;

    let pattern = UnorderedPattern::of(&canonical)?.to_string();
    let cascade_number = cascade(&canonical)?;
    let comb = Combination {
        digits: canonical,
        pattern,
        cascade_number,
    };

    if insert_combination(conn, &comb)? {
        println!("Combinaison {} enregistrée (motif {}, cascade {}).",
            comb.key(), comb.pattern, comb.cascade_number);
    } else {
        println!("La combinaison {} existe déjà.", comb.key());
    }
    Ok(())
}

fn cmd_plays(conn: &Connection, window: u32) -> Result<()> {
    let combinations = fetch_combinations(conn)?;
    if combinations.is_empty() {
        println!("Aucune combinaison enregistrée. Lancez d'abord : letrio register");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, window)?;
    let cfg = FrequencyConfig::combinations();

    // Recalcul en bloc à chaque passage, jamais de mise à jour partielle
    let rows: Vec<_> = combinations
        .into_iter()
        .map(|comb| {
            let freq = frequency_for_digits(&comb.digits, &draws, &cfg);
            (comb, freq)
        })
        .collect();
    display_registered(&rows);
    Ok(())
}

fn cmd_add(conn: &Connection) -> Result<()> {
    println!("Ajout d'un tirage manuellement\n");

    let raw_date = prompt("Date (JJ/MM/AAAA) : ")?;
    let (date, month, year) = import::parse_date(&raw_date)?;

    let time = loop {
        let t = prompt("Tranche (midi/soir) : ")?.to_lowercase();
        if t == "midi" || t == "soir" {
            break t;
        }
        println!("Entrez midi ou soir. Réessayez.");
    };

    let original_digits = prompt_digits()?;
    let fireball = prompt_fireball()?;

    let mut sorted_digits = original_digits;
    sorted_digits.sort();

    // Instantané d'historique figé au moment de l'ajout
    let recent = fetch_last_draws(conn, HISTORY_DEPTH as u32)?;
    let draw = Draw {
        index: max_index(conn)?.map_or(1, |m| m + 1),
        date,
        time,
        month,
        year,
        original_digits,
        sorted_digits,
        fireball,
        previous_original: recent.iter().map(|d| d.original_digits).collect(),
        previous_sorted: recent.iter().map(|d| d.sorted_digits).collect(),
    };

    println!("\nTirage à insérer :");
    display_draws(&[draw.clone()]);

    let confirm = prompt("\nConfirmer l'insertion ? (o/n) : ")?;
    if confirm.trim().to_lowercase() == "o" {
        if insert_draw(conn, &draw)? {
            println!("Tirage inséré avec succès.");
        } else {
            println!("Ce tirage existe déjà (doublon ignoré).");
        }
    } else {
        println!("Insertion annulée.");
    }

    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    Ok(input.trim().to_string())
}

fn prompt_digits() -> Result<[u8; 3]> {
    loop {
        let input = prompt("3 chiffres (séparés par des espaces, 0-9) : ")?;
        let nums: Result<Vec<u8>, _> = input.split_whitespace().map(|s| s.parse::<u8>()).collect();
        match nums {
            Ok(v) if v.len() == 3 => {
                let arr = [v[0], v[1], v[2]];
                if validate_digits(&arr).is_ok() {
                    return Ok(arr);
                }
                println!("Chiffres invalides (0-9). Réessayez.");
            }
            _ => println!("Entrez exactement 3 chiffres. Réessayez."),
        }
    }
}

fn prompt_fireball() -> Result<Option<u8>> {
    loop {
        let input = prompt("Fireball (0-9, vide si aucun) : ")?;
        if input.is_empty() {
            return Ok(None);
        }
        match input.parse::<u8>() {
            Ok(f) if f <= 9 => return Ok(Some(f)),
            _ => println!("Fireball invalide (0-9 ou vide). Réessayez."),
        }
    }
}
