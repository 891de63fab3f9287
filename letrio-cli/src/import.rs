use std::collections::VecDeque;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Datelike;

use letrio_db::db::{fetch_last_draws, insert_draw, max_index};
use letrio_db::models::{validate_digits, Draw, HISTORY_DEPTH};
use letrio_db::rusqlite::Connection;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

struct ParsedRow {
    date: String,
    time: String,
    month: String,
    year: u16,
    digits: [u8; 3],
    fireball: Option<u8>,
}

/// Date JJ/MM/AAAA → (AAAA-MM-JJ, mois abrégé, année).
pub(crate) fn parse_date(raw: &str) -> Result<(String, String, u16)> {
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != 3 {
        bail!("Format de date invalide: '{}'", raw);
    }
    let iso = format!("{}-{}-{}", parts[2], parts[1], parts[0]);
    let date = chrono::NaiveDate::parse_from_str(&iso, "%Y-%m-%d")
        .with_context(|| format!("Date invalide: '{}'", raw))?;
    let month = MONTHS[date.month0() as usize].to_string();
    Ok((iso, month, date.year() as u16))
}

/// Ligne attendue : date;tranche;chiffre1;chiffre2;chiffre3;fireball
/// (fireball optionnel, champ vide admis).
fn parse_record(record: &csv::StringRecord) -> Result<ParsedRow> {
    let get = |idx: usize| -> Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let get_digit = |idx: usize| -> Result<u8> {
        let s = get(idx)?;
        s.parse::<u8>()
            .with_context(|| format!("Impossible de parser '{}' (index {})", s, idx))
    };

    let (date, month, year) = parse_date(&get(0)?)?;

    let time = get(1)?.to_lowercase();
    if time != "midi" && time != "soir" {
        bail!("Tranche inconnue: '{}' (midi/soir attendu)", time);
    }

    let digits = [get_digit(2)?, get_digit(3)?, get_digit(4)?];
    validate_digits(&digits)?;

    let fireball_str = get(5).unwrap_or_default();
    let fireball = if fireball_str.is_empty() {
        None
    } else {
        let f: u8 = fireball_str
            .parse()
            .with_context(|| format!("Fireball illisible: '{}'", fireball_str))?;
        if f > 9 {
            bail!("Fireball {} hors limites (0-9)", f);
        }
        Some(f)
    };

    Ok(ParsedRow {
        date,
        time,
        month,
        year,
        digits,
        fireball,
    })
}

/// Anneau d'historique : les HISTORY_DEPTH derniers tirages, plus récent en
/// tête, figé dans chaque tirage au moment de l'ingestion.
struct HistoryRing {
    original: VecDeque<[u8; 3]>,
    sorted: VecDeque<[u8; 3]>,
}

impl HistoryRing {
    fn seed_from_db(conn: &Connection) -> Result<Self> {
        let recent = fetch_last_draws(conn, HISTORY_DEPTH as u32)?;
        Ok(Self {
            original: recent.iter().map(|d| d.original_digits).collect(),
            sorted: recent.iter().map(|d| d.sorted_digits).collect(),
        })
    }

    fn snapshot(&self) -> (Vec<[u8; 3]>, Vec<[u8; 3]>) {
        (
            self.original.iter().copied().collect(),
            self.sorted.iter().copied().collect(),
        )
    }

    fn push(&mut self, original: [u8; 3], sorted: [u8; 3]) {
        self.original.push_front(original);
        self.sorted.push_front(sorted);
        self.original.truncate(HISTORY_DEPTH);
        self.sorted.truncate(HISTORY_DEPTH);
    }
}

/// Import transactionnel d'un CSV de tirages, du plus ancien au plus récent.
/// Les lignes illisibles sont comptées, jamais bloquantes.
pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let tx = conn
        .unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut next_index = max_index(&tx)?.map_or(1, |m| m + 1);
    let mut ring = HistoryRing::seed_from_db(&tx)?;

    let mut result = ImportResult {
        total_records: 0,
        inserted: 0,
        skipped: 0,
        errors: 0,
    };

    for record_result in reader.records() {
        result.total_records += 1;
        let record = match record_result {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Erreur lecture ligne {}: {}", result.total_records, e);
                result.errors += 1;
                continue;
            }
        };
        let row = match parse_record(&record) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Erreur parsing ligne {}: {}", result.total_records, e);
                result.errors += 1;
                continue;
            }
        };

        let mut sorted = row.digits;
        sorted.sort();
        let (previous_original, previous_sorted) = ring.snapshot();
        let draw = Draw {
            index: next_index,
            date: row.date,
            time: row.time,
            month: row.month,
            year: row.year,
            original_digits: row.digits,
            sorted_digits: sorted,
            fireball: row.fireball,
            previous_original,
            previous_sorted,
        };

        match insert_draw(&tx, &draw) {
            Ok(true) => {
                result.inserted += 1;
                next_index += 1;
                ring.push(draw.original_digits, draw.sorted_digits);
            }
            Ok(false) => result.skipped += 1,
            Err(e) => {
                eprintln!("Erreur insertion ligne {}: {}", result.total_records, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use letrio_db::db::migrate;
    use std::io::Write;

    #[test]
    fn test_parse_date() {
        let (iso, month, year) = parse_date("17/02/2026").unwrap();
        assert_eq!(iso, "2026-02-17");
        assert_eq!(month, "Feb");
        assert_eq!(year, 2026);
        assert!(parse_date("2026-02-17").is_err());
        assert!(parse_date("31/02/2026").is_err());
    }

    #[test]
    fn test_parse_record() {
        let record = csv::StringRecord::from(vec!["15/03/2024", "midi", "1", "4", "8", "7"]);
        let row = parse_record(&record).unwrap();
        assert_eq!(row.digits, [1, 4, 8]);
        assert_eq!(row.fireball, Some(7));
        assert_eq!(row.time, "midi");
        assert_eq!(row.month, "Mar");
    }

    #[test]
    fn test_parse_record_without_fireball() {
        let record = csv::StringRecord::from(vec!["15/03/2024", "soir", "9", "0", "3", ""]);
        let row = parse_record(&record).unwrap();
        assert_eq!(row.fireball, None);
    }

    #[test]
    fn test_parse_record_rejects_bad_rows() {
        let bad_digit = csv::StringRecord::from(vec!["15/03/2024", "midi", "1", "4", "18", ""]);
        assert!(parse_record(&bad_digit).is_err());
        let bad_time = csv::StringRecord::from(vec!["15/03/2024", "matin", "1", "4", "8", ""]);
        assert!(parse_record(&bad_time).is_err());
        let bad_fireball = csv::StringRecord::from(vec!["15/03/2024", "midi", "1", "4", "8", "12"]);
        assert!(parse_record(&bad_fireball).is_err());
    }

    #[test]
    fn test_import_builds_embedded_history() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let mut file = tempfile_csv();
        writeln!(file, "date;tranche;c1;c2;c3;fireball").unwrap();
        for line in [
            "01/01/2024;midi;1;4;8;7",
            "01/01/2024;soir;9;0;3;",
            "02/01/2024;midi;2;4;8;1",
        ] {
            writeln!(file, "{}", line).unwrap();
        }
        let path = file.into_temp_path();

        let result = import_csv(&conn, &path).unwrap();
        assert_eq!(result.inserted, 3);
        assert_eq!(result.errors, 0);

        let draws = fetch_last_draws(&conn, 10).unwrap();
        assert_eq!(draws.len(), 3);
        // Le plus récent : index 3, historique = [tirage 2, tirage 1]
        assert_eq!(draws[0].index, 3);
        assert_eq!(draws[0].previous_original, vec![[9, 0, 3], [1, 4, 8]]);
        assert_eq!(draws[0].previous_sorted, vec![[0, 3, 9], [1, 4, 8]]);
        // Le plus ancien n'a pas d'historique
        assert!(draws[2].previous_original.is_empty());
    }

    #[test]
    fn test_import_counts_bad_rows_and_commits_rest() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let mut file = tempfile_csv();
        writeln!(file, "date;tranche;c1;c2;c3;fireball").unwrap();
        writeln!(file, "01/01/2024;midi;1;4;8;").unwrap();
        writeln!(file, "pas-une-date;midi;1;4;8;").unwrap();
        writeln!(file, "02/01/2024;soir;5;5;0;3").unwrap();
        let path = file.into_temp_path();

        let result = import_csv(&conn, &path).unwrap();
        assert_eq!(result.total_records, 3);
        assert_eq!(result.inserted, 2);
        assert_eq!(result.errors, 1);
        assert_eq!(fetch_last_draws(&conn, 10).unwrap().len(), 2);
    }

    fn tempfile_csv() -> tempfile::NamedTempFile {
        tempfile::NamedTempFile::new().unwrap()
    }
}
