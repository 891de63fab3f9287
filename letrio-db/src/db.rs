use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use crate::models::{Combination, Draw};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    idx            INTEGER PRIMARY KEY,
    date           TEXT NOT NULL,
    time           TEXT NOT NULL,
    month          TEXT NOT NULL,
    year           INTEGER NOT NULL,
    digit_1        INTEGER NOT NULL,
    digit_2        INTEGER NOT NULL,
    digit_3        INTEGER NOT NULL,
    sorted_1       INTEGER NOT NULL,
    sorted_2       INTEGER NOT NULL,
    sorted_3       INTEGER NOT NULL,
    fireball       INTEGER,
    prev_original  TEXT NOT NULL DEFAULT '[]',
    prev_sorted    TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS combinations (
    key            TEXT PRIMARY KEY,
    digit_1        INTEGER NOT NULL,
    digit_2        INTEGER NOT NULL,
    digit_3        INTEGER NOT NULL,
    pattern        TEXT NOT NULL,
    cascade_number INTEGER NOT NULL
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("letrio.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let prev_original = serde_json::to_string(&draw.previous_original)
        .context("Impossible de sérialiser l'historique (ordre de sortie)")?;
    let prev_sorted = serde_json::to_string(&draw.previous_sorted)
        .context("Impossible de sérialiser l'historique (trié)")?;
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (idx, date, time, month, year, digit_1, digit_2, digit_3, sorted_1, sorted_2, sorted_3, fireball, prev_original, prev_sorted)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        rusqlite::params![
            draw.index,
            draw.date,
            draw.time,
            draw.month,
            draw.year,
            draw.original_digits[0],
            draw.original_digits[1],
            draw.original_digits[2],
            draw.sorted_digits[0],
            draw.sorted_digits[1],
            draw.sorted_digits[2],
            draw.fireball,
            prev_original,
            prev_sorted,
        ],
    ).context("Échec de l'insertion du tirage")?;
    Ok(changed > 0)
}

/// Derniers tirages, le plus récent d'abord (idx décroissant).
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(
        "SELECT idx, date, time, month, year, digit_1, digit_2, digit_3, sorted_1, sorted_2, sorted_3, fireball, prev_original, prev_sorted
         FROM draws ORDER BY idx DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map([limit], |row| {
        Ok((
            row.get::<_, u32>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, u16>(4)?,
            [row.get::<_, u8>(5)?, row.get::<_, u8>(6)?, row.get::<_, u8>(7)?],
            [row.get::<_, u8>(8)?, row.get::<_, u8>(9)?, row.get::<_, u8>(10)?],
            row.get::<_, Option<u8>>(11)?,
            row.get::<_, String>(12)?,
            row.get::<_, String>(13)?,
        ))
    })?;

    let mut draws = Vec::new();
    for row in rows {
        let (index, date, time, month, year, original, sorted, fireball, prev_o, prev_s) =
            row.context("Ligne de tirage illisible")?;
        let previous_original: Vec<[u8; 3]> = serde_json::from_str(&prev_o)
            .with_context(|| format!("Historique corrompu pour le tirage {}", index))?;
        let previous_sorted: Vec<[u8; 3]> = serde_json::from_str(&prev_s)
            .with_context(|| format!("Historique corrompu pour le tirage {}", index))?;
        draws.push(Draw {
            index,
            date,
            time,
            month,
            year,
            original_digits: original,
            sorted_digits: sorted,
            fireball,
            previous_original,
            previous_sorted,
        });
    }
    Ok(draws)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn
        .query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))
        .context("Impossible de compter les tirages")?;
    Ok(count)
}

/// Index le plus récent, ou None si la base est vide.
pub fn max_index(conn: &Connection) -> Result<Option<u32>> {
    let max: Option<u32> = conn
        .query_row("SELECT MAX(idx) FROM draws", [], |row| row.get(0))
        .context("Impossible de lire l'index maximal")?;
    Ok(max)
}

pub fn insert_combination(conn: &Connection, comb: &Combination) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO combinations (key, digit_1, digit_2, digit_3, pattern, cascade_number)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            comb.key(),
            comb.digits[0],
            comb.digits[1],
            comb.digits[2],
            comb.pattern,
            comb.cascade_number,
        ],
    ).context("Échec de l'insertion de la combinaison")?;
    Ok(changed > 0)
}

pub fn fetch_combinations(conn: &Connection) -> Result<Vec<Combination>> {
    let mut stmt = conn.prepare(
        "SELECT digit_1, digit_2, digit_3, pattern, cascade_number
         FROM combinations ORDER BY key",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Combination {
            digits: [row.get(0)?, row.get(1)?, row.get(2)?],
            pattern: row.get(3)?,
            cascade_number: row.get(4)?,
        })
    })?;
    let mut combinations = Vec::new();
    for row in rows {
        combinations.push(row.context("Ligne de combinaison illisible")?);
    }
    Ok(combinations)
}
