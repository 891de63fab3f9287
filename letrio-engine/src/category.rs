use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Catégorie d'un chiffre : B (bas, 0-4) ou A (haut, 5-9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    B,
    A,
}

impl Category {
    pub fn of(digit: u8) -> Result<Category> {
        match digit {
            0..=4 => Ok(Category::B),
            5..=9 => Ok(Category::A),
            _ => bail!("Chiffre {} hors limites (0-9)", digit),
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Category::B => 'B',
            Category::A => 'A',
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}
