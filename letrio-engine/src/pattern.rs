use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Motif non ordonné : multiset des catégories des trois chiffres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnorderedPattern {
    Bbb,
    Bba,
    Baa,
    Aaa,
}

impl UnorderedPattern {
    /// Motif par comptage des chiffres bas, indifférent à l'ordre.
    pub fn of(digits: &[u8; 3]) -> Result<UnorderedPattern> {
        let mut low = 0u8;
        for &d in digits {
            if Category::of(d)? == Category::B {
                low += 1;
            }
        }
        Ok(match low {
            3 => UnorderedPattern::Bbb,
            2 => UnorderedPattern::Bba,
            1 => UnorderedPattern::Baa,
            _ => UnorderedPattern::Aaa,
        })
    }

    pub fn all() -> [UnorderedPattern; 4] {
        [
            UnorderedPattern::Bbb,
            UnorderedPattern::Bba,
            UnorderedPattern::Baa,
            UnorderedPattern::Aaa,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnorderedPattern::Bbb => "BBB",
            UnorderedPattern::Bba => "BBA",
            UnorderedPattern::Baa => "BAA",
            UnorderedPattern::Aaa => "AAA",
        }
    }
}

impl std::fmt::Display for UnorderedPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UnorderedPattern {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "BBB" => Ok(UnorderedPattern::Bbb),
            "BBA" => Ok(UnorderedPattern::Bba),
            "BAA" => Ok(UnorderedPattern::Baa),
            "AAA" => Ok(UnorderedPattern::Aaa),
            other => bail!("Motif inconnu : '{}'", other),
        }
    }
}

/// Motif ordonné : catégorie de chaque position, dans l'ordre de sortie
/// (8 valeurs possibles, BBB et AAA compris).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderedPattern(pub [Category; 3]);

impl OrderedPattern {
    pub fn of(digits: &[u8; 3]) -> Result<OrderedPattern> {
        Ok(OrderedPattern([
            Category::of(digits[0])?,
            Category::of(digits[1])?,
            Category::of(digits[2])?,
        ]))
    }

    pub fn categories(&self) -> [Category; 3] {
        self.0
    }

    /// Réduction triée-comptée vers le motif non ordonné.
    pub fn to_unordered(&self) -> UnorderedPattern {
        let low = self.0.iter().filter(|c| **c == Category::B).count();
        match low {
            3 => UnorderedPattern::Bbb,
            2 => UnorderedPattern::Bba,
            1 => UnorderedPattern::Baa,
            _ => UnorderedPattern::Aaa,
        }
    }

    /// Vrai pour les 6 permutations mixtes (ni BBB ni AAA).
    pub fn is_mixed(&self) -> bool {
        let u = self.to_unordered();
        u != UnorderedPattern::Bbb && u != UnorderedPattern::Aaa
    }
}

impl std::fmt::Display for OrderedPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.0[0], self.0[1], self.0[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unordered_patterns() {
        assert_eq!(UnorderedPattern::of(&[0, 2, 4]).unwrap(), UnorderedPattern::Bbb);
        assert_eq!(UnorderedPattern::of(&[1, 4, 8]).unwrap(), UnorderedPattern::Bba);
        assert_eq!(UnorderedPattern::of(&[1, 6, 8]).unwrap(), UnorderedPattern::Baa);
        assert_eq!(UnorderedPattern::of(&[5, 7, 9]).unwrap(), UnorderedPattern::Aaa);
    }

    #[test]
    fn test_unordered_insensitive_to_order() {
        assert_eq!(
            UnorderedPattern::of(&[8, 1, 4]).unwrap(),
            UnorderedPattern::of(&[1, 4, 8]).unwrap()
        );
    }

    #[test]
    fn test_unordered_out_of_range() {
        assert!(UnorderedPattern::of(&[1, 4, 18]).is_err());
    }

    #[test]
    fn test_ordered_pattern_preserves_positions() {
        let p = OrderedPattern::of(&[8, 1, 4]).unwrap();
        assert_eq!(p.to_string(), "ABB");
        let q = OrderedPattern::of(&[1, 8, 4]).unwrap();
        assert_eq!(q.to_string(), "BAB");
    }

    #[test]
    fn test_ordered_consistent_with_unordered() {
        // Pour tout triplet valide, le motif non ordonné est la réduction
        // triée-comptée des lettres du motif ordonné.
        for a in 0..=9u8 {
            for b in 0..=9u8 {
                for c in 0..=9u8 {
                    let digits = [a, b, c];
                    let ordered = OrderedPattern::of(&digits).unwrap();
                    let unordered = UnorderedPattern::of(&digits).unwrap();
                    assert_eq!(ordered.to_unordered(), unordered, "triplet {:?}", digits);
                }
            }
        }
    }

    #[test]
    fn test_is_mixed() {
        assert!(!OrderedPattern::of(&[0, 1, 2]).unwrap().is_mixed());
        assert!(!OrderedPattern::of(&[5, 6, 7]).unwrap().is_mixed());
        assert!(OrderedPattern::of(&[0, 1, 7]).unwrap().is_mixed());
    }

    #[test]
    fn test_pattern_from_str() {
        assert_eq!("bba".parse::<UnorderedPattern>().unwrap(), UnorderedPattern::Bba);
        assert!("BAC".parse::<UnorderedPattern>().is_err());
    }
}
