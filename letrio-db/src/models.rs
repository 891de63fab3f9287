use anyhow::{bail, Result};

/// Profondeur de l'historique embarqué dans chaque tirage.
pub const HISTORY_DEPTH: usize = 8;

#[derive(Debug, Clone)]
pub struct Draw {
    /// Clé de récence monotone : plus grand = plus récent.
    pub index: u32,
    /// Date au format AAAA-MM-JJ.
    pub date: String,
    /// Tranche du tirage ("midi" ou "soir").
    pub time: String,
    /// Mois abrégé ("Jan".."Dec"), dérivé de la date à l'import.
    pub month: String,
    pub year: u16,
    /// Chiffres dans l'ordre de sortie.
    pub original_digits: [u8; 3],
    /// Chiffres triés par ordre croissant.
    pub sorted_digits: [u8; 3],
    /// Chiffre fireball du tirage, s'il y en a un.
    pub fireball: Option<u8>,
    /// Instantanés des tirages précédents (≤ HISTORY_DEPTH, plus récent
    /// d'abord), figés à l'ingestion — jamais recalculés.
    pub previous_original: Vec<[u8; 3]>,
    pub previous_sorted: Vec<[u8; 3]>,
}

impl Draw {
    /// Clé de ventilation mensuelle, ex. "Jan-2024".
    pub fn month_key(&self) -> String {
        format!("{}-{}", self.month, self.year)
    }

    /// Vrai si les six chiffres sont dans 0-9 et que sorted_digits est bien
    /// la version triée de original_digits.
    pub fn is_well_formed(&self) -> bool {
        if self.original_digits.iter().any(|&d| d > 9) {
            return false;
        }
        let mut sorted = self.original_digits;
        sorted.sort();
        sorted == self.sorted_digits
    }
}

/// Combinaison candidate enregistrée : représentation canonique (triée),
/// annotée de son motif et de son chiffre cascade. La fréquence est
/// recalculée en bloc à chaque analyse, jamais stockée incrémentalement.
#[derive(Debug, Clone)]
pub struct Combination {
    pub digits: [u8; 3],
    pub pattern: String,
    pub cascade_number: u8,
}

impl Combination {
    /// Clé canonique "a-b-c".
    pub fn key(&self) -> String {
        combination_key(&self.digits)
    }
}

pub fn combination_key(digits: &[u8; 3]) -> String {
    format!("{}-{}-{}", digits[0], digits[1], digits[2])
}

pub fn validate_digits(digits: &[u8; 3]) -> Result<()> {
    for &d in digits {
        if d > 9 {
            bail!("Chiffre {} hors limites (0-9)", d);
        }
    }
    Ok(())
}

/// Variante stricte pour l'enregistrement d'une combinaison : chiffres
/// valides, triés et tous distincts.
pub fn validate_combination(digits: &[u8; 3]) -> Result<()> {
    validate_digits(digits)?;
    if digits[0] >= digits[1] || digits[1] >= digits[2] {
        bail!(
            "Combinaison {} non canonique (chiffres triés et distincts attendus)",
            combination_key(digits)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(original: [u8; 3]) -> Draw {
        let mut sorted = original;
        sorted.sort();
        Draw {
            index: 0,
            date: "2024-01-01".to_string(),
            time: "midi".to_string(),
            month: "Jan".to_string(),
            year: 2024,
            original_digits: original,
            sorted_digits: sorted,
            fireball: None,
            previous_original: vec![],
            previous_sorted: vec![],
        }
    }

    #[test]
    fn test_validate_digits_ok() {
        assert!(validate_digits(&[0, 0, 0]).is_ok());
        assert!(validate_digits(&[9, 9, 9]).is_ok());
        assert!(validate_digits(&[1, 4, 8]).is_ok());
    }

    #[test]
    fn test_validate_digits_out_of_range() {
        assert!(validate_digits(&[10, 1, 2]).is_err());
        assert!(validate_digits(&[1, 2, 255]).is_err());
    }

    #[test]
    fn test_validate_combination_requires_canonical() {
        assert!(validate_combination(&[1, 4, 8]).is_ok());
        assert!(validate_combination(&[4, 1, 8]).is_err());
        assert!(validate_combination(&[1, 1, 8]).is_err());
    }

    #[test]
    fn test_combination_key() {
        assert_eq!(combination_key(&[1, 4, 8]), "1-4-8");
    }

    #[test]
    fn test_month_key() {
        let d = draw([1, 4, 8]);
        assert_eq!(d.month_key(), "Jan-2024");
    }

    #[test]
    fn test_is_well_formed() {
        assert!(draw([8, 1, 4]).is_well_formed());
        let mut bad = draw([1, 4, 8]);
        bad.sorted_digits = [4, 1, 8];
        assert!(!bad.is_well_formed());
        let mut out = draw([1, 4, 8]);
        out.original_digits = [1, 4, 12];
        assert!(!out.is_well_formed());
    }
}
