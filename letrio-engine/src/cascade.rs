use anyhow::{bail, Result};

/// Chiffre cascade : repli par différences absolues imbriquées,
/// `||a-b| - |b-c||`. Toujours dans 0-9 pour des chiffres valides.
pub fn cascade(digits: &[u8; 3]) -> Result<u8> {
    for &d in digits {
        if d > 9 {
            bail!("Chiffre {} hors limites (0-9)", d);
        }
    }
    let left = digits[0].abs_diff(digits[1]);
    let right = digits[1].abs_diff(digits[2]);
    Ok(left.abs_diff(right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_worked_example() {
        // |4-6|=2, |6-9|=3, |2-3|=1
        assert_eq!(cascade(&[4, 6, 9]).unwrap(), 1);
    }

    #[test]
    fn test_cascade_reversal_invariance() {
        for a in 0..=9u8 {
            for b in 0..=9u8 {
                for c in 0..=9u8 {
                    assert_eq!(
                        cascade(&[a, b, c]).unwrap(),
                        cascade(&[c, b, a]).unwrap(),
                        "triplet {:?}",
                        [a, b, c]
                    );
                }
            }
        }
    }

    #[test]
    fn test_cascade_stays_in_digit_range() {
        for a in 0..=9u8 {
            for b in 0..=9u8 {
                for c in 0..=9u8 {
                    assert!(cascade(&[a, b, c]).unwrap() <= 9);
                }
            }
        }
    }

    #[test]
    fn test_cascade_out_of_range() {
        assert!(cascade(&[1, 4, 18]).is_err());
    }
}
