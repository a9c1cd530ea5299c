//! Multiple testing correction
//!
//! The adjusted values reproduce R's `p.adjust` for the respective
//! methods, including its handling of ties: orderings are stable.
use std::cmp::Ordering;

use crate::stats::f64_from_usize;

/// Multiple testing correction method
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Correction {
    /// Holm's step-down procedure, controls the family-wise error rate
    Holm,
    /// Benjamini-Hochberg procedure, controls the false discovery rate
    BenjaminiHochberg,
    /// Bonferroni correction, `min(1, p * n)`
    Bonferroni,
}

/// Returns the indices of `values`, stably sorted by value
fn order(values: &[f64], descending: bool) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| {
        let ord = values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    idx
}

/// Adjusts `p_values` with the given method
///
/// Returns the adjusted values in the order of the input.
///
/// # Examples
///
/// ```
/// use psea::stats::{adjust, Correction};
///
/// let p = [0.01, 0.04, 0.03, 0.005];
/// let holm = adjust(&p, Correction::Holm);
/// assert!((holm[0] - 0.03).abs() < 1e-12);
/// assert!((holm[3] - 0.02).abs() < 1e-12);
///
/// let fdr = adjust(&p, Correction::BenjaminiHochberg);
/// assert!((fdr[1] - 0.04).abs() < 1e-12);
/// ```
pub fn adjust(p_values: &[f64], method: Correction) -> Vec<f64> {
    let n = p_values.len();
    if n <= 1 {
        return p_values.to_vec();
    }
    let n_f = f64_from_usize(n);
    let mut adjusted = vec![0.0; n];

    match method {
        Correction::Holm => {
            // pmin(1, cummax((n - i + 1) * p[o]))[ro]
            let mut running = f64::NEG_INFINITY;
            for (i, &idx) in order(p_values, false).iter().enumerate() {
                let value = (n_f - f64_from_usize(i)) * p_values[idx];
                running = running.max(value);
                adjusted[idx] = running.min(1.0);
            }
        }
        Correction::BenjaminiHochberg => {
            // pmin(1, cummin(n / i * p[o]))[ro], o in decreasing order
            let mut running = f64::INFINITY;
            for (j, &idx) in order(p_values, true).iter().enumerate() {
                let rank = n_f - f64_from_usize(j);
                let value = n_f / rank * p_values[idx];
                running = running.min(value);
                adjusted[idx] = running.min(1.0);
            }
        }
        Correction::Bonferroni => {
            for (adj, p) in adjusted.iter_mut().zip(p_values) {
                *adj = (p * n_f).min(1.0);
            }
        }
    }
    adjusted
}

/// Calculates Holm and Benjamini-Hochberg adjusted p-values
///
/// Returns `(holm, fdr)`, each in the order of the input.
pub fn correct(p_values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    (
        adjust(p_values, Correction::Holm),
        adjust(p_values, Correction::BenjaminiHochberg),
    )
}

#[cfg(test)]
mod test {
    use super::*;

    const TOL: f64 = 1e-12;

    fn assert_all_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < TOL, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn holm_reference() {
        // R: p.adjust(c(0.01, 0.04, 0.03, 0.005), "holm")
        let adj = adjust(&[0.01, 0.04, 0.03, 0.005], Correction::Holm);
        assert_all_close(&adj, &[0.03, 0.06, 0.06, 0.02]);
    }

    #[test]
    fn bh_reference() {
        // R: p.adjust(c(0.01, 0.04, 0.03, 0.005), "BH")
        let adj = adjust(&[0.01, 0.04, 0.03, 0.005], Correction::BenjaminiHochberg);
        assert_all_close(&adj, &[0.02, 0.04, 0.04, 0.02]);
    }

    #[test]
    fn clamped_to_one() {
        let p = [0.5, 0.8, 0.9];
        assert!(adjust(&p, Correction::Holm).iter().all(|&v| v <= 1.0));
        assert_all_close(&adjust(&p, Correction::Bonferroni), &[1.0, 1.0, 1.0]);
        // R: p.adjust(c(0.5, 0.8, 0.9), "BH") == c(0.9, 0.9, 0.9)
        assert_all_close(&adjust(&p, Correction::BenjaminiHochberg), &[0.9, 0.9, 0.9]);
    }

    #[test]
    fn ties() {
        // R: p.adjust(c(0.02, 0.02, 0.01), "holm") == c(0.04, 0.04, 0.03)
        assert_all_close(&adjust(&[0.02, 0.02, 0.01], Correction::Holm), &[0.04, 0.04, 0.03]);
        // R: p.adjust(c(0.02, 0.02, 0.01), "BH") == c(0.02, 0.02, 0.02)
        assert_all_close(
            &adjust(&[0.02, 0.02, 0.01], Correction::BenjaminiHochberg),
            &[0.02, 0.02, 0.02],
        );
    }

    #[test]
    fn monotone_in_raw_order() {
        let p = [0.1, 0.001, 0.05, 0.01, 0.5, 0.049, 0.2];
        let (holm, fdr) = correct(&p);
        let idx = order(&p, false);
        for w in idx.windows(2) {
            assert!(holm[w[1]] >= holm[w[0]]);
            assert!(fdr[w[1]] >= fdr[w[0]]);
        }
        for i in 0..p.len() {
            assert!(holm[i] >= p[i]);
            assert!(fdr[i] >= p[i]);
        }
    }

    #[test]
    fn single_value_is_unchanged() {
        let (holm, fdr) = correct(&[0.0123]);
        assert_all_close(&holm, &[0.0123]);
        assert_all_close(&fdr, &[0.0123]);
    }

    #[test]
    fn empty() {
        let (holm, fdr) = correct(&[]);
        assert!(holm.is_empty());
        assert!(fdr.is_empty());
    }
}
