//! Statistical tests behind the enrichment pipelines
//!
//! - [`hypergeom`]: hypergeometric and Fisher exact tests for ORA
//! - [`linear`]: per-compound linear-model F test for QEA
//! - [`group`]: pathway-level global test and global ANCOVA for QEA
//! - [`correction`]: Holm and Benjamini-Hochberg p-value adjustment

pub mod correction;
pub mod group;
pub mod hypergeom;
pub mod linear;

pub use correction::{adjust, correct, Correction};

/// The smallest p-value that is reported
///
/// Tail probabilities that underflow to `0.0` are floored here, so that
/// every p-value stays within `(0, 1]` and `-ln(p)` remains finite.
pub const MIN_PVALUE: f64 = f64::MIN_POSITIVE;

/// Clamps a probability into `[MIN_PVALUE, 1]`
pub(crate) fn clamp_pvalue(p: f64) -> f64 {
    if p.is_nan() {
        return 1.0;
    }
    p.clamp(MIN_PVALUE, 1.0)
}

/// We have to frequently convert counts to f64 values
/// for divisions. To ensure some kind of safety
/// we only convert values that fit into a `u32`.
pub(crate) fn f64_from_usize(n: usize) -> f64 {
    match u32::try_from(n) {
        Ok(intermediate) => intermediate.into(),
        // counts beyond u32::MAX are never reached by metabolomics data,
        // a lossy conversion is still the best answer there
        #[allow(clippy::cast_precision_loss)]
        Err(_) => n as f64,
    }
}

/// Returns the mean of a slice, `0.0` for an empty slice
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / f64_from_usize(values.len())
}
