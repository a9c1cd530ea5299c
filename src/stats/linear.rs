//! Univariate association of a single compound with the phenotype
//!
//! For every compound a simple linear model `class ~ abundance` is fitted
//! and the overall F test of the model (1 and `n - 2` degrees of freedom)
//! gives the compound's p-value.
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

use crate::stats::{f64_from_usize, mean};

/// The fitted simple linear regression of `y` on `x`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Slope of the regression line
    pub slope: f64,
    /// Intercept of the regression line
    pub intercept: f64,
    /// The F statistic of the model
    pub f_statistic: f64,
    /// Residual degrees of freedom
    pub df_residual: f64,
    /// The p-value of the F test
    pub pvalue: f64,
}

/// Fits `y ~ x` by least squares and runs the model F test
///
/// Returns `None` if the model cannot be fitted: fewer than 3 observations,
/// mismatched lengths, non-finite values or no variance in `x` or `y`.
///
/// # Examples
///
/// ```
/// use psea::stats::linear::fit;
///
/// let abundance = [2.1, 2.4, 1.9, 3.8, 4.1, 3.5];
/// let class = [1.0, 1.0, 1.0, 2.0, 2.0, 2.0];
/// let model = fit(&abundance, &class).unwrap();
/// assert!(model.pvalue < 0.01);
///
/// // constant abundance cannot be fitted
/// assert!(fit(&[1.0; 6], &class).is_none());
/// ```
pub fn fit(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let n = x.len();
    if n < 3 || n != y.len() {
        return None;
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return None;
    }

    let x_mean = mean(x);
    let y_mean = mean(y);
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let ss_model = sxy * sxy / sxx;
    let ss_residual = (syy - ss_model).max(0.0);
    let df_residual = f64_from_usize(n - 2);

    let (f_statistic, pvalue) = if ss_residual <= syy * f64::EPSILON {
        // essentially perfect fit
        (f64::INFINITY, 0.0)
    } else {
        let f = ss_model / (ss_residual / df_residual);
        let dist = FisherSnedecor::new(1.0, df_residual).ok()?;
        (f, dist.sf(f))
    };

    Some(LinearFit {
        slope,
        intercept: y_mean - slope * x_mean,
        f_statistic,
        df_residual,
        pvalue,
    })
}

/// Convenience wrapper returning only the F test p-value of `y ~ x`
pub fn f_test_pvalue(x: &[f64], y: &[f64]) -> Option<f64> {
    fit(x, y).map(|model| model.pvalue)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn matches_reference_anova() {
        // R: anova(lm(y ~ x)) with
        // x <- c(1, 2, 3, 4, 5); y <- c(2, 4, 5, 4, 5)
        // F = 4.5, Pr(>F) = 0.124027
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        let model = fit(&x, &y).unwrap();
        assert!((model.slope - 0.6).abs() < 1e-12);
        assert!((model.intercept - 2.2).abs() < 1e-12);
        assert!((model.f_statistic - 4.5).abs() < 1e-10);
        assert!((model.df_residual - 3.0).abs() < f64::EPSILON);
        assert!((model.pvalue - 0.124_027_062_657_554_7).abs() < 1e-9);
    }

    #[test]
    fn symmetric_in_x_and_y() {
        let x = [0.3, 1.2, 2.2, 2.9, 4.4, 5.1];
        let y = [1.0, 1.0, 2.0, 1.0, 2.0, 2.0];
        let a = f_test_pvalue(&x, &y).unwrap();
        let b = f_test_pvalue(&y, &x).unwrap();
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(fit(&[1.0, 2.0], &[1.0, 2.0]).is_none());
        assert!(fit(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_none());
        assert!(fit(&[1.0, f64::NAN, 3.0], &[1.0, 2.0, 1.0]).is_none());
        assert!(fit(&[1.0, 2.0, 3.0], &[1.0, 1.0, 1.0]).is_none());
    }

    #[test]
    fn perfect_fit() {
        let model = fit(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!(model.pvalue.abs() < f64::EPSILON);
    }
}
