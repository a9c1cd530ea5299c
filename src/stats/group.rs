//! Pathway-level association tests of a set of compounds with the phenotype
//!
//! Both tests take the `samples x compounds` abundance matrix of the
//! compounds that hit one pathway and test the null hypothesis that none
//! of them is associated with the class labels.
//!
//! - [`global_test`] is the score test of the global test family: it
//!   measures how much of the (centred) phenotype is explained by the
//!   compound set as a whole.
//! - [`global_ancova`] pools per-compound ANOVA sums of squares across the
//!   set and compares them in a single F-like statistic.
//!
//! The null distribution of both statistics is a weighted sum of χ²
//! variables. It is approximated by matching moments to scaled χ²
//! variables, which is exact for a single compound and needs no random
//! permutations, so results are reproducible.
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

use crate::abundance::ClassLabels;
use crate::stats::{clamp_pvalue, f64_from_usize, mean};
use crate::{PseaError, PseaResult};

/// Relative size below which eigenvalues and sums of squares count as zero
const ZERO_TOLERANCE: f64 = 1e-12;

/// The result of a group test for one pathway
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupTestOutcome {
    /// The number of compounds that entered the test
    pub match_count: usize,
    /// The test statistic
    pub statistic: f64,
    /// The expected value of the statistic under the null hypothesis, if known
    pub expected: Option<f64>,
    /// The p-value
    pub pvalue: f64,
}

fn validate(data: &DMatrix<f64>, labels: usize) -> PseaResult<()> {
    let (n, m) = data.shape();
    if n != labels {
        return Err(PseaError::DataAlignment(format!(
            "{n} samples in the abundance matrix, but {labels} class labels"
        )));
    }
    if n < 3 {
        return Err(PseaError::InvalidInput(format!(
            "group tests need at least 3 samples, got {n}"
        )));
    }
    if m == 0 {
        return Err(PseaError::InvalidInput(
            "group test of an empty compound set".to_string(),
        ));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(PseaError::Computation(
            "abundance matrix contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

fn center_columns(data: &DMatrix<f64>) -> DMatrix<f64> {
    let mut centered = data.clone();
    for mut col in centered.column_iter_mut() {
        let m = col.mean();
        col.add_scalar_mut(-m);
    }
    centered
}

/// Calculates `P(sum(w_i * X_i) > 0)` for independent `X_i ~ χ²(1)`
///
/// Positive and negative parts are each matched to a scaled χ² variable
/// by their first two moments, their ratio then follows an F distribution.
fn positive_weighted_chi2(weights: &[f64]) -> PseaResult<f64> {
    let scale = weights.iter().fold(0.0_f64, |acc, w| acc.max(w.abs()));
    let tolerance = scale * ZERO_TOLERANCE;
    let (mut pos, mut pos_sq, mut neg, mut neg_sq) = (0.0, 0.0, 0.0, 0.0);
    for &w in weights {
        if w > tolerance {
            pos += w;
            pos_sq += w * w;
        } else if w < -tolerance {
            neg -= w;
            neg_sq += w * w;
        }
    }
    if pos <= 0.0 {
        return Ok(0.0);
    }
    if neg <= 0.0 {
        return Ok(1.0);
    }
    let dist = FisherSnedecor::new(pos * pos / pos_sq, neg * neg / neg_sq)?;
    Ok(dist.sf(neg / pos))
}

/// Global test of association between a compound set and the `response`
///
/// `data` is the `samples x compounds` matrix of the compound set,
/// `response` the numeric class code of every sample.
///
/// # Errors
///
/// - [`PseaError::DataAlignment`] if `response` does not have one value per sample
/// - [`PseaError::InvalidInput`] with fewer than 3 samples or no compounds
/// - [`PseaError::Computation`] if the response is constant or the data is not finite
///
/// # Examples
///
/// ```
/// use nalgebra::DMatrix;
/// use psea::stats::group::global_test;
///
/// let data = DMatrix::from_column_slice(6, 2, &[
///     2.1, 2.4, 1.9, 3.8, 4.1, 3.5,
///     0.9, 1.1, 1.0, 1.9, 2.2, 2.0,
/// ]);
/// let class = [1.0, 1.0, 1.0, 2.0, 2.0, 2.0];
/// let outcome = global_test(&data, &class).unwrap();
/// assert_eq!(outcome.match_count, 2);
/// assert!(outcome.pvalue < 0.01);
/// ```
pub fn global_test(data: &DMatrix<f64>, response: &[f64]) -> PseaResult<GroupTestOutcome> {
    validate(data, response.len())?;
    let (n, m) = data.shape();

    let response_mean = mean(response);
    let residuals = DVector::from_iterator(n, response.iter().map(|y| y - response_mean));
    let residual_ss = residuals.norm_squared();
    if residual_ss <= 0.0 {
        return Err(PseaError::Computation(
            "class labels do not vary across samples".to_string(),
        ));
    }

    let z = center_columns(data);
    let statistic = z.tr_mul(&residuals).norm_squared() / residual_ss;

    // eigenvalues of Z'Z equal the non-zero eigenvalues of ZZ',
    // which has rank n - 1 at most after centering
    let gram = z.tr_mul(&z);
    let mut eigenvalues: Vec<f64> = gram
        .symmetric_eigenvalues()
        .iter()
        .map(|v| v.max(0.0))
        .collect();
    eigenvalues.sort_by(|a, b| b.total_cmp(a));
    eigenvalues.resize(n - 1, 0.0);

    let total: f64 = eigenvalues.iter().sum();
    let expected = total / f64_from_usize(n - 1);
    if total <= 0.0 {
        // no variance within the compound set, nothing to associate
        return Ok(GroupTestOutcome {
            match_count: m,
            statistic,
            expected: Some(expected),
            pvalue: 1.0,
        });
    }

    let weights: Vec<f64> = eigenvalues.iter().map(|l| l - statistic).collect();
    let pvalue = positive_weighted_chi2(&weights)?;

    Ok(GroupTestOutcome {
        match_count: m,
        statistic,
        expected: Some(expected),
        pvalue: clamp_pvalue(pvalue),
    })
}

/// Residuals of every column under the full model and the model degrees of freedom
struct FullModel {
    residuals: DMatrix<f64>,
    df_hypothesis: f64,
    df_residual: f64,
}

fn fit_full_model(centered: &DMatrix<f64>, labels: &ClassLabels) -> PseaResult<FullModel> {
    let n = centered.nrows();
    let mut residuals = centered.clone();

    if let Some((groups, k)) = labels.groups() {
        if k < 2 {
            return Err(PseaError::Computation(
                "class labels define fewer than two groups".to_string(),
            ));
        }
        if n <= k {
            return Err(PseaError::InvalidInput(format!(
                "{n} samples are not enough to compare {k} groups"
            )));
        }
        let mut sizes = vec![0usize; k];
        for g in &groups {
            sizes[*g] += 1;
        }
        for mut col in residuals.column_iter_mut() {
            let mut sums = vec![0.0; k];
            for (value, g) in col.iter().zip(&groups) {
                sums[*g] += value;
            }
            for (value, g) in col.iter_mut().zip(&groups) {
                *value -= sums[*g] / f64_from_usize(sizes[*g]);
            }
        }
        Ok(FullModel {
            residuals,
            df_hypothesis: f64_from_usize(k - 1),
            df_residual: f64_from_usize(n - k),
        })
    } else {
        let codes = labels.codes();
        let code_mean = mean(&codes);
        let t = DVector::from_iterator(n, codes.iter().map(|c| c - code_mean));
        let stt = t.norm_squared();
        if stt <= 0.0 {
            return Err(PseaError::Computation(
                "class labels do not vary across samples".to_string(),
            ));
        }
        for mut col in residuals.column_iter_mut() {
            let slope = col.dot(&t) / stt;
            col.axpy(-slope, &t, 1.0);
        }
        Ok(FullModel {
            residuals,
            df_hypothesis: 1.0,
            df_residual: f64_from_usize(n - 2),
        })
    }
}

/// Global ANCOVA of a compound set against the class `labels`
///
/// Categorical labels are compared as groups, continuous labels as a
/// linear trend. The statistic is
/// `(sum(SS_hyp) / df1) / (sum(RSS) / df2)` pooled over all compounds.
///
/// # Errors
///
/// - [`PseaError::DataAlignment`] if `labels` does not have one entry per sample
/// - [`PseaError::InvalidInput`] with too few samples or no compounds
/// - [`PseaError::Computation`] if the labels define no contrast or the data is not finite
///
/// # Examples
///
/// ```
/// use nalgebra::DMatrix;
/// use psea::ClassLabels;
/// use psea::stats::group::global_ancova;
///
/// let data = DMatrix::from_column_slice(6, 2, &[
///     2.1, 2.4, 1.9, 3.8, 4.1, 3.5,
///     0.9, 1.1, 1.0, 1.9, 2.2, 2.0,
/// ]);
/// let labels = ClassLabels::categorical(&["ctrl", "ctrl", "ctrl", "case", "case", "case"]);
/// let outcome = global_ancova(&data, &labels).unwrap();
/// assert!(outcome.pvalue < 0.01);
/// ```
pub fn global_ancova(data: &DMatrix<f64>, labels: &ClassLabels) -> PseaResult<GroupTestOutcome> {
    validate(data, labels.len())?;
    let m = data.ncols();

    let centered = center_columns(data);
    let total_ss = centered.norm_squared();
    let model = fit_full_model(&centered, labels)?;
    let residual_ss = model.residuals.norm_squared();
    let hypothesis_ss = (total_ss - residual_ss).max(0.0);

    let tolerance = total_ss * ZERO_TOLERANCE;
    if total_ss <= 0.0 || hypothesis_ss <= tolerance {
        return Ok(GroupTestOutcome {
            match_count: m,
            statistic: 0.0,
            expected: None,
            pvalue: 1.0,
        });
    }
    if residual_ss <= tolerance {
        // the groups separate every compound perfectly
        return Ok(GroupTestOutcome {
            match_count: m,
            statistic: f64::INFINITY,
            expected: None,
            pvalue: clamp_pvalue(0.0),
        });
    }

    let statistic =
        (hypothesis_ss / model.df_hypothesis) / (residual_ss / model.df_residual);

    // effective number of independent compounds from the residual covariance
    let cross = model.residuals.tr_mul(&model.residuals);
    let trace = cross.trace();
    let effective = trace * trace / cross.norm_squared();

    let dist = FisherSnedecor::new(
        effective * model.df_hypothesis,
        effective * model.df_residual,
    )?;

    Ok(GroupTestOutcome {
        match_count: m,
        statistic,
        expected: None,
        pvalue: clamp_pvalue(dist.sf(statistic)),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::stats::linear::f_test_pvalue;

    const ABUNDANCE: [f64; 6] = [0.3, 1.2, 2.2, 2.9, 4.4, 5.1];
    const CLASS: [f64; 6] = [1.0, 1.0, 2.0, 1.0, 2.0, 2.0];

    #[test]
    fn single_compound_global_test_is_the_linear_model() {
        let data = DMatrix::from_column_slice(6, 1, &ABUNDANCE);
        let outcome = global_test(&data, &CLASS).unwrap();
        let expected = f_test_pvalue(&ABUNDANCE, &CLASS).unwrap();
        assert_eq!(outcome.match_count, 1);
        assert!((outcome.pvalue - expected).abs() < 1e-10);
    }

    #[test]
    fn single_compound_ancova_is_the_anova() {
        let data = DMatrix::from_column_slice(6, 1, &ABUNDANCE);
        let labels = ClassLabels::categorical(&["a", "a", "b", "a", "b", "b"]);
        let outcome = global_ancova(&data, &labels).unwrap();
        // with 2 groups, the one-way ANOVA equals the regression on the group code
        let expected = f_test_pvalue(&ABUNDANCE, &CLASS).unwrap();
        assert!((outcome.pvalue - expected).abs() < 1e-10);

        let continuous = ClassLabels::Continuous(CLASS.to_vec());
        let outcome = global_ancova(&data, &continuous).unwrap();
        assert!((outcome.pvalue - expected).abs() < 1e-10);
    }

    #[test]
    fn associated_set_is_more_significant() {
        let class = [1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0];
        let associated = DMatrix::from_column_slice(
            8,
            2,
            &[
                1.0, 1.2, 0.9, 1.1, 2.0, 2.2, 1.9, 2.1, //
                5.1, 4.8, 5.0, 5.2, 6.1, 5.9, 6.2, 6.0,
            ],
        );
        let unrelated = DMatrix::from_column_slice(
            8,
            2,
            &[
                1.0, 2.0, 1.5, 0.5, 1.0, 2.0, 0.5, 1.5, //
                3.0, 2.0, 2.5, 3.5, 2.0, 3.0, 3.5, 2.5,
            ],
        );
        let strong = global_test(&associated, &class).unwrap();
        let weak = global_test(&unrelated, &class).unwrap();
        assert!(strong.pvalue < 1e-4);
        assert!(weak.pvalue > 0.5);
        assert!(strong.statistic > strong.expected.unwrap());

        let labels = ClassLabels::Continuous(class.to_vec());
        let strong = global_ancova(&associated, &labels).unwrap();
        let weak = global_ancova(&unrelated, &labels).unwrap();
        assert!(strong.pvalue < 1e-4);
        assert!(weak.pvalue > 0.5);
    }

    #[test]
    fn constant_compounds_are_not_significant() {
        let data = DMatrix::from_element(6, 2, 3.0);
        let outcome = global_test(&data, &CLASS).unwrap();
        assert!((outcome.pvalue - 1.0).abs() < f64::EPSILON);

        let labels = ClassLabels::Continuous(CLASS.to_vec());
        let outcome = global_ancova(&data, &labels).unwrap();
        assert!((outcome.pvalue - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn constant_labels_fail() {
        let data = DMatrix::from_column_slice(6, 1, &ABUNDANCE);
        assert!(matches!(
            global_test(&data, &[1.0; 6]),
            Err(PseaError::Computation(_))
        ));
        let labels = ClassLabels::categorical(&["a"; 6]);
        assert!(matches!(
            global_ancova(&data, &labels),
            Err(PseaError::Computation(_))
        ));
    }

    #[test]
    fn misaligned_labels_fail() {
        let data = DMatrix::from_column_slice(6, 1, &ABUNDANCE);
        assert!(matches!(
            global_test(&data, &[1.0, 2.0, 1.0]),
            Err(PseaError::DataAlignment(_))
        ));
    }

    #[test]
    fn weighted_chi2_edges() {
        assert!((positive_weighted_chi2(&[1.0, 2.0]).unwrap() - 1.0).abs() < f64::EPSILON);
        assert!(positive_weighted_chi2(&[-1.0, -2.0]).unwrap().abs() < f64::EPSILON);
        // symmetric weights, P(X1 > X2) == 0.5
        assert!((positive_weighted_chi2(&[1.0, -1.0]).unwrap() - 0.5).abs() < 1e-12);
    }
}
