//! Hypergeometric and Fisher exact tests of hit counts
//!
//! Both answer the same question for ORA: how likely is it to see at
//! least `hit.num` pathway members among `q.size` query compounds drawn
//! from a universe of `uniq.count` compounds, of which `set.num` belong
//! to the pathway.
//!
//! # Examples
//!
//! ```
//! use psea::stats::hypergeom::{upper_tail, Alternative, ContingencyTable};
//!
//! // universe of 50 compounds, 25 in the pathway, 13 query compounds, 8 hits
//! let p = upper_tail(50, 25, 13, 8).unwrap();
//! assert!((p - 0.26009737477738537).abs() < 1e-12);
//!
//! // the one-sided Fisher test on the same numbers is identical
//! let table = ContingencyTable::from_counts(8, 25, 13, 50).unwrap();
//! assert!((table.fisher(Alternative::Greater).unwrap() - p).abs() < 1e-12);
//! ```
use statrs::distribution::{Discrete, DiscreteCDF, Hypergeometric};

use crate::stats::clamp_pvalue;
use crate::{PseaError, PseaResult};

/// Calculates `P(X >= observed)` for `X ~ Hypergeometric(population, successes, draws)`
///
/// # Errors
///
/// [`PseaError::Statistics`] if `successes` or `draws` exceed `population`
pub fn upper_tail(population: u64, successes: u64, draws: u64, observed: u64) -> PseaResult<f64> {
    let hyper = Hypergeometric::new(
        // Total number of compounds in the universe
        // ==> population
        population,
        // Number of compounds that belong to the pathway
        // ==> successes
        successes,
        // Number of query compounds
        // ==> draws
        draws,
    )?;
    if observed == 0 {
        return Ok(1.0);
    }
    // subtracting 1, because we want to test including observed
    // e.g. "7 or more", but sf by default calculates "more than 7"
    Ok(clamp_pvalue(hyper.sf(observed - 1)))
}

/// The alternative hypothesis of a Fisher exact test
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Alternative {
    /// The top left cell is larger than expected
    Greater,
    /// The table deviates from independence in any direction
    TwoSided,
}

/// A 2 x 2 contingency table of hit counts
///
/// ```text
///                 in pathway        not in pathway
/// query           hit.num           q.size - hit.num
/// not in query    set.num - hit.num rest
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ContingencyTable {
    a: u64,
    b: u64,
    c: u64,
    d: u64,
}

/// Relative tolerance when comparing table probabilities for the two-sided test
const RELATIVE_ERROR: f64 = 1.0 + 1e-7;

impl ContingencyTable {
    /// Constructs a table from the four cells, row by row
    pub fn new(a: u64, b: u64, c: u64, d: u64) -> Self {
        Self { a, b, c, d }
    }

    /// Constructs a table from ORA counts
    ///
    /// # Errors
    ///
    /// [`PseaError::InvalidInput`] if the counts are inconsistent,
    /// e.g. more hits than pathway members
    pub fn from_counts(hit_num: u64, set_num: u64, q_size: u64, uniq_count: u64) -> PseaResult<Self> {
        let invalid = || {
            PseaError::InvalidInput(format!(
                "inconsistent counts: {hit_num} hits, {set_num} members, {q_size} queries, {uniq_count} universe"
            ))
        };
        let b = q_size.checked_sub(hit_num).ok_or_else(invalid)?;
        let c = set_num.checked_sub(hit_num).ok_or_else(invalid)?;
        let d = uniq_count
            .checked_sub(set_num)
            .and_then(|rest| rest.checked_sub(b))
            .ok_or_else(invalid)?;
        Ok(Self::new(hit_num, b, c, d))
    }

    /// The total number of observations
    pub fn total(&self) -> u64 {
        self.a + self.b + self.c + self.d
    }

    /// The conditional distribution of the top left cell given fixed margins
    fn distribution(&self) -> PseaResult<Hypergeometric> {
        Ok(Hypergeometric::new(
            self.total(),
            // first column
            self.a + self.c,
            // first row
            self.a + self.b,
        )?)
    }

    /// Calculates the p-value of Fisher's exact test
    ///
    /// # Errors
    ///
    /// [`PseaError::InvalidInput`] if the table is empty
    pub fn fisher(&self, alternative: Alternative) -> PseaResult<f64> {
        if self.total() == 0 {
            return Err(PseaError::InvalidInput(
                "fisher test of an empty table".to_string(),
            ));
        }
        let hyper = self.distribution()?;
        match alternative {
            Alternative::Greater => {
                if self.a == 0 {
                    return Ok(1.0);
                }
                Ok(clamp_pvalue(hyper.sf(self.a - 1)))
            }
            Alternative::TwoSided => {
                let row1 = self.a + self.b;
                let col1 = self.a + self.c;
                let min = (row1 + col1).saturating_sub(self.total());
                let max = row1.min(col1);
                let observed = hyper.pmf(self.a) * RELATIVE_ERROR;
                let p: f64 = (min..=max)
                    .map(|k| hyper.pmf(k))
                    .filter(|&p| p <= observed)
                    .sum();
                Ok(clamp_pvalue(p))
            }
        }
    }
}
