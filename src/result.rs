//! The pathway result table of an analysis run
//!
//! [`rank`] turns the raw per-pathway results of an engine into the final
//! [`ResultTable`]: rows without hits or without a defined impact are
//! dropped, Holm and FDR adjusted p-values are added, rows are sorted and
//! all numbers rounded to 5 significant digits.
use std::cmp::Ordering;
use std::io::Write;

use crate::library::PathwayId;
use crate::stats::correct;
use crate::{CompoundId, PseaResult};

/// The number of significant digits of all reported numbers
pub const SIGNIFICANT_DIGITS: usize = 5;

/// The pipeline that produced a [`ResultTable`]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Pipeline {
    /// Over-representation analysis
    Ora,
    /// Quantitative enrichment analysis
    Qea,
}

impl Pipeline {
    /// The CSV header of the pipeline's table, the first cell holds the row labels
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            Pipeline::Ora => &[
                "", "Total", "Expected", "Hits", "RawP", "NegLogP", "HolmP", "FDR", "Impact",
            ],
            Pipeline::Qea => &[
                "",
                "TotalCompounds",
                "Hits",
                "RawP",
                "NegLogP",
                "HolmP",
                "FDR",
                "Impact",
            ],
        }
    }

    /// Orders two rows by raw p-value and then by impact
    ///
    /// Among equally significant pathways ORA lists the lower impact first,
    /// QEA the higher impact.
    fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        let by_p = a.raw_p.total_cmp(&b.raw_p);
        let by_impact = a.impact_or_zero().total_cmp(&b.impact_or_zero());
        match self {
            Pipeline::Ora => by_p.then(by_impact),
            Pipeline::Qea => by_p.then(by_impact.reverse()),
        }
    }
}

/// Rounds `x` to `digits` significant digits
///
/// # Examples
///
/// ```
/// use psea::result::signif;
///
/// assert_eq!(signif(0.000123456789, 5), 0.00012346);
/// assert_eq!(signif(123456.7, 5), 123460.0);
/// assert_eq!(signif(0.0, 5), 0.0);
/// ```
pub fn signif(x: f64, digits: usize) -> f64 {
    if x == 0.0 || !x.is_finite() || digits == 0 {
        return x;
    }
    // scientific formatting rounds on the exact decimal expansion
    format!("{:.*e}", digits - 1, x).parse().unwrap_or(x)
}

/// The unranked result of testing one pathway
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub id: PathwayId,
    pub name: String,
    pub total: usize,
    pub expected: Option<f64>,
    pub hits: usize,
    pub raw_p: f64,
    pub impact: Option<f64>,
    pub hit_ids: Vec<CompoundId>,
}

impl Candidate {
    fn impact_or_zero(&self) -> f64 {
        self.impact.unwrap_or(0.0)
    }
}

/// A single row of a [`ResultTable`]
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    id: PathwayId,
    name: String,
    total: usize,
    expected: Option<f64>,
    hits: usize,
    raw_p: f64,
    neg_log_p: f64,
    holm_p: f64,
    fdr: f64,
    impact: f64,
    hit_ids: Vec<CompoundId>,
}

impl ResultRow {
    /// The [`PathwayId`]
    pub fn id(&self) -> &PathwayId {
        &self.id
    }

    /// The display name of the pathway
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of (filtered) pathway members
    pub fn total(&self) -> usize {
        self.total
    }

    /// The expected number of hits, only reported by ORA
    pub fn expected(&self) -> Option<f64> {
        self.expected
    }

    /// The number of hits
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// The unadjusted p-value
    pub fn raw_p(&self) -> f64 {
        self.raw_p
    }

    /// `-ln(raw_p)`
    pub fn neg_log_p(&self) -> f64 {
        self.neg_log_p
    }

    /// Holm adjusted p-value
    pub fn holm_p(&self) -> f64 {
        self.holm_p
    }

    /// Benjamini-Hochberg adjusted p-value
    pub fn fdr(&self) -> f64 {
        self.fdr
    }

    /// The sum of topological importance over all hits
    pub fn impact(&self) -> f64 {
        self.impact
    }

    /// The compounds that hit the pathway, in sorted order
    pub fn hit_ids(&self) -> &[CompoundId] {
        &self.hit_ids
    }
}

/// The ranked pathway results of one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pipeline: Pipeline,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    /// The pipeline that produced the table
    pub fn pipeline(&self) -> Pipeline {
        self.pipeline
    }

    /// All rows, best ranked first
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Iterates all rows, best ranked first
    pub fn iter(&self) -> std::slice::Iter<'_, ResultRow> {
        self.rows.iter()
    }

    /// The number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if no pathway is reported
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the row of the given pathway
    pub fn get(&self, id: &PathwayId) -> Option<&ResultRow> {
        self.rows.iter().find(|row| row.id() == id)
    }

    /// Writes the table as CSV, with display names as row labels
    ///
    /// # Errors
    ///
    /// [`crate::PseaError::Csv`] if writing fails
    pub fn write_csv<W: Write>(&self, writer: W) -> PseaResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(self.pipeline.header())?;
        for row in &self.rows {
            let mut record = vec![row.name.clone(), row.total.to_string()];
            if self.pipeline == Pipeline::Ora {
                record.push(format_number(row.expected.unwrap_or(0.0)));
            }
            record.push(row.hits.to_string());
            for value in [row.raw_p, row.neg_log_p, row.holm_p, row.fdr, row.impact] {
                record.push(format_number(value));
            }
            csv.write_record(&record)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Returns the CSV representation of the table
    ///
    /// # Errors
    ///
    /// [`crate::PseaError::Csv`] if the table cannot be serialized
    pub fn to_csv_string(&self) -> PseaResult<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|err| crate::PseaError::Computation(err.to_string()))
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a ResultRow;
    type IntoIter = std::slice::Iter<'a, ResultRow>;
    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Formats a rounded number, using scientific notation for very small values
fn format_number(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e15).contains(&magnitude) {
        format!("{value:e}")
    } else {
        format!("{value}")
    }
}

/// Filters, corrects, sorts and rounds the candidates of one pipeline
///
/// Candidates must be in library order, the sort is stable so exact
/// ties keep that order.
pub(crate) fn rank(pipeline: Pipeline, candidates: Vec<Candidate>) -> ResultTable {
    let kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| c.hits > 0 && c.impact.is_some())
        .collect();

    let raw: Vec<f64> = kept.iter().map(|c| c.raw_p).collect();
    let (holm, fdr) = correct(&raw);

    let mut scored: Vec<(Candidate, f64, f64)> = kept
        .into_iter()
        .zip(holm)
        .zip(fdr)
        .map(|((c, h), f)| (c, h, f))
        .collect();
    scored.sort_by(|a, b| pipeline.compare(&a.0, &b.0));

    let rows = scored
        .into_iter()
        .map(|(c, holm_p, fdr)| ResultRow {
            neg_log_p: signif(-c.raw_p.ln(), SIGNIFICANT_DIGITS),
            raw_p: signif(c.raw_p, SIGNIFICANT_DIGITS),
            holm_p: signif(holm_p, SIGNIFICANT_DIGITS),
            fdr: signif(fdr, SIGNIFICANT_DIGITS),
            expected: c.expected.map(|e| signif(e, SIGNIFICANT_DIGITS)),
            impact: signif(c.impact_or_zero(), SIGNIFICANT_DIGITS),
            id: c.id,
            name: c.name,
            total: c.total,
            hits: c.hits,
            hit_ids: c.hit_ids,
        })
        .collect();

    ResultTable { pipeline, rows }
}
