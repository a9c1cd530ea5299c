//! Quantitative enrichment analysis (QEA)
//!
//! QEA works on measured abundances instead of a plain list of
//! compounds. Every abundance column is mapped to a library compound,
//! then each pathway is tested for an association of its measured
//! members with the phenotype of the samples.
//!
//! A run is split in three steps, so the expensive group tests can run
//! somewhere else:
//!
//! 1. [`prepare_qea`] maps the columns, computes the per-compound p-values
//!    and builds a [`GroupTestRequest`]
//! 2. a [`GroupTestExecutor`] turns the request into a [`GroupTestResponse`]
//! 3. [`QeaResume::finish`] ranks the pathways
//!
//! [`compute_qea`] runs all three steps.
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::abundance::{AbundanceTable, ClassLabels};
use crate::library::filter::FilteredLibrary;
use crate::library::hits::count_hits;
use crate::library::{Importance, PathwayId};
use crate::resolve::NameResolver;
use crate::result::{rank, Candidate, Pipeline, ResultTable};
use crate::stats::clamp_pvalue;
use crate::stats::linear::f_test_pvalue;
use crate::{CompoundId, CompoundSet, PseaError, PseaResult};

pub mod task;

pub use task::{
    BackgroundExecutor, GroupTestExecutor, GroupTestRequest, GroupTestResponse, InlineExecutor,
    PendingGroupTest,
};
use task::{HitColumns, PathwayTask};

/// The pathway-level group test of a QEA run
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum QeaMethod {
    /// The global test score statistic, `gt`
    #[default]
    GlobalTest,
    /// Global ANCOVA, `ga`
    GlobalAncova,
}

impl FromStr for QeaMethod {
    type Err = PseaError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gt" => Ok(QeaMethod::GlobalTest),
            "ga" => Ok(QeaMethod::GlobalAncova),
            _ => Err(PseaError::InvalidOption(format!("unknown QEA method: {s}"))),
        }
    }
}

impl Display for QeaMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QeaMethod::GlobalTest => write!(f, "gt"),
            QeaMethod::GlobalAncova => write!(f, "ga"),
        }
    }
}

/// The univariate p-value of every mapped compound, in column order
///
/// A compound whose linear model could not be fitted has no p-value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompoundPvalues {
    values: Vec<(CompoundId, Option<f64>)>,
}

impl CompoundPvalues {
    /// The p-value of a compound
    ///
    /// Returns `None` if the compound was not measured or its model failed.
    pub fn get(&self, id: &CompoundId) -> Option<f64> {
        self.values
            .iter()
            .find(|(compound, _)| compound == id)
            .and_then(|(_, p)| *p)
    }

    /// Iterates all compounds with their p-value
    pub fn iter(&self) -> std::slice::Iter<'_, (CompoundId, Option<f64>)> {
        self.values.iter()
    }

    /// The number of mapped compounds
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no compound was mapped
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'a> IntoIterator for &'a CompoundPvalues {
    type Item = &'a (CompoundId, Option<f64>);
    type IntoIter = std::slice::Iter<'a, (CompoundId, Option<f64>)>;
    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Maps abundance columns to compounds
///
/// Returns the mapped compounds and their column index in the table.
/// Unresolved columns are dropped, and so is every column that resolves
/// to an already mapped compound.
fn map_columns(table: &AbundanceTable, resolver: &dyn NameResolver) -> (Vec<CompoundId>, Vec<usize>) {
    let mut used = CompoundSet::new();
    let mut ids = Vec::new();
    let mut indices = Vec::new();
    for (idx, name) in table.columns().iter().enumerate() {
        match resolver.resolve(name) {
            Some(id) => {
                if used.insert(id.clone()) {
                    ids.push(id);
                    indices.push(idx);
                } else {
                    warn!("Dropping column {}: {} is already mapped", name, id);
                }
            }
            None => debug!("Dropping column {}: not resolved", name),
        }
    }
    (ids, indices)
}

/// Everything needed to rank a QEA run once its group tests are done
#[derive(Debug, Clone)]
pub struct QeaResume {
    pathways: Vec<PendingPathway>,
    compound_pvalues: CompoundPvalues,
}

#[derive(Debug, Clone)]
struct PendingPathway {
    id: PathwayId,
    name: String,
    set_size: usize,
    impact: Option<f64>,
    hit_ids: Vec<CompoundId>,
}

impl QeaResume {
    /// The per-compound p-values of the run
    pub fn compound_pvalues(&self) -> &CompoundPvalues {
        &self.compound_pvalues
    }

    /// Ranks the pathways by the outcomes of their group tests
    ///
    /// # Errors
    ///
    /// [`PseaError::DataAlignment`] if `response` does not contain the
    /// outcomes of exactly the requested pathways, in request order
    pub fn finish(self, response: GroupTestResponse) -> PseaResult<(ResultTable, CompoundPvalues)> {
        let outcomes = response.into_outcomes();
        if outcomes.len() != self.pathways.len() {
            return Err(PseaError::DataAlignment(format!(
                "{} pathways requested, but {} outcomes received",
                self.pathways.len(),
                outcomes.len()
            )));
        }

        let mut candidates = Vec::with_capacity(outcomes.len());
        for (pathway, (id, outcome)) in self.pathways.into_iter().zip(outcomes) {
            if pathway.id != id {
                return Err(PseaError::DataAlignment(format!(
                    "expected outcome of {}, received {}",
                    pathway.id, id
                )));
            }
            candidates.push(Candidate {
                id: pathway.id,
                name: pathway.name,
                total: pathway.set_size,
                expected: None,
                hits: outcome.match_count,
                raw_p: clamp_pvalue(outcome.pvalue),
                impact: pathway.impact,
                hit_ids: pathway.hit_ids,
            });
        }

        let tested = candidates.len();
        let table = rank(Pipeline::Qea, candidates);
        info!(
            "QEA of {} compounds: {} of {} tested pathways reported",
            self.compound_pvalues.len(),
            table.len(),
            tested
        );
        Ok((table, self.compound_pvalues))
    }
}

/// Prepares a QEA run of `table` against the `library`
///
/// # Errors
///
/// - [`PseaError::InvalidInput`] if there are fewer than 3 samples, the
///   number of labels does not match the number of samples, no column
///   can be mapped or no pathway is hit by a mapped compound
///
/// Mapped columns holding `NaN` or infinite values are left out of the
/// group tests. Their compounds are listed without a p-value.
pub fn prepare_qea(
    table: &AbundanceTable,
    labels: &ClassLabels,
    resolver: &dyn NameResolver,
    library: &FilteredLibrary<'_>,
    importance: Importance,
    method: QeaMethod,
) -> PseaResult<(GroupTestRequest, QeaResume)> {
    let (samples, _) = table.dim();
    if labels.len() != samples {
        return Err(PseaError::InvalidInput(format!(
            "{} class labels for {} samples",
            labels.len(),
            samples
        )));
    }
    if samples < 3 {
        return Err(PseaError::InvalidInput(format!(
            "QEA needs at least 3 samples, got {samples}"
        )));
    }

    let (mapped, mapped_indices) = map_columns(table, resolver);
    if mapped.is_empty() {
        return Err(PseaError::InvalidInput("insufficient mapped data".to_string()));
    }

    let codes = labels.codes();
    let mut values = Vec::with_capacity(mapped.len());
    let mut ids = Vec::with_capacity(mapped.len());
    let mut indices = Vec::with_capacity(mapped.len());
    for (id, idx) in mapped.into_iter().zip(mapped_indices) {
        let column: Vec<f64> = table.column(idx).copied().collect();
        // non-finite columns never reach the group tests
        if column.iter().any(|value| !value.is_finite()) {
            warn!("Compound {}: non-finite abundance, column dropped", id);
            values.push((id, None));
            continue;
        }
        let pvalue = f_test_pvalue(&column, &codes);
        if pvalue.is_none() {
            warn!("Compound {}: linear model cannot be fitted", id);
        }
        values.push((id.clone(), pvalue));
        ids.push(id);
        indices.push(idx);
    }
    let compound_pvalues = CompoundPvalues { values };

    let position: HashMap<&CompoundId, usize> =
        ids.iter().enumerate().map(|(pos, id)| (id, pos)).collect();
    let present: CompoundSet = ids.iter().cloned().collect();

    let mut tasks = Vec::new();
    let mut pending = Vec::new();
    for hit in count_hits(library, &present) {
        let pathway = hit.pathway();
        if hit.hits().is_empty() {
            debug!("Pathway:{}\tno measured compounds, skipped", pathway.id());
            continue;
        }
        let columns: HitColumns = hit
            .hits()
            .iter()
            .filter_map(|id| position.get(id).copied())
            .collect();
        let impact = library
            .importance(importance, pathway.id())
            .and_then(|map| map.sum_over(hit.hits()));
        tasks.push(PathwayTask::new(
            pathway.id().clone(),
            columns,
            hit.set_num(),
            impact,
        ));
        pending.push(PendingPathway {
            id: pathway.id().clone(),
            name: pathway.name().to_string(),
            set_size: hit.set_num(),
            impact,
            hit_ids: hit.hits().iter().cloned().collect(),
        });
    }
    if tasks.is_empty() {
        return Err(PseaError::InvalidInput("insufficient mapped data".to_string()));
    }

    debug!(
        "QEA ({}): {} of {} columns mapped, {} pathways to test",
        method,
        ids.len(),
        table.columns().len(),
        tasks.len()
    );

    let request = GroupTestRequest::new(method, table.select(&indices), labels.clone(), tasks);
    let resume = QeaResume {
        pathways: pending,
        compound_pvalues,
    };
    Ok((request, resume))
}

/// Runs QEA of `table` against the `library`
///
/// # Errors
///
/// - [`PseaError::InvalidInput`] as described in [`prepare_qea`]
/// - [`PseaError::Computation`] if the group test of any pathway fails
///
/// # Examples
///
/// ```
/// use psea::{AbundanceTable, ClassLabels, CompoundId, FilteredLibrary, Importance, Library, LookupResolver};
/// use psea::library::{ImportanceMap, Pathway};
/// use psea::qea::{compute_qea, InlineExecutor, QeaMethod};
///
/// let glucose = CompoundId::try_from("C00031").unwrap();
/// let pyruvate = CompoundId::try_from("C00022").unwrap();
/// let members = [glucose.clone(), pyruvate.clone()].into_iter().collect();
/// let rbc: ImportanceMap = [(glucose.clone(), 0.4), (pyruvate.clone(), 0.6)].into_iter().collect();
/// let mut library = Library::default();
/// library.add_pathway(
///     Pathway::new("hsa00010".into(), "Glycolysis", members)
///         .with_importance(Importance::Betweenness, rbc)
/// ).unwrap();
///
/// let mut resolver = LookupResolver::default();
/// resolver.insert("Glucose", glucose);
/// resolver.insert("Pyruvate", pyruvate);
///
/// let table = AbundanceTable::new(
///     vec!["Glucose", "Pyruvate"],
///     6,
///     vec![2.1, 0.9, 2.4, 1.1, 1.9, 1.0, 3.8, 1.9, 4.1, 2.2, 3.5, 2.0],
/// ).unwrap();
/// let labels = ClassLabels::categorical(&["ctrl", "ctrl", "ctrl", "case", "case", "case"]);
///
/// let filtered = FilteredLibrary::new(&library, None);
/// let (result, pvalues) = compute_qea(
///     &table, &labels, &resolver, &filtered,
///     Importance::Betweenness, QeaMethod::GlobalTest, &InlineExecutor,
/// ).unwrap();
///
/// assert_eq!(pvalues.len(), 2);
/// let glycolysis = &result.rows()[0];
/// assert_eq!(glycolysis.hits(), 2);
/// assert!(glycolysis.raw_p() < 0.01);
/// assert!((glycolysis.impact() - 1.0).abs() < 1e-12);
/// ```
pub fn compute_qea(
    table: &AbundanceTable,
    labels: &ClassLabels,
    resolver: &dyn NameResolver,
    library: &FilteredLibrary<'_>,
    importance: Importance,
    method: QeaMethod,
    executor: &dyn GroupTestExecutor,
) -> PseaResult<(ResultTable, CompoundPvalues)> {
    let (request, resume) = prepare_qea(table, labels, resolver, library, importance, method)?;
    let response = executor.execute(request)?;
    resume.finish(response)
}
