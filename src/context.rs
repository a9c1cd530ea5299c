//! The staged state of one enrichment analysis
use tracing::debug;

use crate::abundance::{AbundanceTable, ClassLabels};
use crate::library::filter::FilteredLibrary;
use crate::library::PathwayLibrary;
use crate::ora::compute_ora;
use crate::qea::{compute_qea, CompoundPvalues, GroupTestExecutor};
use crate::resolve::{NameMap, NameResolver, QuerySet};
use crate::result::ResultTable;
use crate::{AnalysisOptions, PseaError, PseaResult};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// `AnalysisContext` carries all state of one enrichment analysis
///
/// Every stage consumes the context and returns a new one, so a context
/// is never modified after it was handed out. Stages that fail return the
/// error and drop the context.
///
/// ```mermaid
/// flowchart LR
///     N[NameResolver] --> Q[QuerySet]
///     L[PathwayLibrary] --> F[FilteredLibrary]
///     R[reference] -.-> F
///     Q --> O[ORA]
///     F --> O
///     A[AbundanceTable] --> E[QEA]
///     F --> E
///     O --> T[ResultTable]
///     E --> T
///     E --> P[CompoundPvalues]
/// ```
///
/// # Examples
///
/// ```
/// use psea::{AnalysisContext, AnalysisOptions, CompoundId, Importance, Library, LookupResolver};
/// use psea::library::{ImportanceMap, Pathway};
///
/// let ids: Vec<CompoundId> = ["C00031", "C00022", "C00186", "C00118", "C00197"]
///     .into_iter()
///     .map(|id| CompoundId::try_from(id).unwrap())
///     .collect();
/// let rbc: ImportanceMap = ids.iter().map(|id| (id.clone(), 0.2)).collect();
///
/// let mut library = Library::default();
/// library.add_pathway(
///     Pathway::new("hsa00010".into(), "Glycolysis", ids[..4].iter().cloned().collect())
///         .with_importance(Importance::Betweenness, rbc.clone())
/// ).unwrap();
/// library.add_pathway(
///     Pathway::new("hsa00030".into(), "Pentose phosphate pathway", ids[3..].iter().cloned().collect())
///         .with_importance(Importance::Betweenness, rbc)
/// ).unwrap();
///
/// let mut resolver = LookupResolver::default();
/// resolver.insert("Glucose", ids[0].clone());
/// resolver.insert("Pyruvate", ids[1].clone());
///
/// let context = AnalysisContext::new(AnalysisOptions::default())
///     .with_library(&library)
///     .with_query(&["glucose", "Pyruvate", "Unknown"], &resolver)
///     .unwrap()
///     .run_ora()
///     .unwrap();
///
/// assert_eq!(context.name_map().unwrap().mapped_count(), 2);
/// let result = context.result().unwrap();
/// assert_eq!(result.len(), 1);
/// assert_eq!(result.rows()[0].name(), "Glycolysis");
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisContext<'a> {
    options: AnalysisOptions,
    library: Option<FilteredLibrary<'a>>,
    name_map: Option<NameMap>,
    query: Option<QuerySet>,
    result: Option<ResultTable>,
    compound_pvalues: Option<CompoundPvalues>,
}

impl<'a> AnalysisContext<'a> {
    /// Starts a new analysis
    pub fn new(options: AnalysisOptions) -> Self {
        Self {
            options,
            library: None,
            name_map: None,
            query: None,
            result: None,
            compound_pvalues: None,
        }
    }

    /// Selects the pathway library and applies the reference metabolome
    ///
    /// Results of earlier runs are discarded.
    pub fn with_library(self, library: &'a dyn PathwayLibrary) -> Self {
        let filtered = FilteredLibrary::new(library, self.options.reference());
        Self {
            library: Some(filtered),
            result: None,
            compound_pvalues: None,
            ..self
        }
    }

    /// Maps the user's compound names to the query of an ORA run
    ///
    /// # Errors
    ///
    /// [`PseaError::InvalidInput`] if none of the names can be resolved
    pub fn with_query<S: AsRef<str>>(self, names: &[S], resolver: &dyn NameResolver) -> PseaResult<Self> {
        let name_map = NameMap::build(resolver, names);
        debug!(
            "Mapped {} of {} query compounds",
            name_map.mapped_count(),
            name_map.len()
        );
        let query = name_map.query_set()?;
        Ok(Self {
            name_map: Some(name_map),
            query: Some(query),
            result: None,
            compound_pvalues: None,
            ..self
        })
    }

    /// Runs ORA of the query against the library
    ///
    /// # Errors
    ///
    /// - [`PseaError::InvalidInput`] if no library or query was set, or
    ///   any error of [`compute_ora`]
    pub fn run_ora(self) -> PseaResult<Self> {
        let library = self.filtered_library()?;
        let query = self
            .query
            .as_ref()
            .ok_or_else(|| PseaError::InvalidInput("no valid compounds".to_string()))?;
        let result = compute_ora(
            query,
            library,
            self.options.importance(),
            self.options.ora_method(),
        )?;
        Ok(Self {
            result: Some(result),
            compound_pvalues: None,
            ..self
        })
    }

    /// Runs QEA of an abundance table against the library
    ///
    /// # Errors
    ///
    /// - [`PseaError::InvalidInput`] if no library was set, or any error
    ///   of [`compute_qea`]
    pub fn run_qea(
        self,
        table: &AbundanceTable,
        labels: &ClassLabels,
        resolver: &dyn NameResolver,
        executor: &dyn GroupTestExecutor,
    ) -> PseaResult<Self> {
        let library = self.filtered_library()?;
        let (result, pvalues) = compute_qea(
            table,
            labels,
            resolver,
            library,
            self.options.importance(),
            self.options.qea_method(),
            executor,
        )?;
        Ok(Self {
            result: Some(result),
            compound_pvalues: Some(pvalues),
            ..self
        })
    }

    fn filtered_library(&self) -> PseaResult<&FilteredLibrary<'a>> {
        self.library
            .as_ref()
            .ok_or_else(|| PseaError::InvalidInput("no pathway library selected".to_string()))
    }

    /// The options of the analysis
    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// The (filtered) pathway library, kept for highlighting of hits
    pub fn library(&self) -> Option<&FilteredLibrary<'a>> {
        self.library.as_ref()
    }

    /// The mapping of all query names
    pub fn name_map(&self) -> Option<&NameMap> {
        self.name_map.as_ref()
    }

    /// The query of the ORA run
    pub fn query(&self) -> Option<&QuerySet> {
        self.query.as_ref()
    }

    /// The result of the last run
    pub fn result(&self) -> Option<&ResultTable> {
        self.result.as_ref()
    }

    /// The per-compound p-values of the last QEA run
    pub fn compound_pvalues(&self) -> Option<&CompoundPvalues> {
        self.compound_pvalues.as_ref()
    }
}
