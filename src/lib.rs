//! Pathway enrichment analysis of metabolomics data
//!
//! `psea` ranks the pathways of a curated library by how strongly they are
//! affected in a metabolomics experiment. It combines the statistical
//! significance of every pathway with an impact score derived from the
//! topology of the pathway network.
//!
//! Two pipelines are available:
//!
//! - **ORA** ([`ora`]): over-representation of a list of identified compounds,
//!   using the hypergeometric or the Fisher exact test
//! - **QEA** ([`qea`]): quantitative enrichment of measured abundances, using
//!   the global test or global ANCOVA
//!
//! Both return a [`ResultTable`] with Holm and Benjamini-Hochberg adjusted
//! p-values, which can be exported as CSV.
//!
//! The usual entry point is [`AnalysisContext`]. Name mapping and the
//! pathway library are consumed through the [`NameResolver`] and
//! [`PathwayLibrary`] traits, [`LookupResolver`] and [`Library`] are
//! simple in-memory implementations.
use thiserror::Error;

pub mod abundance;
pub mod compound;
pub mod library;
pub mod ora;
pub mod qea;
pub mod resolve;
pub mod result;
pub mod stats;
mod context;
mod options;

pub use abundance::{AbundanceTable, ClassLabels};
pub use compound::{CompoundId, CompoundSet, Namespace};
pub use context::AnalysisContext;
pub use library::filter::FilteredLibrary;
pub use library::{Importance, Library, PathwayId, PathwayLibrary};
pub use options::AnalysisOptions;
pub use resolve::{LookupResolver, NameMap, NameResolver, QuerySet};
pub use result::{ResultRow, ResultTable};

/// Errors of an analysis run
#[derive(Error, Debug)]
pub enum PseaError {
    /// The input cannot be analysed, e.g. no compound could be mapped
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A statistical test failed, the run was aborted
    #[error("computation failed: {0}")]
    Computation(String),
    /// Results do not line up with the data they were computed from
    #[error("data alignment: {0}")]
    DataAlignment(String),
    /// Unknown method or metric name
    #[error("invalid option: {0}")]
    InvalidOption(String),
    /// Invalid parameters of a probability distribution
    #[error("statistics error: {0}")]
    Statistics(String),
    /// Writing CSV output failed
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// An I/O operation failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<statrs::StatsError> for PseaError {
    fn from(err: statrs::StatsError) -> Self {
        PseaError::Statistics(err.to_string())
    }
}

/// Shortcut for `Result<T, PseaError>`
pub type PseaResult<T> = Result<T, PseaError>;
