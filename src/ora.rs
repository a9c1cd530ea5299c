//! Over-representation analysis (ORA)
//!
//! ORA asks whether the query compounds are enriched in any pathway,
//! compared to a random draw of the same size from the universe of all
//! library compounds.
//!
//! # Examples
//!
//! ```
//! use psea::{CompoundSet, FilteredLibrary, Importance, Library, QuerySet};
//! use psea::library::{ImportanceMap, Pathway};
//! use psea::ora::{compute_ora, OraMethod};
//!
//! let members: CompoundSet = ["C00031", "C00022", "C00186", "C00118"].into_iter().collect();
//! let rbc: ImportanceMap = members.iter().map(|id| (id.clone(), 0.25)).collect();
//! let mut library = Library::default();
//! library.add_pathway(
//!     Pathway::new("hsa00010".into(), "Glycolysis", members)
//!         .with_importance(Importance::Betweenness, rbc)
//! ).unwrap();
//! library.add_pathway(Pathway::new(
//!     "hsa00020".into(),
//!     "Citrate cycle",
//!     ["C00158", "C00311", "C00026", "C00042"].into_iter().collect(),
//! )).unwrap();
//!
//! let filtered = FilteredLibrary::new(&library, None);
//! let query = QuerySet::new(["C00031", "C00022", "C00186"].into_iter().collect()).unwrap();
//!
//! let result = compute_ora(&query, &filtered, Importance::Betweenness, OraMethod::Hypergeometric).unwrap();
//! assert_eq!(result.len(), 1);
//! let glycolysis = &result.rows()[0];
//! assert_eq!(glycolysis.hits(), 3);
//! assert!((glycolysis.impact() - 0.75).abs() < 1e-12);
//! ```
use std::fmt::Display;
use std::str::FromStr;

use tracing::{debug, info};

use crate::library::filter::FilteredLibrary;
use crate::library::hits::count_hits;
use crate::library::Importance;
use crate::resolve::QuerySet;
use crate::result::{rank, Candidate, Pipeline, ResultTable};
use crate::stats::f64_from_usize;
use crate::stats::hypergeom::{upper_tail, Alternative, ContingencyTable};
use crate::{PseaError, PseaResult};

/// The statistical test of an ORA run
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum OraMethod {
    /// One-sided Fisher exact test, `fisher`
    Fisher,
    /// Hypergeometric upper tail, `hyperg`
    #[default]
    Hypergeometric,
}

impl FromStr for OraMethod {
    type Err = PseaError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fisher" => Ok(OraMethod::Fisher),
            "hyperg" => Ok(OraMethod::Hypergeometric),
            _ => Err(PseaError::InvalidOption(format!("unknown ORA method: {s}"))),
        }
    }
}

impl Display for OraMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OraMethod::Fisher => write!(f, "fisher"),
            OraMethod::Hypergeometric => write!(f, "hyperg"),
        }
    }
}

impl OraMethod {
    fn pvalue(&self, hit_num: u64, set_num: u64, q_size: u64, uniq_count: u64) -> PseaResult<f64> {
        match self {
            OraMethod::Hypergeometric => upper_tail(uniq_count, set_num, q_size, hit_num),
            OraMethod::Fisher => ContingencyTable::from_counts(hit_num, set_num, q_size, uniq_count)?
                .fisher(Alternative::Greater),
        }
    }
}

/// Runs ORA of the `query` against every pathway of the `library`
///
/// Only query compounds that are part of the library's universe are
/// drawn, `q.size` counts these. Other query compounds are ignored, for
/// both methods alike.
///
/// # Errors
///
/// - [`PseaError::InvalidInput`] if no query compound is part of the universe
/// - [`PseaError::Statistics`] if a test cannot be computed
pub fn compute_ora(
    query: &QuerySet,
    library: &FilteredLibrary<'_>,
    importance: Importance,
    method: OraMethod,
) -> PseaResult<ResultTable> {
    // compounds outside of the universe cannot be drawn from it
    let drawn = query.compounds().intersection(library.universe());
    if drawn.len() < query.len() {
        debug!(
            "Ignoring {} of {} query compounds outside the library universe",
            query.len() - drawn.len(),
            query.len()
        );
    }
    if drawn.is_empty() {
        return Err(PseaError::InvalidInput(
            "no valid compounds in the library".to_string(),
        ));
    }
    let q_size = drawn.len() as u64;
    let uniq_count = library.uniq_count() as u64;

    let mut candidates = Vec::with_capacity(library.pathways().len());
    for hit in count_hits(library, &drawn) {
        let pathway = hit.pathway();
        let hit_num = hit.hit_num() as u64;
        let set_num = hit.set_num() as u64;

        debug!(
            "Pathway:{}\tPopulation: {}, Successes: {}, Draws: {}, Observed: {}",
            pathway.id(),
            uniq_count,
            set_num,
            q_size,
            hit_num
        );

        let raw_p = method.pvalue(hit_num, set_num, q_size, uniq_count)?;
        let impact = library
            .importance(importance, pathway.id())
            .and_then(|map| map.sum_over(hit.hits()));
        if impact.is_none() && hit_num > 0 {
            debug!("Pathway:{}\tundefined {} impact", pathway.id(), importance);
        }

        candidates.push(Candidate {
            id: pathway.id().clone(),
            name: pathway.name().to_string(),
            total: hit.set_num(),
            expected: Some(
                f64_from_usize(drawn.len()) * f64_from_usize(hit.set_num())
                    / f64_from_usize(library.uniq_count()),
            ),
            hits: hit.hit_num(),
            raw_p,
            impact,
            hit_ids: hit.hits().iter().cloned().collect(),
        });
    }

    let table = rank(Pipeline::Ora, candidates);
    info!(
        "ORA ({}, {}) of {} compounds: {} of {} pathways reported",
        method,
        importance,
        q_size,
        table.len(),
        library.pathways().len()
    );
    Ok(table)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::library::{ImportanceMap, Pathway};
    use crate::{CompoundId, CompoundSet, Library};

    fn id(n: usize) -> CompoundId {
        CompoundId::try_from(format!("C{n:05}")).unwrap()
    }

    fn pathway(name: &str, members: &[usize], rbc: &[(usize, f64)]) -> Pathway {
        let members: CompoundSet = members.iter().map(|n| id(*n)).collect();
        let rbc: ImportanceMap = rbc.iter().map(|(n, v)| (id(*n), *v)).collect();
        Pathway::new(name.into(), &format!("Pathway {name}"), members)
            .with_importance(Importance::Betweenness, rbc)
    }

    /// Universe of `C00001..=C00010`
    fn library() -> Library {
        let mut library = Library::default();
        for p in [
            pathway("p1", &[1, 2, 3, 4], &[(1, 0.25), (2, 0.25), (3, 0.25), (4, 0.25)]),
            pathway("p2", &[5, 6, 7], &[(5, 0.5), (6, 0.5), (7, 0.5)]),
            pathway("p3", &[8, 9], &[(8, 0.3), (9, 0.1)]),
            pathway("p4", &[9, 10], &[(9, 0.2)]),
        ] {
            library.add_pathway(p).unwrap();
        }
        library
    }

    fn query(ids: &[usize]) -> QuerySet {
        QuerySet::new(ids.iter().map(|n| id(*n)).collect()).unwrap()
    }

    #[test]
    fn method_from_str() {
        assert_eq!("fisher".parse::<OraMethod>().unwrap(), OraMethod::Fisher);
        assert_eq!("hyperg".parse::<OraMethod>().unwrap(), OraMethod::Hypergeometric);
        assert!("Fisher".parse::<OraMethod>().is_err());
        assert_eq!(OraMethod::default().to_string(), "hyperg");
    }

    #[test]
    fn hypergeometric_run() {
        let library = library();
        let filtered = FilteredLibrary::new(&library, None);
        let result = compute_ora(
            &query(&[1, 2, 3, 8, 10]),
            &filtered,
            Importance::Betweenness,
            OraMethod::Hypergeometric,
        )
        .unwrap();

        // p2 has no hits, p4 hits C00010 without importance
        let ids: Vec<&str> = result.iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);

        // P(X >= 3) = (4 * 15 + 6) / 252
        let p1 = &result.rows()[0];
        assert_eq!(p1.total(), 4);
        assert_eq!(p1.hits(), 3);
        assert!((p1.expected().unwrap() - 2.0).abs() < f64::EPSILON);
        assert!((p1.raw_p() - 0.2619).abs() < 1e-12);
        assert!((p1.holm_p() - 0.52381).abs() < 1e-12);
        assert!((p1.fdr() - 0.52381).abs() < 1e-12);
        assert!((p1.impact() - 0.75).abs() < 1e-12);
        assert_eq!(p1.hit_ids(), &[id(1), id(2), id(3)]);

        // P(X >= 1) = 1 - 56 / 252
        let p3 = &result.rows()[1];
        assert!((p3.raw_p() - 0.77778).abs() < 1e-12);
        assert!((p3.holm_p() - 0.77778).abs() < 1e-12);
        assert!((p3.impact() - 0.3).abs() < 1e-12);
        assert!((p3.expected().unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fisher_matches_hypergeometric() {
        let library = library();
        let filtered = FilteredLibrary::new(&library, None);
        let q = query(&[1, 2, 3, 8, 10]);
        let hyperg =
            compute_ora(&q, &filtered, Importance::Betweenness, OraMethod::Hypergeometric).unwrap();
        let fisher = compute_ora(&q, &filtered, Importance::Betweenness, OraMethod::Fisher).unwrap();
        assert_eq!(hyperg.len(), fisher.len());
        for (a, b) in hyperg.iter().zip(fisher.iter()) {
            assert_eq!(a.id(), b.id());
            assert!((a.raw_p() - b.raw_p()).abs() < 1e-12);
        }
    }

    #[test]
    fn invariants_hold() {
        let library = library();
        let filtered = FilteredLibrary::new(&library, None);
        let result = compute_ora(
            &query(&[1, 5, 6, 8, 9]),
            &filtered,
            Importance::Betweenness,
            OraMethod::Hypergeometric,
        )
        .unwrap();
        assert!(!result.is_empty());
        for row in &result {
            assert!(row.hits() <= row.total());
            assert!(row.hits() > 0);
            assert!(row.raw_p() > 0.0 && row.raw_p() <= 1.0);
            assert!(row.holm_p() >= row.raw_p());
            assert!(row.fdr() >= row.raw_p());
            assert!(row.impact() >= 0.0);
        }
    }

    #[test]
    fn missing_metric_reports_nothing() {
        let library = library();
        let filtered = FilteredLibrary::new(&library, None);
        let result = compute_ora(
            &query(&[1, 2, 3]),
            &filtered,
            Importance::Degree,
            OraMethod::Hypergeometric,
        )
        .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn reference_shrinks_universe() {
        let library = library();
        let reference: CompoundSet = [1, 2, 3, 5].iter().map(|n| id(*n)).collect();
        let filtered = FilteredLibrary::new(&library, Some(&reference));
        assert_eq!(filtered.uniq_count(), 4);

        let result = compute_ora(
            &query(&[1, 2]),
            &filtered,
            Importance::Betweenness,
            OraMethod::Hypergeometric,
        )
        .unwrap();
        // p1 is restricted to C00001..=C00003, P(X >= 2) = 3 / 6
        let p1 = &result.rows()[0];
        assert_eq!(p1.total(), 3);
        assert!((p1.raw_p() - 0.5).abs() < 1e-12);
        assert!((p1.expected().unwrap() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn compounds_outside_universe_are_ignored() {
        let library = library();
        let filtered = FilteredLibrary::new(&library, None);
        // C00011..=C00014 are not part of any pathway
        let q = query(&[1, 2, 11, 12, 13, 14]);
        for method in [OraMethod::Hypergeometric, OraMethod::Fisher] {
            let result = compute_ora(&q, &filtered, Importance::Betweenness, method).unwrap();
            assert_eq!(result.len(), 1);
            // q.size = 2, P(X >= 2) = C(4, 2) / C(10, 2)
            let p1 = &result.rows()[0];
            assert!((p1.raw_p() - 0.13333).abs() < 1e-12);
            assert!((p1.expected().unwrap() - 0.8).abs() < 1e-12);
        }

        // filtered out by the reference
        let reference: CompoundSet = [1, 2, 5].iter().map(|n| id(*n)).collect();
        let filtered = FilteredLibrary::new(&library, Some(&reference));
        let q = query(&[1, 3, 4]);
        let hyperg =
            compute_ora(&q, &filtered, Importance::Betweenness, OraMethod::Hypergeometric).unwrap();
        let fisher = compute_ora(&q, &filtered, Importance::Betweenness, OraMethod::Fisher).unwrap();
        assert_eq!(hyperg, fisher);
        assert_eq!(hyperg.rows()[0].hits(), 1);
    }

    #[test]
    fn no_query_compound_in_universe() {
        let library = library();
        let filtered = FilteredLibrary::new(&library, None);
        for method in [OraMethod::Hypergeometric, OraMethod::Fisher] {
            assert!(matches!(
                compute_ora(&query(&[11, 12]), &filtered, Importance::Betweenness, method),
                Err(PseaError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn identical_runs_give_identical_csv() {
        let library = library();
        let filtered = FilteredLibrary::new(&library, None);
        let q = query(&[1, 2, 3, 8, 10]);
        let a = compute_ora(&q, &filtered, Importance::Betweenness, OraMethod::Fisher)
            .unwrap()
            .to_csv_string()
            .unwrap();
        let b = compute_ora(&q, &filtered, Importance::Betweenness, OraMethod::Fisher)
            .unwrap()
            .to_csv_string()
            .unwrap();
        assert_eq!(a, b);
    }
}
