//! Mapping of user supplied compound names to canonical [`CompoundId`]s
//!
//! Name mapping itself is an external service, represented by the
//! [`NameResolver`] trait. This module turns its answers into a
//! [`NameMap`] and the deduplicated [`QuerySet`] that ORA works on.
use std::collections::HashMap;

use tracing::debug;

use crate::{CompoundId, CompoundSet, PseaError, PseaResult};

/// Maps a single user identifier to a canonical [`CompoundId`]
pub trait NameResolver {
    /// Returns the canonical ID of `query`, or `None` if it cannot be mapped
    fn resolve(&self, query: &str) -> Option<CompoundId>;
}

/// A single row of a [`NameMap`]
#[derive(Debug, Clone, PartialEq)]
pub struct NameMatch {
    query: String,
    hit: Option<CompoundId>,
}

impl NameMatch {
    /// The user supplied identifier
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The canonical ID, `None` if unmapped
    pub fn hit(&self) -> Option<&CompoundId> {
        self.hit.as_ref()
    }
}

/// The result of resolving a list of user identifiers
///
/// Contains one row per input identifier, in input order.
#[derive(Debug, Clone, Default)]
pub struct NameMap {
    rows: Vec<NameMatch>,
}

impl NameMap {
    /// Resolves all `queries` with the `resolver`
    pub fn build<S: AsRef<str>>(resolver: &dyn NameResolver, queries: &[S]) -> Self {
        let rows = queries
            .iter()
            .map(|q| {
                let query = q.as_ref().to_string();
                let hit = resolver.resolve(&query);
                if hit.is_none() {
                    debug!("Unable to map {}", query);
                }
                NameMatch { query, hit }
            })
            .collect();
        Self { rows }
    }

    /// Iterates all rows
    pub fn iter(&self) -> std::slice::Iter<'_, NameMatch> {
        self.rows.iter()
    }

    /// The number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The number of rows with a canonical ID
    pub fn mapped_count(&self) -> usize {
        self.rows.iter().filter(|r| r.hit.is_some()).count()
    }

    /// Builds the deduplicated [`QuerySet`] from all mapped IDs
    ///
    /// # Errors
    ///
    /// [`PseaError::InvalidInput`] if not a single identifier could be mapped
    pub fn query_set(&self) -> PseaResult<QuerySet> {
        QuerySet::new(self.rows.iter().filter_map(|r| r.hit.clone()).collect())
    }
}

impl<'a> IntoIterator for &'a NameMap {
    type Item = &'a NameMatch;
    type IntoIter = std::slice::Iter<'a, NameMatch>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The deduplicated, non-empty set of query compounds of one analysis
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySet {
    inner: CompoundSet,
}

impl QuerySet {
    /// Constructs a new [`QuerySet`]
    ///
    /// # Errors
    ///
    /// [`PseaError::InvalidInput`] if `compounds` is empty
    pub fn new(compounds: CompoundSet) -> PseaResult<Self> {
        if compounds.is_empty() {
            return Err(PseaError::InvalidInput("no valid compounds".to_string()));
        }
        Ok(Self { inner: compounds })
    }

    /// The query compounds
    pub fn compounds(&self) -> &CompoundSet {
        &self.inner
    }

    /// The number of query compounds, `q.size`
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Always `false`, a [`QuerySet`] is never empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// A [`NameResolver`] backed by a synonym table
///
/// Lookups ignore surrounding whitespace and ASCII case.
///
/// # Examples
///
/// ```
/// use psea::{CompoundId, LookupResolver, NameResolver};
///
/// let mut resolver = LookupResolver::default();
/// let glucose = CompoundId::try_from("C00031").unwrap();
/// resolver.insert("D-Glucose", glucose.clone());
/// resolver.insert("Dextrose", glucose.clone());
///
/// assert_eq!(resolver.resolve(" d-glucose"), Some(glucose.clone()));
/// assert_eq!(resolver.resolve("C00031"), Some(glucose));
/// assert_eq!(resolver.resolve("Fructose"), None);
/// ```
#[derive(Debug, Default, Clone)]
pub struct LookupResolver {
    synonyms: HashMap<String, CompoundId>,
}

impl LookupResolver {
    /// Registers `name` as a synonym of `id`
    ///
    /// The canonical ID itself is registered as well.
    pub fn insert(&mut self, name: &str, id: CompoundId) {
        self.synonyms
            .insert(id.as_str().to_ascii_lowercase(), id.clone());
        self.synonyms.insert(name.trim().to_ascii_lowercase(), id);
    }
}

impl NameResolver for LookupResolver {
    fn resolve(&self, query: &str) -> Option<CompoundId> {
        self.synonyms
            .get(&query.trim().to_ascii_lowercase())
            .cloned()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn resolver() -> LookupResolver {
        let mut r = LookupResolver::default();
        r.insert("Glucose", "C00031".try_into().unwrap());
        r.insert("Dextrose", "C00031".try_into().unwrap());
        r.insert("Pyruvate", "C00022".try_into().unwrap());
        r
    }

    #[test]
    fn name_map_keeps_unmapped_rows() {
        let map = NameMap::build(&resolver(), &["Glucose", "unknown", "Pyruvate"]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.mapped_count(), 2);
        assert!(map.iter().nth(1).unwrap().hit().is_none());
        assert_eq!(map.iter().nth(1).unwrap().query(), "unknown");
    }

    #[test]
    fn query_set_deduplicates() {
        let map = NameMap::build(&resolver(), &["Glucose", "Dextrose", "pyruvate"]);
        let query = map.query_set().unwrap();
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn fully_unmapped_query_fails() {
        let map = NameMap::build(&resolver(), &["foo", "bar"]);
        match map.query_set() {
            Err(PseaError::InvalidInput(msg)) => assert_eq!(msg, "no valid compounds"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_query_fails() {
        let empty: [&str; 0] = [];
        let map = NameMap::build(&resolver(), &empty);
        assert!(map.is_empty());
        assert!(map.query_set().is_err());
    }
}
