//! Pathway definitions and the read-only pathway library interface
//!
//! The library itself is curated elsewhere. This crate only consumes it
//! through the [`PathwayLibrary`] trait. [`Library`] is a plain in-memory
//! implementation to hold pathways that have been loaded by other means.
use core::fmt::Debug;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use tracing::warn;

use crate::{CompoundId, CompoundSet, PseaError, PseaResult};

pub mod filter;
pub mod hits;

/// A stable, unique identifier of a pathway, e.g. `hsa00010`
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PathwayId {
    inner: String,
}

impl PathwayId {
    /// Returns the identifier as `&str`
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl From<&str> for PathwayId {
    fn from(s: &str) -> Self {
        Self {
            inner: s.to_string(),
        }
    }
}

impl From<String> for PathwayId {
    fn from(inner: String) -> Self {
        Self { inner }
    }
}

impl Debug for PathwayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PathwayId({})", self.inner)
    }
}

impl Display for PathwayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// The topology metric used to weigh hits into an impact score
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum Importance {
    /// Relative betweenness centrality (`rbc`)
    #[default]
    Betweenness,
    /// Out-degree centrality (`dgr`)
    Degree,
}

impl FromStr for Importance {
    type Err = PseaError;
    fn from_str(s: &str) -> PseaResult<Self> {
        match s {
            "rbc" => Ok(Importance::Betweenness),
            "dgr" => Ok(Importance::Degree),
            other => Err(PseaError::InvalidOption(format!(
                "unknown node importance `{other}`, expected `rbc` or `dgr`"
            ))),
        }
    }
}

impl Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Importance::Betweenness => write!(f, "rbc"),
            Importance::Degree => write!(f, "dgr"),
        }
    }
}

/// Per-compound, non-negative topological importance of one pathway
#[derive(Debug, Default, Clone)]
pub struct ImportanceMap {
    inner: HashMap<CompoundId, f64>,
}

impl ImportanceMap {
    /// Constructs a new, empty [`ImportanceMap`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the importance of a compound
    ///
    /// # Errors
    ///
    /// [`PseaError::InvalidInput`] if `value` is negative or not finite
    pub fn insert(&mut self, id: CompoundId, value: f64) -> PseaResult<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(PseaError::InvalidInput(format!(
                "importance of {id} must be a non-negative number, got {value}"
            )));
        }
        self.inner.insert(id, value);
        Ok(())
    }

    /// Returns the importance of a compound, if present
    pub fn get(&self, id: &CompoundId) -> Option<f64> {
        self.inner.get(id).copied()
    }

    /// Returns the number of compounds with an importance value
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if no importance values are present
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Sums the importance over `hits`
    ///
    /// Returns `None` if any of the hits is missing from the map,
    /// the impact is undefined in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use psea::{CompoundId, CompoundSet};
    /// use psea::library::ImportanceMap;
    ///
    /// let mut map = ImportanceMap::new();
    /// map.insert(CompoundId::try_from("C1").unwrap(), 0.25).unwrap();
    /// map.insert(CompoundId::try_from("C2").unwrap(), 0.5).unwrap();
    ///
    /// let hits: CompoundSet = ["C1", "C2"].into_iter().collect();
    /// assert_eq!(map.sum_over(&hits), Some(0.75));
    ///
    /// let unknown: CompoundSet = ["C1", "C3"].into_iter().collect();
    /// assert_eq!(map.sum_over(&unknown), None);
    /// ```
    pub fn sum_over<'a, I: IntoIterator<Item = &'a CompoundId>>(&self, hits: I) -> Option<f64> {
        hits.into_iter().map(|id| self.get(id)).sum()
    }
}

impl FromIterator<(CompoundId, f64)> for ImportanceMap {
    /// Collects importance values
    ///
    /// Values that [`ImportanceMap::insert`] would reject are skipped,
    /// so the impact of any pathway hitting such a compound is undefined.
    fn from_iter<T: IntoIterator<Item = (CompoundId, f64)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (id, value) in iter {
            if let Err(err) = map.insert(id, value) {
                warn!("Skipping importance value: {}", err);
            }
        }
        map
    }
}

/// A single pathway of the library
#[derive(Debug, Clone)]
pub struct Pathway {
    id: PathwayId,
    name: String,
    members: CompoundSet,
    betweenness: ImportanceMap,
    degree: ImportanceMap,
}

impl Pathway {
    /// Initializes a new pathway without importance values
    pub fn new(id: PathwayId, name: &str, members: CompoundSet) -> Pathway {
        Pathway {
            id,
            name: name.to_string(),
            members,
            betweenness: ImportanceMap::default(),
            degree: ImportanceMap::default(),
        }
    }

    /// Sets the importance values of one topology metric
    #[must_use]
    pub fn with_importance(mut self, metric: Importance, values: ImportanceMap) -> Self {
        match metric {
            Importance::Betweenness => self.betweenness = values,
            Importance::Degree => self.degree = values,
        }
        self
    }

    /// The unique [`PathwayId`]
    pub fn id(&self) -> &PathwayId {
        &self.id
    }

    /// The display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All member compounds
    pub fn members(&self) -> &CompoundSet {
        &self.members
    }

    /// The importance values of the given metric
    pub fn importance(&self, metric: Importance) -> &ImportanceMap {
        match metric {
            Importance::Betweenness => &self.betweenness,
            Importance::Degree => &self.degree,
        }
    }
}

/// Read-only access to a curated pathway library
///
/// Implementations must not change while an analysis is running. All
/// methods take `&self`, so a library can be shared between concurrent
/// analyses.
pub trait PathwayLibrary: Sync {
    /// All pathway IDs, in the library's canonical order
    fn ids(&self) -> Vec<PathwayId>;

    /// The member compounds of a pathway
    fn members(&self, id: &PathwayId) -> Option<&CompoundSet>;

    /// The importance values of a pathway for one topology metric
    fn importance(&self, metric: Importance, id: &PathwayId) -> Option<&ImportanceMap>;

    /// The display name of a pathway
    fn display_name(&self, id: &PathwayId) -> Option<&str>;
}

/// An in-memory [`PathwayLibrary`]
///
/// Pathways keep their insertion order.
///
/// # Examples
///
/// ```
/// use psea::{CompoundSet, Library, PathwayLibrary};
/// use psea::library::Pathway;
///
/// let mut library = Library::default();
/// library
///     .add_pathway(Pathway::new(
///         "hsa00010".into(),
///         "Glycolysis / Gluconeogenesis",
///         ["C00031", "C00022", "C00186"].into_iter().collect(),
///     ))
///     .unwrap();
///
/// assert_eq!(library.len(), 1);
/// assert_eq!(library.display_name(&"hsa00010".into()), Some("Glycolysis / Gluconeogenesis"));
/// assert!(library.add_pathway(Pathway::new("hsa00010".into(), "dup", CompoundSet::new())).is_err());
/// ```
#[derive(Debug, Default, Clone)]
pub struct Library {
    pathways: Vec<Pathway>,
    index: HashMap<PathwayId, usize>,
}

impl Library {
    /// Adds a pathway to the end of the library
    ///
    /// # Errors
    ///
    /// [`PseaError::InvalidInput`] if a pathway with the same ID already exists
    pub fn add_pathway(&mut self, pathway: Pathway) -> PseaResult<()> {
        if self.index.contains_key(pathway.id()) {
            return Err(PseaError::InvalidInput(format!(
                "pathway {} is already part of the library",
                pathway.id()
            )));
        }
        self.index.insert(pathway.id().clone(), self.pathways.len());
        self.pathways.push(pathway);
        Ok(())
    }

    /// Returns the pathway with the given ID
    pub fn pathway(&self, id: &PathwayId) -> Option<&Pathway> {
        self.index.get(id).map(|idx| &self.pathways[*idx])
    }

    /// Returns an iterator of all pathways
    pub fn iter(&self) -> std::slice::Iter<'_, Pathway> {
        self.pathways.iter()
    }

    /// Returns the number of pathways
    pub fn len(&self) -> usize {
        self.pathways.len()
    }

    /// Returns `true` if the library does not contain any pathways
    pub fn is_empty(&self) -> bool {
        self.pathways.is_empty()
    }
}

impl PathwayLibrary for Library {
    fn ids(&self) -> Vec<PathwayId> {
        self.pathways.iter().map(|p| p.id().clone()).collect()
    }

    fn members(&self, id: &PathwayId) -> Option<&CompoundSet> {
        self.pathway(id).map(Pathway::members)
    }

    fn importance(&self, metric: Importance, id: &PathwayId) -> Option<&ImportanceMap> {
        self.pathway(id).map(|p| p.importance(metric))
    }

    fn display_name(&self, id: &PathwayId) -> Option<&str> {
        self.pathway(id).map(Pathway::name)
    }
}

impl<'a> IntoIterator for &'a Library {
    type Item = &'a Pathway;
    type IntoIter = std::slice::Iter<'a, Pathway>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn importance_from_str() {
        assert_eq!("rbc".parse::<Importance>().unwrap(), Importance::Betweenness);
        assert_eq!("dgr".parse::<Importance>().unwrap(), Importance::Degree);
        assert!("betweenness".parse::<Importance>().is_err());
        assert_eq!(Importance::Degree.to_string(), "dgr");
    }

    #[test]
    fn importance_rejects_negative() {
        let mut map = ImportanceMap::new();
        assert!(map.insert("C1".try_into().unwrap(), -0.1).is_err());
        assert!(map.insert("C1".try_into().unwrap(), f64::NAN).is_err());
        assert!(map.insert("C1".try_into().unwrap(), 0.0).is_ok());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn importance_collect_skips_invalid() {
        let map: ImportanceMap = [("C1", 0.5), ("C2", -0.1), ("C3", f64::NAN), ("C4", 0.0)]
            .into_iter()
            .map(|(id, value)| (CompoundId::try_from(id).unwrap(), value))
            .collect();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&"C1".try_into().unwrap()), Some(0.5));
        assert_eq!(map.get(&"C2".try_into().unwrap()), None);

        let hits: CompoundSet = ["C1", "C4"].into_iter().collect();
        assert_eq!(map.sum_over(&hits), Some(0.5));
        let hits: CompoundSet = ["C1", "C3"].into_iter().collect();
        assert_eq!(map.sum_over(&hits), None);
    }

    #[test]
    fn importance_sum_of_nothing() {
        let map = ImportanceMap::new();
        assert_eq!(map.sum_over(&CompoundSet::new()), Some(0.0));
    }

    #[test]
    fn library_keeps_order() {
        let mut library = Library::default();
        for id in ["p3", "p1", "p2"] {
            library
                .add_pathway(Pathway::new(id.into(), id, CompoundSet::new()))
                .unwrap();
        }
        let ids: Vec<String> = library.ids().iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["p3", "p1", "p2"]);
        assert!(library.members(&"p4".into()).is_none());
    }

    #[test]
    fn library_importance_lookup() {
        let mut rbc = ImportanceMap::new();
        rbc.insert("C1".try_into().unwrap(), 0.5).unwrap();
        let pathway = Pathway::new("p1".into(), "P1", ["C1"].into_iter().collect())
            .with_importance(Importance::Betweenness, rbc);
        let mut library = Library::default();
        library.add_pathway(pathway).unwrap();

        let id = PathwayId::from("p1");
        assert_eq!(
            library
                .importance(Importance::Betweenness, &id)
                .unwrap()
                .len(),
            1
        );
        assert!(library
            .importance(Importance::Degree, &id)
            .unwrap()
            .is_empty());
    }
}
