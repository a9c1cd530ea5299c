//! Restriction of a pathway library to a reference metabolome
//!
//! Both enrichment pipelines operate on a [`FilteredLibrary`]. Without a
//! reference set it mirrors the full library, otherwise every member set
//! is intersected with the reference and the universe is rebuilt from the
//! restricted member sets.
use core::fmt::Debug;

use tracing::debug;

use crate::library::{Importance, ImportanceMap, PathwayId, PathwayLibrary};
use crate::CompoundSet;

/// A pathway as seen by the enrichment engines
#[derive(Debug, Clone)]
pub struct FilteredPathway {
    id: PathwayId,
    name: String,
    members: CompoundSet,
}

impl FilteredPathway {
    /// The [`PathwayId`]
    pub fn id(&self) -> &PathwayId {
        &self.id
    }

    /// The display name of the pathway
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The (possibly filtered) member compounds
    pub fn members(&self) -> &CompoundSet {
        &self.members
    }

    /// The number of (possibly filtered) member compounds, `set.num`
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if no members are left
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// The pathway library after applying an optional reference filter
///
/// The filtered membership is kept for the whole analysis, so that hits
/// can be highlighted with exactly the same membership that was tested.
///
/// # Examples
///
/// ```
/// use psea::{CompoundSet, Library, FilteredLibrary};
/// use psea::library::Pathway;
///
/// let mut library = Library::default();
/// library.add_pathway(Pathway::new("p1".into(), "P1", ["C1", "C2", "C3"].into_iter().collect())).unwrap();
/// library.add_pathway(Pathway::new("p2".into(), "P2", ["C3", "C4"].into_iter().collect())).unwrap();
///
/// let full = FilteredLibrary::new(&library, None);
/// assert_eq!(full.uniq_count(), 4);
///
/// let reference: CompoundSet = ["C2", "C3"].into_iter().collect();
/// let filtered = FilteredLibrary::new(&library, Some(&reference));
/// assert_eq!(filtered.uniq_count(), 2);
/// assert_eq!(filtered.pathways()[1].len(), 1);
/// ```
#[derive(Clone)]
pub struct FilteredLibrary<'a> {
    library: &'a dyn PathwayLibrary,
    pathways: Vec<FilteredPathway>,
    universe: CompoundSet,
    filtered: bool,
}

impl<'a> FilteredLibrary<'a> {
    /// Applies the `reference` metabolome to the `library`
    ///
    /// A missing or empty reference leaves the library unchanged.
    /// Pathways are kept in library order, even if the filter removes
    /// all of their members.
    pub fn new(library: &'a dyn PathwayLibrary, reference: Option<&CompoundSet>) -> Self {
        let reference = reference.filter(|r| !r.is_empty());
        let mut universe = CompoundSet::new();
        let mut pathways = Vec::new();

        for id in library.ids() {
            let Some(members) = library.members(&id) else {
                debug!("Skipping {}: no member definition", id);
                continue;
            };
            let members = match reference {
                Some(reference) => members.intersection(reference),
                None => members.clone(),
            };
            universe.extend_from(&members);
            pathways.push(FilteredPathway {
                name: library
                    .display_name(&id)
                    .unwrap_or_else(|| id.as_str())
                    .to_string(),
                id,
                members,
            });
        }

        debug!(
            "Library with {} pathways, universe of {} compounds (filtered: {})",
            pathways.len(),
            universe.len(),
            reference.is_some()
        );

        Self {
            library,
            pathways,
            universe,
            filtered: reference.is_some(),
        }
    }

    /// All pathways, in library order
    pub fn pathways(&self) -> &[FilteredPathway] {
        &self.pathways
    }

    /// Returns the pathway with the given ID
    pub fn pathway(&self, id: &PathwayId) -> Option<&FilteredPathway> {
        self.pathways.iter().find(|p| p.id() == id)
    }

    /// The union of all (filtered) member sets
    pub fn universe(&self) -> &CompoundSet {
        &self.universe
    }

    /// The size of the universe, `uniq.count`
    pub fn uniq_count(&self) -> usize {
        self.universe.len()
    }

    /// Returns `true` if a reference filter was applied
    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    /// The importance values of a pathway, taken from the unfiltered library
    pub fn importance(&self, metric: Importance, id: &PathwayId) -> Option<&'a ImportanceMap> {
        self.library.importance(metric, id)
    }
}

impl Debug for FilteredLibrary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredLibrary")
            .field("pathways", &self.pathways.len())
            .field("uniq_count", &self.universe.len())
            .field("filtered", &self.filtered)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::library::Pathway;
    use crate::Library;

    /// 2 pathways, 4 compounds: p1 = {A, B, C}, p2 = {C, D}
    fn tiny_library() -> Library {
        let mut library = Library::default();
        library
            .add_pathway(Pathway::new(
                "p1".into(),
                "Pathway 1",
                ["A", "B", "C"].into_iter().collect(),
            ))
            .unwrap();
        library
            .add_pathway(Pathway::new(
                "p2".into(),
                "Pathway 2",
                ["C", "D"].into_iter().collect(),
            ))
            .unwrap();
        library
    }

    #[test]
    fn inactive_without_reference() {
        let library = tiny_library();
        let filtered = FilteredLibrary::new(&library, None);
        assert!(!filtered.is_filtered());
        assert_eq!(filtered.uniq_count(), 4);
        assert_eq!(filtered.pathways()[0].len(), 3);
        assert_eq!(filtered.pathways()[1].len(), 2);
    }

    #[test]
    fn empty_reference_is_inactive() {
        let library = tiny_library();
        let filtered = FilteredLibrary::new(&library, Some(&CompoundSet::new()));
        assert!(!filtered.is_filtered());
        assert_eq!(filtered.uniq_count(), 4);
    }

    #[test]
    fn reference_shrinks_members_and_universe() {
        let library = tiny_library();
        // E is not part of any pathway and must not count towards the universe
        let reference: CompoundSet = ["B", "C", "E"].into_iter().collect();
        let filtered = FilteredLibrary::new(&library, Some(&reference));

        assert!(filtered.is_filtered());
        let p1: Vec<&str> = filtered.pathways()[0]
            .members()
            .iter()
            .map(|c| c.as_str())
            .collect();
        let p2: Vec<&str> = filtered.pathways()[1]
            .members()
            .iter()
            .map(|c| c.as_str())
            .collect();
        assert_eq!(p1, vec!["B", "C"]);
        assert_eq!(p2, vec!["C"]);
        assert_eq!(filtered.uniq_count(), 2);
    }

    #[test]
    fn emptied_pathways_are_kept() {
        let library = tiny_library();
        let reference: CompoundSet = ["A"].into_iter().collect();
        let filtered = FilteredLibrary::new(&library, Some(&reference));
        assert_eq!(filtered.pathways().len(), 2);
        assert!(filtered.pathways()[1].is_empty());
        assert_eq!(filtered.uniq_count(), 1);
        assert_eq!(filtered.pathway(&"p2".into()).unwrap().name(), "Pathway 2");
    }
}
