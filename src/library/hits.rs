//! Counting of compounds that hit a pathway
use tracing::debug;

use crate::library::filter::{FilteredLibrary, FilteredPathway};
use crate::CompoundSet;

/// The intersection of one pathway with a set of present compounds
#[derive(Debug, Clone)]
pub struct PathwayHits<'a> {
    pathway: &'a FilteredPathway,
    hits: CompoundSet,
}

impl<'a> PathwayHits<'a> {
    /// The pathway that was hit
    pub fn pathway(&self) -> &'a FilteredPathway {
        self.pathway
    }

    /// The compounds that hit the pathway
    pub fn hits(&self) -> &CompoundSet {
        &self.hits
    }

    /// The number of hits, `hit.num`
    pub fn hit_num(&self) -> usize {
        self.hits.len()
    }

    /// The number of (filtered) pathway members, `set.num`
    pub fn set_num(&self) -> usize {
        self.pathway.len()
    }
}

/// Intersects every pathway of the library with the `present` compounds
///
/// Returns one entry per pathway, in library order, including pathways
/// without any hit.
pub fn count_hits<'a>(library: &'a FilteredLibrary<'_>, present: &CompoundSet) -> Vec<PathwayHits<'a>> {
    library
        .pathways()
        .iter()
        .map(|pathway| {
            let hits = pathway.members().intersection(present);
            debug!(
                "Pathway:{}\tMembers: {}, Hits: {}",
                pathway.id(),
                pathway.len(),
                hits.len()
            );
            PathwayHits { pathway, hits }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::library::Pathway;
    use crate::Library;

    #[test]
    fn hits_never_exceed_members() {
        let mut library = Library::default();
        library
            .add_pathway(Pathway::new("p1".into(), "P1", ["A", "B", "C"].into_iter().collect()))
            .unwrap();
        library
            .add_pathway(Pathway::new("p2".into(), "P2", ["D"].into_iter().collect()))
            .unwrap();
        let filtered = FilteredLibrary::new(&library, None);

        let query: CompoundSet = ["A", "C", "X", "Y", "Z"].into_iter().collect();
        let hits = count_hits(&filtered, &query);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].hit_num(), 2);
        assert_eq!(hits[0].set_num(), 3);
        assert_eq!(hits[1].hit_num(), 0);
        for h in &hits {
            assert!(h.hit_num() <= h.set_num());
        }
    }

    #[test]
    fn hits_respect_reference_filter() {
        let mut library = Library::default();
        library
            .add_pathway(Pathway::new("p1".into(), "P1", ["A", "B", "C"].into_iter().collect()))
            .unwrap();
        let reference: CompoundSet = ["B", "C"].into_iter().collect();
        let filtered = FilteredLibrary::new(&library, Some(&reference));

        let query: CompoundSet = ["A", "B"].into_iter().collect();
        let hits = count_hits(&filtered, &query);
        assert_eq!(hits[0].hit_num(), 1);
        assert_eq!(hits[0].set_num(), 2);
    }
}
