//! Compound identifiers and sorted, unique sets of them
use core::fmt::Debug;
use std::collections::HashSet;
use std::fmt::Display;

use crate::{PseaError, PseaResult};

/// The identifier space a [`CompoundId`] belongs to
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Namespace {
    /// KEGG compound IDs, e.g. `C00031`
    Kegg,
    /// Any other, library-specific identifier
    Library,
}

/// A canonical compound identifier of the pathway library
///
/// # Examples
///
/// ```
/// use psea::{CompoundId, Namespace};
///
/// let glucose = CompoundId::try_from("C00031").unwrap();
/// assert_eq!(glucose.namespace(), Namespace::Kegg);
/// assert_eq!(glucose.to_string(), "C00031");
///
/// let custom = CompoundId::try_from("HMDB0000122").unwrap();
/// assert_eq!(custom.namespace(), Namespace::Library);
///
/// assert!(CompoundId::try_from("   ").is_err());
/// ```
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CompoundId {
    inner: String,
}

impl CompoundId {
    /// Returns the identifier as `&str`
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Returns the [`Namespace`] of the identifier
    pub fn namespace(&self) -> Namespace {
        let mut chars = self.inner.chars();
        let kegg = self.inner.len() == 6
            && chars.next() == Some('C')
            && chars.all(|c| c.is_ascii_digit());
        if kegg {
            Namespace::Kegg
        } else {
            Namespace::Library
        }
    }
}

impl TryFrom<&str> for CompoundId {
    type Error = PseaError;
    fn try_from(s: &str) -> PseaResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PseaError::InvalidInput(
                "compound identifier must not be empty".to_string(),
            ));
        }
        Ok(CompoundId {
            inner: trimmed.to_string(),
        })
    }
}

impl TryFrom<String> for CompoundId {
    type Error = PseaError;
    fn try_from(s: String) -> PseaResult<Self> {
        CompoundId::try_from(s.as_str())
    }
}

impl Debug for CompoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CompoundId({})", self.inner)
    }
}

impl Display for CompoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl PartialEq<str> for CompoundId {
    fn eq(&self, other: &str) -> bool {
        self.inner == other
    }
}

/// A set of [`CompoundId`]s
///
/// Each compound can occur only once in the set and the set is
/// always sorted, so iteration order is deterministic.
///
/// The set is used for pathway members, the query compounds and the
/// reference metabolome.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompoundSet {
    ids: Vec<CompoundId>,
}

impl CompoundSet {
    /// Constructs a new, empty [`CompoundSet`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a new, empty [`CompoundSet`] with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
        }
    }

    /// Returns `true` if the set contains no [`CompoundId`]s
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the number of [`CompoundId`]s in the set
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Adds a new [`CompoundId`] to the set
    ///
    /// Returns whether the `CompoundId` was newly inserted. That is:
    ///
    /// - If the set did not previously contain this `CompoundId`, true is returned.
    /// - If the set already contained this `CompoundId`, false is returned.
    pub fn insert(&mut self, id: CompoundId) -> bool {
        match self.ids.binary_search(&id) {
            Ok(_) => false,
            Err(idx) => {
                self.ids.insert(idx, id);
                true
            }
        }
    }

    /// Returns `true` if the set contains the [`CompoundId`]
    pub fn contains(&self, id: &CompoundId) -> bool {
        self.ids.binary_search(id).is_ok()
    }

    /// Returns an Iterator of the [`CompoundId`]s inside the set, in sorted order
    pub fn iter(&self) -> std::slice::Iter<'_, CompoundId> {
        self.ids.iter()
    }

    /// Returns a new set with all compounds present in both sets
    ///
    /// # Examples
    ///
    /// ```
    /// use psea::CompoundSet;
    ///
    /// let a: CompoundSet = ["C00022", "C00031", "C00186"].into_iter().collect();
    /// let b: CompoundSet = ["C00031", "C00186", "C00158"].into_iter().collect();
    ///
    /// let both = a.intersection(&b);
    /// assert_eq!(both.len(), 2);
    /// assert!(both.contains(&"C00186".try_into().unwrap()));
    /// ```
    pub fn intersection(&self, other: &CompoundSet) -> CompoundSet {
        // both sides are sorted, so a merge walk suffices
        let mut res = CompoundSet::with_capacity(self.len().min(other.len()));
        let mut lhs = self.ids.iter().peekable();
        let mut rhs = other.ids.iter().peekable();
        while let (Some(a), Some(b)) = (lhs.peek(), rhs.peek()) {
            match a.cmp(b) {
                std::cmp::Ordering::Less => {
                    lhs.next();
                }
                std::cmp::Ordering::Greater => {
                    rhs.next();
                }
                std::cmp::Ordering::Equal => {
                    res.ids.push((*a).clone());
                    lhs.next();
                    rhs.next();
                }
            }
        }
        res
    }

    /// Adds all compounds of `other` to the set
    pub fn extend_from(&mut self, other: &CompoundSet) {
        let mut ids = Vec::with_capacity(self.len() + other.len());
        let mut lhs = std::mem::take(&mut self.ids).into_iter().peekable();
        let mut rhs = other.ids.iter().peekable();
        loop {
            match (lhs.peek(), rhs.peek()) {
                (Some(a), Some(b)) => match a.cmp(b) {
                    std::cmp::Ordering::Less => ids.extend(lhs.next()),
                    std::cmp::Ordering::Greater => ids.extend(rhs.next().cloned()),
                    std::cmp::Ordering::Equal => {
                        ids.extend(lhs.next());
                        rhs.next();
                    }
                },
                (Some(_), None) => ids.extend(lhs.by_ref()),
                (None, Some(_)) => ids.extend(rhs.by_ref().cloned()),
                (None, None) => break,
            }
        }
        self.ids = ids;
    }
}

impl From<HashSet<CompoundId>> for CompoundSet {
    fn from(s: HashSet<CompoundId>) -> Self {
        let mut ids: Vec<CompoundId> = s.into_iter().collect();
        ids.sort();
        Self { ids }
    }
}

impl FromIterator<CompoundId> for CompoundSet {
    fn from_iter<T: IntoIterator<Item = CompoundId>>(iter: T) -> Self {
        let mut ids: Vec<CompoundId> = iter.into_iter().collect();
        ids.sort();
        ids.dedup();
        Self { ids }
    }
}

/// Collects string identifiers, silently skipping empty ones
impl<'a> FromIterator<&'a str> for CompoundSet {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        iter.into_iter()
            .filter_map(|s| CompoundId::try_from(s).ok())
            .collect()
    }
}

impl<'a> IntoIterator for &'a CompoundSet {
    type Item = &'a CompoundId;
    type IntoIter = std::slice::Iter<'a, CompoundId>;
    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}
