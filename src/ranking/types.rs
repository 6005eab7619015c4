//! Criteria, identities and persisted shapes.

use crate::attribute::{Attribute, AttributeRef};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Depth budget meaning "flatten every level".
pub const FLAT_ALL: i32 = -1;

static NEXT_RANKING_KEY: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a ranking, used as the attribute
/// back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RankingKey(u64);

impl RankingKey {
    pub(crate) fn next() -> Self {
        Self(NEXT_RANKING_KEY.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// One sort criterion: an attribute and a direction.
#[derive(Clone)]
pub struct SortCriterion {
    pub attribute: AttributeRef,
    pub ascending: bool,
}

impl SortCriterion {
    /// Sorts by `attribute` in the given direction.
    pub fn new(attribute: AttributeRef, ascending: bool) -> Self {
        Self {
            attribute,
            ascending,
        }
    }

    pub fn ascending(attribute: AttributeRef) -> Self {
        Self::new(attribute, true)
    }

    pub fn descending(attribute: AttributeRef) -> Self {
        Self::new(attribute, false)
    }

    /// Whether this criterion sorts by `attribute`.
    pub fn is_on(&self, attribute: &AttributeRef) -> bool {
        Rc::ptr_eq(&self.attribute, attribute)
    }

    /// The same attribute in the opposite direction.
    pub fn flipped(&self) -> Self {
        Self::new(Rc::clone(&self.attribute), !self.ascending)
    }
}

impl PartialEq for SortCriterion {
    fn eq(&self, other: &Self) -> bool {
        self.ascending == other.ascending && Rc::ptr_eq(&self.attribute, &other.attribute)
    }
}

impl fmt::Debug for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortCriterion")
            .field("attribute", &self.attribute.id())
            .field("ascending", &self.ascending)
            .finish()
    }
}

pub(crate) fn criterion_position(list: &[SortCriterion], attribute: &AttributeRef) -> Option<usize> {
    list.iter().position(|c| c.is_on(attribute))
}

/// Keeps the first criterion per attribute.
pub(crate) fn dedup_criteria(list: Vec<SortCriterion>) -> Vec<SortCriterion> {
    let mut unique: Vec<SortCriterion> = Vec::with_capacity(list.len());
    for criterion in list {
        if criterion_position(&unique, &criterion.attribute).is_none() {
            unique.push(criterion);
        }
    }
    unique
}

/// A leaf attribute laid out by [`flatten`](super::Ranking::flatten).
#[derive(Debug, Clone)]
pub struct FlatAttribute {
    pub attribute: AttributeRef,
    /// Slot offset of the attribute.
    pub offset: usize,
    pub width: usize,
}

/// Persisted form of a sort criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SortCriterionDump {
    pub asc: bool,
    /// Id of the attribute.
    pub sort_by: String,
}

impl From<&SortCriterion> for SortCriterionDump {
    fn from(criterion: &SortCriterion) -> Self {
        Self {
            asc: criterion.ascending,
            sort_by: criterion.attribute.id().to_string(),
        }
    }
}

/// Persisted form of a ranking.
///
/// `D` is the attribute description type chosen by the caller; criteria
/// refer to attributes by id.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RankingDump<D> {
    pub columns: Vec<D>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sort_criterias: Vec<SortCriterionDump>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub group_columns: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub group_sort_criterias: Vec<SortCriterionDump>,
}

impl<D> Default for RankingDump<D> {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            sort_criterias: Vec::new(),
            group_columns: Vec::new(),
            group_sort_criterias: Vec::new(),
        }
    }
}
