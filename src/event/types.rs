//! Event names and payloads.

use crate::attribute::AttributeRef;
use crate::group::OrderedGroups;
use crate::ranking::SortCriterion;
use std::fmt;
use std::rc::Rc;

/// The name of an event.
///
/// Attributes and rankings share one vocabulary so that an attribute's
/// events can be forwarded to its ranking under the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    /// Something about the emitter changed.
    Dirty,
    /// The header presentation changed.
    DirtyHeader,
    /// Row values changed.
    DirtyValues,
    /// A filter changed, affecting row visibility.
    FilterChanged,
    /// The way an attribute compares rows changed.
    SortMethodChanged,
    /// The way an attribute classifies rows into groups changed.
    GroupingChanged,
    /// An attribute was shown or hidden.
    VisibilityChanged,
    /// An attribute label changed.
    LabelChanged,
    /// An attribute was added to a ranking.
    AddColumn,
    /// An attribute was moved within a ranking.
    MoveColumn,
    /// One or more attributes were removed from a ranking.
    RemoveColumn,
    /// The sort criteria changed.
    SortCriteriaChanged,
    /// The group criteria changed.
    GroupCriteriaChanged,
    /// The group sort criteria changed.
    GroupSortCriteriaChanged,
    /// The current order no longer matches the criteria.
    DirtyOrder,
    /// A new order was supplied.
    OrderChanged,
    /// New groups were supplied.
    GroupsChanged,
}

impl EventType {
    /// Wire name of the event.
    pub fn name(self) -> &'static str {
        match self {
            EventType::Dirty => "dirty",
            EventType::DirtyHeader => "dirtyHeader",
            EventType::DirtyValues => "dirtyValues",
            EventType::FilterChanged => "filterChanged",
            EventType::SortMethodChanged => "sortMethodChanged",
            EventType::GroupingChanged => "groupingChanged",
            EventType::VisibilityChanged => "visibilityChanged",
            EventType::LabelChanged => "labelChanged",
            EventType::AddColumn => "addColumn",
            EventType::MoveColumn => "moveColumn",
            EventType::RemoveColumn => "removeColumn",
            EventType::SortCriteriaChanged => "sortCriteriaChanged",
            EventType::GroupCriteriaChanged => "groupCriteriaChanged",
            EventType::GroupSortCriteriaChanged => "groupSortCriteriaChanged",
            EventType::DirtyOrder => "dirtyOrder",
            EventType::OrderChanged => "orderChanged",
            EventType::GroupsChanged => "groupsChanged",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload delivered with an event.
///
/// A single `fire` call delivers the same payload to every event type it
/// names, so listeners should match on the variants they care about.
#[derive(Debug, Clone, Default)]
pub enum EventArgs {
    /// No payload.
    #[default]
    None,

    /// The order became dirty; carries the new criteria version.
    DirtyOrder {
        /// Criteria version after invalidation.
        version: u64,
    },

    /// Visibility of an attribute flipped.
    Visibility {
        /// Visibility before the change.
        previous: bool,
        /// Visibility after the change.
        current: bool,
    },

    /// Visibility of a ranking's column flipped.
    ColumnVisibility {
        attribute: AttributeRef,
        previous: bool,
        current: bool,
    },

    /// An attribute was inserted.
    ColumnAdded {
        attribute: AttributeRef,
        index: usize,
    },

    /// An attribute was moved.
    ColumnMoved {
        attribute: AttributeRef,
        /// Requested target index.
        index: usize,
        previous_index: usize,
    },

    /// An attribute was removed.
    ColumnRemoved {
        attribute: AttributeRef,
        index: usize,
    },

    /// All attributes were removed at once.
    ColumnsCleared { removed: Vec<AttributeRef> },

    /// Sort or group-sort criteria changed.
    SortCriteria {
        previous: Vec<SortCriterion>,
        current: Vec<SortCriterion>,
    },

    /// Group criteria changed.
    GroupCriteria {
        previous: Vec<AttributeRef>,
        current: Vec<AttributeRef>,
    },

    /// A computed order was applied.
    Order {
        previous: Vec<usize>,
        current: Vec<usize>,
        previous_groups: Rc<OrderedGroups>,
        current_groups: Rc<OrderedGroups>,
    },
}
