//! The attribute contract.

use crate::event::{EventArgs, EventDispatcher, EventType};
use crate::group::{GroupData, GroupPath};
use crate::ranking::RankingKey;
use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// Shared handle to an attribute. Identity is pointer identity.
pub type AttributeRef = Rc<dyn Attribute>;

/// State every attribute carries on behalf of the ranking engine.
///
/// Implementors embed one and return it from [`Attribute::core`]. It holds
/// the attribute's event dispatcher, the back-reference to the ranking
/// that owns it, and its visibility.
#[derive(Debug)]
pub struct AttributeCore {
    id: String,
    events: Rc<EventDispatcher>,
    owner: Cell<Option<RankingKey>>,
    visible: Cell<bool>,
}

impl AttributeCore {
    /// Creates a visible, unowned core with its own dispatcher.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            events: Rc::new(EventDispatcher::new()),
            owner: Cell::new(None),
            visible: Cell::new(true),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn events(&self) -> &Rc<EventDispatcher> {
        &self.events
    }

    /// The ranking this attribute currently belongs to.
    pub fn owner(&self) -> Option<RankingKey> {
        self.owner.get()
    }

    pub(crate) fn set_owner(&self, owner: Option<RankingKey>) {
        self.owner.set(owner);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    /// Shows or hides the attribute. Fires `VisibilityChanged` when the
    /// value actually changes.
    pub fn set_visible(&self, visible: bool) {
        let previous = self.visible.replace(visible);
        if previous == visible {
            return;
        }
        self.events.fire(
            &[
                EventType::VisibilityChanged,
                EventType::DirtyHeader,
                EventType::DirtyValues,
                EventType::Dirty,
            ],
            &EventArgs::Visibility {
                previous,
                current: visible,
            },
        );
    }

    /// Signals that row values changed.
    pub fn mark_values_dirty(&self) {
        self.events
            .fire(&[EventType::DirtyValues, EventType::Dirty], &EventArgs::None);
    }

    /// Signals that the header presentation changed.
    pub fn mark_header_dirty(&self) {
        self.events
            .fire(&[EventType::DirtyHeader, EventType::Dirty], &EventArgs::None);
    }

    /// Signals that the label changed.
    pub fn notify_label_changed(&self) {
        self.events.fire(
            &[EventType::LabelChanged, EventType::DirtyHeader, EventType::Dirty],
            &EventArgs::None,
        );
    }

    /// Signals that the filter changed.
    pub fn notify_filter_changed(&self) {
        self.events.fire(
            &[
                EventType::FilterChanged,
                EventType::DirtyValues,
                EventType::Dirty,
            ],
            &EventArgs::None,
        );
    }

    /// Signals that the row comparison changed.
    pub fn notify_sort_method_changed(&self) {
        self.events.fire(
            &[
                EventType::SortMethodChanged,
                EventType::DirtyHeader,
                EventType::DirtyValues,
                EventType::Dirty,
            ],
            &EventArgs::None,
        );
    }

    /// Signals that the row classification changed.
    pub fn notify_grouping_changed(&self) {
        self.events.fire(
            &[
                EventType::GroupingChanged,
                EventType::DirtyHeader,
                EventType::DirtyValues,
                EventType::Dirty,
            ],
            &EventArgs::None,
        );
    }
}

/// A column of a ranking: compares, classifies and filters rows.
///
/// Rows are addressed by index; attributes look up their own values.
/// Only [`core`](Attribute::core) and [`compare`](Attribute::compare) are
/// required; the rest default to a plain, ungrouped, unfiltered leaf.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use u_ranking::attribute::{Attribute, AttributeCore};
///
/// struct Score {
///     core: AttributeCore,
///     values: Vec<f64>,
/// }
///
/// impl Attribute for Score {
///     fn core(&self) -> &AttributeCore {
///         &self.core
///     }
///
///     fn compare(&self, a: usize, b: usize) -> Ordering {
///         self.values[a]
///             .partial_cmp(&self.values[b])
///             .unwrap_or(Ordering::Equal)
///     }
/// }
///
/// let score = Score { core: AttributeCore::new("score"), values: vec![2.0, 1.0] };
/// assert_eq!(score.compare(0, 1), Ordering::Greater);
/// ```
pub trait Attribute {
    /// Engine-owned state.
    fn core(&self) -> &AttributeCore;

    /// Compares two rows. May return `Equal` for rows it cannot order
    /// (for example missing values); the ranking breaks such ties.
    fn compare(&self, a: usize, b: usize) -> Ordering;

    fn id(&self) -> &str {
        self.core().id()
    }

    /// Compares two sibling groups.
    fn group_compare(&self, a: &GroupData<'_>, b: &GroupData<'_>) -> Ordering {
        a.name.cmp(b.name)
    }

    /// Classifies a row.
    fn classify(&self, _row: usize) -> GroupPath {
        GroupPath::default_group()
    }

    /// Whether a filter is active.
    fn is_filtered(&self) -> bool {
        false
    }

    /// Whether the row passes the filter.
    fn filter(&self, _row: usize) -> bool {
        true
    }

    /// Whether grouping by this attribute should also pin it as a sort
    /// criterion.
    fn is_categorical(&self) -> bool {
        false
    }

    /// Support attributes (selection, rank numbers, ...) never become the
    /// default sort criterion.
    fn is_support(&self) -> bool {
        false
    }

    /// Textual attributes sort ascending by default.
    fn is_textual(&self) -> bool {
        false
    }

    fn is_visible(&self) -> bool {
        self.core().is_visible()
    }

    /// Nested attributes of a composite; empty for leaves.
    fn children(&self) -> Vec<AttributeRef> {
        Vec::new()
    }

    /// Slots consumed by a leaf when flattened.
    fn width(&self) -> usize {
        1
    }

    fn owner(&self) -> Option<RankingKey> {
        self.core().owner()
    }
}

impl fmt::Debug for dyn Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Attribute({})", self.id())
    }
}

/// Position of `attribute` in `list`, by identity.
pub(crate) fn position_of(list: &[AttributeRef], attribute: &AttributeRef) -> Option<usize> {
    list.iter().position(|a| Rc::ptr_eq(a, attribute))
}

/// Whether two attribute lists hold the same attributes in the same order.
pub(crate) fn same_attributes(a: &[AttributeRef], b: &[AttributeRef]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Rc::ptr_eq(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::fixtures::{categorical, number};
    use std::cell::RefCell;

    #[test]
    fn test_core_defaults() {
        let attr = number("x", &[1.0]);
        assert_eq!(attr.id(), "x");
        assert!(attr.is_visible());
        assert!(attr.owner().is_none());
        assert!(!attr.is_categorical());
        assert!(attr.children().is_empty());
        assert_eq!(attr.width(), 1);
    }

    #[test]
    fn test_set_visible_fires_once() {
        let attr = number("x", &[1.0]);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        attr.core()
            .events()
            .subscribe(EventType::VisibilityChanged, "test", move |_, args| {
                if let EventArgs::Visibility { previous, current } = args {
                    sink.borrow_mut().push((*previous, *current));
                }
            });

        attr.core().set_visible(false);
        attr.core().set_visible(false);
        attr.core().set_visible(true);

        assert_eq!(*log.borrow(), vec![(true, false), (false, true)]);
        assert!(attr.is_visible());
    }

    #[test]
    fn test_identity_helpers() {
        let a: AttributeRef = number("a", &[1.0]);
        let b: AttributeRef = categorical("b", &["x"]);
        let list = vec![Rc::clone(&a), Rc::clone(&b)];
        assert_eq!(position_of(&list, &b), Some(1));
        assert!(same_attributes(&list, &[a.clone(), b.clone()]));
        assert!(!same_attributes(&list, &[b, a]));
    }
}
