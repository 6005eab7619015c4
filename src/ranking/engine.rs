//! The ranking orchestrator: columns, derived functions and results.

use super::config::RankingConfig;
use super::error::RankingError;
use super::types::{criterion_position, FlatAttribute, RankingKey, SortCriterion, FLAT_ALL};
use crate::attribute::{position_of, Attribute, AttributeRef};
use crate::event::{EventArgs, EventDispatcher, EventType, Listener};
use crate::group::{join_groups, GroupData, GroupPath, OrderedGroups};
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Namespace of the listeners tracking sort criteria and filters.
pub(crate) const NS_ORDER: &str = "order";
/// Namespace of the listeners tracking group criteria.
pub(crate) const NS_GROUP: &str = "group";
/// Namespace of the listeners tracking group sort criteria.
pub(crate) const NS_GROUP_ORDER: &str = "groupOrder";
/// Namespace of the listener re-emitting column visibility changes.
pub(crate) const NS_RANKING: &str = "ranking";

/// Attribute events a ranking re-emits as its own.
pub(crate) const FORWARDED_EVENTS: [EventType; 5] = [
    EventType::DirtyValues,
    EventType::DirtyHeader,
    EventType::Dirty,
    EventType::FilterChanged,
    EventType::LabelChanged,
];

pub(crate) const SORT_TRACKED: [EventType; 2] =
    [EventType::DirtyValues, EventType::SortMethodChanged];
pub(crate) const GROUP_TRACKED: [EventType; 3] = [
    EventType::DirtyValues,
    EventType::SortMethodChanged,
    EventType::GroupingChanged,
];
pub(crate) const GROUP_SORT_TRACKED: [EventType; 1] = [EventType::SortMethodChanged];

/// Order state shared with the listeners installed on attributes.
pub(crate) struct OrderSignals {
    pub(crate) events: Rc<EventDispatcher>,
    version: Cell<u64>,
    dirty: Cell<bool>,
}

impl OrderSignals {
    /// Moves to the dirty state and returns the new criteria version.
    pub(crate) fn invalidate(&self) -> u64 {
        let version = self.version.get() + 1;
        self.version.set(version);
        self.dirty.set(true);
        version
    }

    /// Invalidates and tells subscribers the order must be recomputed.
    pub(crate) fn dirty_order(&self) {
        let version = self.invalidate();
        trace!(version, "order dirty");
        self.events.fire(
            &[EventType::DirtyOrder, EventType::DirtyValues, EventType::Dirty],
            &EventArgs::DirtyOrder { version },
        );
    }
}

pub(crate) struct RankingState {
    pub(crate) columns: Vec<AttributeRef>,
    pub(crate) sort_criteria: Vec<SortCriterion>,
    pub(crate) group_sort_criteria: Vec<SortCriterion>,
    pub(crate) group_columns: Vec<AttributeRef>,
    pub(crate) groups: Rc<OrderedGroups>,
}

/// A ranking: an ordered set of attributes plus the sort, group and group
/// sort criteria over them.
///
/// The ranking never sorts rows itself. It derives the row comparator
/// ([`compare_rows`](Self::compare_rows)), group classifier
/// ([`classify`](Self::classify)), group comparator and filter from its
/// criteria, fires [`EventType::DirtyOrder`] whenever they stop matching
/// the current order, and accepts the recomputed order through
/// [`set_order`](Self::set_order) / [`set_groups`](Self::set_groups).
///
/// All methods take `&self`: state lives behind `RefCell`s that are never
/// borrowed while listeners or attribute callbacks run, so both may call
/// back into the ranking.
///
/// # Examples
///
/// ```ignore
/// let ranking = Ranking::new("main");
/// ranking.push(score.clone())?;          // becomes the default sort
/// ranking.push(name.clone())?;
/// ranking.toggle_sorting(&name)?;        // name first, then score
///
/// let version = ranking.criteria_version();
/// let mut rows: Vec<usize> = (0..n).filter(|&r| ranking.filter(r)).collect();
/// rows.sort_by(|&a, &b| ranking.compare_rows(a, b));
/// ranking.apply_groups(version, OrderedGroups::single(rows))?;
/// ```
pub struct Ranking {
    key: RankingKey,
    id: RefCell<String>,
    pub(crate) config: Cell<RankingConfig>,
    pub(crate) state: RefCell<RankingState>,
    pub(crate) signals: Rc<OrderSignals>,
}

/// Replaces characters that are not safe in CSS identifiers with `_`.
pub fn fix_css(id: &str) -> String {
    const UNSAFE: &str = "!#$%&'()*+,./:;<=>?@[\\]^`{|}~";
    id.chars()
        .map(|c| {
            if c.is_whitespace() || UNSAFE.contains(c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

impl Ranking {
    /// Creates a ranking with the default capacities.
    pub fn new(id: impl Into<String>) -> Self {
        Self::build(id.into(), RankingConfig::default())
    }

    /// Creates a ranking with the given capacities.
    pub fn with_config(id: impl Into<String>, config: RankingConfig) -> Result<Self, RankingError> {
        config.validate().map_err(RankingError::InvalidConfig)?;
        Ok(Self::build(id.into(), config))
    }

    fn build(id: String, config: RankingConfig) -> Self {
        Self {
            key: RankingKey::next(),
            id: RefCell::new(fix_css(&id)),
            config: Cell::new(config),
            state: RefCell::new(RankingState {
                columns: Vec::new(),
                sort_criteria: Vec::new(),
                group_sort_criteria: Vec::new(),
                group_columns: Vec::new(),
                groups: Rc::new(OrderedGroups::default()),
            }),
            signals: Rc::new(OrderSignals {
                events: Rc::new(EventDispatcher::new()),
                version: Cell::new(0),
                dirty: Cell::new(false),
            }),
        }
    }

    /// The CSS-safe id.
    pub fn id(&self) -> String {
        self.id.borrow().clone()
    }

    /// Sets the id, replacing characters unsafe in CSS identifiers.
    pub fn set_id(&self, id: &str) {
        *self.id.borrow_mut() = fix_css(id);
    }

    /// Replaces the id with a freshly generated one.
    pub fn assign_new_id<F: FnOnce() -> String>(&self, generate: F) {
        self.set_id(&generate());
    }

    /// Identity stored on owned attributes. Unlike the id it never changes.
    pub fn key(&self) -> RankingKey {
        self.key
    }

    /// Current capacities.
    pub fn config(&self) -> RankingConfig {
        self.config.get()
    }

    /// The ranking's dispatcher. Attribute notifications are forwarded here.
    pub fn events(&self) -> &Rc<EventDispatcher> {
        &self.signals.events
    }

    /// Monotonic counter bumped on every transition to the dirty state.
    ///
    /// An order computation should record it when it starts and hand it to
    /// [`apply_groups`](Self::apply_groups), which rejects stale results.
    pub fn criteria_version(&self) -> u64 {
        self.signals.version.get()
    }

    /// Whether the criteria changed since the last applied result.
    pub fn is_dirty(&self) -> bool {
        self.signals.dirty.get()
    }

    pub(crate) fn dirty_order_listener(&self) -> Listener {
        let signals = Rc::downgrade(&self.signals);
        Rc::new(move |_, _| {
            if let Some(signals) = signals.upgrade() {
                signals.dirty_order();
            }
        })
    }

    /// Re-emits an attribute's visibility change on the ranking, naming
    /// the attribute. Holds both ends weakly.
    fn column_visibility_listener(&self, attribute: &AttributeRef) -> Listener {
        let signals = Rc::downgrade(&self.signals);
        let attribute = Rc::downgrade(attribute);
        Rc::new(move |_, args: &EventArgs| {
            let (Some(signals), Some(attribute)) = (signals.upgrade(), attribute.upgrade()) else {
                return;
            };
            if let EventArgs::Visibility { previous, current } = *args {
                signals.events.fire(
                    &[EventType::VisibilityChanged],
                    &EventArgs::ColumnVisibility {
                        attribute,
                        previous,
                        current,
                    },
                );
            }
        })
    }

    pub(crate) fn fire(&self, events: &[EventType], args: EventArgs) {
        self.signals.events.fire(events, &args);
    }

    pub(crate) fn not_owned(&self, attribute: &AttributeRef) -> RankingError {
        warn!(
            ranking = %self.id(),
            attribute = attribute.id(),
            "attribute does not belong to this ranking"
        );
        RankingError::NotOwned {
            attribute: attribute.id().to_string(),
            ranking: self.id(),
        }
    }

    pub(crate) fn ensure_owned(&self, attribute: &AttributeRef) -> Result<(), RankingError> {
        if attribute.owner() == Some(self.key) {
            Ok(())
        } else {
            Err(self.not_owned(attribute))
        }
    }

    // ---- columns ----

    /// Number of top-level attributes.
    pub fn len(&self) -> usize {
        self.state.borrow().columns.len()
    }

    /// Whether the ranking holds no attributes.
    pub fn is_empty(&self) -> bool {
        self.state.borrow().columns.is_empty()
    }

    /// The top-level attributes, in display order.
    pub fn columns(&self) -> Vec<AttributeRef> {
        self.state.borrow().columns.clone()
    }

    /// The top-level attribute at `index`.
    pub fn at(&self, index: usize) -> Option<AttributeRef> {
        self.state.borrow().columns.get(index).cloned()
    }

    /// Position of `attribute` among the top-level attributes.
    pub fn index_of(&self, attribute: &AttributeRef) -> Option<usize> {
        position_of(&self.state.borrow().columns, attribute)
    }

    /// Inserts `attribute` at `index` (clamped to the end).
    ///
    /// The ranking takes over the attribute's value, header, filter and
    /// visibility notifications, and a filter change dirties the order. If
    /// nothing is sorted yet and the attribute is not a support attribute,
    /// it becomes the sort criterion: ascending if textual, else
    /// descending.
    pub fn insert(&self, attribute: AttributeRef, index: usize) -> Result<(), RankingError> {
        if attribute.owner().is_some() {
            return Err(RankingError::AlreadyOwned {
                attribute: attribute.id().to_string(),
            });
        }
        let index = {
            let mut state = self.state.borrow_mut();
            let index = index.min(state.columns.len());
            state.columns.insert(index, Rc::clone(&attribute));
            index
        };
        let core = attribute.core();
        core.set_owner(Some(self.key));
        self.events().forward(core.events(), &FORWARDED_EVENTS);
        core.events()
            .on(EventType::FilterChanged, NS_ORDER, Some(self.dirty_order_listener()));
        core.events().on(
            EventType::VisibilityChanged,
            NS_RANKING,
            Some(self.column_visibility_listener(&attribute)),
        );
        debug!(ranking = %self.id(), attribute = attribute.id(), index, "column added");

        self.fire(
            &[
                EventType::AddColumn,
                EventType::DirtyHeader,
                EventType::DirtyValues,
                EventType::Dirty,
            ],
            EventArgs::ColumnAdded {
                attribute: Rc::clone(&attribute),
                index,
            },
        );

        let unsorted = self.state.borrow().sort_criteria.is_empty();
        if unsorted && !attribute.is_support() {
            self.sort_by(Some(&attribute), attribute.is_textual())?;
        }
        if attribute.is_filtered() {
            self.signals.dirty_order();
        }
        Ok(())
    }

    /// Appends `attribute`.
    pub fn push(&self, attribute: AttributeRef) -> Result<(), RankingError> {
        let end = self.len();
        self.insert(attribute, end)
    }

    /// Inserts `attribute` directly after `reference`.
    pub fn insert_after(
        &self,
        attribute: AttributeRef,
        reference: &AttributeRef,
    ) -> Result<(), RankingError> {
        let index = self
            .index_of(reference)
            .ok_or_else(|| self.unknown_reference(reference))?;
        self.insert(attribute, index + 1)
    }

    fn unknown_reference(&self, reference: &AttributeRef) -> RankingError {
        RankingError::UnknownReference {
            attribute: reference.id().to_string(),
            ranking: self.id(),
        }
    }

    /// Moves `attribute` so that it lands before the column currently at
    /// `index` (or at the end).
    pub fn move_to(&self, attribute: &AttributeRef, index: usize) -> Result<(), RankingError> {
        if attribute.owner() != Some(self.key) {
            warn!(
                ranking = %self.id(),
                attribute = attribute.id(),
                "invalid move: attribute is not a column of this ranking"
            );
            return Err(RankingError::NotOwned {
                attribute: attribute.id().to_string(),
                ranking: self.id(),
            });
        }
        let previous_index = {
            let mut state = self.state.borrow_mut();
            let Some(old) = position_of(&state.columns, attribute) else {
                drop(state);
                return Err(self.not_owned(attribute));
            };
            if old == index {
                return Ok(());
            }
            let column = state.columns.remove(old);
            let target = if old < index { index - 1 } else { index };
            let target = target.min(state.columns.len());
            state.columns.insert(target, column);
            old
        };

        self.fire(
            &[
                EventType::MoveColumn,
                EventType::DirtyHeader,
                EventType::DirtyValues,
                EventType::Dirty,
            ],
            EventArgs::ColumnMoved {
                attribute: Rc::clone(attribute),
                index,
                previous_index,
            },
        );
        Ok(())
    }

    /// Moves `attribute` directly after `reference`.
    pub fn move_after(
        &self,
        attribute: &AttributeRef,
        reference: &AttributeRef,
    ) -> Result<(), RankingError> {
        let index = self
            .index_of(reference)
            .ok_or_else(|| self.unknown_reference(reference))?;
        self.move_to(attribute, index + 1)
    }

    fn detach(&self, attribute: &AttributeRef) {
        let core = attribute.core();
        self.events().unforward(core.events(), &FORWARDED_EVENTS);
        let events = core.events();
        events.off(EventType::FilterChanged, NS_ORDER);
        events.off(EventType::VisibilityChanged, NS_RANKING);
        events.on_many(&SORT_TRACKED, NS_ORDER, None);
        events.on_many(&GROUP_TRACKED, NS_GROUP, None);
        events.on_many(&GROUP_SORT_TRACKED, NS_GROUP_ORDER, None);
        core.set_owner(None);
    }

    /// Removes `attribute` and every criterion referring to it.
    ///
    /// If it was the primary sort criterion, the next criterion is
    /// promoted, or the first remaining non-support attribute becomes the
    /// default sort. Returns `false` if it was not a column.
    pub fn remove(&self, attribute: &AttributeRef) -> bool {
        let Some(index) = self.index_of(attribute) else {
            return false;
        };

        let sort = self.sort_criteria();
        if let Some(position) = criterion_position(&sort, attribute) {
            let mut next = sort.clone();
            next.remove(position);
            if position == 0 && next.is_empty() {
                let fallback = self
                    .columns()
                    .into_iter()
                    .find(|c| !Rc::ptr_eq(c, attribute) && !c.is_support());
                if let Some(fallback) = fallback {
                    let ascending = fallback.is_textual();
                    next.push(SortCriterion::new(fallback, ascending));
                }
            }
            self.replace_sort_criteria(next);
        }

        let groups = self.group_criteria();
        if let Some(position) = position_of(&groups, attribute) {
            let mut next = groups;
            next.remove(position);
            self.replace_group_criteria(next);
        }

        let group_sort = self.group_sort_criteria();
        if criterion_position(&group_sort, attribute).is_some() {
            let next = group_sort
                .into_iter()
                .filter(|c| !c.is_on(attribute))
                .collect();
            self.replace_group_sort_criteria(next);
        }

        let was_filtered = attribute.is_filtered();
        self.detach(attribute);
        self.state.borrow_mut().columns.remove(index);
        debug!(ranking = %self.id(), attribute = attribute.id(), index, "column removed");

        self.fire(
            &[
                EventType::RemoveColumn,
                EventType::DirtyHeader,
                EventType::DirtyValues,
                EventType::Dirty,
            ],
            EventArgs::ColumnRemoved {
                attribute: Rc::clone(attribute),
                index,
            },
        );
        if was_filtered {
            self.signals.dirty_order();
        }
        true
    }

    /// Removes every attribute and all criteria with a single
    /// `RemoveColumn` notification.
    pub fn clear(&self) {
        let removed = {
            let mut state = self.state.borrow_mut();
            if state.columns.is_empty() {
                return;
            }
            state.sort_criteria.clear();
            state.group_columns.clear();
            state.group_sort_criteria.clear();
            std::mem::take(&mut state.columns)
        };

        // criteria only ever reference columns, so detaching every column
        // drops every criteria listener too
        for attribute in &removed {
            self.detach(attribute);
        }
        self.signals.invalidate();
        debug!(ranking = %self.id(), removed = removed.len(), "columns cleared");

        self.fire(
            &[
                EventType::RemoveColumn,
                EventType::DirtyHeader,
                EventType::DirtyValues,
                EventType::Dirty,
            ],
            EventArgs::ColumnsCleared { removed },
        );
    }

    /// Depth-first search over all attributes, composites included.
    pub fn find_by<P>(&self, mut predicate: P) -> Option<AttributeRef>
    where
        P: FnMut(&AttributeRef) -> bool,
    {
        fn walk<P: FnMut(&AttributeRef) -> bool>(
            list: &[AttributeRef],
            predicate: &mut P,
        ) -> Option<AttributeRef> {
            for attribute in list {
                if predicate(attribute) {
                    return Some(Rc::clone(attribute));
                }
                if let Some(found) = walk(&attribute.children(), predicate) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.columns(), &mut predicate)
    }

    /// Finds an attribute, nested or not, by id.
    pub fn find(&self, id: &str) -> Option<AttributeRef> {
        self.find_by(|a| a.id() == id)
    }

    // ---- layout ----

    /// Lays out visible leaf attributes left to right.
    ///
    /// Appends one [`FlatAttribute`] per leaf to `out` and returns the
    /// width consumed, counting `padding` after each top-level or nested
    /// entry. `levels_to_go` bounds how deep composites are opened: a
    /// composite reached with no budget left is laid out as a leaf.
    /// [`FLAT_ALL`] (or any negative value) means unlimited.
    pub fn flatten(
        &self,
        out: &mut Vec<FlatAttribute>,
        offset: usize,
        levels_to_go: i32,
        padding: usize,
    ) -> usize {
        let mut acc = offset;
        if opens(levels_to_go) {
            for column in self.columns().iter().filter(|c| c.is_visible()) {
                acc += flatten_attribute(column, out, acc, next_level(levels_to_go), padding)
                    + padding;
            }
        }
        acc - offset
    }

    /// All visible leaf attributes in layout order.
    pub fn flat_columns(&self) -> Vec<AttributeRef> {
        let mut out = Vec::new();
        self.flatten(&mut out, 0, FLAT_ALL, 0);
        out.into_iter().map(|f| f.attribute).collect()
    }

    // ---- derived functions ----

    /// Compares two rows by the active sort criteria, falling back to the
    /// row index so that the order is total and deterministic.
    pub fn compare_rows(&self, a: usize, b: usize) -> Ordering {
        compare_by_criteria(&self.sort_criteria(), a, b)
    }

    /// A row comparator over a snapshot of the current sort criteria.
    ///
    /// Later criteria changes do not affect it, which makes it suitable for
    /// an order computation that runs after the triggering call returned.
    pub fn row_comparator(&self) -> impl Fn(usize, usize) -> Ordering + 'static {
        let criteria = self.sort_criteria();
        move |a, b| compare_by_criteria(&criteria, a, b)
    }

    /// Compares sibling groups by the group sort criteria; without
    /// criteria, by case-insensitive name.
    pub fn compare_groups(&self, a: &GroupData<'_>, b: &GroupData<'_>) -> Ordering {
        let criteria = self.group_sort_criteria();
        if criteria.is_empty() {
            return a.name.to_lowercase().cmp(&b.name.to_lowercase());
        }
        for criterion in &criteria {
            let ordering = criterion.attribute.group_compare(a, b);
            if ordering != Ordering::Equal {
                return if criterion.ascending {
                    ordering
                } else {
                    ordering.reverse()
                };
            }
        }
        a.name.cmp(b.name)
    }

    /// Classifies a row by the active group criteria.
    pub fn classify(&self, row: usize) -> GroupPath {
        match self.group_criteria().as_slice() {
            [] => GroupPath::default_group(),
            [single] => single.classify(row),
            columns => {
                let paths: Vec<GroupPath> = columns.iter().map(|c| c.classify(row)).collect();
                join_groups(&paths)
            }
        }
    }

    /// Whether any column filters rows.
    pub fn is_filtered(&self) -> bool {
        self.columns().iter().any(|c| c.is_filtered())
    }

    /// Whether a row passes every column's filter.
    pub fn filter(&self, row: usize) -> bool {
        self.columns().iter().all(|c| c.filter(row))
    }

    // ---- results ----

    /// Current order: every group's rows, group after group.
    pub fn order(&self) -> Vec<usize> {
        self.state.borrow().groups.order()
    }

    /// Groups of the last applied result.
    pub fn groups(&self) -> Rc<OrderedGroups> {
        Rc::clone(&self.state.borrow().groups)
    }

    /// Replaces the order with a single ungrouped sequence.
    pub fn set_order(&self, order: Vec<usize>) {
        self.set_groups(OrderedGroups::single(order));
    }

    /// Replaces the groups with freshly computed ones and marks the
    /// ranking clean.
    pub fn set_groups(&self, groups: OrderedGroups) {
        let current_groups = Rc::new(groups);
        let previous_groups = std::mem::replace(
            &mut self.state.borrow_mut().groups,
            Rc::clone(&current_groups),
        );
        self.signals.dirty.set(false);
        debug!(
            ranking = %self.id(),
            groups = current_groups.len(),
            version = self.criteria_version(),
            "groups applied"
        );

        self.fire(
            &[
                EventType::OrderChanged,
                EventType::GroupsChanged,
                EventType::DirtyValues,
                EventType::Dirty,
            ],
            EventArgs::Order {
                previous: previous_groups.order(),
                current: current_groups.order(),
                previous_groups,
                current_groups,
            },
        );
    }

    /// Applies groups computed for criteria `version`, rejecting them if
    /// the criteria changed since.
    pub fn apply_groups(&self, version: u64, groups: OrderedGroups) -> Result<(), RankingError> {
        let expected = self.criteria_version();
        if version != expected {
            warn!(ranking = %self.id(), expected, actual = version, "discarding stale result");
            return Err(RankingError::StaleResult {
                expected,
                actual: version,
            });
        }
        self.set_groups(groups);
        Ok(())
    }

    /// [`apply_groups`](Self::apply_groups) for an ungrouped order.
    pub fn apply_order(&self, version: u64, order: Vec<usize>) -> Result<(), RankingError> {
        self.apply_groups(version, OrderedGroups::single(order))
    }
}

pub(crate) fn compare_by_criteria(criteria: &[SortCriterion], a: usize, b: usize) -> Ordering {
    for criterion in criteria {
        let ordering = criterion.attribute.compare(a, b);
        if ordering != Ordering::Equal {
            return if criterion.ascending {
                ordering
            } else {
                ordering.reverse()
            };
        }
    }
    a.cmp(&b)
}

fn flatten_attribute(
    attribute: &AttributeRef,
    out: &mut Vec<FlatAttribute>,
    offset: usize,
    levels_to_go: i32,
    padding: usize,
) -> usize {
    let children = attribute.children();
    if children.is_empty() || !opens(levels_to_go) {
        let width = attribute.width();
        out.push(FlatAttribute {
            attribute: Rc::clone(attribute),
            offset,
            width,
        });
        return width;
    }
    let mut acc = offset;
    for child in children.iter().filter(|c| c.is_visible()) {
        acc += flatten_attribute(child, out, acc, next_level(levels_to_go), padding) + padding;
    }
    acc - offset
}

fn opens(levels_to_go: i32) -> bool {
    levels_to_go > 0 || levels_to_go <= FLAT_ALL
}

/// Depth budget one level down; unlimited stays unlimited.
fn next_level(levels_to_go: i32) -> i32 {
    if levels_to_go <= FLAT_ALL {
        FLAT_ALL
    } else {
        (levels_to_go - 1).max(0)
    }
}

impl fmt::Debug for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Ranking")
            .field("id", &self.id())
            .field("columns", &state.columns)
            .field("sort_criteria", &state.sort_criteria)
            .field("group_columns", &state.group_columns)
            .field("group_sort_criteria", &state.group_sort_criteria)
            .field("version", &self.criteria_version())
            .finish()
    }
}
