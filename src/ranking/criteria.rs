//! Sort, group and group sort criteria management.

use super::engine::{
    Ranking, GROUP_SORT_TRACKED, GROUP_TRACKED, NS_GROUP, NS_GROUP_ORDER, NS_ORDER, SORT_TRACKED,
};
use super::error::RankingError;
use super::types::{criterion_position, dedup_criteria, SortCriterion};
use crate::attribute::{position_of, same_attributes, Attribute, AttributeRef};
use crate::event::{EventArgs, EventType, Listener};
use std::rc::Rc;
use tracing::debug;

const RESORT: [EventType; 5] = [
    EventType::SortCriteriaChanged,
    EventType::DirtyOrder,
    EventType::DirtyHeader,
    EventType::DirtyValues,
    EventType::Dirty,
];

const REGROUP: [EventType; 5] = [
    EventType::GroupCriteriaChanged,
    EventType::DirtyOrder,
    EventType::DirtyHeader,
    EventType::DirtyValues,
    EventType::Dirty,
];

const RESORT_GROUPS: [EventType; 5] = [
    EventType::GroupSortCriteriaChanged,
    EventType::DirtyOrder,
    EventType::DirtyHeader,
    EventType::DirtyValues,
    EventType::Dirty,
];

fn track(attribute: &AttributeRef, events: &[EventType], namespace: &str, listener: Option<Listener>) {
    attribute.core().events().on_many(events, namespace, listener);
}

impl Ranking {
    /// Active sort criteria, primary first.
    pub fn sort_criteria(&self) -> Vec<SortCriterion> {
        self.state.borrow().sort_criteria.clone()
    }

    /// The first sort criterion, if any.
    pub fn primary_sort_criterion(&self) -> Option<SortCriterion> {
        self.state.borrow().sort_criteria.first().cloned()
    }

    /// Attributes rows are grouped by, outermost first.
    pub fn group_criteria(&self) -> Vec<AttributeRef> {
        self.state.borrow().group_columns.clone()
    }

    /// Criteria ordering sibling groups.
    pub fn group_sort_criteria(&self) -> Vec<SortCriterion> {
        self.state.borrow().group_sort_criteria.clone()
    }

    /// Number of leading sort criteria reserved for categorical group
    /// criteria.
    pub fn pinned_sort_count(&self) -> usize {
        self.state
            .borrow()
            .group_columns
            .iter()
            .filter(|c| c.is_categorical())
            .count()
    }

    /// Installs `next` as the sort criteria (deduplicated and truncated),
    /// re-subscribing order tracking before notifying. Returns whether
    /// anything changed.
    pub(crate) fn replace_sort_criteria(&self, next: Vec<SortCriterion>) -> bool {
        let mut next = dedup_criteria(next);
        next.truncate(self.config.get().max_sort_criteria);
        let previous = {
            let state = self.state.borrow();
            if state.sort_criteria == next {
                return false;
            }
            state.sort_criteria.clone()
        };

        for criterion in &previous {
            track(&criterion.attribute, &SORT_TRACKED, NS_ORDER, None);
        }
        let listener = self.dirty_order_listener();
        for criterion in &next {
            track(
                &criterion.attribute,
                &SORT_TRACKED,
                NS_ORDER,
                Some(Rc::clone(&listener)),
            );
        }
        self.state.borrow_mut().sort_criteria = next.clone();

        let version = self.signals.invalidate();
        debug!(ranking = %self.id(), criteria = ?next, version, "sort criteria changed");
        self.fire(
            &RESORT,
            EventArgs::SortCriteria {
                previous,
                current: next,
            },
        );
        true
    }

    pub(crate) fn replace_group_criteria(&self, next: Vec<AttributeRef>) -> bool {
        let mut unique: Vec<AttributeRef> = Vec::with_capacity(next.len());
        for attribute in next {
            if position_of(&unique, &attribute).is_none() {
                unique.push(attribute);
            }
        }
        unique.truncate(self.config.get().max_group_columns);
        let previous = {
            let state = self.state.borrow();
            if same_attributes(&state.group_columns, &unique) {
                return false;
            }
            state.group_columns.clone()
        };

        for attribute in &previous {
            track(attribute, &GROUP_TRACKED, NS_GROUP, None);
        }
        let listener = self.dirty_order_listener();
        for attribute in &unique {
            track(attribute, &GROUP_TRACKED, NS_GROUP, Some(Rc::clone(&listener)));
        }
        self.state.borrow_mut().group_columns = unique.clone();

        let version = self.signals.invalidate();
        debug!(ranking = %self.id(), groups = ?unique, version, "group criteria changed");
        self.fire(
            &REGROUP,
            EventArgs::GroupCriteria {
                previous,
                current: unique,
            },
        );
        true
    }

    pub(crate) fn replace_group_sort_criteria(&self, next: Vec<SortCriterion>) -> bool {
        let mut next = dedup_criteria(next);
        next.truncate(self.config.get().max_sort_criteria);
        let previous = {
            let state = self.state.borrow();
            if state.group_sort_criteria == next {
                return false;
            }
            state.group_sort_criteria.clone()
        };

        for criterion in &previous {
            track(&criterion.attribute, &GROUP_SORT_TRACKED, NS_GROUP_ORDER, None);
        }
        let listener = self.dirty_order_listener();
        for criterion in &next {
            track(
                &criterion.attribute,
                &GROUP_SORT_TRACKED,
                NS_GROUP_ORDER,
                Some(Rc::clone(&listener)),
            );
        }
        self.state.borrow_mut().group_sort_criteria = next.clone();

        let version = self.signals.invalidate();
        debug!(ranking = %self.id(), criteria = ?next, version, "group sort criteria changed");
        self.fire(
            &RESORT_GROUPS,
            EventArgs::SortCriteria {
                previous,
                current: next,
            },
        );
        true
    }

    // ---- sorting ----

    /// Makes `attribute` the primary sort criterion, or clears all sort
    /// criteria when `None`.
    ///
    /// Remaining criteria shift back; at capacity the last one is evicted.
    /// Nothing happens if the primary criterion already matches.
    pub fn sort_by(
        &self,
        attribute: Option<&AttributeRef>,
        ascending: bool,
    ) -> Result<(), RankingError> {
        if let Some(attribute) = attribute {
            self.ensure_owned(attribute)?;
        }
        let current = self.sort_criteria();
        match (attribute, current.first()) {
            (None, None) => return Ok(()),
            (Some(a), Some(primary)) if primary.is_on(a) && primary.ascending == ascending => {
                return Ok(())
            }
            _ => {}
        }

        let next = match attribute {
            Some(attribute) => {
                let max = self.config.get().max_sort_criteria;
                let mut next: Vec<SortCriterion> =
                    current.into_iter().filter(|c| !c.is_on(attribute)).collect();
                if next.len() >= max {
                    next.truncate(max.saturating_sub(1));
                }
                next.insert(0, SortCriterion::new(Rc::clone(attribute), ascending));
                next
            }
            None => Vec::new(),
        };
        self.replace_sort_criteria(next);
        Ok(())
    }

    /// Replaces the sort criteria. Excess entries are dropped from the end.
    ///
    /// An empty list is `sort_by(None, _)` and a single entry is
    /// `sort_by(Some(attribute), ascending)`, which keeps the remaining
    /// criteria behind it. Longer lists replace the criteria wholesale.
    pub fn set_sort_criteria(&self, criteria: Vec<SortCriterion>) -> Result<(), RankingError> {
        for criterion in &criteria {
            self.ensure_owned(&criterion.attribute)?;
        }
        let mut criteria = dedup_criteria(criteria);
        criteria.truncate(self.config.get().max_sort_criteria);
        match criteria.as_slice() {
            [] => self.sort_by(None, false),
            [single] => self.sort_by(Some(&single.attribute), single.ascending),
            _ => {
                self.replace_sort_criteria(criteria);
                Ok(())
            }
        }
    }

    /// Sorts by `attribute` as a user toggle would.
    ///
    /// The leading criteria pinned to categorical group criteria are kept
    /// in place. Toggling the first free criterion flips its direction;
    /// toggling another free criterion removes it; a new attribute is
    /// inserted as the first free criterion, descending. Without pinned
    /// criteria this is `sort_by(attribute, false)`.
    pub fn toggle_sorting(&self, attribute: &AttributeRef) -> Result<(), RankingError> {
        self.ensure_owned(attribute)?;
        let pinned = self.pinned_sort_count();
        let mut next = self.sort_criteria();

        if next.get(pinned).is_some_and(|c| c.is_on(attribute)) {
            next[pinned] = next[pinned].flipped();
            return self.set_sort_criteria(next);
        }
        if pinned == 0 {
            return self.sort_by(Some(attribute), false);
        }

        match criterion_position(&next, attribute) {
            Some(i) if i < pinned => next[i] = next[i].flipped(),
            Some(i) => {
                next.remove(i);
            }
            None => {
                let at = pinned.min(next.len());
                next.insert(at, SortCriterion::descending(Rc::clone(attribute)));
            }
        }
        self.set_sort_criteria(next)
    }

    // ---- grouping ----

    /// Groups by `attributes` (truncated to capacity); an empty slice
    /// removes all grouping.
    pub fn group_by(&self, attributes: &[AttributeRef]) -> Result<(), RankingError> {
        for attribute in attributes {
            self.ensure_owned(attribute)?;
        }
        self.replace_group_criteria(attributes.to_vec());
        Ok(())
    }

    /// Same as [`group_by`](Self::group_by).
    pub fn set_group_criteria(&self, attributes: &[AttributeRef]) -> Result<(), RankingError> {
        self.group_by(attributes)
    }

    /// Adds `attribute` as the first group criterion, or removes it if it
    /// already groups.
    ///
    /// A categorical attribute is also pinned as the primary ascending sort
    /// criterion when added, and unpinned when removed, so that toggling
    /// twice restores both lists.
    pub fn toggle_grouping(&self, attribute: &AttributeRef) -> Result<(), RankingError> {
        self.ensure_owned(attribute)?;
        let groups = self.group_criteria();

        if let Some(old) = position_of(&groups, attribute) {
            if attribute.is_categorical() {
                let sort = self.sort_criteria();
                if sort.get(old).is_some_and(|c| c.is_on(attribute)) {
                    let mut next = sort;
                    next.remove(old);
                    self.replace_sort_criteria(next);
                }
            }
            let mut next = groups;
            next.remove(old);
            self.replace_group_criteria(next);
            return Ok(());
        }

        if attribute.is_categorical() {
            let mut next = vec![SortCriterion::ascending(Rc::clone(attribute))];
            next.extend(
                self.sort_criteria()
                    .into_iter()
                    .filter(|c| !c.is_on(attribute)),
            );
            self.replace_sort_criteria(next);
        }
        let mut next = vec![Rc::clone(attribute)];
        next.extend(groups);
        self.replace_group_criteria(next);
        Ok(())
    }

    // ---- group sorting ----

    /// Replaces the criteria ordering sibling groups.
    pub fn set_group_sort_criteria(
        &self,
        criteria: Vec<SortCriterion>,
    ) -> Result<(), RankingError> {
        for criterion in &criteria {
            self.ensure_owned(&criterion.attribute)?;
        }
        self.replace_group_sort_criteria(criteria);
        Ok(())
    }

    /// Sorts groups by `attribute` alone.
    pub fn group_sort_by(&self, attribute: &AttributeRef, ascending: bool) -> Result<(), RankingError> {
        self.set_group_sort_criteria(vec![SortCriterion::new(Rc::clone(attribute), ascending)])
    }

    /// Sorts groups by `attribute`, descending first, flipping on repeat.
    pub fn toggle_group_sorting(&self, attribute: &AttributeRef) -> Result<(), RankingError> {
        let ascending = self
            .state
            .borrow()
            .group_sort_criteria
            .first()
            .is_some_and(|first| first.is_on(attribute) && !first.ascending);
        self.group_sort_by(attribute, ascending)
    }

    // ---- capacities ----

    /// Changes the sort capacity, truncating current criteria if needed.
    pub fn set_max_sort_criteria(&self, max: usize) -> Result<(), RankingError> {
        let config = self.config.get().with_max_sort_criteria(max);
        config.validate().map_err(RankingError::InvalidConfig)?;
        self.config.set(config);

        let sort = self.sort_criteria();
        if sort.len() > max {
            self.replace_sort_criteria(sort);
        }
        let group_sort = self.group_sort_criteria();
        if group_sort.len() > max {
            self.replace_group_sort_criteria(group_sort);
        }
        Ok(())
    }

    /// Changes the grouping capacity, truncating current criteria if
    /// needed.
    pub fn set_max_group_columns(&self, max: usize) {
        self.config
            .set(self.config.get().with_max_group_columns(max));
        let groups = self.group_criteria();
        if groups.len() > max {
            self.replace_group_criteria(groups);
        }
    }
}
