//! Attribute implementations used by the unit tests.

use super::types::{Attribute, AttributeCore, AttributeRef};
use crate::event::{EventDispatcher, EventType};
use crate::group::{Group, GroupData, GroupPath};
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::rc::Rc;

const PALETTE: [&str; 4] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728"];

/// Numeric attribute. `None` values compare equal to everything.
pub struct NumberAttr {
    core: AttributeCore,
    values: Vec<Option<f64>>,
    range: Cell<Option<(f64, f64)>>,
    inverted: Cell<bool>,
}

impl NumberAttr {
    /// Restricts visible rows to `[min, max]`, or clears the filter.
    pub fn set_filter(&self, range: Option<(f64, f64)>) {
        self.range.set(range);
        self.core.notify_filter_changed();
    }

    /// Flips the comparison direction, simulating a sort method change.
    pub fn invert(&self) {
        self.inverted.set(!self.inverted.get());
        self.core.notify_sort_method_changed();
    }
}

impl Attribute for NumberAttr {
    fn core(&self) -> &AttributeCore {
        &self.core
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        let ordering = match (self.values[a], self.values[b]) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        };
        if self.inverted.get() {
            ordering.reverse()
        } else {
            ordering
        }
    }

    fn group_compare(&self, a: &GroupData<'_>, b: &GroupData<'_>) -> Ordering {
        let sum = |rows: &[usize]| -> f64 { rows.iter().filter_map(|&r| self.values[r]).sum() };
        sum(a.rows)
            .partial_cmp(&sum(b.rows))
            .unwrap_or(Ordering::Equal)
    }

    fn is_filtered(&self) -> bool {
        self.range.get().is_some()
    }

    fn filter(&self, row: usize) -> bool {
        match (self.range.get(), self.values[row]) {
            (None, _) => true,
            (Some((min, max)), Some(v)) => v >= min && v <= max,
            (Some(_), None) => false,
        }
    }
}

/// Text attribute.
pub struct StringAttr {
    core: AttributeCore,
    values: Vec<String>,
}

impl Attribute for StringAttr {
    fn core(&self) -> &AttributeCore {
        &self.core
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        self.values[a].cmp(&self.values[b])
    }

    fn is_textual(&self) -> bool {
        true
    }
}

/// Categorical attribute; classifies rows by their category.
pub struct CategoricalAttr {
    core: AttributeCore,
    values: Vec<String>,
    categories: Vec<String>,
}

impl CategoricalAttr {
    fn color_of(&self, category: &str) -> &'static str {
        let index = self
            .categories
            .iter()
            .position(|c| c == category)
            .unwrap_or(0);
        PALETTE[index % PALETTE.len()]
    }
}

impl Attribute for CategoricalAttr {
    fn core(&self) -> &AttributeCore {
        &self.core
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        self.values[a].cmp(&self.values[b])
    }

    fn classify(&self, row: usize) -> GroupPath {
        let value = &self.values[row];
        GroupPath::new(Group::new(
            format!("{}={}", self.core.id(), value),
            self.color_of(value),
        ))
    }

    fn is_categorical(&self) -> bool {
        true
    }
}

/// Support attribute (think row selection); never a default sort.
pub struct SupportAttr {
    core: AttributeCore,
}

impl Attribute for SupportAttr {
    fn core(&self) -> &AttributeCore {
        &self.core
    }

    fn compare(&self, _a: usize, _b: usize) -> Ordering {
        Ordering::Equal
    }

    fn is_support(&self) -> bool {
        true
    }
}

/// Composite attribute nesting other attributes.
pub struct CompositeAttr {
    core: AttributeCore,
    children: Vec<AttributeRef>,
}

impl Attribute for CompositeAttr {
    fn core(&self) -> &AttributeCore {
        &self.core
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        self.children
            .iter()
            .map(|c| c.compare(a, b))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    fn children(&self) -> Vec<AttributeRef> {
        self.children.clone()
    }
}

/// Attribute running a hook from every row and group callback.
pub struct HookedAttr {
    core: AttributeCore,
    hook: RefCell<Option<Box<dyn Fn()>>>,
}

impl HookedAttr {
    pub fn set_hook(&self, hook: impl Fn() + 'static) {
        *self.hook.borrow_mut() = Some(Box::new(hook));
    }

    fn run_hook(&self) {
        if let Some(hook) = self.hook.borrow().as_ref() {
            hook();
        }
    }
}

impl Attribute for HookedAttr {
    fn core(&self) -> &AttributeCore {
        &self.core
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        self.run_hook();
        a.cmp(&b)
    }

    fn group_compare(&self, a: &GroupData<'_>, b: &GroupData<'_>) -> Ordering {
        self.run_hook();
        a.name.cmp(b.name)
    }

    fn classify(&self, _row: usize) -> GroupPath {
        self.run_hook();
        GroupPath::default_group()
    }

    fn filter(&self, _row: usize) -> bool {
        self.run_hook();
        true
    }
}

pub fn number(id: &str, values: &[f64]) -> Rc<NumberAttr> {
    number_with_missing(id, &values.iter().map(|v| Some(*v)).collect::<Vec<_>>())
}

pub fn number_with_missing(id: &str, values: &[Option<f64>]) -> Rc<NumberAttr> {
    Rc::new(NumberAttr {
        core: AttributeCore::new(id),
        values: values.to_vec(),
        range: Cell::new(None),
        inverted: Cell::new(false),
    })
}

pub fn string(id: &str, values: &[&str]) -> Rc<StringAttr> {
    Rc::new(StringAttr {
        core: AttributeCore::new(id),
        values: values.iter().map(|v| v.to_string()).collect(),
    })
}

pub fn categorical(id: &str, values: &[&str]) -> Rc<CategoricalAttr> {
    let mut categories: Vec<String> = Vec::new();
    for v in values {
        if !categories.iter().any(|c| c == v) {
            categories.push(v.to_string());
        }
    }
    Rc::new(CategoricalAttr {
        core: AttributeCore::new(id),
        values: values.iter().map(|v| v.to_string()).collect(),
        categories,
    })
}

pub fn support(id: &str) -> Rc<SupportAttr> {
    Rc::new(SupportAttr {
        core: AttributeCore::new(id),
    })
}

pub fn composite(id: &str, children: Vec<AttributeRef>) -> Rc<CompositeAttr> {
    Rc::new(CompositeAttr {
        core: AttributeCore::new(id),
        children,
    })
}

pub fn hooked(id: &str) -> Rc<HookedAttr> {
    Rc::new(HookedAttr {
        core: AttributeCore::new(id),
        hook: RefCell::new(None),
    })
}

/// Counts how often `event` is dispatched on `events`.
pub fn counter(events: &EventDispatcher, event: EventType) -> Rc<Cell<usize>> {
    let hits = Rc::new(Cell::new(0));
    let sink = Rc::clone(&hits);
    events.subscribe(event, "test-counter", move |_, _| sink.set(sink.get() + 1));
    hits
}
