//! Synchronous event dispatcher with namespaced listeners and forwarding.

use super::types::{EventArgs, EventType};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A listener callback. Receives the event type being dispatched and the
/// payload shared by the whole `fire` call.
pub type Listener = Rc<dyn Fn(EventType, &EventArgs)>;

/// Namespace prefix reserved for forwarding listeners.
pub const FORWARD_NAMESPACE: &str = "forward";

static NEXT_DISPATCHER_ID: AtomicU64 = AtomicU64::new(1);

struct Registration {
    event: EventType,
    namespace: String,
    listener: Listener,
}

/// A recorded forwarding link from a child dispatcher to this one.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ForwardLink {
    child: u64,
    events: Vec<EventType>,
}

/// Per-entity publish/subscribe bus.
///
/// Listeners are keyed by `(event type, namespace)`. Registering the same
/// key again replaces the old listener; registering `None` removes it.
///
/// Dispatch is synchronous. [`fire`](Self::fire) snapshots the listener
/// list before the first callback runs, so callbacks may register or
/// remove listeners (on this or any other dispatcher) and may re-enter the
/// owner's API without disturbing the dispatch in progress. A listener
/// removed during a dispatch still receives that dispatch.
///
/// # Examples
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use u_ranking::event::{EventArgs, EventDispatcher, EventType};
///
/// let events = EventDispatcher::new();
/// let hits = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&hits);
/// events.subscribe(EventType::Dirty, "counter", move |_, _| counter.set(counter.get() + 1));
///
/// events.fire(&[EventType::Dirty, EventType::DirtyValues], &EventArgs::None);
/// assert_eq!(hits.get(), 1);
/// ```
pub struct EventDispatcher {
    id: u64,
    registrations: RefCell<Vec<Registration>>,
    forwards: RefCell<Vec<ForwardLink>>,
    fired: Cell<u64>,
}

impl EventDispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self {
            id: NEXT_DISPATCHER_ID.fetch_add(1, Ordering::Relaxed),
            registrations: RefCell::new(Vec::new()),
            forwards: RefCell::new(Vec::new()),
            fired: Cell::new(0),
        }
    }

    /// Process-unique identity of this dispatcher.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Registers, replaces, or (with `None`) removes the listener for
    /// `event` under `namespace`.
    ///
    /// A replaced listener moves to the end of the dispatch order.
    pub fn on(&self, event: EventType, namespace: &str, listener: Option<Listener>) {
        let mut registrations = self.registrations.borrow_mut();
        registrations.retain(|r| !(r.event == event && r.namespace == namespace));
        if let Some(listener) = listener {
            registrations.push(Registration {
                event,
                namespace: namespace.to_string(),
                listener,
            });
        }
    }

    /// Applies [`on`](Self::on) to several event types at once.
    pub fn on_many(&self, events: &[EventType], namespace: &str, listener: Option<Listener>) {
        for &event in events {
            self.on(event, namespace, listener.clone());
        }
    }

    /// Registers a closure as the listener for `event` under `namespace`.
    pub fn subscribe<F>(&self, event: EventType, namespace: &str, listener: F)
    where
        F: Fn(EventType, &EventArgs) + 'static,
    {
        self.on(event, namespace, Some(Rc::new(listener)));
    }

    /// Removes the listener for `event` under `namespace`, if any.
    pub fn off(&self, event: EventType, namespace: &str) {
        self.on(event, namespace, None);
    }

    /// Whether a listener is registered under the given key.
    pub fn has_listener(&self, event: EventType, namespace: &str) -> bool {
        self.registrations
            .borrow()
            .iter()
            .any(|r| r.event == event && r.namespace == namespace)
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: EventType) -> usize {
        self.registrations
            .borrow()
            .iter()
            .filter(|r| r.event == event)
            .count()
    }

    /// Number of `fire` calls made on this dispatcher so far.
    pub fn fire_count(&self) -> u64 {
        self.fired.get()
    }

    /// Dispatches `args` to the listeners of each type in `events`, in the
    /// given type order and, within a type, in registration order.
    pub fn fire(&self, events: &[EventType], args: &EventArgs) {
        self.fired.set(self.fired.get() + 1);
        let snapshot: Vec<(EventType, Listener)> = self
            .registrations
            .borrow()
            .iter()
            .filter(|r| events.contains(&r.event))
            .map(|r| (r.event, Rc::clone(&r.listener)))
            .collect();

        for &event in events {
            for (_, listener) in snapshot.iter().filter(|(e, _)| *e == event) {
                listener(event, args);
            }
        }
    }

    fn forward_namespace(&self) -> String {
        format!("{FORWARD_NAMESPACE}#{}", self.id)
    }

    /// Re-fires the given events of `child` on this dispatcher, with the
    /// same type and payload.
    ///
    /// The child holds only a weak reference back to this dispatcher.
    pub fn forward(self: &Rc<Self>, child: &EventDispatcher, events: &[EventType]) {
        let namespace = self.forward_namespace();
        let parent = Rc::downgrade(self);
        let forwarder: Listener = Rc::new(move |event, args| {
            if let Some(parent) = parent.upgrade() {
                parent.fire(&[event], args);
            }
        });
        child.on_many(events, &namespace, Some(forwarder));

        let mut forwards = self.forwards.borrow_mut();
        match forwards.iter_mut().find(|link| link.child == child.id) {
            Some(link) => {
                for event in events {
                    if !link.events.contains(event) {
                        link.events.push(*event);
                    }
                }
            }
            None => forwards.push(ForwardLink {
                child: child.id,
                events: events.to_vec(),
            }),
        }
    }

    /// Reverses [`forward`](Self::forward) for the given events.
    pub fn unforward(&self, child: &EventDispatcher, events: &[EventType]) {
        child.on_many(events, &self.forward_namespace(), None);

        let mut forwards = self.forwards.borrow_mut();
        for link in forwards.iter_mut().filter(|link| link.child == child.id) {
            link.events.retain(|e| !events.contains(e));
        }
        forwards.retain(|link| !link.events.is_empty());
    }

    /// Events currently forwarded from `child`.
    pub fn forwarded_events(&self, child: &EventDispatcher) -> Vec<EventType> {
        self.forwards
            .borrow()
            .iter()
            .find(|link| link.child == child.id)
            .map(|link| link.events.clone())
            .unwrap_or_default()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self
            .registrations
            .borrow()
            .iter()
            .map(|r| format!("{}.{}", r.event, r.namespace))
            .collect();
        f.debug_struct("EventDispatcher")
            .field("id", &self.id)
            .field("listeners", &keys)
            .field("forwards", &self.forwards.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Listener) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |tag: &str| -> Listener {
            let sink = Rc::clone(&sink);
            let tag = tag.to_string();
            Rc::new(move |event: EventType, _: &EventArgs| {
                sink.borrow_mut().push(format!("{tag}:{event}"));
            })
        };
        (log, make)
    }

    #[test]
    fn test_fire_order_by_type_then_registration() {
        let events = EventDispatcher::new();
        let (log, make) = recorder();
        events.on(EventType::Dirty, "a", Some(make("a")));
        events.on(EventType::DirtyValues, "b", Some(make("b")));
        events.on(EventType::Dirty, "c", Some(make("c")));

        events.fire(&[EventType::DirtyValues, EventType::Dirty], &EventArgs::None);

        assert_eq!(
            *log.borrow(),
            vec!["b:dirtyValues", "a:dirty", "c:dirty"]
        );
    }

    #[test]
    fn test_reregister_replaces() {
        let events = EventDispatcher::new();
        let (log, make) = recorder();
        events.on(EventType::Dirty, "x", Some(make("first")));
        events.on(EventType::Dirty, "y", Some(make("other")));
        events.on(EventType::Dirty, "x", Some(make("second")));

        events.fire(&[EventType::Dirty], &EventArgs::None);

        assert_eq!(events.listener_count(EventType::Dirty), 2);
        assert_eq!(*log.borrow(), vec!["other:dirty", "second:dirty"]);
    }

    #[test]
    fn test_none_removes() {
        let events = EventDispatcher::new();
        let (log, make) = recorder();
        events.on(EventType::Dirty, "x", Some(make("x")));
        events.on(EventType::Dirty, "x", None);

        events.fire(&[EventType::Dirty], &EventArgs::None);

        assert!(log.borrow().is_empty());
        assert!(!events.has_listener(EventType::Dirty, "x"));
    }

    #[test]
    fn test_same_namespace_different_types_are_distinct() {
        let events = EventDispatcher::new();
        let (log, make) = recorder();
        events.on_many(
            &[EventType::Dirty, EventType::DirtyValues],
            "order",
            Some(make("o")),
        );
        events.off(EventType::Dirty, "order");

        events.fire(&[EventType::Dirty, EventType::DirtyValues], &EventArgs::None);

        assert_eq!(*log.borrow(), vec!["o:dirtyValues"]);
    }

    #[test]
    fn test_listener_mutation_during_dispatch_uses_snapshot() {
        let events = Rc::new(EventDispatcher::new());
        let (log, make) = recorder();

        let handle = Rc::downgrade(&events);
        let late = make("late");
        events.subscribe(EventType::Dirty, "remover", move |_, _| {
            if let Some(events) = handle.upgrade() {
                events.off(EventType::Dirty, "victim");
                events.on(EventType::Dirty, "late", Some(Rc::clone(&late)));
            }
        });
        events.on(EventType::Dirty, "victim", Some(make("victim")));

        events.fire(&[EventType::Dirty], &EventArgs::None);
        assert_eq!(*log.borrow(), vec!["victim:dirty"]);

        log.borrow_mut().clear();
        events.fire(&[EventType::Dirty], &EventArgs::None);
        assert_eq!(*log.borrow(), vec!["late:dirty"]);
    }

    #[test]
    fn test_forward_and_unforward() {
        let parent = Rc::new(EventDispatcher::new());
        let child = EventDispatcher::new();
        let (log, make) = recorder();
        parent.on(EventType::DirtyValues, "view", Some(make("parent")));
        parent.on(EventType::DirtyHeader, "view", Some(make("parent")));

        parent.forward(&child, &[EventType::DirtyValues, EventType::DirtyHeader]);
        assert_eq!(
            parent.forwarded_events(&child),
            vec![EventType::DirtyValues, EventType::DirtyHeader]
        );

        child.fire(&[EventType::DirtyValues], &EventArgs::None);
        assert_eq!(*log.borrow(), vec!["parent:dirtyValues"]);

        parent.unforward(&child, &[EventType::DirtyValues]);
        child.fire(&[EventType::DirtyValues, EventType::DirtyHeader], &EventArgs::None);
        assert_eq!(
            *log.borrow(),
            vec!["parent:dirtyValues", "parent:dirtyHeader"]
        );

        parent.unforward(&child, &[EventType::DirtyHeader]);
        assert!(parent.forwarded_events(&child).is_empty());
        assert_eq!(child.listener_count(EventType::DirtyHeader), 0);
    }

    #[test]
    fn test_forward_passes_payload() {
        let parent = Rc::new(EventDispatcher::new());
        let child = EventDispatcher::new();
        let seen = Rc::new(Cell::new(0u64));
        let sink = Rc::clone(&seen);
        parent.subscribe(EventType::DirtyOrder, "listener", move |_, args| {
            if let EventArgs::DirtyOrder { version } = args {
                sink.set(*version);
            }
        });
        parent.forward(&child, &[EventType::DirtyOrder]);

        child.fire(&[EventType::DirtyOrder], &EventArgs::DirtyOrder { version: 7 });
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn test_forward_to_dropped_parent_is_silent() {
        let child = EventDispatcher::new();
        {
            let parent = Rc::new(EventDispatcher::new());
            parent.forward(&child, &[EventType::Dirty]);
        }
        child.fire(&[EventType::Dirty], &EventArgs::None);
        assert_eq!(child.listener_count(EventType::Dirty), 1);
    }
}
