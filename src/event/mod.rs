//! Typed publish/subscribe for attributes and rankings.
//!
//! Every entity that emits notifications owns an [`EventDispatcher`].
//! Listeners are keyed by event type plus a namespace string, so that
//! independent subscribers (the ranking's order tracking, a renderer, a
//! test counter) can register and remove themselves without interfering.
//!
//! Forwarding lets a parent re-emit a child's events as its own: a ranking
//! forwards the value, header, filter and label notifications of each
//! attribute it holds, so a subscriber on the ranking observes them
//! transitively. The link is recorded on the parent and torn down with
//! [`EventDispatcher::unforward`]. Visibility changes are re-emitted
//! separately as [`EventArgs::ColumnVisibility`], naming the attribute.

mod dispatcher;
mod types;

pub use dispatcher::{EventDispatcher, Listener, FORWARD_NAMESPACE};
pub use types::{EventArgs, EventType};
