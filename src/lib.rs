//! Ranking and grouping orchestration for tabular views.
//!
//! Tracks which attributes a ranking shows, how rows are sorted, grouped
//! and how groups are ordered, and tells observers when the current order
//! is stale:
//!
//! - **Attributes**: the [`attribute::Attribute`] trait through which the
//!   engine compares, classifies and filters rows without knowing how
//!   values are stored.
//! - **Events**: namespaced publish/subscribe with parent forwarding.
//! - **Groups**: group lineages, intersection joins and the arena holding
//!   computed group hierarchies.
//! - **Ranking**: the orchestrator that owns attributes, maintains sort,
//!   group and group sort criteria, and derives comparators, classifier and
//!   filter from them.
//!
//! # Architecture
//!
//! The crate is single-threaded and performs no sorting itself. Consumers
//! listen for `DirtyOrder`, compute the order with the derived functions,
//! and hand the result back. Everything is synchronous; listeners may call
//! back into the ranking while being notified.

pub mod attribute;
pub mod event;
pub mod group;
pub mod ranking;
