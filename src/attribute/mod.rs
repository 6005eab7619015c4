//! Attributes: the columns a ranking sorts, groups and filters by.
//!
//! The engine does not know how values are stored or compared. It talks
//! to attributes through the [`Attribute`] trait, asking capability
//! questions such as [`Attribute::is_categorical`] instead of inspecting
//! concrete types, and listening to the notifications each attribute emits
//! through the dispatcher in its [`AttributeCore`].

#[cfg(test)]
pub(crate) mod fixtures;
mod types;

pub use types::{Attribute, AttributeCore, AttributeRef};
pub(crate) use types::{position_of, same_attributes};
