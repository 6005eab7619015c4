//! Ranking orchestration.
//!
//! A [`Ranking`] holds an ordered list of attributes and three criteria
//! lists over them:
//!
//! - **Sort criteria**: the row comparator, with the row index as the final
//!   tie-breaker so the order is always total.
//! - **Group criteria**: the row classifier; several attributes are joined
//!   into intersection groups.
//! - **Group sort criteria**: the comparator for sibling groups.
//!
//! The ranking does not compute orders. Whenever a criteria change or an
//! attribute notification invalidates the current order it fires
//! `DirtyOrder`; an external computation then applies the result through
//! [`Ranking::set_groups`] or the version-checked [`Ranking::apply_groups`].
//!
//! # Ownership
//!
//! An attribute belongs to at most one ranking at a time. Criteria only
//! reference attributes that are currently columns: removing a column
//! drops it from every criteria list, promoting the next sort criterion or
//! falling back to a default sort.
//!
//! # References
//!
//! Gratzl et al. (2013), "LineUp: Visual Analysis of Multi-Attribute
//! Rankings"

mod config;
mod criteria;
mod engine;
mod error;
mod persist;
mod types;

pub use config::RankingConfig;
pub use engine::{fix_css, Ranking};
pub use error::RankingError;
pub use types::{
    FlatAttribute, RankingDump, RankingKey, SortCriterion, SortCriterionDump, FLAT_ALL,
};
