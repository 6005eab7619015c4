//! Hierarchical grouping.
//!
//! Attributes classify a row into a [`GroupPath`], a root-to-leaf lineage of
//! plain [`Group`] labels. When several attributes group at once their
//! paths are joined into a single intersection path with [`join_groups`].
//!
//! Once an order computation has bucketed rows per group, the result is
//! materialized as [`OrderedGroups`]: an arena of [`GroupNode`]s linked by
//! [`GroupId`] index. Parent links are indices, so merging identical
//! ancestors ([`unify_parents`]) or cloning a chain ([`duplicate_group`])
//! rewires indices instead of shared references.

mod ops;
mod types;

pub use ops::{duplicate_group, group_roots, join_groups, unify_parents};
pub use types::{
    Group, GroupArena, GroupData, GroupId, GroupNode, GroupPath, OrderedGroups, DEFAULT_COLOR,
    DEFAULT_GROUP_NAME,
};
