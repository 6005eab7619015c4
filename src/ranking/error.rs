//! Ranking errors.
//!
//! Every error is local and synchronous: the call that returns it made no
//! mutation and fired no event.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankingError {
    /// The attribute is not a column of this ranking.
    #[error("attribute `{attribute}` does not belong to ranking `{ranking}`")]
    NotOwned { attribute: String, ranking: String },

    /// The attribute already belongs to a ranking and must be removed
    /// from it first.
    #[error("attribute `{attribute}` already belongs to a ranking")]
    AlreadyOwned { attribute: String },

    /// A reference attribute used for positioning is not a column.
    #[error("reference attribute `{attribute}` is not a column of ranking `{ranking}`")]
    UnknownReference { attribute: String, ranking: String },

    /// A computed result was based on outdated criteria.
    #[error("result computed for criteria version {actual}, current version is {expected}")]
    StaleResult { expected: u64, actual: u64 },

    #[error("invalid ranking configuration: {0}")]
    InvalidConfig(String),
}
