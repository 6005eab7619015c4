//! Ranking capacity configuration.

/// Capacity limits of a ranking.
///
/// # Examples
///
/// ```
/// use u_ranking::ranking::RankingConfig;
///
/// let config = RankingConfig::default()
///     .with_max_sort_criteria(3)
///     .with_max_group_columns(2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingConfig {
    /// Maximum number of sort criteria (and of group sort criteria).
    /// Longer lists are truncated, keeping the front-most entries.
    pub max_sort_criteria: usize,

    /// Maximum number of attributes grouped by at once.
    pub max_group_columns: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_sort_criteria: 2,
            max_group_columns: 1,
        }
    }
}

impl RankingConfig {
    pub fn with_max_sort_criteria(mut self, n: usize) -> Self {
        self.max_sort_criteria = n;
        self
    }

    pub fn with_max_group_columns(mut self, n: usize) -> Self {
        self.max_group_columns = n;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_sort_criteria == 0 {
            return Err("max_sort_criteria must be at least 1".into());
        }
        Ok(())
    }
}
