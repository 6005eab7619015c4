//! Dump and restore.

use super::engine::Ranking;
use super::types::{RankingDump, SortCriterion, SortCriterionDump};
use crate::attribute::{Attribute, AttributeRef};
use std::rc::Rc;
use tracing::{debug, warn};

impl Ranking {
    /// Captures columns and criteria. `describe` turns each top-level
    /// attribute into the caller's description type.
    pub fn dump<D, F>(&self, mut describe: F) -> RankingDump<D>
    where
        F: FnMut(&dyn Attribute) -> D,
    {
        let sort_criterias = self.sort_criteria().iter().map(SortCriterionDump::from).collect();
        let group_columns = self
            .group_criteria()
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        let group_sort_criterias = self
            .group_sort_criteria()
            .iter()
            .map(SortCriterionDump::from)
            .collect();
        RankingDump {
            columns: self.columns().iter().map(|c| describe(&**c)).collect(),
            sort_criterias,
            group_columns,
            group_sort_criterias,
        }
    }

    /// Replaces the content with `dump`.
    ///
    /// Columns are rebuilt through `factory`; descriptions it cannot
    /// resolve are skipped, and criteria referring to ids that are not
    /// columns afterwards are dropped. The dumped sort criteria replace the
    /// default sort picked while re-adding columns, so an empty dumped list
    /// leaves the ranking unsorted.
    pub fn restore<D, F>(&self, dump: &RankingDump<D>, mut factory: F)
    where
        F: FnMut(&D) -> Option<AttributeRef>,
    {
        self.clear();
        for description in &dump.columns {
            let Some(attribute) = factory(description) else {
                continue;
            };
            if let Err(err) = self.push(attribute) {
                warn!(ranking = %self.id(), error = %err, "skipping restored column");
            }
        }

        let columns = self.columns();
        let lookup = |id: &str| columns.iter().find(|c| c.id() == id).map(Rc::clone);
        let resolve = |list: &[SortCriterionDump]| -> Vec<SortCriterion> {
            list.iter()
                .filter_map(|s| lookup(s.sort_by.as_str()).map(|c| SortCriterion::new(c, s.asc)))
                .collect()
        };

        let groups: Vec<AttributeRef> = dump
            .group_columns
            .iter()
            .filter_map(|id| lookup(id.as_str()))
            .collect();
        let results = [
            self.group_by(&groups),
            self.set_group_sort_criteria(resolve(&dump.group_sort_criterias)),
        ];
        for err in results.into_iter().filter_map(Result::err) {
            warn!(ranking = %self.id(), error = %err, "restore failed to apply criteria");
        }
        // exact list, not the single-entry sort_by semantics
        self.replace_sort_criteria(resolve(&dump.sort_criterias));
        debug!(ranking = %self.id(), columns = columns.len(), "ranking restored");
    }
}
