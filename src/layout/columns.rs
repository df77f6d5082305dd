// src/layout/columns.rs

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, trace};

use crate::slots::{days_in_cell, AliasScope, Day};

/// Day → column index. Days without a column are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnMap(BTreeMap<Day, usize>);

impl ColumnMap {
    pub fn get(&self, day: Day) -> Option<usize> {
        self.0.get(&day).copied()
    }

    /// Mapped days in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Day, usize)> + '_ {
        self.0.iter().map(|(day, col)| (*day, *col))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Map each day to the first header cell that names it.
pub fn map_day_columns(header_row: &[String]) -> ColumnMap {
    let mut map = BTreeMap::new();
    for (idx, cell) in header_row.iter().enumerate() {
        for day in days_in_cell(cell, AliasScope::Labels) {
            if map.contains_key(&day) {
                trace!(%day, column = idx, "day already mapped, ignoring later column");
                continue;
            }
            map.insert(day, idx);
        }
    }
    debug!(mapped = map.len(), "mapped day columns");
    ColumnMap(map)
}
