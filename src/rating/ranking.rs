//! Problem table ordering.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::constants::{DIFFICULTY_LEVELS, UNKNOWN_DIFFICULTY_RANK};
use crate::rating::types::ProblemStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Title,
    Difficulty,
    Count,
    Thinking,
    Implementing,
    Overall,
    Quality,
}

/// Per-session table ordering. `column == None` means the default title order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortPreference {
    pub column: Option<SortColumn>,
    pub ascending: bool,
}

impl Default for SortPreference {
    fn default() -> Self {
        Self {
            column: None,
            ascending: true,
        }
    }
}

impl SortPreference {
    /// Selecting the active column flips the direction; a new column starts ascending.
    pub fn toggle(self, column: SortColumn) -> Self {
        if self.column == Some(column) {
            Self {
                column: Some(column),
                ascending: !self.ascending,
            }
        } else {
            Self {
                column: Some(column),
                ascending: true,
            }
        }
    }
}

/// One row of the problem table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemRow {
    pub title: String,
    pub link: String,
    pub difficulty: String,
    pub tags: String,
    pub stats: Option<ProblemStats>,
}

enum SortKey<'a> {
    Text(&'a str),
    Number(f64),
}

impl SortKey<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            // 同一列的键类型一致
            _ => Ordering::Equal,
        }
    }
}

/// Position of a difficulty label in the ordered level list.
pub fn difficulty_rank(label: &str) -> usize {
    DIFFICULTY_LEVELS
        .iter()
        .position(|(name, _)| *name == label)
        .unwrap_or(UNKNOWN_DIFFICULTY_RANK)
}

fn sort_key(row: &ProblemRow, column: SortColumn) -> SortKey<'_> {
    let stat = |pick: fn(&ProblemStats) -> f64| row.stats.as_ref().map(pick).unwrap_or(0.0);

    match column {
        SortColumn::Title => SortKey::Text(&row.title),
        SortColumn::Difficulty => SortKey::Number(difficulty_rank(&row.difficulty) as f64),
        SortColumn::Count => SortKey::Number(stat(|s| s.count as f64)),
        SortColumn::Thinking => SortKey::Number(stat(|s| s.thinking.mean)),
        SortColumn::Implementing => SortKey::Number(stat(|s| s.implementing.mean)),
        SortColumn::Overall => SortKey::Number(stat(|s| s.overall.mean)),
        SortColumn::Quality => SortKey::Number(stat(|s| s.quality.mean)),
    }
}

/// Stable sort of the table rows. Rows with equal keys keep their relative
/// order in both directions; problems without stats sort as 0.
pub fn sort_rows(rows: &mut [ProblemRow], preference: SortPreference) {
    let Some(column) = preference.column else {
        rows.sort_by(|a, b| a.title.cmp(&b.title));
        return;
    };

    rows.sort_by(|a, b| {
        let ord = sort_key(a, column).compare(&sort_key(b, column));
        if preference.ascending {
            ord
        } else {
            ord.reverse()
        }
    });
}
