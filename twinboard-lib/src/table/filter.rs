//! Column filters and the select-filter toggle rule.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use super::column::ColumnDef;
use super::column::FilterKind;
use super::sort::Direction;
use super::value::CellValue;
use super::value::TableRow;
use super::value::UNDEFINED;

/// Meta-option that selects or deselects every value at once.
pub const ALL: &str = "ALL";

/// Cap on the number of distinct values offered by a select filter.
pub const MAX_SELECT_OPTIONS: usize = 5000;

/// The filter applied to one column.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Case-insensitive substring.
    Text(String),
    /// Inclusive bounds; a missing bound is open.
    Range { min: Option<f64>, max: Option<f64> },
    /// Accepted literal values. Empty means no filter.
    Select(BTreeSet<String>),
}

impl FilterValue {
    /// Returns `false` when the filter would accept every row.
    pub fn is_active(&self) -> bool {
        match self {
            Self::Text(needle) => !needle.is_empty(),
            Self::Range { min, max } => min.is_some() || max.is_some(),
            Self::Select(values) => !values.is_empty(),
        }
    }

    /// Checks one cell against this filter.
    pub fn matches(&self, cell: &CellValue) -> bool {
        match self {
            Self::Text(needle) if needle.is_empty() => true,
            Self::Text(needle) => {
                !cell.is_empty() && cell.display().to_lowercase().contains(&needle.to_lowercase())
            }
            Self::Range { min: None, max: None } => true,
            Self::Range { min, max } => match cell.as_number() {
                Some(n) => min.is_none_or(|min| n >= min) && max.is_none_or(|max| n <= max),
                None => false,
            },
            Self::Select(values) if values.is_empty() => true,
            Self::Select(values) => values.contains(&cell.filter_key()),
        }
    }
}

/// Active filters keyed by column id.
///
/// Inactive filters are never stored, so a column with an empty select set is
/// indistinguishable from an unfiltered column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    filters: BTreeMap<String, FilterValue>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or clears a column's filter. Returns `true` if the state changed.
    pub fn set(&mut self, column_id: &str, value: FilterValue) -> bool {
        if value.is_active() {
            self.filters.insert(column_id.to_string(), value.clone()) != Some(value)
        } else {
            self.filters.remove(column_id).is_some()
        }
    }

    pub fn get(&self, column_id: &str) -> Option<&FilterValue> {
        self.filters.get(column_id)
    }

    pub fn clear(&mut self, column_id: &str) -> bool {
        self.filters.remove(column_id).is_some()
    }

    pub fn clear_all(&mut self) {
        self.filters.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn is_filtered(&self, column_id: &str) -> bool {
        self.filters.contains_key(column_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.filters.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The accepted set of a select filter; empty when none is set.
    pub fn select_values(&self, column_id: &str) -> BTreeSet<String> {
        match self.filters.get(column_id) {
            Some(FilterValue::Select(values)) => values.clone(),
            _ => BTreeSet::new(),
        }
    }

    /// AND across columns.
    pub fn matches<R: TableRow>(&self, row: &R) -> bool {
        self.filters
            .iter()
            .all(|(column_id, filter)| filter.matches(&row.cell(column_id)))
    }
}

/// Computes the new accepted set after a checkbox toggle.
///
/// Checking [`ALL`] clears the filter. Unchecking [`ALL`] accepts exactly
/// `all_values`, which hides rows whose value is not enumerated there. That
/// transition does not round-trip: checking [`ALL`] afterwards clears the
/// filter instead of restoring the previous set.
pub fn toggle_select(
    current: &BTreeSet<String>,
    value: &str,
    checked: bool,
    all_values: &[String],
) -> BTreeSet<String> {
    match (value, checked) {
        (ALL, true) => BTreeSet::new(),
        (ALL, false) => all_values.iter().cloned().collect(),
        (_, true) => {
            let mut next = current.clone();
            next.insert(value.to_string());
            next
        }
        (_, false) => {
            let mut next = current.clone();
            next.remove(value);
            next
        }
    }
}

/// Distinct non-empty values of a column, sorted and capped.
pub fn distinct_values<R: TableRow>(column_id: &str, rows: &[R]) -> Vec<String> {
    let values: BTreeSet<String> = rows
        .iter()
        .map(|row| row.cell(column_id))
        .filter(|cell| !cell.is_empty())
        .map(|cell| cell.display())
        .collect();
    values.into_iter().take(MAX_SELECT_OPTIONS).collect()
}

/// The full known-value set of a column: the override list when present,
/// else the distinct page values, always followed by [`UNDEFINED`].
pub fn select_options<R: TableRow>(column: &ColumnDef, rows: &[R]) -> Vec<String> {
    let mut options = match &column.filter {
        Some(FilterKind::Select {
            options: Some(options),
        }) => options.clone(),
        Some(FilterKind::Range) => Vec::new(),
        _ => distinct_values(&column.id, rows),
    };
    options.push(UNDEFINED.to_string());
    options
}

// =============================================================================
// Filter Menu
// =============================================================================

/// One checkbox of a filter menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    /// Value passed back to the toggle rule.
    pub value: String,
    pub checked: bool,
}

/// Snapshot of a column's filter popover.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterMenu {
    pub column: String,
    pub label: String,
    pub kind: Option<FilterKind>,
    /// Current sort direction of the column.
    pub sort: Option<Direction>,
    /// Checklist entries; empty unless the column has a select filter.
    pub entries: Vec<MenuEntry>,
}

impl FilterMenu {
    /// Builds the menu for a column from the current page and filter state.
    pub fn build<R: TableRow>(
        column: &ColumnDef,
        rows: &[R],
        filters: &FilterState,
        sort: Option<Direction>,
    ) -> Self {
        let entries = if column.is_select() {
            let accepted = filters.select_values(&column.id);
            let mut entries = vec![
                MenuEntry {
                    label: "(All)".to_string(),
                    value: ALL.to_string(),
                    checked: accepted.is_empty(),
                },
                MenuEntry {
                    label: "(Blank)".to_string(),
                    value: UNDEFINED.to_string(),
                    checked: accepted.contains(UNDEFINED),
                },
            ];
            let mut options = select_options(column, rows);
            options.pop();
            entries.extend(options.into_iter().map(|option| MenuEntry {
                label: option.clone(),
                checked: accepted.contains(&option),
                value: option,
            }));
            entries
        } else {
            Vec::new()
        };

        Self {
            column: column.id.clone(),
            label: column.label.clone(),
            kind: column.filter.clone(),
            sort,
            entries,
        }
    }

    pub fn supports_filtering(&self) -> bool {
        !self.entries.is_empty()
    }
}
