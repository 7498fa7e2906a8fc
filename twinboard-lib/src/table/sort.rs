//! Multi-key sorting of the current page.

use std::cmp::Ordering;

use super::value::CellValue;
use super::value::TableRow;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// The two buttons of a column's sort menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortAction {
    /// Sorts ascending, or flips to descending if already ascending.
    Ascending,
    /// Sorts descending, or flips to ascending if already descending.
    Descending,
}

impl SortAction {
    /// Direction the column ends up in when the action is applied.
    pub fn resolve(self, current: Option<Direction>) -> Direction {
        match (self, current) {
            (Self::Ascending, Some(Direction::Asc)) => Direction::Desc,
            (Self::Ascending, _) => Direction::Asc,
            (Self::Descending, Some(Direction::Desc)) => Direction::Asc,
            (Self::Descending, _) => Direction::Desc,
        }
    }
}

/// Ordered sort keys; the first key is primary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<(String, Direction)>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asc(column_id: impl Into<String>) -> Self {
        Self {
            keys: vec![(column_id.into(), Direction::Asc)],
        }
    }

    pub fn desc(column_id: impl Into<String>) -> Self {
        Self {
            keys: vec![(column_id.into(), Direction::Desc)],
        }
    }

    /// Adds a tie-breaking ascending key.
    pub fn then_asc(mut self, column_id: impl Into<String>) -> Self {
        self.set(&column_id.into(), Direction::Asc, true);
        self
    }

    /// Adds a tie-breaking descending key.
    pub fn then_desc(mut self, column_id: impl Into<String>) -> Self {
        self.set(&column_id.into(), Direction::Desc, true);
        self
    }

    /// Sorts by a column.
    ///
    /// With `multi` the column keeps (or takes) its place among the existing
    /// keys; otherwise it replaces them.
    pub fn set(&mut self, column_id: &str, direction: Direction, multi: bool) {
        if !multi {
            self.keys.clear();
        }
        match self.keys.iter_mut().find(|(id, _)| id == column_id) {
            Some((_, current)) => *current = direction,
            None => self.keys.push((column_id.to_string(), direction)),
        }
    }

    /// Applies a sort-menu action and returns the resulting direction.
    pub fn apply_action(&mut self, column_id: &str, action: SortAction, multi: bool) -> Direction {
        let direction = action.resolve(self.direction_of(column_id));
        self.set(column_id, direction, multi);
        direction
    }

    pub fn remove(&mut self, column_id: &str) -> bool {
        let before = self.keys.len();
        self.keys.retain(|(id, _)| id != column_id);
        self.keys.len() != before
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn direction_of(&self, column_id: &str) -> Option<Direction> {
        self.keys
            .iter()
            .find(|(id, _)| id == column_id)
            .map(|(_, direction)| *direction)
    }

    pub fn keys(&self) -> &[(String, Direction)] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Compares two rows key by key.
    pub fn compare<R: TableRow>(&self, a: &R, b: &R) -> Ordering {
        for (column_id, direction) in &self.keys {
            let ordering = compare_cells(&a.cell(column_id), &b.cell(column_id));
            let ordering = match direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Stable-sorts row indices; equal rows keep their input order.
    pub fn apply<R: TableRow>(&self, rows: &[R], indices: &mut [usize]) {
        if self.keys.is_empty() {
            return;
        }
        indices.sort_by(|&a, &b| self.compare(&rows[a], &rows[b]));
    }
}

/// Ascending order of two cells; blank cells sort after everything else.
pub fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x.total_cmp(y),
        (CellValue::Timestamp(x), CellValue::Timestamp(y)) => x.cmp(y),
        _ => natural_cmp(&a.display(), &b.display()),
    }
}

/// Alphanumeric ordering: digit runs compare by value, text case-insensitively.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let x_run = take_digits(&mut left);
                let y_run = take_digits(&mut right);
                let x_trim = x_run.trim_start_matches('0');
                let y_trim = y_run.trim_start_matches('0');
                let ordering = x_trim
                    .len()
                    .cmp(&y_trim.len())
                    .then_with(|| x_trim.cmp(y_trim));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                let ordering = x.to_lowercase().cmp(y.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        run.push(c);
        chars.next();
    }
    run
}
