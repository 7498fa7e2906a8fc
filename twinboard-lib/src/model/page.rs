//! Cursor-paginated result pages.

use serde::Deserialize;
use serde::Serialize;

use super::Machine;

/// One page of machines plus the opaque cursors to its neighbours.
///
/// `next_cursor` is present exactly when rows exist after this page and
/// `previous_cursor` exactly when rows exist before it. Row count is never a
/// reliable end-of-data signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachinePage<T = Machine> {
    pub machines: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub previous_cursor: Option<String>,
}

impl<T> MachinePage<T> {
    /// Converts the rows while keeping the cursors.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> MachinePage<U> {
        MachinePage {
            machines: self.machines.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            previous_cursor: self.previous_cursor,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous_cursor.is_some()
    }
}
