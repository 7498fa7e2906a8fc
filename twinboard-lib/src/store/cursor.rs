//! Keyset cursors for machine listing.

use std::cmp::Ordering;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::Machine;

/// Default number of machines per page.
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Position of a machine in listing order.
///
/// Listing order is descending, so a *greater* cursor sorts *earlier*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn of(machine: &Machine) -> Self {
        Self {
            created_at: machine.created_at,
            id: machine.id,
        }
    }

    /// Encodes the cursor as an opaque URL-safe token.
    pub fn encode(&self) -> String {
        let raw = format!("{}|{}", timestamp_key(&self.created_at), self.id);
        URL_SAFE_NO_PAD.encode(raw)
    }

    /// Decodes a token produced by [`Cursor::encode`].
    pub fn decode(token: &str) -> Result<Self, StoreError> {
        let invalid = || StoreError::InvalidCursor(token.to_string());
        let bytes = URL_SAFE_NO_PAD.decode(token).map_err(|_| invalid())?;
        let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
        let (timestamp, id) = raw.split_once('|').ok_or_else(invalid)?;
        let created_at = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|_| invalid())?
            .with_timezone(&Utc);
        let id = Uuid::parse_str(id).map_err(|_| invalid())?;
        Ok(Self { created_at, id })
    }
}

impl PartialOrd for Cursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cursor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Fixed-width timestamp text; sorts lexically in time order.
pub(crate) fn timestamp_key(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Which neighbour of the cursor to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageDirection {
    /// Rows after the cursor (older machines).
    #[default]
    Forward,
    /// Rows before the cursor (newer machines).
    Backward,
}

impl PageDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
        }
    }
}

/// A request for one page of machines.
///
/// Without a cursor, `Forward` starts at the newest machine and `Backward`
/// returns the oldest page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub cursor: Option<Cursor>,
    pub direction: PageDirection,
}

impl PageRequest {
    /// First page with the given size.
    pub fn first(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            cursor: None,
            direction: PageDirection::Forward,
        }
    }

    /// Page following `cursor`.
    pub fn after(limit: usize, cursor: Cursor) -> Self {
        Self {
            limit: limit.max(1),
            cursor: Some(cursor),
            direction: PageDirection::Forward,
        }
    }

    /// Page preceding `cursor`.
    pub fn before(limit: usize, cursor: Cursor) -> Self {
        Self {
            limit: limit.max(1),
            cursor: Some(cursor),
            direction: PageDirection::Backward,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_token_round_trip() {
        let cursor = Cursor {
            created_at: Utc::now(),
            id: Uuid::new_v4(),
        };
        let decoded = Cursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded.id, cursor.id);
        assert_eq!(
            timestamp_key(&decoded.created_at),
            timestamp_key(&cursor.created_at)
        );
    }

    #[test]
    fn test_cursor_rejects_garbage() {
        assert!(matches!(
            Cursor::decode("not-a-cursor"),
            Err(StoreError::InvalidCursor(_))
        ));
    }

    #[test]
    fn test_timestamp_key_is_fixed_width() {
        let a = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let b = DateTime::parse_from_rfc3339("2024-01-01T00:00:00.5Z").unwrap().with_timezone(&Utc);
        assert_eq!(timestamp_key(&a).len(), timestamp_key(&b).len());
        assert!(timestamp_key(&a) < timestamp_key(&b));
    }

    #[test]
    fn test_page_request_limit_is_at_least_one() {
        assert_eq!(PageRequest::first(0).limit, 1);
    }
}
