//! SQLite-backed machine store.

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::ClientBuilder;
use async_sqlite::JournalMode;
use async_sqlite::rusqlite;
use async_trait::async_trait;
use chrono::DateTime;
use chrono::SubsecRound;
use chrono::Utc;
use uuid::Uuid;

use super::Cursor;
use super::MachineStore;
use super::PageDirection;
use super::PageRequest;
use super::cursor::timestamp_key;
use crate::error::StoreError;
use crate::model::Machine;
use crate::model::MachinePage;
use crate::model::MachinePatch;
use crate::model::NewMachine;

const COLUMNS: &str =
    "id, name, status, accuracy, created_at, updated_at, file_paths, metadata";

/// Machine store persisted in a SQLite database.
///
/// `file_paths` and `metadata` are stored as JSON text. Timestamps are
/// stored as fixed-width RFC 3339 strings so they order lexically.
///
/// # Example
///
/// ```ignore
/// use twinboard_lib::store::SqliteMachineStore;
///
/// let store = SqliteMachineStore::open("machines.db").await?;
/// let machines = store.list().await?;
/// ```
pub struct SqliteMachineStore {
    client: Client,
}

impl SqliteMachineStore {
    /// Opens the store at `path`, creating the database and table if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let client = ClientBuilder::new()
            .path(path)
            .journal_mode(JournalMode::Wal)
            .open()
            .await?;

        Self::init_schema(&client).await?;

        Ok(Self { client })
    }

    /// Opens a throwaway in-memory store.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let client = ClientBuilder::new().path(":memory:").open().await?;

        Self::init_schema(&client).await?;

        Ok(Self { client })
    }

    async fn init_schema(client: &Client) -> Result<(), StoreError> {
        client
            .conn(|conn| {
                conn.execute(
                    "CREATE TABLE IF NOT EXISTS machines (
                        id TEXT PRIMARY KEY,
                        name TEXT NOT NULL,
                        status TEXT NOT NULL,
                        accuracy REAL,
                        created_at TEXT NOT NULL,
                        updated_at TEXT NOT NULL,
                        file_paths TEXT NOT NULL,
                        metadata TEXT NOT NULL
                    )",
                    [],
                )?;
                conn.execute(
                    "CREATE INDEX IF NOT EXISTS idx_machines_listing ON machines(created_at, id)",
                    [],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Returns the number of stored machines.
    pub async fn len(&self) -> Result<usize, StoreError> {
        let count = self
            .client
            .conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM machines", [], |row| {
                    row.get::<_, i64>(0)
                })
            })
            .await?;
        Ok(count.max(0) as usize)
    }

    /// Returns `true` if no machines are stored.
    pub async fn is_empty(&self) -> Result<bool, StoreError> {
        self.len().await.map(|len| len == 0)
    }

    async fn exists_beyond(&self, cursor: Cursor, newer: bool) -> Result<bool, StoreError> {
        let sql = if newer {
            "SELECT EXISTS(SELECT 1 FROM machines WHERE (created_at, id) > (?, ?))"
        } else {
            "SELECT EXISTS(SELECT 1 FROM machines WHERE (created_at, id) < (?, ?))"
        };
        let created_at = timestamp_key(&cursor.created_at);
        let id = cursor.id.to_string();
        let exists = self
            .client
            .conn(move |conn| {
                conn.query_row(sql, rusqlite::params![created_at, id], |row| {
                    row.get::<_, bool>(0)
                })
            })
            .await?;
        Ok(exists)
    }
}

/// Raw column values, converted to a [`Machine`] outside the connection thread.
struct MachineRow {
    id: String,
    name: String,
    status: String,
    accuracy: Option<f64>,
    created_at: String,
    updated_at: String,
    file_paths: String,
    metadata: String,
}

impl MachineRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            status: row.get(2)?,
            accuracy: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
            file_paths: row.get(6)?,
            metadata: row.get(7)?,
        })
    }

    fn into_machine(self) -> Result<Machine, StoreError> {
        let id = Uuid::parse_str(&self.id).map_err(|e| StoreError::corrupt(&self.id, e))?;
        let status = self
            .status
            .parse()
            .map_err(|e| StoreError::corrupt(&self.id, e))?;
        Ok(Machine {
            id,
            name: self.name,
            status,
            accuracy: self.accuracy,
            created_at: parse_timestamp(&self.id, &self.created_at)?,
            updated_at: parse_timestamp(&self.id, &self.updated_at)?,
            file_paths: serde_json::from_str(&self.file_paths)?,
            metadata: serde_json::from_str(&self.metadata)?,
        })
    }
}

fn parse_timestamp(id: &str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| StoreError::corrupt(id, e))
}

fn into_machines(rows: Vec<MachineRow>) -> Result<Vec<Machine>, StoreError> {
    rows.into_iter().map(MachineRow::into_machine).collect()
}

#[async_trait]
impl MachineStore for SqliteMachineStore {
    async fn list(&self) -> Result<Vec<Machine>, StoreError> {
        let rows = self
            .client
            .conn(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM machines ORDER BY created_at DESC, id DESC"
                ))?;
                let rows = stmt.query_map([], MachineRow::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await?;
        into_machines(rows)
    }

    async fn list_page(&self, request: PageRequest) -> Result<MachinePage, StoreError> {
        let limit = request.limit.max(1) as i64;
        let cursor = request
            .cursor
            .map(|c| (timestamp_key(&c.created_at), c.id.to_string()));
        let direction = request.direction;

        let rows = self
            .client
            .conn(move |conn| {
                let (filter, order) = match direction {
                    PageDirection::Forward => ("(created_at, id) < (?1, ?2)", "DESC"),
                    PageDirection::Backward => ("(created_at, id) > (?1, ?2)", "ASC"),
                };
                match cursor {
                    Some((created_at, id)) => {
                        let sql = format!(
                            "SELECT {COLUMNS} FROM machines WHERE {filter} \
                             ORDER BY created_at {order}, id {order} LIMIT ?3"
                        );
                        let mut stmt = conn.prepare(&sql)?;
                        let rows = stmt.query_map(
                            rusqlite::params![created_at, id, limit],
                            MachineRow::from_row,
                        )?;
                        rows.collect::<Result<Vec<_>, _>>()
                    }
                    None => {
                        let sql = format!(
                            "SELECT {COLUMNS} FROM machines \
                             ORDER BY created_at {order}, id {order} LIMIT ?1"
                        );
                        let mut stmt = conn.prepare(&sql)?;
                        let rows = stmt.query_map([limit], MachineRow::from_row)?;
                        rows.collect::<Result<Vec<_>, _>>()
                    }
                }
            })
            .await?;

        let mut machines = into_machines(rows)?;
        if direction == PageDirection::Backward {
            machines.reverse();
        }

        let mut page = MachinePage {
            machines,
            next_cursor: None,
            previous_cursor: None,
        };
        if let (Some(first), Some(last)) = (page.machines.first(), page.machines.last()) {
            let first = Cursor::of(first);
            let last = Cursor::of(last);
            if self.exists_beyond(first, true).await? {
                page.previous_cursor = Some(first.encode());
            }
            if self.exists_beyond(last, false).await? {
                page.next_cursor = Some(last.encode());
            }
        }
        Ok(page)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Machine>, StoreError> {
        let id = id.to_string();
        let row = self
            .client
            .conn(move |conn| {
                let mut stmt =
                    conn.prepare(&format!("SELECT {COLUMNS} FROM machines WHERE id = ?"))?;
                let mut rows = stmt.query([&id])?;
                match rows.next()? {
                    Some(row) => Ok(Some(MachineRow::from_row(row)?)),
                    None => Ok(None),
                }
            })
            .await?;
        row.map(MachineRow::into_machine).transpose()
    }

    async fn create(&self, machine: NewMachine) -> Result<Machine, StoreError> {
        let mut machine = machine.into_machine(Uuid::new_v4());
        machine.created_at = machine.created_at.trunc_subsecs(6);
        machine.updated_at = machine.created_at;
        let id = machine.id.to_string();
        let name = machine.name.clone();
        let status = machine.status.as_str();
        let accuracy = machine.accuracy;
        let created_at = timestamp_key(&machine.created_at);
        let updated_at = timestamp_key(&machine.updated_at);
        let file_paths = serde_json::to_string(&machine.file_paths)?;
        let metadata = serde_json::to_string(&machine.metadata)?;

        self.client
            .conn(move |conn| {
                conn.execute(
                    &format!("INSERT INTO machines ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"),
                    rusqlite::params![
                        id, name, status, accuracy, created_at, updated_at, file_paths, metadata
                    ],
                )
            })
            .await?;

        log::debug!("Created machine {} ({})", machine.id, machine.name);
        Ok(machine)
    }

    async fn update(&self, id: Uuid, patch: MachinePatch) -> Result<Option<Machine>, StoreError> {
        if patch.is_empty() {
            return Err(StoreError::EmptyPatch);
        }

        let mut assignments = Vec::new();
        let mut values: Vec<rusqlite::types::Value> = Vec::new();
        if let Some(status) = patch.status {
            assignments.push("status = ?");
            values.push(status.as_str().to_string().into());
        }
        if let Some(accuracy) = patch.accuracy {
            assignments.push("accuracy = ?");
            values.push(accuracy.into());
        }
        if let Some(file_paths) = &patch.file_paths {
            assignments.push("file_paths = ?");
            values.push(serde_json::to_string(file_paths)?.into());
        }
        if let Some(metadata) = &patch.metadata {
            assignments.push("metadata = ?");
            values.push(serde_json::to_string(metadata)?.into());
        }
        assignments.push("updated_at = ?");
        values.push(timestamp_key(&Utc::now()).into());
        values.push(id.to_string().into());

        let sql = format!(
            "UPDATE machines SET {} WHERE id = ?",
            assignments.join(", ")
        );
        let changed = self
            .client
            .conn(move |conn| conn.execute(&sql, rusqlite::params_from_iter(values)))
            .await?;

        if changed == 0 {
            return Ok(None);
        }
        self.get(id).await
    }
}
