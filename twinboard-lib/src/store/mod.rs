//! Machine persistence
//!
//! Provides the [`MachineStore`] trait and two implementations: a SQLite
//! store for real deployments and an in-memory store for tests and demos.
//! Stores are handed around explicitly as `Arc<dyn MachineStore>`; there is
//! no process-wide connection pool.

mod cursor;
mod memory;
mod sqlite;

pub use cursor::*;
pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::Machine;
use crate::model::MachinePage;
use crate::model::MachinePatch;
use crate::model::NewMachine;

/// Storage backend for machine rows.
///
/// Listing order is newest first by creation time, with the id as a
/// tie-break so that cursors are total.
#[async_trait]
pub trait MachineStore: Send + Sync {
    /// Returns every machine, newest first.
    async fn list(&self) -> Result<Vec<Machine>, StoreError>;

    /// Returns one page of machines in listing order.
    async fn list_page(&self, request: PageRequest) -> Result<MachinePage, StoreError>;

    /// Retrieves a machine by id.
    async fn get(&self, id: Uuid) -> Result<Option<Machine>, StoreError>;

    /// Inserts a machine and returns the stored row.
    async fn create(&self, machine: NewMachine) -> Result<Machine, StoreError>;

    /// Applies a partial update and bumps `updated_at`.
    ///
    /// Returns `Ok(None)` if no machine has this id and
    /// [`StoreError::EmptyPatch`] if the patch changes nothing.
    async fn update(&self, id: Uuid, patch: MachinePatch) -> Result<Option<Machine>, StoreError>;
}
