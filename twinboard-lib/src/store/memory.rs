//! In-memory machine store using DashMap

use async_trait::async_trait;
use chrono::SubsecRound;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::Cursor;
use super::MachineStore;
use super::PageDirection;
use super::PageRequest;
use crate::error::StoreError;
use crate::model::Machine;
use crate::model::MachinePage;
use crate::model::MachinePatch;
use crate::model::NewMachine;

/// A machine store backed by a concurrent hash map.
///
/// Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryMachineStore {
    machines: DashMap<Uuid, Machine>,
}

impl MemoryMachineStore {
    pub fn new() -> Self {
        Self {
            machines: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Inserts a fully formed machine, replacing any row with the same id.
    ///
    /// Creation time is cut to microseconds, the precision cursors carry.
    pub fn insert(&self, mut machine: Machine) -> Machine {
        machine.created_at = machine.created_at.trunc_subsecs(6);
        self.machines.insert(machine.id, machine.clone());
        machine
    }

    fn sorted(&self) -> Vec<Machine> {
        let mut machines: Vec<Machine> = self
            .machines
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        machines.sort_by(|a, b| Cursor::of(b).cmp(&Cursor::of(a)));
        machines
    }
}

/// Cuts one page out of machines already in listing order.
fn paginate(sorted: Vec<Machine>, request: &PageRequest) -> MachinePage {
    let limit = request.limit.max(1);
    let keys: Vec<Cursor> = sorted.iter().map(Cursor::of).collect();

    let range = match (request.direction, request.cursor) {
        (PageDirection::Forward, None) => 0..limit.min(sorted.len()),
        (PageDirection::Forward, Some(cursor)) => {
            let start = keys.partition_point(|key| *key >= cursor);
            start..(start + limit).min(sorted.len())
        }
        (PageDirection::Backward, None) => sorted.len().saturating_sub(limit)..sorted.len(),
        (PageDirection::Backward, Some(cursor)) => {
            let end = keys.partition_point(|key| *key > cursor);
            end.saturating_sub(limit)..end
        }
    };

    let has_previous = range.start > 0 && !range.is_empty();
    let has_next = range.end < sorted.len() && !range.is_empty();
    let machines: Vec<Machine> = sorted
        .into_iter()
        .skip(range.start)
        .take(range.len())
        .collect();

    MachinePage {
        previous_cursor: machines
            .first()
            .filter(|_| has_previous)
            .map(|m| Cursor::of(m).encode()),
        next_cursor: machines
            .last()
            .filter(|_| has_next)
            .map(|m| Cursor::of(m).encode()),
        machines,
    }
}

#[async_trait]
impl MachineStore for MemoryMachineStore {
    async fn list(&self) -> Result<Vec<Machine>, StoreError> {
        Ok(self.sorted())
    }

    async fn list_page(&self, request: PageRequest) -> Result<MachinePage, StoreError> {
        Ok(paginate(self.sorted(), &request))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Machine>, StoreError> {
        Ok(self.machines.get(&id).map(|entry| entry.value().clone()))
    }

    async fn create(&self, machine: NewMachine) -> Result<Machine, StoreError> {
        let mut machine = machine.into_machine(Uuid::new_v4());
        machine.updated_at = machine.created_at.trunc_subsecs(6);
        Ok(self.insert(machine))
    }

    async fn update(&self, id: Uuid, patch: MachinePatch) -> Result<Option<Machine>, StoreError> {
        if patch.is_empty() {
            return Err(StoreError::EmptyPatch);
        }
        let Some(mut entry) = self.machines.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply_to(entry.value_mut(), Utc::now());
        Ok(Some(entry.value().clone()))
    }
}
