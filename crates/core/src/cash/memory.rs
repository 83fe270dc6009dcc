//! In-process store and directory.
//!
//! Used by tests and by embedders that do not need durability. A single mutex
//! is held across every check-and-write, which gives the same serialization
//! the Postgres store gets from row locks.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use cashbook_shared::types::{BranchId, CashDayId, CashMovementId, CategoryId};

use super::error::CashError;
use super::store::{CashLedgerStore, CategoryDirectory, DayUpdate, DirectoryError};
use super::types::{CashDay, CashMovement, DayAuditEntry, DayChange, VoidStamp};

#[derive(Debug, Default)]
struct LedgerState {
    days: HashMap<CashDayId, CashDay>,
    day_keys: HashMap<(BranchId, NaiveDate), CashDayId>,
    movements: HashMap<CashDayId, Vec<CashMovement>>,
    movement_days: HashMap<CashMovementId, CashDayId>,
    audit: HashMap<CashDayId, Vec<DayAuditEntry>>,
}

impl LedgerState {
    fn day(&self, day_id: CashDayId) -> Result<&CashDay, CashError> {
        self.days.get(&day_id).ok_or(CashError::DayNotFound(day_id))
    }

    fn movements_of(&self, day_id: CashDayId) -> &[CashMovement] {
        self.movements.get(&day_id).map_or(&[], Vec::as_slice)
    }
}

/// Mutex-backed [`CashLedgerStore`].
#[derive(Debug, Default)]
pub struct InMemoryCashStore {
    state: Mutex<LedgerState>,
}

impl InMemoryCashStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>, CashError> {
        self.state
            .lock()
            .map_err(|_| CashError::Internal("ledger state lock poisoned".to_string()))
    }
}

impl CashLedgerStore for InMemoryCashStore {
    async fn get_or_create_day(
        &self,
        candidate: CashDay,
        opened: DayAuditEntry,
    ) -> Result<(CashDay, bool), CashError> {
        let mut state = self.lock()?;
        let key = (candidate.branch_id, candidate.date_key);
        if let Some(existing) = state.day_keys.get(&key) {
            let day = state.day(*existing)?.clone();
            return Ok((day, false));
        }
        state.day_keys.insert(key, candidate.id);
        state.audit.entry(candidate.id).or_default().push(opened);
        state.days.insert(candidate.id, candidate.clone());
        Ok((candidate, true))
    }

    async fn find_day(&self, day_id: CashDayId) -> Result<Option<CashDay>, CashError> {
        Ok(self.lock()?.days.get(&day_id).cloned())
    }

    async fn find_day_by_date(
        &self,
        branch_id: BranchId,
        date_key: NaiveDate,
    ) -> Result<Option<CashDay>, CashError> {
        let state = self.lock()?;
        Ok(state
            .day_keys
            .get(&(branch_id, date_key))
            .and_then(|id| state.days.get(id))
            .cloned())
    }

    async fn list_days(
        &self,
        branch_id: BranchId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CashDay>, CashError> {
        let state = self.lock()?;
        let mut days: Vec<CashDay> = state
            .days
            .values()
            .filter(|d| d.branch_id == branch_id && d.date_key >= from && d.date_key <= to)
            .cloned()
            .collect();
        days.sort_by_key(|d| d.date_key);
        Ok(days)
    }

    async fn list_movements(&self, day_id: CashDayId) -> Result<Vec<CashMovement>, CashError> {
        Ok(self.lock()?.movements_of(day_id).to_vec())
    }

    async fn find_movement(
        &self,
        movement_id: CashMovementId,
    ) -> Result<Option<CashMovement>, CashError> {
        let state = self.lock()?;
        Ok(state.movement_days.get(&movement_id).and_then(|day_id| {
            state
                .movements_of(*day_id)
                .iter()
                .find(|m| m.id == movement_id)
                .cloned()
        }))
    }

    async fn list_audit(&self, day_id: CashDayId) -> Result<Vec<DayAuditEntry>, CashError> {
        Ok(self
            .lock()?
            .audit
            .get(&day_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_day<F>(&self, day_id: CashDayId, plan: F) -> Result<DayUpdate, CashError>
    where
        F: FnOnce(&CashDay, &[CashMovement]) -> Result<DayChange, CashError> + Send,
    {
        let mut state = self.lock()?;
        let mut day = state.day(day_id)?.clone();
        let movements = state.movements_of(day_id).to_vec();

        let change = plan(&day, &movements)?;
        let changed = change != DayChange::Unchanged;
        if changed {
            day.apply(&change);
            if let Some(audit) = change.audit_entry() {
                state.audit.entry(day_id).or_default().push(audit.clone());
            }
            state.days.insert(day_id, day.clone());
        }

        Ok(DayUpdate {
            day,
            movements,
            changed,
        })
    }

    async fn append_movement<F>(
        &self,
        day_id: CashDayId,
        build: F,
    ) -> Result<CashMovement, CashError>
    where
        F: FnOnce(&CashDay) -> Result<CashMovement, CashError> + Send,
    {
        let mut state = self.lock()?;
        let movement = build(state.day(day_id)?)?;
        state.movement_days.insert(movement.id, day_id);
        state
            .movements
            .entry(day_id)
            .or_default()
            .push(movement.clone());
        Ok(movement)
    }

    async fn void_movement<F>(
        &self,
        movement_id: CashMovementId,
        plan: F,
    ) -> Result<CashMovement, CashError>
    where
        F: FnOnce(&CashDay, &CashMovement) -> Result<VoidStamp, CashError> + Send,
    {
        let mut state = self.lock()?;
        let day_id = *state
            .movement_days
            .get(&movement_id)
            .ok_or(CashError::MovementNotFound(movement_id))?;
        let day = state.day(day_id)?.clone();

        let movement = state
            .movements
            .get_mut(&day_id)
            .and_then(|list| list.iter_mut().find(|m| m.id == movement_id))
            .ok_or(CashError::MovementNotFound(movement_id))?;
        let stamp = plan(&day, &*movement)?;
        movement.void = Some(stamp);
        Ok(movement.clone())
    }
}

/// Map-backed [`CategoryDirectory`].
#[derive(Debug, Default)]
pub struct InMemoryCategoryDirectory {
    names: Mutex<HashMap<(BranchId, CategoryId), String>>,
}

impl InMemoryCategoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a category name for a branch.
    pub fn insert(&self, branch_id: BranchId, category_id: CategoryId, name: impl Into<String>) {
        if let Ok(mut names) = self.names.lock() {
            names.insert((branch_id, category_id), name.into());
        }
    }
}

impl CategoryDirectory for InMemoryCategoryDirectory {
    async fn resolve_category_name(
        &self,
        branch_id: BranchId,
        category_id: CategoryId,
    ) -> Result<Option<String>, DirectoryError> {
        let names = self
            .names
            .lock()
            .map_err(|_| DirectoryError::Unavailable("directory lock poisoned".to_string()))?;
        Ok(names.get(&(branch_id, category_id)).cloned())
    }
}
