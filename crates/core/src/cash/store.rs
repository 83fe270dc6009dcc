//! Storage and collaborator seams.
//!
//! The db crate implements these against Postgres; [`super::memory`] provides
//! an in-process implementation. Every mutating method receives a planner
//! closure that the implementation must run against the freshly locked rows,
//! so validation and write happen in one atomic step.

use chrono::NaiveDate;
use std::future::Future;
use thiserror::Error;

use cashbook_shared::types::{BranchId, CashDayId, CashMovementId, CategoryId};

use super::error::CashError;
use super::types::{CashDay, CashMovement, DayAuditEntry, DayChange, VoidStamp};

/// Result of a locked day update.
#[derive(Debug, Clone)]
pub struct DayUpdate {
    /// The day after the change was applied.
    pub day: CashDay,
    /// Movements of the day as seen under the lock.
    pub movements: Vec<CashMovement>,
    /// False when the planner returned [`DayChange::Unchanged`].
    pub changed: bool,
}

/// Durable storage for cash days, movements and their audit trail.
pub trait CashLedgerStore: Send + Sync {
    /// Inserts `candidate` unless a day already exists for its branch and
    /// date, then returns the stored day and whether it was inserted.
    ///
    /// `opened` is persisted with the row only when the insert wins.
    /// Must be race-free: concurrent callers all receive the same row.
    fn get_or_create_day(
        &self,
        candidate: CashDay,
        opened: DayAuditEntry,
    ) -> impl Future<Output = Result<(CashDay, bool), CashError>> + Send;

    /// Find a day by id.
    fn find_day(
        &self,
        day_id: CashDayId,
    ) -> impl Future<Output = Result<Option<CashDay>, CashError>> + Send;

    /// Find a day by branch and calendar date.
    fn find_day_by_date(
        &self,
        branch_id: BranchId,
        date_key: NaiveDate,
    ) -> impl Future<Output = Result<Option<CashDay>, CashError>> + Send;

    /// Days of a branch within an inclusive date range, ordered by date.
    fn list_days(
        &self,
        branch_id: BranchId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = Result<Vec<CashDay>, CashError>> + Send;

    /// All movements of a day (voided included) in creation order.
    fn list_movements(
        &self,
        day_id: CashDayId,
    ) -> impl Future<Output = Result<Vec<CashMovement>, CashError>> + Send;

    /// Find a movement by id.
    fn find_movement(
        &self,
        movement_id: CashMovementId,
    ) -> impl Future<Output = Result<Option<CashMovement>, CashError>> + Send;

    /// Audit trail of a day in creation order.
    fn list_audit(
        &self,
        day_id: CashDayId,
    ) -> impl Future<Output = Result<Vec<DayAuditEntry>, CashError>> + Send;

    /// Locks the day exclusively, runs `plan` against it and its movements,
    /// then writes the resulting change and its audit entry atomically.
    fn update_day<F>(
        &self,
        day_id: CashDayId,
        plan: F,
    ) -> impl Future<Output = Result<DayUpdate, CashError>> + Send
    where
        F: FnOnce(&CashDay, &[CashMovement]) -> Result<DayChange, CashError> + Send;

    /// Locks the day against closing, runs `build` and appends the movement.
    fn append_movement<F>(
        &self,
        day_id: CashDayId,
        build: F,
    ) -> impl Future<Output = Result<CashMovement, CashError>> + Send
    where
        F: FnOnce(&CashDay) -> Result<CashMovement, CashError> + Send;

    /// Locks the owning day against closing and the movement exclusively,
    /// runs `plan` and stores the void stamp.
    fn void_movement<F>(
        &self,
        movement_id: CashMovementId,
        plan: F,
    ) -> impl Future<Output = Result<CashMovement, CashError>> + Send
    where
        F: FnOnce(&CashDay, &CashMovement) -> Result<VoidStamp, CashError> + Send;
}

/// Failure of the external category directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The directory could not be reached or queried.
    #[error("Category directory unavailable: {0}")]
    Unavailable(String),
}

/// Read-only lookup of category display names.
pub trait CategoryDirectory: Send + Sync {
    /// Resolves a category to its display name within a branch.
    fn resolve_category_name(
        &self,
        branch_id: BranchId,
        category_id: CategoryId,
    ) -> impl Future<Output = Result<Option<String>, DirectoryError>> + Send;
}
