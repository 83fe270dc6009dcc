//! Cash ledger orchestration.
//!
//! [`CashLedgerService`] is the transport-agnostic entry point. It enforces
//! tenant scoping, delegates rule checks to the stateless planners and runs
//! them inside the store's locked write paths.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use cashbook_shared::types::{BranchId, CashDayId, CashMovementId, CategoryId};

use super::access::{AccessGate, Actor};
use super::calendar::business_date;
use super::error::CashError;
use super::lifecycle::DayLifecycle;
use super::movement::MovementRecorder;
use super::store::{CashLedgerStore, CategoryDirectory};
use super::summary::{DayReport, SummaryAggregator};
use super::types::{
    CashDay, CashDayView, CashMovement, CloseDayInput, CreateMovementInput, DayAuditEntry,
    ResolvedMovement,
};

/// Orchestrates the cash ledger over a store and a category directory.
pub struct CashLedgerService<S, D> {
    store: Arc<S>,
    directory: Arc<D>,
    business_tz: Tz,
}

impl<S, D> CashLedgerService<S, D>
where
    S: CashLedgerStore,
    D: CategoryDirectory,
{
    /// Creates a service that resolves "today" in UTC.
    #[must_use]
    pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
        Self {
            store,
            directory,
            business_tz: Tz::UTC,
        }
    }

    /// Sets the time zone used to resolve a branch's business date.
    #[must_use]
    pub fn with_business_timezone(mut self, tz: Tz) -> Self {
        self.business_tz = tz;
        self
    }

    /// Time zone used to resolve the business date.
    #[must_use]
    pub fn business_timezone(&self) -> Tz {
        self.business_tz
    }

    // ========== Days ==========

    /// Returns the day for `date_key`, creating it open with zero opening
    /// cash when absent. Idempotent.
    pub async fn get_or_create_day(
        &self,
        actor: &Actor,
        branch_id: BranchId,
        date_key: NaiveDate,
    ) -> Result<CashDayView, CashError> {
        AccessGate::ensure_branch(actor, branch_id)?;
        let day = self.ensure_day(actor, branch_id, date_key).await?;
        self.view(&day).await
    }

    /// Get-or-create for the current business date.
    pub async fn get_or_create_today(
        &self,
        actor: &Actor,
        branch_id: BranchId,
    ) -> Result<CashDayView, CashError> {
        let date_key = business_date(Utc::now(), self.business_tz);
        self.get_or_create_day(actor, branch_id, date_key).await
    }

    /// Get-or-create followed by setting the opening balance.
    pub async fn open_day(
        &self,
        actor: &Actor,
        branch_id: BranchId,
        date_key: NaiveDate,
        opening_cash: Decimal,
    ) -> Result<CashDayView, CashError> {
        AccessGate::ensure_branch(actor, branch_id)?;
        let day = self.ensure_day(actor, branch_id, date_key).await?;
        self.apply_opening_cash(actor, day.id, opening_cash).await
    }

    /// Overwrites the opening balance of an open day.
    pub async fn set_opening_cash(
        &self,
        actor: &Actor,
        day_id: CashDayId,
        amount: Decimal,
    ) -> Result<CashDayView, CashError> {
        self.authorized_day(actor, day_id).await?;
        self.apply_opening_cash(actor, day_id, amount).await
    }

    /// Day view plus rollups. Never creates a day.
    pub async fn get_summary(
        &self,
        actor: &Actor,
        branch_id: BranchId,
        date_key: NaiveDate,
    ) -> Result<DayReport, CashError> {
        AccessGate::ensure_branch(actor, branch_id)?;
        let day = self.day_by_date(branch_id, date_key).await?;
        let movements = self.store.list_movements(day.id).await?;
        let names = self.resolve_names(branch_id, &movements).await;
        SummaryAggregator::report(&day, &movements, &names)
    }

    /// Closes the day after reconciling the counted cash.
    ///
    /// Retrying a successful close with the same count and override flag
    /// returns the stored closed state unchanged.
    pub async fn close_day(
        &self,
        actor: &Actor,
        branch_id: BranchId,
        date_key: NaiveDate,
        input: CloseDayInput,
    ) -> Result<CashDayView, CashError> {
        AccessGate::authorize_override(actor, input.admin_override)?;
        AccessGate::ensure_branch(actor, branch_id)?;
        let day = self.day_by_date(branch_id, date_key).await?;

        let now = Utc::now();
        let update = self
            .store
            .update_day(day.id, |day, movements| {
                DayLifecycle::plan_close(day, movements, &input, actor, now)
            })
            .await
            .inspect_err(|e| warn!(day_id = %day.id, error = %e, "Close rejected"))?;

        let view = SummaryAggregator::project(&update.day, &update.movements)?;
        if update.changed {
            info!(
                day_id = %view.day.id,
                branch_id = %branch_id,
                date_key = %date_key,
                expected_cash = %view.expected_cash,
                diff_cash = ?view.diff_cash,
                admin_override = input.admin_override,
                "Cash day closed"
            );
        } else {
            debug!(day_id = %view.day.id, "Close repeated on closed day");
        }
        Ok(view)
    }

    /// Days of a branch in an inclusive range, ordered by date.
    pub async fn list_days(
        &self,
        actor: &Actor,
        branch_id: BranchId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CashDayView>, CashError> {
        AccessGate::ensure_branch(actor, branch_id)?;
        if from > to {
            return Err(CashError::InvalidRange { from, to });
        }
        let days = self.store.list_days(branch_id, from, to).await?;
        let mut views = Vec::with_capacity(days.len());
        for day in &days {
            views.push(self.view(day).await?);
        }
        Ok(views)
    }

    /// Appends an administrative note to the day's audit trail.
    pub async fn annotate_day(
        &self,
        actor: &Actor,
        day_id: CashDayId,
        note: Option<String>,
    ) -> Result<DayAuditEntry, CashError> {
        self.authorized_day(actor, day_id).await?;
        let now = Utc::now();
        let mut planned = None;
        self.store
            .update_day(day_id, |day, _| {
                let change = DayLifecycle::plan_annotation(day, note, actor, now)?;
                planned = change.audit_entry().cloned();
                Ok(change)
            })
            .await?;
        let entry = planned.ok_or_else(|| {
            CashError::Internal("annotation produced no audit entry".to_string())
        })?;
        info!(day_id = %day_id, actor_id = %actor.user_id, "Cash day annotated");
        Ok(entry)
    }

    /// Audit trail of a day in creation order.
    pub async fn list_audit(
        &self,
        actor: &Actor,
        day_id: CashDayId,
    ) -> Result<Vec<DayAuditEntry>, CashError> {
        self.authorized_day(actor, day_id).await?;
        self.store.list_audit(day_id).await
    }

    // ========== Movements ==========

    /// All movements of a day, voided included, in creation order.
    pub async fn list_movements(
        &self,
        actor: &Actor,
        day_id: CashDayId,
    ) -> Result<Vec<ResolvedMovement>, CashError> {
        let day = self.authorized_day(actor, day_id).await?;
        let movements = self.store.list_movements(day_id).await?;
        let names = self.resolve_names(day.branch_id, &movements).await;
        Ok(movements
            .into_iter()
            .map(|movement| resolve(movement, &names))
            .collect())
    }

    /// Records a movement on an open day.
    pub async fn create_movement(
        &self,
        actor: &Actor,
        day_id: CashDayId,
        input: CreateMovementInput,
    ) -> Result<ResolvedMovement, CashError> {
        let day = self.authorized_day(actor, day_id).await?;
        let now = Utc::now();
        let created_by = actor.user_id;
        let movement = self
            .store
            .append_movement(day_id, |day| {
                MovementRecorder::prepare(day, input, created_by, now)
            })
            .await
            .inspect_err(|e| warn!(day_id = %day_id, error = %e, "Movement rejected"))?;

        info!(
            day_id = %day_id,
            movement_id = %movement.id,
            movement_type = %movement.movement_type,
            method = %movement.method,
            amount = %movement.amount,
            "Cash movement recorded"
        );
        let names = self.resolve_names(day.branch_id, std::slice::from_ref(&movement)).await;
        Ok(resolve(movement, &names))
    }

    /// Voids a movement. A second void fails with `AlreadyVoided`.
    pub async fn void_movement(
        &self,
        actor: &Actor,
        movement_id: CashMovementId,
        reason: Option<String>,
    ) -> Result<ResolvedMovement, CashError> {
        let existing = self
            .store
            .find_movement(movement_id)
            .await?
            .ok_or(CashError::MovementNotFound(movement_id))?;
        let day = self.authorized_day(actor, existing.cash_day_id).await?;

        let now = Utc::now();
        let voided_by = actor.user_id;
        let movement = self
            .store
            .void_movement(movement_id, |day, movement| {
                MovementRecorder::plan_void(day, movement, reason, voided_by, now)
            })
            .await
            .inspect_err(|e| warn!(movement_id = %movement_id, error = %e, "Void rejected"))?;

        info!(
            day_id = %movement.cash_day_id,
            movement_id = %movement_id,
            "Cash movement voided"
        );
        let names = self.resolve_names(day.branch_id, std::slice::from_ref(&movement)).await;
        Ok(resolve(movement, &names))
    }

    // ========== Helpers ==========

    async fn ensure_day(
        &self,
        actor: &Actor,
        branch_id: BranchId,
        date_key: NaiveDate,
    ) -> Result<CashDay, CashError> {
        let candidate = CashDay::open(branch_id, date_key, actor.user_id, Utc::now());
        let opened = DayLifecycle::opened_entry(&candidate);
        let (day, created) = self.store.get_or_create_day(candidate, opened).await?;
        if created {
            info!(
                day_id = %day.id,
                branch_id = %branch_id,
                date_key = %date_key,
                "Cash day created"
            );
        }
        Ok(day)
    }

    async fn apply_opening_cash(
        &self,
        actor: &Actor,
        day_id: CashDayId,
        amount: Decimal,
    ) -> Result<CashDayView, CashError> {
        let now = Utc::now();
        let update = self
            .store
            .update_day(day_id, |day, _| {
                DayLifecycle::plan_opening_cash(day, amount, actor, now)
            })
            .await?;
        if update.changed {
            info!(day_id = %day_id, opening_cash = %amount, "Opening cash set");
        }
        SummaryAggregator::project(&update.day, &update.movements)
    }

    async fn authorized_day(&self, actor: &Actor, day_id: CashDayId) -> Result<CashDay, CashError> {
        let day = self
            .store
            .find_day(day_id)
            .await?
            .ok_or(CashError::DayNotFound(day_id))?;
        AccessGate::ensure_branch(actor, day.branch_id)?;
        Ok(day)
    }

    async fn day_by_date(
        &self,
        branch_id: BranchId,
        date_key: NaiveDate,
    ) -> Result<CashDay, CashError> {
        self.store
            .find_day_by_date(branch_id, date_key)
            .await?
            .ok_or(CashError::DayNotFoundForDate {
                branch_id,
                date_key,
            })
    }

    async fn view(&self, day: &CashDay) -> Result<CashDayView, CashError> {
        if day.is_open() {
            let movements = self.store.list_movements(day.id).await?;
            SummaryAggregator::project(day, &movements)
        } else {
            SummaryAggregator::project(day, &[])
        }
    }

    /// Looks up display names for every category referenced by `movements`.
    /// Lookup failures are logged and left out, so callers fall back.
    async fn resolve_names(
        &self,
        branch_id: BranchId,
        movements: &[CashMovement],
    ) -> HashMap<CategoryId, String> {
        let ids: BTreeSet<CategoryId> = movements.iter().filter_map(|m| m.category_id).collect();
        let mut names = HashMap::with_capacity(ids.len());
        for category_id in ids {
            match self
                .directory
                .resolve_category_name(branch_id, category_id)
                .await
            {
                Ok(Some(name)) => {
                    names.insert(category_id, name);
                }
                Ok(None) => {
                    debug!(category_id = %category_id, "Category not in directory");
                }
                Err(e) => {
                    warn!(
                        category_id = %category_id,
                        error = %e,
                        "Category lookup failed, using fallback label"
                    );
                }
            }
        }
        names
    }
}

fn resolve(movement: CashMovement, names: &HashMap<CategoryId, String>) -> ResolvedMovement {
    let category_name = movement
        .category_id
        .map(|id| SummaryAggregator::category_label(Some(id), names));
    ResolvedMovement {
        movement,
        category_name,
    }
}
