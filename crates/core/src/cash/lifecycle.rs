//! Day lifecycle rules: opening balance, closing and annotations.
//!
//! The planners validate a transition against the current day and return the
//! [`DayChange`] the store must write atomically. They never perform I/O, so
//! a store can call them while it holds its lock on the day.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::access::{AccessGate, Actor};
use super::error::{AmountRule, CashError};
use super::summary::SummaryAggregator;
use super::types::{
    normalize_text, AuditAction, CashDay, CashMovement, CloseDayInput, ClosingRecord,
    DayAuditEntry, DayChange,
};

/// Stateless planner for day transitions.
pub struct DayLifecycle;

impl DayLifecycle {
    /// Audit entry written when a day is first created.
    #[must_use]
    pub fn opened_entry(day: &CashDay) -> DayAuditEntry {
        DayAuditEntry::new(
            day.id,
            AuditAction::Opened,
            None,
            None,
            day.opened_by,
            day.opened_at,
        )
    }

    /// Plans an opening balance change.
    ///
    /// Setting the current value again is a no-op.
    ///
    /// # Errors
    /// * `InvalidState` if the day is closed
    /// * `InvalidAmount` if `amount` is negative or does not fit the stored
    ///   precision
    pub fn plan_opening_cash(
        day: &CashDay,
        amount: Decimal,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<DayChange, CashError> {
        if !day.is_open() {
            return Err(CashError::InvalidState {
                operation: "set opening cash",
                status: day.status(),
            });
        }
        let amount = AmountRule::NonNegative.check("opening_cash", amount)?;
        if amount == day.opening_cash {
            return Ok(DayChange::Unchanged);
        }
        Ok(DayChange::SetOpeningCash {
            amount,
            audit: DayAuditEntry::new(
                day.id,
                AuditAction::OpeningCashSet,
                Some(amount),
                None,
                actor.user_id,
                now,
            ),
        })
    }

    /// Plans closing the day against its current movement set.
    ///
    /// The override capability is checked before anything else. A repeat of
    /// a close that already succeeded with the same count and override flag
    /// yields [`DayChange::Unchanged`].
    ///
    /// # Errors
    /// * `Forbidden` if override is requested by a non-administrator
    /// * `InvalidState` if the day was closed with different arguments
    /// * `MissingCount` if there is neither a count nor an override
    /// * `InvalidAmount` if the count is negative or does not fit the stored
    ///   precision
    /// * `Internal` if a cash sum overflows
    pub fn plan_close(
        day: &CashDay,
        movements: &[CashMovement],
        input: &CloseDayInput,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<DayChange, CashError> {
        AccessGate::authorize_override(actor, input.admin_override)?;

        if let Some(closing) = &day.closing {
            if closing.counted_cash == input.counted_cash
                && closing.admin_override == input.admin_override
            {
                return Ok(DayChange::Unchanged);
            }
            return Err(CashError::InvalidState {
                operation: "close",
                status: day.status(),
            });
        }

        let counted_cash = match input.counted_cash {
            None if !input.admin_override => return Err(CashError::MissingCount),
            None => None,
            Some(counted) => Some(AmountRule::NonNegative.check("counted_cash", counted)?),
        };
        let expected_cash = SummaryAggregator::expected_cash(day.opening_cash, movements)?;
        let diff_cash = counted_cash
            .map(|counted| {
                counted
                    .checked_sub(expected_cash)
                    .ok_or_else(|| CashError::Internal("decimal overflow computing diff".into()))
            })
            .transpose()?;

        let note = normalize_text(input.note.clone());
        let closing = ClosingRecord {
            counted_cash,
            expected_cash,
            diff_cash,
            admin_override: input.admin_override,
            note: note.clone(),
            closed_at: now,
            closed_by: actor.user_id,
        };
        let audit = DayAuditEntry::new(
            day.id,
            AuditAction::Closed,
            counted_cash,
            note,
            actor.user_id,
            now,
        );
        Ok(DayChange::Close { closing, audit })
    }

    /// Plans an administrative annotation. Allowed on open and closed days.
    ///
    /// # Errors
    /// * `Forbidden` if the actor is not an administrator
    /// * `MissingNote` if the note is blank
    pub fn plan_annotation(
        day: &CashDay,
        note: Option<String>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<DayChange, CashError> {
        AccessGate::require_admin(actor, "annotating a cash day")?;
        let note = normalize_text(note).ok_or(CashError::MissingNote)?;
        Ok(DayChange::Annotate {
            audit: DayAuditEntry::new(
                day.id,
                AuditAction::Annotated,
                None,
                Some(note),
                actor.user_id,
                now,
            ),
        })
    }
}
