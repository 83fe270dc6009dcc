//! Cash ledger error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

use cashbook_shared::types::{BranchId, CashDayId, CashMovementId};

use super::types::CashDayStatus;

/// Decimal places kept by stored amounts.
pub const AMOUNT_SCALE: u32 = 4;

/// Exclusive upper bound on the magnitude of a stored amount.
const AMOUNT_LIMIT: i64 = 1_000_000_000_000_000;

/// Longest concept accepted, in characters.
pub const MAX_CONCEPT_LEN: usize = 200;

/// Which amount rule was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountRule {
    /// Must be strictly greater than zero.
    Positive,
    /// Must be zero or greater.
    NonNegative,
    /// Must fit the stored precision.
    Storable,
}

impl AmountRule {
    /// Checks `amount` against this sign rule and the storable range.
    ///
    /// Returns the amount rescaled to at most [`AMOUNT_SCALE`] places.
    ///
    /// # Errors
    /// `InvalidAmount` naming the first rule that `amount` breaks.
    pub fn check(self, field: &'static str, amount: Decimal) -> Result<Decimal, CashError> {
        let broken = match self {
            Self::Positive if amount <= Decimal::ZERO => Some(self),
            Self::NonNegative if amount < Decimal::ZERO => Some(self),
            _ if !is_storable(amount) => Some(Self::Storable),
            _ => None,
        };
        match broken {
            None => Ok(amount.round_dp(AMOUNT_SCALE)),
            Some(rule) => Err(CashError::InvalidAmount {
                field,
                amount,
                rule,
            }),
        }
    }
}

fn is_storable(amount: Decimal) -> bool {
    amount.abs() < Decimal::from(AMOUNT_LIMIT) && amount.round_dp(AMOUNT_SCALE) == amount
}

impl fmt::Display for AmountRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => f.write_str("greater than zero"),
            Self::NonNegative => f.write_str("zero or greater"),
            Self::Storable => write!(
                f,
                "below {AMOUNT_LIMIT} with at most {AMOUNT_SCALE} decimal places"
            ),
        }
    }
}

/// Errors that can occur during cash ledger operations.
#[derive(Debug, Error)]
pub enum CashError {
    // ========== State Errors ==========
    /// Operation not legal for the day's current status.
    #[error("Cannot {operation} on a {status} cash day")]
    InvalidState {
        /// Attempted operation.
        operation: &'static str,
        /// Current status of the day.
        status: CashDayStatus,
    },

    /// Movement was already voided.
    #[error("Movement {0} is already voided")]
    AlreadyVoided(CashMovementId),

    // ========== Validation Errors ==========
    /// Amount breaks its sign or precision rule.
    #[error("{field} must be {rule}, got {amount}")]
    InvalidAmount {
        /// Name of the offending field.
        field: &'static str,
        /// Rejected value.
        amount: Decimal,
        /// Rule that was broken.
        rule: AmountRule,
    },

    /// Concept is blank.
    #[error("Concept is required")]
    MissingConcept,

    /// Concept exceeds [`MAX_CONCEPT_LEN`] characters.
    #[error("Concept is {len} characters long, the limit is {max}")]
    ConceptTooLong {
        /// Submitted length after trimming.
        len: usize,
        /// Allowed length.
        max: usize,
    },

    /// Close requested without a count and without override.
    #[error("Counted cash is required to close the day")]
    MissingCount,

    /// Annotation note is blank.
    #[error("Annotation note is required")]
    MissingNote,

    /// Date range is inverted.
    #[error("Invalid date range: {from} is after {to}")]
    InvalidRange {
        /// Range start.
        from: NaiveDate,
        /// Range end.
        to: NaiveDate,
    },

    // ========== Access Errors ==========
    /// Caller lacks the required capability.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Caller tried to act on another branch.
    #[error("Access to branch {0} denied")]
    BranchAccessDenied(BranchId),

    // ========== Lookup Errors ==========
    /// Day not found by id.
    #[error("Cash day not found: {0}")]
    DayNotFound(CashDayId),

    /// Day not found by branch and date.
    #[error("No cash day for branch {branch_id} on {date_key}")]
    DayNotFoundForDate {
        /// Branch.
        branch_id: BranchId,
        /// Calendar date.
        date_key: NaiveDate,
    },

    /// Movement not found.
    #[error("Cash movement not found: {0}")]
    MovementNotFound(CashMovementId),

    // ========== Infrastructure Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CashError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::AlreadyVoided(_) => "ALREADY_VOIDED",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::MissingConcept => "MISSING_CONCEPT",
            Self::ConceptTooLong { .. } => "CONCEPT_TOO_LONG",
            Self::MissingCount => "MISSING_COUNT",
            Self::MissingNote => "MISSING_NOTE",
            Self::InvalidRange { .. } => "INVALID_RANGE",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BranchAccessDenied(_) => "BRANCH_ACCESS_DENIED",
            Self::DayNotFound(_) | Self::DayNotFoundForDate { .. } => "DAY_NOT_FOUND",
            Self::MovementNotFound(_) => "MOVEMENT_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InvalidAmount { .. }
            | Self::MissingConcept
            | Self::ConceptTooLong { .. }
            | Self::MissingCount
            | Self::MissingNote
            | Self::InvalidRange { .. } => 400,

            // 403 Forbidden
            Self::Forbidden(_) | Self::BranchAccessDenied(_) => 403,

            // 404 Not Found
            Self::DayNotFound(_) | Self::DayNotFoundForDate { .. } | Self::MovementNotFound(_) => {
                404
            }

            // 409 Conflict - state errors
            Self::InvalidState { .. } | Self::AlreadyVoided(_) => 409,

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if the error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// Returns true for any of the not-found variants.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.http_status_code() == 404
    }
}
