//! Daily cash-register ledger.
//!
//! One [`CashDay`] per branch and calendar date holds an opening balance, an
//! append-only list of [`CashMovement`]s and, once closed, the reconciliation
//! between expected and counted cash.
//!
//! - [`types`]: domain records and inputs
//! - [`lifecycle`] / [`movement`]: stateless transition planners
//! - [`summary`]: pure rollups and expected-cash projection
//! - [`access`]: tenant scoping and the administrator capability
//! - [`store`]: storage and category-directory seams
//! - [`service`]: the orchestrating [`CashLedgerService`]

pub mod access;
pub mod calendar;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod movement;
pub mod service;
pub mod store;
pub mod summary;
pub mod types;

#[cfg(test)]
mod summary_props;
#[cfg(test)]
mod tests;

pub use access::{AccessGate, Actor, ActorRole};
pub use calendar::{business_date, parse_timezone};
pub use error::{AMOUNT_SCALE, AmountRule, CashError, MAX_CONCEPT_LEN};
pub use lifecycle::DayLifecycle;
pub use memory::{InMemoryCashStore, InMemoryCategoryDirectory};
pub use movement::MovementRecorder;
pub use service::CashLedgerService;
pub use store::{CashLedgerStore, CategoryDirectory, DayUpdate, DirectoryError};
pub use summary::{
    CategorySummary, DayReport, DaySummary, MethodSummary, SummaryAggregator, Totals,
    UNCATEGORIZED_LABEL,
};
pub use types::{
    AuditAction, CashDay, CashDayStatus, CashDayView, CashMovement, CloseDayInput,
    ClosingRecord, CreateMovementInput, DayAuditEntry, DayChange, MovementType, PaymentMethod,
    ResolvedMovement, VoidStamp,
};
