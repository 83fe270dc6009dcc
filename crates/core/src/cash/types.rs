//! Cash ledger domain types.
//!
//! A [`CashDay`] is the reconciliation unit for one branch and one calendar
//! date. It exclusively owns its [`CashMovement`]s and its audit trail.
//! Closing and voiding are modelled as set-once records (`closing`, `void`)
//! so the "set together, exactly once" rules hold structurally.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use cashbook_shared::types::{
    AuditEntryId, BranchId, CashDayId, CashMovementId, CategoryId, UserId,
};

/// Status of a cash day. The only transition is `Open → Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CashDayStatus {
    /// The shift is running; movements may be recorded.
    Open,
    /// The day has been reconciled and is immutable.
    Closed,
}

impl CashDayStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }

    /// Returns true if movements may still be recorded or voided.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for CashDayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a movement. The stored amount is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    /// Money coming into the till.
    Income,
    /// Money leaving the till.
    Expense,
}

impl MovementType {
    /// Returns the string representation of the movement type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INCOME" => Ok(Self::Income),
            "EXPENSE" => Ok(Self::Expense),
            _ => Err(format!("Unknown movement type: {s}")),
        }
    }
}

/// How the money moved. Only `Cash` affects the expected till balance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    /// Physical cash in the drawer.
    Cash,
    /// Bank transfer.
    Transfer,
    /// Card payment.
    Card,
    /// Anything else (vouchers, wallets, ...).
    Other,
}

impl PaymentMethod {
    /// All methods in reporting order.
    pub const ALL: [Self; 4] = [Self::Cash, Self::Transfer, Self::Card, Self::Other];

    /// Returns the string representation of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Transfer => "TRANSFER",
            Self::Card => "CARD",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CASH" => Ok(Self::Cash),
            "TRANSFER" => Ok(Self::Transfer),
            "CARD" => Ok(Self::Card),
            "OTHER" => Ok(Self::Other),
            _ => Err(format!("Unknown payment method: {s}")),
        }
    }
}

/// Reconciliation recorded when a day is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingRecord {
    /// Physically counted cash; absent for an unreconciled override close.
    pub counted_cash: Option<Decimal>,
    /// Expected cash computed from the movement set at close time.
    pub expected_cash: Decimal,
    /// `counted_cash - expected_cash`, present only when counted.
    pub diff_cash: Option<Decimal>,
    /// Whether the administrator override path closed the day.
    pub admin_override: bool,
    /// Closing note.
    pub note: Option<String>,
    /// When the day was closed.
    pub closed_at: DateTime<Utc>,
    /// Who closed the day.
    pub closed_by: UserId,
}

/// One ledger per branch and calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashDay {
    /// Day ID.
    pub id: CashDayId,
    /// Tenant scope.
    pub branch_id: BranchId,
    /// Calendar date, unique per branch.
    pub date_key: NaiveDate,
    /// Opening balance; only changes while open.
    pub opening_cash: Decimal,
    /// When the day was created.
    pub opened_at: DateTime<Utc>,
    /// Who created the day.
    pub opened_by: UserId,
    /// Present once the day is closed.
    pub closing: Option<ClosingRecord>,
}

impl CashDay {
    /// Creates a fresh open day with a zero opening balance.
    #[must_use]
    pub fn open(
        branch_id: BranchId,
        date_key: NaiveDate,
        opened_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CashDayId::new(),
            branch_id,
            date_key,
            opening_cash: Decimal::ZERO,
            opened_at: now,
            opened_by,
            closing: None,
        }
    }

    /// Current status, derived from the closing record.
    #[must_use]
    pub const fn status(&self) -> CashDayStatus {
        if self.closing.is_some() {
            CashDayStatus::Closed
        } else {
            CashDayStatus::Open
        }
    }

    /// Returns true if the day is still open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.closing.is_none()
    }

    /// Applies a planned change. The planner has already validated it.
    pub fn apply(&mut self, change: &DayChange) {
        match change {
            DayChange::SetOpeningCash { amount, .. } => self.opening_cash = *amount,
            DayChange::Close { closing, .. } => self.closing = Some(closing.clone()),
            DayChange::Unchanged | DayChange::Annotate { .. } => {}
        }
    }
}

/// Void stamp; its presence means the movement is voided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoidStamp {
    /// Optional reason given by the operator.
    pub reason: Option<String>,
    /// When the movement was voided.
    pub voided_at: DateTime<Utc>,
    /// Who voided it.
    pub voided_by: UserId,
}

/// A single income or expense entry within a cash day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashMovement {
    /// Movement ID.
    pub id: CashMovementId,
    /// Owning day (back-reference).
    pub cash_day_id: CashDayId,
    /// Income or expense.
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    /// Payment method.
    pub method: PaymentMethod,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Optional category reference.
    pub category_id: Option<CategoryId>,
    /// Short mandatory label.
    pub concept: String,
    /// Optional free text.
    pub note: Option<String>,
    /// Present once voided.
    pub void: Option<VoidStamp>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Who recorded the movement.
    pub created_by: UserId,
}

impl CashMovement {
    /// Returns true if the movement has been voided.
    #[must_use]
    pub const fn is_voided(&self) -> bool {
        self.void.is_some()
    }

    /// Amount with the sign implied by the movement type.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.movement_type {
            MovementType::Income => self.amount,
            MovementType::Expense => -self.amount,
        }
    }
}

/// Input for recording a movement.
#[derive(Debug, Clone)]
pub struct CreateMovementInput {
    /// Income or expense.
    pub movement_type: MovementType,
    /// Payment method.
    pub method: PaymentMethod,
    /// Amount (must be positive).
    pub amount: Decimal,
    /// Optional category reference.
    pub category_id: Option<CategoryId>,
    /// Mandatory label.
    pub concept: String,
    /// Optional note.
    pub note: Option<String>,
}

/// Input for closing a day.
#[derive(Debug, Clone, Default)]
pub struct CloseDayInput {
    /// Physically counted cash.
    pub counted_cash: Option<Decimal>,
    /// Use the administrator override path.
    pub admin_override: bool,
    /// Closing note for the audit trail.
    pub note: Option<String>,
}

/// Kind of entry in a day's audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// The day was created.
    Opened,
    /// The opening balance was changed.
    OpeningCashSet,
    /// The day was closed.
    Closed,
    /// An administrator annotated the day.
    Annotated,
}

impl AuditAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opened => "OPENED",
            Self::OpeningCashSet => "OPENING_CASH_SET",
            Self::Closed => "CLOSED",
            Self::Annotated => "ANNOTATED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only audit record attached to a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAuditEntry {
    /// Entry ID.
    pub id: AuditEntryId,
    /// Day the entry belongs to.
    pub cash_day_id: CashDayId,
    /// What happened.
    pub action: AuditAction,
    /// Amount involved (opening cash set, counted cash at close).
    pub amount: Option<Decimal>,
    /// Free text.
    pub note: Option<String>,
    /// Acting user.
    pub actor_id: UserId,
    /// When it happened.
    pub created_at: DateTime<Utc>,
}

impl DayAuditEntry {
    /// Creates a new audit entry.
    #[must_use]
    pub fn new(
        cash_day_id: CashDayId,
        action: AuditAction,
        amount: Option<Decimal>,
        note: Option<String>,
        actor_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            cash_day_id,
            action,
            amount,
            note,
            actor_id,
            created_at,
        }
    }
}

/// A change to a day planned under the store's lock.
///
/// Every mutating variant carries the audit entry the store must write in the
/// same atomic step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayChange {
    /// Nothing to write (idempotent repeat).
    Unchanged,
    /// Overwrite the opening balance.
    SetOpeningCash {
        /// New opening balance.
        amount: Decimal,
        /// Audit record.
        audit: DayAuditEntry,
    },
    /// Flip the day to closed.
    Close {
        /// Reconciliation data.
        closing: ClosingRecord,
        /// Audit record.
        audit: DayAuditEntry,
    },
    /// Audit annotation only.
    Annotate {
        /// Audit record.
        audit: DayAuditEntry,
    },
}

impl DayChange {
    /// Returns the audit entry to persist, if any.
    #[must_use]
    pub const fn audit_entry(&self) -> Option<&DayAuditEntry> {
        match self {
            Self::Unchanged => None,
            Self::SetOpeningCash { audit, .. }
            | Self::Close { audit, .. }
            | Self::Annotate { audit } => Some(audit),
        }
    }
}

/// A day together with its derived cash figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CashDayView {
    /// The stored day.
    pub day: CashDay,
    /// Expected cash (live projection while open, close snapshot once closed).
    pub expected_cash: Decimal,
    /// Counted minus expected, once counted.
    pub diff_cash: Option<Decimal>,
}

/// A movement with its category resolved to a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMovement {
    /// The stored movement.
    pub movement: CashMovement,
    /// Display name of the category, if any.
    pub category_name: Option<String>,
}

/// Trims free text; blank input becomes `None`.
pub(crate) fn normalize_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
