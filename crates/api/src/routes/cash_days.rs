//! Cash day routes: lifecycle, summary and audit trail.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, middleware::AuthUser};
use cashbook_core::cash::{
    AuditAction, CashDayStatus, CashDayView, CashLedgerStore, CategoryDirectory, CategorySummary,
    CloseDayInput, DayAuditEntry, DayReport, MethodSummary, PaymentMethod, Totals,
};
use cashbook_shared::types::{AuditEntryId, BranchId, CashDayId, CategoryId, UserId};

/// Creates the cash day routes (requires auth middleware to be applied externally).
pub fn routes<S, D>() -> Router<AppState<S, D>>
where
    S: CashLedgerStore + 'static,
    D: CategoryDirectory + 'static,
{
    Router::new()
        .route("/branches/{branch_id}/cash-days", get(list_days::<S, D>))
        .route(
            "/branches/{branch_id}/cash-days/today",
            post(today_day::<S, D>),
        )
        .route(
            "/branches/{branch_id}/cash-days/{date_key}",
            put(get_or_create_day::<S, D>),
        )
        .route(
            "/branches/{branch_id}/cash-days/{date_key}/open",
            post(open_day::<S, D>),
        )
        .route(
            "/branches/{branch_id}/cash-days/{date_key}/summary",
            get(get_summary::<S, D>),
        )
        .route(
            "/branches/{branch_id}/cash-days/{date_key}/close",
            post(close_day::<S, D>),
        )
        .route(
            "/cash-days/{day_id}/opening-cash",
            put(set_opening_cash::<S, D>),
        )
        .route(
            "/cash-days/{day_id}/audit",
            get(list_audit::<S, D>).post(annotate_day::<S, D>),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing days.
#[derive(Debug, Deserialize)]
pub struct ListDaysQuery {
    /// First date, inclusive.
    pub from: NaiveDate,
    /// Last date, inclusive.
    pub to: NaiveDate,
}

/// Request body for opening a day.
#[derive(Debug, Deserialize)]
pub struct OpenDayRequest {
    /// Opening balance.
    pub opening_cash: Decimal,
}

/// Request body for overwriting the opening balance.
#[derive(Debug, Deserialize)]
pub struct SetOpeningCashRequest {
    /// New opening balance.
    pub amount: Decimal,
}

/// Request body for closing a day.
#[derive(Debug, Default, Deserialize)]
pub struct CloseDayRequest {
    /// Physically counted cash.
    pub counted_cash: Option<Decimal>,
    /// Administrator override.
    #[serde(default)]
    pub admin_override: bool,
    /// Closing note.
    pub note: Option<String>,
}

/// Request body for annotating a day.
#[derive(Debug, Deserialize)]
pub struct AnnotateDayRequest {
    /// Annotation text.
    pub note: Option<String>,
}

/// Response for a cash day.
#[derive(Debug, Serialize)]
pub struct CashDayResponse {
    /// Day ID.
    pub id: CashDayId,
    /// Branch ID.
    pub branch_id: BranchId,
    /// Calendar date (`YYYY-MM-DD`).
    pub date_key: String,
    /// `OPEN` or `CLOSED`.
    pub status: CashDayStatus,
    /// Opening balance.
    pub opening_cash: String,
    /// Expected cash, live while open and frozen at close.
    pub expected_cash: String,
    /// Counted cash, once closed with a count.
    pub counted_cash: Option<String>,
    /// `counted - expected`, present when counted.
    pub diff_cash: Option<String>,
    /// Whether the day was closed through the override.
    pub admin_override: bool,
    /// Closing note.
    pub note: Option<String>,
    /// Creation timestamp.
    pub opened_at: String,
    /// Creator.
    pub opened_by: UserId,
    /// Close timestamp.
    pub closed_at: Option<String>,
    /// Who closed the day.
    pub closed_by: Option<UserId>,
}

impl From<CashDayView> for CashDayResponse {
    fn from(view: CashDayView) -> Self {
        let status = view.day.status();
        let closing = view.day.closing;
        Self {
            id: view.day.id,
            branch_id: view.day.branch_id,
            date_key: view.day.date_key.to_string(),
            status,
            opening_cash: view.day.opening_cash.to_string(),
            expected_cash: view.expected_cash.to_string(),
            counted_cash: closing
                .as_ref()
                .and_then(|c| c.counted_cash)
                .map(|d| d.to_string()),
            diff_cash: view.diff_cash.map(|d| d.to_string()),
            admin_override: closing.as_ref().is_some_and(|c| c.admin_override),
            note: closing.as_ref().and_then(|c| c.note.clone()),
            opened_at: timestamp(view.day.opened_at),
            opened_by: view.day.opened_by,
            closed_at: closing.as_ref().map(|c| timestamp(c.closed_at)),
            closed_by: closing.as_ref().map(|c| c.closed_by),
        }
    }
}

/// Income/expense totals.
#[derive(Debug, Serialize)]
pub struct TotalsResponse {
    /// Total income.
    pub income: String,
    /// Total expense.
    pub expense: String,
    /// Income minus expense.
    pub net: String,
    /// Contributing movements.
    pub count: usize,
}

impl From<Totals> for TotalsResponse {
    fn from(totals: Totals) -> Self {
        Self {
            income: totals.income.to_string(),
            expense: totals.expense.to_string(),
            net: totals.net.to_string(),
            count: totals.count,
        }
    }
}

/// Totals for one payment method.
#[derive(Debug, Serialize)]
pub struct MethodSummaryResponse {
    /// Payment method.
    pub method: PaymentMethod,
    /// Totals.
    #[serde(flatten)]
    pub totals: TotalsResponse,
}

impl From<MethodSummary> for MethodSummaryResponse {
    fn from(row: MethodSummary) -> Self {
        Self {
            method: row.method,
            totals: row.totals.into(),
        }
    }
}

/// Totals for one category.
#[derive(Debug, Serialize)]
pub struct CategorySummaryResponse {
    /// Category, null for uncategorized movements.
    pub category_id: Option<CategoryId>,
    /// Display name.
    pub name: String,
    /// Totals.
    #[serde(flatten)]
    pub totals: TotalsResponse,
}

impl From<CategorySummary> for CategorySummaryResponse {
    fn from(row: CategorySummary) -> Self {
        Self {
            category_id: row.category_id,
            name: row.name,
            totals: row.totals.into(),
        }
    }
}

/// Response for a day summary.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// The day.
    pub day: CashDayResponse,
    /// Day totals.
    pub totals: TotalsResponse,
    /// Per-method totals.
    pub by_method: Vec<MethodSummaryResponse>,
    /// Per-category totals.
    pub by_category: Vec<CategorySummaryResponse>,
}

impl From<DayReport> for SummaryResponse {
    fn from(report: DayReport) -> Self {
        Self {
            day: report.day.into(),
            totals: report.summary.totals.into(),
            by_method: report.summary.by_method.into_iter().map(Into::into).collect(),
            by_category: report
                .summary
                .by_category
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

/// Response for an audit entry.
#[derive(Debug, Serialize)]
pub struct AuditEntryResponse {
    /// Entry ID.
    pub id: AuditEntryId,
    /// Day ID.
    pub cash_day_id: CashDayId,
    /// Recorded action.
    pub action: AuditAction,
    /// Amount involved, if any.
    pub amount: Option<String>,
    /// Note.
    pub note: Option<String>,
    /// Acting user.
    pub actor_id: UserId,
    /// Timestamp.
    pub created_at: String,
}

impl From<DayAuditEntry> for AuditEntryResponse {
    fn from(entry: DayAuditEntry) -> Self {
        Self {
            id: entry.id,
            cash_day_id: entry.cash_day_id,
            action: entry.action,
            amount: entry.amount.map(|d| d.to_string()),
            note: entry.note,
            actor_id: entry.actor_id,
            created_at: timestamp(entry.created_at),
        }
    }
}

pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /branches/{branch_id}/cash-days?from=&to=
async fn list_days<S, D>(
    State(state): State<AppState<S, D>>,
    auth: AuthUser,
    Path(branch_id): Path<BranchId>,
    Query(query): Query<ListDaysQuery>,
) -> Result<Json<Vec<CashDayResponse>>, ApiError>
where
    S: CashLedgerStore,
    D: CategoryDirectory,
{
    let days = state
        .ledger
        .list_days(&auth.actor(), branch_id, query.from, query.to)
        .await?;
    Ok(Json(days.into_iter().map(Into::into).collect()))
}

/// POST /branches/{branch_id}/cash-days/today
async fn today_day<S, D>(
    State(state): State<AppState<S, D>>,
    auth: AuthUser,
    Path(branch_id): Path<BranchId>,
) -> Result<Json<CashDayResponse>, ApiError>
where
    S: CashLedgerStore,
    D: CategoryDirectory,
{
    let view = state
        .ledger
        .get_or_create_today(&auth.actor(), branch_id)
        .await?;
    Ok(Json(view.into()))
}

/// PUT /branches/{branch_id}/cash-days/{date_key}
async fn get_or_create_day<S, D>(
    State(state): State<AppState<S, D>>,
    auth: AuthUser,
    Path((branch_id, date_key)): Path<(BranchId, NaiveDate)>,
) -> Result<Json<CashDayResponse>, ApiError>
where
    S: CashLedgerStore,
    D: CategoryDirectory,
{
    let view = state
        .ledger
        .get_or_create_day(&auth.actor(), branch_id, date_key)
        .await?;
    Ok(Json(view.into()))
}

/// POST /branches/{branch_id}/cash-days/{date_key}/open
async fn open_day<S, D>(
    State(state): State<AppState<S, D>>,
    auth: AuthUser,
    Path((branch_id, date_key)): Path<(BranchId, NaiveDate)>,
    Json(payload): Json<OpenDayRequest>,
) -> Result<Json<CashDayResponse>, ApiError>
where
    S: CashLedgerStore,
    D: CategoryDirectory,
{
    let view = state
        .ledger
        .open_day(&auth.actor(), branch_id, date_key, payload.opening_cash)
        .await?;
    Ok(Json(view.into()))
}

/// GET /branches/{branch_id}/cash-days/{date_key}/summary
async fn get_summary<S, D>(
    State(state): State<AppState<S, D>>,
    auth: AuthUser,
    Path((branch_id, date_key)): Path<(BranchId, NaiveDate)>,
) -> Result<Json<SummaryResponse>, ApiError>
where
    S: CashLedgerStore,
    D: CategoryDirectory,
{
    let report = state
        .ledger
        .get_summary(&auth.actor(), branch_id, date_key)
        .await?;
    Ok(Json(report.into()))
}

/// POST /branches/{branch_id}/cash-days/{date_key}/close
async fn close_day<S, D>(
    State(state): State<AppState<S, D>>,
    auth: AuthUser,
    Path((branch_id, date_key)): Path<(BranchId, NaiveDate)>,
    Json(payload): Json<CloseDayRequest>,
) -> Result<Json<CashDayResponse>, ApiError>
where
    S: CashLedgerStore,
    D: CategoryDirectory,
{
    let input = CloseDayInput {
        counted_cash: payload.counted_cash,
        admin_override: payload.admin_override,
        note: payload.note,
    };
    let view = state
        .ledger
        .close_day(&auth.actor(), branch_id, date_key, input)
        .await?;
    Ok(Json(view.into()))
}

/// PUT /cash-days/{day_id}/opening-cash
async fn set_opening_cash<S, D>(
    State(state): State<AppState<S, D>>,
    auth: AuthUser,
    Path(day_id): Path<CashDayId>,
    Json(payload): Json<SetOpeningCashRequest>,
) -> Result<Json<CashDayResponse>, ApiError>
where
    S: CashLedgerStore,
    D: CategoryDirectory,
{
    let view = state
        .ledger
        .set_opening_cash(&auth.actor(), day_id, payload.amount)
        .await?;
    Ok(Json(view.into()))
}

/// GET /cash-days/{day_id}/audit
async fn list_audit<S, D>(
    State(state): State<AppState<S, D>>,
    auth: AuthUser,
    Path(day_id): Path<CashDayId>,
) -> Result<Json<Vec<AuditEntryResponse>>, ApiError>
where
    S: CashLedgerStore,
    D: CategoryDirectory,
{
    let entries = state.ledger.list_audit(&auth.actor(), day_id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// POST /cash-days/{day_id}/audit
async fn annotate_day<S, D>(
    State(state): State<AppState<S, D>>,
    auth: AuthUser,
    Path(day_id): Path<CashDayId>,
    Json(payload): Json<AnnotateDayRequest>,
) -> Result<(StatusCode, Json<AuditEntryResponse>), ApiError>
where
    S: CashLedgerStore,
    D: CategoryDirectory,
{
    let entry = state
        .ledger
        .annotate_day(&auth.actor(), day_id, payload.note)
        .await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}
