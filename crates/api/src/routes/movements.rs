//! Cash movement routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cash_days::timestamp;
use crate::{AppState, error::ApiError, middleware::AuthUser};
use cashbook_core::cash::{
    CashLedgerStore, CategoryDirectory, CreateMovementInput, MovementType, PaymentMethod,
    ResolvedMovement,
};
use cashbook_shared::types::{CashDayId, CashMovementId, CategoryId, UserId};

/// Creates the movement routes (requires auth middleware to be applied externally).
pub fn routes<S, D>() -> Router<AppState<S, D>>
where
    S: CashLedgerStore + 'static,
    D: CategoryDirectory + 'static,
{
    Router::new()
        .route(
            "/cash-days/{day_id}/movements",
            get(list_movements::<S, D>).post(create_movement::<S, D>),
        )
        .route(
            "/cash-movements/{movement_id}/void",
            post(void_movement::<S, D>),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for recording a movement.
#[derive(Debug, Deserialize)]
pub struct CreateMovementRequest {
    /// `INCOME` or `EXPENSE`.
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    /// `CASH`, `TRANSFER`, `CARD` or `OTHER`.
    pub method: PaymentMethod,
    /// Positive amount as a decimal string.
    pub amount: Decimal,
    /// Optional category.
    pub category_id: Option<CategoryId>,
    /// Mandatory label.
    #[serde(default)]
    pub concept: String,
    /// Optional note.
    pub note: Option<String>,
}

/// Request body for voiding a movement.
#[derive(Debug, Deserialize)]
pub struct VoidMovementRequest {
    /// Why the movement is voided.
    pub reason: Option<String>,
}

/// Response for a movement.
#[derive(Debug, Serialize)]
pub struct MovementResponse {
    /// Movement ID.
    pub id: CashMovementId,
    /// Owning day.
    pub cash_day_id: CashDayId,
    /// Income or expense.
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    /// Payment method.
    pub method: PaymentMethod,
    /// Amount.
    pub amount: String,
    /// Category ID.
    pub category_id: Option<CategoryId>,
    /// Resolved category name, null when unknown.
    pub category_name: Option<String>,
    /// Label.
    pub concept: String,
    /// Note.
    pub note: Option<String>,
    /// Whether the movement is voided.
    pub voided: bool,
    /// Void reason.
    pub void_reason: Option<String>,
    /// Void timestamp.
    pub voided_at: Option<String>,
    /// Who voided it.
    pub voided_by: Option<UserId>,
    /// Creation timestamp.
    pub created_at: String,
    /// Who recorded it.
    pub created_by: UserId,
}

impl From<ResolvedMovement> for MovementResponse {
    fn from(resolved: ResolvedMovement) -> Self {
        let m = resolved.movement;
        let void = m.void;
        Self {
            id: m.id,
            cash_day_id: m.cash_day_id,
            movement_type: m.movement_type,
            method: m.method,
            amount: m.amount.to_string(),
            category_id: m.category_id,
            category_name: resolved.category_name,
            concept: m.concept,
            note: m.note,
            voided: void.is_some(),
            void_reason: void.as_ref().and_then(|v| v.reason.clone()),
            voided_at: void.as_ref().map(|v| timestamp(v.voided_at)),
            voided_by: void.as_ref().map(|v| v.voided_by),
            created_at: timestamp(m.created_at),
            created_by: m.created_by,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /cash-days/{day_id}/movements
async fn list_movements<S, D>(
    State(state): State<AppState<S, D>>,
    auth: AuthUser,
    Path(day_id): Path<CashDayId>,
) -> Result<Json<Vec<MovementResponse>>, ApiError>
where
    S: CashLedgerStore,
    D: CategoryDirectory,
{
    let movements = state.ledger.list_movements(&auth.actor(), day_id).await?;
    Ok(Json(movements.into_iter().map(Into::into).collect()))
}

/// POST /cash-days/{day_id}/movements
async fn create_movement<S, D>(
    State(state): State<AppState<S, D>>,
    auth: AuthUser,
    Path(day_id): Path<CashDayId>,
    Json(payload): Json<CreateMovementRequest>,
) -> Result<(StatusCode, Json<MovementResponse>), ApiError>
where
    S: CashLedgerStore,
    D: CategoryDirectory,
{
    let input = CreateMovementInput {
        movement_type: payload.movement_type,
        method: payload.method,
        amount: payload.amount,
        category_id: payload.category_id,
        concept: payload.concept,
        note: payload.note,
    };
    let movement = state
        .ledger
        .create_movement(&auth.actor(), day_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(movement.into())))
}

/// POST /cash-movements/{movement_id}/void
///
/// The body is optional.
async fn void_movement<S, D>(
    State(state): State<AppState<S, D>>,
    auth: AuthUser,
    Path(movement_id): Path<CashMovementId>,
    payload: Option<Json<VoidMovementRequest>>,
) -> Result<Json<MovementResponse>, ApiError>
where
    S: CashLedgerStore,
    D: CategoryDirectory,
{
    let reason = payload.and_then(|Json(request)| request.reason);
    let movement = state
        .ledger
        .void_movement(&auth.actor(), movement_id, reason)
        .await?;
    Ok(Json(movement.into()))
}
