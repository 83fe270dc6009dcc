//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};
use cashbook_core::cash::{CashLedgerStore, CategoryDirectory};

pub mod cash_days;
pub mod health;
pub mod movements;

/// Creates the API router: public health check plus the authenticated ledger routes.
pub fn api_routes_with_state<S, D>(state: &AppState<S, D>) -> Router<AppState<S, D>>
where
    S: CashLedgerStore + 'static,
    D: CategoryDirectory + 'static,
{
    let protected_routes = Router::new()
        .merge(cash_days::routes::<S, D>())
        .merge(movements::routes::<S, D>())
        .layer(middleware::from_fn_with_state(
            state.jwt_service.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes::<AppState<S, D>>())
        .merge(protected_routes)
}
