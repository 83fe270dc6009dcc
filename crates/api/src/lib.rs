//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for cash days and movements
//! - Authentication middleware
//! - Mapping of ledger errors to JSON responses

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use cashbook_core::cash::{CashLedgerService, CashLedgerStore, CategoryDirectory};
use cashbook_shared::JwtService;

pub use error::ApiError;

/// Application state shared across handlers.
pub struct AppState<S, D> {
    /// Cash ledger service.
    pub ledger: Arc<CashLedgerService<S, D>>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
}

impl<S, D> AppState<S, D> {
    /// Creates the state from its services.
    #[must_use]
    pub fn new(ledger: CashLedgerService<S, D>, jwt_service: JwtService) -> Self {
        Self {
            ledger: Arc::new(ledger),
            jwt_service: Arc::new(jwt_service),
        }
    }
}

// Manual impl: the derive would require `S: Clone` and `D: Clone`.
impl<S, D> Clone for AppState<S, D> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            jwt_service: Arc::clone(&self.jwt_service),
        }
    }
}

/// Creates the main application router.
pub fn create_router<S, D>(state: AppState<S, D>) -> Router
where
    S: CashLedgerStore + 'static,
    D: CategoryDirectory + 'static,
{
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(&state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
