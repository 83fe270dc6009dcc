//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod cash_ledger;
pub mod category;

pub use cash_ledger::CashLedgerRepository;
pub use category::{CachedCategoryDirectory, CategoryRepository};
