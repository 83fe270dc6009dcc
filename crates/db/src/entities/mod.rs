//! `SeaORM` entity definitions.

#![allow(missing_docs)]

pub mod cash_categories;
pub mod cash_day_audit;
pub mod cash_days;
pub mod cash_movements;
pub mod sea_orm_active_enums;
