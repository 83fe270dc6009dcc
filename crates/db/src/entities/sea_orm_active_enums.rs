//! `SeaORM` active enums mirroring the Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use cashbook_core::cash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "cash_day_status")]
pub enum CashDayStatus {
    #[sea_orm(string_value = "OPEN")]
    Open,
    #[sea_orm(string_value = "CLOSED")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "cash_movement_type")]
pub enum CashMovementType {
    #[sea_orm(string_value = "INCOME")]
    Income,
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "CASH")]
    Cash,
    #[sea_orm(string_value = "TRANSFER")]
    Transfer,
    #[sea_orm(string_value = "CARD")]
    Card,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "cash_day_audit_action")]
pub enum CashDayAuditAction {
    #[sea_orm(string_value = "OPENED")]
    Opened,
    #[sea_orm(string_value = "OPENING_CASH_SET")]
    OpeningCashSet,
    #[sea_orm(string_value = "CLOSED")]
    Closed,
    #[sea_orm(string_value = "ANNOTATED")]
    Annotated,
}

impl From<cash::CashDayStatus> for CashDayStatus {
    fn from(status: cash::CashDayStatus) -> Self {
        match status {
            cash::CashDayStatus::Open => Self::Open,
            cash::CashDayStatus::Closed => Self::Closed,
        }
    }
}

impl From<CashMovementType> for cash::MovementType {
    fn from(value: CashMovementType) -> Self {
        match value {
            CashMovementType::Income => Self::Income,
            CashMovementType::Expense => Self::Expense,
        }
    }
}

impl From<cash::MovementType> for CashMovementType {
    fn from(value: cash::MovementType) -> Self {
        match value {
            cash::MovementType::Income => Self::Income,
            cash::MovementType::Expense => Self::Expense,
        }
    }
}

impl From<PaymentMethod> for cash::PaymentMethod {
    fn from(value: PaymentMethod) -> Self {
        match value {
            PaymentMethod::Cash => Self::Cash,
            PaymentMethod::Transfer => Self::Transfer,
            PaymentMethod::Card => Self::Card,
            PaymentMethod::Other => Self::Other,
        }
    }
}

impl From<cash::PaymentMethod> for PaymentMethod {
    fn from(value: cash::PaymentMethod) -> Self {
        match value {
            cash::PaymentMethod::Cash => Self::Cash,
            cash::PaymentMethod::Transfer => Self::Transfer,
            cash::PaymentMethod::Card => Self::Card,
            cash::PaymentMethod::Other => Self::Other,
        }
    }
}

impl From<CashDayAuditAction> for cash::AuditAction {
    fn from(value: CashDayAuditAction) -> Self {
        match value {
            CashDayAuditAction::Opened => Self::Opened,
            CashDayAuditAction::OpeningCashSet => Self::OpeningCashSet,
            CashDayAuditAction::Closed => Self::Closed,
            CashDayAuditAction::Annotated => Self::Annotated,
        }
    }
}

impl From<cash::AuditAction> for CashDayAuditAction {
    fn from(value: cash::AuditAction) -> Self {
        match value {
            cash::AuditAction::Opened => Self::Opened,
            cash::AuditAction::OpeningCashSet => Self::OpeningCashSet,
            cash::AuditAction::Closed => Self::Closed,
            cash::AuditAction::Annotated => Self::Annotated,
        }
    }
}
