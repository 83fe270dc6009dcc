//! `SeaORM` Entity for cash_days table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::CashDayStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_days")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub branch_id: Uuid,
    pub date_key: Date,
    pub status: CashDayStatus,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub opening_cash: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub expected_cash: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub counted_cash: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub diff_cash: Option<Decimal>,
    pub closed_by_override: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub close_note: Option<String>,
    pub opened_at: DateTimeWithTimeZone,
    pub opened_by: Uuid,
    pub closed_at: Option<DateTimeWithTimeZone>,
    pub closed_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cash_movements::Entity")]
    CashMovements,
    #[sea_orm(has_many = "super::cash_day_audit::Entity")]
    CashDayAudit,
}

impl Related<super::cash_movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashMovements.def()
    }
}

impl Related<super::cash_day_audit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashDayAudit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
