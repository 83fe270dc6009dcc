//! `SeaORM` Entity for cash_movements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{CashMovementType, PaymentMethod};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub cash_day_id: Uuid,
    pub movement_type: CashMovementType,
    pub method: PaymentMethod,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub category_id: Option<Uuid>,
    pub concept: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub voided: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub void_reason: Option<String>,
    pub voided_at: Option<DateTimeWithTimeZone>,
    pub voided_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub created_by: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cash_days::Entity",
        from = "Column::CashDayId",
        to = "super::cash_days::Column::Id"
    )]
    CashDays,
}

impl Related<super::cash_days::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashDays.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
