//! `SeaORM` Entity for cash_day_audit table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::CashDayAuditAction;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_day_audit")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub cash_day_id: Uuid,
    pub action: CashDayAuditAction,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub amount: Option<Decimal>,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub actor_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
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
