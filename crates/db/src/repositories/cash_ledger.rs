//! Postgres-backed cash ledger store.
//!
//! Every write runs in one database transaction. Day creation relies on the
//! `(branch_id, date_key)` unique constraint; close and opening-cash updates
//! hold `FOR UPDATE` on the day row; movement writes hold `FOR SHARE` on the
//! day row so they serialize against a close but not against each other.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use cashbook_core::cash::{
    CashDay, CashError, CashLedgerStore, CashMovement, ClosingRecord, DayAuditEntry, DayChange,
    DayUpdate, VoidStamp,
};
use cashbook_shared::types::{
    AuditEntryId, BranchId, CashDayId, CashMovementId, CategoryId, UserId,
};

use crate::entities::{
    cash_day_audit, cash_days, cash_movements,
    sea_orm_active_enums::CashDayStatus,
};

fn db_err(e: DbErr) -> CashError {
    CashError::Database(e.to_string())
}

/// Cash ledger repository implementing [`CashLedgerStore`].
#[derive(Debug, Clone)]
pub struct CashLedgerRepository {
    db: DatabaseConnection,
}

impl CashLedgerRepository {
    /// Creates a new cash ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn movements_on<C: ConnectionTrait>(
        conn: &C,
        day_id: CashDayId,
    ) -> Result<Vec<CashMovement>, CashError> {
        cash_movements::Entity::find()
            .filter(cash_movements::Column::CashDayId.eq(day_id.into_inner()))
            .order_by_asc(cash_movements::Column::CreatedAt)
            .order_by_asc(cash_movements::Column::Id)
            .all(conn)
            .await
            .map_err(db_err)
            .map(|models| models.into_iter().map(movement_from_model).collect())
    }

    async fn insert_audit<C: ConnectionTrait>(
        conn: &C,
        entry: &DayAuditEntry,
    ) -> Result<(), CashError> {
        cash_day_audit::ActiveModel {
            id: Set(entry.id.into_inner()),
            cash_day_id: Set(entry.cash_day_id.into_inner()),
            action: Set(entry.action.into()),
            amount: Set(entry.amount),
            note: Set(entry.note.clone()),
            actor_id: Set(entry.actor_id.into_inner()),
            created_at: Set(entry.created_at.into()),
        }
        .insert(conn)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

impl CashLedgerStore for CashLedgerRepository {
    async fn get_or_create_day(
        &self,
        candidate: CashDay,
        opened: DayAuditEntry,
    ) -> Result<(CashDay, bool), CashError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let inserted = cash_days::Entity::insert(cash_days::ActiveModel {
            id: Set(candidate.id.into_inner()),
            branch_id: Set(candidate.branch_id.into_inner()),
            date_key: Set(candidate.date_key),
            status: Set(CashDayStatus::Open),
            opening_cash: Set(candidate.opening_cash),
            expected_cash: Set(None),
            counted_cash: Set(None),
            diff_cash: Set(None),
            closed_by_override: Set(false),
            close_note: Set(None),
            opened_at: Set(candidate.opened_at.into()),
            opened_by: Set(candidate.opened_by.into_inner()),
            closed_at: Set(None),
            closed_by: Set(None),
        })
        .on_conflict(
            OnConflict::columns([cash_days::Column::BranchId, cash_days::Column::DateKey])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await;
        let created = match inserted {
            Ok(rows) => rows == 1,
            Err(DbErr::RecordNotInserted) => false,
            Err(e) => return Err(db_err(e)),
        };
        if created {
            Self::insert_audit(&txn, &opened).await?;
        }

        let model = cash_days::Entity::find()
            .filter(cash_days::Column::BranchId.eq(candidate.branch_id.into_inner()))
            .filter(cash_days::Column::DateKey.eq(candidate.date_key))
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| {
                CashError::Internal(format!(
                    "cash day for {} on {} vanished after insert",
                    candidate.branch_id, candidate.date_key
                ))
            })?;

        txn.commit().await.map_err(db_err)?;
        Ok((day_from_model(model)?, created))
    }

    async fn find_day(&self, day_id: CashDayId) -> Result<Option<CashDay>, CashError> {
        cash_days::Entity::find_by_id(day_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(day_from_model)
            .transpose()
    }

    async fn find_day_by_date(
        &self,
        branch_id: BranchId,
        date_key: NaiveDate,
    ) -> Result<Option<CashDay>, CashError> {
        cash_days::Entity::find()
            .filter(cash_days::Column::BranchId.eq(branch_id.into_inner()))
            .filter(cash_days::Column::DateKey.eq(date_key))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(day_from_model)
            .transpose()
    }

    async fn list_days(
        &self,
        branch_id: BranchId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CashDay>, CashError> {
        cash_days::Entity::find()
            .filter(cash_days::Column::BranchId.eq(branch_id.into_inner()))
            .filter(cash_days::Column::DateKey.between(from, to))
            .order_by_asc(cash_days::Column::DateKey)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(day_from_model)
            .collect()
    }

    async fn list_movements(&self, day_id: CashDayId) -> Result<Vec<CashMovement>, CashError> {
        Self::movements_on(&self.db, day_id).await
    }

    async fn find_movement(
        &self,
        movement_id: CashMovementId,
    ) -> Result<Option<CashMovement>, CashError> {
        Ok(cash_movements::Entity::find_by_id(movement_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(movement_from_model))
    }

    async fn list_audit(&self, day_id: CashDayId) -> Result<Vec<DayAuditEntry>, CashError> {
        Ok(cash_day_audit::Entity::find()
            .filter(cash_day_audit::Column::CashDayId.eq(day_id.into_inner()))
            .order_by_asc(cash_day_audit::Column::CreatedAt)
            .order_by_asc(cash_day_audit::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(audit_from_model)
            .collect())
    }

    async fn update_day<F>(&self, day_id: CashDayId, plan: F) -> Result<DayUpdate, CashError>
    where
        F: FnOnce(&CashDay, &[CashMovement]) -> Result<DayChange, CashError> + Send,
    {
        let txn = self.db.begin().await.map_err(db_err)?;

        let model = cash_days::Entity::find_by_id(day_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(CashError::DayNotFound(day_id))?;
        let mut day = day_from_model(model.clone())?;
        let movements = Self::movements_on(&txn, day_id).await?;

        let change = plan(&day, &movements)?;
        if change == DayChange::Unchanged {
            txn.commit().await.map_err(db_err)?;
            return Ok(DayUpdate {
                day,
                movements,
                changed: false,
            });
        }

        day.apply(&change);
        let mut active: cash_days::ActiveModel = model.into();
        match &change {
            DayChange::SetOpeningCash { amount, .. } => {
                active.opening_cash = Set(*amount);
            }
            DayChange::Close { closing, .. } => {
                active.status = Set(day.status().into());
                active.expected_cash = Set(Some(closing.expected_cash));
                active.counted_cash = Set(closing.counted_cash);
                active.diff_cash = Set(closing.diff_cash);
                active.closed_by_override = Set(closing.admin_override);
                active.close_note = Set(closing.note.clone());
                active.closed_at = Set(Some(closing.closed_at.into()));
                active.closed_by = Set(Some(closing.closed_by.into_inner()));
            }
            DayChange::Annotate { .. } | DayChange::Unchanged => {}
        }
        if active.is_changed() {
            active.update(&txn).await.map_err(db_err)?;
        }
        if let Some(audit) = change.audit_entry() {
            Self::insert_audit(&txn, audit).await?;
        }

        txn.commit().await.map_err(db_err)?;
        Ok(DayUpdate {
            day,
            movements,
            changed: true,
        })
    }

    async fn append_movement<F>(
        &self,
        day_id: CashDayId,
        build: F,
    ) -> Result<CashMovement, CashError>
    where
        F: FnOnce(&CashDay) -> Result<CashMovement, CashError> + Send,
    {
        let txn = self.db.begin().await.map_err(db_err)?;

        let day = cash_days::Entity::find_by_id(day_id.into_inner())
            .lock_shared()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(CashError::DayNotFound(day_id))
            .and_then(day_from_model)?;

        let movement = build(&day)?;
        cash_movements::ActiveModel {
            id: Set(movement.id.into_inner()),
            cash_day_id: Set(movement.cash_day_id.into_inner()),
            movement_type: Set(movement.movement_type.into()),
            method: Set(movement.method.into()),
            amount: Set(movement.amount),
            category_id: Set(movement.category_id.map(CategoryId::into_inner)),
            concept: Set(movement.concept.clone()),
            note: Set(movement.note.clone()),
            voided: Set(false),
            void_reason: Set(None),
            voided_at: Set(None),
            voided_by: Set(None),
            created_at: Set(movement.created_at.into()),
            created_by: Set(movement.created_by.into_inner()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(movement)
    }

    async fn void_movement<F>(
        &self,
        movement_id: CashMovementId,
        plan: F,
    ) -> Result<CashMovement, CashError>
    where
        F: FnOnce(&CashDay, &CashMovement) -> Result<VoidStamp, CashError> + Send,
    {
        let txn = self.db.begin().await.map_err(db_err)?;

        let day_id = cash_movements::Entity::find_by_id(movement_id.into_inner())
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(CashError::MovementNotFound(movement_id))?
            .cash_day_id;

        // Day first, then the movement: same lock order as close.
        let day = cash_days::Entity::find_by_id(day_id)
            .lock_shared()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(CashError::DayNotFound(CashDayId::from_uuid(day_id)))
            .and_then(day_from_model)?;
        let model = cash_movements::Entity::find_by_id(movement_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(CashError::MovementNotFound(movement_id))?;

        let mut movement = movement_from_model(model.clone());
        let stamp = plan(&day, &movement)?;

        let mut active: cash_movements::ActiveModel = model.into();
        active.voided = Set(true);
        active.void_reason = Set(stamp.reason.clone());
        active.voided_at = Set(Some(stamp.voided_at.into()));
        active.voided_by = Set(Some(stamp.voided_by.into_inner()));
        active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        movement.void = Some(stamp);
        Ok(movement)
    }
}

/// Converts a `cash_days` row into the domain day.
fn day_from_model(model: cash_days::Model) -> Result<CashDay, CashError> {
    let closing = match model.status {
        CashDayStatus::Open => None,
        CashDayStatus::Closed => {
            let (Some(expected_cash), Some(closed_at), Some(closed_by)) =
                (model.expected_cash, model.closed_at, model.closed_by)
            else {
                return Err(CashError::Internal(format!(
                    "closed cash day {} is missing its closing snapshot",
                    model.id
                )));
            };
            Some(ClosingRecord {
                counted_cash: model.counted_cash,
                expected_cash,
                diff_cash: model.diff_cash,
                admin_override: model.closed_by_override,
                note: model.close_note,
                closed_at: closed_at.with_timezone(&Utc),
                closed_by: UserId::from_uuid(closed_by),
            })
        }
    };

    Ok(CashDay {
        id: CashDayId::from_uuid(model.id),
        branch_id: BranchId::from_uuid(model.branch_id),
        date_key: model.date_key,
        opening_cash: model.opening_cash,
        opened_at: model.opened_at.with_timezone(&Utc),
        opened_by: UserId::from_uuid(model.opened_by),
        closing,
    })
}

/// Converts a `cash_movements` row into the domain movement.
fn movement_from_model(model: cash_movements::Model) -> CashMovement {
    let void = match (model.voided, model.voided_at, model.voided_by) {
        (true, Some(voided_at), Some(voided_by)) => Some(VoidStamp {
            reason: model.void_reason,
            voided_at: voided_at.with_timezone(&Utc),
            voided_by: UserId::from_uuid(voided_by),
        }),
        _ => None,
    };

    CashMovement {
        id: CashMovementId::from_uuid(model.id),
        cash_day_id: CashDayId::from_uuid(model.cash_day_id),
        movement_type: model.movement_type.into(),
        method: model.method.into(),
        amount: model.amount,
        category_id: model.category_id.map(CategoryId::from_uuid),
        concept: model.concept,
        note: model.note,
        void,
        created_at: model.created_at.with_timezone(&Utc),
        created_by: UserId::from_uuid(model.created_by),
    }
}

fn audit_from_model(model: cash_day_audit::Model) -> DayAuditEntry {
    DayAuditEntry {
        id: AuditEntryId::from_uuid(model.id),
        cash_day_id: CashDayId::from_uuid(model.cash_day_id),
        action: model.action.into(),
        amount: model.amount,
        note: model.note,
        actor_id: UserId::from_uuid(model.actor_id),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
