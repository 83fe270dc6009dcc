//! End-to-end tests for `CashLedgerService` over the in-memory store.

use chrono::NaiveDate;
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::sync::Barrier;

use cashbook_shared::types::{BranchId, CashDayId, CashMovementId, CategoryId, UserId};

use super::access::{Actor, ActorRole};
use super::error::{AmountRule, CashError, MAX_CONCEPT_LEN};
use super::memory::{InMemoryCashStore, InMemoryCategoryDirectory};
use super::service::CashLedgerService;
use super::store::{CategoryDirectory, DirectoryError};
use super::types::{
    AuditAction, CashDayStatus, CloseDayInput, CreateMovementInput, MovementType, PaymentMethod,
};

type MemoryService = CashLedgerService<InMemoryCashStore, InMemoryCategoryDirectory>;

fn service() -> (MemoryService, Arc<InMemoryCategoryDirectory>) {
    let directory = Arc::new(InMemoryCategoryDirectory::new());
    let service = CashLedgerService::new(Arc::new(InMemoryCashStore::new()), directory.clone());
    (service, directory)
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

fn cashier(branch_id: BranchId) -> Actor {
    Actor::new(UserId::new(), branch_id, ActorRole::Other)
}

fn admin(branch_id: BranchId) -> Actor {
    Actor::new(UserId::new(), branch_id, ActorRole::Admin)
}

fn cash(movement_type: MovementType, amount: Decimal) -> CreateMovementInput {
    CreateMovementInput {
        movement_type,
        method: PaymentMethod::Cash,
        amount,
        category_id: None,
        concept: "Till".to_string(),
        note: None,
    }
}

fn count(amount: Decimal) -> CloseDayInput {
    CloseDayInput {
        counted_cash: Some(amount),
        ..CloseDayInput::default()
    }
}

/// Opens a day with 10000 and records +5000 / -2000 in cash.
async fn standard_day(service: &MemoryService, actor: &Actor) -> (CashDayId, CashMovementId) {
    let day = service
        .open_day(actor, actor.branch_id, date(), dec!(10000))
        .await
        .unwrap();
    service
        .create_movement(actor, day.day.id, cash(MovementType::Income, dec!(5000)))
        .await
        .unwrap();
    let expense = service
        .create_movement(actor, day.day.id, cash(MovementType::Expense, dec!(2000)))
        .await
        .unwrap();
    (day.day.id, expense.movement.id)
}

#[tokio::test]
async fn test_get_or_create_is_idempotent() {
    let (service, _) = service();
    let actor = cashier(BranchId::new());

    let first = service
        .get_or_create_day(&actor, actor.branch_id, date())
        .await
        .unwrap();
    let second = service
        .get_or_create_day(&actor, actor.branch_id, date())
        .await
        .unwrap();

    assert_eq!(first.day.id, second.day.id);
    assert_eq!(first.day.status(), CashDayStatus::Open);
    assert_eq!(first.day.opening_cash, Decimal::ZERO);
    assert_eq!(first.expected_cash, Decimal::ZERO);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_get_or_create_yields_one_day() {
    const CALLERS: usize = 16;
    let (service, _) = service();
    let service = Arc::new(service);
    let branch = BranchId::new();
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles = (0..CALLERS).map(|_| {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            let actor = cashier(branch);
            barrier.wait().await;
            service.get_or_create_day(&actor, branch, date()).await
        })
    });

    let ids: Vec<CashDayId> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().day.id)
        .collect();
    assert!(ids.iter().all(|id| *id == ids[0]));

    let actor = cashier(branch);
    let days = service.list_days(&actor, branch, date(), date()).await.unwrap();
    assert_eq!(days.len(), 1);
    let audit = service.list_audit(&actor, ids[0]).await.unwrap();
    assert_eq!(audit.len(), 1);
}

#[tokio::test]
async fn test_balanced_close() {
    let (service, _) = service();
    let actor = cashier(BranchId::new());
    standard_day(&service, &actor).await;

    let closed = service
        .close_day(&actor, actor.branch_id, date(), count(dec!(13000)))
        .await
        .unwrap();
    assert_eq!(closed.day.status(), CashDayStatus::Closed);
    assert_eq!(closed.expected_cash, dec!(13000));
    assert_eq!(closed.diff_cash, Some(Decimal::ZERO));
}

#[tokio::test]
async fn test_short_close() {
    let (service, _) = service();
    let actor = cashier(BranchId::new());
    standard_day(&service, &actor).await;

    let closed = service
        .close_day(&actor, actor.branch_id, date(), count(dec!(12500)))
        .await
        .unwrap();
    assert_eq!(closed.diff_cash, Some(dec!(-500)));
    assert_eq!(closed.day.status(), CashDayStatus::Closed);
}

#[tokio::test]
async fn test_void_before_close_restores_expected_cash() {
    let (service, _) = service();
    let actor = cashier(BranchId::new());
    let (_, expense) = standard_day(&service, &actor).await;

    let voided = service
        .void_movement(&actor, expense, Some("entered twice".to_string()))
        .await
        .unwrap();
    assert!(voided.movement.is_voided());
    assert_eq!(voided.movement.amount, dec!(2000));
    assert_eq!(voided.movement.concept, "Till");

    let report = service
        .get_summary(&actor, actor.branch_id, date())
        .await
        .unwrap();
    assert_eq!(report.day.expected_cash, dec!(15000));
    assert_eq!(report.summary.totals.expense, Decimal::ZERO);
    assert_eq!(report.summary.totals.count, 1);
}

#[tokio::test]
async fn test_second_void_fails() {
    let (service, _) = service();
    let actor = cashier(BranchId::new());
    let (_, expense) = standard_day(&service, &actor).await;

    service.void_movement(&actor, expense, None).await.unwrap();
    let err = service.void_movement(&actor, expense, None).await.unwrap_err();
    assert!(matches!(err, CashError::AlreadyVoided(id) if id == expense));
}

#[tokio::test]
async fn test_closed_day_rejects_movements_and_voids() {
    let (service, _) = service();
    let actor = cashier(BranchId::new());
    let (day_id, expense) = standard_day(&service, &actor).await;
    service
        .close_day(&actor, actor.branch_id, date(), count(dec!(13000)))
        .await
        .unwrap();

    let err = service
        .create_movement(&actor, day_id, cash(MovementType::Income, dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, CashError::InvalidState { .. }));

    let err = service.void_movement(&actor, expense, None).await.unwrap_err();
    assert!(matches!(err, CashError::InvalidState { .. }));

    let err = service
        .set_opening_cash(&actor, day_id, dec!(1))
        .await
        .unwrap_err();
    assert!(matches!(err, CashError::InvalidState { .. }));
}

#[tokio::test]
async fn test_close_retry_returns_existing_state() {
    let (service, _) = service();
    let actor = cashier(BranchId::new());
    standard_day(&service, &actor).await;

    let first = service
        .close_day(&actor, actor.branch_id, date(), count(dec!(12500)))
        .await
        .unwrap();
    let retry = service
        .close_day(&actor, actor.branch_id, date(), count(dec!(12500)))
        .await
        .unwrap();
    assert_eq!(first, retry);

    let err = service
        .close_day(&actor, actor.branch_id, date(), count(dec!(13000)))
        .await
        .unwrap_err();
    assert!(matches!(err, CashError::InvalidState { .. }));
}

#[tokio::test]
async fn test_close_requires_count_or_admin_override() {
    let (service, _) = service();
    let branch = BranchId::new();
    let actor = cashier(branch);
    standard_day(&service, &actor).await;

    let err = service
        .close_day(&actor, branch, date(), CloseDayInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CashError::MissingCount));

    let override_close = CloseDayInput {
        counted_cash: None,
        admin_override: true,
        note: Some("drawer key lost".to_string()),
    };
    let err = service
        .close_day(&actor, branch, date(), override_close.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, CashError::Forbidden(_)));

    let closed = service
        .close_day(&admin(branch), branch, date(), override_close)
        .await
        .unwrap();
    assert_eq!(closed.day.status(), CashDayStatus::Closed);
    assert_eq!(closed.expected_cash, dec!(13000));
    assert_eq!(closed.diff_cash, None);
}

#[tokio::test]
async fn test_close_unknown_day_is_not_found() {
    let (service, _) = service();
    let actor = cashier(BranchId::new());
    let err = service
        .close_day(&actor, actor.branch_id, date(), count(dec!(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, CashError::DayNotFoundForDate { .. }));
}

#[tokio::test]
async fn test_summary_does_not_create_days() {
    let (service, _) = service();
    let actor = cashier(BranchId::new());
    let err = service
        .get_summary(&actor, actor.branch_id, date())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(
        service
            .list_days(&actor, actor.branch_id, date(), date())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_invalid_movements_are_rejected() {
    let (service, _) = service();
    let actor = cashier(BranchId::new());
    let (day_id, _) = standard_day(&service, &actor).await;

    for amount in [dec!(0), dec!(-5)] {
        let err = service
            .create_movement(&actor, day_id, cash(MovementType::Income, amount))
            .await
            .unwrap_err();
        assert!(matches!(err, CashError::InvalidAmount { .. }));
    }

    let mut blank = cash(MovementType::Income, dec!(1));
    blank.concept = "  ".to_string();
    let err = service
        .create_movement(&actor, day_id, blank)
        .await
        .unwrap_err();
    assert!(matches!(err, CashError::MissingConcept));

    assert_eq!(service.list_movements(&actor, day_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unstorable_amounts_never_reach_the_summary() {
    let (service, _) = service();
    let actor = cashier(BranchId::new());
    let (day_id, _) = standard_day(&service, &actor).await;

    for _ in 0..2 {
        let err = service
            .create_movement(&actor, day_id, cash(MovementType::Income, Decimal::MAX))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CashError::InvalidAmount {
                rule: AmountRule::Storable,
                ..
            }
        ));
    }
    let err = service
        .create_movement(&actor, day_id, cash(MovementType::Income, dec!(0.00001)))
        .await
        .unwrap_err();
    assert_eq!(err.http_status_code(), 400);

    let largest = dec!(999999999999999.9999);
    for _ in 0..3 {
        service
            .create_movement(&actor, day_id, cash(MovementType::Income, largest))
            .await
            .unwrap();
    }
    let report = service
        .get_summary(&actor, actor.branch_id, date())
        .await
        .unwrap();
    assert_eq!(report.summary.totals.income, dec!(5000) + largest * dec!(3));
    assert_eq!(report.day.expected_cash, dec!(13000) + largest * dec!(3));

    let closed = service
        .close_day(&actor, actor.branch_id, date(), count(dec!(13000)))
        .await
        .unwrap();
    assert_eq!(closed.diff_cash, Some(-(largest * dec!(3))));
}

#[tokio::test]
async fn test_overlong_concept_is_rejected() {
    let (service, _) = service();
    let actor = cashier(BranchId::new());
    let (day_id, _) = standard_day(&service, &actor).await;

    let mut long = cash(MovementType::Income, dec!(1));
    long.concept = "x".repeat(MAX_CONCEPT_LEN + 1);
    let err = service
        .create_movement(&actor, day_id, long)
        .await
        .unwrap_err();
    assert!(matches!(err, CashError::ConceptTooLong { .. }));
    assert_eq!(err.http_status_code(), 400);
    assert_eq!(service.list_movements(&actor, day_id).await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_racing_movements_snapshots_committed_cash() {
    const WRITERS: usize = 12;
    let (service, _) = service();
    let service = Arc::new(service);
    let actor = cashier(BranchId::new());
    let opening = dec!(1000);
    let day_id = service
        .open_day(&actor, actor.branch_id, date(), opening)
        .await
        .unwrap()
        .day
        .id;
    let barrier = Arc::new(Barrier::new(WRITERS + 1));

    let writers: Vec<_> = (0..WRITERS)
        .map(|i| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            let movement_type = if i % 3 == 0 {
                MovementType::Expense
            } else {
                MovementType::Income
            };
            let mut input = cash(movement_type, Decimal::from(10 * (i + 1)));
            if i % 4 == 0 {
                input.method = PaymentMethod::Card;
            }
            tokio::spawn(async move {
                barrier.wait().await;
                service.create_movement(&actor, day_id, input).await
            })
        })
        .collect();
    let closer = {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            barrier.wait().await;
            service
                .close_day(&actor, actor.branch_id, date(), count(dec!(0)))
                .await
        })
    };

    let mut committed = Vec::new();
    for joined in join_all(writers).await {
        match joined.unwrap() {
            Ok(resolved) => committed.push(resolved.movement.id),
            Err(CashError::InvalidState {
                status: CashDayStatus::Closed,
                ..
            }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    let closed = closer.await.unwrap().unwrap();
    assert_eq!(closed.day.status(), CashDayStatus::Closed);

    let stored = service.list_movements(&actor, day_id).await.unwrap();
    let mut stored_ids: Vec<CashMovementId> = stored.iter().map(|r| r.movement.id).collect();
    stored_ids.sort();
    committed.sort();
    assert_eq!(stored_ids, committed);

    let cash_flow: Decimal = stored
        .iter()
        .filter(|r| r.movement.method == PaymentMethod::Cash)
        .map(|r| r.movement.signed_amount())
        .sum();
    assert_eq!(closed.expected_cash, opening + cash_flow);
    assert_eq!(closed.diff_cash, Some(-(opening + cash_flow)));
}

#[tokio::test]
async fn test_list_movements_keeps_voided_and_resolves_names() {
    let (service, directory) = service();
    let actor = cashier(BranchId::new());
    let day = service
        .get_or_create_day(&actor, actor.branch_id, date())
        .await
        .unwrap();

    let sales = CategoryId::new();
    let orphan = CategoryId::new();
    directory.insert(actor.branch_id, sales, "Sales");

    let mut sale = cash(MovementType::Income, dec!(40));
    sale.category_id = Some(sales);
    let sale = service
        .create_movement(&actor, day.day.id, sale)
        .await
        .unwrap();
    assert_eq!(sale.category_name.as_deref(), Some("Sales"));

    let mut misc = cash(MovementType::Expense, dec!(5));
    misc.method = PaymentMethod::Card;
    misc.category_id = Some(orphan);
    let misc = service
        .create_movement(&actor, day.day.id, misc)
        .await
        .unwrap();
    service
        .void_movement(&actor, misc.movement.id, None)
        .await
        .unwrap();

    let listed = service.list_movements(&actor, day.day.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].movement.id, sale.movement.id);
    assert!(listed[1].movement.is_voided());
    assert_eq!(listed[1].category_name, Some(orphan.to_string()));
}

struct FailingDirectory;

impl CategoryDirectory for FailingDirectory {
    async fn resolve_category_name(
        &self,
        _branch_id: BranchId,
        _category_id: CategoryId,
    ) -> Result<Option<String>, DirectoryError> {
        Err(DirectoryError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_directory_failure_falls_back_to_raw_id() {
    let service = CashLedgerService::new(
        Arc::new(InMemoryCashStore::new()),
        Arc::new(FailingDirectory),
    );
    let actor = cashier(BranchId::new());
    let day = service
        .get_or_create_day(&actor, actor.branch_id, date())
        .await
        .unwrap();
    let category = CategoryId::new();
    let mut input = cash(MovementType::Income, dec!(10));
    input.category_id = Some(category);
    service
        .create_movement(&actor, day.day.id, input)
        .await
        .unwrap();

    let report = service
        .get_summary(&actor, actor.branch_id, date())
        .await
        .unwrap();
    assert_eq!(report.summary.by_category.len(), 1);
    assert_eq!(report.summary.by_category[0].name, category.to_string());
}

#[tokio::test]
async fn test_summary_rollups() {
    let (service, _) = service();
    let actor = cashier(BranchId::new());
    let (day_id, _) = standard_day(&service, &actor).await;
    let mut card = cash(MovementType::Income, dec!(300));
    card.method = PaymentMethod::Card;
    service
        .create_movement(&actor, day_id, card)
        .await
        .unwrap();

    let report = service
        .get_summary(&actor, actor.branch_id, date())
        .await
        .unwrap();
    assert_eq!(report.summary.totals.income, dec!(5300));
    assert_eq!(report.summary.totals.expense, dec!(2000));
    assert_eq!(report.summary.totals.net, dec!(3300));
    assert_eq!(report.summary.by_method.len(), 2);
    assert_eq!(report.summary.by_method[0].method, PaymentMethod::Cash);
    assert_eq!(report.summary.by_method[1].totals.income, dec!(300));
    assert_eq!(report.day.expected_cash, dec!(13000));
}

#[tokio::test]
async fn test_opening_cash_audit_trail() {
    let (service, _) = service();
    let actor = cashier(BranchId::new());
    let day = service
        .open_day(&actor, actor.branch_id, date(), dec!(200))
        .await
        .unwrap();
    service
        .set_opening_cash(&actor, day.day.id, dec!(200))
        .await
        .unwrap();
    let updated = service
        .set_opening_cash(&actor, day.day.id, dec!(250))
        .await
        .unwrap();
    assert_eq!(updated.day.opening_cash, dec!(250));
    assert_eq!(updated.expected_cash, dec!(250));

    let err = service
        .set_opening_cash(&actor, day.day.id, dec!(-1))
        .await
        .unwrap_err();
    assert!(matches!(err, CashError::InvalidAmount { .. }));

    let actions: Vec<AuditAction> = service
        .list_audit(&actor, day.day.id)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::Opened,
            AuditAction::OpeningCashSet,
            AuditAction::OpeningCashSet
        ]
    );
}

#[tokio::test]
async fn test_annotations_on_closed_day() {
    let (service, _) = service();
    let branch = BranchId::new();
    let actor = cashier(branch);
    let (day_id, _) = standard_day(&service, &actor).await;
    service
        .close_day(&actor, branch, date(), count(dec!(12900)))
        .await
        .unwrap();

    let err = service
        .annotate_day(&actor, day_id, Some("missing 100".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, CashError::Forbidden(_)));

    let boss = admin(branch);
    let err = service
        .annotate_day(&boss, day_id, Some("  ".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, CashError::MissingNote));

    let entry = service
        .annotate_day(&boss, day_id, Some("missing 100 found in safe".to_string()))
        .await
        .unwrap();
    assert_eq!(entry.action, AuditAction::Annotated);

    let audit = service.list_audit(&actor, day_id).await.unwrap();
    assert_eq!(audit.last().map(|e| e.action), Some(AuditAction::Annotated));
    assert!(audit.iter().any(|e| e.action == AuditAction::Closed));

    let report = service.get_summary(&actor, branch, date()).await.unwrap();
    assert_eq!(report.day.diff_cash, Some(dec!(-100)));
}

#[tokio::test]
async fn test_cross_branch_access_is_denied() {
    let (service, _) = service();
    let home = BranchId::new();
    let actor = cashier(home);
    let (day_id, expense) = standard_day(&service, &actor).await;

    let stranger = cashier(BranchId::new());
    assert!(matches!(
        service.get_or_create_day(&stranger, home, date()).await,
        Err(CashError::BranchAccessDenied(_))
    ));
    assert!(matches!(
        service.list_movements(&stranger, day_id).await,
        Err(CashError::BranchAccessDenied(_))
    ));
    assert!(matches!(
        service.void_movement(&stranger, expense, None).await,
        Err(CashError::BranchAccessDenied(_))
    ));

    let regional_admin = admin(BranchId::new());
    assert!(service.list_movements(&regional_admin, day_id).await.is_ok());
}

#[tokio::test]
async fn test_list_days_rejects_inverted_range() {
    let (service, _) = service();
    let actor = cashier(BranchId::new());
    let err = service
        .list_days(
            &actor,
            actor.branch_id,
            NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(),
            date(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CashError::InvalidRange { .. }));
}

#[tokio::test]
async fn test_today_uses_business_timezone() {
    let (service, _) = service();
    let service = service.with_business_timezone(chrono_tz::America::Guayaquil);
    let actor = cashier(BranchId::new());
    let today = service
        .get_or_create_today(&actor, actor.branch_id)
        .await
        .unwrap();
    let expected = super::calendar::business_date(chrono::Utc::now(), service.business_timezone());
    // Tolerate a midnight rollover between the two clock reads.
    assert!(
        today.day.date_key == expected || today.day.date_key.succ_opt() == Some(expected)
    );
}
