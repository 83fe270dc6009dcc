//! Property-based tests for the summary aggregator.
//!
//! - Expected cash equals opening plus signed non-voided cash flow.
//! - Aggregation is independent of movement order.
//! - Voided movements never contribute.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;

use cashbook_shared::types::{CashDayId, CashMovementId, CategoryId, UserId};

use super::summary::SummaryAggregator;
use super::types::{CashMovement, MovementType, PaymentMethod, VoidStamp};

/// Strategy to generate positive amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate non-negative opening balances.
fn opening_amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn movement_type() -> impl Strategy<Value = MovementType> {
    prop_oneof![Just(MovementType::Income), Just(MovementType::Expense)]
}

fn method() -> impl Strategy<Value = PaymentMethod> {
    prop_oneof![
        Just(PaymentMethod::Cash),
        Just(PaymentMethod::Transfer),
        Just(PaymentMethod::Card),
        Just(PaymentMethod::Other),
    ]
}

/// Strategy for one movement, voided or not, in one of three categories.
fn movement() -> impl Strategy<Value = CashMovement> {
    (movement_type(), method(), positive_amount(), any::<bool>(), 0u8..3).prop_map(
        |(movement_type, method, amount, is_voided, category)| CashMovement {
            id: CashMovementId::new(),
            cash_day_id: CashDayId::new(),
            movement_type,
            method,
            amount,
            category_id: (category > 0)
                .then(|| CategoryId::from_uuid(uuid::Uuid::from_u128(u128::from(category)))),
            concept: "prop".to_string(),
            note: None,
            void: is_voided.then(|| VoidStamp {
                reason: None,
                voided_at: Utc::now(),
                voided_by: UserId::new(),
            }),
            created_at: Utc::now(),
            created_by: UserId::new(),
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_expected_cash_matches_formula(
        opening in opening_amount(),
        movements in prop::collection::vec(movement(), 0..40),
    ) {
        let mut expected = opening;
        for m in movements.iter().filter(|m| !m.is_voided() && m.method == PaymentMethod::Cash) {
            match m.movement_type {
                MovementType::Income => expected += m.amount,
                MovementType::Expense => expected -= m.amount,
            }
        }
        prop_assert_eq!(SummaryAggregator::expected_cash(opening, &movements).unwrap(), expected);
    }

    #[test]
    fn prop_summary_is_order_independent(
        opening in opening_amount(),
        movements in prop::collection::vec(movement(), 0..40),
    ) {
        let mut reversed = movements.clone();
        reversed.reverse();
        let names = HashMap::new();
        prop_assert_eq!(
            SummaryAggregator::summarize(opening, &movements, &names).unwrap(),
            SummaryAggregator::summarize(opening, &reversed, &names).unwrap()
        );
    }

    #[test]
    fn prop_voided_movements_never_contribute(
        opening in opening_amount(),
        movements in prop::collection::vec(movement(), 0..40),
    ) {
        let active: Vec<CashMovement> =
            movements.iter().filter(|m| !m.is_voided()).cloned().collect();
        let names = HashMap::new();
        prop_assert_eq!(
            SummaryAggregator::summarize(opening, &movements, &names).unwrap(),
            SummaryAggregator::summarize(opening, &active, &names).unwrap()
        );
    }

    #[test]
    fn prop_method_rows_partition_totals(
        movements in prop::collection::vec(movement(), 0..40),
    ) {
        let summary =
            SummaryAggregator::summarize(Decimal::ZERO, &movements, &HashMap::new()).unwrap();
        let income: Decimal = summary.by_method.iter().map(|m| m.totals.income).sum();
        let expense: Decimal = summary.by_method.iter().map(|m| m.totals.expense).sum();
        let count: usize = summary.by_category.iter().map(|c| c.totals.count).sum();
        prop_assert_eq!(income, summary.totals.income);
        prop_assert_eq!(expense, summary.totals.expense);
        prop_assert_eq!(count, summary.totals.count);
        prop_assert_eq!(summary.totals.net, summary.totals.income - summary.totals.expense);
    }
}
