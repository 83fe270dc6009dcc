//! Summary aggregation over a day's movements.
//!
//! Everything here is pure: callers resolve category names first and pass
//! them in, so aggregation never blocks. Sums are checked; an overflow is an
//! internal error rather than a panic. Voided movements are skipped (never
//! negated).

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use cashbook_shared::types::CategoryId;

use super::error::CashError;
use super::types::{CashDay, CashDayView, CashMovement, MovementType, PaymentMethod};

/// Label used for movements without a category.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// Income/expense totals for a set of movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    /// Sum of income amounts.
    pub income: Decimal,
    /// Sum of expense amounts.
    pub expense: Decimal,
    /// `income - expense`.
    pub net: Decimal,
    /// Number of contributing movements.
    pub count: usize,
}

impl Totals {
    fn add(&mut self, movement: &CashMovement) -> Result<(), CashError> {
        match movement.movement_type {
            MovementType::Income => self.income = checked_sum(self.income, movement.amount)?,
            MovementType::Expense => self.expense = checked_sum(self.expense, movement.amount)?,
        }
        self.net = self
            .income
            .checked_sub(self.expense)
            .ok_or_else(|| overflow("net"))?;
        self.count += 1;
        Ok(())
    }
}

fn checked_sum(acc: Decimal, amount: Decimal) -> Result<Decimal, CashError> {
    acc.checked_add(amount).ok_or_else(|| overflow("sum"))
}

fn overflow(what: &str) -> CashError {
    CashError::Internal(format!("decimal overflow computing {what}"))
}

/// Rollup for one payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSummary {
    /// Payment method.
    pub method: PaymentMethod,
    /// Totals for the method.
    #[serde(flatten)]
    pub totals: Totals,
}

/// Rollup for one category (or the uncategorized bucket).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    /// Category, `None` for the uncategorized bucket.
    pub category_id: Option<CategoryId>,
    /// Display name.
    pub name: String,
    /// Totals for the category.
    #[serde(flatten)]
    pub totals: Totals,
}

/// Full rollup for a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    /// Day totals.
    pub totals: Totals,
    /// One row per method present, in `CASH, TRANSFER, CARD, OTHER` order.
    pub by_method: Vec<MethodSummary>,
    /// Uncategorized first, then by category id.
    pub by_category: Vec<CategorySummary>,
    /// Opening balance plus net cash flow.
    pub expected_cash: Decimal,
}

/// A day view plus its rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayReport {
    /// Day with derived cash figures.
    pub day: CashDayView,
    /// Movement rollup.
    pub summary: DaySummary,
}

/// Stateless summary aggregator.
pub struct SummaryAggregator;

impl SummaryAggregator {
    fn active(movements: &[CashMovement]) -> impl Iterator<Item = &CashMovement> {
        movements.iter().filter(|m| !m.is_voided())
    }

    /// Income/expense totals over non-voided movements.
    ///
    /// # Errors
    /// `Internal` if a sum overflows.
    pub fn totals(movements: &[CashMovement]) -> Result<Totals, CashError> {
        let mut totals = Totals::default();
        for movement in Self::active(movements) {
            totals.add(movement)?;
        }
        Ok(totals)
    }

    /// `opening + cash income - cash expense` over non-voided movements.
    ///
    /// # Errors
    /// `Internal` if the running balance overflows.
    pub fn expected_cash(
        opening_cash: Decimal,
        movements: &[CashMovement],
    ) -> Result<Decimal, CashError> {
        Self::active(movements)
            .filter(|m| m.method == PaymentMethod::Cash)
            .try_fold(opening_cash, |acc, m| checked_sum(acc, m.signed_amount()))
    }

    /// Builds the full rollup.
    ///
    /// `names` maps category ids to display names; ids missing from it fall
    /// back to their raw string form.
    ///
    /// # Errors
    /// `Internal` if a sum overflows.
    pub fn summarize(
        opening_cash: Decimal,
        movements: &[CashMovement],
        names: &HashMap<CategoryId, String>,
    ) -> Result<DaySummary, CashError> {
        let mut totals = Totals::default();
        let mut by_method: BTreeMap<PaymentMethod, Totals> = BTreeMap::new();
        let mut by_category: BTreeMap<Option<CategoryId>, Totals> = BTreeMap::new();

        for movement in Self::active(movements) {
            totals.add(movement)?;
            by_method.entry(movement.method).or_default().add(movement)?;
            by_category.entry(movement.category_id).or_default().add(movement)?;
        }

        Ok(DaySummary {
            totals,
            by_method: by_method
                .into_iter()
                .map(|(method, totals)| MethodSummary { method, totals })
                .collect(),
            by_category: by_category
                .into_iter()
                .map(|(category_id, totals)| CategorySummary {
                    name: Self::category_label(category_id, names),
                    category_id,
                    totals,
                })
                .collect(),
            expected_cash: Self::expected_cash(opening_cash, movements)?,
        })
    }

    /// Projects the derived cash figures for a day.
    ///
    /// Open days are computed live; closed days report their close snapshot.
    ///
    /// # Errors
    /// `Internal` if the live balance overflows.
    pub fn project(day: &CashDay, movements: &[CashMovement]) -> Result<CashDayView, CashError> {
        let (expected_cash, diff_cash) = match &day.closing {
            Some(closing) => (closing.expected_cash, closing.diff_cash),
            None => (Self::expected_cash(day.opening_cash, movements)?, None),
        };
        Ok(CashDayView {
            day: day.clone(),
            expected_cash,
            diff_cash,
        })
    }

    /// Builds the day view and its rollup together.
    ///
    /// # Errors
    /// `Internal` if a sum overflows.
    pub fn report(
        day: &CashDay,
        movements: &[CashMovement],
        names: &HashMap<CategoryId, String>,
    ) -> Result<DayReport, CashError> {
        let view = Self::project(day, movements)?;
        let mut summary = Self::summarize(day.opening_cash, movements, names)?;
        summary.expected_cash = view.expected_cash;
        Ok(DayReport { day: view, summary })
    }

    /// Display label for a category bucket: the resolved name, the raw id
    /// when unresolved, or [`UNCATEGORIZED_LABEL`].
    #[must_use]
    pub fn category_label(
        category_id: Option<CategoryId>,
        names: &HashMap<CategoryId, String>,
    ) -> String {
        match category_id {
            None => UNCATEGORIZED_LABEL.to_string(),
            Some(id) => names.get(&id).cloned().unwrap_or_else(|| id.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cash::types::{ClosingRecord, VoidStamp};
    use cashbook_shared::types::{BranchId, CashDayId, CashMovementId, UserId};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn movement(
        movement_type: MovementType,
        method: PaymentMethod,
        amount: Decimal,
        category_id: Option<CategoryId>,
    ) -> CashMovement {
        CashMovement {
            id: CashMovementId::new(),
            cash_day_id: CashDayId::new(),
            movement_type,
            method,
            amount,
            category_id,
            concept: "test".to_string(),
            note: None,
            void: None,
            created_at: Utc::now(),
            created_by: UserId::new(),
        }
    }

    fn voided(mut m: CashMovement) -> CashMovement {
        m.void = Some(VoidStamp {
            reason: None,
            voided_at: Utc::now(),
            voided_by: UserId::new(),
        });
        m
    }

    #[test]
    fn test_expected_cash_only_counts_cash_method() {
        let movements = vec![
            movement(MovementType::Income, PaymentMethod::Cash, dec!(5000), None),
            movement(MovementType::Expense, PaymentMethod::Cash, dec!(2000), None),
            movement(MovementType::Income, PaymentMethod::Card, dec!(700), None),
            movement(MovementType::Expense, PaymentMethod::Transfer, dec!(300), None),
        ];
        assert_eq!(
            SummaryAggregator::expected_cash(dec!(10000), &movements).unwrap(),
            dec!(13000)
        );
    }

    #[test]
    fn test_voided_movements_are_excluded() {
        let movements = vec![
            movement(MovementType::Income, PaymentMethod::Cash, dec!(5000), None),
            voided(movement(MovementType::Expense, PaymentMethod::Cash, dec!(2000), None)),
        ];
        assert_eq!(
            SummaryAggregator::expected_cash(dec!(10000), &movements).unwrap(),
            dec!(15000)
        );
        let totals = SummaryAggregator::totals(&movements).unwrap();
        assert_eq!(totals.expense, Decimal::ZERO);
        assert_eq!(totals.count, 1);
    }

    #[test]
    fn test_totals_net() {
        let movements = vec![
            movement(MovementType::Income, PaymentMethod::Card, dec!(120.50), None),
            movement(MovementType::Expense, PaymentMethod::Other, dec!(20.25), None),
        ];
        let totals = SummaryAggregator::totals(&movements).unwrap();
        assert_eq!(totals.income, dec!(120.50));
        assert_eq!(totals.expense, dec!(20.25));
        assert_eq!(totals.net, dec!(100.25));
        assert_eq!(totals.count, 2);
    }

    #[test]
    fn test_by_method_is_ordered_and_sparse() {
        let movements = vec![
            movement(MovementType::Income, PaymentMethod::Other, dec!(1), None),
            movement(MovementType::Income, PaymentMethod::Cash, dec!(2), None),
            movement(MovementType::Income, PaymentMethod::Card, dec!(3), None),
        ];
        let summary =
            SummaryAggregator::summarize(Decimal::ZERO, &movements, &HashMap::new()).unwrap();
        let methods: Vec<_> = summary.by_method.iter().map(|m| m.method).collect();
        assert_eq!(
            methods,
            vec![PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Other]
        );
    }

    #[test]
    fn test_by_category_labels_and_order() {
        let food = CategoryId::new();
        let unknown = CategoryId::new();
        let names = HashMap::from([(food, "Food".to_string())]);
        let movements = vec![
            movement(MovementType::Income, PaymentMethod::Cash, dec!(10), Some(food)),
            movement(MovementType::Income, PaymentMethod::Cash, dec!(5), None),
            movement(MovementType::Expense, PaymentMethod::Cash, dec!(4), Some(unknown)),
            movement(MovementType::Income, PaymentMethod::Cash, dec!(6), Some(food)),
        ];
        let summary = SummaryAggregator::summarize(Decimal::ZERO, &movements, &names).unwrap();

        assert_eq!(summary.by_category.len(), 3);
        assert_eq!(summary.by_category[0].category_id, None);
        assert_eq!(summary.by_category[0].name, UNCATEGORIZED_LABEL);

        let food_row = summary
            .by_category
            .iter()
            .find(|c| c.category_id == Some(food))
            .unwrap();
        assert_eq!(food_row.name, "Food");
        assert_eq!(food_row.totals.income, dec!(16));
        assert_eq!(food_row.totals.count, 2);

        let unknown_row = summary
            .by_category
            .iter()
            .find(|c| c.category_id == Some(unknown))
            .unwrap();
        assert_eq!(unknown_row.name, unknown.to_string());
    }

    #[test]
    fn test_empty_day_summary() {
        let summary = SummaryAggregator::summarize(dec!(250), &[], &HashMap::new()).unwrap();
        assert_eq!(summary.totals, Totals::default());
        assert!(summary.by_method.is_empty());
        assert!(summary.by_category.is_empty());
        assert_eq!(summary.expected_cash, dec!(250));
    }

    #[test]
    fn test_project_closed_day_uses_snapshot() {
        let mut day = CashDay::open(
            BranchId::new(),
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            UserId::new(),
            Utc::now(),
        );
        day.opening_cash = dec!(100);
        day.closing = Some(ClosingRecord {
            counted_cash: Some(dec!(90)),
            expected_cash: dec!(95),
            diff_cash: Some(dec!(-5)),
            admin_override: false,
            note: None,
            closed_at: Utc::now(),
            closed_by: UserId::new(),
        });
        let view = SummaryAggregator::project(&day, &[]).unwrap();
        assert_eq!(view.expected_cash, dec!(95));
        assert_eq!(view.diff_cash, Some(dec!(-5)));
    }

    #[test]
    fn test_project_open_day_is_live() {
        let mut day = CashDay::open(
            BranchId::new(),
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            UserId::new(),
            Utc::now(),
        );
        day.opening_cash = dec!(100);
        let movements = vec![movement(
            MovementType::Income,
            PaymentMethod::Cash,
            dec!(40),
            None,
        )];
        let view = SummaryAggregator::project(&day, &movements).unwrap();
        assert_eq!(view.expected_cash, dec!(140));
        assert_eq!(view.diff_cash, None);
    }

    #[test]
    fn test_overflowing_sums_are_internal_errors() {
        let movements = vec![
            movement(MovementType::Income, PaymentMethod::Cash, Decimal::MAX, None),
            movement(MovementType::Income, PaymentMethod::Cash, Decimal::MAX, None),
        ];
        assert!(matches!(
            SummaryAggregator::totals(&movements),
            Err(CashError::Internal(_))
        ));
        assert!(matches!(
            SummaryAggregator::expected_cash(Decimal::ZERO, &movements),
            Err(CashError::Internal(_))
        ));
        assert!(matches!(
            SummaryAggregator::summarize(Decimal::ZERO, &movements, &HashMap::new()),
            Err(CashError::Internal(_))
        ));
    }
}
