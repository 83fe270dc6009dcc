//! Movement recording and voiding rules.

use chrono::{DateTime, Utc};
use cashbook_shared::types::{CashMovementId, UserId};

use super::error::{AmountRule, CashError, MAX_CONCEPT_LEN};
use super::types::{normalize_text, CashDay, CashMovement, CreateMovementInput, VoidStamp};

/// Stateless validator for movement writes.
pub struct MovementRecorder;

impl MovementRecorder {
    /// Validates the input and builds the movement to append.
    ///
    /// Never touches the day itself.
    ///
    /// # Errors
    /// * `InvalidState` if the day is closed
    /// * `InvalidAmount` if `amount <= 0` or does not fit the stored precision
    /// * `MissingConcept` if the concept is blank
    /// * `ConceptTooLong` past [`MAX_CONCEPT_LEN`] characters
    pub fn prepare(
        day: &CashDay,
        input: CreateMovementInput,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<CashMovement, CashError> {
        if !day.is_open() {
            return Err(CashError::InvalidState {
                operation: "record a movement",
                status: day.status(),
            });
        }
        let amount = AmountRule::Positive.check("amount", input.amount)?;
        let concept = input.concept.trim();
        if concept.is_empty() {
            return Err(CashError::MissingConcept);
        }
        let len = concept.chars().count();
        if len > MAX_CONCEPT_LEN {
            return Err(CashError::ConceptTooLong {
                len,
                max: MAX_CONCEPT_LEN,
            });
        }

        Ok(CashMovement {
            id: CashMovementId::new(),
            cash_day_id: day.id,
            movement_type: input.movement_type,
            method: input.method,
            amount,
            category_id: input.category_id,
            concept: concept.to_string(),
            note: normalize_text(input.note),
            void: None,
            created_at: now,
            created_by,
        })
    }

    /// Validates a void and builds its stamp.
    ///
    /// # Errors
    /// * `AlreadyVoided` if the movement carries a void stamp
    /// * `InvalidState` if the owning day is closed
    pub fn plan_void(
        day: &CashDay,
        movement: &CashMovement,
        reason: Option<String>,
        voided_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<VoidStamp, CashError> {
        if movement.is_voided() {
            return Err(CashError::AlreadyVoided(movement.id));
        }
        if !day.is_open() {
            return Err(CashError::InvalidState {
                operation: "void a movement",
                status: day.status(),
            });
        }
        Ok(VoidStamp {
            reason: normalize_text(reason),
            voided_at: now,
            voided_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cash::types::{ClosingRecord, MovementType, PaymentMethod};
    use cashbook_shared::types::{BranchId, CategoryId};
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn day() -> CashDay {
        CashDay::open(
            BranchId::new(),
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            UserId::new(),
            Utc::now(),
        )
    }

    fn closed(mut day: CashDay) -> CashDay {
        day.closing = Some(ClosingRecord {
            counted_cash: Some(Decimal::ZERO),
            expected_cash: Decimal::ZERO,
            diff_cash: Some(Decimal::ZERO),
            admin_override: false,
            note: None,
            closed_at: Utc::now(),
            closed_by: UserId::new(),
        });
        day
    }

    fn input(amount: Decimal, concept: &str) -> CreateMovementInput {
        CreateMovementInput {
            movement_type: MovementType::Income,
            method: PaymentMethod::Cash,
            amount,
            category_id: None,
            concept: concept.to_string(),
            note: None,
        }
    }

    #[test]
    fn test_prepare_trims_and_links_to_day() {
        let day = day();
        let category = CategoryId::new();
        let mut input = input(dec!(5000), "  Sale  ");
        input.category_id = Some(category);
        input.note = Some("   ".to_string());

        let movement = MovementRecorder::prepare(&day, input, UserId::new(), Utc::now()).unwrap();
        assert_eq!(movement.cash_day_id, day.id);
        assert_eq!(movement.concept, "Sale");
        assert_eq!(movement.note, None);
        assert_eq!(movement.category_id, Some(category));
        assert!(!movement.is_voided());
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-1))]
    #[case(dec!(-0.01))]
    fn test_non_positive_amount_rejected(#[case] amount: Decimal) {
        let err = MovementRecorder::prepare(&day(), input(amount, "x"), UserId::new(), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            CashError::InvalidAmount {
                rule: AmountRule::Positive,
                ..
            }
        ));
    }

    #[rstest]
    #[case(dec!(0.00001))]
    #[case(dec!(10.12345))]
    #[case(dec!(1000000000000000))]
    #[case(Decimal::MAX)]
    fn test_unstorable_amount_rejected(#[case] amount: Decimal) {
        let err = MovementRecorder::prepare(&day(), input(amount, "x"), UserId::new(), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            CashError::InvalidAmount {
                rule: AmountRule::Storable,
                ..
            }
        ));
    }

    #[test]
    fn test_amount_is_rescaled_to_stored_precision() {
        let movement = MovementRecorder::prepare(
            &day(),
            input(dec!(10.12340), "x"),
            UserId::new(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(movement.amount, dec!(10.1234));
        assert_eq!(movement.amount.scale(), 4);
    }

    #[test]
    fn test_concept_length_limit_counts_characters() {
        let at_limit = "é".repeat(MAX_CONCEPT_LEN);
        let movement = MovementRecorder::prepare(
            &day(),
            input(dec!(1), &format!("  {at_limit}  ")),
            UserId::new(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(movement.concept, at_limit);

        let too_long = "a".repeat(MAX_CONCEPT_LEN + 1);
        let err =
            MovementRecorder::prepare(&day(), input(dec!(1), &too_long), UserId::new(), Utc::now())
                .unwrap_err();
        assert!(matches!(err, CashError::ConceptTooLong { len: 201, max: 200 }));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn test_blank_concept_rejected(#[case] concept: &str) {
        let err =
            MovementRecorder::prepare(&day(), input(dec!(1), concept), UserId::new(), Utc::now())
                .unwrap_err();
        assert!(matches!(err, CashError::MissingConcept));
    }

    #[test]
    fn test_prepare_on_closed_day_rejected() {
        let err = MovementRecorder::prepare(
            &closed(day()),
            input(dec!(1), "x"),
            UserId::new(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CashError::InvalidState { .. }));
    }

    #[test]
    fn test_void_stamp() {
        let day = day();
        let movement =
            MovementRecorder::prepare(&day, input(dec!(10), "x"), UserId::new(), Utc::now())
                .unwrap();
        let stamp = MovementRecorder::plan_void(
            &day,
            &movement,
            Some(" typo ".to_string()),
            UserId::new(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(stamp.reason.as_deref(), Some("typo"));
    }

    #[test]
    fn test_already_voided_wins_over_closed_day() {
        let open = day();
        let mut movement =
            MovementRecorder::prepare(&open, input(dec!(10), "x"), UserId::new(), Utc::now())
                .unwrap();
        movement.void = Some(
            MovementRecorder::plan_void(&open, &movement, None, UserId::new(), Utc::now())
                .unwrap(),
        );
        let err =
            MovementRecorder::plan_void(&closed(open), &movement, None, UserId::new(), Utc::now())
                .unwrap_err();
        assert!(matches!(err, CashError::AlreadyVoided(id) if id == movement.id));
    }

    #[test]
    fn test_void_on_closed_day_rejected() {
        let open = day();
        let movement =
            MovementRecorder::prepare(&open, input(dec!(10), "x"), UserId::new(), Utc::now())
                .unwrap();
        let err =
            MovementRecorder::plan_void(&closed(open), &movement, None, UserId::new(), Utc::now())
                .unwrap_err();
        assert!(matches!(err, CashError::InvalidState { .. }));
    }
}
