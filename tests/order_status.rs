use canteen_api::models::{OrderStatus, PaymentMethod, PaymentStatus, redact_card_number};
use canteen_api::services::payment_service::new_transaction_id;

use OrderStatus::*;

#[test]
fn lifecycle_accepts_the_forward_path() {
    assert!(Pending.can_transition_to(InProgress));
    assert!(InProgress.can_transition_to(Ready));
    assert!(Ready.can_transition_to(Completed));
}

#[test]
fn cancellation_is_allowed_from_any_open_state() {
    assert!(Pending.can_transition_to(Cancelled));
    assert!(InProgress.can_transition_to(Cancelled));
    assert!(Ready.can_transition_to(Cancelled));
    assert!(!Completed.can_transition_to(Cancelled));
}

#[test]
fn skipping_or_reversing_states_is_rejected() {
    assert!(!Pending.can_transition_to(Ready));
    assert!(!Pending.can_transition_to(Completed));
    assert!(!InProgress.can_transition_to(Pending));
    assert!(!Ready.can_transition_to(InProgress));
    assert!(!Completed.can_transition_to(Pending));
    assert!(!Cancelled.can_transition_to(InProgress));
}

#[test]
fn reapplying_the_same_status_is_a_no_op() {
    for status in [Pending, InProgress, Ready, Completed, Cancelled] {
        assert!(status.can_transition_to(status));
    }
}

#[test]
fn terminal_states_are_terminal() {
    assert!(Completed.is_terminal());
    assert!(Cancelled.is_terminal());
    assert!(!Pending.is_terminal());
    assert!(!InProgress.is_terminal());
    assert!(!Ready.is_terminal());
}

#[test]
fn status_strings_round_trip() {
    for status in [Pending, InProgress, Ready, Completed, Cancelled] {
        assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(OrderStatus::parse("shipped"), None);
}

#[test]
fn payment_methods_parse_and_classify() {
    assert_eq!(PaymentMethod::parse("card"), Some(PaymentMethod::Card));
    assert_eq!(
        PaymentMethod::parse("mobile_banking"),
        Some(PaymentMethod::MobileBanking)
    );
    assert_eq!(
        PaymentMethod::parse("cash_on_delivery"),
        Some(PaymentMethod::CashOnDelivery)
    );
    assert_eq!(
        PaymentMethod::parse("pickup_from_canteen"),
        Some(PaymentMethod::PickupFromCanteen)
    );
    assert_eq!(PaymentMethod::parse("cheque"), None);

    assert!(PaymentMethod::CashOnDelivery.is_offline());
    assert!(PaymentMethod::PickupFromCanteen.is_offline());
    assert!(!PaymentMethod::Card.is_offline());
    assert!(!PaymentMethod::MobileBanking.is_offline());
}

#[test]
fn payment_status_strings_round_trip() {
    for status in [
        PaymentStatus::Pending,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ] {
        assert_eq!(PaymentStatus::parse(status.as_str()), Some(status));
    }
}

#[test]
fn transaction_ids_have_the_txn_shape() {
    let id = new_transaction_id();
    assert!(id.starts_with("TXN"));
    assert_eq!(id.len(), 11);
    let suffix = &id[3..];
    assert!(
        suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    );

    let other = new_transaction_id();
    assert_ne!(id, other);
}

#[test]
fn card_numbers_keep_only_the_last_four_digits() {
    assert_eq!(
        redact_card_number("4242 4242 4242 4242"),
        "**** **** **** 4242"
    );
    assert_eq!(redact_card_number("4111-1111-1111-1234"), "**** **** **** 1234");
    assert_eq!(redact_card_number("123"), "123");
}
