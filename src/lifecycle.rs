//! Quotation and booking status rules.
//!
//! Status changes are decided by the upstream. These rules only decide which
//! actions a view may offer and reject requests that the upstream would
//! refuse anyway, before a round trip is spent on them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::booking::{Booking, NewPayment};
use crate::models::order::DispatchLine;
use crate::models::quotation::Quotation;

/// Tolerance for comparing money amounts rounded to paise.
const AMOUNT_EPSILON: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
    Pending,
    Booked,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationAction {
    Edit,
    Book,
    Cancel,
}

impl QuotationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QuotationStatus::Pending => "pending",
            QuotationStatus::Booked => "booked",
            QuotationStatus::Canceled => "canceled",
        }
    }

    /// Pending → pending covers an in-place edit.
    pub fn can_transition_to(self, next: QuotationStatus) -> bool {
        matches!(
            (self, next),
            (QuotationStatus::Pending, QuotationStatus::Pending)
                | (QuotationStatus::Pending, QuotationStatus::Booked)
                | (QuotationStatus::Pending, QuotationStatus::Canceled)
        )
    }

    pub fn allows(self, action: QuotationAction) -> bool {
        let target = match action {
            QuotationAction::Edit => QuotationStatus::Pending,
            QuotationAction::Book => QuotationStatus::Booked,
            QuotationAction::Cancel => QuotationStatus::Canceled,
        };
        self.can_transition_to(target)
    }

    pub fn actions(self) -> Vec<QuotationAction> {
        [QuotationAction::Edit, QuotationAction::Book, QuotationAction::Cancel]
            .into_iter()
            .filter(|a| self.allows(*a))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Booked,
    Paid,
    Dispatched,
    Delivered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    RecordPayment,
    Dispatch,
    Deliver,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Booked => "booked",
            BookingStatus::Paid => "paid",
            BookingStatus::Dispatched => "dispatched",
            BookingStatus::Delivered => "delivered",
        }
    }

    /// Dispatched → dispatched is a further partial dispatch.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Booked, BookingStatus::Paid)
                | (BookingStatus::Paid, BookingStatus::Dispatched)
                | (BookingStatus::Dispatched, BookingStatus::Dispatched)
                | (BookingStatus::Dispatched, BookingStatus::Delivered)
        )
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("Quotation {id} is {status} and can no longer be changed")]
    QuotationLocked { id: String, status: &'static str },

    #[error("Booking {id} is {status}; payments are only recorded while booked")]
    NotPayable { id: String, status: &'static str },

    #[error("Select the admin who received the payment")]
    MissingAdmin,

    #[error("Payment amount must be greater than 0")]
    InvalidAmount,

    #[error("Payment of {amount:.2} exceeds the balance of {balance:.2}")]
    ExceedsBalance { amount: f64, balance: f64 },

    #[error("Booking {id} is {status} and cannot be dispatched")]
    NotDispatchable { id: String, status: &'static str },

    #[error("Select at least one product quantity to dispatch")]
    EmptyDispatch,

    #[error("Product {0} is not part of this booking")]
    UnknownLine(String),

    #[error("Cannot dispatch {requested} of {serial}; only {remaining} remaining")]
    ExceedsRemaining { serial: String, requested: u32, remaining: u32 },

    #[error("Booking {id} is {status} and cannot be marked delivered")]
    NotDeliverable { id: String, status: &'static str },

    #[error("Booking {0} still has undispatched products")]
    NotFullyDispatched(String),
}

impl TransitionError {
    /// True when the record's current state, not the request, is the problem.
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            TransitionError::QuotationLocked { .. }
                | TransitionError::NotPayable { .. }
                | TransitionError::NotDispatchable { .. }
                | TransitionError::NotDeliverable { .. }
                | TransitionError::NotFullyDispatched(_)
        )
    }
}

pub fn check_quotation(
    quotation: &Quotation,
    action: QuotationAction,
) -> Result<(), TransitionError> {
    if quotation.status.allows(action) {
        Ok(())
    } else {
        Err(TransitionError::QuotationLocked {
            id: quotation.id.clone(),
            status: quotation.status.as_str(),
        })
    }
}

pub fn booking_actions(booking: &Booking) -> Vec<BookingAction> {
    let mut actions = Vec::new();
    if validate_payment_state(booking).is_ok() && booking.balance() > 0.0 {
        actions.push(BookingAction::RecordPayment);
    }
    if validate_dispatch_state(booking).is_ok() && !booking.fully_dispatched() {
        actions.push(BookingAction::Dispatch);
    }
    if validate_delivery(booking).is_ok() {
        actions.push(BookingAction::Deliver);
    }
    actions
}

fn validate_payment_state(booking: &Booking) -> Result<(), TransitionError> {
    if booking.status.can_transition_to(BookingStatus::Paid) {
        Ok(())
    } else {
        Err(TransitionError::NotPayable {
            id: booking.id.clone(),
            status: booking.status.as_str(),
        })
    }
}

pub fn validate_payment(booking: &Booking, payment: &NewPayment) -> Result<(), TransitionError> {
    validate_payment_state(booking)?;
    if payment.admin.trim().is_empty() {
        return Err(TransitionError::MissingAdmin);
    }
    if !payment.amount.is_finite() || payment.amount <= 0.0 {
        return Err(TransitionError::InvalidAmount);
    }
    let balance = booking.balance();
    if payment.amount > balance + AMOUNT_EPSILON {
        return Err(TransitionError::ExceedsBalance {
            amount: payment.amount,
            balance,
        });
    }
    Ok(())
}

fn validate_dispatch_state(booking: &Booking) -> Result<(), TransitionError> {
    if booking.status.can_transition_to(BookingStatus::Dispatched) {
        Ok(())
    } else {
        Err(TransitionError::NotDispatchable {
            id: booking.id.clone(),
            status: booking.status.as_str(),
        })
    }
}

/// Lines with a zero quantity are ignored; at least one must remain.
pub fn validate_dispatch(booking: &Booking, lines: &[DispatchLine]) -> Result<(), TransitionError> {
    validate_dispatch_state(booking)?;

    let mut any = false;
    for requested in lines.iter().filter(|l| l.quantity > 0) {
        any = true;
        let line = booking
            .line(&requested.serial_number)
            .ok_or_else(|| TransitionError::UnknownLine(requested.serial_number.clone()))?;
        // A serial listed twice still has to fit in one remaining quantity.
        let total_requested: u32 = lines
            .iter()
            .filter(|l| l.serial_number == requested.serial_number)
            .map(|l| l.quantity)
            .sum();
        if total_requested > line.remaining() {
            return Err(TransitionError::ExceedsRemaining {
                serial: requested.serial_number.clone(),
                requested: total_requested,
                remaining: line.remaining(),
            });
        }
    }

    if any { Ok(()) } else { Err(TransitionError::EmptyDispatch) }
}

pub fn validate_delivery(booking: &Booking) -> Result<(), TransitionError> {
    if !booking.status.can_transition_to(BookingStatus::Delivered) {
        return Err(TransitionError::NotDeliverable {
            id: booking.id.clone(),
            status: booking.status.as_str(),
        });
    }
    if !booking.fully_dispatched() {
        return Err(TransitionError::NotFullyDispatched(booking.id.clone()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::booking::{BookingLine, PaymentMethod};
    use crate::models::customer::Customer;
    use crate::models::order::OrderLine;
    use crate::pricing::ExtraCharges;
    use chrono::Utc;

    pub(crate) fn sample_booking(status: BookingStatus) -> Booking {
        let line = |serial: &str, quantity: u32, dispatched_qty: u32| BookingLine {
            line: OrderLine {
                serial_number: serial.to_string(),
                product_name: format!("Product {serial}"),
                product_type: "gift_box".to_string(),
                per: "box".to_string(),
                price: 100.0,
                discount: 0.0,
                quantity,
            },
            dispatched_qty,
        };
        Booking {
            id: "b-1".to_string(),
            order_number: "GB-0001".to_string(),
            customer: Customer {
                name: "Meena".to_string(),
                mobile_number: "9876543210".to_string(),
                ..Default::default()
            },
            status,
            products: vec![line("FW-1", 4, 0), line("FW-2", 2, 0)],
            charges: ExtraCharges::default(),
            total: 600.0,
            amount_paid: 0.0,
            transactions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn payment(amount: f64, admin: &str) -> NewPayment {
        NewPayment {
            method: PaymentMethod::Cash,
            amount,
            admin: admin.to_string(),
        }
    }

    fn dispatch(serial: &str, quantity: u32) -> DispatchLine {
        DispatchLine {
            serial_number: serial.to_string(),
            quantity,
        }
    }

    #[test]
    fn quotation_actions_only_while_pending() {
        assert_eq!(
            QuotationStatus::Pending.actions(),
            vec![QuotationAction::Edit, QuotationAction::Book, QuotationAction::Cancel]
        );
        assert!(QuotationStatus::Booked.actions().is_empty());
        assert!(QuotationStatus::Canceled.actions().is_empty());
        assert!(!QuotationStatus::Canceled.can_transition_to(QuotationStatus::Pending));
    }

    #[test]
    fn booking_lifecycle_moves_forward_only() {
        assert!(BookingStatus::Booked.can_transition_to(BookingStatus::Paid));
        assert!(BookingStatus::Paid.can_transition_to(BookingStatus::Dispatched));
        assert!(BookingStatus::Dispatched.can_transition_to(BookingStatus::Dispatched));
        assert!(BookingStatus::Dispatched.can_transition_to(BookingStatus::Delivered));
        assert!(!BookingStatus::Booked.can_transition_to(BookingStatus::Dispatched));
        assert!(!BookingStatus::Delivered.can_transition_to(BookingStatus::Paid));
    }

    #[test]
    fn payment_requires_admin_and_fits_balance() {
        let mut booking = sample_booking(BookingStatus::Booked);
        booking.amount_paid = 100.0;

        assert_eq!(
            validate_payment(&booking, &payment(50.0, " ")),
            Err(TransitionError::MissingAdmin)
        );
        assert_eq!(
            validate_payment(&booking, &payment(0.0, "anand")),
            Err(TransitionError::InvalidAmount)
        );
        assert!(matches!(
            validate_payment(&booking, &payment(500.01, "anand")),
            Err(TransitionError::ExceedsBalance { .. })
        ));
        assert!(validate_payment(&booking, &payment(500.0, "anand")).is_ok());
    }

    #[test]
    fn paid_booking_takes_no_payment() {
        let booking = sample_booking(BookingStatus::Paid);
        let err = validate_payment(&booking, &payment(10.0, "anand")).unwrap_err();
        assert!(err.is_state_conflict());
    }

    #[test]
    fn dispatch_respects_remaining_quantities() {
        let mut booking = sample_booking(BookingStatus::Dispatched);
        booking.products[0].dispatched_qty = 3;

        assert!(validate_dispatch(&booking, &[dispatch("FW-1", 1), dispatch("FW-2", 2)]).is_ok());
        assert_eq!(
            validate_dispatch(&booking, &[dispatch("FW-1", 2)]),
            Err(TransitionError::ExceedsRemaining {
                serial: "FW-1".into(),
                requested: 2,
                remaining: 1
            })
        );
        assert!(matches!(
            validate_dispatch(&booking, &[dispatch("FW-1", 1), dispatch("FW-1", 1)]),
            Err(TransitionError::ExceedsRemaining { requested: 2, .. })
        ));
        assert_eq!(
            validate_dispatch(&booking, &[dispatch("FW-9", 1)]),
            Err(TransitionError::UnknownLine("FW-9".into()))
        );
        assert_eq!(
            validate_dispatch(&booking, &[dispatch("FW-2", 0)]),
            Err(TransitionError::EmptyDispatch)
        );
    }

    #[test]
    fn unpaid_booking_cannot_dispatch() {
        let booking = sample_booking(BookingStatus::Booked);
        assert!(matches!(
            validate_dispatch(&booking, &[dispatch("FW-1", 1)]),
            Err(TransitionError::NotDispatchable { .. })
        ));
    }

    #[test]
    fn delivery_waits_for_full_dispatch() {
        let mut booking = sample_booking(BookingStatus::Dispatched);
        booking.products[0].dispatched_qty = 4;
        assert_eq!(
            validate_delivery(&booking),
            Err(TransitionError::NotFullyDispatched("b-1".into()))
        );
        assert_eq!(booking_actions(&booking), vec![BookingAction::Dispatch]);

        booking.products[1].dispatched_qty = 2;
        assert!(validate_delivery(&booking).is_ok());
        assert_eq!(booking_actions(&booking), vec![BookingAction::Deliver]);
    }

    #[test]
    fn actions_follow_status() {
        let booked = sample_booking(BookingStatus::Booked);
        assert_eq!(booking_actions(&booked), vec![BookingAction::RecordPayment]);

        let delivered = sample_booking(BookingStatus::Delivered);
        assert!(booking_actions(&delivered).is_empty());
    }
}
