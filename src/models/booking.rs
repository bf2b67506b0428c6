use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::BookingStatus;
use crate::models::customer::Customer;
use crate::models::order::OrderLine;
use crate::pricing::{compute_totals, lenient, round2, ExtraCharges, Priced, Totals};
use crate::snapshot::Keyed;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingLine {
    #[serde(flatten)]
    pub line: OrderLine,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub dispatched_qty: u32,
}

impl BookingLine {
    pub fn remaining(&self) -> u32 {
        self.line.quantity.saturating_sub(self.dispatched_qty)
    }
}

impl Priced for BookingLine {
    fn unit_price(&self) -> f64 {
        self.line.price
    }

    fn discount_percent(&self) -> f64 {
        self.line.discount
    }

    fn quantity(&self) -> f64 {
        self.line.quantity as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Upi,
    BankTransfer,
    Cheque,
}

/// A payment as requested by an admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPayment {
    pub method: PaymentMethod,
    #[serde(deserialize_with = "lenient::f64")]
    pub amount: f64,
    /// Admin who received the payment.
    #[serde(default)]
    pub admin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub method: PaymentMethod,
    #[serde(deserialize_with = "lenient::f64")]
    pub amount: f64,
    pub admin: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub order_number: String,
    pub customer: Customer,
    pub status: BookingStatus,
    pub products: Vec<BookingLine>,
    #[serde(default)]
    pub charges: ExtraCharges,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub amount_paid: f64,
    #[serde(default)]
    pub transactions: Vec<PaymentTransaction>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn balance(&self) -> f64 {
        round2(self.total - self.amount_paid).max(0.0)
    }

    pub fn line(&self, serial_number: &str) -> Option<&BookingLine> {
        self.products.iter().find(|l| l.line.serial_number == serial_number)
    }

    pub fn fully_dispatched(&self) -> bool {
        self.products.iter().all(|l| l.remaining() == 0)
    }

    pub fn ordered_quantity(&self) -> u32 {
        self.products.iter().map(|l| l.line.quantity).sum()
    }

    pub fn dispatched_quantity(&self) -> u32 {
        self.products.iter().map(|l| l.dispatched_qty).sum()
    }

    pub fn totals(&self) -> Totals {
        compute_totals(&self.products, &self.charges)
    }
}

impl Keyed for Booking {
    fn key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn booking_lines_flatten_dispatch_counts() {
        let booking: Booking = serde_json::from_value(json!({
            "id": "b-1",
            "order_number": "GB-0001",
            "customer": { "name": "Ravi", "mobile_number": "9876543210" },
            "status": "paid",
            "products": [
                {
                    "serial_number": "FW-1",
                    "product_name": "Sparklers",
                    "price": 40,
                    "discount": "10",
                    "quantity": 5,
                    "dispatched_qty": 2
                },
                {
                    "serial_number": "FW-2",
                    "product_name": "Rockets",
                    "price": "120",
                    "quantity": "1"
                }
            ],
            "total": "300",
            "amount_paid": 300,
            "created_at": "2026-10-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(booking.products[0].remaining(), 3);
        assert_eq!(booking.products[1].dispatched_qty, 0);
        assert_eq!(booking.balance(), 0.0);
        assert!(!booking.fully_dispatched());
        assert_eq!(booking.ordered_quantity(), 6);
        assert_eq!(booking.totals().subtotal, 300.0);
    }
}
