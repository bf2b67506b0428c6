//! Order pricing: per-line discounted prices and order totals.
//!
//! Every figure that reaches a view goes through [`compute_totals`], so the
//! displayed total is always `Σ price × (1 − discount/100) × quantity + tax +
//! pf − deduction`, rounded to two decimals.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Flat order-level charges, applied once rather than per line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraCharges {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub tax: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub pf: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub deduction: f64,
}

impl ExtraCharges {
    pub fn new(tax: f64, pf: f64, deduction: f64) -> Self {
        Self { tax, pf, deduction }
    }

    /// Charges are flat non-negative amounts.
    fn sanitized(&self) -> Self {
        Self {
            tax: non_negative(self.tax),
            pf: non_negative(self.pf),
            deduction: non_negative(self.deduction),
        }
    }
}

/// Anything that can be priced as an order line.
pub trait Priced {
    fn unit_price(&self) -> f64;
    fn discount_percent(&self) -> f64;
    fn quantity(&self) -> f64;

    fn net_price(&self) -> f64 {
        net_price(self.unit_price(), self.discount_percent())
    }

    fn line_total(&self) -> f64 {
        line_total(self.unit_price(), self.discount_percent(), self.quantity())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    /// Σ price × quantity, before discounts.
    pub gross: f64,
    pub discount_amount: f64,
    /// Σ net line totals.
    pub subtotal: f64,
    pub tax: f64,
    pub pf: f64,
    pub deduction: f64,
    pub total: f64,
    pub total_quantity: u64,
    /// Set when the deduction outweighs everything else. Left unclamped.
    pub negative_total: bool,
}

pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let rounded = (value * 100.0).round() / 100.0;
    // Avoid handing "-0.00" to the views.
    if rounded == 0.0 { 0.0 } else { rounded }
}

pub fn clamp_discount(discount: f64) -> f64 {
    if discount.is_finite() { discount.clamp(0.0, 100.0) } else { 0.0 }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Unit price after the percentage discount.
pub fn net_price(price: f64, discount: f64) -> f64 {
    non_negative(price) * (1.0 - clamp_discount(discount) / 100.0)
}

pub fn line_total(price: f64, discount: f64, quantity: f64) -> f64 {
    net_price(price, discount) * non_negative(quantity)
}

pub fn compute_totals<'a, P, I>(lines: I, charges: &ExtraCharges) -> Totals
where
    P: Priced + 'a,
    I: IntoIterator<Item = &'a P>,
{
    let charges = charges.sanitized();
    let mut gross = 0.0;
    let mut subtotal = 0.0;
    let mut total_quantity = 0u64;

    for line in lines {
        let quantity = non_negative(line.quantity());
        gross += non_negative(line.unit_price()) * quantity;
        subtotal += line.line_total();
        total_quantity += quantity.floor() as u64;
    }

    let total = round2(subtotal + charges.tax + charges.pf - charges.deduction);
    if total < 0.0 {
        tracing::warn!(total, deduction = charges.deduction, "Deduction exceeds order value");
    }

    Totals {
        gross: round2(gross),
        discount_amount: round2(gross - subtotal),
        subtotal: round2(subtotal),
        tax: round2(charges.tax),
        pf: round2(charges.pf),
        deduction: round2(charges.deduction),
        total,
        total_quantity,
        negative_total: total < 0.0,
    }
}

/// Numeric coercion for values arriving from forms or the upstream: numbers
/// pass through, numeric strings are parsed, anything else becomes 0.
pub fn coerce_f64(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

pub fn coerce_u32(value: &Value) -> u32 {
    let v = coerce_f64(value);
    if v <= 0.0 {
        0
    } else if v >= u32::MAX as f64 {
        u32::MAX
    } else {
        v.floor() as u32
    }
}

/// `deserialize_with` helpers applying [`coerce_f64`] / [`coerce_u32`].
pub mod lenient {
    use super::*;

    pub fn f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(coerce_f64(&value))
    }

    pub fn u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(coerce_u32(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Line {
        price: f64,
        discount: f64,
        quantity: f64,
    }

    impl Priced for Line {
        fn unit_price(&self) -> f64 {
            self.price
        }

        fn discount_percent(&self) -> f64 {
            self.discount
        }

        fn quantity(&self) -> f64 {
            self.quantity
        }
    }

    fn line(price: f64, discount: f64, quantity: f64) -> Line {
        Line { price, discount, quantity }
    }

    #[test]
    fn total_includes_order_level_charges() {
        let lines = vec![line(100.0, 10.0, 2.0)];
        let totals = compute_totals(&lines, &ExtraCharges::new(5.0, 2.0, 1.0));
        assert_eq!(totals.subtotal, 180.0);
        assert_eq!(totals.gross, 200.0);
        assert_eq!(totals.discount_amount, 20.0);
        assert_eq!(totals.total, 186.0);
        assert_eq!(totals.total_quantity, 2);
        assert!(!totals.negative_total);
    }

    #[test]
    fn discount_is_clamped() {
        assert_eq!(net_price(50.0, 150.0), 0.0);
        assert_eq!(net_price(50.0, -20.0), 50.0);
        assert_eq!(net_price(50.0, f64::NAN), 50.0);
    }

    #[test]
    fn negative_quantity_counts_as_zero() {
        assert_eq!(line_total(10.0, 0.0, -3.0), 0.0);
    }

    #[test]
    fn totals_round_to_two_decimals() {
        let lines = vec![line(33.333, 0.0, 3.0), line(0.105, 0.0, 1.0)];
        let totals = compute_totals(&lines, &ExtraCharges::default());
        assert_eq!(totals.total, 100.1);
    }

    #[test]
    fn negative_total_is_flagged_not_clamped() {
        let lines = vec![line(10.0, 0.0, 1.0)];
        let totals = compute_totals(&lines, &ExtraCharges::new(0.0, 0.0, 25.0));
        assert_eq!(totals.total, -15.0);
        assert!(totals.negative_total);
    }

    #[test]
    fn negative_charges_are_ignored() {
        let lines = vec![line(10.0, 0.0, 1.0)];
        let totals = compute_totals(&lines, &ExtraCharges::new(-5.0, -1.0, -2.0));
        assert_eq!(totals.total, 10.0);
    }

    #[test]
    fn empty_order_totals_only_charges() {
        let lines: Vec<Line> = Vec::new();
        let totals = compute_totals(&lines, &ExtraCharges::new(4.5, 0.5, 0.0));
        assert_eq!(totals.total, 5.0);
        assert_eq!(totals.total_quantity, 0);
    }

    #[test]
    fn malformed_numbers_fall_back_to_zero() {
        assert_eq!(coerce_f64(&json!("12.5")), 12.5);
        assert_eq!(coerce_f64(&json!(" 7 ")), 7.0);
        assert_eq!(coerce_f64(&json!("abc")), 0.0);
        assert_eq!(coerce_f64(&json!(null)), 0.0);
        assert_eq!(coerce_f64(&json!({ "x": 1 })), 0.0);
        assert_eq!(coerce_u32(&json!("-4")), 0);
        assert_eq!(coerce_u32(&json!(3.9)), 3);
    }

    #[test]
    fn charges_deserialize_leniently() {
        let charges: ExtraCharges =
            serde_json::from_value(json!({ "tax": "18", "pf": null })).unwrap();
        assert_eq!(charges, ExtraCharges::new(18.0, 0.0, 0.0));
    }
}
