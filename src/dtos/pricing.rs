use serde::{Deserialize, Serialize};

use crate::pricing::{clamp_discount, lenient, ExtraCharges, Priced, Totals};

/// Ad-hoc pricing request, as sent by the quotation and direct-booking
/// screens while a form is being filled in.
#[derive(Debug, Deserialize)]
pub struct PriceRequest {
    #[serde(default)]
    pub items: Vec<PriceLine>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub tax: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub pf: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub deduction: f64,
}

impl PriceRequest {
    pub fn charges(&self) -> ExtraCharges {
        ExtraCharges::new(self.tax, self.pf, self.deduction)
    }
}

#[derive(Debug, Deserialize)]
pub struct PriceLine {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub discount: f64,
    #[serde(default, alias = "qty", deserialize_with = "lenient::f64")]
    pub quantity: f64,
}

impl Priced for PriceLine {
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

#[derive(Debug, Serialize)]
pub struct PricedLine {
    pub price: f64,
    pub discount: f64,
    pub quantity: f64,
    pub net_price: f64,
    pub line_total: f64,
}

impl From<&PriceLine> for PricedLine {
    fn from(line: &PriceLine) -> Self {
        Self {
            price: line.price,
            discount: clamp_discount(line.discount),
            quantity: line.quantity.max(0.0),
            net_price: crate::pricing::round2(line.net_price()),
            line_total: crate::pricing::round2(line.line_total()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub lines: Vec<PricedLine>,
    pub totals: Totals,
}
