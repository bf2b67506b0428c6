use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartField, CartItem, CartMode};
use crate::models::customer::Customer;
use crate::pricing::{lenient, round2, ExtraCharges, Priced, Totals};

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub serial_number: String,
    #[serde(default = "default_quantity", deserialize_with = "lenient::u32")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub field: CartField,
    #[serde(deserialize_with = "lenient::f64")]
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    #[serde(flatten)]
    pub item: CartItem,
    pub net_price: f64,
    pub line_total: f64,
}

impl From<&CartItem> for CartItemResponse {
    fn from(item: &CartItem) -> Self {
        Self {
            net_price: round2(item.net_price()),
            line_total: round2(item.line_total()),
            item: item.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub mode: CartMode,
    pub items: Vec<CartItemResponse>,
    pub totals: Totals,
}

impl CartResponse {
    pub fn new(cart: &Cart, charges: &ExtraCharges) -> Self {
        Self {
            mode: cart.mode(),
            items: cart.items().iter().map(CartItemResponse::from).collect(),
            totals: cart.totals(charges),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub customer: Customer,
    #[serde(default)]
    pub charges: ExtraCharges,
}

/// What an admin cart turns into when submitted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmitTarget {
    Quotation,
    Booking,
    /// Saves the cart over an existing pending quotation.
    QuotationUpdate { id: String },
}

#[derive(Debug, Deserialize)]
pub struct SubmitCartRequest {
    pub target: SubmitTarget,
    pub customer: Customer,
    #[serde(default)]
    pub charges: ExtraCharges,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum SubmitResponse {
    Quotation(crate::dtos::quotation::QuotationResponse),
    Booking(crate::dtos::booking::BookingResponse),
}
