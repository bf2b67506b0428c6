use serde::{Deserialize, Serialize};

use crate::models::product::Product;
use crate::pricing::{net_price, round2};

#[derive(Debug, Deserialize)]
pub struct ProductStatusRequest {
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub net_price: f64,
    pub in_stock: bool,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            net_price: round2(net_price(product.price, product.discount)),
            in_stock: product.in_stock(),
            product,
        }
    }
}
