use serde::{Deserialize, Serialize};

use crate::pricing::lenient;
use crate::snapshot::Keyed;

/// Catalog item as served by the upstream. The console only ever holds a
/// cached copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub serial_number: String,
    pub product_name: String,
    #[serde(deserialize_with = "lenient::f64")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub discount: f64,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub stock: u32,
    /// Unit label ("box", "pkt", ...).
    #[serde(default)]
    pub per: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub images: Vec<String>,
}

fn default_active() -> bool {
    true
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    pub(crate) fn matches(&self, needle: &str) -> bool {
        crate::pagination::matches_search(&[&self.product_name, &self.serial_number], needle)
    }
}

impl Keyed for Product {
    fn key(&self) -> &str {
        &self.serial_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upstream_product_with_string_numbers() {
        let product: Product = serde_json::from_value(json!({
            "serial_number": "FW-101",
            "product_name": "Flower Pots Deluxe",
            "price": "250",
            "discount": "",
            "stock": "12",
            "per": "box",
            "product_type": "gift_box"
        }))
        .unwrap();

        assert_eq!(product.price, 250.0);
        assert_eq!(product.discount, 0.0);
        assert_eq!(product.stock, 12);
        assert!(product.active);
        assert!(product.images.is_empty());
    }
}
