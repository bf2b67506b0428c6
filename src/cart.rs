//! Cart store shared by the storefront cart and the admin edit carts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::order::OrderLine;
use crate::models::product::Product;
use crate::pricing::{clamp_discount, compute_totals, ExtraCharges, Priced, Totals};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartMode {
    /// Customer cart: persisted, rows dropping to zero are removed.
    Storefront,
    /// Admin edit cart: in memory only, rows are removed explicitly.
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartField {
    Quantity,
    Discount,
    Price,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub serial_number: String,
    pub product_name: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub per: String,
    pub price: f64,
    pub discount: f64,
    pub quantity: u32,
    /// Stock seen when the product was last added.
    pub stock: u32,
}

impl CartItem {
    fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            serial_number: product.serial_number.clone(),
            product_name: product.product_name.clone(),
            product_type: product.product_type.clone(),
            per: product.per.clone(),
            price: product.price,
            discount: clamp_discount(product.discount),
            quantity,
            stock: product.stock,
        }
    }

    /// Seeds a row from an already submitted line. The submitted quantity
    /// stays editable even if stock has since dropped below it.
    pub fn from_line(line: &OrderLine, stock: Option<u32>) -> Self {
        Self {
            serial_number: line.serial_number.clone(),
            product_name: line.product_name.clone(),
            product_type: line.product_type.clone(),
            per: line.per.clone(),
            price: line.price,
            discount: clamp_discount(line.discount),
            quantity: line.quantity,
            stock: stock.map_or(line.quantity, |s| s.max(line.quantity)),
        }
    }

    pub fn to_line(&self) -> OrderLine {
        OrderLine {
            serial_number: self.serial_number.clone(),
            product_name: self.product_name.clone(),
            product_type: self.product_type.clone(),
            per: self.per.clone(),
            price: self.price,
            discount: self.discount,
            quantity: self.quantity,
        }
    }
}

impl Priced for CartItem {
    fn unit_price(&self) -> f64 {
        self.price
    }

    fn discount_percent(&self) -> f64 {
        self.discount
    }

    fn quantity(&self) -> f64 {
        self.quantity as f64
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    #[error("Quantity must be at least 1")]
    ZeroQuantity,

    #[error("{0} is out of stock")]
    OutOfStock(String),

    #[error("{0} is currently unavailable")]
    Unavailable(String),

    #[error("Only {stock} of {name} in stock; cannot add {requested}")]
    ExceedsStock { name: String, stock: u32, requested: u32 },

    #[error("Product {0} is not in the cart")]
    NotInCart(String),

    #[error("The cart is empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    mode: CartMode,
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new(mode: CartMode) -> Self {
        Self { mode, items: Vec::new() }
    }

    /// Rebuilds a storefront cart from persisted rows, dropping empty ones.
    pub fn restore(items: Vec<CartItem>) -> Self {
        let items = items.into_iter().filter(|i| i.quantity > 0).collect();
        Self { mode: CartMode::Storefront, items }
    }

    pub fn mode(&self) -> CartMode {
        self.mode
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, serial_number: &str) -> Result<usize, CartError> {
        self.items
            .iter()
            .position(|i| i.serial_number == serial_number)
            .ok_or_else(|| CartError::NotInCart(serial_number.to_string()))
    }

    /// Adds `quantity` of a product, merging into an existing row. The cart is
    /// left untouched when the result would exceed the product's stock.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<&CartItem, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        if !product.active {
            return Err(CartError::Unavailable(product.product_name.clone()));
        }
        if !product.in_stock() {
            return Err(CartError::OutOfStock(product.product_name.clone()));
        }

        match self.items.iter().position(|i| i.serial_number == product.serial_number) {
            Some(idx) => {
                let requested = self.items[idx].quantity.saturating_add(quantity);
                if requested > product.stock {
                    return Err(CartError::ExceedsStock {
                        name: product.product_name.clone(),
                        stock: product.stock,
                        requested,
                    });
                }
                let item = &mut self.items[idx];
                item.quantity = requested;
                item.stock = product.stock;
                Ok(&self.items[idx])
            }
            None => {
                if quantity > product.stock {
                    return Err(CartError::ExceedsStock {
                        name: product.product_name.clone(),
                        stock: product.stock,
                        requested: quantity,
                    });
                }
                self.items.push(CartItem::from_product(product, quantity));
                Ok(&self.items[self.items.len() - 1])
            }
        }
    }

    pub fn remove(&mut self, serial_number: &str) -> Result<CartItem, CartError> {
        let idx = self.position(serial_number)?;
        Ok(self.items.remove(idx))
    }

    /// Edits one field of a row with clamping. Returns `None` when the edit
    /// removed the row (storefront quantity reaching zero).
    pub fn update_field(
        &mut self,
        serial_number: &str,
        field: CartField,
        value: f64,
    ) -> Result<Option<&CartItem>, CartError> {
        let idx = self.position(serial_number)?;
        let value = if value.is_finite() { value } else { 0.0 };

        let item = &mut self.items[idx];
        match field {
            CartField::Discount => item.discount = clamp_discount(value),
            CartField::Price => item.price = value.max(0.0),
            CartField::Quantity => {
                let quantity = value.max(0.0).floor().min(item.stock as f64);
                item.quantity = quantity as u32;
            }
        }

        if self.mode == CartMode::Storefront && self.items[idx].quantity == 0 {
            self.items.remove(idx);
            return Ok(None);
        }
        Ok(Some(&self.items[idx]))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replaces the contents, e.g. with the lines of a quotation being edited.
    pub fn load(&mut self, items: Vec<CartItem>) {
        self.items = items;
    }

    pub fn totals(&self, charges: &ExtraCharges) -> Totals {
        compute_totals(&self.items, charges)
    }

    /// Lines ready for submission. Zero-quantity admin rows are left out.
    pub fn order_lines(&self) -> Result<Vec<OrderLine>, CartError> {
        let lines: Vec<OrderLine> = self
            .items
            .iter()
            .filter(|i| i.quantity > 0)
            .map(CartItem::to_line)
            .collect();
        if lines.is_empty() {
            return Err(CartError::Empty);
        }
        Ok(lines)
    }
}
