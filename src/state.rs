use std::collections::HashMap;
use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::{Mutex, RwLock};

use crate::cart::Cart;
use crate::error::AppError;
use crate::models::booking::Booking;
use crate::models::product::Product;
use crate::models::quotation::Quotation;
use crate::snapshot::Snapshot;
use crate::storage::LocalStorage;
use crate::upstream::Upstream;

#[derive(Clone)]
pub struct AppState {
    pub storage: LocalStorage,
    pub upstream: Arc<dyn Upstream>,
    pub products: Arc<Snapshot<Product>>,
    pub quotations: Arc<Snapshot<Quotation>>,
    pub bookings: Arc<Snapshot<Booking>>,
    /// Storefront cart; every committed change is also in local storage.
    pub cart: Arc<Mutex<Cart>>,
    /// Admin edit carts by name, never persisted.
    pub admin_carts: Arc<RwLock<HashMap<String, Cart>>>,
}

impl AppState {
    pub async fn new(db_pool: SqlitePool, upstream: Arc<dyn Upstream>) -> Result<Self, AppError> {
        let storage = LocalStorage::new(db_pool);
        let cart = storage.load_cart().await?;
        tracing::info!(items = cart.items().len(), "Restored storefront cart");

        Ok(Self {
            storage,
            upstream,
            products: Arc::new(Snapshot::new()),
            quotations: Arc::new(Snapshot::new()),
            bookings: Arc::new(Snapshot::new()),
            cart: Arc::new(Mutex::new(cart)),
            admin_carts: Arc::new(RwLock::new(HashMap::new())),
        })
    }
}
