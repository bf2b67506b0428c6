//! Key/value local storage backed by SQLite.

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::{instrument, warn};

use crate::cart::{Cart, CartItem};
use crate::error::AppError;

pub const SESSION_KEY: &str = "username";
pub const CART_KEY: &str = "gift-box-cart";

#[derive(Clone)]
pub struct LocalStorage {
    pool: SqlitePool,
}

impl LocalStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT value FROM local_storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    pub async fn set_item(&self, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO local_storage (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE
             SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_item(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM local_storage WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.get_item(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let raw = serde_json::to_string(value)?;
        self.set_item(key, &raw).await
    }

    /// Loads the persisted storefront cart. A corrupt entry is discarded
    /// rather than blocking startup.
    #[instrument(skip(self))]
    pub async fn load_cart(&self) -> Result<Cart, AppError> {
        match self.get_json::<Vec<CartItem>>(CART_KEY).await {
            Ok(items) => Ok(Cart::restore(items.unwrap_or_default())),
            Err(AppError::Internal(e)) => {
                warn!(error = %e, "Discarding unreadable stored cart");
                self.remove_item(CART_KEY).await?;
                Ok(Cart::restore(Vec::new()))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn save_cart(&self, cart: &Cart) -> Result<(), AppError> {
        self.set_json(CART_KEY, cart.items()).await
    }

    pub async fn session_user(&self) -> Result<Option<String>, AppError> {
        Ok(self.get_item(SESSION_KEY).await?.filter(|u| !u.trim().is_empty()))
    }

    pub async fn start_session(&self, username: &str) -> Result<(), AppError> {
        self.set_item(SESSION_KEY, username).await
    }

    pub async fn end_session(&self) -> Result<(), AppError> {
        self.remove_item(SESSION_KEY).await
    }
}
