//! Keeps the snapshots in step with the upstream.

use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::booking::Booking;
use crate::models::product::Product;
use crate::models::quotation::Quotation;
use crate::state::AppState;

pub async fn refresh_products(state: &AppState) -> Result<bool, AppError> {
    Ok(state.products.refresh(state.upstream.list_products()).await?)
}

pub async fn refresh_quotations(state: &AppState) -> Result<bool, AppError> {
    Ok(state.quotations.refresh(state.upstream.list_quotations()).await?)
}

pub async fn refresh_bookings(state: &AppState) -> Result<bool, AppError> {
    Ok(state.bookings.refresh(state.upstream.list_bookings()).await?)
}

/// Refreshes everything, logging failures instead of returning them.
pub async fn refresh_all(state: &AppState) {
    let (products, quotations, bookings) = tokio::join!(
        refresh_products(state),
        refresh_quotations(state),
        refresh_bookings(state),
    );
    let results = [("products", products), ("quotations", quotations), ("bookings", bookings)];
    for (name, result) in results {
        match result {
            Ok(applied) => debug!(list = name, applied, "Snapshot refreshed"),
            Err(e) => warn!(list = name, error = %e, "Snapshot refresh failed"),
        }
    }
}

/// Stock moves after bookings; failures only leave the catalog stale.
pub async fn refresh_products_quietly(state: &AppState) {
    if let Err(e) = refresh_products(state).await {
        warn!(error = %e, "Catalog refresh after booking failed");
    }
}

/// Looks a product up in the catalog, refreshing once if it is missing.
pub async fn find_product(state: &AppState, serial_number: &str) -> Result<Product, AppError> {
    if let Some(product) = state.products.get(serial_number).await {
        return Ok(product);
    }
    refresh_products(state).await?;
    state
        .products
        .get(serial_number)
        .await
        .ok_or_else(|| AppError::not_found(format!("Product {serial_number} not found")))
}

pub async fn find_quotation(state: &AppState, id: &str) -> Result<Quotation, AppError> {
    if let Some(quotation) = state.quotations.get(id).await {
        return Ok(quotation);
    }
    refresh_quotations(state).await?;
    state
        .quotations
        .get(id)
        .await
        .ok_or_else(|| AppError::not_found(format!("Quotation {id} not found")))
}

pub async fn find_booking(state: &AppState, id: &str) -> Result<Booking, AppError> {
    if let Some(booking) = state.bookings.get(id).await {
        return Ok(booking);
    }
    refresh_bookings(state).await?;
    state
        .bookings
        .get(id)
        .await
        .ok_or_else(|| AppError::not_found(format!("Booking {id} not found")))
}

pub fn start_refresh_worker(state: AppState, period: Duration) {
    tokio::spawn(async move {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            refresh_all(&state).await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::test_state;

    #[tokio::test]
    async fn missing_product_triggers_refresh() {
        let (state, _) = test_state().await;
        assert!(state.products.all().await.is_empty());

        let product = find_product(&state, "FW-2").await.unwrap();
        assert_eq!(product.stock, 3);
        assert_eq!(state.products.all().await.len(), 3);

        assert!(matches!(find_product(&state, "nope").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let (state, upstream) = test_state().await;
        refresh_products(&state).await.unwrap();

        upstream.fail_next("Server unavailable");
        assert!(refresh_products(&state).await.is_err());
        assert_eq!(state.products.all().await.len(), 3);
    }
}
