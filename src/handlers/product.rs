// src/handlers/product.rs
use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::{error, info, instrument};

use crate::dtos::common::{ListQuery, RefreshResponse};
use crate::dtos::product::{ProductResponse, ProductStatusRequest};
use crate::error::AppError;
use crate::pagination::{paginate, Page};
use crate::state::AppState;
use crate::sync::{find_product, refresh_products};
use crate::tentative::apply_tentatively;

// GET /products - Paged catalog with search and type filter
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<ProductResponse>>, AppError> {
    if query.refresh || state.products.refreshed_at().await.is_none() {
        refresh_products(&state).await.inspect_err(|e| {
            error!(error = %e, "Failed to fetch products");
        })?;
    }

    let mut products: Vec<_> = state
        .products
        .all()
        .await
        .into_iter()
        .filter(|p| p.matches(query.search()))
        .filter(|p| match query.product_type.as_deref() {
            None | Some("") | Some("all") => true,
            Some(t) => p.product_type.eq_ignore_ascii_case(t),
        })
        .filter(|p| match query.status.as_deref() {
            Some("active") => p.active,
            Some("inactive") => !p.active,
            _ => true,
        })
        .collect();
    products.sort_by(|a, b| a.product_name.to_lowercase().cmp(&b.product_name.to_lowercase()));

    Ok(Json(paginate(products, query.page, query.page_size).map(ProductResponse::from)))
}

// GET /products/{serial}
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = find_product(&state, &serial).await?;
    Ok(Json(ProductResponse::from(product)))
}

// POST /products/refresh
#[instrument(skip(state))]
pub async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, AppError> {
    let applied = refresh_products(&state).await?;
    let count = state.products.all().await.len();
    Ok(Json(RefreshResponse { applied, count }))
}

// PATCH /products/{serial}/status - Dealer toggle, shown immediately and
// reverted if the backend refuses it
#[instrument(skip(state, payload))]
pub async fn set_product_status(
    State(state): State<AppState>,
    Path(serial): Path<String>,
    Json(payload): Json<ProductStatusRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let current = find_product(&state, &serial).await?;
    let previous = current.active;
    let active = payload.active;

    let updated = apply_tentatively(
        state.products.state(),
        |snapshot| {
            if let Some(p) = snapshot.get_mut(&serial) {
                p.active = active;
            }
        },
        |snapshot| {
            if let Some(p) = snapshot.get_mut(&serial) {
                p.active = previous;
            }
        },
        state.upstream.set_product_active(&serial, active),
    )
    .await
    .inspect_err(|e| error!(error = %e, serial = %serial, "Status toggle reverted"))?;

    info!(serial = %serial, active, "Product status updated");
    state.products.upsert(updated.clone()).await;
    Ok(Json(ProductResponse::from(updated)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::test_state;

    #[tokio::test]
    async fn lists_filter_and_page() {
        let (state, _) = test_state().await;
        let query = ListQuery {
            search: Some("fw-".into()),
            page_size: Some(2),
            ..Default::default()
        };

        let Json(page) = list_products(State(state.clone()), Query(query)).await.unwrap();
        assert_eq!(page.total_items, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages, 2);

        let query = ListQuery { search: Some("FW-2".into()), ..Default::default() };
        let Json(page) = list_products(State(state), Query(query)).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].product.serial_number, "FW-2");
        assert!(page.items[0].in_stock);
    }

    #[tokio::test]
    async fn failed_toggle_is_reverted() {
        let (state, upstream) = test_state().await;
        refresh_products(&state).await.unwrap();

        upstream.fail_next("Dealer update failed");
        let err = set_product_status(
            State(state.clone()),
            Path("FW-1".to_string()),
            Json(ProductStatusRequest { active: false }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message(), "Dealer update failed");
        assert!(state.products.get("FW-1").await.unwrap().active);

        let Json(updated) = set_product_status(
            State(state.clone()),
            Path("FW-1".to_string()),
            Json(ProductStatusRequest { active: false }),
        )
        .await
        .unwrap();
        assert!(!updated.product.active);
        assert!(!state.products.get("FW-1").await.unwrap().active);
    }
}
