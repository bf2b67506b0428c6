use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use crate::state::AppState;
use crate::handlers::product::{get_product, list_products, refresh, set_product_status};
use crate::middleware::session::require_session;

pub fn routes(state: AppState) -> Router<AppState> {
    // Storefront browsing
    let open = Router::new()
        .route("/products", get(list_products))
        .route("/products/{serial}", get(get_product))
        .route("/products/refresh", post(refresh));

    // Dealer status toggle (admin session required)
    let protected = Router::new()
        .route("/products/{serial}/status", patch(set_product_status))
        .route_layer(middleware::from_fn_with_state(state, require_session));

    open.merge(protected)
}
