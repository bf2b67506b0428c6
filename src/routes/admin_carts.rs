use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use crate::state::AppState;
use crate::handlers::admin_cart;
use crate::middleware::session::require_session;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin-carts/{key}", get(admin_cart::get_cart).delete(admin_cart::discard_cart))
        .route("/admin-carts/{key}/items", post(admin_cart::add_item))
        .route(
            "/admin-carts/{key}/items/{serial}",
            patch(admin_cart::update_item).delete(admin_cart::remove_item),
        )
        .route("/admin-carts/{key}/load/{quotation_id}", post(admin_cart::load_quotation))
        .route("/admin-carts/{key}/submit", post(admin_cart::submit))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}
