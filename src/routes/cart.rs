use axum::{
    routing::{get, patch, post},
    Router,
};
use crate::state::AppState;
use crate::handlers::cart::{add_item, checkout, clear_cart, get_cart, remove_item, update_item};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/{serial}", patch(update_item).delete(remove_item))
        .route("/cart/checkout", post(checkout))
}
