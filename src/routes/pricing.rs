use axum::{routing::post, Router};
use crate::state::AppState;
use crate::handlers::pricing::price_items;

pub fn routes() -> Router<AppState> {
    Router::new().route("/pricing", post(price_items))
}
