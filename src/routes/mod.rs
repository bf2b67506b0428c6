pub mod admin_carts;
pub mod bookings;
pub mod cart;
pub mod pricing;
pub mod products;
pub mod quotations;
pub mod reports;
pub mod session;

use axum::Router;
use crate::state::AppState;

/// Everything is served under this prefix.
pub const BASE_PATH: &str = "/giftbox";

pub fn create_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(session::routes())
        .merge(pricing::routes())
        .merge(products::routes(state.clone()))
        .merge(cart::routes())
        .merge(admin_carts::routes(state.clone()))
        .merge(quotations::routes(state.clone()))
        .merge(bookings::routes(state.clone()))
        .merge(reports::routes(state))
}
