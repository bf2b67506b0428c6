use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use crate::state::AppState;
use crate::handlers::booking;
use crate::middleware::session::require_session;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/bookings", get(booking::list_bookings))
        .route("/bookings/refresh", post(booking::refresh))
        .route("/bookings/{id}", get(booking::get_booking))
        .route("/bookings/{id}/payments", post(booking::record_payment))
        .route("/bookings/{id}/dispatch", patch(booking::dispatch))
        .route("/bookings/{id}/deliver", patch(booking::deliver))
        .route("/bookings/{id}/invoice", get(booking::download_invoice))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}
