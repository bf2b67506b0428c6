use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use crate::state::AppState;
use crate::handlers::quotation;
use crate::middleware::session::require_session;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/quotations", get(quotation::list_quotations))
        .route("/quotations/refresh", post(quotation::refresh))
        .route("/quotations/{id}", get(quotation::get_quotation))
        .route("/quotations/{id}/book", post(quotation::book_quotation))
        .route("/quotations/{id}/cancel", patch(quotation::cancel_quotation))
        .route("/quotations/{id}/pdf", get(quotation::download_pdf))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}
