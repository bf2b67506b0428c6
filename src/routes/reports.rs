use axum::{middleware, routing::get, Router};
use crate::state::AppState;
use crate::handlers::report::summary;
use crate::middleware::session::require_session;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/reports/summary", get(summary))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}
