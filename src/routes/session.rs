use axum::{routing::get, Router};
use crate::state::AppState;
use crate::handlers::session::{current, login, logout};

pub fn routes() -> Router<AppState> {
    Router::new().route("/session", get(current).post(login).delete(logout))
}
