use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::state::AppState;

/// Admin signed in on this console.
#[derive(Clone, Debug)]
pub struct SessionContext {
    pub username: String,
}

#[derive(Serialize)]
struct ErrorBody { error: String, code: &'static str }

/// Admin screens require the stored session marker. There is no credential
/// check behind it; the marker is all the console has.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let username = match state.storage.session_user().await {
        Ok(Some(u)) => u,
        Ok(None) => return unauthorized("Sign in to continue"),
        Err(e) => return e.into_response(),
    };

    req.extensions_mut().insert(SessionContext { username });

    next.run(req).await
}

fn unauthorized(msg: &str) -> Response {
    let body = axum::Json(ErrorBody { error: msg.to_string(), code: "unauthorized" });
    (StatusCode::UNAUTHORIZED, body).into_response()
}
