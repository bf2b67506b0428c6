use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SessionResponse {
    pub logged_in: bool,
    pub username: Option<String>,
}
