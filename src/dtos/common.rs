use serde::{Deserialize, Serialize};

/// Query string shared by the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub product_type: Option<String>,
    /// Pull a fresh copy from the upstream before answering.
    #[serde(default)]
    pub refresh: bool,
}

impl ListQuery {
    pub fn search(&self) -> &str {
        self.search.as_deref().unwrap_or("")
    }

    /// Matches `value` against the status filter, if any.
    pub fn status_matches(&self, value: &str) -> bool {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => true,
            Some(wanted) => wanted.eq_ignore_ascii_case(value),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub applied: bool,
    pub count: usize,
}
