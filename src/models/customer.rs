use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Customer {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Customer name is required".to_string());
        }
        let digits = self.mobile_number.chars().filter(|c| c.is_ascii_digit()).count();
        if digits < 10 {
            return Err("A valid mobile number is required".to_string());
        }
        Ok(())
    }

    pub(crate) fn matches(&self, needle: &str) -> bool {
        crate::pagination::matches_search(&[&self.name, &self.mobile_number], needle)
    }
}
