use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockroom_core::DomainError;

/// What happens to movements when the product or location they reference is deleted.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Refuse the delete while any movement references the record.
    #[default]
    Restrict,
    /// Delete the referencing movements together with the record.
    Cascade,
}

impl DeletePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletePolicy::Restrict => "restrict",
            DeletePolicy::Cascade => "cascade",
        }
    }
}

impl FromStr for DeletePolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "restrict" => Ok(DeletePolicy::Restrict),
            "cascade" => Ok(DeletePolicy::Cascade),
            other => Err(DomainError::validation(
                "delete_policy",
                format!("expected 'restrict' or 'cascade', got '{other}'"),
            )),
        }
    }
}
