pub mod mailer;
pub mod services;

use serde::{Deserialize, Serialize};

/// Optional email categories a user can opt out of. Security email
/// (verification, reset, password-changed) is not a category and always
/// sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailCategory {
    Product,
    Reminder,
}

impl EmailCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Reminder => "reminder",
        }
    }
}
