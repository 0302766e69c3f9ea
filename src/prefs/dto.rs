use serde::{Deserialize, Serialize};

use crate::email::EmailCategory;

use super::repo::UserPreference;

#[derive(Debug, Serialize)]
pub struct PreferencesView {
    pub product_emails: bool,
    pub reminder_emails: bool,
}

impl From<UserPreference> for PreferencesView {
    fn from(p: UserPreference) -> Self {
        Self {
            product_emails: p.product_emails,
            reminder_emails: p.reminder_emails,
        }
    }
}

impl Default for PreferencesView {
    fn default() -> Self {
        // opted in until the user says otherwise
        Self {
            product_emails: true,
            reminder_emails: true,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePreferencesRequest {
    pub product_emails: Option<bool>,
    pub reminder_emails: Option<bool>,
}

/// Unauthenticated unsubscribe from an email footer link.
#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub email: String,
    pub category: EmailCategory,
}
