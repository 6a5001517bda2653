//! Mailing list subscriber model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the mailing list. One row per email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    /// False once the address has unsubscribed
    pub subscribed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscriber {
    /// Build an unsaved, subscribed row
    pub fn from_input(input: SubscribeInput) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            email: input.email,
            name: input.name,
            phone: input.phone,
            message: input.message,
            subscribed: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Contact details submitted with a subscription
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscribeInput {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SubscribeInput {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }
}
