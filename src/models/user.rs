//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A registered account.
///
/// Emails are stored trimmed and lowercased. The password hash and any
/// pending reset token never leave the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2 PHC string)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
    pub customer_tier: CustomerTier,
    pub customer_status: CustomerStatus,
    /// Free-form notes visible to admins only
    pub admin_notes: Option<String>,
    /// Set on every successful login
    pub last_login: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, not yet persisted, non-admin user.
    ///
    /// The password must already be hashed with
    /// `services::password::hash_password()`.
    pub fn new(
        email: String,
        password_hash: String,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            email,
            password_hash,
            first_name,
            last_name,
            is_admin: false,
            customer_tier: CustomerTier::default(),
            customer_status: CustomerStatus::default(),
            admin_notes: None,
            last_login: None,
            reset_token: None,
            reset_token_expires: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether a reset token is pending and still within its lifetime
    pub fn has_valid_reset_token(&self, now: DateTime<Utc>) -> bool {
        matches!(
            (&self.reset_token, self.reset_token_expires),
            (Some(_), Some(expires)) if expires > now
        )
    }
}

/// Commercial tier of a customer account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CustomerTier {
    #[default]
    Free,
    Paid,
}

impl CustomerTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerTier::Free => "free",
            CustomerTier::Paid => "paid",
        }
    }
}

impl fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(CustomerTier::Free),
            "paid" => Ok(CustomerTier::Paid),
            _ => Err(anyhow::anyhow!("Invalid customer tier: {}", s)),
        }
    }
}

/// Relationship status an admin assigns to a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    #[default]
    Green,
    Yellow,
    Red,
    ActiveCustomer,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Green => "green",
            CustomerStatus::Yellow => "yellow",
            CustomerStatus::Red => "red",
            CustomerStatus::ActiveCustomer => "active_customer",
        }
    }
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "green" => Ok(CustomerStatus::Green),
            "yellow" => Ok(CustomerStatus::Yellow),
            "red" => Ok(CustomerStatus::Red),
            "active_customer" => Ok(CustomerStatus::ActiveCustomer),
            _ => Err(anyhow::anyhow!("Invalid customer status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_user_new_defaults() {
        let user = User::new(
            "a@x.com".to_string(),
            "hash".to_string(),
            Some("Ada".to_string()),
            None,
        );

        assert_eq!(user.id, 0);
        assert!(!user.is_admin);
        assert_eq!(user.customer_tier, CustomerTier::Free);
        assert_eq!(user.customer_status, CustomerStatus::Green);
        assert!(user.last_login.is_none());
        assert!(user.reset_token.is_none());
    }

    #[test]
    fn test_secrets_not_serialized() {
        let mut user = User::new("a@x.com".to_string(), "secret-hash".to_string(), None, None);
        user.reset_token = Some("tok".to_string());
        user.reset_token_expires = Some(Utc::now());

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("reset_token").is_none());
        assert!(json.get("reset_token_expires").is_none());
        assert_eq!(json["customer_status"], "green");
    }

    #[test]
    fn test_has_valid_reset_token() {
        let now = Utc::now();
        let mut user = User::new("a@x.com".to_string(), "hash".to_string(), None, None);
        assert!(!user.has_valid_reset_token(now));

        user.reset_token = Some("tok".to_string());
        user.reset_token_expires = Some(now + Duration::hours(1));
        assert!(user.has_valid_reset_token(now));

        user.reset_token_expires = Some(now - Duration::seconds(1));
        assert!(!user.has_valid_reset_token(now));
    }

    #[test]
    fn test_customer_tier_from_str() {
        assert_eq!(CustomerTier::from_str("free").unwrap(), CustomerTier::Free);
        assert_eq!(CustomerTier::from_str("PAID").unwrap(), CustomerTier::Paid);
        assert!(CustomerTier::from_str("gold").is_err());
    }

    #[test]
    fn test_customer_status_round_trips_through_display() {
        for status in [
            CustomerStatus::Green,
            CustomerStatus::Yellow,
            CustomerStatus::Red,
            CustomerStatus::ActiveCustomer,
        ] {
            assert_eq!(CustomerStatus::from_str(&status.to_string()).unwrap(), status);
        }
        assert!(CustomerStatus::from_str("blue").is_err());
        assert_eq!(
            serde_json::to_string(&CustomerStatus::ActiveCustomer).unwrap(),
            "\"active_customer\""
        );
    }
}
