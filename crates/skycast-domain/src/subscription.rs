//! Subscription aggregate.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::RngExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token length in characters.
pub const TOKEN_LEN: usize = 32;

/// Charset for confirmation tokens (alphanumeric, both cases).
const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("city is required")]
    EmptyCity,
    #[error("invalid frequency: {0:?}")]
    InvalidFrequency(String),
}

/// How often a subscriber receives weather updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Hourly,
    Daily,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            _ => Err(DomainError::InvalidFrequency(s.to_owned())),
        }
    }
}

/// A user's subscription to weather updates for one city.
///
/// `(email, city, frequency)` is unique; `token` is the only handle the user
/// ever sees, used for both confirmation and unsubscription.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: Uuid,
    pub email: String,
    pub city: String,
    pub frequency: Frequency,
    pub token: String,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Build a new, unconfirmed subscription with a fresh token.
    pub fn new(email: &str, city: &str, frequency: Frequency) -> Result<Self, DomainError> {
        let email = email.trim();
        let city = city.trim();
        if !is_valid_email(email) {
            return Err(DomainError::InvalidEmail);
        }
        if city.is_empty() {
            return Err(DomainError::EmptyCity);
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            email: email.to_owned(),
            city: city.to_owned(),
            frequency,
            token: generate_token(),
            confirmed: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Mark as confirmed. Confirming twice is a no-op apart from `updated_at`.
    pub fn confirm(&mut self) {
        self.confirmed = true;
        self.updated_at = Utc::now();
    }
}

pub fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_CHARSET[rng.random_range(0..TOKEN_CHARSET.len())] as char)
        .collect()
}

/// Pragmatic address check: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
