use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("user name cannot be empty")]
    EmptyName,
}

/// A quiz taker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Trim a user name, rejecting blank ones.
///
/// # Errors
///
/// Returns `UserError::EmptyName` if nothing is left after trimming.
pub fn normalize_user_name(raw: &str) -> Result<String, UserError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(UserError::EmptyName);
    }
    Ok(name.to_owned())
}

/// Narrows a user listing. Empty criteria match everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Only these ids, when non-empty.
    pub ids: Vec<UserId>,
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
}

impl UserFilter {
    /// The name fragment to search for, if it is not blank.
    #[must_use]
    pub fn name_fragment(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }

    #[must_use]
    pub fn matches(&self, user: &User) -> bool {
        if !self.ids.is_empty() && !self.ids.contains(&user.id) {
            return false;
        }
        match self.name_fragment() {
            Some(fragment) => user
                .name
                .to_ascii_lowercase()
                .contains(&fragment.to_ascii_lowercase()),
            None => true,
        }
    }
}

/// One-based page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    #[must_use]
    pub fn new(number: u32, size: u32) -> Self {
        Self { number, size }
    }

    /// Rows to skip. Page 0 is treated as the first page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.number.saturating_sub(1)) * u64::from(self.size)
    }
}

/// Validated user that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    name: String,
    created_at: DateTime<Utc>,
}

impl NewUser {
    /// # Errors
    ///
    /// Returns `UserError::EmptyName` if the trimmed name is empty.
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>) -> Result<Self, UserError> {
        let name = normalize_user_name(&name.into())?;
        Ok(Self { name, created_at })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            created_at: self.created_at,
        }
    }
}
