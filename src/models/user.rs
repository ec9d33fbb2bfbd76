//! User model
//!
//! This module defines the User entity and the role-set type used for
//! authorization. A user record carries a dash-delimited role string
//! (e.g. `admin-dj`); an endpoint is permitted when the user's role set
//! intersects the endpoint's allow-list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// User entity representing a staff member of the station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Email address (unique, whitelist-gated at sign-up)
    pub email: String,
    /// Display name
    pub name: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Role set, stored as a dash-delimited string
    pub roles: RoleSet,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// Note: The password should already be hashed before calling this function.
    pub fn new(email: String, name: String, password_hash: String, roles: RoleSet) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            email,
            name,
            password_hash,
            roles,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user holds the admin role
    pub fn is_admin(&self) -> bool {
        self.roles.contains("admin")
    }

    /// Check if the user's roles intersect the given allow-list
    pub fn has_any_role(&self, allowed: &[&str]) -> bool {
        self.roles.intersects(allowed)
    }
}

/// A set of role tokens parsed from a dash-delimited role string.
///
/// Parsing lowercases tokens and drops empty segments, so `"Admin--DJ"`
/// parses to `{admin, dj}`. Formatting joins the tokens with dashes in
/// sorted order, which makes `parse` -> `to_string` -> `parse` stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    /// Build a role set from individual tokens
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            tokens
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    /// Check membership of a single role token
    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(&role.to_lowercase())
    }

    /// Check whether any of the allowed tokens is present
    pub fn intersects(&self, allowed: &[&str]) -> bool {
        allowed.iter().any(|r| self.contains(r))
    }

    /// Whether the set holds no roles
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the role tokens in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.0.iter().map(|s| s.as_str()).collect();
        write!(f, "{}", joined.join("-"))
    }
}

impl FromStr for RoleSet {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_tokens(s.split('-')))
    }
}

impl Serialize for RoleSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(RoleSet::from_tokens(s.split('-')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_set_parse() {
        let roles: RoleSet = "admin-dj".parse().unwrap();
        assert!(roles.contains("admin"));
        assert!(roles.contains("dj"));
        assert!(!roles.contains("editor"));
    }

    #[test]
    fn test_role_set_parse_is_case_insensitive() {
        let roles: RoleSet = "Admin-DJ".parse().unwrap();
        assert!(roles.contains("admin"));
        assert!(roles.contains("dj"));
    }

    #[test]
    fn test_role_set_drops_empty_segments() {
        let roles: RoleSet = "-admin--dj-".parse().unwrap();
        assert_eq!(roles.iter().count(), 2);
    }

    #[test]
    fn test_role_set_empty_string() {
        let roles: RoleSet = "".parse().unwrap();
        assert!(roles.is_empty());
        assert!(!roles.contains("admin"));
    }

    #[test]
    fn test_role_set_display_roundtrip() {
        let roles: RoleSet = "dj-admin".parse().unwrap();
        // Display is sorted
        assert_eq!(roles.to_string(), "admin-dj");
        let reparsed: RoleSet = roles.to_string().parse().unwrap();
        assert_eq!(roles, reparsed);
    }

    #[test]
    fn test_role_set_intersects() {
        let roles: RoleSet = "editor-dj".parse().unwrap();
        assert!(roles.intersects(&["admin", "editor"]));
        assert!(roles.intersects(&["dj"]));
        assert!(!roles.intersects(&["admin"]));
        assert!(!roles.intersects(&[]));
    }

    #[test]
    fn test_user_is_admin() {
        let admin = User::new(
            "admin@station.edu".to_string(),
            "Admin".to_string(),
            "hash".to_string(),
            "admin".parse().unwrap(),
        );
        let dj = User::new(
            "dj@station.edu".to_string(),
            "DJ".to_string(),
            "hash".to_string(),
            "dj".parse().unwrap(),
        );

        assert!(admin.is_admin());
        assert!(!dj.is_admin());
        assert!(dj.has_any_role(&["dj", "editor"]));
        assert!(!dj.has_any_role(&["admin"]));
    }
}
