// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Roles, users and user groups

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A named authority
///
/// Two roles are the same role when their names match; properties and the
/// personalization owner do not take part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    name: String,
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

impl Role {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            user_name: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// User this role was personalized for
    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Copy of this role with empty template properties filled from the
    /// user's properties, or `None` when nothing needs filling
    pub fn personalize(&self, user: &User) -> Option<Role> {
        let mut personalized = self.clone();
        let mut changed = false;
        for (key, value) in personalized.properties.iter_mut() {
            if !value.is_empty() {
                continue;
            }
            if let Some(user_value) = user.property(key) {
                *value = user_value.to_string();
                changed = true;
            }
        }
        if !changed {
            return None;
        }
        personalized.user_name = Some(user.username().to_string());
        Some(personalized)
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Role {}

impl Hash for Role {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    username: String,
    enabled: bool,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

impl User {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            enabled: true,
            properties: BTreeMap::new(),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroup {
    name: String,
    enabled: bool,
}

impl UserGroup {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personalize_fills_empty_templates() {
        let role = Role::new("EMPLOYEE")
            .with_property("employeeNumber", "")
            .with_property("bbox", "lookupAtRuntime");
        let user = User::new("bob")
            .with_property("employeeNumber", "4711")
            .with_property("bbox", "10,10,20,20");

        let personal = role.personalize(&user).unwrap();
        assert_eq!(personal.property("employeeNumber"), Some("4711"));
        assert_eq!(personal.property("bbox"), Some("lookupAtRuntime"));
        assert_eq!(personal.user_name(), Some("bob"));
        assert_eq!(role.property("employeeNumber"), Some(""));
        assert_eq!(role.user_name(), None);
    }

    #[test]
    fn test_personalize_without_match() {
        let role = Role::new("EMPLOYEE").with_property("employeeNumber", "");
        assert!(role.personalize(&User::new("bob")).is_none());
    }

    #[test]
    fn test_role_equality_by_name() {
        let a = Role::new("A").with_property("x", "1");
        let b = Role::new("A");
        assert_eq!(a, b);
        assert!(Role::new("A") < Role::new("B"));
    }
}
