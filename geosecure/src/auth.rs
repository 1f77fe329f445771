// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Authentication and request context consumed by access decisions
//!
//! Authentication itself happens elsewhere. The access layer only looks at the
//! user name and the set of granted authority names. The request context
//! describes the OWS service/operation being served and is passed explicitly
//! into every decision instead of living in thread-local state.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Role granted to everybody that did not log in
pub const ROLE_ANONYMOUS: &str = "ROLE_ANONYMOUS";

/// Role granted to every logged in user
pub const ROLE_AUTHENTICATED: &str = "ROLE_AUTHENTICATED";

/// Full administrator role, bypasses every check
pub const ROLE_ADMINISTRATOR: &str = "ROLE_ADMINISTRATOR";

/// Administrator of users and groups
pub const ROLE_GROUP_ADMIN: &str = "ROLE_GROUP_ADMIN";

/// Sentinel role set entry meaning "everybody"
pub const ANY_ROLE: &str = "*";

static RESERVED_ROLES: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    [
        ROLE_ANONYMOUS,
        ROLE_AUTHENTICATED,
        ROLE_ADMINISTRATOR,
        ROLE_GROUP_ADMIN,
        ANY_ROLE,
    ]
    .into_iter()
    .collect()
});

/// System roles granted by the security layer itself, never stored by a role
/// service
pub fn is_reserved_role(name: &str) -> bool {
    RESERVED_ROLES.contains(name)
}

/// The authenticated principal a decision is made for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authentication {
    username: Option<String>,
    authorities: BTreeSet<String>,
}

impl Authentication {
    /// Anonymous access, holding only [`ROLE_ANONYMOUS`]
    pub fn anonymous() -> Self {
        let mut authorities = BTreeSet::new();
        authorities.insert(ROLE_ANONYMOUS.to_string());
        Self {
            username: None,
            authorities,
        }
    }

    /// A named user holding the given authorities
    pub fn user<I, S>(username: &str, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            username: Some(username.to_string()),
            authorities: authorities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_none()
    }

    pub fn authorities(&self) -> &BTreeSet<String> {
        &self.authorities
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }

    /// True when at least one of `roles` is held
    pub fn has_any_authority(&self, roles: &BTreeSet<String>) -> bool {
        // iterate the smaller set
        if roles.len() < self.authorities.len() {
            roles.iter().any(|r| self.authorities.contains(r))
        } else {
            self.authorities.iter().any(|a| roles.contains(a))
        }
    }

    pub fn with_authority(mut self, authority: &str) -> Self {
        self.authorities.insert(authority.to_string());
        self
    }
}

impl fmt::Display for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.username {
            Some(name) => write!(f, "{}", name)?,
            None => write!(f, "<anonymous>")?,
        }
        let roles: Vec<&str> = self.authorities.iter().map(String::as_str).collect();
        write!(f, " [{}]", roles.join(","))
    }
}

/// The OWS request being served, if any
///
/// `service` and `request` follow the OWS naming (`WMS`, `GetCapabilities`).
/// `admin` marks administrative requests coming from the GUI or REST API,
/// for which workspace visibility requires the ADMIN access mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    service: Option<String>,
    request: Option<String>,
    admin: bool,
}

impl RequestContext {
    /// No OWS request in progress
    pub fn none() -> Self {
        Self::default()
    }

    pub fn ows(service: &str, request: &str) -> Self {
        Self {
            service: Some(service.to_string()),
            request: Some(request.to_string()),
            admin: false,
        }
    }

    /// An administrative (GUI/REST) request
    pub fn admin() -> Self {
        Self {
            service: None,
            request: None,
            admin: true,
        }
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    pub fn request(&self) -> Option<&str> {
        self.request.as_deref()
    }

    pub fn is_admin_request(&self) -> bool {
        self.admin
    }

    pub fn is_get_capabilities(&self) -> bool {
        self.request
            .as_deref()
            .map(|r| r.eq_ignore_ascii_case("GetCapabilities"))
            .unwrap_or(false)
    }

    /// Layer group containment gates member visibility unless a non-WMS
    /// service is being served
    pub fn applies_group_containment(&self) -> bool {
        match self.service.as_deref() {
            Some(service) => service.eq_ignore_ascii_case("WMS"),
            None => true,
        }
    }
}

/// Authentication plus request, threaded through every decision call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityContext {
    pub auth: Authentication,
    pub request: RequestContext,
}

impl SecurityContext {
    pub fn new(auth: Authentication, request: RequestContext) -> Self {
        Self { auth, request }
    }

    pub fn anonymous() -> Self {
        Self::new(Authentication::anonymous(), RequestContext::none())
    }

    /// Same authentication, different request
    pub fn with_request(&self, request: RequestContext) -> Self {
        Self::new(self.auth.clone(), request)
    }
}

impl From<Authentication> for SecurityContext {
    fn from(auth: Authentication) -> Self {
        Self::new(auth, RequestContext::none())
    }
}
