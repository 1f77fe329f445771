// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! REST access rules: `/ant/path/**;GET,POST=role1,role2`
//!
//! Rules are matched in file order and the first rule whose pattern and
//! method set match a request decides.

use super::dao::AccessRule;
use super::error::{RuleError, RuleResult};
use super::properties::{join_roles, parse_roles};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "PATCH" => Ok(HttpMethod::Patch),
            "TRACE" => Ok(HttpMethod::Trace),
            other => Err(format!("Unknown HTTP method '{}'", other)),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RestAccessRule {
    pattern: String,
    methods: BTreeSet<HttpMethod>,
    roles: BTreeSet<String>,
    matcher: Regex,
}

impl RestAccessRule {
    pub fn new<I, S>(pattern: &str, methods: &[HttpMethod], roles: I) -> RuleResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !pattern.starts_with('/') {
            return Err(RuleError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "must start with '/'".to_string(),
            });
        }
        if methods.is_empty() {
            return Err(RuleError::invalid_key(pattern, "no HTTP method given"));
        }
        let matcher = ant_pattern_to_regex(pattern)?;
        Ok(Self {
            pattern: pattern.to_string(),
            methods: methods.iter().copied().collect(),
            roles: roles.into_iter().map(Into::into).collect(),
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn methods(&self) -> &BTreeSet<HttpMethod> {
        &self.methods
    }

    /// Whether the rule covers a request for `path` with `method`
    pub fn matches(&self, path: &str, method: HttpMethod) -> bool {
        self.methods.contains(&method) && self.matcher.is_match(path)
    }
}

/// Translate an Ant style pattern into an anchored, case-insensitive regex
///
/// `**` spans path segments, `*` stays within one segment and `?` matches a
/// single non-separator character. `/**` also matches the empty suffix, so
/// `/rest/**` covers `/rest` itself.
fn ant_pattern_to_regex(pattern: &str) -> RuleResult<Regex> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut re = String::from("(?i)^");
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '/' && chars.get(i + 1) == Some(&'*') && chars.get(i + 2) == Some(&'*') {
            match chars.get(i + 3) {
                None | Some('/') => {
                    re.push_str("(?:/.*)?");
                    i += 3;
                    continue;
                }
                _ => {}
            }
        }
        match c {
            '*' if chars.get(i + 1) == Some(&'*') => {
                re.push_str(".*");
                i += 2;
                continue;
            }
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
        i += 1;
    }
    re.push('$');
    Regex::new(&re).map_err(|e| RuleError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

impl AccessRule for RestAccessRule {
    const KIND: &'static str = "rest";
    const ORDERED: bool = true;

    fn key(&self) -> String {
        let methods: Vec<&str> = self.methods.iter().map(HttpMethod::as_str).collect();
        format!("{};{}", self.pattern, methods.join(","))
    }

    fn value(&self) -> String {
        join_roles(&self.roles)
    }

    fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    fn parse(key: &str, value: &str) -> RuleResult<Self> {
        let (pattern, methods) = key
            .trim()
            .rsplit_once(';')
            .ok_or_else(|| RuleError::invalid_key(key, "expected path;METHOD1,METHOD2"))?;
        let methods = methods
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(|m| {
                m.parse::<HttpMethod>().map_err(|_| RuleError::InvalidMethod {
                    key: key.to_string(),
                    method: m.to_string(),
                })
            })
            .collect::<RuleResult<Vec<_>>>()?;
        Self::new(pattern.trim(), &methods, parse_roles(value))
    }

    fn default_rules() -> Vec<Self> {
        [
            ("/**;GET", "IS_AUTHENTICATED_ANONYMOUSLY"),
            ("/**;POST,DELETE,PUT", "ROLE_ADMINISTRATOR"),
        ]
        .iter()
        .filter_map(|(key, value)| Self::parse(key, value).ok())
        .collect()
    }
}

impl PartialEq for RestAccessRule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.methods == other.methods
    }
}

impl Eq for RestAccessRule {}

impl PartialOrd for RestAccessRule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RestAccessRule {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.pattern, &self.methods).cmp(&(&other.pattern, &other.methods))
    }
}

impl fmt::Display for RestAccessRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key(), self.value())
    }
}
