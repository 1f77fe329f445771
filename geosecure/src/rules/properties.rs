// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Flat property-list format used by the rule files
//!
//! One `key=value` pair per line, `#` and `!` start comments, blank lines are
//! ignored. Keys are kept verbatim (backslashes included) so that the dot
//! escaping used inside rule keys survives a round trip. Entry order is
//! preserved, which matters for first-match rule sets.

use super::error::{RuleError, RuleResult};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Ordered list of key/value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyList {
    entries: Vec<(String, String)>,
}

impl PropertyList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse property text; a repeated key replaces the earlier value in place
    pub fn parse(text: &str) -> Self {
        let mut props = Self::new();
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => props.set(key.trim(), value.trim()),
                None => {
                    log::warn!(
                        "Line {} has no '=' separator, reading '{}' as a key with an empty value",
                        lineno + 1,
                        line
                    );
                    props.set(line, "");
                }
            }
        }
        props
    }

    pub fn load(path: &Path) -> RuleResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as text, with an optional header comment and a timestamp line
    pub fn to_text(&self, header: Option<&str>) -> String {
        let mut out = String::new();
        if let Some(header) = header {
            for line in header.lines() {
                out.push_str("# ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push_str(&format!(
            "#{}\n",
            chrono::Utc::now().format("%a %b %d %H:%M:%S UTC %Y")
        ));
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    /// Write to `path` through a sibling temporary file and a rename
    pub fn store(&self, path: &Path, header: Option<&str>) -> RuleResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file_name = path
            .file_name()
            .ok_or_else(|| RuleError::Persistence(format!("{} is not a file", path.display())))?;
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        fs::write(&tmp, self.to_text(header))?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            RuleError::Persistence(format!("Failed to replace {}: {}", path.display(), e))
        })?;
        Ok(())
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for PropertyList {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut props = PropertyList::new();
        for (k, v) in iter {
            props.set(k, v);
        }
        props
    }
}

/// Split a key on unescaped separators, removing the escapes
///
/// A backslash makes the next character literal, so `a\.b.c` splits into
/// `a.b` and `c`.
pub fn split_escaped(key: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = key.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => current.push(next),
                None => current.push('\\'),
            }
        } else if c == separator {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

/// Escape a workspace or layer name so it can be embedded in a dotted key
pub fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c == '\\' || c == '.' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Parse a comma separated role list, dropping blanks and duplicates
pub fn parse_roles(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect()
}

pub fn join_roles(roles: &BTreeSet<String>) -> String {
    roles.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let props = PropertyList::parse(
            "# header\n! other comment\n\n*.*.r = *\n topp.states.w=WRITER, ADMIN \n",
        );
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("*.*.r"), Some("*"));
        assert_eq!(props.get("topp.states.w"), Some("WRITER, ADMIN"));
    }

    #[test]
    fn test_parse_keeps_order_and_replaces_duplicates() {
        let props = PropertyList::parse("b=1\na=2\nb=3\n");
        let keys: Vec<&str> = props.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(props.get("b"), Some("3"));
    }

    #[test]
    fn test_split_escaped() {
        assert_eq!(split_escaped("a.b.r", '.'), vec!["a", "b", "r"]);
        assert_eq!(split_escaped("a\\.b.c.r", '.'), vec!["a.b", "c", "r"]);
        assert_eq!(split_escaped("a\\\\.b", '.'), vec!["a\\", "b"]);
        assert_eq!(split_escaped("trailing\\", '.'), vec!["trailing\\"]);
    }

    #[test]
    fn test_escape_name_reverses_split() {
        for name in ["plain", "with.dot", "two.dots.here", "back\\slash", "mix\\.ed"] {
            let key = format!("{}.{}.r", escape_name(name), escape_name("layer"));
            let parts = split_escaped(&key, '.');
            assert_eq!(parts, vec![name.to_string(), "layer".to_string(), "r".to_string()]);
        }
    }

    #[test]
    fn test_parse_roles() {
        let roles = parse_roles(" B, A,,B , ");
        assert_eq!(roles.len(), 2);
        assert_eq!(join_roles(&roles), "A,B");
        assert!(parse_roles("").is_empty());
    }

    #[test]
    fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rules.properties");

        let props: PropertyList = [("x\\.y.z.r", "A,B"), ("mode", "HIDE")].into_iter().collect();
        props.store(&path, Some("Data access rules")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Data access rules\n#"));
        assert_eq!(PropertyList::load(&path).unwrap(), props);
        assert!(!dir.path().join("nested").join("rules.properties.tmp").exists());
    }
}
