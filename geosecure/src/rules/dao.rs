// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Generic access rule store
//!
//! The DAO owns the authoritative rule collection for one rule family. Rules
//! live in an immutable snapshot behind an `Arc`; every mutation builds a new
//! snapshot and swaps it in under a short write lock, so readers always see a
//! complete pre- or post-mutation rule list and never block on file I/O.
//!
//! File-backed DAOs watch their property file: reads check the file's
//! modification stamp, at most once per check interval, and reload it when it
//! changed behind our back. Writes made through [`AccessRuleDao::store_rules`]
//! refresh the stamp under the store lock, and reloads take the same lock, so
//! the DAO never mistakes its own write for an external edit.

use super::error::RuleResult;
use super::properties::PropertyList;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Minimum time between two staleness checks of a rule file
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// A rule that can be stored in an [`AccessRuleDao`]
///
/// Equality must mean "same key": two rules differing only in their roles are
/// equal, and a DAO never holds two equal rules.
pub trait AccessRule: Clone + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Short name used in log messages
    const KIND: &'static str;

    /// Keep insertion (file) order instead of sorting by key
    const ORDERED: bool = false;

    /// Property keys that carry settings rather than rules
    const RESERVED_KEYS: &'static [&'static str] = &[];

    fn key(&self) -> String;

    fn value(&self) -> String;

    fn roles(&self) -> &BTreeSet<String>;

    fn parse(key: &str, value: &str) -> RuleResult<Self>;

    /// Rules used when no rule file exists yet
    fn default_rules() -> Vec<Self> {
        Vec::new()
    }
}

/// Immutable view of a DAO's state at one revision
#[derive(Debug, Clone)]
pub struct RuleSnapshot<R> {
    rules: Vec<R>,
    settings: Vec<(String, String)>,
    revision: u64,
}

impl<R: AccessRule> RuleSnapshot<R> {
    fn empty() -> Self {
        Self {
            rules: Vec::new(),
            settings: Vec::new(),
            revision: 0,
        }
    }

    pub fn rules(&self) -> &[R] {
        &self.rules
    }

    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Incremented on every change, used by consumers to detect staleness
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: SystemTime,
    len: u64,
}

impl FileStamp {
    fn read(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        Some(Self {
            modified: meta.modified().ok()?,
            len: meta.len(),
        })
    }
}

/// Property file plus the stamp of the version last read or written
struct WatchedFile {
    path: PathBuf,
    stamp: Mutex<Option<FileStamp>>,
    last_check: Mutex<Option<Instant>>,
    check_interval: Duration,
}

impl WatchedFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            stamp: Mutex::new(None),
            last_check: Mutex::new(None),
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    /// Whether enough time passed since the last check; records this one
    fn due_for_check(&self) -> bool {
        let now = Instant::now();
        let mut last = self.last_check.lock();
        match *last {
            Some(at) if now.duration_since(at) < self.check_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    fn is_modified(&self) -> bool {
        let current = FileStamp::read(&self.path);
        current.is_some() && current != *self.stamp.lock()
    }
}

/// Concurrent, optionally file-backed rule store
pub struct AccessRuleDao<R: AccessRule> {
    state: RwLock<Arc<RuleSnapshot<R>>>,
    file: Option<WatchedFile>,
    store_lock: Mutex<()>,
}

impl<R: AccessRule> AccessRuleDao<R> {
    /// In-memory DAO holding `rules`
    pub fn new(rules: Vec<R>) -> Self {
        let dao = Self {
            state: RwLock::new(Arc::new(RuleSnapshot::empty())),
            file: None,
            store_lock: Mutex::new(()),
        };
        dao.set_rules(rules);
        dao
    }

    /// In-memory DAO holding the rule family's defaults
    pub fn with_defaults() -> Self {
        Self::new(R::default_rules())
    }

    /// In-memory DAO parsed from a property list; invalid rules are skipped
    pub fn from_properties(props: &PropertyList) -> Self {
        let dao = Self {
            state: RwLock::new(Arc::new(RuleSnapshot::empty())),
            file: None,
            store_lock: Mutex::new(()),
        };
        dao.install(Self::build_snapshot(props));
        dao
    }

    /// DAO backed by a property file
    ///
    /// A missing file is not an error: the DAO starts from the defaults and
    /// picks the file up as soon as it appears.
    pub fn from_file(path: impl Into<PathBuf>) -> RuleResult<Self> {
        let path = path.into();
        let dao = Self {
            state: RwLock::new(Arc::new(RuleSnapshot::empty())),
            file: Some(WatchedFile::new(path.clone())),
            store_lock: Mutex::new(()),
        };
        if path.exists() {
            dao.reload()?;
        } else {
            log::info!(
                "{} does not exist, using default {} access rules",
                path.display(),
                R::KIND
            );
            dao.set_rules(R::default_rules());
        }
        Ok(dao)
    }

    /// Change how often reads may stat the backing file
    ///
    /// `Duration::ZERO` checks on every read.
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        if let Some(file) = &mut self.file {
            file.check_interval = interval;
        }
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|f| f.path.as_path())
    }

    /// Parse a flat key/value pair into a rule
    pub fn parse_rule(key: &str, value: &str) -> RuleResult<R> {
        R::parse(key, value)
    }

    /// Current state, reloading the backing file first if it changed
    ///
    /// The file is looked at no more than once per check interval.
    pub fn snapshot(&self) -> Arc<RuleSnapshot<R>> {
        self.check_for_updates();
        self.state.read().clone()
    }

    /// Order-preserving copy of the current rules
    pub fn rules(&self) -> Vec<R> {
        self.snapshot().rules().to_vec()
    }

    pub fn revision(&self) -> u64 {
        self.snapshot().revision()
    }

    /// Look a rule up by its key
    pub fn rule(&self, key: &str) -> Option<R> {
        let snapshot = self.snapshot();
        match R::parse(key, "") {
            Ok(wanted) => snapshot.rules().iter().find(|r| **r == wanted).cloned(),
            Err(_) => snapshot.rules().iter().find(|r| r.key() == key).cloned(),
        }
    }

    /// Rules granting something to `role`
    pub fn rules_for_role(&self, role: &str) -> Vec<R> {
        self.snapshot()
            .rules()
            .iter()
            .filter(|r| r.roles().contains(role))
            .cloned()
            .collect()
    }

    pub fn setting(&self, key: &str) -> Option<String> {
        self.snapshot().setting(key).map(String::from)
    }

    pub fn set_setting(&self, key: &str, value: &str) {
        self.update(|_, settings| {
            match settings.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
                Some(entry) if entry.1 == value => return (false, ()),
                Some(entry) => entry.1 = value.to_string(),
                None => settings.push((key.to_string(), value.to_string())),
            }
            (true, ())
        })
    }

    /// Add a rule unless one with the same key exists
    pub fn add_rule(&self, rule: R) -> bool {
        self.update(|rules, _| {
            if rules.contains(&rule) {
                return (false, false);
            }
            insert_rule(rules, rule);
            (true, true)
        })
    }

    /// Add all rules or none; the error lists the keys already present
    pub fn add_rules(&self, new_rules: Vec<R>) -> Result<(), Vec<String>> {
        self.update(|rules, _| {
            let mut conflicts: Vec<String> = Vec::new();
            for (i, rule) in new_rules.iter().enumerate() {
                if rules.contains(rule) || new_rules[..i].contains(rule) {
                    conflicts.push(rule.key());
                }
            }
            if !conflicts.is_empty() {
                return (false, Err(conflicts));
            }
            for rule in new_rules {
                insert_rule(rules, rule);
            }
            (true, Ok(()))
        })
    }

    /// Replace existing rules by key, all or none; the error lists unknown keys
    pub fn update_rules(&self, changed: Vec<R>) -> Result<(), Vec<String>> {
        self.update(|rules, _| {
            let missing: Vec<String> = changed
                .iter()
                .filter(|r| !rules.contains(r))
                .map(|r| r.key())
                .collect();
            if !missing.is_empty() {
                return (false, Err(missing));
            }
            for rule in changed {
                if let Some(slot) = rules.iter_mut().find(|r| **r == rule) {
                    *slot = rule;
                }
            }
            (true, Ok(()))
        })
    }

    /// Remove the rule with the same key, reporting whether one was removed
    pub fn remove_rule(&self, rule: &R) -> bool {
        self.update(|rules, _| match rules.iter().position(|r| r == rule) {
            Some(pos) => {
                rules.remove(pos);
                (true, true)
            }
            None => (false, false),
        })
    }

    /// Replace the whole rule set; later duplicates are dropped
    pub fn set_rules(&self, new_rules: Vec<R>) {
        self.update(|rules, _| {
            rules.clear();
            for rule in new_rules {
                if rules.contains(&rule) {
                    log::warn!("Dropping duplicate {} rule {}", R::KIND, rule);
                    continue;
                }
                insert_rule(rules, rule);
            }
            (true, ())
        })
    }

    pub fn clear(&self) {
        self.update(|rules, _| {
            let changed = !rules.is_empty();
            rules.clear();
            (changed, ())
        })
    }

    /// Rewrite rules in place; `f` returns the replacement for rules it changes
    ///
    /// A rewritten rule colliding with an existing key is dropped in favour of
    /// the rule already there. Returns how many rules were rewritten.
    pub fn rewrite_rules<F>(&self, mut f: F) -> usize
    where
        F: FnMut(&R) -> Option<R>,
    {
        self.update(|rules, _| {
            let mut kept: Vec<R> = Vec::with_capacity(rules.len());
            let mut rewritten: Vec<R> = Vec::new();
            for rule in rules.drain(..) {
                match f(&rule) {
                    Some(replacement) => rewritten.push(replacement),
                    None => kept.push(rule),
                }
            }
            let count = rewritten.len();
            for rule in rewritten {
                if kept.contains(&rule) {
                    log::warn!(
                        "Rewritten {} rule {} collides with an existing rule, keeping the existing one",
                        R::KIND,
                        rule
                    );
                    continue;
                }
                insert_rule(&mut kept, rule);
            }
            *rules = kept;
            (count > 0, count)
        })
    }

    /// Settings followed by rules, in the file layout
    pub fn to_properties(&self) -> PropertyList {
        let snapshot = self.snapshot();
        let mut props = PropertyList::new();
        for (key, value) in &snapshot.settings {
            props.set(key, value);
        }
        for rule in snapshot.rules() {
            props.set(&rule.key(), &rule.value());
        }
        props
    }

    /// Write the current rules to the backing file, if any
    pub fn store_rules(&self) -> RuleResult<()> {
        let Some(file) = &self.file else {
            log::debug!("{} rules are not file backed, nothing to store", R::KIND);
            return Ok(());
        };
        let _guard = self.store_lock.lock();
        // snapshot taken under the store lock so the last writer stores the newest rules
        let props = {
            let snapshot = self.state.read().clone();
            let mut props = PropertyList::new();
            for (key, value) in &snapshot.settings {
                props.set(key, value);
            }
            for rule in snapshot.rules() {
                props.set(&rule.key(), &rule.value());
            }
            props
        };
        props.store(&file.path, Some(&format!("{} access rules", R::KIND)))?;
        *file.stamp.lock() = FileStamp::read(&file.path);
        log::info!(
            "Stored {} {} rules to {}",
            props.len(),
            R::KIND,
            file.path.display()
        );
        Ok(())
    }

    /// Re-read the backing file unconditionally
    pub fn reload(&self) -> RuleResult<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        let _guard = self.store_lock.lock();
        self.load(file)
    }

    /// Caller holds `store_lock`
    fn load(&self, file: &WatchedFile) -> RuleResult<()> {
        let stamp = FileStamp::read(&file.path);
        let props = PropertyList::load(&file.path)?;
        let snapshot = Self::build_snapshot(&props);
        log::info!(
            "Loaded {} {} rules from {}",
            snapshot.len(),
            R::KIND,
            file.path.display()
        );
        self.install(snapshot);
        *file.stamp.lock() = stamp;
        Ok(())
    }

    /// Whether the backing file changed since it was last read or written
    pub fn is_modified(&self) -> bool {
        self.file.as_ref().is_some_and(WatchedFile::is_modified)
    }

    fn check_for_updates(&self) {
        let Some(file) = &self.file else {
            return;
        };
        if !file.due_for_check() || !file.is_modified() {
            return;
        }
        // a store in flight has written the file but not yet its stamp
        let _guard = self.store_lock.lock();
        if !file.is_modified() {
            return;
        }
        if let Err(e) = self.load(file) {
            log::warn!("Failed to reload {} access rules: {}", R::KIND, e);
        }
    }

    fn build_snapshot(props: &PropertyList) -> RuleSnapshot<R> {
        let mut rules: Vec<R> = Vec::new();
        let mut settings = Vec::new();
        for (key, value) in props.iter() {
            if R::RESERVED_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key)) {
                settings.push((key.to_string(), value.to_string()));
                continue;
            }
            match R::parse(key, value) {
                Ok(rule) => {
                    if rules.contains(&rule) {
                        log::warn!(
                            "Skipping {} rule {}={}, another rule already targets the same key",
                            R::KIND,
                            key,
                            value
                        );
                        continue;
                    }
                    insert_rule(&mut rules, rule);
                }
                Err(e) => log::warn!("Skipping {} rule {}={}: {}", R::KIND, key, value, e),
            }
        }
        RuleSnapshot {
            rules,
            settings,
            revision: 0,
        }
    }

    /// Swap in a freshly parsed snapshot, bumping the revision
    fn install(&self, mut snapshot: RuleSnapshot<R>) {
        let mut state = self.state.write();
        snapshot.revision = state.revision + 1;
        *state = Arc::new(snapshot);
    }

    fn update<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&mut Vec<R>, &mut Vec<(String, String)>) -> (bool, T),
    {
        self.check_for_updates();
        let mut state = self.state.write();
        let mut rules = state.rules.clone();
        let mut settings = state.settings.clone();
        let (changed, result) = f(&mut rules, &mut settings);
        if changed {
            *state = Arc::new(RuleSnapshot {
                rules,
                settings,
                revision: state.revision + 1,
            });
        }
        result
    }
}

fn insert_rule<R: AccessRule>(rules: &mut Vec<R>, rule: R) {
    if R::ORDERED {
        rules.push(rule);
    } else {
        let pos = rules.partition_point(|r| r < &rule);
        rules.insert(pos, rule);
    }
}

impl<R: AccessRule> fmt::Debug for AccessRuleDao<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.state.read().clone();
        f.debug_struct("AccessRuleDao")
            .field("kind", &R::KIND)
            .field("rules", &snapshot.len())
            .field("revision", &snapshot.revision())
            .field("path", &self.path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{AccessMode, DataAccessRule, RestAccessRule};

    fn rule(root: &str, layer: &str, roles: &[&str]) -> DataAccessRule {
        DataAccessRule::new(root, layer, AccessMode::Read, roles.iter().copied())
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let dao = AccessRuleDao::new(vec![rule("topp", "states", &["A"])]);
        assert!(!dao.add_rule(rule("topp", "states", &["B"])));
        assert_eq!(dao.rules()[0].value(), "A");
        assert!(dao.add_rule(rule("topp", "roads", &["B"])));
        assert_eq!(dao.rules().len(), 2);
    }

    #[test]
    fn test_sorted_insertion() {
        let dao = AccessRuleDao::new(vec![]);
        dao.add_rule(rule("topp", "states", &["A"]));
        dao.add_rule(rule("*", "*", &["*"]));
        dao.add_rule(rule("nurc", "*", &["B"]));
        let keys: Vec<String> = dao.rules().iter().map(|r| r.key()).collect();
        assert_eq!(keys, vec!["*.*.r", "nurc.*.r", "topp.states.r"]);
    }

    #[test]
    fn test_ordered_rules_keep_insertion_order() {
        let dao: AccessRuleDao<RestAccessRule> = AccessRuleDao::new(vec![]);
        dao.add_rule(RestAccessRule::parse("/rest/b/**;GET", "A").unwrap());
        dao.add_rule(RestAccessRule::parse("/rest/a/**;GET", "A").unwrap());
        let keys: Vec<String> = dao.rules().iter().map(|r| r.key()).collect();
        assert_eq!(keys, vec!["/rest/b/**;GET", "/rest/a/**;GET"]);
    }

    #[test]
    fn test_remove_by_key() {
        let dao = AccessRuleDao::new(vec![rule("topp", "states", &["A"])]);
        assert!(dao.remove_rule(&rule("topp", "states", &[])));
        assert!(!dao.remove_rule(&rule("topp", "states", &[])));
        assert!(dao.rules().is_empty());
    }

    #[test]
    fn test_revision_changes_only_on_mutation() {
        let dao = AccessRuleDao::new(vec![rule("topp", "states", &["A"])]);
        let start = dao.revision();
        assert!(!dao.add_rule(rule("topp", "states", &["A"])));
        assert_eq!(dao.revision(), start);
        dao.add_rule(rule("topp", "roads", &["A"]));
        assert_eq!(dao.revision(), start + 1);
    }

    #[test]
    fn test_add_rules_is_atomic() {
        let dao = AccessRuleDao::new(vec![rule("topp", "states", &["A"])]);
        let result = dao.add_rules(vec![rule("topp", "roads", &["A"]), rule("topp", "states", &["B"])]);
        assert_eq!(result, Err(vec!["topp.states.r".to_string()]));
        assert_eq!(dao.rules().len(), 1);
    }

    #[test]
    fn test_update_rules_requires_existing_keys() {
        let dao = AccessRuleDao::new(vec![rule("topp", "states", &["A"])]);
        assert!(dao.update_rules(vec![rule("topp", "roads", &["B"])]).is_err());
        dao.update_rules(vec![rule("topp", "states", &["B"])]).unwrap();
        assert_eq!(dao.rules()[0].value(), "B");
    }

    #[test]
    fn test_rewrite_rules_drops_collisions() {
        let dao = AccessRuleDao::new(vec![rule("a", "x", &["1"]), rule("b", "x", &["2"])]);
        let count = dao.rewrite_rules(|r| (r.root() == "a").then(|| r.with_root("b")));
        assert_eq!(count, 1);
        let rules = dao.rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].value(), "2");
    }

    #[test]
    fn test_from_properties_skips_invalid_and_keeps_settings() {
        let props = PropertyList::parse("mode=CHALLENGE\n*.*.r=*\nbad.key.x.y.r=A\ntopp.states.q=A\n");
        let dao: AccessRuleDao<DataAccessRule> = AccessRuleDao::from_properties(&props);
        assert_eq!(dao.rules().len(), 1);
        assert_eq!(dao.setting("MODE").as_deref(), Some("CHALLENGE"));
    }

    #[test]
    fn test_file_checks_are_throttled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layers.properties");
        std::fs::write(&path, "*.*.r=*\n").unwrap();
        let dao: AccessRuleDao<DataAccessRule> = AccessRuleDao::from_file(&path)
            .unwrap()
            .with_check_interval(Duration::from_secs(3600));
        assert_eq!(dao.rules().len(), 1);

        std::fs::write(&path, "*.*.r=READER\n*.*.w=WRITER\n").unwrap();
        assert!(dao.is_modified());
        // checked moments ago, the edit waits for the next interval
        assert_eq!(dao.rules().len(), 1);

        dao.reload().unwrap();
        assert_eq!(dao.rules().len(), 2);
        assert!(!dao.is_modified());
    }

    #[test]
    fn test_rule_lookup_by_key() {
        let dao = AccessRuleDao::new(vec![rule("my.ws", "states", &["A"])]);
        assert!(dao.rule("my\\.ws.states.r").is_some());
        assert!(dao.rule("my.ws.states.r").is_none());
    }
}
