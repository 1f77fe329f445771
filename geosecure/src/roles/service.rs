// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Role and user group sources
//!
//! Storage backends live outside this crate; the engine only reads through
//! these traits. The in-memory implementations back tests, the CLI and
//! embedders that manage users themselves.

use super::error::{RoleError, RoleResult};
use super::hierarchy::RoleHierarchyHelper;
use super::model::{Role, User, UserGroup};
use crate::auth::is_reserved_role;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub trait RoleService: Send + Sync {
    fn role(&self, name: &str) -> Option<Role>;

    fn roles(&self) -> Vec<Role>;

    /// Roles assigned directly to a user
    fn roles_for_user(&self, username: &str) -> BTreeSet<Role>;

    /// Roles assigned to a group
    fn roles_for_group(&self, group: &str) -> BTreeSet<Role>;

    /// Role name to parent role name, covering every known role
    fn parent_mappings(&self) -> HashMap<String, Option<String>>;

    /// Local role mapped onto the global administrator role
    fn admin_role(&self) -> Option<String> {
        None
    }

    /// Local role mapped onto the global group administrator role
    fn group_admin_role(&self) -> Option<String> {
        None
    }
}

pub trait UserGroupService: Send + Sync {
    fn user(&self, username: &str) -> Option<User>;

    fn groups_for_user(&self, username: &str) -> Vec<UserGroup>;
}

#[derive(Debug, Default)]
struct RoleStore {
    roles: BTreeMap<String, Role>,
    parents: HashMap<String, Option<String>>,
    user_roles: HashMap<String, BTreeSet<String>>,
    group_roles: HashMap<String, BTreeSet<String>>,
    admin_role: Option<String>,
    group_admin_role: Option<String>,
}

impl RoleStore {
    fn resolve(&self, names: Option<&BTreeSet<String>>) -> BTreeSet<Role> {
        names
            .into_iter()
            .flatten()
            .filter_map(|name| self.roles.get(name).cloned())
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct MemoryRoleService {
    store: RwLock<RoleStore>,
}

impl MemoryRoleService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a role, keeping its parent and assignments
    ///
    /// System roles granted by the authentication layer cannot be stored.
    pub fn add_role(&self, role: Role) -> RoleResult<()> {
        if is_reserved_role(role.name()) {
            return Err(RoleError::ReservedRole(role.name().to_string()));
        }
        let mut store = self.store.write();
        store.parents.entry(role.name().to_string()).or_insert(None);
        store.roles.insert(role.name().to_string(), role);
        Ok(())
    }

    pub fn remove_role(&self, name: &str) -> RoleResult<()> {
        let mut guard = self.store.write();
        let store = &mut *guard;
        if store.roles.remove(name).is_none() {
            return Err(RoleError::UnknownRole(name.to_string()));
        }
        store.parents.remove(name);
        for parent in store.parents.values_mut() {
            if parent.as_deref() == Some(name) {
                *parent = None;
            }
        }
        for assigned in store.user_roles.values_mut().chain(store.group_roles.values_mut()) {
            assigned.remove(name);
        }
        Ok(())
    }

    /// Set the parent of `role`, rejecting assignments that would form a cycle
    pub fn set_parent(&self, role: &str, parent: Option<&str>) -> RoleResult<()> {
        let mut store = self.store.write();
        let helper = RoleHierarchyHelper::new(store.parents.clone());
        if !helper.is_valid_parent(role, parent)? {
            return Err(RoleError::InvalidParent {
                role: role.to_string(),
                parent: parent.unwrap_or_default().to_string(),
            });
        }
        store.parents.insert(role.to_string(), parent.map(String::from));
        Ok(())
    }

    /// Replace the parent map as is, without validation
    ///
    /// Used when importing mappings maintained elsewhere; a malformed map is
    /// reported when the hierarchy is queried.
    pub fn load_parent_mappings(&self, mappings: HashMap<String, Option<String>>) {
        let mut store = self.store.write();
        for (role, parent) in mappings {
            if !store.roles.contains_key(&role) {
                store.roles.insert(role.clone(), Role::new(&role));
            }
            store.parents.insert(role, parent);
        }
    }

    pub fn assign_user_role(&self, username: &str, role: &str) -> RoleResult<()> {
        let mut store = self.store.write();
        if !store.roles.contains_key(role) {
            return Err(RoleError::UnknownRole(role.to_string()));
        }
        store
            .user_roles
            .entry(username.to_string())
            .or_default()
            .insert(role.to_string());
        Ok(())
    }

    pub fn revoke_user_role(&self, username: &str, role: &str) -> bool {
        self.store
            .write()
            .user_roles
            .get_mut(username)
            .map(|roles| roles.remove(role))
            .unwrap_or(false)
    }

    pub fn assign_group_role(&self, group: &str, role: &str) -> RoleResult<()> {
        let mut store = self.store.write();
        if !store.roles.contains_key(role) {
            return Err(RoleError::UnknownRole(role.to_string()));
        }
        store
            .group_roles
            .entry(group.to_string())
            .or_default()
            .insert(role.to_string());
        Ok(())
    }

    pub fn revoke_group_role(&self, group: &str, role: &str) -> bool {
        self.store
            .write()
            .group_roles
            .get_mut(group)
            .map(|roles| roles.remove(role))
            .unwrap_or(false)
    }

    pub fn set_admin_role(&self, role: Option<&str>) {
        self.store.write().admin_role = role.map(String::from);
    }

    pub fn set_group_admin_role(&self, role: Option<&str>) {
        self.store.write().group_admin_role = role.map(String::from);
    }
}

impl RoleService for MemoryRoleService {
    fn role(&self, name: &str) -> Option<Role> {
        self.store.read().roles.get(name).cloned()
    }

    fn roles(&self) -> Vec<Role> {
        self.store.read().roles.values().cloned().collect()
    }

    fn roles_for_user(&self, username: &str) -> BTreeSet<Role> {
        let store = self.store.read();
        store.resolve(store.user_roles.get(username))
    }

    fn roles_for_group(&self, group: &str) -> BTreeSet<Role> {
        let store = self.store.read();
        store.resolve(store.group_roles.get(group))
    }

    fn parent_mappings(&self) -> HashMap<String, Option<String>> {
        self.store.read().parents.clone()
    }

    fn admin_role(&self) -> Option<String> {
        self.store.read().admin_role.clone()
    }

    fn group_admin_role(&self) -> Option<String> {
        self.store.read().group_admin_role.clone()
    }
}

#[derive(Debug, Default)]
struct UserGroupStore {
    users: BTreeMap<String, User>,
    groups: BTreeMap<String, UserGroup>,
    memberships: HashMap<String, BTreeSet<String>>,
}

#[derive(Debug, Default)]
pub struct MemoryUserGroupService {
    store: RwLock<UserGroupStore>,
}

impl MemoryUserGroupService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        self.store
            .write()
            .users
            .insert(user.username().to_string(), user);
    }

    pub fn add_group(&self, group: UserGroup) {
        self.store
            .write()
            .groups
            .insert(group.name().to_string(), group);
    }

    pub fn set_group_enabled(&self, group: &str, enabled: bool) -> RoleResult<()> {
        let mut store = self.store.write();
        let group = store
            .groups
            .get_mut(group)
            .ok_or_else(|| RoleError::UnknownGroup(group.to_string()))?;
        group.set_enabled(enabled);
        Ok(())
    }

    pub fn add_membership(&self, username: &str, group: &str) -> RoleResult<()> {
        let mut store = self.store.write();
        if !store.users.contains_key(username) {
            return Err(RoleError::UnknownUser(username.to_string()));
        }
        if !store.groups.contains_key(group) {
            return Err(RoleError::UnknownGroup(group.to_string()));
        }
        store
            .memberships
            .entry(username.to_string())
            .or_default()
            .insert(group.to_string());
        Ok(())
    }

    pub fn remove_membership(&self, username: &str, group: &str) -> bool {
        self.store
            .write()
            .memberships
            .get_mut(username)
            .map(|groups| groups.remove(group))
            .unwrap_or(false)
    }
}

impl UserGroupService for MemoryUserGroupService {
    fn user(&self, username: &str) -> Option<User> {
        self.store.read().users.get(username).cloned()
    }

    fn groups_for_user(&self, username: &str) -> Vec<UserGroup> {
        let store = self.store.read();
        store
            .memberships
            .get(username)
            .into_iter()
            .flatten()
            .filter_map(|name| store.groups.get(name).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_parent_rejects_cycles() {
        let service = MemoryRoleService::new();
        service.add_role(Role::new("A")).unwrap();
        service.add_role(Role::new("B")).unwrap();
        service.set_parent("B", Some("A")).unwrap();
        assert!(matches!(
            service.set_parent("A", Some("B")),
            Err(RoleError::InvalidParent { .. })
        ));
        assert!(matches!(
            service.set_parent("A", Some("C")),
            Err(RoleError::UnknownRole(_))
        ));
    }

    #[test]
    fn test_remove_role_clears_references() {
        let service = MemoryRoleService::new();
        service.add_role(Role::new("A")).unwrap();
        service.add_role(Role::new("B")).unwrap();
        service.set_parent("B", Some("A")).unwrap();
        service.assign_user_role("bob", "A").unwrap();
        service.remove_role("A").unwrap();
        assert_eq!(service.parent_mappings().get("B"), Some(&None));
        assert!(service.roles_for_user("bob").is_empty());
    }

    #[test]
    fn test_reserved_roles_cannot_be_stored() {
        let service = MemoryRoleService::new();
        assert_eq!(
            service.add_role(Role::new("ROLE_ANONYMOUS")),
            Err(RoleError::ReservedRole("ROLE_ANONYMOUS".to_string()))
        );
        assert!(service.roles().is_empty());
    }

    #[test]
    fn test_assign_unknown_role() {
        let service = MemoryRoleService::new();
        assert!(service.assign_user_role("bob", "A").is_err());
        assert!(service.assign_group_role("g", "A").is_err());
    }

    #[test]
    fn test_memberships() {
        let service = MemoryUserGroupService::new();
        service.add_user(User::new("bob"));
        service.add_group(UserGroup::new("staff"));
        assert!(service.add_membership("bob", "nobody").is_err());
        service.add_membership("bob", "staff").unwrap();
        assert_eq!(service.groups_for_user("bob").len(), 1);
        assert!(service.remove_membership("bob", "staff"));
        assert!(service.groups_for_user("bob").is_empty());
    }
}
