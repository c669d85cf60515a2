//! ---
//! weft_section: "06-security-access-control"
//! weft_subsection: "module"
//! weft_type: "source"
//! weft_scope: "code"
//! weft_description: "Access-control model, decision algorithm, and grant maintenance."
//! weft_version: "v0.0.0-prealpha"
//! weft_owner: "tbd"
//! ---
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::authorization::{Authorization, AuthorizationKind, Identity};
use crate::error::AuthzError;
use crate::resource::{ResourceType, ANY};

/// Persistence contract for authorization rows.
///
/// Implementations must be `Send + Sync`; the decision algorithm reads the
/// snapshot visible to the caller and performs no writes of its own.
pub trait AuthorizationStore: Send + Sync + fmt::Debug {
    /// Persist a new row. Fails with a validation error on malformed or
    /// reserved values; the offending write never reaches the store.
    fn insert(&self, row: Authorization) -> Result<Authorization, AuthzError>;

    /// Replace an existing row. Fails with `NotFound` on an unknown id.
    fn update(&self, row: Authorization) -> Result<Authorization, AuthzError>;

    /// Delete a row by id. Fails with `NotFound` on an unknown id.
    fn remove(&self, id: &str) -> Result<Authorization, AuthzError>;

    /// Fetch a row by id.
    fn get(&self, id: &str) -> Option<Authorization>;

    /// Enumerate every row in insertion order.
    fn list(&self) -> Vec<Authorization>;

    /// Every row relevant to one decision: global rows for the resource
    /// type scoped to the wildcard or the exact id, and grant/revoke rows
    /// with the same resource scope whose identity is the user or one of
    /// the groups.
    fn find_applicable(
        &self,
        resource: ResourceType,
        resource_id: &str,
        user_id: &str,
        group_ids: &[String],
    ) -> Vec<Authorization>;

    /// Exact-scope lookup backing upsert: the row with this kind, identity,
    /// and resource scope, if one exists.
    fn find_scoped(
        &self,
        kind: AuthorizationKind,
        identity: Option<&Identity>,
        resource: ResourceType,
        resource_id: &str,
    ) -> Option<Authorization>;

    /// Drop every row scoped to one concrete resource instance. Wildcard
    /// rows for the type are untouched. Returns the number of rows removed.
    fn purge_resource(&self, resource: ResourceType, resource_id: &str) -> usize;
}

type ScopeKey = (ResourceType, String);

#[derive(Debug, Default)]
struct StoreInner {
    rows: IndexMap<String, Authorization>,
    by_scope: HashMap<ScopeKey, HashSet<String>>,
}

impl StoreInner {
    fn index(&mut self, row: &Authorization) {
        self.by_scope
            .entry((row.resource, row.resource_id.clone()))
            .or_default()
            .insert(row.id.clone());
    }

    fn unindex(&mut self, row: &Authorization) {
        let key = (row.resource, row.resource_id.clone());
        if let Some(ids) = self.by_scope.get_mut(&key) {
            ids.remove(&row.id);
            if ids.is_empty() {
                self.by_scope.remove(&key);
            }
        }
    }

    fn scoped_ids(&self, resource: ResourceType, resource_id: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .by_scope
            .get(&(resource, ANY.to_string()))
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        if resource_id != ANY {
            ids.extend(
                self.by_scope
                    .get(&(resource, resource_id.to_string()))
                    .into_iter()
                    .flatten()
                    .cloned(),
            );
        }
        ids
    }
}

/// In-memory [`AuthorizationStore`] suitable for development and testing.
///
/// Rows are kept in an ordered id map with a (resource, resource id) index,
/// so applicable-row lookup is bounded by the rows scoped to one instance
/// plus the wildcard rows of its type.
#[derive(Debug, Default, Clone)]
pub struct MemoryAuthorizationStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl MemoryAuthorizationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    /// Whether the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuthorizationStore for MemoryAuthorizationStore {
    fn insert(&self, row: Authorization) -> Result<Authorization, AuthzError> {
        row.validate()?;
        let mut inner = self.inner.write();
        if inner.rows.contains_key(&row.id) {
            return Err(AuthzError::Validation(
                crate::error::ValidationError::Malformed {
                    reason: format!("duplicate authorization id {}", row.id),
                },
            ));
        }
        inner.index(&row);
        inner.rows.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    fn update(&self, row: Authorization) -> Result<Authorization, AuthzError> {
        row.validate()?;
        let mut inner = self.inner.write();
        let Some(previous) = inner.rows.get(&row.id).cloned() else {
            return Err(AuthzError::NotFound { id: row.id });
        };
        inner.unindex(&previous);
        inner.index(&row);
        inner.rows.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    fn remove(&self, id: &str) -> Result<Authorization, AuthzError> {
        let mut inner = self.inner.write();
        let Some(row) = inner.rows.shift_remove(id) else {
            return Err(AuthzError::NotFound { id: id.to_string() });
        };
        inner.unindex(&row);
        Ok(row)
    }

    fn get(&self, id: &str) -> Option<Authorization> {
        self.inner.read().rows.get(id).cloned()
    }

    fn list(&self) -> Vec<Authorization> {
        self.inner.read().rows.values().cloned().collect()
    }

    fn find_applicable(
        &self,
        resource: ResourceType,
        resource_id: &str,
        user_id: &str,
        group_ids: &[String],
    ) -> Vec<Authorization> {
        let inner = self.inner.read();
        inner
            .scoped_ids(resource, resource_id)
            .into_iter()
            .filter_map(|id| inner.rows.get(&id))
            .filter(|row| match (&row.kind, &row.identity) {
                (AuthorizationKind::Global, _) => true,
                (_, Some(identity)) => identity.matches(user_id, group_ids),
                (_, None) => false,
            })
            .cloned()
            .collect()
    }

    fn find_scoped(
        &self,
        kind: AuthorizationKind,
        identity: Option<&Identity>,
        resource: ResourceType,
        resource_id: &str,
    ) -> Option<Authorization> {
        let inner = self.inner.read();
        inner
            .by_scope
            .get(&(resource, resource_id.to_string()))
            .into_iter()
            .flatten()
            .filter_map(|id| inner.rows.get(id))
            .find(|row| row.kind == kind && row.identity.as_ref() == identity)
            .cloned()
    }

    fn purge_resource(&self, resource: ResourceType, resource_id: &str) -> usize {
        let mut inner = self.inner.write();
        let Some(ids) = inner.by_scope.remove(&(resource, resource_id.to_string())) else {
            return 0;
        };
        let mut purged = 0;
        for id in ids {
            if inner.rows.shift_remove(&id).is_some() {
                purged += 1;
            }
        }
        purged
    }
}
