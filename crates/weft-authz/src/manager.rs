//! ---
//! weft_section: "06-security-access-control"
//! weft_subsection: "module"
//! weft_type: "source"
//! weft_scope: "code"
//! weft_description: "Access-control model, decision algorithm, and grant maintenance."
//! weft_version: "v0.0.0-prealpha"
//! weft_owner: "tbd"
//! ---
use std::sync::Arc;

use tracing::debug;

use crate::authorization::{Authorization, AuthorizationKind, Identity};
use crate::check::{Combine, CompositeCheck, PermissionCheck};
use crate::context::IdentityContext;
use crate::error::{AccessDenied, AuthzError, MissingGrant};
use crate::metrics::AuthzMetrics;
use crate::permission::Permission;
use crate::resource::ResourceType;
use crate::store::AuthorizationStore;

/// Evaluates permission checks against the authorization store and exposes
/// the administrative grant/revoke surface.
///
/// Evaluation is a synchronous read of the store snapshot visible to the
/// caller; it performs no writes.
#[derive(Clone)]
pub struct AuthorizationManager {
    store: Arc<dyn AuthorizationStore>,
    metrics: Option<AuthzMetrics>,
}

impl AuthorizationManager {
    /// Create a manager over the given store.
    pub fn new(store: Arc<dyn AuthorizationStore>) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    /// Attach Prometheus counters.
    pub fn with_metrics(mut self, metrics: AuthzMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The underlying store.
    pub fn store(&self) -> Arc<dyn AuthorizationStore> {
        self.store.clone()
    }

    /// Evaluate a single check for the calling context.
    ///
    /// A suppressed context, or one with no authenticated user
    /// (engine-internal work), is permitted without a store lookup.
    pub fn is_authorized(&self, ctx: &IdentityContext, check: &PermissionCheck) -> bool {
        if ctx.checks_suppressed() {
            return true;
        }
        let Some(user_id) = ctx.current_user() else {
            return true;
        };
        self.is_user_authorized(user_id, ctx.current_groups(), check)
    }

    /// Evaluate a composite check for the calling context.
    pub fn evaluate(&self, ctx: &IdentityContext, composite: &CompositeCheck) -> bool {
        if ctx.checks_suppressed() {
            return true;
        }
        let Some(user_id) = ctx.current_user() else {
            return true;
        };
        let groups = ctx.current_groups();
        match composite.combine {
            Combine::Any => composite
                .checks
                .iter()
                .any(|check| self.is_user_authorized(user_id, groups, check)),
            Combine::All => composite
                .checks
                .iter()
                .all(|check| self.is_user_authorized(user_id, groups, check)),
        }
    }

    /// Evaluate a single check for an explicit identity, walking the
    /// fallback chain until one link succeeds.
    pub fn is_user_authorized(
        &self,
        user_id: &str,
        group_ids: &[String],
        check: &PermissionCheck,
    ) -> bool {
        let mut link = Some(check);
        while let Some(current) = link {
            if self.link_granted(user_id, group_ids, current) {
                return true;
            }
            link = current.fallback.as_deref();
        }
        false
    }

    /// Evaluate one chain link: fold the applicable rows into available and
    /// revoked masks and test the permission bit against both.
    fn link_granted(&self, user_id: &str, group_ids: &[String], check: &PermissionCheck) -> bool {
        if let Some(metrics) = &self.metrics {
            metrics.inc_check();
        }
        let rows =
            self.store
                .find_applicable(check.resource, &check.resource_id, user_id, group_ids);
        let mut available = 0i64;
        let mut revoked = 0i64;
        for row in &rows {
            match row.kind {
                AuthorizationKind::Global | AuthorizationKind::Grant => available |= row.bits,
                AuthorizationKind::Revoke => revoked |= row.bits,
            }
        }
        let bit = check.permission.bit();
        available & bit != 0 && revoked & bit == 0
    }

    /// Evaluate a composite check and raise a structured denial when it
    /// fails, enumerating every attempted link.
    pub fn require(&self, ctx: &IdentityContext, composite: &CompositeCheck) -> Result<(), AuthzError> {
        if self.evaluate(ctx, composite) {
            return Ok(());
        }
        let user_id = ctx.current_user().unwrap_or_default().to_string();
        let groups = ctx.current_groups();
        let mut missing = Vec::new();
        for check in &composite.checks {
            // Under Any every member failed; under All only the failing
            // members belong in the report.
            if composite.combine == Combine::All
                && self.is_user_authorized(&user_id, groups, check)
            {
                continue;
            }
            let mut link = Some(check);
            while let Some(current) = link {
                missing.push(MissingGrant {
                    permission: current.permission.name(),
                    resource: current.resource,
                    resource_id: current.resource_id.clone(),
                });
                link = current.fallback.as_deref();
            }
        }
        if let Some(metrics) = &self.metrics {
            metrics.inc_denial();
        }
        debug!(
            user = %user_id,
            checks = missing.len(),
            "authorization denied"
        );
        Err(AuthzError::Denied(AccessDenied { user_id, missing }))
    }

    /// Grant permissions to an identity on a resource scope, widening the
    /// existing grant row for the same scope when one exists.
    ///
    /// A grant issued after a revoke supersedes it: the granted bits are
    /// cleared from the revoke row of the identical scope, so presence of a
    /// matching revoke at evaluation time, not insertion order, decides.
    pub fn grant(
        &self,
        identity: Identity,
        resource: ResourceType,
        resource_id: &str,
        permissions: &[Permission],
    ) -> Result<Authorization, AuthzError> {
        let row = self.upsert(
            AuthorizationKind::Grant,
            Some(identity.clone()),
            resource,
            resource_id,
            permissions,
        )?;
        self.clear_revoked_bits(&identity, resource, resource_id, permissions)?;
        Ok(row)
    }

    fn clear_revoked_bits(
        &self,
        identity: &Identity,
        resource: ResourceType,
        resource_id: &str,
        permissions: &[Permission],
    ) -> Result<(), AuthzError> {
        let Some(mut revoke_row) = self.store.find_scoped(
            AuthorizationKind::Revoke,
            Some(identity),
            resource,
            resource_id,
        ) else {
            return Ok(());
        };
        for permission in permissions {
            revoke_row.remove_permission(*permission);
        }
        if revoke_row.bits == 0 {
            self.store.remove(&revoke_row.id)?;
        } else {
            self.store.update(revoke_row)?;
        }
        Ok(())
    }

    /// Grant every permission valid for the resource type.
    pub fn grant_all(
        &self,
        identity: Identity,
        resource: ResourceType,
        resource_id: &str,
    ) -> Result<Authorization, AuthzError> {
        let all = Permission::CATALOG
            .into_iter()
            .filter(|permission| permission.bit() != 0 && permission.applies_to(resource))
            .collect::<Vec<_>>();
        self.grant(identity, resource, resource_id, &all)
    }

    /// Revoke permissions from an identity on a resource scope. A revoke
    /// beats any grant or global rule for the bits it carries.
    pub fn revoke(
        &self,
        identity: Identity,
        resource: ResourceType,
        resource_id: &str,
        permissions: &[Permission],
    ) -> Result<Authorization, AuthzError> {
        self.upsert(AuthorizationKind::Revoke, Some(identity), resource, resource_id, permissions)
    }

    /// Create or widen a global rule applying to every identity.
    pub fn grant_global(
        &self,
        resource: ResourceType,
        resource_id: &str,
        permissions: &[Permission],
    ) -> Result<Authorization, AuthzError> {
        self.upsert(AuthorizationKind::Global, None, resource, resource_id, permissions)
    }

    /// Create a global rule carrying every permission valid for the type.
    pub fn grant_global_all(
        &self,
        resource: ResourceType,
        resource_id: &str,
    ) -> Result<Authorization, AuthzError> {
        match self
            .store
            .find_scoped(AuthorizationKind::Global, None, resource, resource_id)
        {
            Some(mut existing) => {
                existing.bits = Permission::all_bits(resource);
                self.store.update(existing)
            }
            None => self
                .store
                .insert(Authorization::global(resource, resource_id).with_all_permissions()),
        }
    }

    /// Delete an authorization row by id.
    pub fn remove(&self, id: &str) -> Result<Authorization, AuthzError> {
        self.store.remove(id)
    }

    fn upsert(
        &self,
        kind: AuthorizationKind,
        identity: Option<Identity>,
        resource: ResourceType,
        resource_id: &str,
        permissions: &[Permission],
    ) -> Result<Authorization, AuthzError> {
        match self
            .store
            .find_scoped(kind, identity.as_ref(), resource, resource_id)
        {
            Some(mut existing) => {
                for permission in permissions {
                    existing.add_permission(*permission)?;
                }
                self.store.update(existing)
            }
            None => {
                let row = match (kind, identity) {
                    (AuthorizationKind::Global, _) => Authorization::global(resource, resource_id),
                    (AuthorizationKind::Grant, Some(identity)) => {
                        Authorization::grant(identity, resource, resource_id)
                    }
                    (AuthorizationKind::Revoke, Some(identity)) => {
                        Authorization::revoke(identity, resource, resource_id)
                    }
                    (_, None) => {
                        return Err(AuthzError::Validation(
                            crate::error::ValidationError::Malformed {
                                reason: format!("{kind:?} rows require exactly one identity"),
                            },
                        ))
                    }
                };
                self.store.insert(row.with_permissions(permissions)?)
            }
        }
    }
}

impl std::fmt::Debug for AuthorizationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationManager")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
