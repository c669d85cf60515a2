//! ---
//! weft_section: "06-security-access-control"
//! weft_subsection: "module"
//! weft_type: "source"
//! weft_scope: "code"
//! weft_description: "Access-control model, decision algorithm, and grant maintenance."
//! weft_version: "v0.0.0-prealpha"
//! weft_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::permission::Permission;
use crate::resource::{ResourceType, ANY};

/// Identity scope of a grant or revoke row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "scope", content = "id")]
pub enum Identity {
    /// A single user.
    User(String),
    /// Every member of a group.
    Group(String),
}

impl Identity {
    /// Identity scoped to a single user.
    pub fn user(id: impl Into<String>) -> Self {
        Identity::User(id.into())
    }

    /// Identity scoped to a group.
    pub fn group(id: impl Into<String>) -> Self {
        Identity::Group(id.into())
    }

    /// The raw user or group id.
    pub fn id(&self) -> &str {
        match self {
            Identity::User(id) | Identity::Group(id) => id,
        }
    }

    /// Whether the identity matches the given user or any of their groups.
    pub fn matches(&self, user_id: &str, group_ids: &[String]) -> bool {
        match self {
            Identity::User(id) => id == user_id,
            Identity::Group(id) => group_ids.iter().any(|group| group == id),
        }
    }
}

/// How an authorization row combines into the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthorizationKind {
    /// Applies to every identity; contributes granted bits.
    Global,
    /// Contributes granted bits for one identity scope.
    Grant,
    /// Withdraws bits for one identity scope; beats any grant for the
    /// bits it carries.
    Revoke,
}

/// A persisted authorization rule binding permission bits to an identity
/// scope and a resource scope.
///
/// Rows are independent; overlapping grants and revokes for the same scope
/// are legal and the decision algorithm tolerates the redundancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    /// Row identifier.
    pub id: String,
    /// Global, grant, or revoke.
    pub kind: AuthorizationKind,
    /// Identity scope; `None` exactly for global rows.
    pub identity: Option<Identity>,
    /// Resource type the row is scoped to.
    pub resource: ResourceType,
    /// Concrete instance id, or [`ANY`] for every instance.
    pub resource_id: String,
    /// Permission bitmask.
    pub bits: i64,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
}

impl Authorization {
    fn new(
        kind: AuthorizationKind,
        identity: Option<Identity>,
        resource: ResourceType,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            identity,
            resource,
            resource_id: resource_id.into(),
            bits: 0,
            created_at: Utc::now(),
        }
    }

    /// A global rule applying to every identity.
    pub fn global(resource: ResourceType, resource_id: impl Into<String>) -> Self {
        Self::new(AuthorizationKind::Global, None, resource, resource_id)
    }

    /// A grant for one identity scope.
    pub fn grant(identity: Identity, resource: ResourceType, resource_id: impl Into<String>) -> Self {
        Self::new(AuthorizationKind::Grant, Some(identity), resource, resource_id)
    }

    /// A revoke for one identity scope.
    pub fn revoke(
        identity: Identity,
        resource: ResourceType,
        resource_id: impl Into<String>,
    ) -> Self {
        Self::new(AuthorizationKind::Revoke, Some(identity), resource, resource_id)
    }

    /// Attach catalog permissions, validating their applicability.
    pub fn with_permissions(mut self, permissions: &[Permission]) -> Result<Self, ValidationError> {
        for permission in permissions {
            self.add_permission(*permission)?;
        }
        Ok(self)
    }

    /// Attach every permission valid for the row's resource type.
    pub fn with_all_permissions(mut self) -> Self {
        self.bits = Permission::all_bits(self.resource);
        self
    }

    /// Add one permission to the row's mask.
    pub fn add_permission(&mut self, permission: Permission) -> Result<(), ValidationError> {
        if !permission.applies_to(self.resource) {
            return Err(ValidationError::NotApplicable {
                permission: permission.name(),
                resource: self.resource,
            });
        }
        self.bits |= permission.bit();
        Ok(())
    }

    /// Remove one permission from the row's mask.
    pub fn remove_permission(&mut self, permission: Permission) {
        self.bits &= !permission.bit();
    }

    /// Whether the row's mask contains the permission bit.
    pub fn contains(&self, permission: Permission) -> bool {
        permission.bit() != 0 && self.bits & permission.bit() == permission.bit()
    }

    /// Whether the row is scoped to every instance of its resource type.
    pub fn is_wildcard(&self) -> bool {
        self.resource_id == ANY
    }

    /// Check structural invariants.
    ///
    /// Constructors cannot produce malformed rows; this guards rows arriving
    /// from deserialization or external construction before they reach the
    /// store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.kind, &self.identity) {
            (AuthorizationKind::Global, Some(_)) => {
                return Err(ValidationError::Malformed {
                    reason: "global rows must not carry an identity".into(),
                })
            }
            (AuthorizationKind::Grant | AuthorizationKind::Revoke, None) => {
                return Err(ValidationError::Malformed {
                    reason: format!("{:?} rows require exactly one identity", self.kind),
                })
            }
            _ => {}
        }
        if let Some(identity) = &self.identity {
            if identity.id() == ANY {
                return Err(ValidationError::ReservedWildcard {
                    field: "identity id",
                    value: identity.id().to_string(),
                });
            }
        }
        if self.resource_id.is_empty() {
            return Err(ValidationError::Malformed {
                reason: "resource id must not be empty".into(),
            });
        }
        if self.bits & !Permission::all_bits(self.resource) != 0 {
            return Err(ValidationError::Malformed {
                reason: format!(
                    "mask {:#x} carries bits undefined for resource type {}",
                    self.bits, self.resource
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_produce_valid_rows() {
        let grant = Authorization::grant(Identity::user("alice"), ResourceType::Task, "task-1")
            .with_permissions(&[Permission::READ, Permission::TASK_WORK])
            .unwrap();
        grant.validate().unwrap();
        assert!(grant.contains(Permission::READ));
        assert!(!grant.contains(Permission::UPDATE));

        let global = Authorization::global(ResourceType::Task, ANY).with_all_permissions();
        global.validate().unwrap();
        assert!(global.is_wildcard());
        assert_eq!(global.bits, Permission::all_bits(ResourceType::Task));
    }

    #[test]
    fn inapplicable_permission_is_rejected() {
        let result = Authorization::grant(Identity::user("alice"), ResourceType::Deployment, "d1")
            .with_permissions(&[Permission::TASK_WORK]);
        assert!(matches!(
            result,
            Err(ValidationError::NotApplicable { permission: "TASK_WORK", .. })
        ));
    }

    #[test]
    fn wildcard_identity_is_rejected() {
        let row = Authorization::grant(Identity::user(ANY), ResourceType::Task, "task-1");
        assert!(matches!(
            row.validate(),
            Err(ValidationError::ReservedWildcard { field: "identity id", .. })
        ));
    }

    #[test]
    fn malformed_rows_from_deserialization_are_caught() {
        let grant = Authorization::grant(Identity::user("alice"), ResourceType::Task, "task-1");
        let mut as_global = grant.clone();
        as_global.kind = AuthorizationKind::Global;
        assert!(matches!(
            as_global.validate(),
            Err(ValidationError::Malformed { .. })
        ));

        let mut orphaned = grant;
        orphaned.identity = None;
        assert!(matches!(
            orphaned.validate(),
            Err(ValidationError::Malformed { .. })
        ));
    }

    #[test]
    fn undefined_bits_are_caught() {
        let mut row = Authorization::grant(Identity::user("alice"), ResourceType::Deployment, "d1");
        row.bits = Permission::RETRY_JOB.bit();
        assert!(matches!(row.validate(), Err(ValidationError::Malformed { .. })));
    }

    #[test]
    fn rows_serialize_round_trip() {
        let row = Authorization::revoke(Identity::group("accounting"), ResourceType::Task, ANY)
            .with_permissions(&[Permission::UPDATE])
            .unwrap();
        let json = serde_json::to_string(&row).unwrap();
        let parsed: Authorization = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, row);
        parsed.validate().unwrap();
    }
}
