//! ---
//! weft_section: "06-security-access-control"
//! weft_subsection: "module"
//! weft_type: "source"
//! weft_scope: "code"
//! weft_description: "Access-control model, decision algorithm, and grant maintenance."
//! weft_version: "v0.0.0-prealpha"
//! weft_owner: "tbd"
//! ---
use crate::permission::Permission;
use crate::resource::{ResourceType, ANY};

/// An evaluation-time permission request, optionally chained with a
/// fallback evaluated when this link fails.
///
/// The fallback expresses "permission on resource A, or the equivalent
/// permission on the owning resource B", e.g. a task-scoped permission or
/// its counterpart on the task's process definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCheck {
    /// Resource type being checked.
    pub resource: ResourceType,
    /// Concrete instance id, or [`ANY`].
    pub resource_id: String,
    /// Required permission.
    pub permission: Permission,
    /// Evaluated when this link fails.
    pub fallback: Option<Box<PermissionCheck>>,
}

impl PermissionCheck {
    /// Check one permission on one resource instance.
    pub fn new(
        permission: Permission,
        resource: ResourceType,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            resource,
            resource_id: resource_id.into(),
            permission,
            fallback: None,
        }
    }

    /// Check one permission across every instance of a resource type.
    pub fn any_instance(permission: Permission, resource: ResourceType) -> Self {
        Self::new(permission, resource, ANY)
    }

    /// Append a fallback at the end of the chain.
    pub fn with_fallback(self, fallback: PermissionCheck) -> Self {
        let chained = match self.fallback {
            Some(existing) => (*existing).with_fallback(fallback),
            None => fallback,
        };
        Self {
            fallback: Some(Box::new(chained)),
            ..self
        }
    }
}

/// How the members of a [`CompositeCheck`] combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    /// At least one member check must succeed.
    Any,
    /// Every member check must succeed.
    All,
}

/// One or more permission checks combined with AND/OR semantics.
///
/// `Any` composites are the common shape: a narrow specific permission or a
/// broader one may each satisfy the same operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeCheck {
    /// Combination mode.
    pub combine: Combine,
    /// Member checks, evaluated in order.
    pub checks: Vec<PermissionCheck>,
}

impl CompositeCheck {
    /// Succeeds when at least one member succeeds.
    pub fn any(checks: Vec<PermissionCheck>) -> Self {
        Self {
            combine: Combine::Any,
            checks,
        }
    }

    /// Succeeds only when every member succeeds.
    pub fn all(checks: Vec<PermissionCheck>) -> Self {
        Self {
            combine: Combine::All,
            checks,
        }
    }

    /// A composite wrapping a single check.
    pub fn single(check: PermissionCheck) -> Self {
        Self::any(vec![check])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_appends_to_the_chain_tail() {
        let check = PermissionCheck::new(Permission::TASK_WORK, ResourceType::Task, "task-1")
            .with_fallback(PermissionCheck::new(
                Permission::TASK_WORK,
                ResourceType::ProcessDefinition,
                "invoice",
            ))
            .with_fallback(PermissionCheck::any_instance(
                Permission::UPDATE,
                ResourceType::ProcessDefinition,
            ));

        let first = check.fallback.as_deref().unwrap();
        assert_eq!(first.resource, ResourceType::ProcessDefinition);
        assert_eq!(first.resource_id, "invoice");
        let second = first.fallback.as_deref().unwrap();
        assert_eq!(second.resource_id, ANY);
        assert!(second.fallback.is_none());
    }

    #[test]
    fn composite_constructors_set_mode() {
        let check = PermissionCheck::new(Permission::READ, ResourceType::Task, "task-1");
        assert_eq!(CompositeCheck::single(check.clone()).combine, Combine::Any);
        assert_eq!(CompositeCheck::all(vec![check]).combine, Combine::All);
    }
}
