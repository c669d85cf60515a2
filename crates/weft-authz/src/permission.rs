//! ---
//! weft_section: "06-security-access-control"
//! weft_subsection: "module"
//! weft_type: "source"
//! weft_scope: "code"
//! weft_description: "Access-control model, decision algorithm, and grant maintenance."
//! weft_version: "v0.0.0-prealpha"
//! weft_owner: "tbd"
//! ---
use std::fmt;

use crate::resource::ResourceType;

const ALL_RESOURCES: &[ResourceType] = &[
    ResourceType::Deployment,
    ResourceType::ProcessDefinition,
    ResourceType::ProcessInstance,
    ResourceType::Task,
    ResourceType::Job,
    ResourceType::JobDefinition,
];

const TASK_SCOPED: &[ResourceType] = &[ResourceType::Task, ResourceType::ProcessDefinition];

const SUSPENDABLE: &[ResourceType] = &[
    ResourceType::ProcessDefinition,
    ResourceType::ProcessInstance,
    ResourceType::Job,
    ResourceType::JobDefinition,
];

const JOB_SCOPED: &[ResourceType] = &[ResourceType::Job, ResourceType::JobDefinition];

/// A named permission bit, valid for a subset of resource types.
///
/// Bits are resource-scoped: the same bit value may carry a different
/// meaning on another resource type, but within one resource type every
/// permission occupies a distinct bit, so masks compose with `|` and `&`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    name: &'static str,
    bit: i64,
    resources: &'static [ResourceType],
}

impl Permission {
    /// Sentinel carrying no bits. Grants nothing and never satisfies a check.
    pub const NONE: Permission = Permission {
        name: "NONE",
        bit: 0,
        resources: ALL_RESOURCES,
    };
    /// Read an instance of the resource.
    pub const READ: Permission = Permission {
        name: "READ",
        bit: 2,
        resources: ALL_RESOURCES,
    };
    /// Modify an instance of the resource.
    pub const UPDATE: Permission = Permission {
        name: "UPDATE",
        bit: 4,
        resources: ALL_RESOURCES,
    };
    /// Create new instances of the resource.
    pub const CREATE: Permission = Permission {
        name: "CREATE",
        bit: 8,
        resources: ALL_RESOURCES,
    };
    /// Delete an instance of the resource.
    pub const DELETE: Permission = Permission {
        name: "DELETE",
        bit: 16,
        resources: ALL_RESOURCES,
    };
    /// Change the assignee, owner, or candidates of a task.
    pub const TASK_ASSIGN: Permission = Permission {
        name: "TASK_ASSIGN",
        bit: 32,
        resources: TASK_SCOPED,
    };
    /// Claim and complete a task without broader update rights.
    pub const TASK_WORK: Permission = Permission {
        name: "TASK_WORK",
        bit: 64,
        resources: TASK_SCOPED,
    };
    /// Suspend or re-activate the resource.
    pub const SUSPEND: Permission = Permission {
        name: "SUSPEND",
        bit: 128,
        resources: SUSPENDABLE,
    };
    /// Reset the retry counter of a failed job.
    pub const RETRY_JOB: Permission = Permission {
        name: "RETRY_JOB",
        bit: 256,
        resources: JOB_SCOPED,
    };

    /// The full permission catalog, sentinel included.
    pub const CATALOG: [Permission; 9] = [
        Permission::NONE,
        Permission::READ,
        Permission::UPDATE,
        Permission::CREATE,
        Permission::DELETE,
        Permission::TASK_ASSIGN,
        Permission::TASK_WORK,
        Permission::SUSPEND,
        Permission::RETRY_JOB,
    ];

    /// Permission name as used in grants and denial diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The permission's bit value.
    pub fn bit(&self) -> i64 {
        self.bit
    }

    /// Whether this permission is defined for the given resource type.
    pub fn applies_to(&self, resource: ResourceType) -> bool {
        self.resources.contains(&resource)
    }

    /// Look up a catalog permission by name.
    pub fn by_name(name: &str) -> Option<Permission> {
        Permission::CATALOG
            .into_iter()
            .find(|permission| permission.name == name)
    }

    /// Union of every permission bit valid for the resource type.
    ///
    /// This is the `ALL` sentinel of the data model; it is resource-scoped
    /// rather than a fixed constant.
    pub fn all_bits(resource: ResourceType) -> i64 {
        Permission::CATALOG
            .iter()
            .filter(|permission| permission.applies_to(resource))
            .fold(0, |mask, permission| mask | permission.bit)
    }

    /// Names of the catalog permissions present in `bits` for the resource.
    pub fn names_for_bits(resource: ResourceType, bits: i64) -> Vec<&'static str> {
        Permission::CATALOG
            .iter()
            .filter(|permission| {
                permission.bit != 0
                    && permission.applies_to(resource)
                    && bits & permission.bit == permission.bit
            })
            .map(|permission| permission.name)
            .collect()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
