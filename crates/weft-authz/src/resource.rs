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

use serde::{Deserialize, Serialize};

/// Wildcard sentinel matching every instance of a resource type.
///
/// Reserved: a concrete identity id or system-assigned resource id must
/// never equal this value.
pub const ANY: &str = "*";

/// Securable resource types of the engine. Defined statically; never
/// created at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    /// A deployed artifact bundle.
    Deployment,
    /// A deployed process definition.
    ProcessDefinition,
    /// A running instance of a process definition.
    ProcessInstance,
    /// A user task.
    Task,
    /// A background job.
    Job,
    /// The definition a job was created from.
    JobDefinition,
}

impl ResourceType {
    /// Every resource type, in type-id order.
    pub const ALL: [ResourceType; 6] = [
        ResourceType::Deployment,
        ResourceType::ProcessDefinition,
        ResourceType::ProcessInstance,
        ResourceType::Task,
        ResourceType::Job,
        ResourceType::JobDefinition,
    ];

    /// Stable numeric identifier used by persisted rows.
    pub fn type_id(&self) -> i32 {
        match self {
            ResourceType::Deployment => 1,
            ResourceType::ProcessDefinition => 2,
            ResourceType::ProcessInstance => 3,
            ResourceType::Task => 4,
            ResourceType::Job => 5,
            ResourceType::JobDefinition => 6,
        }
    }

    /// Stable lowercase name used in diagnostics and serialized forms.
    pub fn name(&self) -> &'static str {
        match self {
            ResourceType::Deployment => "deployment",
            ResourceType::ProcessDefinition => "process-definition",
            ResourceType::ProcessInstance => "process-instance",
            ResourceType::Task => "task",
            ResourceType::Job => "job",
            ResourceType::JobDefinition => "job-definition",
        }
    }

    /// Resolve a resource type from its numeric identifier.
    pub fn from_type_id(type_id: i32) -> Option<ResourceType> {
        ResourceType::ALL
            .into_iter()
            .find(|resource| resource.type_id() == type_id)
    }

    /// Resolve a resource type from its lowercase name.
    pub fn from_name(name: &str) -> Option<ResourceType> {
        ResourceType::ALL
            .into_iter()
            .find(|resource| resource.name() == name)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
