//! ---
//! weft_section: "06-security-access-control"
//! weft_subsection: "module"
//! weft_type: "source"
//! weft_scope: "code"
//! weft_description: "Access-control model, decision algorithm, and grant maintenance."
//! weft_version: "v0.0.0-prealpha"
//! weft_owner: "tbd"
//! ---
//! Access control for the Weft engine.
//!
//! Every engine operation first asks the [`AuthorizationManager`] whether
//! the calling identity may perform it; the [`CommandGate`] aborts denied
//! operations before any state change. The [`AutoGrantService`] keeps grant
//! rows consistent with task ownership as assignees, owners, and candidates
//! change at runtime.
#![warn(missing_docs)]

pub mod authorization;
pub mod autogrant;
pub mod check;
pub mod command;
pub mod context;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod permission;
pub mod resource;
pub mod store;

pub use authorization::{Authorization, AuthorizationKind, Identity};
pub use autogrant::{
    AutoGrantService, DefaultGrantPolicy, GrantPolicy, IdentityLink, LinkKind, TaskOrigin,
    TaskProfile,
};
pub use check::{Combine, CompositeCheck, PermissionCheck};
pub use command::CommandGate;
pub use context::{Authentication, GroupResolver, IdentityContext, MemoryGroupDirectory};
pub use error::{AccessDenied, AuthzError, MissingGrant, ValidationError};
pub use manager::AuthorizationManager;
pub use metrics::AuthzMetrics;
pub use permission::Permission;
pub use resource::{ResourceType, ANY};
pub use store::{AuthorizationStore, MemoryAuthorizationStore};
