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

use thiserror::Error;

use crate::resource::ResourceType;

/// One permission check link that was attempted and failed.
///
/// The denial message is formatted from these fields by the presentation
/// layer; the decision algorithm only records them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingGrant {
    /// Name of the permission the caller lacks.
    pub permission: &'static str,
    /// Resource type the check was scoped to.
    pub resource: ResourceType,
    /// Concrete resource id, or the wildcard sentinel.
    pub resource_id: String,
}

impl fmt::Display for MissingGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} '{}'",
            self.permission,
            self.resource.name(),
            self.resource_id
        )
    }
}

/// A permission check (or every disjunct of a composite check) failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenied {
    /// The identity the checks were evaluated for.
    pub user_id: String,
    /// Every check link that was attempted and failed, in evaluation order.
    pub missing: Vec<MissingGrant>,
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user '{}' is not authorized; requires", self.user_id)?;
        if self.missing.len() > 1 {
            write!(f, " one of:")?;
        }
        for (index, grant) in self.missing.iter().enumerate() {
            if index > 0 {
                write!(f, ",")?;
            }
            write!(f, " {grant}")?;
        }
        Ok(())
    }
}

/// A malformed or reserved value was rejected before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The wildcard sentinel was used where a concrete value is required.
    #[error("'{value}' is reserved for wildcard matching and cannot be used as a {field}")]
    ReservedWildcard {
        /// Which field carried the sentinel.
        field: &'static str,
        /// The offending value.
        value: String,
    },
    /// A permission was granted on a resource type it is not defined for.
    #[error("permission {permission} does not apply to resource type {resource}")]
    NotApplicable {
        /// Name of the inapplicable permission.
        permission: &'static str,
        /// The resource type of the authorization row.
        resource: ResourceType,
    },
    /// An authorization row violates a structural invariant.
    #[error("malformed authorization: {reason}")]
    Malformed {
        /// Human-readable description of the violated invariant.
        reason: String,
    },
}

/// Errors raised by the access-control subsystem. None are retried
/// automatically; a failed check repeats identically until grant state
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// Every attempted permission check failed.
    #[error("{0}")]
    Denied(AccessDenied),
    /// A write was rejected before reaching the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Update or delete referenced an unknown authorization id.
    #[error("authorization not found: {id}")]
    NotFound {
        /// The id that did not resolve.
        id: String,
    },
}

impl From<AccessDenied> for AuthzError {
    fn from(denied: AccessDenied) -> Self {
        AuthzError::Denied(denied)
    }
}
