//! ---
//! weft_section: "06-security-access-control"
//! weft_subsection: "module"
//! weft_type: "source"
//! weft_scope: "code"
//! weft_description: "Access-control model, decision algorithm, and grant maintenance."
//! weft_version: "v0.0.0-prealpha"
//! weft_owner: "tbd"
//! ---
use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Resolves a user id to the groups it belongs to.
///
/// Consulted once at call start to populate the [`IdentityContext`]; the
/// engine's identity provider implements this seam.
pub trait GroupResolver: Send + Sync {
    /// Group ids the user is a member of.
    fn groups_of(&self, user_id: &str) -> Vec<String>;
}

/// In-memory group directory suitable for development and testing.
#[derive(Debug, Default, Clone)]
pub struct MemoryGroupDirectory {
    memberships: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl MemoryGroupDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the group memberships of a user.
    pub fn assign(&self, user_id: impl Into<String>, groups: &[&str]) {
        self.memberships.write().insert(
            user_id.into(),
            groups.iter().map(|group| group.to_string()).collect(),
        );
    }
}

impl GroupResolver for MemoryGroupDirectory {
    fn groups_of(&self, user_id: &str) -> Vec<String> {
        self.memberships
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }
}

/// The authenticated caller of the current logical call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authentication {
    /// Authenticated user id.
    pub user_id: String,
    /// Resolved group memberships.
    pub group_ids: Vec<String>,
}

/// Identity state carried for the duration of one logical call.
///
/// Suppression lives in a call-local counter rather than a process-wide
/// flag, so concurrent calls never observe each other's suppression state.
/// The interior `Cell` keeps the context `!Sync`; share work between
/// threads by building one context per call instead.
#[derive(Debug)]
pub struct IdentityContext {
    authentication: Option<Authentication>,
    suppression: Cell<u32>,
    check_extension_code: bool,
}

impl IdentityContext {
    /// Context for engine-internal work with no authenticated caller.
    pub fn anonymous() -> Self {
        Self {
            authentication: None,
            suppression: Cell::new(0),
            check_extension_code: false,
        }
    }

    /// Context for an authenticated caller with pre-resolved groups.
    pub fn authenticated(user_id: impl Into<String>, group_ids: Vec<String>) -> Self {
        Self {
            authentication: Some(Authentication {
                user_id: user_id.into(),
                group_ids,
            }),
            suppression: Cell::new(0),
            check_extension_code: false,
        }
    }

    /// Context for an authenticated caller, resolving groups at call start.
    pub fn resolve(user_id: impl Into<String>, resolver: &dyn GroupResolver) -> Self {
        let user_id = user_id.into();
        let group_ids = resolver.groups_of(&user_id);
        Self::authenticated(user_id, group_ids)
    }

    /// Configure whether extension callbacks made through this context are
    /// themselves subject to authorization checks.
    pub fn with_extension_checks(mut self, enabled: bool) -> Self {
        self.check_extension_code = enabled;
        self
    }

    /// The authenticated user, if any.
    pub fn current_user(&self) -> Option<&str> {
        self.authentication
            .as_ref()
            .map(|authentication| authentication.user_id.as_str())
    }

    /// Resolved group memberships of the authenticated user.
    pub fn current_groups(&self) -> &[String] {
        self.authentication
            .as_ref()
            .map(|authentication| authentication.group_ids.as_slice())
            .unwrap_or(&[])
    }

    /// Whether checks are currently short-circuited to "permitted".
    pub fn checks_suppressed(&self) -> bool {
        self.suppression.get() > 0
    }

    /// Run `scope` with every authorization check short-circuited to
    /// "permitted". Prior state is restored when the scope exits, also on
    /// panic; nesting inside an already-suppressed region is a no-op, not
    /// a toggle.
    pub fn run_without_authorization<T>(&self, scope: impl FnOnce() -> T) -> T {
        let _guard = SuppressionGuard::engage(&self.suppression);
        scope()
    }

    /// Run externally-supplied extension code. When extension checks are
    /// disabled, calls made inside `scope` behave as if suppressed; the
    /// triggering operation's own checks are unaffected.
    pub fn extension_scope<T>(&self, scope: impl FnOnce() -> T) -> T {
        if self.check_extension_code {
            scope()
        } else {
            self.run_without_authorization(scope)
        }
    }
}

struct SuppressionGuard<'a> {
    depth: &'a Cell<u32>,
}

impl<'a> SuppressionGuard<'a> {
    fn engage(depth: &'a Cell<u32>) -> Self {
        depth.set(depth.get() + 1);
        Self { depth }
    }
}

impl Drop for SuppressionGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}
