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
use std::sync::Arc;

use tracing::info;
use weft_common::config::{AuthorizationConfig, DefaultTaskPermission};

use crate::authorization::{Authorization, AuthorizationKind, Identity};
use crate::error::{AuthzError, ValidationError};
use crate::permission::Permission;
use crate::resource::{ResourceType, ANY};
use crate::store::AuthorizationStore;

/// Where a task originated. Case-management tasks are excluded from
/// identity-link grant maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOrigin {
    /// The task belongs to a running process instance.
    ProcessInstance,
    /// The task exists outside any instance.
    Standalone,
    /// The task belongs to a case-management instance.
    CaseInstance,
}

/// The slice of a task the maintainer needs: its id and origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskProfile {
    /// Task resource id.
    pub id: String,
    /// Origin of the task.
    pub origin: TaskOrigin,
}

impl TaskProfile {
    /// A task belonging to a running process instance.
    pub fn in_process(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            origin: TaskOrigin::ProcessInstance,
        }
    }

    /// A task existing outside any instance.
    pub fn standalone(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            origin: TaskOrigin::Standalone,
        }
    }

    /// A task belonging to a case-management instance.
    pub fn in_case(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            origin: TaskOrigin::CaseInstance,
        }
    }

    fn participates(&self) -> bool {
        self.origin != TaskOrigin::CaseInstance
    }

    fn guard_id(&self) -> Result<(), AuthzError> {
        if self.id == ANY {
            return Err(AuthzError::Validation(ValidationError::ReservedWildcard {
                field: "task id",
                value: self.id.clone(),
            }));
        }
        Ok(())
    }
}

/// How an identity is linked to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// The identity the task is assigned to.
    Assignee,
    /// The identity owning the task.
    Owner,
    /// A candidate user or group.
    Candidate,
}

/// One identity link of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityLink {
    /// The linked identity.
    pub identity: Identity,
    /// The role of the link.
    pub kind: LinkKind,
}

impl IdentityLink {
    /// Construct a link.
    pub fn new(identity: Identity, kind: LinkKind) -> Self {
        Self { identity, kind }
    }
}

/// Chooses the permission bits an identity receives when it becomes linked
/// to a task. Substitutable at engine configuration time.
pub trait GrantPolicy: Send + Sync + fmt::Debug {
    /// Permissions granted on the task resource for a fresh link.
    fn task_permissions(&self) -> Vec<Permission>;
}

/// Default policy: read access plus the configured action permission.
#[derive(Debug, Clone)]
pub struct DefaultGrantPolicy {
    action: DefaultTaskPermission,
}

impl DefaultGrantPolicy {
    /// Policy granting READ plus the given action permission.
    pub fn new(action: DefaultTaskPermission) -> Self {
        Self { action }
    }

    /// Policy configured from the authorization section.
    pub fn from_config(config: &AuthorizationConfig) -> Self {
        Self::new(config.default_task_permission)
    }
}

impl Default for DefaultGrantPolicy {
    fn default() -> Self {
        Self::new(DefaultTaskPermission::Update)
    }
}

impl GrantPolicy for DefaultGrantPolicy {
    fn task_permissions(&self) -> Vec<Permission> {
        let action = match self.action {
            DefaultTaskPermission::Update => Permission::UPDATE,
            DefaultTaskPermission::TaskWork => Permission::TASK_WORK,
        };
        vec![Permission::READ, action]
    }
}

/// Keeps grant rows consistent with the current ownership of tasks.
///
/// The task service invokes these hooks synchronously inside the unit of
/// work of the triggering operation, so a rollback of that operation also
/// rolls back the grant change.
#[derive(Clone)]
pub struct AutoGrantService {
    store: Arc<dyn AuthorizationStore>,
    policy: Arc<dyn GrantPolicy>,
    metrics: Option<crate::metrics::AuthzMetrics>,
}

impl fmt::Debug for AutoGrantService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoGrantService")
            .field("store", &self.store)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl AutoGrantService {
    /// Create a maintainer over the given store and policy.
    pub fn new(store: Arc<dyn AuthorizationStore>, policy: Arc<dyn GrantPolicy>) -> Self {
        Self {
            store,
            policy,
            metrics: None,
        }
    }

    /// Attach Prometheus counters.
    pub fn with_metrics(mut self, metrics: crate::metrics::AuthzMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The task's assignee changed. A fresh assignee receives a grant;
    /// clearing the assignee retracts nothing.
    pub fn assignee_changed(
        &self,
        task: &TaskProfile,
        assignee: Option<&str>,
    ) -> Result<Option<Authorization>, AuthzError> {
        match assignee {
            Some(user_id) => self.link_added(task, Identity::user(user_id)),
            None => Ok(None),
        }
    }

    /// The task's owner changed. Same grant behavior as the assignee.
    pub fn owner_changed(
        &self,
        task: &TaskProfile,
        owner: Option<&str>,
    ) -> Result<Option<Authorization>, AuthzError> {
        match owner {
            Some(user_id) => self.link_added(task, Identity::user(user_id)),
            None => Ok(None),
        }
    }

    /// A candidate user was added to the task.
    pub fn candidate_user_added(
        &self,
        task: &TaskProfile,
        user_id: &str,
    ) -> Result<Option<Authorization>, AuthzError> {
        self.link_added(task, Identity::user(user_id))
    }

    /// A candidate group was added to the task.
    pub fn candidate_group_added(
        &self,
        task: &TaskProfile,
        group_id: &str,
    ) -> Result<Option<Authorization>, AuthzError> {
        self.link_added(task, Identity::group(group_id))
    }

    /// An identity link was explicitly removed. The grant is retracted only
    /// when none of the remaining links references the same identity.
    pub fn link_removed(
        &self,
        task: &TaskProfile,
        link: &IdentityLink,
        remaining: &[IdentityLink],
    ) -> Result<bool, AuthzError> {
        if !task.participates() {
            return Ok(false);
        }
        task.guard_id()?;
        if remaining
            .iter()
            .any(|candidate| candidate.identity == link.identity)
        {
            return Ok(false);
        }
        let Some(row) = self.store.find_scoped(
            AuthorizationKind::Grant,
            Some(&link.identity),
            ResourceType::Task,
            &task.id,
        ) else {
            return Ok(false);
        };
        self.store.remove(&row.id)?;
        info!(task = %task.id, identity = link.identity.id(), "auto-grant retracted");
        Ok(true)
    }

    /// The task was completed or deleted: purge every authorization row
    /// scoped to it. Returns the number of rows removed.
    pub fn task_removed(&self, task: &TaskProfile) -> usize {
        // The wildcard scope is never a deletable task; purging it would
        // drop every wildcard row of the type.
        if task.id == ANY {
            return 0;
        }
        let purged = self.store.purge_resource(ResourceType::Task, &task.id);
        if purged > 0 {
            if let Some(metrics) = &self.metrics {
                metrics.add_purged_rows(purged);
            }
            info!(task = %task.id, rows = purged, "task authorizations purged");
        }
        purged
    }

    fn link_added(
        &self,
        task: &TaskProfile,
        identity: Identity,
    ) -> Result<Option<Authorization>, AuthzError> {
        if !task.participates() {
            return Ok(None);
        }
        task.guard_id()?;
        if identity.id() == ANY {
            return Err(AuthzError::Validation(ValidationError::ReservedWildcard {
                field: "identity id",
                value: identity.id().to_string(),
            }));
        }
        let permissions = self.policy.task_permissions();
        let row = match self.store.find_scoped(
            AuthorizationKind::Grant,
            Some(&identity),
            ResourceType::Task,
            &task.id,
        ) {
            Some(mut existing) => {
                for permission in &permissions {
                    existing.add_permission(*permission)?;
                }
                self.store.update(existing)?
            }
            None => self.store.insert(
                Authorization::grant(identity.clone(), ResourceType::Task, &task.id)
                    .with_permissions(&permissions)?,
            )?,
        };
        if let Some(metrics) = &self.metrics {
            metrics.inc_auto_grant();
        }
        info!(
            task = %task.id,
            identity = identity.id(),
            bits = row.bits,
            "auto-grant upserted"
        );
        Ok(Some(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAuthorizationStore;

    fn service() -> (AutoGrantService, Arc<MemoryAuthorizationStore>) {
        let store = Arc::new(MemoryAuthorizationStore::new());
        let service = AutoGrantService::new(
            store.clone(),
            Arc::new(DefaultGrantPolicy::default()),
        );
        (service, store)
    }

    #[test]
    fn assignment_grants_read_and_default_action() {
        let (service, _) = service();
        let task = TaskProfile::in_process("task-1");
        let row = service
            .assignee_changed(&task, Some("gonzo"))
            .unwrap()
            .unwrap();
        assert_eq!(row.identity, Some(Identity::user("gonzo")));
        assert!(row.contains(Permission::READ));
        assert!(row.contains(Permission::UPDATE));
    }

    #[test]
    fn repeated_assignment_updates_in_place() {
        let (service, store) = service();
        let task = TaskProfile::in_process("task-1");
        let first = service
            .assignee_changed(&task, Some("gonzo"))
            .unwrap()
            .unwrap();
        let second = service
            .assignee_changed(&task, Some("gonzo"))
            .unwrap()
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clearing_the_assignee_retracts_nothing() {
        let (service, store) = service();
        let task = TaskProfile::in_process("task-1");
        service.assignee_changed(&task, Some("gonzo")).unwrap();
        let row = service.assignee_changed(&task, None).unwrap();
        assert!(row.is_none());
        assert_eq!(store.len(), 1, "the previous assignee keeps access");
    }

    #[test]
    fn narrow_policy_grants_task_work_instead_of_update() {
        let store = Arc::new(MemoryAuthorizationStore::new());
        let service = AutoGrantService::new(
            store,
            Arc::new(DefaultGrantPolicy::new(DefaultTaskPermission::TaskWork)),
        );
        let row = service
            .candidate_user_added(&TaskProfile::standalone("task-2"), "scooter")
            .unwrap()
            .unwrap();
        assert!(row.contains(Permission::TASK_WORK));
        assert!(!row.contains(Permission::UPDATE));
    }

    #[test]
    fn candidate_group_links_grant_to_the_group() {
        let (service, _) = service();
        let row = service
            .candidate_group_added(&TaskProfile::in_process("task-1"), "accounting")
            .unwrap()
            .unwrap();
        assert_eq!(row.identity, Some(Identity::group("accounting")));
    }

    #[test]
    fn case_instance_tasks_are_excluded() {
        let (service, store) = service();
        let task = TaskProfile::in_case("case-task-1");
        assert!(service
            .assignee_changed(&task, Some("gonzo"))
            .unwrap()
            .is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn wildcard_assignee_fails_fast() {
        let (service, store) = service();
        let task = TaskProfile::in_process("task-1");
        let result = service.assignee_changed(&task, Some(ANY));
        assert!(matches!(result, Err(AuthzError::Validation(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn wildcard_task_id_fails_fast() {
        let (service, store) = service();
        let task = TaskProfile::in_process(ANY);
        let result = service.candidate_user_added(&task, "gonzo");
        assert!(matches!(result, Err(AuthzError::Validation(_))));
        assert!(store.is_empty());

        // A wildcard "task" is not purgeable either.
        service
            .candidate_user_added(&TaskProfile::in_process("task-1"), "gonzo")
            .unwrap();
        assert_eq!(service.task_removed(&task), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn link_removal_retracts_only_unjustified_grants() {
        let (service, store) = service();
        let task = TaskProfile::in_process("task-1");
        service.candidate_user_added(&task, "gonzo").unwrap();

        let link = IdentityLink::new(Identity::user("gonzo"), LinkKind::Candidate);
        let still_assigned = [IdentityLink::new(Identity::user("gonzo"), LinkKind::Assignee)];
        assert!(!service.link_removed(&task, &link, &still_assigned).unwrap());
        assert_eq!(store.len(), 1);

        assert!(service.link_removed(&task, &link, &[]).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn task_removal_purges_every_scoped_row() {
        let (service, store) = service();
        let task = TaskProfile::in_process("task-1");
        service.assignee_changed(&task, Some("gonzo")).unwrap();
        service.candidate_group_added(&task, "accounting").unwrap();

        assert_eq!(service.task_removed(&task), 2);
        assert!(store.is_empty());
        assert_eq!(service.task_removed(&task), 0);
    }
}
