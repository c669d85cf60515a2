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

use crate::check::{CompositeCheck, PermissionCheck};
use crate::context::IdentityContext;
use crate::error::AuthzError;
use crate::manager::AuthorizationManager;
use crate::permission::Permission;
use crate::resource::ResourceType;

/// Gate placed in front of every engine command.
///
/// The required checks are evaluated before the command body runs; a denial
/// aborts the call before any state change, propagating the structured
/// failure to the caller.
#[derive(Debug, Clone)]
pub struct CommandGate {
    manager: Arc<AuthorizationManager>,
}

impl CommandGate {
    /// Create a gate over the given manager.
    pub fn new(manager: Arc<AuthorizationManager>) -> Self {
        Self { manager }
    }

    /// The manager behind the gate.
    pub fn manager(&self) -> &AuthorizationManager {
        &self.manager
    }

    /// Run `command` after the required checks pass. On denial the command
    /// body never executes.
    pub fn execute<T, E>(
        &self,
        ctx: &IdentityContext,
        command: &str,
        required: &CompositeCheck,
        body: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<AuthzError>,
    {
        self.manager.require(ctx, required).map_err(E::from)?;
        debug!(command, user = ctx.current_user().unwrap_or(""), "command admitted");
        body()
    }
}

/// Required checks of the engine's standard operations.
///
/// The composites follow one shape throughout: a narrow specific permission
/// or a broader one on the resource itself, each falling back to its
/// counterpart on the owning process definition when the resource belongs
/// to one.
pub mod requirements {
    use super::*;

    fn task_scoped(
        permission: Permission,
        task_id: &str,
        definition_id: Option<&str>,
    ) -> PermissionCheck {
        let check = PermissionCheck::new(permission, ResourceType::Task, task_id);
        match definition_id {
            Some(definition_id) => check.with_fallback(PermissionCheck::new(
                permission,
                ResourceType::ProcessDefinition,
                definition_id,
            )),
            None => check,
        }
    }

    /// Read a task.
    pub fn read_task(task_id: &str, definition_id: Option<&str>) -> CompositeCheck {
        CompositeCheck::single(task_scoped(Permission::READ, task_id, definition_id))
    }

    /// Claim, complete, or otherwise work on a task.
    pub fn work_on_task(task_id: &str, definition_id: Option<&str>) -> CompositeCheck {
        CompositeCheck::any(vec![
            task_scoped(Permission::TASK_WORK, task_id, definition_id),
            task_scoped(Permission::UPDATE, task_id, definition_id),
        ])
    }

    /// Change the assignee, owner, or candidates of a task.
    pub fn assign_task(task_id: &str, definition_id: Option<&str>) -> CompositeCheck {
        CompositeCheck::any(vec![
            task_scoped(Permission::TASK_ASSIGN, task_id, definition_id),
            task_scoped(Permission::UPDATE, task_id, definition_id),
        ])
    }

    /// Delete a standalone task.
    pub fn delete_task(task_id: &str) -> CompositeCheck {
        CompositeCheck::single(PermissionCheck::new(
            Permission::DELETE,
            ResourceType::Task,
            task_id,
        ))
    }

    /// Start a new instance of a process definition.
    pub fn start_process_instance(definition_id: &str) -> CompositeCheck {
        CompositeCheck::all(vec![
            PermissionCheck::new(
                Permission::CREATE,
                ResourceType::ProcessDefinition,
                definition_id,
            ),
            PermissionCheck::any_instance(Permission::CREATE, ResourceType::ProcessInstance),
        ])
    }

    /// Suspend or re-activate a process instance.
    pub fn suspend_process_instance(instance_id: &str, definition_id: &str) -> CompositeCheck {
        CompositeCheck::any(vec![
            PermissionCheck::new(Permission::SUSPEND, ResourceType::ProcessInstance, instance_id)
                .with_fallback(PermissionCheck::new(
                    Permission::SUSPEND,
                    ResourceType::ProcessDefinition,
                    definition_id,
                )),
            PermissionCheck::new(Permission::UPDATE, ResourceType::ProcessInstance, instance_id)
                .with_fallback(PermissionCheck::new(
                    Permission::UPDATE,
                    ResourceType::ProcessDefinition,
                    definition_id,
                )),
        ])
    }

    /// Reset the retry counter of a failed job.
    pub fn retry_job(job_id: &str, job_definition_id: &str) -> CompositeCheck {
        CompositeCheck::any(vec![
            PermissionCheck::new(Permission::RETRY_JOB, ResourceType::Job, job_id).with_fallback(
                PermissionCheck::new(
                    Permission::RETRY_JOB,
                    ResourceType::JobDefinition,
                    job_definition_id,
                ),
            ),
            PermissionCheck::new(Permission::UPDATE, ResourceType::Job, job_id).with_fallback(
                PermissionCheck::new(
                    Permission::UPDATE,
                    ResourceType::JobDefinition,
                    job_definition_id,
                ),
            ),
        ])
    }

    /// Create a deployment.
    pub fn create_deployment() -> CompositeCheck {
        CompositeCheck::single(PermissionCheck::any_instance(
            Permission::CREATE,
            ResourceType::Deployment,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::Identity;
    use crate::store::MemoryAuthorizationStore;

    fn gate() -> CommandGate {
        CommandGate::new(Arc::new(AuthorizationManager::new(Arc::new(
            MemoryAuthorizationStore::new(),
        ))))
    }

    #[test]
    fn denied_command_body_never_runs() {
        let gate = gate();
        let ctx = IdentityContext::authenticated("rizzo", vec![]);
        let mut executed = false;
        let result: Result<(), AuthzError> = gate.execute(
            &ctx,
            "task.complete",
            &requirements::work_on_task("task-1", None),
            || {
                executed = true;
                Ok(())
            },
        );
        assert!(matches!(result, Err(AuthzError::Denied(_))));
        assert!(!executed, "the body must not run after a denial");
    }

    #[test]
    fn broad_update_satisfies_work_requirement() {
        let gate = gate();
        gate.manager()
            .grant(
                Identity::user("rizzo"),
                ResourceType::Task,
                "task-1",
                &[Permission::UPDATE],
            )
            .unwrap();
        let ctx = IdentityContext::authenticated("rizzo", vec![]);
        let result: Result<&str, AuthzError> = gate.execute(
            &ctx,
            "task.complete",
            &requirements::work_on_task("task-1", None),
            || Ok("completed"),
        );
        assert_eq!(result.unwrap(), "completed");
    }

    #[test]
    fn start_instance_requires_both_create_permissions() {
        let gate = gate();
        let manager = gate.manager();
        manager
            .grant(
                Identity::user("piggy"),
                ResourceType::ProcessDefinition,
                "invoice",
                &[Permission::CREATE],
            )
            .unwrap();
        let ctx = IdentityContext::authenticated("piggy", vec![]);
        let required = requirements::start_process_instance("invoice");
        assert!(!manager.evaluate(&ctx, &required), "instance CREATE missing");

        manager
            .grant(
                Identity::user("piggy"),
                ResourceType::ProcessInstance,
                crate::resource::ANY,
                &[Permission::CREATE],
            )
            .unwrap();
        assert!(manager.evaluate(&ctx, &required));
    }
}
