//! ---
//! weft_section: "15-testing-qa-runbook"
//! weft_subsection: "integration-tests"
//! weft_type: "source"
//! weft_scope: "code"
//! weft_description: "Integration and validation tests for the Weft access-control stack."
//! weft_version: "v0.0.0-prealpha"
//! weft_owner: "tbd"
//! ---
use std::sync::Arc;

use weft_authz::command::requirements;
use weft_authz::{
    AuthorizationManager, AuthzError, AuthzMetrics, AutoGrantService, CommandGate,
    DefaultGrantPolicy, Identity, IdentityContext, MemoryAuthorizationStore, MemoryGroupDirectory,
    Permission, ResourceType, TaskProfile, ANY,
};
use weft_common::config::{AuthorizationConfig, DefaultTaskPermission};

fn stack() -> (Arc<AuthorizationManager>, AutoGrantService, CommandGate) {
    let store = Arc::new(MemoryAuthorizationStore::new());
    let manager = Arc::new(AuthorizationManager::new(store.clone()));
    let autogrant = AutoGrantService::new(store, Arc::new(DefaultGrantPolicy::default()));
    let gate = CommandGate::new(manager.clone());
    (manager, autogrant, gate)
}

#[tokio::test]
async fn end_to_end_access_control_flow() {
    weft_logging::init();
    let (manager, autogrant, gate) = stack();

    // Identity resolution at call start
    let directory = MemoryGroupDirectory::new();
    directory.assign("kermit", &["stage-crew"]);
    let worker = IdentityContext::resolve("kermit", &directory);
    assert_eq!(worker.current_groups(), ["stage-crew"]);

    // An administrator assigns the task inside a suppressed scope; the
    // assignment itself bypasses checks, the auto-grant still fires.
    let task = TaskProfile::in_process("task-42");
    let admin = IdentityContext::authenticated("admin", vec![]);
    admin.run_without_authorization(|| {
        assert!(manager.evaluate(&admin, &requirements::assign_task("task-42", None)));
        autogrant.assignee_changed(&task, Some("kermit")).unwrap()
    })
    .unwrap();

    // Scenario A: the assignee can now read the task through the gate...
    let read = gate.execute(
        &worker,
        "task.get",
        &requirements::read_task("task-42", None),
        || Ok::<_, AuthzError>("task-42"),
    );
    assert_eq!(read.unwrap(), "task-42");

    // ...but cannot work on an unrelated task.
    let denied = gate.execute(
        &worker,
        "task.claim",
        &requirements::work_on_task("task-77", None),
        || Ok::<_, AuthzError>(()),
    );
    let Err(AuthzError::Denied(denied)) = denied else {
        panic!("expected a structured denial");
    };
    assert_eq!(denied.user_id, "kermit");
    assert!(denied
        .missing
        .iter()
        .all(|grant| grant.resource_id == "task-77"));

    // Completing the task purges its rows.
    assert_eq!(autogrant.task_removed(&task), 1);
    assert!(manager.store().list().is_empty());
}

#[test]
fn group_grant_on_definition_authorizes_task_completion() {
    // Scenario B: READ+UPDATE on the process definition granted to a group;
    // a member completes a task of that definition through the fallback
    // chain with zero task-scoped rows.
    let (manager, _, gate) = stack();
    manager
        .grant(
            Identity::group("accounting"),
            ResourceType::ProcessDefinition,
            "invoice",
            &[Permission::READ, Permission::UPDATE],
        )
        .unwrap();

    let directory = MemoryGroupDirectory::new();
    directory.assign("piggy", &["accounting"]);
    let member = IdentityContext::resolve("piggy", &directory);

    let completed = gate.execute(
        &member,
        "task.complete",
        &requirements::work_on_task("task-9", Some("invoice")),
        || Ok::<_, AuthzError>(()),
    );
    assert!(completed.is_ok());

    let outsider = IdentityContext::authenticated("statler", vec![]);
    let denied = gate.execute(
        &outsider,
        "task.complete",
        &requirements::work_on_task("task-9", Some("invoice")),
        || Ok::<_, AuthzError>(()),
    );
    assert!(matches!(denied, Err(AuthzError::Denied(_))));
}

#[test]
fn wildcard_revoke_defeats_global_all_for_every_task() {
    // Scenario C: a global ALL rule exists, then UPDATE is revoked for one
    // user across the wildcard task scope.
    let (manager, ..) = stack();
    manager.grant_global_all(ResourceType::Task, ANY).unwrap();
    manager
        .revoke(
            Identity::user("rizzo"),
            ResourceType::Task,
            ANY,
            &[Permission::UPDATE],
        )
        .unwrap();

    let rizzo = IdentityContext::authenticated("rizzo", vec![]);
    for task_id in ["task-1", "task-2", "task-3"] {
        let update = weft_authz::PermissionCheck::new(Permission::UPDATE, ResourceType::Task, task_id);
        assert!(!manager.is_authorized(&rizzo, &update));
        let read = weft_authz::PermissionCheck::new(Permission::READ, ResourceType::Task, task_id);
        assert!(manager.is_authorized(&rizzo, &read));
    }

    let other = IdentityContext::authenticated("beaker", vec![]);
    let update = weft_authz::PermissionCheck::new(Permission::UPDATE, ResourceType::Task, "task-1");
    assert!(manager.is_authorized(&other, &update));
}

#[test]
fn extension_code_switch_follows_configuration() {
    let (manager, ..) = stack();
    let config = AuthorizationConfig {
        check_extension_code: false,
        default_task_permission: DefaultTaskPermission::Update,
    };

    let check = weft_authz::PermissionCheck::new(Permission::READ, ResourceType::Task, "task-1");
    let ctx = IdentityContext::authenticated("scooter", vec![])
        .with_extension_checks(config.check_extension_code);

    // The triggering operation is checked as usual.
    assert!(!manager.is_authorized(&ctx, &check));
    // Calls made by extension callbacks are not.
    ctx.extension_scope(|| {
        assert!(manager.is_authorized(&ctx, &check));
    });
    assert!(!manager.is_authorized(&ctx, &check));
}

#[test]
fn metrics_observe_checks_denials_and_auto_grants() {
    let registry = Arc::new(prometheus::Registry::new());
    let metrics = AuthzMetrics::new(registry.clone()).unwrap();

    let store = Arc::new(MemoryAuthorizationStore::new());
    let manager = AuthorizationManager::new(store.clone()).with_metrics(metrics.clone());
    let autogrant = AutoGrantService::new(store, Arc::new(DefaultGrantPolicy::default()))
        .with_metrics(metrics);

    let ctx = IdentityContext::authenticated("floyd", vec![]);
    let composite = requirements::read_task("task-1", None);
    assert!(manager.require(&ctx, &composite).is_err());

    let task = TaskProfile::standalone("task-1");
    autogrant.assignee_changed(&task, Some("floyd")).unwrap();
    assert!(manager.require(&ctx, &composite).is_ok());
    autogrant.task_removed(&task);

    assert_eq!(registry.gather().len(), 4);
}
