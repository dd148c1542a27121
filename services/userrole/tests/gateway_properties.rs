//! Integration tests for the user/role gateway
//!
//! Most tests drive the gateway against the in-process store so failures can
//! be injected and the collections scanned directly. The last test needs a
//! running cluster and is ignored by default.

use std::collections::BTreeSet;

use common::store::{StoreConfig, init_session};
use userrole::repositories::{CqlStore, MemoryStore, StatementKind};
use userrole::schema::Schema;
use userrole::{Entity, Gateway, GatewayError, GatewayOptions, Role, RoleWriteMode, User};
use uuid::Uuid;

async fn bootstrapped(options: GatewayOptions) -> Gateway<MemoryStore> {
    let gateway = Gateway::new(MemoryStore::new(), options);
    gateway.bootstrap().await.expect("bootstrap failed");
    gateway
}

fn tracked() -> GatewayOptions {
    GatewayOptions {
        track_inverse_links: true,
        ..Default::default()
    }
}

fn role_id_set(user: &User) -> BTreeSet<Uuid> {
    user.roles.iter().map(|role| role.id).collect()
}

fn sample_user() -> User {
    User::new("Ada Lovelace").with_roles(vec![
        Role::new("Admin"),
        Role::new("Editor"),
        Role::new("User"),
    ])
}

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let gateway = bootstrapped(GatewayOptions::default()).await;
    let user = sample_user();

    gateway.create_user(&user).await.unwrap();
    let fetched = gateway.get_user(user.id).await.unwrap();

    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.name, user.name);
    assert_eq!(role_id_set(&fetched), role_id_set(&user));
    for role in &fetched.roles {
        let written = user.roles.iter().find(|r| r.id == role.id).unwrap();
        assert_eq!(role.name, written.name);
        assert!(role.users.is_empty());
    }
}

#[tokio::test]
async fn test_user_without_roles_round_trip() {
    let gateway = bootstrapped(GatewayOptions::default()).await;
    let user = User::new("Solo");

    gateway.create_user(&user).await.unwrap();
    let fetched = gateway.get_user(user.id).await.unwrap();

    assert_eq!(fetched, user);
}

#[tokio::test]
async fn test_update_replaces_name_and_membership() {
    let gateway = bootstrapped(GatewayOptions::default()).await;
    let user = sample_user();
    gateway.create_user(&user).await.unwrap();

    let mut changed = gateway.get_user(user.id).await.unwrap();
    changed.name = "Ada King".to_string();
    let dropped = changed.roles.remove(0);
    gateway.update_user(&changed).await.unwrap();

    let fetched = gateway.get_user(user.id).await.unwrap();
    assert_eq!(fetched.name, "Ada King");
    assert_eq!(role_id_set(&fetched), role_id_set(&changed));
    assert!(!role_id_set(&fetched).contains(&dropped.id));
}

#[tokio::test]
async fn test_update_does_not_rewrite_role_rows() {
    let gateway = bootstrapped(GatewayOptions::default()).await;
    let user = sample_user();
    gateway.create_user(&user).await.unwrap();

    let mut renamed = user.clone();
    renamed.roles[0].name = "Superuser".to_string();
    gateway.update_user(&renamed).await.unwrap();

    let role = gateway.get_role(user.roles[0].id).await.unwrap();
    assert_eq!(role.name, "Admin");
}

#[tokio::test]
async fn test_repeated_update_keeps_role_set() {
    let gateway = bootstrapped(GatewayOptions::default()).await;
    let user = sample_user();
    gateway.create_user(&user).await.unwrap();

    gateway.update_user(&user).await.unwrap();
    let once = gateway.get_user(user.id).await.unwrap();
    gateway.update_user(&user).await.unwrap();
    let twice = gateway.get_user(user.id).await.unwrap();

    assert_eq!(role_id_set(&once), role_id_set(&user));
    assert_eq!(role_id_set(&twice), role_id_set(&once));
    assert_eq!(gateway.store().links().await.len(), user.roles.len());
}

#[tokio::test]
async fn test_delete_removes_user_and_every_link() {
    let gateway = bootstrapped(GatewayOptions::default()).await;
    let user = sample_user();
    let other = User::new("Grace Hopper").with_roles(vec![Role::new("Reviewer")]);
    gateway.create_user(&user).await.unwrap();
    gateway.create_user(&other).await.unwrap();

    gateway.delete_user(user.id).await.unwrap();

    let err = gateway.get_user(user.id).await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::NotFound { entity: Entity::User, id } if id == user.id
    ));
    let links = gateway.store().links().await;
    assert!(links.iter().all(|link| link.user_id != user.id));
    assert_eq!(links.len(), 1);
    assert!(gateway.get_user(other.id).await.is_ok());
}

#[tokio::test]
async fn test_deleted_users_leave_orphan_roles() {
    let gateway = bootstrapped(GatewayOptions::default()).await;
    let user = sample_user();
    gateway.create_user(&user).await.unwrap();

    gateway.delete_user(user.id).await.unwrap();

    for role in &user.roles {
        let orphan = gateway.get_role(role.id).await.unwrap();
        assert_eq!(orphan.name, role.name);
    }
    assert_eq!(gateway.store().role_ids().await.len(), 3);
}

#[tokio::test]
async fn test_partial_create_is_left_in_place() {
    let gateway = bootstrapped(GatewayOptions::default()).await;
    let user = sample_user();
    gateway.store().fail_nth(StatementKind::InsertRole, 2).await;

    let err = gateway.create_user(&user).await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Write {
            statement: StatementKind::InsertRole,
            ..
        }
    ));

    let store = gateway.store();
    assert_eq!(store.user_ids().await, vec![user.id]);
    assert_eq!(store.role_ids().await, vec![user.roles[0].id]);
    let links = store.links().await;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].user_id, user.id);
    assert_eq!(links[0].role_id, user.roles[0].id);

    let fetched = gateway.get_user(user.id).await.unwrap();
    assert_eq!(fetched.roles.len(), 1);
}

#[tokio::test]
async fn test_failed_link_delete_keeps_user_and_links() {
    let gateway = bootstrapped(GatewayOptions::default()).await;
    let user = sample_user();
    gateway.create_user(&user).await.unwrap();
    gateway.store().fail_nth(StatementKind::DeleteLinks, 1).await;

    let err = gateway.delete_user(user.id).await.unwrap_err();

    assert_eq!(err.statement(), Some(StatementKind::DeleteLinks));
    let store = gateway.store();
    assert_eq!(store.user_ids().await, vec![user.id]);
    assert_eq!(store.links().await.len(), user.roles.len());
    assert!(!store.statement_log().await.contains(&StatementKind::DeleteUser));
    assert_eq!(gateway.get_user(user.id).await.unwrap().roles.len(), 3);
}

#[tokio::test]
async fn test_partial_update_is_left_in_place() {
    let gateway = bootstrapped(GatewayOptions::default()).await;
    let user = sample_user();
    gateway.create_user(&user).await.unwrap();
    gateway.store().fail_nth(StatementKind::InsertLink, 2).await;

    let mut renamed = user.clone();
    renamed.name = "Ada King".to_string();
    let err = gateway.update_user(&renamed).await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Write {
            statement: StatementKind::InsertLink,
            ..
        }
    ));
    let links = gateway.store().links().await;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].role_id, user.roles[0].id);

    let fetched = gateway.get_user(user.id).await.unwrap();
    assert_eq!(fetched.name, "Ada King");
    assert_eq!(fetched.role_ids(), vec![user.roles[0].id]);
    assert_eq!(gateway.store().role_ids().await.len(), 3);
}

#[tokio::test]
async fn test_bootstrap_twice_leaves_schema_unchanged() {
    let gateway = bootstrapped(GatewayOptions::default()).await;
    let before = gateway.store().collections().await;

    gateway.bootstrap().await.unwrap();

    assert_eq!(gateway.store().collections().await, before);
    assert_eq!(before, vec!["roles", "user_roles", "users"]);
}

#[tokio::test]
async fn test_bootstrap_keeps_existing_rows() {
    let gateway = bootstrapped(GatewayOptions::default()).await;
    let user = sample_user();
    gateway.create_user(&user).await.unwrap();

    gateway.bootstrap().await.unwrap();

    assert_eq!(gateway.get_user(user.id).await.unwrap().roles.len(), 3);
}

#[tokio::test]
async fn test_operations_before_bootstrap_fail() {
    let gateway = Gateway::new(MemoryStore::new(), GatewayOptions::default());

    let err = gateway.create_user(&sample_user()).await.unwrap_err();
    assert_eq!(err.statement(), Some(StatementKind::InsertUser));
}

#[tokio::test]
async fn test_dangling_link_fails_loudly() {
    let gateway = bootstrapped(GatewayOptions::default()).await;
    let user = sample_user();
    gateway.create_user(&user).await.unwrap();
    let missing = user.roles[1].id;
    assert!(gateway.store().remove_role_row(missing).await);

    let err = gateway.get_user(user.id).await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::DanglingReference { from, entity: Entity::Role, id }
            if from == user.id && id == missing
    ));
}

#[tokio::test]
async fn test_assign_role_does_not_check_existence() {
    let gateway = bootstrapped(GatewayOptions::default()).await;
    let user = User::new("Linus");
    gateway.create_user(&user).await.unwrap();
    let ghost = Uuid::now_v7();

    gateway.assign_role(user.id, ghost).await.unwrap();

    assert!(matches!(
        gateway.get_user(user.id).await,
        Err(GatewayError::DanglingReference { id, .. }) if id == ghost
    ));
}

#[tokio::test]
async fn test_standalone_role_and_assignment() {
    let gateway = bootstrapped(tracked()).await;
    let user = User::new("Barbara Liskov");
    let role = Role::new("Maintainer");
    gateway.create_user(&user).await.unwrap();
    gateway.create_role(&role).await.unwrap();

    gateway.assign_role(user.id, role.id).await.unwrap();

    let fetched = gateway.get_user(user.id).await.unwrap();
    assert_eq!(fetched.role_ids(), vec![role.id]);
    let fetched_role = gateway.get_role(role.id).await.unwrap();
    assert_eq!(fetched_role.users.len(), 1);
    assert_eq!(fetched_role.users[0].id, user.id);
    assert!(fetched_role.users[0].roles.is_empty());
}

#[tokio::test]
async fn test_duplicate_role_names_stay_distinct() {
    let gateway = bootstrapped(GatewayOptions::default()).await;
    let user = User::new("Ken").with_roles(vec![Role::new("Admin"), Role::new("Admin")]);

    gateway.create_user(&user).await.unwrap();

    let fetched = gateway.get_user(user.id).await.unwrap();
    assert_eq!(fetched.roles.len(), 2);
    assert_ne!(fetched.roles[0].id, fetched.roles[1].id);
    assert!(fetched.roles.iter().all(|role| role.name == "Admin"));
}

#[tokio::test]
async fn test_inverse_links_follow_membership() {
    let gateway = bootstrapped(tracked()).await;
    assert!(gateway.store().collections().await.contains(&"role_users"));
    let user = sample_user();
    gateway.create_user(&user).await.unwrap();

    let admin = gateway.get_role(user.roles[0].id).await.unwrap();
    assert_eq!(admin.users.len(), 1);
    assert_eq!(admin.users[0].name, user.name);

    let mut trimmed = user.clone();
    trimmed.roles.truncate(1);
    gateway.update_user(&trimmed).await.unwrap();

    let inverse = gateway.store().inverse_links().await;
    assert_eq!(inverse.len(), 1);
    assert_eq!(inverse[0].role_id, user.roles[0].id);
    assert!(gateway.get_role(user.roles[2].id).await.unwrap().users.is_empty());

    gateway.delete_user(user.id).await.unwrap();
    assert!(gateway.store().inverse_links().await.is_empty());
    assert!(gateway.store().links().await.is_empty());
    assert!(gateway.get_role(user.roles[0].id).await.unwrap().users.is_empty());
}

#[tokio::test]
async fn test_dangling_inverse_link_fails_loudly() {
    let gateway = bootstrapped(tracked()).await;
    let user = sample_user();
    gateway.create_user(&user).await.unwrap();
    assert!(gateway.store().remove_user_row(user.id).await);

    let err = gateway.get_role(user.roles[0].id).await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::DanglingReference { entity: Entity::User, id, .. } if id == user.id
    ));
}

#[tokio::test]
async fn test_concurrent_role_writes_round_trip() {
    let options = GatewayOptions {
        track_inverse_links: true,
        role_writes: RoleWriteMode::Concurrent,
    };
    let gateway = bootstrapped(options).await;
    let user = sample_user();

    gateway.create_user(&user).await.unwrap();
    let fetched = gateway.get_user(user.id).await.unwrap();
    assert_eq!(role_id_set(&fetched), role_id_set(&user));

    let mut trimmed = user.clone();
    trimmed.roles.pop();
    gateway.update_user(&trimmed).await.unwrap();
    let fetched = gateway.get_user(user.id).await.unwrap();
    assert_eq!(role_id_set(&fetched), role_id_set(&trimmed));
    assert_eq!(gateway.store().inverse_links().await.len(), 2);
}

#[tokio::test]
async fn test_concurrent_role_writes_still_report_failure() {
    let options = GatewayOptions {
        role_writes: RoleWriteMode::Concurrent,
        ..Default::default()
    };
    let gateway = bootstrapped(options).await;
    let user = sample_user();
    gateway.store().fail_nth(StatementKind::InsertLink, 2).await;

    let err = gateway.create_user(&user).await.unwrap_err();

    assert_eq!(err.statement(), Some(StatementKind::InsertLink));
    assert_eq!(gateway.store().user_ids().await, vec![user.id]);
    assert!(gateway.store().links().await.len() < user.roles.len());
}

#[tokio::test]
#[ignore = "requires a running Cassandra/Scylla node"]
async fn test_cql_store_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;
    let session = init_session(&config).await?;
    let store = CqlStore::new(
        session,
        Schema::new(&config.keyspace, config.replication_factor),
        config.consistency(),
    );
    let gateway = Gateway::new(store, tracked());
    gateway.bootstrap().await?;
    gateway.bootstrap().await?;

    let user = sample_user();
    gateway.create_user(&user).await?;
    let fetched = gateway.get_user(user.id).await?;
    assert_eq!(role_id_set(&fetched), role_id_set(&user));

    gateway.delete_user(user.id).await?;
    assert!(matches!(
        gateway.get_user(user.id).await,
        Err(GatewayError::NotFound { .. })
    ));
    assert_eq!(gateway.get_role(user.roles[0].id).await?.name, "Admin");

    Ok(())
}
