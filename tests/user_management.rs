mod common;

use std::sync::atomic::Ordering;

use uuid::Uuid;

use hrm_user_service::{
    common::error::AppError,
    db::CredentialStore,
    models::{
        auth::{AccountStatus, Gender},
        user::{AccountInput, AccountUpdateInput, CreateUserPayload, Pagination, UpdateUserPayload},
    },
};

use common::{login_payload, role, TestApp};

fn create_payload(username: &str, phone: &str) -> CreateUserPayload {
    CreateUserPayload {
        first_name: "Bao".into(),
        last_name: "Tran".into(),
        gender: Gender::Male,
        email: Some(format!("{}@example.com", username)),
        phone: phone.into(),
        ward_code: Some("26734".into()),
        address: None,
        avatar: None,
        company_id: None,
        account: AccountInput {
            username: username.into(),
            password: "secret99".into(),
        },
        perm_ids: vec![Uuid::new_v4()],
        role_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
    }
}

#[tokio::test]
async fn create_user_assigns_permissions_and_roles() {
    let app = TestApp::new();

    let payload = create_payload("bao", "0911111111");
    let perm_ids = payload.perm_ids.clone();
    let role_ids = payload.role_ids.clone();

    let created = app.state.user_service.create_user(payload).await.unwrap();

    let assignments = app.perms.assignments.lock().unwrap();
    let (perms, roles) = assignments.get(&created.user.id).unwrap();
    assert_eq!(perms, &perm_ids);
    assert_eq!(roles, &role_ids);
}

#[tokio::test]
async fn failed_assignment_removes_the_new_user() {
    let app = TestApp::new();
    app.perms.fail_writes.store(true, Ordering::SeqCst);

    let err = app
        .state
        .user_service
        .create_user(create_payload("bao", "0911111111"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DependencyError { .. }));
    assert_eq!(app.store.user_count().await, 0);
    assert_eq!(app.store.account_count().await, 0);
}

#[tokio::test]
async fn failed_role_assignment_also_removes_the_granted_permissions() {
    let app = TestApp::new();
    app.perms.fail_role_writes.store(true, Ordering::SeqCst);

    let err = app
        .state
        .user_service
        .create_user(create_payload("bao", "0911111111"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DependencyError { .. }));
    assert_eq!(app.store.user_count().await, 0);

    // The permission assignment went through before roles failed.
    let cleaned_up = app.perms.cleaned_up.lock().unwrap().clone();
    assert_eq!(cleaned_up.len(), 1);
    let assignments = app.perms.assignments.lock().unwrap();
    assert!(assignments[&cleaned_up[0]].0.is_empty());
}

#[tokio::test]
async fn get_user_includes_account_roles_and_perms() {
    let app = TestApp::new();
    app.perms.set_roles(vec![role("hr_manager", &["user:read"])]);

    let created = app
        .state
        .user_service
        .create_user(create_payload("bao", "0911111111"))
        .await
        .unwrap();

    let detail = app.state.user_service.get_user(created.user.id).await.unwrap();

    assert_eq!(detail.user.account.map(|a| a.username), Some("bao".to_string()));
    assert_eq!(detail.roles.len(), 1);

    let missing = app.state.user_service.get_user(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(missing, AppError::UserNotFound));
}

#[tokio::test]
async fn update_rehashes_the_password_and_replaces_roles() {
    let app = TestApp::new();
    let created = app
        .state
        .user_service
        .create_user(create_payload("bao", "0911111111"))
        .await
        .unwrap();

    let new_roles = vec![Uuid::new_v4()];
    let payload = UpdateUserPayload {
        last_name: Some("Le".into()),
        account: Some(AccountUpdateInput {
            password: Some("newsecret1".into()),
            ..Default::default()
        }),
        role_ids: Some(new_roles.clone()),
        ..Default::default()
    };

    let updated = app
        .state
        .user_service
        .update_user(created.user.id, payload)
        .await
        .unwrap();

    assert_eq!(updated.user.last_name, "Le");
    assert_eq!(updated.user.first_name, "Bao");
    // Fields left out of the update keep their values.
    assert_eq!(updated.user.email.as_deref(), Some("bao@example.com"));
    assert_eq!(updated.user.ward_code.as_deref(), Some("26734"));

    let auth = &app.state.auth_service;
    auth.login(login_payload("bao", "newsecret1")).await.unwrap();
    assert!(matches!(
        auth.login(login_payload("bao", "secret99")).await,
        Err(AppError::InvalidCredentials)
    ));

    let assignments = app.perms.assignments.lock().unwrap();
    assert_eq!(assignments[&created.user.id].1, new_roles);
}

#[tokio::test]
async fn status_change_is_visible_to_login() {
    let app = TestApp::new();
    let created = app
        .state
        .user_service
        .create_user(create_payload("bao", "0911111111"))
        .await
        .unwrap();

    let account = app
        .state
        .user_service
        .set_account_status(created.user.id, AccountStatus::Inactive)
        .await
        .unwrap();
    assert_eq!(account.status, AccountStatus::Inactive);

    let err = app
        .state
        .auth_service
        .login(login_payload("bao", "secret99"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccountInactive));
}

#[tokio::test]
async fn delete_cleans_up_remote_assignments() {
    let app = TestApp::new();
    let created = app
        .state
        .user_service
        .create_user(create_payload("bao", "0911111111"))
        .await
        .unwrap();

    let outcome = app.state.user_service.delete_user(created.user.id).await.unwrap();

    assert!(outcome.success);
    assert!(outcome.warnings.is_empty());
    assert_eq!(*app.perms.cleaned_up.lock().unwrap(), vec![created.user.id]);
    assert!(app.store.find_user_by_id(created.user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_keeps_the_local_delete_when_cleanup_fails() {
    let app = TestApp::new();
    let created = app
        .state
        .user_service
        .create_user(create_payload("bao", "0911111111"))
        .await
        .unwrap();
    app.perms.fail_deletes.store(true, Ordering::SeqCst);

    let outcome = app.state.user_service.delete_user(created.user.id).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.warnings.len(), 2);
    assert_eq!(app.store.user_count().await, 0);
    assert_eq!(app.store.account_count().await, 0);
}

#[tokio::test]
async fn deleting_an_unknown_user_is_not_found() {
    let app = TestApp::new();

    let err = app.state.user_service.delete_user(Uuid::new_v4()).await.unwrap_err();

    assert!(matches!(err, AppError::UserNotFound));
    assert!(app.perms.cleaned_up.lock().unwrap().is_empty());
}

#[tokio::test]
async fn listing_and_lookup_by_ids_are_paginated() {
    let app = TestApp::new();
    let mut ids = Vec::new();
    for i in 0..5 {
        let created = app
            .state
            .user_service
            .create_user(create_payload(&format!("user{}", i), &format!("091111111{}", i)))
            .await
            .unwrap();
        ids.push(created.user.id);
    }

    let first_page = app
        .state
        .user_service
        .list_users(Pagination::new(1, 3))
        .await
        .unwrap();
    assert_eq!(first_page.users.len(), 3);

    let wanted = vec![ids[1], ids[3], ids[4]];
    let second_page = app
        .state
        .user_service
        .get_users_by_ids(&wanted, Pagination::new(2, 2))
        .await
        .unwrap();
    assert_eq!(second_page.users.len(), 1);
    assert_eq!(second_page.users[0].id, ids[4]);
}
