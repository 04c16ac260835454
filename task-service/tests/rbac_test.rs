mod common;

use axum::http::{Method, StatusCode};
use common::{request, spawn_app};
use serde_json::json;
use task_service::{
    models::{Organization, Role, Task},
    services::{OrganizationStore, TaskStore, UserStore},
};

#[tokio::test]
async fn test_admin_routes_require_admin_permission() {
    let app = spawn_app();
    let target = app.seed_user("target", Role::User).await;
    let uri = format!("/v1/admin/users/{}", target.id);

    for role in [Role::User, Role::Moderator] {
        let caller = app.seed_user(&format!("caller_{role}"), role).await;
        let (status, body) = app.get(&uri, Some(&caller.api_key)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{role}");
        assert_eq!(body["error"], "forbidden: insufficient permissions");
    }

    for role in [Role::Admin, Role::Owner] {
        let caller = app.seed_user(&format!("caller_{role}"), role).await;
        let (status, body) = app.get(&uri, Some(&caller.api_key)).await;
        assert_eq!(status, StatusCode::OK, "{role}");
        assert_eq!(body["username"], "target");
    }
}

#[tokio::test]
async fn test_unknown_stored_role_is_forbidden_everywhere() {
    let app = spawn_app();
    let user = app.seed_user_with_raw_role("mystery", "superuser").await;

    let (status, _) = app.get("/v1/tasks", Some(&user.api_key)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .get(&format!("/v1/admin/users/{}", user.id), Some(&user.api_key))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Authentication alone still succeeds
    let (status, _) = app.get("/v1/users/me", Some(&user.api_key)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_role_change_by_admin() {
    let app = spawn_app();
    let admin = app.seed_user("boss", Role::Admin).await;
    let target = app.seed_user("target", Role::User).await;
    let uri = format!("/v1/admin/users/{}/role", target.id);

    let (status, body) = app
        .send(request(
            Method::PUT,
            &uri,
            Some(&admin.api_key),
            Some(json!({ "role": "moderator" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "moderator");

    let stored = app.store.find_user_by_id(target.id).await.unwrap().unwrap();
    assert_eq!(stored.role, "moderator");
}

#[tokio::test]
async fn test_role_change_rejects_unknown_role() {
    let app = spawn_app();
    let admin = app.seed_user("boss", Role::Admin).await;
    let target = app.seed_user("target", Role::User).await;

    let (status, body) = app
        .send(request(
            Method::PUT,
            &format!("/v1/admin/users/{}/role", target.id),
            Some(&admin.api_key),
            Some(json!({ "role": "superuser" })),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid role"));
}

#[tokio::test]
async fn test_delete_permission_overrides_task_ownership() {
    let app = spawn_app();
    let author = app.seed_user("author", Role::User).await;
    let bystander = app.seed_user("bystander", Role::User).await;
    let moderator = app.seed_user("moderator", Role::Moderator).await;

    let task = Task::new(author.id, "Shared chores".to_string(), None);
    app.store.insert_task(&task).await.unwrap();
    let uri = format!("/v1/tasks/{}", task.id);

    let (status, body) = app
        .send(request(Method::DELETE, &uri, Some(&bystander.api_key), None))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access denied");

    let (status, _) = app
        .send(request(Method::DELETE, &uri, Some(&moderator.api_key), None))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(app.store.find_task_by_id(task.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_organization_update_requires_admin_role() {
    let app = spawn_app();
    let member = app.seed_user("member", Role::User).await;
    let owner = app.seed_user("owner", Role::Owner).await;

    let org = Organization::new("Acme".to_string(), None, owner.id);
    app.store.insert_organization(&org).await.unwrap();
    for user in [&member, &owner] {
        app.store
            .update_user_organization(user.id, Some(org.id))
            .await
            .unwrap();
    }
    let uri = format!("/v1/organizations/{}", org.id);

    let (status, _) = app
        .send(request(
            Method::PATCH,
            &uri,
            Some(&member.api_key),
            Some(json!({ "name": "Renamed" })),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Owner passes the admin gate through the hierarchy
    let (status, body) = app
        .send(request(
            Method::PATCH,
            &uri,
            Some(&owner.api_key),
            Some(json!({ "name": "Renamed" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Renamed");

    // Members may still read
    let (status, _) = app.get(&uri, Some(&member.api_key)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_organization_delete_requires_owner_role() {
    let app = spawn_app();
    let admin = app.seed_user("admin", Role::Admin).await;
    let owner = app.seed_user("owner", Role::Owner).await;

    let org = Organization::new("Acme".to_string(), None, owner.id);
    app.store.insert_organization(&org).await.unwrap();
    for user in [&admin, &owner] {
        app.store
            .update_user_organization(user.id, Some(org.id))
            .await
            .unwrap();
    }
    let uri = format!("/v1/organizations/{}", org.id);

    let (status, _) = app
        .send(request(Method::DELETE, &uri, Some(&admin.api_key), None))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(request(Method::DELETE, &uri, Some(&owner.api_key), None))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&uri, Some(&owner.api_key)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
