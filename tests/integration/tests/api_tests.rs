//! Admin API integration tests
//!
//! Most tests run against in-memory repositories. Tests that need a real
//! database are skipped unless DATABASE_URL is set.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use integration_tests::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

use butler_core::{MirrorRole, RosterRepository, Snowflake, TaskRepository};
use butler_service::jobs::mirror_member;
use butler_service::ActivitySnapshot;

async fn seed_roster(backend: &InMemoryBackend) {
    let mods = role(900, "Moderators", 3);
    let muted = role(901, "Muted", 1);

    let mut alice = member(175_928_847_299_117_063, "alice");
    alice.role_ids.push(mods.id);
    let mut bob = member(275_928_847_299_117_063, "bob");
    bob.nick = Some("Bobby".to_string());
    let mut helper = member(375_928_847_299_117_063, "helper");
    helper.bot = true;

    let activity = ActivitySnapshot::new(HashMap::from([(alice.id, 60), (bob.id, 3)]));
    let now = Utc::now();
    let members: Vec<_> = [alice, bob, helper]
        .iter()
        .map(|m| mirror_member(m, GUILD_ID, &activity, now))
        .collect();
    let roles = vec![MirrorRole::from(&mods), MirrorRole::from(&muted)];

    backend.roster.replace_all(&roles, &members).await.unwrap();
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start_in_memory(&InMemoryBackend::new())
        .await
        .unwrap();

    let body: Value = assert_json(server.get("/health").await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_reflects_database() {
    let backend = InMemoryBackend::new();

    let ready = TestServer::start_in_memory(&backend).await.unwrap();
    let body: Value = assert_json(ready.get("/health/ready").await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert_eq!(body["checks"]["database"], "healthy");

    let state = backend.app_state(Arc::new(StaticProbe(false))).unwrap();
    let down = TestServer::start_with_state(state).await.unwrap();
    let body: Value = assert_json(
        down.get("/health/ready").await.unwrap(),
        StatusCode::SERVICE_UNAVAILABLE,
    )
    .await
    .unwrap();
    assert_eq!(body["status"], "not_ready");
}

// ============================================================================
// Tasks
// ============================================================================

#[tokio::test]
async fn test_create_and_get_task() {
    let backend = InMemoryBackend::new();
    let server = TestServer::start_in_memory(&backend).await.unwrap();

    let response = server
        .post(
            "/api/v1/tasks",
            &json!({"task_type": "KICK", "member_ids": ["175928847299117063", 42]}),
        )
        .await
        .unwrap();
    let created: Value = assert_json(response, StatusCode::CREATED).await.unwrap();
    let task = &created["data"];

    assert_eq!(task["task_type"], "KICK");
    assert_eq!(task["status"], "IN_QUEUE");
    assert_eq!(task["member_ids"], json!(["175928847299117063", "42"]));
    assert!(task.get("error").is_none());

    let id = task["id"].as_i64().unwrap();
    let fetched: Value = assert_json(
        server.get(&format!("/api/v1/tasks/{id}")).await.unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(fetched["data"]["id"], id);
    assert_eq!(backend.tasks.all().len(), 1);
}

#[tokio::test]
async fn test_list_tasks_filters_by_status() {
    let backend = InMemoryBackend::new();
    let server = TestServer::start_in_memory(&backend).await.unwrap();

    for body in [
        json!({"task_type": "BAN", "member_ids": ["1"]}),
        json!({"task_type": "ASSIGN_ROLE", "member_ids": ["2"], "role_ids": ["900"]}),
    ] {
        assert_status(server.post("/api/v1/tasks", &body).await.unwrap(), StatusCode::CREATED)
            .await
            .unwrap();
    }

    let first = backend.tasks.all()[0].id;
    backend.tasks.mark_started(first).await.unwrap();

    let all: Value = assert_json(server.get("/api/v1/tasks").await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert_eq!(all["data"].as_array().unwrap().len(), 2);
    assert_eq!(all["limit"], 50);
    // Newest first
    assert_eq!(all["data"][0]["task_type"], "ASSIGN_ROLE");

    let started: Value = assert_json(
        server.get("/api/v1/tasks?status=STARTED").await.unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    let started = started["data"].as_array().unwrap();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0]["task_type"], "BAN");
}

#[tokio::test]
async fn test_create_task_validation() {
    let backend = InMemoryBackend::new();
    let server = TestServer::start_in_memory(&backend).await.unwrap();

    let cases = [
        json!({"task_type": "ASSIGN_ROLE", "member_ids": ["1"]}),
        json!({"task_type": "KICK", "member_ids": []}),
        json!({"task_type": "KICK", "member_ids": ["1"], "role_ids": ["2"]}),
    ];
    for body in cases {
        let response = server.post("/api/v1/tasks", &body).await.unwrap();
        let error: Value = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
        assert_eq!(error["error"]["code"], "VALIDATION_ERROR", "body: {body}");
    }

    let response = server
        .post("/api/v1/tasks", &json!({"task_type": "EXPLODE", "member_ids": ["1"]}))
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    assert!(backend.tasks.all().is_empty());
}

#[tokio::test]
async fn test_get_task_errors() {
    let server = TestServer::start_in_memory(&InMemoryBackend::new())
        .await
        .unwrap();

    let missing: Value = assert_json(
        server.get("/api/v1/tasks/999").await.unwrap(),
        StatusCode::NOT_FOUND,
    )
    .await
    .unwrap();
    assert_eq!(missing["error"]["code"], "NOT_FOUND");

    assert_status(
        server.get("/api/v1/tasks/abc").await.unwrap(),
        StatusCode::BAD_REQUEST,
    )
    .await
    .unwrap();
}

// ============================================================================
// Roster
// ============================================================================

#[tokio::test]
async fn test_list_members_with_filters() {
    let backend = InMemoryBackend::new();
    seed_roster(&backend).await;
    let server = TestServer::start_in_memory(&backend).await.unwrap();

    let all: Value = assert_json(server.get("/api/v1/members").await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert_eq!(all["data"].as_array().unwrap().len(), 3);

    let engaged: Value = assert_json(
        server.get("/api/v1/members?min_engagement=5").await.unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    let engaged = engaged["data"].as_array().unwrap();
    assert_eq!(engaged.len(), 1);
    assert_eq!(engaged[0]["name"], "alice");
    assert_eq!(engaged[0]["messages_count"], 60);
    assert_eq!(engaged[0]["role_ids"], json!(["900"]));

    let by_nick: Value = assert_json(
        server.get("/api/v1/members?search=bobby").await.unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(by_nick["data"][0]["username"], "bob#0001");

    let bots: Value = assert_json(
        server.get("/api/v1/members?bot=true").await.unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(bots["data"].as_array().unwrap().len(), 1);

    assert_status(
        server.get("/api/v1/members?min_engagement=9").await.unwrap(),
        StatusCode::BAD_REQUEST,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_get_member_and_roles() {
    let backend = InMemoryBackend::new();
    seed_roster(&backend).await;
    let server = TestServer::start_in_memory(&backend).await.unwrap();

    let member: Value = assert_json(
        server.get("/api/v1/members/275928847299117063").await.unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(member["data"]["nick"], "Bobby");
    assert_eq!(member["data"]["engagement_score"], 1);

    assert_status(
        server
            .get(&format!("/api/v1/members/{}", Snowflake::new(5)))
            .await
            .unwrap(),
        StatusCode::NOT_FOUND,
    )
    .await
    .unwrap();

    let roles: Value = assert_json(server.get("/api/v1/roles").await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    let names: Vec<_> = roles["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Moderators", "Muted"]);
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn test_settings_read_and_update() {
    let backend = InMemoryBackend::new();
    let server = TestServer::start_in_memory(&backend).await.unwrap();

    let current: Value = assert_json(server.get("/api/v1/settings").await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert_eq!(current["data"]["delete_message_days_when_banned"], 1);

    let updated: Value = assert_json(
        server
            .patch("/api/v1/settings", &json!({"delete_message_days_when_banned": 5}))
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(updated["data"]["delete_message_days_when_banned"], 5);

    assert_status(
        server
            .patch("/api/v1/settings", &json!({"delete_message_days_when_banned": 9}))
            .await
            .unwrap(),
        StatusCode::BAD_REQUEST,
    )
    .await
    .unwrap();

    let after: Value = assert_json(server.get("/api/v1/settings").await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert_eq!(after["data"]["delete_message_days_when_banned"], 5);
}

// ============================================================================
// Database-backed
// ============================================================================

#[tokio::test]
async fn test_task_round_trip_against_database() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.unwrap();

    let created: Value = assert_json(
        server
            .post(
                "/api/v1/tasks",
                &json!({"task_type": "REMOVE_ROLE", "member_ids": ["11", "12"], "role_ids": ["13"]}),
            )
            .await
            .unwrap(),
        StatusCode::CREATED,
    )
    .await
    .unwrap();
    let id = created["data"]["id"].as_i64().unwrap();

    let fetched: Value = assert_json(
        server.get(&format!("/api/v1/tasks/{id}")).await.unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(fetched["data"]["role_ids"], json!(["13"]));
    assert_eq!(fetched["data"]["status"], "IN_QUEUE");

    let ready: Value = assert_json(server.get("/health/ready").await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert_eq!(ready["status"], "ready");
}
