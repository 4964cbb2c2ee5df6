//! # 身份同步集成测试
//!
//! 覆盖查找或创建、粘性状态、并发合并、过期结果丢弃、登出与重启恢复

use std::sync::Arc;
use std::time::Duration;

use expense_client::error::{ClientError, ErrorKind, PARSE_ERROR_MESSAGE};
use expense_client::identity::{ProviderSession, SyncOutcome, SyncState};
use expense_client::session::{SessionRecord, SessionStore};
use expense_client::testing::*;
use expense_client::types::{BackendUser, DateRange};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn signed_in(external_id: &str, email: &str) -> ProviderSession {
    ProviderSession::SignedIn(provider_user(external_id, email))
}

fn ada() -> BackendUser {
    BackendUserFixture::new()
        .id(1)
        .name("a")
        .email("a@x.com")
        .external_id("ext-42")
        .build()
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

#[tokio::test]
async fn test_first_login_creates_second_login_finds() {
    let server = MockServer::start().await;
    let user = ada();

    find_absent_mock("ext-42")
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    find_user_mock(&user).expect(1).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/users/"))
        .and(body_json(json!({
            "name": "a",
            "email": "a@x.com",
            "external_id": "ext-42",
            "allowance": 50.0,
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(&user))
        .expect(1)
        .mount(&server)
        .await;

    let (tracker, store) = test_tracker(&server.uri()).unwrap();
    let bridge = tracker.bridge();

    let outcome = bridge.observe(signed_in("ext-42", "a@x.com")).await;
    assert_eq!(outcome, SyncOutcome::Synced(user.clone()));
    assert_eq!(bridge.state(), SyncState::Synced(user.clone()));
    assert_eq!(store.load().map(|r| r.backend_user), Some(user.clone()));

    assert_eq!(bridge.observe(ProviderSession::SignedOut).await, SyncOutcome::SignedOut);
    let outcome = bridge.observe(signed_in("ext-42", "a@x.com")).await;
    assert_eq!(outcome, SyncOutcome::Synced(user));
}

#[tokio::test]
async fn test_synced_identity_is_sticky() {
    let server = MockServer::start().await;
    let user = backend_user(5, "ext-5");
    find_user_mock(&user).expect(1).mount(&server).await;

    let (tracker, _store) = test_tracker(&server.uri()).unwrap();
    let bridge = tracker.bridge();

    let session = signed_in("ext-5", "u5@example.com");
    assert!(matches!(bridge.observe(session.clone()).await, SyncOutcome::Synced(_)));
    let before = request_count(&server).await;

    assert_eq!(bridge.observe(session.clone()).await, SyncOutcome::Unchanged(user.clone()));
    assert_eq!(bridge.observe(session).await, SyncOutcome::Unchanged(user));
    assert_eq!(request_count(&server).await, before);
}

#[tokio::test]
async fn test_overlapping_triggers_are_coalesced() {
    let server = MockServer::start().await;
    let user = backend_user(6, "ext-6");
    Mock::given(method("GET"))
        .and(path("/users/by-external-id/ext-6"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&user)
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(&user))
        .expect(0)
        .mount(&server)
        .await;

    let (tracker, _store) = test_tracker(&server.uri()).unwrap();
    let bridge = tracker.bridge();
    let session = signed_in("ext-6", "u6@example.com");

    let (first, second) = tokio::join!(bridge.observe(session.clone()), bridge.observe(session));
    assert_eq!(first, SyncOutcome::Synced(user.clone()));
    assert_eq!(second, SyncOutcome::Coalesced);
    assert_eq!(bridge.state(), SyncState::Synced(user));
}

#[tokio::test]
async fn test_late_result_for_superseded_identity_is_discarded() {
    let server = MockServer::start().await;
    let user_a = backend_user(10, "ext-a");
    let user_b = backend_user(11, "ext-b");
    Mock::given(method("GET"))
        .and(path("/users/by-external-id/ext-a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&user_a)
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    find_user_mock(&user_b).mount(&server).await;

    let (tracker, store) = test_tracker(&server.uri()).unwrap();
    let bridge = tracker.bridge();

    let (outcome_a, outcome_b) = tokio::join!(bridge.observe(signed_in("ext-a", "a@example.com")), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        bridge.observe(signed_in("ext-b", "b@example.com")).await
    });

    assert_eq!(outcome_a, SyncOutcome::Superseded);
    assert_eq!(outcome_b, SyncOutcome::Synced(user_b.clone()));
    assert_eq!(bridge.state(), SyncState::Synced(user_b.clone()));
    assert_eq!(store.load().map(|r| r.backend_user), Some(user_b));
}

#[tokio::test]
async fn test_sign_out_during_sync_wins() {
    let server = MockServer::start().await;
    let user = backend_user(12, "ext-12");
    Mock::given(method("GET"))
        .and(path("/users/by-external-id/ext-12"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&user)
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let (tracker, store) = test_tracker(&server.uri()).unwrap();
    let bridge = tracker.bridge();

    let (outcome, signed_out) = tokio::join!(bridge.observe(signed_in("ext-12", "u12@example.com")), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        bridge.observe(ProviderSession::SignedOut).await
    });

    assert_eq!(outcome, SyncOutcome::Superseded);
    assert_eq!(signed_out, SyncOutcome::SignedOut);
    assert_eq!(bridge.state(), SyncState::Unresolved);
    assert!(store.load().is_none());
}

#[tokio::test]
async fn test_logout_then_restart_stays_unresolved() {
    let server = MockServer::start().await;
    let user = backend_user(7, "ext-7");
    find_user_mock(&user).expect(1).mount(&server).await;

    let (file_store, _dir) = temp_file_store().unwrap();
    let store: Arc<dyn SessionStore> = Arc::new(file_store.clone());
    let tracker = test_tracker_with_store(&server.uri(), store).unwrap();

    tracker.bridge().observe(signed_in("ext-7", "u7@example.com")).await;
    assert!(file_store.path().exists());

    tracker.bridge().observe(ProviderSession::SignedOut).await;
    assert!(!file_store.path().exists());
    let before = request_count(&server).await;

    let restarted = test_tracker_with_store(&server.uri(), Arc::new(file_store)).unwrap();
    assert_eq!(restarted.bridge().state(), SyncState::Unresolved);
    assert_eq!(
        restarted.bridge().observe(ProviderSession::Loading).await,
        SyncOutcome::Ignored
    );
    assert_eq!(request_count(&server).await, before);
}

#[tokio::test]
async fn test_restart_restores_synced_user_without_request() {
    let server = MockServer::start().await;
    let user = backend_user(8, "ext-8");

    let (file_store, _dir) = temp_file_store().unwrap();
    file_store.save(&SessionRecord::new(user.clone())).unwrap();

    let tracker = test_tracker_with_store(&server.uri(), Arc::new(file_store)).unwrap();
    assert_eq!(tracker.bridge().state(), SyncState::Synced(user.clone()));

    let outcome = tracker.bridge().observe(signed_in("ext-8", "u8@example.com")).await;
    assert_eq!(outcome, SyncOutcome::Unchanged(user));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_identity_swap_clears_stale_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/by-external-id/ext-new"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "db down"})))
        .mount(&server)
        .await;

    let (file_store, _dir) = temp_file_store().unwrap();
    file_store
        .save(&SessionRecord::new(backend_user(9, "ext-old")))
        .unwrap();
    let tracker = test_tracker_with_store(&server.uri(), Arc::new(file_store.clone())).unwrap();

    let outcome = tracker.bridge().observe(signed_in("ext-new", "new@example.com")).await;
    let SyncOutcome::Failed(failure) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(failure.external_id, "ext-new");
    assert_eq!(failure.error.kind, ErrorKind::ApiError);
    assert_eq!(failure.error.status, Some(500));
    assert_eq!(failure.error.message, "db down");
    assert!(file_store.load().is_none());
}

#[tokio::test]
async fn test_store_write_failure_is_not_published_as_synced() {
    let server = MockServer::start().await;
    let user = backend_user(3, "ext-3");
    find_user_mock(&user).mount(&server).await;

    let mut store = MockSessionStore::new();
    store.expect_load().returning(|| None);
    store
        .expect_save()
        .times(1)
        .returning(|_| Err(ClientError::store("disk full")));

    let tracker = test_tracker_with_store(&server.uri(), Arc::new(store)).unwrap();
    let bridge = tracker.bridge();

    let outcome = bridge.observe(signed_in("ext-3", "u3@example.com")).await;
    let SyncOutcome::Failed(failure) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(failure.error.kind, ErrorKind::Unknown);
    assert!(failure.error.message.contains("disk full"));
    assert!(matches!(bridge.state(), SyncState::Failed(_)));
    assert!(matches!(tracker.scope(), Err(ClientError::NotSynced { .. })));
}

#[tokio::test]
async fn test_server_user_with_invalid_id_fails_sync() {
    let server = MockServer::start().await;
    find_user_mock(&backend_user(-5, "ext-neg")).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/expenses/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (tracker, store) = test_tracker(&server.uri()).unwrap();
    let outcome = tracker
        .bridge()
        .observe(signed_in("ext-neg", "neg@example.com"))
        .await;

    let SyncOutcome::Failed(failure) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(failure.error.kind, ErrorKind::ApiError);
    assert_eq!(failure.error.message, PARSE_ERROR_MESSAGE);
    assert!(store.load().is_none());
    assert!(matches!(tracker.scope(), Err(ClientError::NotSynced { .. })));
}

#[tokio::test]
async fn test_restart_with_invalid_record_is_unresolved() {
    let server = MockServer::start().await;
    let (file_store, _dir) = temp_file_store().unwrap();
    file_store
        .save(&SessionRecord::new(backend_user(0, "ext-0")))
        .unwrap();

    let tracker = test_tracker_with_store(&server.uri(), Arc::new(file_store.clone())).unwrap();
    assert_eq!(tracker.bridge().state(), SyncState::Unresolved);
    assert!(!file_store.path().exists());
    assert!(matches!(tracker.scope(), Err(ClientError::NotSynced { .. })));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_failure_leaves_store_untouched_and_retry_recovers() {
    let server = MockServer::start().await;
    let user = backend_user(13, "ext-13");
    Mock::given(method("GET"))
        .and(path("/users/by-external-id/ext-13"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    find_user_mock(&user).mount(&server).await;

    let (tracker, store) = test_tracker(&server.uri()).unwrap();
    let bridge = tracker.bridge();

    let outcome = bridge.observe(signed_in("ext-13", "u13@example.com")).await;
    assert!(matches!(outcome, SyncOutcome::Failed(_)));
    assert!(matches!(bridge.state(), SyncState::Failed(_)));
    assert!(store.load().is_none());

    assert_eq!(bridge.retry().await, SyncOutcome::Synced(user.clone()));
    assert_eq!(store.load().map(|r| r.backend_user), Some(user));
}

#[tokio::test]
async fn test_create_conflict_refinds_existing_user() {
    let server = MockServer::start().await;
    let user = backend_user(14, "ext-14");
    find_absent_mock("ext-14")
        .up_to_n_times(1)
        .mount(&server)
        .await;
    find_user_mock(&user).expect(1).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/users/"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"detail": "already exists"})))
        .expect(1)
        .mount(&server)
        .await;

    let (tracker, _store) = test_tracker(&server.uri()).unwrap();
    let outcome = tracker
        .bridge()
        .observe(signed_in("ext-14", "u14@example.com"))
        .await;
    assert_eq!(outcome, SyncOutcome::Synced(user));
}

#[tokio::test]
async fn test_refresh_forces_new_lookup() {
    let server = MockServer::start().await;
    let user = backend_user(15, "ext-15");
    find_user_mock(&user).expect(2).mount(&server).await;

    let (tracker, _store) = test_tracker(&server.uri()).unwrap();
    let bridge = tracker.bridge();
    let mut rx = bridge.subscribe();

    bridge.observe(signed_in("ext-15", "u15@example.com")).await;
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_synced());

    assert_eq!(bridge.refresh().await, SyncOutcome::Synced(user));
}

#[tokio::test]
async fn test_scope_requires_synced_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/expenses/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    let user = backend_user(16, "ext-16");
    find_user_mock(&user).mount(&server).await;

    let (tracker, _store) = test_tracker(&server.uri()).unwrap();
    assert!(matches!(tracker.scope(), Err(ClientError::NotSynced { .. })));

    tracker.bridge().observe(signed_in("ext-16", "u16@example.com")).await;
    let scope = tracker.scope().unwrap();
    assert_eq!(scope.user_id(), 16);

    tracker.bridge().observe(ProviderSession::SignedOut).await;
    let err = scope.list_expenses().await.unwrap_err();
    assert!(matches!(err, ClientError::NotSynced { .. }));
}

#[tokio::test]
async fn test_scope_rejects_after_identity_change() {
    let server = MockServer::start().await;
    let user_a = backend_user(17, "ext-17");
    let user_b = backend_user(18, "ext-18");
    find_user_mock(&user_a).mount(&server).await;
    find_user_mock(&user_b).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/analytics/17"))
        .respond_with(ResponseTemplate::new(200).set_body_json(analytics_snapshot(17)))
        .expect(0)
        .mount(&server)
        .await;

    let (tracker, _store) = test_tracker(&server.uri()).unwrap();
    tracker.bridge().observe(signed_in("ext-17", "u17@example.com")).await;
    let scope = tracker.scope().unwrap();

    tracker.bridge().observe(signed_in("ext-18", "u18@example.com")).await;
    let err = scope.analytics(DateRange::default()).await.unwrap_err();
    assert!(matches!(err, ClientError::NotSynced { .. }));
}

#[tokio::test]
async fn test_expense_create_then_list_through_scope() {
    let server = MockServer::start().await;
    let user = backend_user(19, "ext-19");
    find_user_mock(&user).mount(&server).await;

    let draft = expense_draft(12.5, "Lunch").with_category("food");
    let created = expense_from_draft(100, 19, &draft);
    Mock::given(method("POST"))
        .and(path("/expenses/"))
        .and(query_param("user_id", "19"))
        .and(body_json(&draft))
        .respond_with(ResponseTemplate::new(201).set_body_json(&created))
        .expect(1)
        .mount(&server)
        .await;
    list_expenses_mock(19, std::slice::from_ref(&created))
        .expect(1)
        .mount(&server)
        .await;

    let (tracker, _store) = test_tracker(&server.uri()).unwrap();
    tracker.bridge().observe(signed_in("ext-19", "u19@example.com")).await;
    let scope = tracker.scope().unwrap();

    let expense = scope.create_expense(&draft).await.unwrap();
    assert_eq!(expense.user_id, 19);

    let listed = scope.list_expenses().await.unwrap();
    assert!(listed.iter().any(|e| {
        e.amount == draft.amount && e.title == draft.title && e.category == draft.category
    }));
}

#[tokio::test]
async fn test_invalid_draft_is_rejected_before_request() {
    let server = MockServer::start().await;
    let user = backend_user(20, "ext-20");
    find_user_mock(&user).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/expenses/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let (tracker, _store) = test_tracker(&server.uri()).unwrap();
    tracker.bridge().observe(signed_in("ext-20", "u20@example.com")).await;
    let scope = tracker.scope().unwrap();

    let err = scope.create_expense(&expense_draft(-3.0, "Refund")).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation { .. }));
    let err = scope.create_expense(&expense_draft(3.0, "  ")).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation { .. }));
}

#[tokio::test]
async fn test_analytics_through_scope() {
    let server = MockServer::start().await;
    let user = backend_user(21, "ext-21");
    find_user_mock(&user).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/analytics/21"))
        .and(query_param("date_from", "2024-03-01"))
        .and(query_param("date_to", "2024-03-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(analytics_snapshot(21)))
        .expect(1)
        .mount(&server)
        .await;

    let (tracker, _store) = test_tracker(&server.uri()).unwrap();
    tracker.bridge().observe(signed_in("ext-21", "u21@example.com")).await;

    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2024, 3, 1),
        NaiveDate::from_ymd_opt(2024, 3, 31),
    );
    let snapshot = tracker.scope().unwrap().analytics(range).await.unwrap();
    assert_eq!(snapshot, analytics_snapshot(21));
}
