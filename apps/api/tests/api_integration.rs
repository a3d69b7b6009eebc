//! HTTP-level tests: the full router against an in-memory database.

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt; // For `oneshot` method

use pokernight_api::{create_router, ApiConfig, AppState};
use pokernight_db::{Database, DbConfig};

const ADMIN_PASSWORD: &str = "all-in-on-the-river";

async fn create_test_app(admin_enabled: bool) -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let mut config = ApiConfig::default();
    config.jwt_secret = "integration-test-secret".to_string();
    config.backup_dir = std::env::temp_dir().join(format!("pokernight-it-{}", unique_suffix()));
    if admin_enabled {
        let salt = SaltString::from_b64("aW50ZWdyYXRpb25zYWx0").unwrap();
        let hash = Argon2::default()
            .hash_password(ADMIN_PASSWORD.as_bytes(), &salt)
            .unwrap()
            .to_string();
        config.admin_password_hash = Some(hash);
    }

    create_router(AppState::new(db, config))
}

fn unique_suffix() -> String {
    format!(
        "{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    )
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn add_player(app: &Router, name: &str) -> String {
    let (status, body) = send(app, "POST", "/api/players", Some(json!({ "name": name })), None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["player_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_and_config() {
    let app = create_test_app(false).await;

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);

    let (status, body) = send(&app, "GET", "/api/config", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api_base_url"], "/api");
    assert!(body["cache_name_prefix"]
        .as_str()
        .unwrap()
        .starts_with("poker-night-v"));
}

#[tokio::test]
async fn test_chip_calculator() {
    let app = create_test_app(false).await;

    let (status, body) = send(&app, "GET", "/api/chip-calculator/20.00", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["buy_in"], 20.0);
    assert_eq!(body["total_chips"], 67);
    assert_eq!(
        body["chip_distribution"],
        json!({"Black": 10, "Blue": 10, "Green": 13, "Red": 14, "White": 20})
    );

    for bad in ["0", "-5.00", "twenty"] {
        let (status, body) =
            send(&app, "GET", &format!("/api/chip-calculator/{}", bad), None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount {}", bad);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_player_add_is_case_insensitive() {
    let app = create_test_app(false).await;

    let alice = add_player(&app, "Alice").await;
    assert_eq!(alice, "pid_001");

    let (status, body) =
        send(&app, "POST", "/api/players", Some(json!({ "name": "  alice " })), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["player_id"], "pid_001");

    let (status, body) =
        send(&app, "POST", "/api/players", Some(json!({ "name": "   " })), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(&app, "GET", "/api/players/pid_404/stats", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_flow() {
    let app = create_test_app(false).await;
    let alice = add_player(&app, "Alice").await;
    let bob = add_player(&app, "Bob").await;

    let (status, session) =
        send(&app, "POST", "/api/sessions", Some(json!({ "date": "2024-01-05" })), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["id"], "sid_20240105_1");
    assert_eq!(session["buy_in_cents"], 2000);
    assert_eq!(session["total_chips"], 67);

    let (status, entries) = send(
        &app,
        "POST",
        "/api/sessions/sid_20240105_1/entries",
        Some(json!({ "player_id": alice, "num_buy_ins": 2 })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entries[0]["total_buy_in_cents"], 4000);

    send(
        &app,
        "POST",
        "/api/sessions/sid_20240105_1/entries",
        Some(json!({ "player_id": bob })),
        None,
    )
    .await;

    let (status, entries) = send(
        &app,
        "PUT",
        &format!("/api/sessions/sid_20240105_1/entries/{}/payout", alice),
        Some(json!({ "payout_cents": 6000 })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let alice_entry = entries
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["player_id"] == alice.as_str())
        .unwrap();
    assert_eq!(alice_entry["profit_cents"], 2000);

    let (status, entries) = send(
        &app,
        "PUT",
        &format!("/api/sessions/sid_20240105_1/players/{}/strikes/increment", bob),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let bob_entry = entries
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["player_id"] == bob.as_str())
        .unwrap();
    assert_eq!(bob_entry["session_strikes"], 1);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/sessions/sid_20240105_1/players/{}/strikes/sideways", bob),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, details) = send(&app, "GET", "/api/sessions/sid_20240105_1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["session_info"]["status"], "ACTIVE");
    assert_eq!(details["entries"].as_array().unwrap().len(), 2);

    // Active sessions cannot be deleted
    let (status, body) = send(&app, "DELETE", "/api/sessions/sid_20240105_1", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_STATE");

    let (status, ended) = send(&app, "PUT", "/api/sessions/sid_20240105_1/end", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ended["status"], "ENDED");

    let (status, body) = send(
        &app,
        "POST",
        "/api/sessions/sid_20240105_1/entries",
        Some(json!({ "player_id": bob })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_STATE");

    let (status, summaries) = send(&app, "GET", "/api/players", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summaries[0]["name"], "Alice");
    assert_eq!(summaries[0]["net_profit_cents"], 2000);

    let (status, dashboard) = send(&app, "GET", "/api/dashboard", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["total_players"], 2);
    assert_eq!(dashboard["total_buy_ins_cents"], 6000);

    let (status, _) = send(&app, "DELETE", "/api/sessions/sid_20240105_1", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", "/api/sessions/sid_20240105_1", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_event_to_session() {
    let app = create_test_app(false).await;
    let alice = add_player(&app, "Alice").await;
    let bob = add_player(&app, "Bob").await;

    let (status, event) = send(
        &app,
        "POST",
        "/api/events",
        Some(json!({ "date": "2099-06-01", "time": "19:30", "location": "Bob's" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(event["id"], "evt_20990601_1");
    assert_eq!(event["title"], "Poker Night");

    for (player, answer) in [(&alice, "yes"), (&bob, "MAYBE")] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/events/evt_20990601_1/rsvp",
            Some(json!({ "player_id": player, "status": answer })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, upcoming) = send(&app, "GET", "/api/events?upcoming=true", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upcoming.as_array().unwrap().len(), 1);
    assert_eq!(upcoming[0]["rsvps"].as_array().unwrap().len(), 2);

    let (status, started) =
        send(&app, "POST", "/api/events/evt_20990601_1/start-session", None, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(started["session"]["id"], "sid_20990601_1");
    assert_eq!(started["event"]["session_id"], "sid_20990601_1");
    assert_eq!(started["added_players"], json!([alice]));

    let (status, body) =
        send(&app, "POST", "/api/events/evt_20990601_1/start-session", None, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_event_partial_update_and_cancel() {
    let app = create_test_app(false).await;

    send(
        &app,
        "POST",
        "/api/events",
        Some(json!({ "date": "2099-06-01", "location": "Garage", "max_players": 8 })),
        None,
    )
    .await;

    let (status, event) = send(
        &app,
        "PUT",
        "/api/events/evt_20990601_1",
        Some(json!({ "title": "High Stakes", "location": null })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["title"], "High Stakes");
    assert_eq!(event["location"], Value::Null);
    assert_eq!(event["max_players"], 8);

    let (status, body) = send(
        &app,
        "PUT",
        "/api/events/evt_20990601_1",
        Some(json!({ "max_players": 1 })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, event) =
        send(&app, "PUT", "/api/events/evt_20990601_1/cancel", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["is_cancelled"], true);

    let (_, upcoming) = send(&app, "GET", "/api/events?upcoming=true", None, None).await;
    assert!(upcoming.as_array().unwrap().is_empty());

    let (status, body) =
        send(&app, "POST", "/api/events/evt_20990601_1/start-session", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_STATE");
}

#[tokio::test]
async fn test_notification_subscriptions() {
    let app = create_test_app(false).await;
    let alice = add_player(&app, "Alice").await;
    send(&app, "POST", "/api/sessions", Some(json!({ "date": "2024-01-05" })), None).await;

    let subscription = json!({
        "player_id": alice,
        "session_id": "sid_20240105_1",
        "subscription": {
            "endpoint": "https://push.example/abc",
            "keys": { "auth": "auth-secret", "p256dh": "public-key" }
        }
    });

    let (status, body) =
        send(&app, "POST", "/api/notifications/subscribe", Some(subscription), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_active"], true);

    let (status, list) = send(
        &app,
        "GET",
        &format!("/api/notifications/subscriptions/{}", alice),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let unsubscribe = json!({ "player_id": alice, "session_id": "sid_20240105_1" });
    let (status, _) = send(
        &app,
        "POST",
        "/api/notifications/unsubscribe",
        Some(unsubscribe.clone()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) =
        send(&app, "POST", "/api/notifications/unsubscribe", Some(unsubscribe), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let bad = json!({
        "player_id": alice,
        "session_id": "sid_20240105_1",
        "subscription": { "endpoint": "ftp://nope", "keys": { "auth": "a", "p256dh": "b" } }
    });
    let (status, _) = send(&app, "POST", "/api/notifications/subscribe", Some(bad), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_login_disabled_without_hash() {
    let app = create_test_app(false).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/admin/login",
        Some(json!({ "password": ADMIN_PASSWORD })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "ADMIN_DISABLED");
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = create_test_app(true).await;
    add_player(&app, "Alice").await;

    let (status, body) = send(&app, "GET", "/api/admin/status", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = send(
        &app,
        "POST",
        "/api/admin/login",
        Some(json!({ "password": "wrong" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login) = send(
        &app,
        "POST",
        "/api/admin/login",
        Some(json!({ "password": ADMIN_PASSWORD })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["token_type"], "Bearer");
    let token = login["token"].as_str().unwrap().to_string();

    let (status, status_body) = send(&app, "GET", "/api/admin/status", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(status_body["database_stats"]["players"], 1);
    assert_eq!(status_body["database_stats"]["migrations"]["applied"], 3);

    let (status, player) = send(
        &app,
        "PUT",
        "/api/admin/players/pid_001",
        Some(json!({ "name": "Alicia", "seven_two_wins": 3 })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(player["name"], "Alicia");
    assert_eq!(player["seven_two_wins"], 3);

    let (status, _) = send(&app, "GET", "/api/admin/players", None, Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_backup() {
    let app = create_test_app(true).await;
    let (_, login) = send(
        &app,
        "POST",
        "/api/admin/login",
        Some(json!({ "password": ADMIN_PASSWORD })),
        None,
    )
    .await;
    let token = login["token"].as_str().unwrap().to_string();

    let (status, backups) = send(&app, "GET", "/api/admin/backups", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(backups.as_array().unwrap().is_empty());

    let (status, backup) = send(&app, "POST", "/api/admin/backup", None, Some(&token)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(backup["file_name"].as_str().unwrap().starts_with("pokernight_"));

    let (_, backups) = send(&app, "GET", "/api/admin/backups", None, Some(&token)).await;
    assert_eq!(backups.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_event_buy_in_must_be_payable_in_chips() {
    let app = create_test_app(false).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/events",
        Some(json!({ "date": "2099-06-01", "buy_in_cents": 2001 })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        "POST",
        "/api/events",
        Some(json!({ "date": "2099-06-01", "buy_in_cents": 2500 })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "PUT",
        "/api/events/evt_20990601_1",
        Some(json!({ "buy_in_cents": 2503 })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, event) = send(&app, "GET", "/api/events/evt_20990601_1", None, None).await;
    assert_eq!(event["buy_in_cents"], 2500);

    let (status, started) =
        send(&app, "POST", "/api/events/evt_20990601_1/start-session", None, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(started["session"]["buy_in_cents"], 2500);
}
