//! Integration tests for vvv-bot API endpoints
//!
//! Tests cover:
//! - Health and keep-alive endpoints
//! - Quiz detection, confirmation and moderator bonus over the message endpoint
//! - Command replies and admin gating
//! - Standings bootstrap and on-disk persistence

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method
use vvv_bot::{build_router, AppState};
use vvv_core::config::{AdminRegistry, BotConfig, DataDir};
use vvv_core::storage::MemoryStore;
use vvv_core::LeaderboardStore;

const ROOT: &str = "100069577772026";
const THREAD: &str = "group-1";

/// Test helper: in-memory state with `root` as super admin
fn setup_state() -> AppState {
    let admins = AdminRegistry::load(ROOT, Box::new(MemoryStore::<BotConfig>::default()));
    AppState::new(LeaderboardStore::in_memory(), admins)
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Test helper: post one chat message and return the replies
async fn send(state: &AppState, sender: &str, text: &str) -> Vec<String> {
    let request = Request::builder()
        .method("POST")
        .uri("/api/message")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "sender_id": sender, "thread_id": THREAD, "text": text }).to_string(),
        ))
        .unwrap();
    let response = build_router(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    body["replies"]
        .as_array()
        .expect("replies array")
        .iter()
        .map(|r| r.as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Health Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_router(setup_state());

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "vvv-bot");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_keep_alive_root() {
    let app = build_router(setup_state());

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8(bytes.to_vec()).unwrap().contains("En ligne"));
}

#[tokio::test]
async fn test_buildinfo_endpoint() {
    let app = build_router(setup_state());

    let request = Request::builder().uri("/api/buildinfo").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert!(body["git_hash"].is_string());
    assert!(body["build_profile"].is_string());
}

#[tokio::test]
async fn test_malformed_message_rejected() {
    let app = build_router(setup_state());

    let request = Request::builder()
        .method("POST")
        .uri("/api/message")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"text": "hello"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

// =============================================================================
// Quiz Flow Tests
// =============================================================================

#[tokio::test]
async fn test_quiz_confirmation_flow() {
    let state = setup_state();

    let replies = send(&state, ROOT, "MODO : ZED\nHISTOIRE 5Q\nDAVE 20\nERIN -5").await;
    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("📊 PRÉVISUALISATION DE LA MISE À JOUR"));
    assert!(replies[0].contains("• ERIN: -5 points"));

    let replies = send(&state, ROOT, "OUI").await;
    assert!(replies[0].contains("modérateur ZED"));

    let replies = send(&state, ROOT, "75").await;
    assert!(replies[0].starts_with("✅ MISE À JOUR DU CLASSEMENT TERMINÉE !"));
    assert!(replies[0].contains("👑 BONUS MODÉRATEUR: ZED +75 points"));
    assert!(replies[1].starts_with("🏆 TOP 10 🏆"));

    let store = state.store.lock().await;
    assert_eq!(store.find_player("ZED").unwrap().points, 75);
    assert_eq!(store.find_player("DAVE").unwrap().points, 20);
    assert_eq!(store.find_player("ERIN").unwrap().points, -5);
    assert_eq!(store.history().len(), 1);
}

#[tokio::test]
async fn test_quiz_from_non_admin_is_ignored() {
    let state = setup_state();

    let replies = send(&state, "random-user", "MODO : ZED\nDAVE 20").await;
    assert!(replies.is_empty());
    assert!(state.sessions.lock().await.is_empty());
}

#[tokio::test]
async fn test_refusal_cancels_quiz() {
    let state = setup_state();

    send(&state, ROOT, "MODO: ALICE 200\nBOB 50").await;
    let replies = send(&state, ROOT, "non").await;
    assert_eq!(replies, vec!["❌ Mise à jour annulée.".to_string()]);
    assert!(state.store.lock().await.players().is_empty());
}

#[tokio::test]
async fn test_other_user_cannot_confirm() {
    let state = setup_state();
    send(&state, ROOT, "!ajouteradmin 42").await;

    send(&state, ROOT, "MODO: ALICE 200\nBOB 50").await;
    assert!(send(&state, "42", "oui").await.is_empty());
    assert!(state.store.lock().await.players().is_empty());
    assert_eq!(state.sessions.lock().await.len(), 1);
}

// =============================================================================
// Command Tests
// =============================================================================

#[tokio::test]
async fn test_public_commands() {
    let state = setup_state();

    assert_eq!(send(&state, "anyone", "!classement").await, vec!["📊 Le classement est vide.".to_string()]);
    assert!(send(&state, "anyone", "!ping").await[0].starts_with("🏓 Pong!"));
    assert!(send(&state, "anyone", "!menu").await[0].contains("!classement"));
    assert!(send(&state, "anyone", "!nope").await[0].starts_with("❓ Commande inconnue: nope"));
}

#[tokio::test]
async fn test_plain_chatter_gets_no_reply() {
    let state = setup_state();
    assert!(send(&state, ROOT, "salut tout le monde").await.is_empty());
    assert!(send(&state, "anyone", "   ").await.is_empty());
}

#[tokio::test]
async fn test_admin_commands_are_gated() {
    let state = setup_state();

    let replies = send(&state, "anyone", "!doublons").await;
    assert_eq!(replies, vec!["❌ Seuls les administrateurs peuvent détecter les doublons.".to_string()]);

    let replies = send(&state, ROOT, "!doublons").await;
    assert_eq!(replies[0], "🔍 Analyse en cours des doublons...");
    assert!(replies[1].starts_with("✅ AUCUN DOUBLON DÉTECTÉ"));
}

#[tokio::test]
async fn test_standings_bootstrap_then_merge() {
    let state = setup_state();

    let replies = send(&state, ROOT, "!setclassement").await;
    assert!(replies[0].starts_with("📋 Veuillez envoyer le classement"));

    let replies = send(&state, ROOT, "1- 57,781 SYD\n2- 1,200 RYOMEN\n3- 300 RYOMEN SK").await;
    assert_eq!(replies[0], "✅ Classement initial défini avec succès!");
    assert!(replies.iter().skip(1).any(|r| r.contains("SYD")));

    let replies = send(&state, ROOT, "!merge RYOMEN, RYOMEN SK").await;
    assert!(replies[0].starts_with("🔄 FUSION DE COMPTES RÉUSSIE!"));

    let replies = send(&state, "anyone", "!position ryomen").await;
    assert!(replies[0].contains("⭐ Points: 1,500"));
    assert!(replies[0].contains("🏆 Rang: 2"));
}

#[tokio::test]
async fn test_command_does_not_consume_standings_request() {
    let state = setup_state();

    send(&state, ROOT, "!setclassement").await;
    assert!(send(&state, ROOT, "!ping").await[0].starts_with("🏓 Pong!"));

    let replies = send(&state, ROOT, "1- 10 SOLO").await;
    assert_eq!(replies[0], "✅ Classement initial défini avec succès!");
}

#[tokio::test]
async fn test_long_leaderboard_is_split() {
    let state = setup_state();
    {
        let mut store = state.store.lock().await;
        for i in 0..150 {
            store.apply_delta(&format!("PLAYER NUMBER {}", i), 100 + i);
        }
    }

    let replies = send(&state, "anyone", "!classement").await;
    assert!(replies.len() > 1);
    assert!(replies.iter().all(|r| r.chars().count() <= 2000));
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[tokio::test]
async fn test_commit_writes_data_folder() {
    let temp = TempDir::new().unwrap();
    let data_dir = DataDir::new(temp.path().to_path_buf());
    data_dir.ensure_exists().unwrap();

    let store = LeaderboardStore::open(&data_dir, chrono::Duration::hours(24));
    let admins = AdminRegistry::open(ROOT, &data_dir);
    let state = AppState::new(store, admins);

    send(&state, ROOT, "MODO: ALICE 200\nBOB 50").await;
    send(&state, ROOT, "oui").await;
    send(&state, ROOT, "abc").await;
    send(&state, ROOT, "!setprefix ?").await;

    let leaderboard: Value =
        serde_json::from_str(&std::fs::read_to_string(data_dir.leaderboard_path()).unwrap()).unwrap();
    let names: Vec<&str> = leaderboard["players"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["BOB", "ALICE"]);
    assert_eq!(std::fs::read_dir(data_dir.backup_dir()).unwrap().count(), 1);

    let reopened = AdminRegistry::open(ROOT, &data_dir);
    assert_eq!(reopened.prefix(), "?");
}
