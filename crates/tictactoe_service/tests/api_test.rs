//! Tests for the HTTP API, driven through the router without a socket.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tictactoe_service::{AppState, EventPublisher, ServiceConfig, SessionRegistry, build_router};
use tower::ServiceExt;

fn app() -> Router {
    let registry = SessionRegistry::new(&ServiceConfig::default(), EventPublisher::new(64));
    build_router(AppState::new(registry))
}

/// Sends one request and returns the status with the parsed body (`Null` when empty).
async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).expect("Valid request"))
        .await
        .expect("Router is infallible");

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Body readable")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, value)
}

struct Table {
    app: Router,
    session_id: String,
    game_id: String,
    alice: String,
    bob: String,
}

async fn two_player_table() -> Table {
    let app = app();
    let (_, created) = send(
        &app,
        Method::POST,
        "/v1/gaming-sessions",
        Some(json!({"session_owner_display_name": "Alice"})),
    )
    .await;
    let session_id = created["session_id"].as_str().expect("Session id").to_string();
    let alice = created["initiating_player"]["player_id"]
        .as_str()
        .expect("Owner id")
        .to_string();

    let (_, joined) = send(
        &app,
        Method::POST,
        "/v1/gaming-sessions/players",
        Some(json!({
            "game_invitation_code": created["invitation_code"],
            "player_display_name": "Bob",
        })),
    )
    .await;
    let bob = joined["other_player"]["player_id"]
        .as_str()
        .expect("Second player id")
        .to_string();

    for player in [&alice, &bob] {
        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/v1/gaming-sessions/{session_id}/players/{player}/readiness"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, game) = send(
        &app,
        Method::POST,
        &format!("/v1/gaming-sessions/{session_id}/two-player-games"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let game_id = game["game_info"]["game_id"]
        .as_str()
        .expect("Game id")
        .to_string();

    Table {
        app,
        session_id,
        game_id,
        alice,
        bob,
    }
}

async fn turn(table: &Table, player: &str, row: usize, column: usize) -> (StatusCode, Value) {
    send(
        &table.app,
        Method::POST,
        &format!("/v1/games/{}/turns", table.game_id),
        Some(json!({
            "destination": {"row": row, "column": column},
            "player_id": player,
        })),
    )
    .await
}

#[tokio::test]
async fn test_health_reports_up() {
    let (status, body) = send(&app(), Method::GET, "/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Up"));
}

#[tokio::test]
async fn test_create_and_join_session() {
    let app = app();
    let (status, created) = send(
        &app,
        Method::POST,
        "/v1/gaming-sessions",
        Some(json!({"session_owner_display_name": "  Alice  "})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["initiating_player"]["display_name"], "Alice");
    assert_eq!(created["initiating_player"]["is_automated"], false);
    assert!(created["other_player"].is_null());
    let code = created["invitation_code"].as_str().expect("Code");
    assert_eq!(code.len(), 6);
    let session_id = created["session_id"].as_str().expect("Session id");
    assert_eq!(
        created["event_plane_config"]["topic_prefix"],
        format!("RustMadeEasy.com/Channels/{session_id}")
    );

    let (status, joined) = send(
        &app,
        Method::POST,
        "/v1/gaming-sessions/players",
        Some(json!({"game_invitation_code": code, "player_display_name": "Bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["session_id"], session_id);
    assert_eq!(joined["other_player"]["display_name"], "Bob");
}

#[tokio::test]
async fn test_invalid_bodies_are_rejected_with_400() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/gaming-sessions",
        Some(json!({"session_owner_display_name": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/gaming-sessions/players",
        Some(json!({"game_invitation_code": "12", "player_display_name": "Bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_resources_return_404_with_error_body() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/gaming-sessions/players",
        Some(json!({"game_invitation_code": "000000", "player_display_name": "Bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        Method::GET,
        "/v1/gaming-sessions/missing/current-game",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/v1/games/missing/turns/latest", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_two_player_game_requires_second_player() {
    let app = app();
    let (_, created) = send(
        &app,
        Method::POST,
        "/v1/gaming-sessions",
        Some(json!({"session_owner_display_name": "Alice"})),
    )
    .await;
    let session_id = created["session_id"].as_str().expect("Session id");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/v1/gaming-sessions/{session_id}/two-player-games"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_turns_play_through_to_a_win() {
    let table = two_player_table().await;

    let (status, first) = turn(&table, &table.alice, 0, 0).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["new_game_state"]["play_status"], "InProgress");
    assert_eq!(first["current_player"]["player_id"], table.bob.as_str());

    turn(&table, &table.bob, 1, 0).await;
    turn(&table, &table.alice, 0, 1).await;
    turn(&table, &table.bob, 1, 1).await;
    let (status, last) = turn(&table, &table.alice, 0, 2).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(last["new_game_state"]["play_status"], "EndedInWin");
    assert_eq!(last["winning_player"]["player_id"], table.alice.as_str());
    assert_eq!(
        last["winning_locations"],
        json!([
            {"row": 0, "column": 0},
            {"row": 0, "column": 1},
            {"row": 0, "column": 2},
        ])
    );

    let (status, latest) = send(
        &table.app,
        Method::GET,
        &format!("/v1/games/{}/turns/latest", table.game_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest, last);

    let (status, history) = send(
        &table.app,
        Method::GET,
        &format!("/v1/games/{}/turns", table.game_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().map(Vec::len), Some(5));

    let (status, _) = turn(&table, &table.bob, 2, 2).await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
}

#[tokio::test]
async fn test_rejected_turns_map_to_status_codes() {
    let table = two_player_table().await;

    let (status, _) = turn(&table, &table.bob, 0, 0).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = turn(&table, &table.alice, 5, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    turn(&table, &table.alice, 0, 0).await;
    let (status, _) = turn(&table, &table.bob, 0, 0).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = turn(&table, "stranger", 1, 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_turn_accepts_position_alias_and_checks_session() {
    let table = two_player_table().await;
    let uri = format!("/v1/games/{}/turns", table.game_id);

    let (status, _) = send(
        &table.app,
        Method::POST,
        &uri,
        Some(json!({
            "position": {"row": 1, "column": 1},
            "player_id": table.alice,
            "session_id": "another-session",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &table.app,
        Method::POST,
        &uri,
        Some(json!({
            "position": {"row": 1, "column": 1},
            "player_id": table.alice,
            "session_id": table.session_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_game_state"]["game_board"][1][1], "X");
}

#[tokio::test]
async fn test_single_player_game_replies_in_the_same_request() {
    let app = app();
    let (_, created) = send(
        &app,
        Method::POST,
        "/v1/gaming-sessions",
        Some(json!({"session_owner_display_name": "Alice"})),
    )
    .await;
    let session_id = created["session_id"].as_str().expect("Session id");
    let alice = created["initiating_player"]["player_id"]
        .as_str()
        .expect("Owner id");
    send(
        &app,
        Method::PUT,
        &format!("/v1/gaming-sessions/{session_id}/players/{alice}/readiness"),
        None,
    )
    .await;

    let (status, game) = send(
        &app,
        Method::POST,
        &format!("/v1/gaming-sessions/{session_id}/games"),
        Some(json!({"computer_skill_level": "Expert"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["other_player"]["is_automated"], true);
    let game_id = game["game_info"]["game_id"].as_str().expect("Game id");

    let (status, turn) = send(
        &app,
        Method::POST,
        &format!("/v1/games/{game_id}/turns"),
        Some(json!({"destination": {"row": 1, "column": 1}, "player_id": alice})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(turn["current_player"]["player_id"], alice);
    let pieces = turn["new_game_state"]["game_board"]
        .as_array()
        .expect("Rows")
        .iter()
        .flat_map(|row| row.as_array().cloned().unwrap_or_default())
        .filter(|square| !square.is_null())
        .count();
    assert_eq!(pieces, 2);

    let (status, current) = send(
        &app,
        Method::GET,
        &format!("/v1/gaming-sessions/{session_id}/current-game"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["game_info"]["game_id"], game_id);
}

#[tokio::test]
async fn test_deletes_are_idempotent() {
    let table = two_player_table().await;
    let game_uri = format!("/v1/games/{}", table.game_id);
    let session_uri = format!("/v1/gaming-sessions/{}", table.session_id);
    let end_game = json!({"player_id": table.bob, "session_id": table.session_id});

    for _ in 0..2 {
        let (status, _) = send(&table.app, Method::DELETE, &game_uri, Some(end_game.clone())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = send(
        &table.app,
        Method::DELETE,
        &session_uri,
        Some(json!({"player_id": table.bob})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for _ in 0..2 {
        let (status, _) = send(
            &table.app,
            Method::DELETE,
            &session_uri,
            Some(json!({"player_id": table.alice})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = send(&table.app, Method::DELETE, &game_uri, Some(end_game)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &table.app,
        Method::GET,
        &format!("{session_uri}/current-game"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_join_current_game_returns_game() {
    let table = two_player_table().await;
    let (status, body) = send(
        &table.app,
        Method::PUT,
        &format!(
            "/v1/gaming-sessions/{}/current_game/players/{}",
            table.session_id, table.bob
        ),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["game_info"]["game_id"], table.game_id.as_str());
    assert_eq!(body["game_info"]["players"][1]["player_id"], table.bob.as_str());
}

async fn send_raw(app: &Router, method: Method, uri: &str, body: &'static str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("Valid request");
    let response = app.clone().oneshot(request).await.expect("Router is infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Body readable")
        .to_bytes();
    (status, serde_json::from_slice(&bytes).expect("JSON error body"))
}

fn error_text(body: &Value) -> &str {
    body["error"].as_str().expect("Error message")
}

#[tokio::test]
async fn test_unknown_skill_level_is_a_json_400() {
    let app = app();
    let (_, created) = send(
        &app,
        Method::POST,
        "/v1/gaming-sessions",
        Some(json!({"session_owner_display_name": "Alice"})),
    )
    .await;
    let session_id = created["session_id"].as_str().expect("Session id");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/gaming-sessions/{session_id}/games"),
        Some(json!({"computer_skill_level": "Grandmaster"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = error_text(&body);
    assert!(!message.contains("Grandmaster"));
    assert!(!message.contains("Beginner"));
    assert!(!message.contains("line 1"));
}

#[tokio::test]
async fn test_turn_without_destination_is_a_json_400() {
    let table = two_player_table().await;
    let (status, body) = send(
        &table.app,
        Method::POST,
        &format!("/v1/games/{}/turns", table.game_id),
        Some(json!({"player_id": table.alice})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!error_text(&body).contains("destination"));
}

#[tokio::test]
async fn test_delete_without_body_is_a_json_400() {
    let table = two_player_table().await;
    let (status, body) = send(
        &table.app,
        Method::DELETE,
        &format!("/v1/gaming-sessions/{}", table.session_id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &table.app,
        Method::GET,
        &format!("/v1/gaming-sessions/{}/current-game", table.session_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_is_a_json_400() {
    let (status, body) = send_raw(&app(), Method::POST, "/v1/gaming-sessions", "{\"session_owner").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_text(&body), "Invalid request: request body is not valid JSON");
}
