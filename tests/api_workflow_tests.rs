//! End-to-end workflow tests exercising the full route table:
//! registration, login, score recording, leaderboards and offers.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use playzo::auth::repository::InMemoryTokenBlacklist;
use playzo::auth::token::TokenConfig;
use playzo::clock::SystemClock;
use playzo::offers::repository::InMemoryOfferRepository;
use playzo::player::repository::InMemoryPlayerRepository;
use playzo::shared::AppState;
use playzo::user::{InMemoryUserRepository, UserModel, UserRepository};
use playzo::{api_router, AppError};

fn test_state() -> AppState {
    AppState::new(
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(InMemoryPlayerRepository::new()),
        Arc::new(InMemoryOfferRepository::new()),
        Arc::new(InMemoryTokenBlacklist::new()),
        TokenConfig::new(),
        Arc::new(SystemClock),
    )
}

/// Creates a staff account directly in the repository; staff accounts have
/// no self-registration endpoint
async fn seed_staff(state: &AppState, username: &str, password: &str) -> Result<(), AppError> {
    let mut user = UserModel::new(
        username.to_string(),
        username.to_string(),
        password,
        Utc::now(),
    )?;
    user.is_staff = true;
    state.user_repository.create_user(&user).await
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
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
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn register_body(username: &str) -> Value {
    json!({
        "username": username,
        "password": "s3cret",
        "display_name": username,
        "email": format!("{}@example.com", username),
        "phone": format!("+20100-{}", username),
        "gender": "M"
    })
}

/// Registers a player and logs in, returning (player_id, access_token)
async fn register_and_login(app: &Router, username: &str) -> (String, String) {
    let (status, player) = send(
        app,
        "POST",
        "/api/players",
        None,
        Some(register_body(username)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let player_id = player["id"].as_str().unwrap().to_string();

    let (status, login) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": "s3cret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["player_id"], player["id"]);
    let access = login["access"].as_str().unwrap().to_string();

    (player_id, access)
}

#[tokio::test]
async fn player_lifecycle_from_registration_to_stats() {
    let app = api_router(test_state());
    let (player_id, access) = register_and_login(&app, "alice").await;

    // First game sets every counter
    let (status, view) = send(
        &app,
        "POST",
        &format!("/api/players/{}/games", player_id),
        Some(&access),
        Some(json!({ "score": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["total_score"], 50);
    assert_eq!(view["games_played"], 1);
    assert_eq!(view["high_score"], 50);
    assert_eq!(view["average_score"], 50.0);
    assert_eq!(view["last_game_score"], 50);

    // A negative score is rejected and changes nothing
    let (status, error) = send(
        &app,
        "POST",
        &format!("/api/players/{}/games", player_id),
        Some(&access),
        Some(json!({ "score": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"].as_str().unwrap().contains("non-negative"));

    // More games plus a win
    for score in [150, 100, 100] {
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/players/{}/games", player_id),
            Some(&access),
            Some(json!({ "score": score })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, view) = send(
        &app,
        "POST",
        &format!("/api/players/{}/wins", player_id),
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["games_won"], 1);

    // Own stats reflect everything recorded so far
    let (status, stats) = send(&app, "GET", "/api/players/me/stats", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["games_played"], 4);
    assert_eq!(stats["total_score"], 400);
    assert_eq!(stats["high_score"], 150);
    assert_eq!(stats["average_score"], 100.0);
    assert_eq!(stats["win_rate"], 25.0);
    assert_eq!(stats["games_lost"], 3);
    assert_eq!(stats["rank"], "INTERMEDIATE");

    // Profile endpoint agrees
    let (status, me) = send(&app, "GET", "/api/players/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"].as_str().unwrap(), player_id);
    assert_eq!(me["total_score"], 400);
}

#[tokio::test]
async fn recording_for_another_player_is_forbidden() {
    let app = api_router(test_state());
    let (alice_id, _) = register_and_login(&app, "alice").await;
    let (_, bob_access) = register_and_login(&app, "bob").await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/players/{}/games", alice_id),
        Some(&bob_access),
        Some(json!({ "score": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // And entirely without a token the middleware rejects the request
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/players/{}/games", alice_id),
        None,
        Some(json!({ "score": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn win_without_game_is_rejected() {
    let app = api_router(test_state());
    let (player_id, access) = register_and_login(&app, "alice").await;

    let (status, error) = send(
        &app,
        "POST",
        &format!("/api/players/{}/wins", player_id),
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"].as_str().unwrap().contains("win"));
}

#[tokio::test]
async fn leaderboard_and_rankings_order_players() {
    let app = api_router(test_state());

    // zoe and adam tie on total score, mallory trails
    for (name, scores) in [
        ("zoe", vec![700, 500]),
        ("adam", vec![1200]),
        ("mallory", vec![300]),
    ] {
        let (player_id, access) = register_and_login(&app, name).await;
        for score in scores {
            let (status, _) = send(
                &app,
                "POST",
                &format!("/api/players/{}/games", player_id),
                Some(&access),
                Some(json!({ "score": score })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    // Leaderboard is public and ordered descending
    let (status, board) = send(
        &app,
        "GET",
        "/api/players/leaderboard?criterion=total_score&limit=2",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let board = board.as_array().unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0]["total_score"], 1200);
    assert_eq!(board[1]["total_score"], 1200);

    // An unknown criterion silently falls back to total_score
    let (status, fallback) = send(
        &app,
        "GET",
        "/api/players/leaderboard?criterion=bogus&limit=2",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let fallback = fallback.as_array().unwrap();
    let names = |rows: &[Value]| {
        rows.iter()
            .map(|r| r["display_name"].as_str().unwrap().to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(names(board), names(fallback));

    // Rankings break the tie by display name and number rows from 1
    let (status, rankings) = send(
        &app,
        "GET",
        "/api/players/rankings?criterion=total_score",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rankings = rankings.as_array().unwrap();
    assert_eq!(rankings.len(), 3);
    assert_eq!(rankings[0]["position"], 1);
    assert_eq!(rankings[0]["player"]["display_name"], "adam");
    assert_eq!(rankings[1]["position"], 2);
    assert_eq!(rankings[1]["player"]["display_name"], "zoe");
    assert_eq!(rankings[2]["position"], 3);
    assert_eq!(rankings[2]["player"]["display_name"], "mallory");

    // High-score criterion produces a different leader
    let (status, by_high) = send(
        &app,
        "GET",
        "/api/players/leaderboard?criterion=high_score&limit=1",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_high.as_array().unwrap()[0]["display_name"], "adam");
}

#[tokio::test]
async fn refresh_rotation_and_logout() {
    let app = api_router(test_state());
    register_and_login(&app, "alice").await;

    let (_, login) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "s3cret" })),
    )
    .await;
    let refresh = login["refresh"].as_str().unwrap().to_string();

    // Rotation hands out a new pair and kills the old refresh token
    let (status, rotated) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(rotated["access"].as_str().is_some());

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Logout blacklists the rotated refresh token as well
    let new_refresh = rotated["refresh"].as_str().unwrap().to_string();
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/logout",
        None,
        Some(json!({ "refresh": new_refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh": new_refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Verify endpoint accepts a fresh access token
    let (_, login) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "s3cret" })),
    )
    .await;
    let (status, detail) = send(
        &app,
        "POST",
        "/api/auth/verify",
        None,
        Some(json!({ "token": login["access"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["detail"], "Token is valid");
}

#[tokio::test]
async fn offer_lifecycle_and_visibility() {
    let state = test_state();
    seed_staff(&state, "admin", "admin-pass").await.unwrap();
    let app = api_router(state);

    let (status, login) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "admin-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let admin = login["access"].as_str().unwrap().to_string();

    let now = Utc::now();
    let offer_body = json!({
        "title": "Summer tournament",
        "description": "Weekend event",
        "offer_type": "EVENT",
        "start_date": (now - Duration::days(1)).to_rfc3339(),
        "end_date": (now + Duration::days(7)).to_rfc3339(),
        "is_featured": true
    });

    // Only staff can create offers
    let (_, player_access) = register_and_login(&app, "alice").await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/offers",
        Some(&player_access),
        Some(offer_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, offer) = send(&app, "POST", "/api/offers", Some(&admin), Some(offer_body)).await;
    assert_eq!(status, StatusCode::OK);
    let offer_id = offer["id"].as_str().unwrap().to_string();
    assert_eq!(offer["status"], "DRAFT");
    assert_eq!(offer["is_active"], false);

    // Drafts are invisible to anonymous callers
    let (status, listing) = send(&app, "GET", "/api/offers", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listing.as_array().unwrap().is_empty());

    // Staff see drafts in the same listing
    let (status, listing) = send(&app, "GET", "/api/offers", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing.as_array().unwrap().len(), 1);

    // Activation makes it publicly visible and active
    let (status, activated) = send(
        &app,
        "POST",
        &format!("/api/offers/{}/activate", offer_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activated["status"], "ACTIVE");
    assert_eq!(activated["is_active"], true);

    let (status, active) = send(&app, "GET", "/api/offers/active", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active.as_array().unwrap().len(), 1);

    // Home groups put the featured offer in the featured bucket
    let (status, home) = send(&app, "GET", "/api/offers/for_home", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(home["count"]["featured"], 1);
    assert_eq!(home["count"]["active"], 0);
    assert_eq!(home["featured"][0]["id"].as_str().unwrap(), offer_id);

    // Double activation is a validation error
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/offers/{}/activate", offer_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Deactivation expires the offer and hides it from public reads
    let (status, deactivated) = send(
        &app,
        "POST",
        &format!("/api/offers/{}/deactivate", offer_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deactivated["status"], "EXPIRED");

    let (status, active) = send(&app, "GET", "/api/offers/active", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(active.as_array().unwrap().is_empty());

    // Expired listing is staff only
    let (status, _) = send(&app, "GET", "/api/offers/expired", Some(&player_access), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, expired) = send(&app, "GET", "/api/offers/expired", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(expired.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn profile_update_and_me_endpoints() {
    let app = api_router(test_state());
    let (player_id, access) = register_and_login(&app, "alice").await;

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/players/{}", player_id),
        Some(&access),
        Some(json!({ "phone": "+20123456789", "gender": "F" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phone"], "+20123456789");
    assert_eq!(updated["gender"], "F");

    // The account endpoint knows the player link
    let (status, account) = send(&app, "GET", "/api/auth/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["username"], "alice");
    assert_eq!(account["player_id"].as_str().unwrap(), player_id);
    assert_eq!(account["is_staff"], false);

    // Another player cannot edit alice's profile
    let (_, bob_access) = register_and_login(&app, "bob").await;
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/players/{}", player_id),
        Some(&bob_access),
        Some(json!({ "phone": "+20999" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
