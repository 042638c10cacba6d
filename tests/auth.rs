mod common;

use actix_web::middleware::Logger;
use actix_web::{http::StatusCode, test, web, App};
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use taskboard::auth::TokenService;
use taskboard::routes;
use uuid::Uuid;

use common::{bearer, call, get, memory_state, signup};

#[actix_rt::test]
async fn test_signup_and_login_flow() {
    let (state, _) = memory_state();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .configure(routes::config),
    )
    .await;

    // Signup
    let auth = signup(&app, "a@x.com", "secret1").await;
    assert!(!auth.token.is_empty(), "Token should be a non-empty string");
    assert_eq!(auth.user.email, "a@x.com");
    assert!(auth.user.projects.is_empty());
    assert_eq!(state.tokens.verify(&auth.token).unwrap().sub, auth.user.id);

    // The same email again fails
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({ "email": "A@x.com", "password": "secret1" }))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");

    // Wrong password
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "a@x.com", "password": "wrong-password" }))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid credentials");

    // Correct password
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "a@x.com", "password": "secret1" }))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK, "Login failed. Body: {}", body);
    assert!(body["user"].get("passwordHash").is_none());
    let token = body["token"].as_str().unwrap();
    assert_eq!(state.tokens.verify(token).unwrap().sub, auth.user.id);

    // The token identifies the caller
    let (status, body) = get(&app, token, "/api/auth/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], auth.user.id.to_string());
    assert_eq!(body["email"], "a@x.com");
}

#[actix_rt::test]
async fn test_protected_routes_reject_missing_and_bad_tokens() {
    let (state, _) = memory_state();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::config),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/projects").to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized");

    let req = test::TestRequest::get().uri("/api/auth/me").to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(&app, "garbage", "/api/projects").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = TokenService::new("someone-elses-secret", 3600)
        .issue(Uuid::new_v4())
        .unwrap();
    let (status, body) = get(&app, &forged, "/api/tasks/project/00000000-0000-0000-0000-000000000000").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized");

    let req = test::TestRequest::get()
        .uri("/api/projects")
        .append_header(("Authorization", "Token abc"))
        .to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_token_expires_after_one_hour() {
    let (state, _) = memory_state();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::config),
    )
    .await;

    let auth = signup(&app, "late@x.com", "secret1").await;
    let later = Utc::now() + Duration::hours(1) + Duration::seconds(1);
    assert!(state.tokens.verify_at(&auth.token, later).is_err());

    let stale = state
        .tokens
        .issue_at(auth.user.id, Utc::now() - Duration::minutes(61))
        .unwrap();
    let (status, _) = get(&app, &stale, "/api/projects").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(&app, &auth.token, "/api/projects").await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_rt::test]
async fn test_token_for_unknown_user_is_rejected() {
    let (state, _) = memory_state();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::config),
    )
    .await;

    let orphan = state.tokens.issue(Uuid::new_v4()).unwrap();
    let (status, _) = get(&app, &orphan, "/api/projects").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_invalid_signup_and_login_inputs() {
    let (state, _) = memory_state();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::config),
    )
    .await;

    let test_cases = vec![
        ("/api/auth/signup", json!({ "password": "secret1" }), "missing email"),
        ("/api/auth/signup", json!({ "email": "a@x.com" }), "missing password"),
        (
            "/api/auth/signup",
            json!({ "email": "invalid-email", "password": "secret1" }),
            "invalid email format",
        ),
        (
            "/api/auth/signup",
            json!({ "email": "a@x.com", "password": "12345" }),
            "password too short",
        ),
        ("/api/auth/login", json!({ "email": "a@x.com" }), "login missing password"),
        (
            "/api/auth/login",
            json!({ "email": "", "password": "" }),
            "login empty fields",
        ),
    ];

    for (uri, payload, description) in test_cases {
        let req = test::TestRequest::post()
            .uri(uri)
            .set_json(&payload)
            .to_request();
        let (status, body) = call(&app, req).await;
        assert_eq!(
            status,
            StatusCode::BAD_REQUEST,
            "Test case failed: {}. Body: {}",
            description,
            body
        );
    }

    // A missing field is reported like an invalid one
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({ "password": "secret1" }))
        .to_request();
    let (_, body) = call(&app, req).await;
    assert_eq!(body["errors"][0]["field"], "email", "Body: {}", body);

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/projects")
        .append_header(bearer("x"))
        .to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
