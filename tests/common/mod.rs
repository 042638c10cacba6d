#![allow(dead_code)]

use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::{header, StatusCode},
    test,
};
use serde_json::{json, Value};
use std::sync::Arc;
use taskboard::auth::{AuthResponse, TokenService};
use taskboard::store::MemoryStore;
use taskboard::AppState;

pub const SECRET: &str = "integration-test-secret";

/// Fresh in-memory state. bcrypt cost 4 keeps signups fast.
pub fn memory_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), TokenService::new(SECRET, 3600), 4);
    (state, store)
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Sends `req` and returns the status with the JSON body (`Null` when empty).
pub async fn call<S, B>(app: &S, req: actix_http::Request) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub async fn signup<S, B>(app: &S, email: &str, password: &str) -> AuthResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let (status, body) = call(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
    serde_json::from_value(body).expect("Failed to parse signup response JSON")
}

pub async fn create_project<S, B>(app: &S, token: &str, title: &str) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/projects")
        .append_header(bearer(token))
        .set_json(json!({ "title": title }))
        .to_request();
    call(app, req).await
}

pub async fn create_task<S, B>(app: &S, token: &str, body: Value) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .append_header(bearer(token))
        .set_json(body)
        .to_request();
    call(app, req).await
}

pub async fn get<S, B>(app: &S, token: &str, uri: &str) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::get()
        .uri(uri)
        .append_header(bearer(token))
        .to_request();
    call(app, req).await
}

pub async fn put<S, B>(app: &S, token: &str, uri: &str, body: Value) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::put()
        .uri(uri)
        .append_header(bearer(token))
        .set_json(body)
        .to_request();
    call(app, req).await
}

pub async fn delete<S, B>(app: &S, token: &str, uri: &str) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::delete()
        .uri(uri)
        .append_header(bearer(token))
        .to_request();
    call(app, req).await
}
