//! Typed HTTP client for the API.
//!
//! The client holds no credentials. Every authenticated call takes the bearer token as an
//! argument and attaches it to that request only, so two sessions can share one `ApiClient`.

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use uuid::Uuid;

use crate::auth::AuthResponse;
use crate::models::{
    Project, ProjectDetails, ProjectInput, ProjectUpdate, Task, TaskInput, TaskUpdate, User,
};

#[derive(Debug)]
pub enum ClientError {
    /// The request could not be sent or the body could not be decoded.
    Transport(reqwest::Error),
    /// The API answered with a non-success status.
    Api { status: u16, message: String },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClientError::Transport(e) => write!(f, "transport error: {}", e),
            ClientError::Api { status, message } => write!(f, "API error {}: {}", status, message),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        ClientError::Transport(error)
    }
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// `{"message": ...}` bodies returned by the delete endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn public(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    fn authed(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.public(method, path).bearer_auth(token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string());
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = json!({ "email": email, "password": password });
        self.send(self.public(Method::POST, "/auth/signup").json(&body))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = json!({ "email": email, "password": password });
        self.send(self.public(Method::POST, "/auth/login").json(&body))
            .await
    }

    pub async fn me(&self, token: &str) -> Result<User, ClientError> {
        self.send(self.authed(Method::GET, "/auth/me", token)).await
    }

    pub async fn list_projects(&self, token: &str) -> Result<Vec<ProjectDetails>, ClientError> {
        self.send(self.authed(Method::GET, "/projects", token)).await
    }

    pub async fn create_project(
        &self,
        token: &str,
        input: &ProjectInput,
    ) -> Result<Project, ClientError> {
        self.send(self.authed(Method::POST, "/projects", token).json(input))
            .await
    }

    pub async fn get_project(&self, token: &str, id: Uuid) -> Result<ProjectDetails, ClientError> {
        let path = format!("/projects/{}", id);
        self.send(self.authed(Method::GET, &path, token)).await
    }

    pub async fn update_project(
        &self,
        token: &str,
        id: Uuid,
        changes: &ProjectUpdate,
    ) -> Result<Project, ClientError> {
        let path = format!("/projects/{}", id);
        self.send(self.authed(Method::PUT, &path, token).json(changes))
            .await
    }

    pub async fn delete_project(&self, token: &str, id: Uuid) -> Result<Message, ClientError> {
        let path = format!("/projects/{}", id);
        self.send(self.authed(Method::DELETE, &path, token)).await
    }

    pub async fn list_tasks(&self, token: &str, project: Uuid) -> Result<Vec<Task>, ClientError> {
        let path = format!("/tasks/project/{}", project);
        self.send(self.authed(Method::GET, &path, token)).await
    }

    pub async fn create_task(&self, token: &str, input: &TaskInput) -> Result<Task, ClientError> {
        self.send(self.authed(Method::POST, "/tasks", token).json(input))
            .await
    }

    pub async fn get_task(&self, token: &str, id: Uuid) -> Result<Task, ClientError> {
        let path = format!("/tasks/{}", id);
        self.send(self.authed(Method::GET, &path, token)).await
    }

    pub async fn update_task(
        &self,
        token: &str,
        id: Uuid,
        changes: &TaskUpdate,
    ) -> Result<Task, ClientError> {
        let path = format!("/tasks/{}", id);
        self.send(self.authed(Method::PUT, &path, token).json(changes))
            .await
    }

    pub async fn delete_task(&self, token: &str, id: Uuid) -> Result<Message, ClientError> {
        let path = format!("/tasks/{}", id);
        self.send(self.authed(Method::DELETE, &path, token)).await
    }
}
