//! Shared fixtures for the HTTP tests: an in-memory application with a
//! frozen clock, seeded users and bearer tokens.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tower::util::ServiceExt; // for oneshot
use uuid::Uuid;

use sgirp_api::api::build_router;
use sgirp_api::auth::create_token;
use sgirp_api::clock::FixedClock;
use sgirp_api::config::AuthSettings;
use sgirp_api::domain::repositories::{TeamRepository, UserRepository};
use sgirp_api::domain::team::Team;
use sgirp_api::domain::user::{Email, Role, User};
use sgirp_api::infrastructure::repositories::InMemoryStore;
use sgirp_api::state::AppState;

pub const SECRET: &str = "test-secret";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    /// Application whose clock is frozen at noon on `today`
    pub fn on(today: NaiveDate) -> Self {
        let store = Arc::new(InMemoryStore::default());
        let auth = AuthSettings {
            jwt_secret: SECRET.to_string(),
            ..AuthSettings::default()
        };
        let state = AppState::in_memory(store.clone(), auth, Arc::new(FixedClock::on(today)));
        let router = build_router(state.clone());
        Self { store, state, router }
    }

    /// Stores an active user past its first login
    ///
    /// `password_hash` is not a real bcrypt hash; use [`TestApp::seed_user_with_password`]
    /// when the test logs in.
    pub async fn seed_user(&self, email: &str, role: Role) -> User {
        self.insert_user(email, role, "not-a-hash".to_string(), false).await
    }

    pub async fn seed_user_with_password(&self, email: &str, role: Role, password: &str, first_login: bool) -> User {
        let hash = bcrypt::hash(password, 4).unwrap();
        self.insert_user(email, role, hash, first_login).await
    }

    async fn insert_user(&self, email: &str, role: Role, hash: String, first_login: bool) -> User {
        let local = email.split('@').next().unwrap();
        let mut user = User::new(Email::new(email).unwrap(), local, "Test", role, hash, Utc::now()).unwrap();
        user.first_login = first_login;
        self.store.create(&user).await.unwrap();
        user
    }

    pub async fn seed_team(&self, name: &str, manager: &User, members: &[&User]) -> Team {
        let team = Team::new(
            name.to_string(),
            String::new(),
            Some(manager.id),
            members.iter().map(|u| u.id).collect(),
            date(2024, 1, 1),
        )
        .unwrap();
        self.store.save(&team).await.unwrap();
        team
    }

    /// Sends a request, returning the status and the parsed JSON body
    /// (`Value::Null` when the body is empty or not JSON)
    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.send_raw(method, uri, token, body).await;
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let response = self.dispatch(method, uri, token, body).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    /// GET returning the content type and the body as text
    pub async fn get_text(&self, uri: &str, token: &str) -> (StatusCode, String, String) {
        let response = self.dispatch(Method::GET, uri, Some(token), None).await;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn dispatch(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }
}

/// Bearer token for `user`, valid against the wall clock
pub fn token_for(user: &User) -> String {
    create_token(user.id, user.role, SECRET, chrono::Duration::hours(1), Utc::now()).unwrap()
}

pub fn id_of(value: &Value) -> Uuid {
    value["id"].as_str().unwrap().parse().unwrap()
}
