#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use atlsfw::config::{AdminSeed, Config};
use atlsfw::{get_random_free_port, make_router, run_app, AppState};
use serde_json::{json, Value};

pub const ADMIN_EMAIL: &str = "admin@atlsfw.test";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub struct TestApp {
    pub base_url: String,
    pub http: reqwest::Client,
    pub state: Arc<AppState>,
}

pub async fn spawn_app() -> TestApp {
    let (_, address) = get_random_free_port().unwrap();
    let config = Config {
        database_url: "sqlite::memory:".to_owned(),
        jwt_secret: "test-secret".to_owned(),
        bind_address: address,
        admin_seed: Some(AdminSeed {
            username: "admin".to_owned(),
            email: ADMIN_EMAIL.to_owned(),
            password: ADMIN_PASSWORD.to_owned(),
        }),
    };
    let state = AppState::new(config).await.unwrap();
    tokio::spawn(run_app(make_router(), state.clone()));

    let app = TestApp {
        base_url: format!("http://{}", address),
        http: reqwest::Client::new(),
        state,
    };
    for _ in 0..100 {
        if let Ok(response) = app.http.get(app.url("/check_health")).send().await {
            if response.status().is_success() {
                return app;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server did not come up on {}", app.base_url);
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Registers a user and returns `(token, id)`.
    pub async fn register(&self, username: &str) -> (String, i64) {
        let response = self
            .http
            .post(self.url("/users"))
            .json(&json!({ "user": {
                "username": username,
                "email": format!("{username}@atlsfw.test"),
                "password": "password123",
            }}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        (
            body["user"]["token"].as_str().unwrap().to_owned(),
            body["user"]["id"].as_i64().unwrap(),
        )
    }

    pub async fn admin_token(&self) -> String {
        let body: Value = self
            .http
            .post(self.url("/users/login"))
            .json(&json!({ "user": { "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["user"]["token"].as_str().unwrap().to_owned()
    }

    pub async fn create_article(&self, admin_token: &str, title: &str, tags: &[&str]) -> i64 {
        let response = self
            .http
            .post(self.url("/posts"))
            .bearer_auth(admin_token)
            .json(&json!({ "article": {
                "title": title,
                "link": format!("https://atlsfw.test/{}", title.replace(' ', "-")),
                "tags": tags,
            }}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        body["article"]["id"].as_i64().unwrap()
    }

    pub async fn toggle(
        &self,
        token: &str,
        article_id: i64,
        kind: &str,
        signal: i64,
        members: &[i64],
    ) -> reqwest::Response {
        let field = if kind == "like" {
            "liked_articles"
        } else {
            "saved_articles"
        };
        self.http
            .post(self.url(&format!("/posts/{article_id}")))
            .bearer_auth(token)
            .query(&[(kind, signal)])
            .json(&json!({ field: members }))
            .send()
            .await
            .unwrap()
    }

    pub async fn current_user(&self, token: &str) -> Value {
        let response = self
            .http
            .get(self.url("/user"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        body["user"].clone()
    }

    pub async fn article(&self, article_id: i64) -> Value {
        let body: Value = self
            .http
            .get(self.url(&format!("/posts/{article_id}")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["article"].clone()
    }

    pub async fn set_status(&self, admin_token: &str, user_id: i64, active: bool) {
        let response = self
            .http
            .put(self.url(&format!("/users/{user_id}/status")))
            .bearer_auth(admin_token)
            .json(&json!({ "active": active }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }
}
