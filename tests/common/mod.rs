//! Shared helpers for the integration tests: a server on a random port backed
//! by its own temporary SQLite file.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::net::TcpListener;
use storefront::configuration::{CredentialSettings, DatabaseSettings, JwtSettings};
use storefront::database::run_migrations;
use storefront::startup::run;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

pub fn jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: "integration-test-secret-at-least-32-characters".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 3600,
        issuer: "storefront-test".to_string(),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(jwt_settings()).await
}

pub async fn spawn_app_with(jwt: JwtSettings) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let database = DatabaseSettings {
        path: std::env::temp_dir()
            .join(format!("storefront-it-{}.db", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .into_owned(),
        max_connections: 5,
    };
    let pool = database
        .connection_pool()
        .await
        .expect("Failed to open the database.");
    run_migrations(&pool)
        .await
        .expect("Failed to migrate the database.");

    // Lowest bcrypt cost keeps the suite fast
    let credentials = CredentialSettings { hash_cost: 4 };

    let server = run(listener, pool, jwt, credentials).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/register"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register then log in, returning the token pair body
    pub async fn sign_up(&self, username: &str, password: &str) -> Tokens {
        assert_eq!(201, self.register(username, password).await.status().as_u16());
        let response = self.login(username, password).await;
        assert_eq!(200, response.status().as_u16());
        Tokens::from_body(response.json().await.expect("Failed to parse response"))
    }

    pub async fn refresh(&self, refresh_token: &str) -> reqwest::Response {
        self.client
            .post(self.url("/refresh"))
            .bearer_auth(refresh_token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn logout(&self, access_token: &str) -> reqwest::Response {
        self.client
            .post(self.url("/logout"))
            .bearer_auth(access_token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn create_store(&self, token: &str, name: &str) -> Value {
        let response = self
            .client
            .post(self.url("/store"))
            .bearer_auth(token)
            .json(&json!({ "name": name }))
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(201, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    pub async fn create_item(&self, token: &str, name: &str, price: f64, store_id: i64) -> Value {
        let response = self
            .client
            .post(self.url("/item"))
            .bearer_auth(token)
            .json(&json!({ "name": name, "price": price, "store_id": store_id }))
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(201, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }
}

pub struct Tokens {
    pub access: String,
    pub refresh: String,
}

impl Tokens {
    pub fn from_body(body: Value) -> Self {
        Self {
            access: body["access_token"].as_str().unwrap().to_string(),
            refresh: body["refresh_token"].as_str().unwrap().to_string(),
        }
    }
}

/// Status and reason code of an error response
pub async fn error_of(response: reqwest::Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body: Value = response.json().await.expect("Failed to parse error body");
    (status, body["code"].as_str().unwrap_or_default().to_string())
}
