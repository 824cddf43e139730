//! Test helpers for integration tests
//!
//! Spawns a full gateway process in-task, backed by the in-memory game
//! session store, and provides identity-carrying HTTP helpers.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use bbs_common::{
    AppConfig, AppSettings, DatabaseConfig, Environment, HubConfig, RateLimitConfig,
    RateLimitRule, ServerConfig, SessionConfig,
};
use bbs_gateway::{create_app, create_gateway_state, GatewayState};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Configuration for a self-contained test server
///
/// Uses the in-memory game session store and generous limits so tests only
/// trip limits they configure deliberately.
pub fn test_config() -> AppConfig {
    AppConfig {
        app: AppSettings {
            name: "bbs-test".to_string(),
            env: Environment::Development,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: "memory://".to_string(),
            max_connections: 5,
            min_connections: 1,
        },
        session: SessionConfig {
            timeout_secs: 1800,
            sweep_interval_secs: 60,
        },
        hub: HubConfig {
            heartbeat_interval_ms: 45_000,
            heartbeat_timeout_ms: 90_000,
            auth_grace_ms: 30_000,
            batch_window_ms: 20,
            max_batch_size: 25,
            max_subscriptions: 16,
        },
        rate_limit: RateLimitConfig {
            message_post: RateLimitRule {
                max: 100,
                window_secs: 60,
            },
            door_input: RateLimitRule {
                max: 1000,
                window_secs: 60,
            },
            subscription_change: RateLimitRule {
                max: 100,
                window_secs: 60,
            },
            http_requests_per_second: 1000,
            http_burst: 1000,
        },
    }
}

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: GatewayState,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server with the default test config
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let state = create_gateway_state(config)
            .await
            .map_err(|e| anyhow!("failed to create gateway state: {e}"))?;
        let app = create_app(state.clone());

        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        // Wait for server to be ready
        tokio::time::sleep(Duration::from_millis(50)).await;

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            state,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// GET without identity headers
    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// GET with identity headers
    pub async fn get_as(&self, user: &str, path: &str) -> Result<Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .header("x-user-id", user)
            .header("x-handle", user)
            .send()
            .await?)
    }

    /// POST with identity headers and a JSON body
    pub async fn post_as<B: Serialize>(&self, user: &str, path: &str, body: &B) -> Result<Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .header("x-user-id", user)
            .header("x-handle", user)
            .json(body)
            .send()
            .await?)
    }

    /// POST with identity headers and no body
    pub async fn post_empty_as(&self, user: &str, path: &str) -> Result<Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .header("x-user-id", user)
            .header("x-handle", user)
            .send()
            .await?)
    }

    /// POST without identity headers
    pub async fn post_anonymous<B: Serialize>(&self, path: &str, body: &B) -> Result<Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await?)
    }
}

/// Assert the response status, consuming the response
pub async fn assert_status(response: Response, expected: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected {
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("expected {expected}, got {status}: {body}"));
    }
    Ok(())
}

/// Assert the status and decode the JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected: StatusCode,
) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if status != expected {
        return Err(anyhow!("expected {expected}, got {status}: {body}"));
    }
    Ok(serde_json::from_str(&body)?)
}
