use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

use pace_api::app::{router, AppState};
use pace_api::config::AppConfig;
use pace_api::container::Container;
use pace_api::database::MemoryDocumentStore;

/// The real router on a free port, backed by a private in-memory store.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: MemoryDocumentStore,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(AppConfig::default()).await
}

/// Each test gets its own server and store; the server lives as long as the
/// test's runtime.
pub async fn spawn_server_with(mut config: AppConfig) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    config.server.host = "127.0.0.1".to_string();
    config.server.port = port;

    let store = MemoryDocumentStore::new();
    let container = Container::with_store(Arc::new(config), Arc::new(store.clone()));
    let app = router(AppState::new(Arc::new(container)));

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let server = TestServer {
        port,
        base_url: format!("http://127.0.0.1:{}", port),
        store,
    };
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
