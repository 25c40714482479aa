//! Test helpers: spawn the application against in-memory backends.

#![allow(dead_code)]

use greeting_service::services::{MockCache, MockDocumentStore};
use greeting_service::Application;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: MockDocumentStore,
    pub cache: MockCache,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<Result<(), service_core::error::AppError>>>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(MockDocumentStore::new(), MockCache::new()).await
    }

    pub async fn spawn_with(store: MockDocumentStore, cache: MockCache) -> Self {
        let app = Application::build(0, store.clone().connect(), cache.clone().connect())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(app.run_until_stopped(async {
            rx.await.ok();
        }));

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            port,
            store,
            cache,
            shutdown: Some(tx),
            server: Some(server),
        }
    }

    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::new()
    }

    pub fn healthchecker_url(&self) -> String {
        format!("{}/api/healthchecker", self.address)
    }

    /// Trigger graceful shutdown and wait for the server task to finish.
    pub async fn stop(&mut self) -> Result<(), service_core::error::AppError> {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
        match self.server.take() {
            Some(server) => server.await.expect("Server task panicked"),
            None => Ok(()),
        }
    }
}
