//! Application startup and lifecycle management.
//!
//! Startup is strictly ordered: document store, then cache (including the
//! greeting seed), then the HTTP listener. The document store is released
//! exactly once, whichever way the process leaves the serving state.

use crate::config::GreetingConfig;
use crate::handlers;
use crate::services::{seed_greeting, Cache, DocumentStore, MongoDb, RedisCache};
use axum::{middleware::from_fn, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::request_id_middleware;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Read-only state shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub greeting: Arc<str>,
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new().route("/healthchecker", get(handlers::health_checker));

    Router::new()
        .nest("/api", api)
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A fully started service: connections established, greeting captured,
/// listener bound.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    store: Box<dyn DocumentStore>,
    _cache: Box<dyn Cache>,
}

impl Application {
    /// Run the startup sequence.
    ///
    /// The connectors are futures and stay unpolled until their turn, so a
    /// failing document store means the cache is never contacted. If any step
    /// after the document store fails, the store is disconnected before the
    /// error is returned.
    pub async fn build<S, C>(
        port: u16,
        connect_store: impl Future<Output = Result<S, AppError>>,
        connect_cache: impl Future<Output = Result<C, AppError>>,
    ) -> Result<Self, AppError>
    where
        S: DocumentStore + 'static,
        C: Cache + 'static,
    {
        let store = connect_store.await.map_err(|e| {
            tracing::error!("Failed to connect to document store: {}", e);
            e
        })?;

        match Self::start(port, connect_cache).await {
            Ok((port, listener, router, cache)) => {
                tracing::info!("Listening on {}", port);
                Ok(Self {
                    port,
                    listener,
                    router,
                    store: Box::new(store),
                    _cache: Box::new(cache),
                })
            }
            Err(e) => {
                store.disconnect().await;
                Err(e)
            }
        }
    }

    async fn start<C: Cache>(
        port: u16,
        connect_cache: impl Future<Output = Result<C, AppError>>,
    ) -> Result<(u16, TcpListener, Router, C), AppError> {
        let cache = connect_cache.await.map_err(|e| {
            tracing::error!("Failed to connect to cache: {}", e);
            e
        })?;

        let greeting = seed_greeting(&cache).await?;
        let router = build_router(AppState {
            greeting: greeting.into(),
        });

        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok((port, listener, router, cache))
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until `shutdown` resolves or the listener fails, then disconnect
    /// the document store. In-flight requests are drained first.
    pub async fn run_until_stopped(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), AppError> {
        let Self {
            listener,
            router,
            store,
            ..
        } = self;

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await;
        tracing::info!("HTTP listener stopped");

        store.disconnect().await;

        served.map_err(|e| {
            tracing::error!("HTTP listener failed: {}", e);
            AppError::ListenerError(e)
        })
    }
}

/// Start against the configured MongoDB and Redis and serve until `shutdown`.
pub async fn run(
    config: &GreetingConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), AppError> {
    let app = Application::build(
        config.port,
        MongoDb::connect(&config.mongodb),
        RedisCache::connect(&config.redis),
    )
    .await?;

    app.run_until_stopped(shutdown).await
}
