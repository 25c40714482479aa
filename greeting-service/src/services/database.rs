use crate::config::MongoConfig;
use async_trait::async_trait;
use mongodb::{
    bson::doc,
    options::{ReadPreference, SelectionCriteria},
    Client as MongoClient,
};
use service_core::error::AppError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A document store the service only needs to reach and later release.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Round-trip against the primary node.
    async fn ping(&self) -> Result<(), AppError>;

    /// Close pooled connections and stop background monitoring.
    async fn disconnect(&self);
}

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
}

impl MongoDb {
    /// Build a client from `config.uri` and confirm the primary answers a
    /// `ping`. Either failure is a [`AppError::ConnectionError`].
    pub async fn connect(config: &MongoConfig) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(&config.uri).await.map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::ConnectionError(anyhow::Error::new(e))
        })?;

        let db = Self { client };
        db.ping().await?;

        tracing::info!("MongoDB successfully connected");
        Ok(db)
    }
}

#[async_trait]
impl DocumentStore for MongoDb {
    async fn ping(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(
                doc! { "ping": 1 },
                SelectionCriteria::ReadPreference(ReadPreference::Primary),
            )
            .await
            .map_err(|e| {
                tracing::error!("MongoDB liveness probe failed: {}", e);
                AppError::ConnectionError(anyhow::Error::new(e))
            })?;
        Ok(())
    }

    async fn disconnect(&self) {
        tracing::info!("Disconnecting from MongoDB");
        self.client.clone().shutdown().await;
    }
}

/// In-memory [`DocumentStore`] for tests. Clones share their counters.
#[derive(Clone, Default)]
pub struct MockDocumentStore {
    unreachable: bool,
    pings: Arc<AtomicUsize>,
    disconnects: Arc<AtomicUsize>,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose liveness probe always fails.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Mirrors [`MongoDb::connect`]: the handle is only returned once the
    /// probe succeeds.
    pub async fn connect(self) -> Result<Self, AppError> {
        self.ping().await?;
        Ok(self)
    }

    pub fn ping_count(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(AppError::ConnectionError(anyhow::anyhow!(
                "server selection timeout"
            )));
        }
        Ok(())
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}
