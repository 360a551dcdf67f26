use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tracing::info;

use crate::config::{DatabaseBackend, DatabaseConfig};
use crate::database::memory::MemoryDocumentStore;
use crate::database::postgres::PgDocumentStore;
use crate::database::store::DocumentStore;

/// Closed set of failure categories every store error collapses into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidInput,
    Unavailable,
    Internal,
}

/// Errors from the document store and the adapters built on it
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to decode document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::NotFound(_) => ErrorKind::NotFound,
            DatabaseError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            DatabaseError::InvalidInput(_) => ErrorKind::InvalidInput,
            DatabaseError::Unavailable(_) | DatabaseError::ConfigMissing(_) => ErrorKind::Unavailable,
            DatabaseError::Decode(_) => ErrorKind::Internal,
            DatabaseError::Sqlx(err) => match err {
                sqlx::Error::RowNotFound => ErrorKind::NotFound,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                    ErrorKind::Unavailable
                }
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                    ErrorKind::AlreadyExists
                }
                _ => ErrorKind::Internal,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Build the store client described by the configuration.
///
/// Any failure here is a server-side condition and comes back as
/// `Unavailable`, whatever caused it.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn DocumentStore>, DatabaseError> {
    match config.backend {
        DatabaseBackend::Memory => {
            info!("Using in-memory document store");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
        DatabaseBackend::Postgres => connect_postgres(config).await.map_err(|e| match e {
            DatabaseError::Unavailable(_) => e,
            other => DatabaseError::Unavailable(other.to_string()),
        }),
    }
}

async fn connect_postgres(config: &DatabaseConfig) -> Result<Arc<dyn DocumentStore>, DatabaseError> {
    let connection_string = resolve_connection_string(config)?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(&connection_string)
        .await
        .map_err(|e| DatabaseError::Unavailable(e.to_string()))?;

    let store = PgDocumentStore::new(pool);
    store.ensure_schema().await?;

    info!("Created document store pool for: {}", redact(&connection_string));
    Ok(Arc::new(store))
}

/// Connection URL from config, falling back to the credentials file.
fn resolve_connection_string(config: &DatabaseConfig) -> Result<String, DatabaseError> {
    let raw = match (&config.url, &config.credentials_path) {
        (Some(url), _) => url.clone(),
        (None, Some(path)) => read_credentials(path)?,
        (None, None) => return Err(DatabaseError::ConfigMissing("database.url or database.credentials_path")),
    };

    let url = url::Url::parse(raw.trim())
        .map_err(|e| DatabaseError::InvalidInput(format!("invalid database URL: {}", e)))?;
    match url.scheme() {
        "postgres" | "postgresql" => Ok(url.into()),
        other => Err(DatabaseError::InvalidInput(format!(
            "unsupported database scheme: {}",
            other
        ))),
    }
}

fn read_credentials(path: &Path) -> Result<String, DatabaseError> {
    std::fs::read_to_string(path).map_err(|e| {
        DatabaseError::Unavailable(format!(
            "cannot read credentials file {}: {}",
            path.display(),
            e
        ))
    })
}

/// Connection string without the password, for logs.
fn redact(connection_string: &str) -> String {
    match url::Url::parse(connection_string) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.into()
        }
        Err(_) => "<unparsable url>".to_string(),
    }
}
