//! The lazily established database session shared by all handlers.
//!
//! State machine: {Disconnected, Connected}, one instance per process, moved
//! only by explicit connect attempts. Connected never degrades on its own;
//! there is no health-check loop, so a failed connect is retried by whatever
//! request arrives next.

use std::sync::Arc;

use sqlx::AnyPool;
use taskvault_core::connstring::build_database_url;
use taskvault_core::keyvault::SecretSource;
use taskvault_core::SecretError;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::db::{self, DbConnector};

#[derive(Debug, Error)]
enum SessionError {
    #[error(transparent)]
    Secret(#[from] SecretError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

enum ConnectionState {
    Disconnected { reason: Option<String> },
    Connected(AnyPool),
}

/// Owns the single shared session and the collaborators needed to rebuild it.
pub struct SessionManager {
    state: RwLock<ConnectionState>,
    secrets: Arc<dyn SecretSource>,
    connector: Arc<dyn DbConnector>,
    secret_name: String,
}

impl SessionManager {
    pub fn new(
        secrets: Arc<dyn SecretSource>,
        connector: Arc<dyn DbConnector>,
        secret_name: impl Into<String>,
    ) -> Self {
        Self {
            state: RwLock::new(ConnectionState::Disconnected { reason: None }),
            secrets,
            connector,
            secret_name: secret_name.into(),
        }
    }

    /// Connect if there is no live session yet.
    ///
    /// Returns whether a session is available; callers must check before
    /// asking for the pool. An existing session is trusted without a liveness
    /// re-check, and repeated calls while Connected touch neither the vault
    /// nor the database.
    pub async fn ensure_connected(&self) -> bool {
        if matches!(*self.state.read().await, ConnectionState::Connected(_)) {
            return true;
        }

        let mut state = self.state.write().await;
        // A concurrent caller may have connected while we waited for the lock.
        if matches!(*state, ConnectionState::Connected(_)) {
            return true;
        }

        match self.open_session().await {
            Ok(pool) => {
                info!("database session established");
                *state = ConnectionState::Connected(pool);
                true
            }
            Err(err) => {
                let reason = err.to_string();
                warn!(%reason, "database connection failed");
                *state = ConnectionState::Disconnected {
                    reason: Some(reason),
                };
                false
            }
        }
    }

    async fn open_session(&self) -> Result<AnyPool, SessionError> {
        let secret = self.secrets.get_secret(&self.secret_name).await?;
        let url = build_database_url(&secret);
        let pool = self.connector.connect(&url).await?;

        // Liveness probe before the session is handed to anyone.
        sqlx::query("SELECT 1").execute(&pool).await?;

        db::ensure_schema(&pool).await?;
        Ok(pool)
    }

    /// Handle to the live pool, if any.
    pub async fn pool(&self) -> Option<AnyPool> {
        match &*self.state.read().await {
            ConnectionState::Connected(pool) => Some(pool.clone()),
            ConnectionState::Disconnected { .. } => None,
        }
    }

    pub async fn is_connected(&self) -> bool {
        matches!(*self.state.read().await, ConnectionState::Connected(_))
    }

    /// Reason recorded by the most recent failed connect attempt.
    pub async fn last_error(&self) -> Option<String> {
        match &*self.state.read().await {
            ConnectionState::Disconnected { reason } => reason.clone(),
            ConnectionState::Connected(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use taskvault_core::Result as SecretResult;
    use tempfile::TempDir;

    use crate::db::SqlxConnector;

    struct CountingSecrets {
        value: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SecretSource for CountingSecrets {
        async fn get_secret(&self, _name: &str) -> SecretResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.value.clone())
        }
    }

    struct FailingSecrets;

    #[async_trait]
    impl SecretSource for FailingSecrets {
        async fn get_secret(&self, _name: &str) -> SecretResult<String> {
            Err(SecretError::Secret {
                status: 403,
                detail: "vault access denied".to_string(),
            })
        }
    }

    /// Fails the first call, yields the real secret afterwards.
    struct FlakySecrets {
        value: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SecretSource for FlakySecrets {
        async fn get_secret(&self, _name: &str) -> SecretResult<String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(SecretError::MissingValue)
            } else {
                Ok(self.value.clone())
            }
        }
    }

    fn sqlite_url(dir: &TempDir) -> String {
        format!("sqlite://{}?mode=rwc", dir.path().join("todos.db").display())
    }

    fn manager(secrets: Arc<dyn SecretSource>) -> SessionManager {
        SessionManager::new(secrets, Arc::new(SqlxConnector), "AZURE-SQL-CONNECTION-STRING")
    }

    #[tokio::test]
    async fn connects_once_and_stays_connected() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = Arc::new(CountingSecrets {
            value: sqlite_url(&dir),
            calls: AtomicUsize::new(0),
        });
        let session = manager(secrets.clone());

        assert!(session.ensure_connected().await);
        assert!(session.ensure_connected().await);
        assert!(session.is_connected().await);
        assert!(session.pool().await.is_some());
        assert!(session.last_error().await.is_none());
        assert_eq!(secrets.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn secret_failure_records_the_reason() {
        let session = manager(Arc::new(FailingSecrets));

        assert!(!session.ensure_connected().await);
        assert!(!session.is_connected().await);
        assert!(session.pool().await.is_none());

        let reason = session.last_error().await.unwrap();
        assert!(reason.contains("vault access denied"));
    }

    #[tokio::test]
    async fn odbc_secret_fails_at_connect_and_records_it() {
        // The built mssql URL has no sqlx driver, so the connect step fails.
        let secrets = Arc::new(CountingSecrets {
            value: "Server=x;Uid=y;Pwd=z".to_string(),
            calls: AtomicUsize::new(0),
        });
        let session = manager(secrets);

        assert!(!session.ensure_connected().await);
        assert!(!session.last_error().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn recovers_on_the_next_attempt_after_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = Arc::new(FlakySecrets {
            value: sqlite_url(&dir),
            calls: AtomicUsize::new(0),
        });
        let session = manager(secrets);

        assert!(!session.ensure_connected().await);
        assert!(session.last_error().await.is_some());

        assert!(session.ensure_connected().await);
        assert!(session.last_error().await.is_none());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_connect_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = Arc::new(CountingSecrets {
            value: sqlite_url(&dir),
            calls: AtomicUsize::new(0),
        });
        let session = Arc::new(manager(secrets.clone()));

        let (a, b) = tokio::join!(session.ensure_connected(), session.ensure_connected());
        assert!(a && b);
        assert_eq!(secrets.calls.load(Ordering::SeqCst), 1);
    }
}
