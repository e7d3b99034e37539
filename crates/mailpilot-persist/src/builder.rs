use std::sync::Arc;

use crate::checkpoint::Checkpointer;
use crate::error::Result;
use crate::memory::InMemoryCheckpointer;
use crate::trait_client::PersistenceClient;

/// Storage collaborators for one assistant
pub struct PersistenceBackends {
    /// `None` when no database is configured; message history is then not stored
    pub persistence: Option<Arc<dyn PersistenceClient>>,
    pub checkpointer: Arc<dyn Checkpointer>,
}

/// Picks Postgres or in-memory backends from an optional database URL
#[derive(Debug, Default, Clone)]
pub struct PersistenceBuilder {
    database_url: Option<String>,
}

impl PersistenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn maybe_database_url(mut self, url: Option<String>) -> Self {
        self.database_url = url.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn build(self) -> Result<PersistenceBackends> {
        match self.database_url {
            #[cfg(feature = "postgres")]
            Some(url) => {
                let pool = crate::postgres::lazy_pool(&url)?;
                tracing::info!("Using Postgres persistence and checkpoints");
                Ok(PersistenceBackends {
                    persistence: Some(Arc::new(crate::postgres::PostgresPersistenceClient::new(pool.clone()))),
                    checkpointer: Arc::new(crate::postgres::PostgresCheckpointer::new(pool)),
                })
            }
            #[cfg(not(feature = "postgres"))]
            Some(_) => Err(crate::error::PersistError::Connection(
                "built without the `postgres` feature".to_string(),
            )),
            None => {
                tracing::info!("No database configured; using in-memory checkpoints without persistence");
                Ok(PersistenceBackends {
                    persistence: None,
                    checkpointer: Arc::new(InMemoryCheckpointer::new()),
                })
            }
        }
    }
}
