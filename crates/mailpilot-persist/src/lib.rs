pub mod builder;
pub mod checkpoint;
pub mod error;
pub mod ids;
pub mod memory;
pub mod models;
pub mod sync;
pub mod trait_client;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "postgres")]
pub mod schema;

pub use builder::{PersistenceBackends, PersistenceBuilder};
pub use checkpoint::Checkpointer;
pub use error::{PersistError, Result};
pub use ids::{conversation_id_for, conversation_namespace, user_id_for, ConversationKey};
pub use memory::{InMemoryCheckpointer, InMemoryPersistenceClient};
pub use models::StoredMessage;
pub use sync::{sync_conversation, SyncOutcome};
pub use trait_client::PersistenceClient;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresCheckpointer, PostgresPersistenceClient};
