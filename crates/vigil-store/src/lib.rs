//! External-collaborator seams for the triage relay: the credential store
//! holding the Slack OAuth token at rest, the downstream event queue, and
//! the process-wide token cache with single-flight population.

pub mod credential_store;
pub mod event_queue;
pub mod token_cache;

pub use credential_store::{CredentialStore, FileCredentialStore, StoreError};
pub use event_queue::{EventQueue, JsonlEventQueue, QueueError};
pub use token_cache::TokenCache;
