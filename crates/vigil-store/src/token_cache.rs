//! Process-wide access-token cache with single-flight population.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OnceCell};

use crate::credential_store::{CredentialStore, StoreError};

/// Read-mostly cache of client id → access token.
///
/// First access per key populates from the credential store; concurrent
/// first accesses share a single fetch. A failed fetch leaves the cell
/// empty so the next caller retries.
pub struct TokenCache {
    store: Arc<dyn CredentialStore>,
    cells: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
}

impl TokenCache {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            cells: Mutex::new(HashMap::new()),
        }
    }

    pub async fn access_token(&self, client_id: &str) -> Result<String, StoreError> {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells.entry(client_id.to_string()).or_default().clone()
        };
        let token = cell
            .get_or_try_init(|| async { self.store.get(client_id) })
            .await?;
        Ok(token.clone())
    }

    /// Drops the cached token so the next access re-reads the store. Called
    /// after a fresh token is provisioned.
    pub async fn invalidate(&self, client_id: &str) {
        self.cells.lock().await.remove(client_id);
    }
}
