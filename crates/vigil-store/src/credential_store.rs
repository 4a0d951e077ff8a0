//! Credential store: the Slack OAuth access token sealed at rest.
//!
//! The file-backed implementation keeps one JSON document of named
//! parameters. Values are AES-256-GCM sealed with a key derived from the
//! machine id, framed `enc:v1:` + base64(nonce || ciphertext), and the
//! document is replaced atomically on every write.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use vigil_core::write_text_atomic;

const CREDENTIAL_STORE_SCHEMA_VERSION: u32 = 1;
const SEALED_VALUE_PREFIX: &str = "enc:v1:";
const NONCE_BYTES: usize = 12;
const MACHINE_KEY_CONTEXT: &str = "vigil-credential-store-v1";
const MACHINE_ID_CANDIDATE_PATHS: [&str; 2] = ["/etc/machine-id", "/var/lib/dbus/machine-id"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential parameter {0} is not provisioned")]
    MissingParameter(String),
    #[error("credential store io failure: {0}")]
    Io(String),
    #[error("credential store schema {found} is unsupported (expected {expected})")]
    Schema { found: u32, expected: u32 },
    #[error("failed to seal credential value: {0}")]
    Seal(String),
    #[error("failed to open sealed credential value: {0}")]
    Unseal(String),
}

/// Narrow interface over the external secret store.
pub trait CredentialStore: Send + Sync {
    /// Stores (or overwrites) the token for a client id.
    fn put(&self, client_id: &str, token: &str) -> Result<(), StoreError>;
    /// Fetches and opens the token for a client id.
    fn get(&self, client_id: &str) -> Result<String, StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialStoreFile {
    schema_version: u32,
    #[serde(default)]
    parameters: BTreeMap<String, String>,
}

pub struct FileCredentialStore {
    path: PathBuf,
    prefix: String,
    key: [u8; 32],
    write_guard: Mutex<()>,
}

impl FileCredentialStore {
    /// Opens the store with a key derived from this machine's identity.
    pub fn open(path: PathBuf, prefix: impl Into<String>) -> Result<Self, StoreError> {
        let key = derive_machine_key();
        Self::with_key(path, prefix, key)
    }

    /// Opens the store with an explicit key. Intended for tests and for
    /// hosts without a stable machine id.
    pub fn with_key(
        path: PathBuf,
        prefix: impl Into<String>,
        key: [u8; 32],
    ) -> Result<Self, StoreError> {
        let store = Self {
            path,
            prefix: prefix.into(),
            key,
            write_guard: Mutex::new(()),
        };
        // Surface a schema mismatch at construction rather than first use.
        store.load()?;
        Ok(store)
    }

    fn parameter_name(&self, client_id: &str) -> String {
        format!("{}-{}", self.prefix, client_id)
    }

    fn load(&self) -> Result<CredentialStoreFile, StoreError> {
        if !self.path.exists() {
            return Ok(CredentialStoreFile {
                schema_version: CREDENTIAL_STORE_SCHEMA_VERSION,
                parameters: BTreeMap::new(),
            });
        }
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|error| StoreError::Io(format!("read {}: {error}", self.path.display())))?;
        let file: CredentialStoreFile = serde_json::from_str(&raw)
            .map_err(|error| StoreError::Io(format!("parse {}: {error}", self.path.display())))?;
        if file.schema_version != CREDENTIAL_STORE_SCHEMA_VERSION {
            return Err(StoreError::Schema {
                found: file.schema_version,
                expected: CREDENTIAL_STORE_SCHEMA_VERSION,
            });
        }
        Ok(file)
    }

    fn persist(&self, file: &CredentialStoreFile) -> Result<(), StoreError> {
        let mut payload = serde_json::to_string_pretty(file)
            .map_err(|error| StoreError::Io(format!("serialize credential store: {error}")))?;
        payload.push('\n');
        write_text_atomic(&self.path, &payload)
            .map_err(|error| StoreError::Io(format!("{error:#}")))
    }

    fn seal(&self, plaintext: &str) -> Result<String, StoreError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| StoreError::Seal("aead encryption failed".to_string()))?;
        let mut framed = nonce.to_vec();
        framed.extend_from_slice(&ciphertext);
        Ok(format!(
            "{SEALED_VALUE_PREFIX}{}",
            BASE64_STANDARD.encode(framed)
        ))
    }

    fn open_sealed(&self, sealed: &str) -> Result<String, StoreError> {
        let encoded = sealed
            .strip_prefix(SEALED_VALUE_PREFIX)
            .ok_or_else(|| StoreError::Unseal("unrecognized value framing".to_string()))?;
        let framed = BASE64_STANDARD
            .decode(encoded)
            .map_err(|error| StoreError::Unseal(error.to_string()))?;
        if framed.len() <= NONCE_BYTES {
            return Err(StoreError::Unseal("sealed value is too short".to_string()));
        }
        let (nonce, ciphertext) = framed.split_at(NONCE_BYTES);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| StoreError::Unseal("aead decryption failed".to_string()))?;
        String::from_utf8(plaintext).map_err(|error| StoreError::Unseal(error.to_string()))
    }
}

impl CredentialStore for FileCredentialStore {
    fn put(&self, client_id: &str, token: &str) -> Result<(), StoreError> {
        let _guard = self
            .write_guard
            .lock()
            .map_err(|_| StoreError::Io("credential store mutex is poisoned".to_string()))?;
        let mut file = self.load()?;
        file.parameters
            .insert(self.parameter_name(client_id), self.seal(token)?);
        self.persist(&file)
    }

    fn get(&self, client_id: &str) -> Result<String, StoreError> {
        let name = self.parameter_name(client_id);
        let file = self.load()?;
        let sealed = file
            .parameters
            .get(&name)
            .ok_or_else(|| StoreError::MissingParameter(name.clone()))?;
        self.open_sealed(sealed)
    }
}

fn derive_machine_key() -> [u8; 32] {
    let machine_id = MACHINE_ID_CANDIDATE_PATHS
        .iter()
        .find_map(|candidate| std::fs::read_to_string(Path::new(candidate)).ok())
        .unwrap_or_else(|| "vigil-fallback-machine".to_string());
    let mut hasher = Sha256::new();
    hasher.update(machine_id.trim().as_bytes());
    hasher.update(MACHINE_KEY_CONTEXT.as_bytes());
    hasher.finalize().into()
}
