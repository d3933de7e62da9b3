//! Nonce registry
//!
//! Tracks the single outstanding sign-in nonce per wallet address.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::{NonceRecord, WalletAddress};

/// Errors reported by a nonce store backend
#[derive(Error, Debug)]
pub enum NonceStoreError {
    #[error("Nonce store unavailable: {0}")]
    Unavailable(String),
}

/// Storage for outstanding nonces, keyed by canonical wallet address.
///
/// Implementations must keep at most one live nonce per address and must make
/// [`NonceStore::take_if_matches`] atomic: of two concurrent callers holding
/// the same nonce, only one may observe `true`.
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Mint a fresh nonce for `address`, replacing any previous one.
    async fn issue(&self, address: &WalletAddress) -> Result<NonceRecord, NonceStoreError>;

    /// Current unexpired nonce for `address`, if any.
    async fn peek(&self, address: &WalletAddress)
        -> Result<Option<NonceRecord>, NonceStoreError>;

    /// Drop the nonce for `address`. Removing an absent entry is a no-op.
    async fn consume(&self, address: &WalletAddress) -> Result<(), NonceStoreError>;

    /// Remove the entry for `address` if it still holds `nonce` and has not
    /// expired. Returns whether it was removed.
    async fn take_if_matches(
        &self,
        address: &WalletAddress,
        nonce: &str,
    ) -> Result<bool, NonceStoreError>;

    /// Drop every expired entry, returning how many were removed.
    async fn purge_expired(&self) -> Result<usize, NonceStoreError>;

    /// Number of entries currently held.
    async fn len(&self) -> Result<usize, NonceStoreError>;
}

/// Generate a cryptographically secure nonce.
///
/// UUID v4 carries 122 random bits from the OS CSPRNG; the simple form is
/// alphanumeric so it also satisfies EIP-4361 nonce rules.
pub fn generate_nonce() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Process-local nonce store with per-entry TTL
pub struct InMemoryNonceStore {
    nonces: RwLock<HashMap<WalletAddress, NonceRecord>>,
    ttl: chrono::Duration,
}

impl InMemoryNonceStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            nonces: RwLock::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }
}

#[async_trait]
impl NonceStore for InMemoryNonceStore {
    async fn issue(&self, address: &WalletAddress) -> Result<NonceRecord, NonceStoreError> {
        let now = Utc::now();
        let record = NonceRecord {
            nonce: generate_nonce(),
            expires_at: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        self.nonces
            .write()
            .await
            .insert(address.clone(), record.clone());

        Ok(record)
    }

    async fn peek(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<NonceRecord>, NonceStoreError> {
        let now = Utc::now();
        let nonces = self.nonces.read().await;

        Ok(nonces
            .get(address)
            .filter(|record| !record.is_expired_at(now))
            .cloned())
    }

    async fn consume(&self, address: &WalletAddress) -> Result<(), NonceStoreError> {
        self.nonces.write().await.remove(address);
        Ok(())
    }

    async fn take_if_matches(
        &self,
        address: &WalletAddress,
        nonce: &str,
    ) -> Result<bool, NonceStoreError> {
        let now = Utc::now();
        let mut nonces = self.nonces.write().await;

        let Some(record) = nonces.get(address) else {
            return Ok(false);
        };

        if record.is_expired_at(now) {
            nonces.remove(address);
            return Ok(false);
        }

        if record.nonce != nonce {
            return Ok(false);
        }

        nonces.remove(address);
        Ok(true)
    }

    async fn purge_expired(&self) -> Result<usize, NonceStoreError> {
        let now = Utc::now();
        let mut nonces = self.nonces.write().await;

        let before = nonces.len();
        nonces.retain(|_, record| !record.is_expired_at(now));

        Ok(before - nonces.len())
    }

    async fn len(&self) -> Result<usize, NonceStoreError> {
        Ok(self.nonces.read().await.len())
    }
}

/// Periodically purge expired nonces from `store`.
pub fn spawn_nonce_sweeper(store: Arc<dyn NonceStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(interval_secs = interval.as_secs(), "Nonce sweeper started");

        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match store.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "Purged expired nonces"),
                Err(e) => tracing::error!(error = %e, "Failed to purge expired nonces"),
            }
        }
    })
}
