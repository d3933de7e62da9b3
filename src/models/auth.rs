//! Authentication models for the Web3 login server

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wallet address in canonical (trimmed, lowercase) form.
///
/// Addresses are compared case-insensitively, so the checksummed and the
/// lowercase spelling of one account map to the same key. No format or
/// checksum validation is done beyond requiring a non-empty value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Canonicalize a raw address, returning `None` when it is blank.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Outstanding nonce for one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceRecord {
    pub nonce: String,
    pub expires_at: DateTime<Utc>,
}

impl NonceRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Challenge handed to a client that asked for a nonce
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NonceChallenge {
    pub nonce: String,
    /// Exact message the wallet is expected to sign
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Query string of `GET /auth/nonce`
#[derive(Debug, Default, Deserialize)]
pub struct NonceQuery {
    pub address: Option<String>,
}

/// Body of `POST /auth/verify`
///
/// Every field is optional on the wire so that an incomplete body is reported
/// as missing fields instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// Successful verification response
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub ok: bool,
}
