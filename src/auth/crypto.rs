//! Ethereum personal-message signature verification
//!
//! Recovers the signer of an EIP-191 `personal_sign` signature over secp256k1
//! and compares it with the claimed wallet address.

use async_trait::async_trait;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// Errors that make a signature unusable
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid signature encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid signature length: expected 65 bytes, got {0}")]
    InvalidLength(usize),

    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    #[error("Invalid signature format")]
    InvalidFormat,

    #[error("Failed to recover public key")]
    RecoveryFailed,
}

/// Fault inside a verifier, as opposed to a signature that simply does not match
#[derive(Error, Debug)]
pub enum VerifierError {
    #[error("Signature verifier failed: {0}")]
    Internal(String),
}

/// Capability that decides whether `signature` over `message` was made by
/// the key behind `address`.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    /// `Ok(false)` for any signature that does not prove ownership of
    /// `address`; `Err` only when the verifier itself could not do its job.
    async fn verify(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<bool, VerifierError>;
}

/// EIP-191 `personal_sign` verifier for EVM accounts
#[derive(Debug, Clone, Default)]
pub struct EthereumSignatureVerifier;

impl EthereumSignatureVerifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SignatureVerifier for EthereumSignatureVerifier {
    async fn verify(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<bool, VerifierError> {
        let expected = address.trim().to_lowercase();
        let message = message.to_owned();
        let signature = signature.to_owned();

        // Recovery is CPU-bound; keep it off the async workers
        let recovered = tokio::task::spawn_blocking(move || {
            recover_personal_signer(message.as_bytes(), &signature)
        })
        .await
        .map_err(|e| VerifierError::Internal(e.to_string()))?;

        match recovered {
            Ok(signer) => Ok(signer == expected),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected malformed signature");
                Ok(false)
            }
        }
    }
}

/// Keccak256 of `data`
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// EIP-191 digest: `keccak256("\x19Ethereum Signed Message:\n" ++ len ++ message)`
pub fn hash_personal_message(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n");
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Lowercase `0x`-prefixed account address of a public key
pub fn address_from_verifying_key(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    // Skip the 0x04 SEC1 tag
    let hash = keccak256(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

/// Recover the address that produced a 65-byte `r || s || v` hex signature
/// over `message` with `personal_sign`.
pub fn recover_personal_signer(message: &[u8], signature_hex: &str) -> Result<String, CryptoError> {
    let raw = signature_hex.trim();
    let raw = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);

    let bytes = hex::decode(raw).map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
    if bytes.len() != 65 {
        return Err(CryptoError::InvalidLength(bytes.len()));
    }

    let recovery_id = parse_recovery_id(bytes[64])?;
    let signature = Signature::from_slice(&bytes[..64]).map_err(|_| CryptoError::InvalidFormat)?;

    let digest = hash_personal_message(message);
    let key = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;

    Ok(address_from_verifying_key(&key))
}

/// Accepts both the raw (0/1) and the legacy Ethereum (27/28) encoding of `v`.
fn parse_recovery_id(v: u8) -> Result<RecoveryId, CryptoError> {
    let normalized = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        _ => return Err(CryptoError::InvalidRecoveryId(v)),
    };

    RecoveryId::from_byte(normalized).ok_or(CryptoError::InvalidRecoveryId(v))
}
