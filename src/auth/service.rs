//! Authentication service
//!
//! Core business logic for wallet-based sign-in.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::{Config, DEFAULT_SIGN_IN_STATEMENT};
use crate::models::{NonceChallenge, WalletAddress};

use super::crypto::{SignatureVerifier, VerifierError};
use super::message::{message_matches, MessageMode, SignInMessage};
use super::nonce::{NonceStore, NonceStoreError};
use super::session::Session;

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Missing Fields")]
    MissingFields,

    #[error("Invalid Nonce")]
    InvalidNonce,

    #[error("Invalid Signature")]
    InvalidSignature,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<NonceStoreError> for AuthError {
    fn from(e: NonceStoreError) -> Self {
        AuthError::Internal(e.to_string())
    }
}

impl From<VerifierError> for AuthError {
    fn from(e: VerifierError) -> Self {
        AuthError::Internal(e.to_string())
    }
}

/// Tunables of the sign-in flow
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub statement: String,
    pub message_mode: MessageMode,
    pub verify_timeout: Duration,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            statement: DEFAULT_SIGN_IN_STATEMENT.to_string(),
            message_mode: MessageMode::Strict,
            verify_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&Config> for AuthSettings {
    fn from(config: &Config) -> Self {
        Self {
            statement: config.sign_in_statement.clone(),
            message_mode: config.message_mode,
            verify_timeout: config.verify_timeout,
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    nonces: Arc<dyn NonceStore>,
    verifier: Arc<dyn SignatureVerifier>,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(
        nonces: Arc<dyn NonceStore>,
        verifier: Arc<dyn SignatureVerifier>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            nonces,
            verifier,
            settings,
        }
    }

    /// Issue a fresh nonce for `address`, invalidating any earlier one.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn request_nonce(&self, address: Option<&str>) -> Result<NonceChallenge, AuthError> {
        let Some(address) = address.and_then(WalletAddress::parse) else {
            tracing::warn!("Nonce request rejected: address missing");
            return Err(AuthError::InvalidInput("Address is Required".to_string()));
        };

        let record = self.nonces.issue(&address).await.map_err(|e| {
            tracing::error!(address = %address, error = %e, "Failed to issue nonce");
            AuthError::from(e)
        })?;

        let message = SignInMessage::new(&self.settings.statement, &address, &record.nonce);

        tracing::info!(
            address = %address,
            expires_at = %record.expires_at,
            "Nonce issued"
        );

        Ok(NonceChallenge {
            nonce: record.nonce,
            message: message.to_string(),
            expires_at: record.expires_at,
        })
    }

    /// Check a signed sign-in message and, on success, consume the nonce and
    /// open a session for the address.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn verify_login(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<Session, AuthError> {
        tracing::info!(address = %address, "Verify attempt");

        if message.is_empty() || signature.is_empty() {
            tracing::warn!(address = %address, reason = "missing fields", "Login rejected");
            return Err(AuthError::MissingFields);
        }
        let Some(address) = WalletAddress::parse(address) else {
            tracing::warn!(reason = "missing fields", "Login rejected");
            return Err(AuthError::MissingFields);
        };

        let expected = match self.nonces.peek(&address).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::warn!(address = %address, reason = "no outstanding nonce", "Login rejected");
                return Err(AuthError::InvalidNonce);
            }
            Err(e) => {
                tracing::error!(address = %address, error = %e, "Failed to read nonce");
                return Err(e.into());
            }
        };

        if !message_matches(
            self.settings.message_mode,
            message,
            &self.settings.statement,
            &address,
            &expected.nonce,
        ) {
            tracing::warn!(address = %address, reason = "message does not match challenge", "Login rejected");
            return Err(AuthError::InvalidNonce);
        }

        let verification = tokio::time::timeout(
            self.settings.verify_timeout,
            self.verifier.verify(address.as_str(), message, signature),
        )
        .await;

        match verification {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                tracing::warn!(address = %address, reason = "signature mismatch", "Login rejected");
                return Err(AuthError::InvalidSignature);
            }
            Ok(Err(e)) => {
                tracing::error!(address = %address, error = %e, "Signature verification failed");
                return Err(e.into());
            }
            Err(_) => {
                tracing::error!(
                    address = %address,
                    timeout_ms = self.settings.verify_timeout.as_millis() as u64,
                    "Signature verification timed out"
                );
                return Err(AuthError::Internal(
                    "signature verification timed out".to_string(),
                ));
            }
        }

        // Another request may have consumed or replaced the nonce while the
        // signature was being checked
        let consumed = self
            .nonces
            .take_if_matches(&address, &expected.nonce)
            .await
            .map_err(|e| {
                tracing::error!(address = %address, error = %e, "Failed to consume nonce");
                AuthError::from(e)
            })?;

        if !consumed {
            tracing::warn!(address = %address, reason = "nonce already consumed", "Login rejected");
            return Err(AuthError::InvalidNonce);
        }

        let session = Session::for_address(address);
        tracing::info!(address = %session.address(), "Login success");

        Ok(session)
    }

    /// Number of nonces currently outstanding
    pub async fn outstanding_nonces(&self) -> Result<usize, AuthError> {
        Ok(self.nonces.len().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::crypto::{
        address_from_verifying_key, hash_personal_message, EthereumSignatureVerifier,
    };
    use crate::auth::nonce::InMemoryNonceStore;
    use async_trait::async_trait;
    use k256::ecdsa::SigningKey;

    struct Wallet {
        key: SigningKey,
        address: String,
    }

    impl Wallet {
        fn random() -> Self {
            let key = SigningKey::random(&mut rand::thread_rng());
            let address = address_from_verifying_key(key.verifying_key());
            Self { key, address }
        }

        fn checksum_style_address(&self) -> String {
            format!("0x{}", self.address[2..].to_uppercase())
        }

        fn sign(&self, message: &str) -> String {
            let digest = hash_personal_message(message.as_bytes());
            let (signature, recovery_id) = self.key.sign_prehash_recoverable(&digest).unwrap();
            let mut bytes = signature.to_bytes().to_vec();
            bytes.push(recovery_id.to_byte() + 27);
            format!("0x{}", hex::encode(bytes))
        }
    }

    fn service_with(store: Arc<dyn NonceStore>, settings: AuthSettings) -> AuthService {
        AuthService::new(store, Arc::new(EthereumSignatureVerifier::new()), settings)
    }

    fn service() -> (AuthService, Arc<InMemoryNonceStore>) {
        let store = Arc::new(InMemoryNonceStore::new(Duration::from_secs(300)));
        (service_with(store.clone(), AuthSettings::default()), store)
    }

    struct FailingVerifier;

    #[async_trait]
    impl SignatureVerifier for FailingVerifier {
        async fn verify(
            &self,
            _address: &str,
            _message: &str,
            _signature: &str,
        ) -> Result<bool, VerifierError> {
            Err(VerifierError::Internal("rpc node unreachable".to_string()))
        }
    }

    struct SlowVerifier;

    #[async_trait]
    impl SignatureVerifier for SlowVerifier {
        async fn verify(
            &self,
            _address: &str,
            _message: &str,
            _signature: &str,
        ) -> Result<bool, VerifierError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_request_nonce_is_peekable() {
        let (service, store) = service();
        let wallet = Wallet::random();

        let challenge = service
            .request_nonce(Some(&wallet.checksum_style_address()))
            .await
            .unwrap();

        let address = WalletAddress::parse(&wallet.address).unwrap();
        let stored = store.peek(&address).await.unwrap().unwrap();
        assert_eq!(stored.nonce, challenge.nonce);
        assert_eq!(
            challenge.message,
            format!(
                "Sign in to Web3 Login\nAddress: {}\nNonce: {}",
                wallet.address, challenge.nonce
            )
        );
    }

    #[tokio::test]
    async fn test_request_nonce_requires_address() {
        let (service, _) = service();

        assert!(matches!(
            service.request_nonce(None).await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            service.request_nonce(Some("  ")).await,
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_successful_login() {
        let (service, store) = service();
        let wallet = Wallet::random();

        let challenge = service
            .request_nonce(Some(&wallet.checksum_style_address()))
            .await
            .unwrap();
        let signature = wallet.sign(&challenge.message);

        let session = service
            .verify_login(
                &wallet.checksum_style_address(),
                &challenge.message,
                &signature,
            )
            .await
            .unwrap();

        assert_eq!(session.value(), format!("user:{}", wallet.address));
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let (service, _) = service();

        for (address, message, signature) in [
            ("", "m", "s"),
            ("0xabc", "", "s"),
            ("0xabc", "m", ""),
            (" ", "m", "s"),
        ] {
            assert!(matches!(
                service.verify_login(address, message, signature).await,
                Err(AuthError::MissingFields)
            ));
        }
    }

    #[tokio::test]
    async fn test_no_outstanding_nonce() {
        let (service, _) = service();
        let wallet = Wallet::random();
        let message = "Sign in to Web3 Login\nAddress: x\nNonce: n1";

        let result = service
            .verify_login(&wallet.address, message, &wallet.sign(message))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidNonce)));
    }

    #[tokio::test]
    async fn test_reissued_nonce_invalidates_previous() {
        let (service, _) = service();
        let wallet = Wallet::random();

        let first = service.request_nonce(Some(&wallet.address)).await.unwrap();
        let _second = service.request_nonce(Some(&wallet.address)).await.unwrap();

        let result = service
            .verify_login(&wallet.address, &first.message, &wallet.sign(&first.message))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidNonce)));
    }

    #[tokio::test]
    async fn test_message_without_nonce_is_rejected() {
        let (service, _) = service();
        let wallet = Wallet::random();
        service.request_nonce(Some(&wallet.address)).await.unwrap();

        let message = format!("Sign in to Web3 Login\nAddress: {}\nNonce: guess", wallet.address);
        let result = service
            .verify_login(&wallet.address, &message, &wallet.sign(&message))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidNonce)));
    }

    #[tokio::test]
    async fn test_signature_from_other_key_is_rejected() {
        let (service, store) = service();
        let wallet = Wallet::random();
        let attacker = Wallet::random();

        let challenge = service.request_nonce(Some(&wallet.address)).await.unwrap();
        let result = service
            .verify_login(
                &wallet.address,
                &challenge.message,
                &attacker.sign(&challenge.message),
            )
            .await;

        assert!(matches!(result, Err(AuthError::InvalidSignature)));
        // A failed signature does not burn the nonce
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_nonce_is_single_use() {
        let (service, _) = service();
        let wallet = Wallet::random();

        let challenge = service.request_nonce(Some(&wallet.address)).await.unwrap();
        let signature = wallet.sign(&challenge.message);

        service
            .verify_login(&wallet.address, &challenge.message, &signature)
            .await
            .unwrap();

        let replay = service
            .verify_login(&wallet.address, &challenge.message, &signature)
            .await;
        assert!(matches!(replay, Err(AuthError::InvalidNonce)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_verification_succeeds_once() {
        let (service, _) = service();
        let wallet = Wallet::random();

        let challenge = service.request_nonce(Some(&wallet.address)).await.unwrap();
        let signature = wallet.sign(&challenge.message);

        let spawn_verify = || {
            let service = service.clone();
            let address = wallet.address.clone();
            let message = challenge.message.clone();
            let signature = signature.clone();
            tokio::spawn(async move { service.verify_login(&address, &message, &signature).await })
        };

        let (a, b) = tokio::join!(spawn_verify(), spawn_verify());
        let results = [a.unwrap(), b.unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let invalid_nonces = results
            .iter()
            .filter(|r| matches!(r, Err(AuthError::InvalidNonce)))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(invalid_nonces, 1);
    }

    #[tokio::test]
    async fn test_expired_nonce_is_rejected() {
        let store = Arc::new(InMemoryNonceStore::new(Duration::ZERO));
        let service = service_with(store, AuthSettings::default());
        let wallet = Wallet::random();

        let challenge = service.request_nonce(Some(&wallet.address)).await.unwrap();
        let result = service
            .verify_login(
                &wallet.address,
                &challenge.message,
                &wallet.sign(&challenge.message),
            )
            .await;

        assert!(matches!(result, Err(AuthError::InvalidNonce)));
    }

    #[tokio::test]
    async fn test_lenient_mode_accepts_any_message_with_nonce() {
        let store = Arc::new(InMemoryNonceStore::new(Duration::from_secs(300)));
        let settings = AuthSettings {
            message_mode: MessageMode::Lenient,
            ..AuthSettings::default()
        };
        let service = service_with(store, settings);
        let wallet = Wallet::random();

        let challenge = service.request_nonce(Some(&wallet.address)).await.unwrap();
        let message = format!("Welcome! Your one-time code is {}", challenge.nonce);

        service
            .verify_login(&wallet.address, &message, &wallet.sign(&message))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_verifier_fault_is_internal_error() {
        let store = Arc::new(InMemoryNonceStore::new(Duration::from_secs(300)));
        let service = AuthService::new(store, Arc::new(FailingVerifier), AuthSettings::default());

        let challenge = service.request_nonce(Some("0xabc")).await.unwrap();
        let result = service
            .verify_login("0xabc", &challenge.message, "0x00")
            .await;

        assert!(matches!(result, Err(AuthError::Internal(_))));
    }

    #[tokio::test]
    async fn test_verifier_timeout_is_internal_error() {
        let store = Arc::new(InMemoryNonceStore::new(Duration::from_secs(300)));
        let settings = AuthSettings {
            verify_timeout: Duration::from_millis(50),
            ..AuthSettings::default()
        };
        let service = AuthService::new(store.clone(), Arc::new(SlowVerifier), settings);

        let challenge = service.request_nonce(Some("0xabc")).await.unwrap();
        let result = service
            .verify_login("0xabc", &challenge.message, "0x00")
            .await;

        assert!(matches!(result, Err(AuthError::Internal(_))));
        assert_eq!(service.outstanding_nonces().await.unwrap(), 1);
    }
}
