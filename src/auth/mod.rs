//! Authentication module for the Web3 login server
//!
//! Provides wallet-based sign-in for EVM addresses.
//! - Challenge-response authentication with single-use, expiring nonces
//! - EIP-191 personal message signature recovery
//! - Cookie-delivered sessions

mod crypto;
mod message;
mod nonce;
mod service;
mod session;

pub use crypto::{
    address_from_verifying_key, hash_personal_message, keccak256, recover_personal_signer,
    CryptoError, EthereumSignatureVerifier, SignatureVerifier, VerifierError,
};
pub use message::{message_matches, MessageMode, SignInMessage};
pub use nonce::{generate_nonce, spawn_nonce_sweeper, InMemoryNonceStore, NonceStore, NonceStoreError};
pub use service::{AuthError, AuthService, AuthSettings};
pub use session::{Session, SESSION_COOKIE_NAME};
