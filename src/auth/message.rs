//! Sign-in message format
//!
//! The message a wallet signs is three lines:
//!
//! ```text
//! Sign in to Web3 Login
//! Address: 0xabc...
//! Nonce: 4f1c...
//! ```

use std::fmt;

use crate::models::WalletAddress;

const ADDRESS_PREFIX: &str = "Address: ";
const NONCE_PREFIX: &str = "Nonce: ";

/// How a submitted message is matched against the issued challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageMode {
    /// The message must be exactly the sign-in template for this address and nonce.
    #[default]
    Strict,
    /// The message only has to contain the nonce somewhere.
    Lenient,
}

impl MessageMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Some(MessageMode::Strict),
            "lenient" => Some(MessageMode::Lenient),
            _ => None,
        }
    }
}

/// Structured sign-in message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInMessage {
    pub statement: String,
    pub address: String,
    pub nonce: String,
}

impl SignInMessage {
    pub fn new(statement: &str, address: &WalletAddress, nonce: &str) -> Self {
        Self {
            statement: statement.to_string(),
            address: address.to_string(),
            nonce: nonce.to_string(),
        }
    }

    /// Parse a message in the sign-in format. Returns `None` on any deviation,
    /// including `\r\n` line endings and a trailing newline.
    pub fn parse(message: &str) -> Option<Self> {
        if message.contains('\r') {
            return None;
        }
        let mut lines = message.split('\n');

        let statement = lines.next()?;
        let address = lines.next()?.strip_prefix(ADDRESS_PREFIX)?;
        let nonce = lines.next()?.strip_prefix(NONCE_PREFIX)?;

        if lines.next().is_some() || statement.is_empty() || nonce.is_empty() {
            return None;
        }

        Some(Self {
            statement: statement.to_string(),
            address: address.to_string(),
            nonce: nonce.to_string(),
        })
    }
}

impl fmt::Display for SignInMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}{}\n{}{}",
            self.statement, ADDRESS_PREFIX, self.address, NONCE_PREFIX, self.nonce
        )
    }
}

/// Check that `message` answers the challenge `(statement, address, nonce)`.
pub fn message_matches(
    mode: MessageMode,
    message: &str,
    statement: &str,
    address: &WalletAddress,
    nonce: &str,
) -> bool {
    match mode {
        MessageMode::Lenient => message.contains(nonce),
        MessageMode::Strict => match SignInMessage::parse(message) {
            Some(parsed) => {
                parsed.statement == statement
                    && WalletAddress::parse(&parsed.address).as_ref() == Some(address)
                    && parsed.nonce == nonce
            }
            None => false,
        },
    }
}
