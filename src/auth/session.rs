//! Session credential issued after a successful sign-in

use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::models::WalletAddress;

pub const SESSION_COOKIE_NAME: &str = "session";

/// Session bound to a verified wallet address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    address: WalletAddress,
}

impl Session {
    pub fn for_address(address: WalletAddress) -> Self {
        Self { address }
    }

    pub fn address(&self) -> &WalletAddress {
        &self.address
    }

    /// Cookie value, `user:<address>`
    pub fn value(&self) -> String {
        format!("user:{}", self.address)
    }

    /// HttpOnly, SameSite=Lax cookie scoped to `/`.
    pub fn to_cookie(&self, secure: bool) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, self.value()))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .secure(secure)
            .build()
    }
}
