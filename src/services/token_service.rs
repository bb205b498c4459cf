//! Token authority for shareable links.
//!
//! A token is `hex(HMAC-SHA256(secret, object_name))`. It is a pure function of
//! the shared secret and the stored object name, so verification never needs
//! to look anything up: the expected token is simply derived again.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Length of a hex-encoded token (SHA-256 digest, two chars per byte).
pub const TOKEN_HEX_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token secret is not configured")]
    MissingSecret,
}

/// Derive the access token for `object_name` under `secret`.
pub fn derive_token(secret: &str, object_name: &str) -> Result<String, TokenError> {
    let mac = keyed_mac(secret, object_name)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check `presented` against the token derived for `object_name`.
///
/// The digest comparison is constant-time. Tokens that are not valid hex or
/// have the wrong length are rejected without error; only a missing secret is
/// reported as a failure.
pub fn verify_token(secret: &str, object_name: &str, presented: &str) -> Result<bool, TokenError> {
    let mac = keyed_mac(secret, object_name)?;
    if presented.len() != TOKEN_HEX_LEN {
        return Ok(false);
    }
    let Ok(tag) = hex::decode(presented) else {
        return Ok(false);
    };
    Ok(mac.verify_slice(&tag).is_ok())
}

fn keyed_mac(secret: &str, object_name: &str) -> Result<HmacSha256, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::MissingSecret)?;
    mac.update(object_name.as_bytes());
    Ok(mac)
}

/// Holds the configured secret so callers don't thread it through every call.
///
/// An absent secret is allowed at construction; it surfaces as
/// [`TokenError::MissingSecret`] the first time a token is needed.
#[derive(Clone)]
pub struct TokenAuthority {
    secret: Option<String>,
}

impl TokenAuthority {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    pub fn derive(&self, object_name: &str) -> Result<String, TokenError> {
        derive_token(self.secret()?, object_name)
    }

    pub fn verify(&self, object_name: &str, presented: &str) -> Result<bool, TokenError> {
        verify_token(self.secret()?, object_name, presented)
    }

    fn secret(&self) -> Result<&str, TokenError> {
        self.secret.as_deref().ok_or(TokenError::MissingSecret)
    }
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("configured", &self.is_configured())
            .finish()
    }
}
