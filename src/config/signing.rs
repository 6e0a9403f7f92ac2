//! Request signing key derived from the authentication token.
//!
//! # Security
//! - Key material is never logged or serialized
//! - The key is rebuilt only by [`ConfigStore`](crate::config::ConfigStore)
//!   when the token changes

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::schema::AuthToken;

/// HMAC-SHA256 key used to sign and validate panel requests.
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    pub const ALGORITHM: Algorithm = Algorithm::HS256;

    /// Derive the key from a token's raw bytes.
    pub fn derive(token: &AuthToken) -> Self {
        Self {
            encoding: EncodingKey::from_secret(token.as_bytes()),
            decoding: DecodingKey::from_secret(token.as_bytes()),
        }
    }

    pub fn sign<T: Serialize>(&self, claims: &T) -> jsonwebtoken::errors::Result<String> {
        jsonwebtoken::encode(&Header::new(Self::ALGORITHM), claims, &self.encoding)
    }

    /// Validate a token's signature and expiry and return its claims.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> jsonwebtoken::errors::Result<T> {
        let validation = Validation::new(Self::ALGORITHM);
        Ok(jsonwebtoken::decode::<T>(token, &self.decoding, &validation)?.claims)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &Self::ALGORITHM)
            .finish_non_exhaustive()
    }
}
