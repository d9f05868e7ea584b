//! Session data derived from the user's access token

use chrono::Utc;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Claims the client reads from the access token
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    exp: Option<i64>,
}

/// The authenticated user's session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// The bearer token sent with every request
    pub access_token: String,

    /// The id of the user owning every space and item
    pub user_id: String,

    /// The expiry timestamp in seconds since the epoch
    pub expires_at: Option<i64>,
}

impl Session {
    /// Create a session by reading the `sub` and `exp` claims of a JWT.
    ///
    /// The signature is not checked: the server remains the authority and
    /// answers 401 for forged or expired tokens.
    pub fn from_access_token(token: &str) -> Result<Self> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
        if data.claims.sub.trim().is_empty() {
            return Err(Error::unauthorized("access token has no subject"));
        }

        Ok(Self {
            access_token: token.to_string(),
            user_id: data.claims.sub,
            expires_at: data.claims.exp,
        })
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now().timestamp() >= expires_at,
            None => false,
        }
    }
}
