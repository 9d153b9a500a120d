//! Bearer tokens: compact HS256 JWTs carrying only the user id and expiry.
//!
//! The role is never a claim; extractors read it from the store on every
//! request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use super::AuthError;

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct Header { alg: String }

/// Issues and verifies tokens with one shared secret.
pub struct TokenSigner {
    secret: SecretString,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: SecretString, ttl: Duration) -> Self { Self { secret, ttl } }

    pub fn ttl(&self) -> Duration { self.ttl }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes()).map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, AuthError> { self.issue_at(user_id, Utc::now()) }

    pub fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims { sub: user_id, iat: now.timestamp(), exp: (now + self.ttl).timestamp() };
        let payload = serde_json::to_vec(&claims).map_err(|e| AuthError::Signing(e.to_string()))?;
        let signing_input = format!("{}.{}", URL_SAFE_NO_PAD.encode(HEADER), URL_SAFE_NO_PAD.encode(payload));
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{signing_input}.{signature}"))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> { self.verify_at(token, Utc::now()) }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let (signing_input, signature) = token.rsplit_once('.').ok_or(AuthError::InvalidToken)?;
        let (header, payload) = signing_input.split_once('.').ok_or(AuthError::InvalidToken)?;
        if payload.contains('.') { return Err(AuthError::InvalidToken); }

        let header: Header = decode_json(header)?;
        if header.alg != "HS256" { return Err(AuthError::InvalidToken); }

        let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| AuthError::InvalidToken)?;
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        // Constant-time comparison
        mac.verify_slice(&signature).map_err(|_| AuthError::InvalidToken)?;

        let claims: Claims = decode_json(payload)?;
        if claims.exp <= now.timestamp() { return Err(AuthError::TokenExpired); }
        Ok(claims)
    }
}

fn decode_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|_| AuthError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidToken)
}
