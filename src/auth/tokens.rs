//! Signed, time-limited bearer tokens.
//!
//! Tokens are compact JWS strings (`header.claims.signature`, base64url without
//! padding) signed with an HMAC over a shared secret. Validation is stateless:
//! there is no revocation list, so a token stays valid until it expires.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha384, Sha512};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Algorithm {
    #[default]
    #[serde(rename = "HS256")]
    Hs256,
    #[serde(rename = "HS384")]
    Hs384,
    #[serde(rename = "HS512")]
    Hs512,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Hs256 => "HS256",
            Algorithm::Hs384 => "HS384",
            Algorithm::Hs512 => "HS512",
        }
    }

    fn sign(&self, key: &[u8], input: &[u8]) -> Result<Vec<u8>, TokenError> {
        match self {
            Algorithm::Hs256 => sign_with::<Hmac<Sha256>>(key, input),
            Algorithm::Hs384 => sign_with::<Hmac<Sha384>>(key, input),
            Algorithm::Hs512 => sign_with::<Hmac<Sha512>>(key, input),
        }
    }

    fn verify(&self, key: &[u8], input: &[u8], signature: &[u8]) -> bool {
        match self {
            Algorithm::Hs256 => verify_with::<Hmac<Sha256>>(key, input, signature),
            Algorithm::Hs384 => verify_with::<Hmac<Sha384>>(key, input, signature),
            Algorithm::Hs512 => verify_with::<Hmac<Sha512>>(key, input, signature),
        }
    }
}

fn sign_with<M: Mac + KeyInit>(key: &[u8], input: &[u8]) -> Result<Vec<u8>, TokenError> {
    let mut mac = <M as Mac>::new_from_slice(key).map_err(|_| TokenError::InvalidKey)?;
    mac.update(input);
    Ok(mac.finalize().into_bytes().to_vec())
}

// verify_slice compares in constant time.
fn verify_with<M: Mac + KeyInit>(key: &[u8], input: &[u8], signature: &[u8]) -> bool {
    match <M as Mac>::new_from_slice(key) {
        Ok(mut mac) => {
            mac.update(input);
            mac.verify_slice(signature).is_ok()
        }
        Err(_) => false,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct Header {
    alg: String,
    typ: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    Format,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unexpected algorithm: {0}")]
    Algorithm(String),
    #[error("invalid signing key")]
    InvalidKey,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token has no usable subject")]
    Subject,
    #[error("token expired")]
    Expired,
    #[error("token lifetime out of range")]
    Lifetime,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Issues and validates access tokens for a single secret/algorithm pair.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
    algorithm: Algorithm,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>, algorithm: Algorithm, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            algorithm,
            ttl,
        }
    }

    /// Lifetime given to tokens issued at login.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: i64, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now(), ttl)
    }

    pub fn issue_at(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let header = Header {
            alg: self.algorithm.as_str().to_string(),
            typ: "JWT".to_string(),
        };
        let exp = now.checked_add_signed(ttl).ok_or(TokenError::Lifetime)?;
        let claims = Claims {
            sub: Some(user_id.to_string()),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        self.encode(&header, &claims)
    }

    fn encode(&self, header: &Header, claims: &Claims) -> Result<String, TokenError> {
        let signing_input = format!("{}.{}", b64e_json(header)?, b64e_json(claims)?);
        let signature = self.algorithm.sign(&self.secret, signing_input.as_bytes())?;
        let signature_b64 = Base64UrlUnpadded::encode_string(&signature);
        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Verify signature and expiry, returning the user id in the subject.
    pub fn validate(&self, token: &str) -> Result<i64, TokenError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<i64, TokenError> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(TokenError::Format)?;
        let claims_b64 = parts.next().ok_or(TokenError::Format)?;
        let sig_b64 = parts.next().ok_or(TokenError::Format)?;
        if parts.next().is_some() {
            return Err(TokenError::Format);
        }

        let header: Header = b64d_json(header_b64)?;
        if header.alg != self.algorithm.as_str() {
            return Err(TokenError::Algorithm(header.alg));
        }

        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| TokenError::Base64)?;
        let signing_input = format!("{header_b64}.{claims_b64}");
        if !self
            .algorithm
            .verify(&self.secret, signing_input.as_bytes(), &signature)
        {
            return Err(TokenError::InvalidSignature);
        }

        let claims: Claims = b64d_json(claims_b64)?;
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        claims
            .sub
            .as_deref()
            .and_then(|sub| sub.parse::<i64>().ok())
            .ok_or(TokenError::Subject)
    }
}
