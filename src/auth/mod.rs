use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config;

/// Discriminates the two token flavors issued at login. The middleware only
/// accepts access tokens; the refresh endpoint only accepts refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }

    fn ttl_secs(&self) -> i64 {
        let security = &config::config().security;
        match self {
            TokenKind::Access => security.access_token_ttl_secs,
            TokenKind::Refresh => security.refresh_token_ttl_secs,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub kind: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: i64, username: String, kind: TokenKind) -> Self {
        Self::with_ttl(user_id, username, kind, kind.ttl_secs())
    }

    fn with_ttl(user_id: i64, username: String, kind: TokenKind, ttl_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            username,
            kind: kind.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        }
    }
}

#[derive(Debug)]
pub enum TokenError {
    Generation(String),
    Invalid(String),
    MissingSecret,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Generation(msg) => write!(f, "token generation error: {}", msg),
            TokenError::Invalid(msg) => write!(f, "invalid token: {}", msg),
            TokenError::MissingSecret => write!(f, "JWT secret not configured"),
        }
    }
}

impl std::error::Error for TokenError {}

fn secret() -> Result<&'static str, TokenError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }
    Ok(secret)
}

/// Sign a token for the given user identity.
pub fn issue_token(user_id: i64, username: &str, kind: TokenKind) -> Result<String, TokenError> {
    encode_claims(&Claims::new(user_id, username.to_string(), kind))
}

fn encode_claims(claims: &Claims) -> Result<String, TokenError> {
    let encoding_key = EncodingKey::from_secret(secret()?.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| TokenError::Generation(e.to_string()))
}

/// Validate signature and expiry, and require the expected token kind.
pub fn verify_token(token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| TokenError::Invalid(e.to_string()))?;

    if token_data.claims.kind != expected.as_str() {
        return Err(TokenError::Invalid(format!(
            "expected {} token",
            expected.as_str()
        )));
    }
    Ok(token_data.claims)
}

/// Hash a new password as `salt$hex(sha256(salt:password))`.
pub fn generate_password_hash(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!("{}${}", salt, digest(&salt, password))
}

/// Check a login attempt against a stored `salt$digest` value.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => digest(salt, password) == expected,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    let out = hasher.finalize();
    out.iter().map(|b| format!("{:02x}", b)).collect()
}
