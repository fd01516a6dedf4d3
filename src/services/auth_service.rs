use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;

const SESSION_TTL_HOURS: i64 = 8;

/// Single-account login settings, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub username: String,
    pub password_hash: Option<String>,
    pub session_secret: String,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let username =
            std::env::var("AUTH_USERNAME").unwrap_or_else(|_| "guestuser".to_string());
        let password_hash = std::env::var("AUTH_PASSWORD_HASH").ok();
        if password_hash.is_none() {
            warn!("⚠️ AUTH_PASSWORD_HASH not set, logins will be rejected");
        }
        let session_secret = std::env::var("SESSION_SECRET").unwrap_or_else(|_| {
            warn!("⚠️ SESSION_SECRET not set, using an ephemeral secret; sessions reset on restart");
            let bytes: [u8; 32] = rand::random();
            bytes.iter().map(|b| format!("{b:02x}")).collect()
        });
        Self {
            username,
            password_hash,
            session_secret,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Verifies credentials against the configured account and returns a signed
/// session token on success.
pub fn verify_login(
    config: &AuthConfig,
    username: &str,
    password: &str,
) -> Result<String, AppError> {
    let Some(stored) = config.password_hash.as_deref() else {
        return Err(AppError::Unauthorized);
    };
    if username != config.username {
        return Err(AppError::Unauthorized);
    }
    let parsed = PasswordHash::new(stored)
        .map_err(|e| anyhow::anyhow!("AUTH_PASSWORD_HASH is not a valid PHC string: {}", e))?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_err()
    {
        return Err(AppError::Unauthorized);
    }
    issue_token(config, username)
}

fn issue_token(config: &AuthConfig, username: &str) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: username.to_string(),
        iat: now,
        exp: now + SESSION_TTL_HOURS * 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("session token signing failed: {}", e)))
}

/// Decodes and validates a session token, rejecting bad signatures and
/// expired sessions.
pub fn check_session(config: &AuthConfig, token: &str) -> Result<SessionClaims, AppError> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.session_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

/// PHC-format argon2 hash for a plaintext password. Used to provision the
/// AUTH_PASSWORD_HASH value.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))
}
