// src/services/token.rs

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::auth::{AccessClaims, RefreshClaims, TokenUse};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("expected a {expected:?} token")]
    WrongTokenUse { expected: TokenUse },

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("token lifetime {0} is out of range")]
    LifetimeOutOfRange(Duration),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::TokenExpired,
            TokenError::Signing(e) => AppError::JwtError(e),
            e @ TokenError::LifetimeOutOfRange(_) => AppError::InternalServerError(e.into()),
            TokenError::InvalidSignature | TokenError::Malformed(_) | TokenError::WrongTokenUse { .. } => {
                AppError::InvalidToken
            }
        }
    }
}

/// What goes into an access token besides the standard fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessGrant {
    pub user_id: Uuid,
    pub employee_id: Option<i64>,
    pub org_id: Option<i64>,
    pub employee_status: String,
    pub perms: BTreeSet<String>,
}

trait TokenClaims: Serialize + DeserializeOwned {
    const USE: TokenUse;
    fn token_use(&self) -> TokenUse;
}

impl TokenClaims for AccessClaims {
    const USE: TokenUse = TokenUse::Access;
    fn token_use(&self) -> TokenUse {
        self.token_use
    }
}

impl TokenClaims for RefreshClaims {
    const USE: TokenUse = TokenUse::Refresh;
    fn token_use(&self) -> TokenUse {
        self.token_use
    }
}

/// HS256 encoder/decoder for access and refresh tokens. Pure apart from the
/// clock; never touches storage.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer,
            validation,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn sign_access_token(&self, grant: &AccessGrant, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = expires_at(now, ttl)?;
        let claims = AccessClaims {
            user_id: grant.user_id,
            employee_id: grant.employee_id,
            org_id: grant.org_id,
            employee_status: grant.employee_status.clone(),
            perms: grant.perms.clone(),
            token_use: TokenUse::Access,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp,
        };
        self.sign(&claims)
    }

    pub fn sign_refresh_token(&self, user_id: Uuid, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = expires_at(now, ttl)?;
        let claims = RefreshClaims {
            user_id,
            token_use: TokenUse::Refresh,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp,
        };
        self.sign(&claims)
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.verify(token)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.verify(token)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(TokenError::Signing)
    }

    fn verify<T: TokenClaims>(&self, token: &str) -> Result<T, TokenError> {
        let data = decode::<T>(token, &self.decoding_key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed(e.to_string()),
        })?;

        if data.claims.token_use() != T::USE {
            return Err(TokenError::WrongTokenUse { expected: T::USE });
        }
        Ok(data.claims)
    }
}

fn expires_at(now: DateTime<Utc>, ttl: Duration) -> Result<i64, TokenError> {
    now.checked_add_signed(ttl)
        .map(|exp| exp.timestamp())
        .ok_or(TokenError::LifetimeOutOfRange(ttl))
}
