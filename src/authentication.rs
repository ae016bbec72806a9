use std::sync::Arc;

use crate::db_helpers::get_user_by_id;
use crate::errors::RequestError;
use crate::roles::Role;
use crate::AppState;
use anyhow::{Context, Result};
use argon2::PasswordVerifier;
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, warn};

const JWT_EXPIRY_DURATION: time::Duration = time::Duration::days(90);

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaim {
    id: i64,
    exp: i64,
}

/// A caller with a valid token whose account is still active.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
    pub token: String,
}

/// Like [`AuthUser`] but only admits admins.
pub struct AdminUser(pub AuthUser);

/// Routes that work anonymously but personalise for a signed-in caller.
pub struct MaybeUser(pub Option<i64>);

impl MaybeUser {
    pub fn get_id(&self) -> Option<i64> {
        self.0
    }
}

fn app_state(parts: &Parts) -> Result<Arc<AppState>, RequestError> {
    parts.extensions.get::<Arc<AppState>>().cloned().ok_or_else(|| {
        warn!("AppState extension missing from request");
        RequestError::ServerError
    })
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, RequestError> {
    let header = match parts.headers.get("Authorization") {
        Some(header) => header,
        None => return Ok(None),
    };
    let header = header.to_str().map_err(|_| {
        debug!("Error converting header to str");
        RequestError::NotAuthorized("Invalid token")
    })?;
    match header.strip_prefix("Bearer ") {
        Some(token) => Ok(Some(token)),
        None => {
            debug!("Authorization header is not a bearer token");
            Err(RequestError::NotAuthorized("Invalid token"))
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let state = app_state(parts)?;
        match bearer_token(parts)? {
            Some(token) => Ok(MaybeUser(Some(verify_jwt_token(
                token,
                &state.config.jwt_secret,
            )?))),
            None => Ok(MaybeUser(None)),
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let state = app_state(parts)?;
        let token = bearer_token(parts)?.ok_or(RequestError::NotAuthorized("Need to be authorized"))?;
        let id = verify_jwt_token(token, &state.config.jwt_secret)?;

        let user = get_user_by_id(&state.pool, id)
            .await?
            .ok_or(RequestError::NotAuthorized("User not found"))?;
        if !user.is_active {
            return Err(RequestError::Deactivated);
        }
        let role = Role::from_code(user.user_type).map_err(|e| {
            warn!(user_id = id, "{}", e);
            RequestError::ServerError
        })?;

        Ok(AuthUser {
            id,
            role,
            token: token.to_string(),
        })
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(RequestError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

pub fn get_jwt_token(id: i64, jwt_secret: &str) -> Result<String> {
    let expiry_date = OffsetDateTime::now_utc() + JWT_EXPIRY_DURATION;
    let claim = AuthClaim {
        id,
        exp: expiry_date.unix_timestamp(),
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .context("Failed to generate jwt token")
}

pub fn verify_jwt_token(token: &str, jwt_secret: &str) -> Result<i64, RequestError> {
    let token_data = jsonwebtoken::decode::<AuthClaim>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(jwt_secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .map_err(|e| {
        debug!("Error verifying token: {}", e);
        RequestError::NotAuthorized("Invalid Token")
    })?;
    let claim = token_data.claims;
    if claim.exp < OffsetDateTime::now_utc().unix_timestamp() {
        return Err(RequestError::NotAuthorized("Token expired"));
    }
    Ok(claim.id)
}

pub async fn verify_password_argon2(password: String, hash: &str) -> Result<bool> {
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to verify password"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}
