// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use taskflow_common::UserProfile;
use tracing::debug;
use uuid::Uuid;

use crate::database;
use crate::handlers::AppError;
use crate::state::AppState;

/// Hashes a password with a fresh random salt, as `salt$hexdigest`.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = salted_digest(&salt, password);
    format!("{}${}", salt, digest)
}

/// Checks a password against a stored `salt$hexdigest`. The digests are
/// compared in constant time.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => salted_digest(salt, password)
            .as_bytes()
            .ct_eq(digest.as_bytes())
            .into(),
        None => false,
    }
}

fn salted_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn new_session_token() -> String {
    Uuid::new_v4().to_string()
}

/// Token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The authenticated caller. Extracting it rejects the request with 401
/// unless it carries a live session token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: UserProfile,
    pub token: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let unauthorized = || AppError::new(StatusCode::UNAUTHORIZED, "Not authenticated");

        let token = bearer_token(parts).ok_or_else(unauthorized)?.to_string();
        let user = database::find_session_user(&state.pool, &token, Utc::now())
            .await?
            .ok_or_else(|| {
                debug!("Rejected unknown or expired session token");
                unauthorized()
            })?;

        Ok(Self { user, token })
    }
}
