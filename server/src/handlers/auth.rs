// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use taskflow_common::UserProfile;
use tracing::{debug, info};

use super::{AppError, AppJson};
use crate::auth::{self, AuthUser};
use crate::database;
use crate::state::AppState;

const MAX_USERNAME_LEN: usize = 100;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Deserialize, Debug)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Handler for creating an account.
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterPayload>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let username = payload.username.trim();
    let email = payload.email.trim().to_lowercase();
    debug!("Received registration request for {}", username);

    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::bad_request(
            "Username must be between 1 and 100 characters.",
        ));
    }
    if !email.contains('@') {
        return Err(AppError::bad_request("A valid email is required."));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(
            "Password must be at least 6 characters.",
        ));
    }

    let hash = auth::hash_password(&payload.password);
    match database::create_user(&state.pool, username, &email, &hash).await? {
        Some(user) => {
            info!("User registered successfully with ID: {}", user.id);
            Ok((
                StatusCode::CREATED,
                Json(json!({ "success": true, "message": "User registered successfully" })),
            ))
        }
        None => Err(AppError::new(
            StatusCode::CONFLICT,
            "Username or email already registered.",
        )),
    }
}

/// Handler for exchanging credentials for a session token.
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = payload.email.trim().to_lowercase();
    let invalid = || AppError::new(StatusCode::UNAUTHORIZED, "Invalid email or password.");

    let (user, hash) = database::find_user_credentials(&state.pool, &email)
        .await?
        .ok_or_else(invalid)?;
    if !auth::verify_password(&payload.password, &hash) {
        debug!("Wrong password for user {}", user.id);
        return Err(invalid());
    }

    let token = auth::new_session_token();
    let expires_at = Utc::now() + state.session_ttl;
    database::create_session(&state.pool, user.id, &token, expires_at).await?;
    info!("User {} logged in", user.id);

    Ok(Json(LoginResponse { token, user }))
}

/// Handler for ending the current session.
pub async fn logout(State(state): State<AppState>, caller: AuthUser) -> Result<StatusCode, AppError> {
    database::delete_session(&state.pool, &caller.token).await?;
    info!("User {} logged out", caller.user.id);
    Ok(StatusCode::NO_CONTENT)
}
