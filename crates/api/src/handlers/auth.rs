//! Handlers for the `/auth` resource (login, password change).

use autoservice_core::auth::{ChangePasswordRequest, LoginRequest};
use autoservice_core::types::DbId;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::error::{resolve, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Successful authentication response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Public user info embedded in [`AuthResponse`].
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub username: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with username + password. Returns a bearer access token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let cancel = state.request_token();
    let token = resolve(state.desk.login(input, &cancel).await)?;

    Ok(Json(AuthResponse {
        access_token: token.access_token,
        token_type: token.token_type,
        expires_in: state.config.jwt.expires_in_secs(),
        user: UserInfo {
            id: token.user_id,
            username: token.username,
        },
    }))
}

/// POST /api/v1/auth/change-password
///
/// Replace the caller's password after verifying the current one.
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut input): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    // The body never names the account.
    input.user_id = user.user_id;

    let cancel = state.request_token();
    resolve(state.desk.change_password(input, &cancel).await)?;
    Ok(StatusCode::NO_CONTENT)
}
