//! Bearer-token extractor guarding the back-office routes.
//!
//! Every service-entry route and the password change take an [`AuthUser`].
//! A request without a usable token never reaches the desk.

use autoservice_core::error::CoreError;
use autoservice_core::types::DbId;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

const BEARER_SCHEME: &str = "bearer";

/// Why a request was turned away before any operation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    MissingHeader,
    MalformedHeader,
    InvalidToken,
}

impl TokenRejection {
    pub fn message(self) -> &'static str {
        match self {
            Self::MissingHeader => "Missing Authorization header",
            Self::MalformedHeader => "Invalid Authorization format. Expected: Bearer <token>",
            Self::InvalidToken => "Invalid or expired token",
        }
    }
}

impl From<TokenRejection> for AppError {
    fn from(rejection: TokenRejection) -> Self {
        AppError::Core(CoreError::Unauthorized(rejection.message().into()))
    }
}

/// The back-office user a request acts for, taken from the token claims.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub username: String,
}

/// Pull the token out of `Authorization: Bearer <token>`. The scheme is
/// matched case-insensitively; an empty token counts as malformed.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, TokenRejection> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(TokenRejection::MissingHeader)?
        .to_str()
        .map_err(|_| TokenRejection::MalformedHeader)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(TokenRejection::MalformedHeader)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) || token.is_empty() {
        return Err(TokenRejection::MalformedHeader);
    }
    Ok(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).inspect_err(|rejection| {
            tracing::debug!(uri = %parts.uri, ?rejection, "Request without usable token");
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|e| {
            tracing::debug!(uri = %parts.uri, error = %e, "Token validation failed");
            TokenRejection::InvalidToken
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            username: claims.username,
        })
    }
}
