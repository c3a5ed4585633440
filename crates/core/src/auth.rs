//! Login and password change.
//!
//! Login moves through
//! `received -> structurally validated -> lookup -> verified | rejected ->
//! token issued | failure`. The first transition belongs to the pipeline;
//! the rest happen in [`AuthService`]. An unknown user and a wrong password
//! produce the same failure message.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::clock::Clock;
use crate::entities::canonical_username;
use crate::error::CoreError;
use crate::outcome::Outcome;
use crate::pipeline::{Handler, Request, Structural, ValidationPipeline};
use crate::ports::{cancellable, PasswordHashing, TokenIssuer, UserStore};
use crate::types::DbId;
use crate::validation::rules::{change_password_rules, login_rules};

/// Failure message for both unknown users and wrong passwords.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

pub const CURRENT_PASSWORD_MISMATCH_MESSAGE: &str = "Current password is incorrect";

/// Token type reported alongside issued tokens.
pub const TOKEN_TYPE: &str = "Bearer";

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Credentials submitted to `login`.
#[derive(Clone, Default, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 3, max = 100, message = "Username must be 3 to 100 characters"))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 6, max = 100, message = "Password must be 6 to 100 characters"))]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Request for LoginRequest {
    type Response = AuthToken;
    const NAME: &'static str = "login";
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthToken {
    pub access_token: String,
    pub token_type: String,
    pub user_id: DbId,
    pub username: String,
}

/// Password change for an already authenticated user.
#[derive(Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    /// Taken from the caller's token, never from the body.
    #[serde(skip)]
    pub user_id: DbId,

    #[serde(default)]
    pub current_password: String,

    #[serde(default)]
    #[validate(length(min = 6, max = 100, message = "New password must be 6 to 100 characters"))]
    pub new_password: String,
}

impl std::fmt::Debug for ChangePasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangePasswordRequest")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl Request for ChangePasswordRequest {
    type Response = ();
    const NAME: &'static str = "change_password";
}

pub fn login_pipeline(clock: Arc<dyn Clock>) -> ValidationPipeline<LoginRequest> {
    ValidationPipeline::new(clock)
        .register(Structural)
        .register(login_rules())
}

pub fn change_password_pipeline(clock: Arc<dyn Clock>) -> ValidationPipeline<ChangePasswordRequest> {
    ValidationPipeline::new(clock)
        .register(Structural)
        .register(change_password_rules())
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Authenticates operators and manages their passwords.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    passwords: Arc<dyn PasswordHashing>,
    tokens: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        passwords: Arc<dyn PasswordHashing>,
        tokens: Arc<dyn TokenIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
            clock,
        }
    }

    async fn login(
        &self,
        request: LoginRequest,
        cancel: &CancellationToken,
    ) -> Result<AuthToken, CoreError> {
        let username = canonical_username(&request.username);

        // 1. Lookup.
        let Some(user) = cancellable(cancel, self.users.find_by_username(&username)).await? else {
            tracing::debug!(%username, "Login rejected: unknown user");
            return Err(invalid_credentials());
        };

        // 2. Verify.
        if !self
            .passwords
            .verify(&request.password, user.password_hash())?
        {
            tracing::debug!(user_id = %user.id(), "Login rejected: password mismatch");
            return Err(invalid_credentials());
        }

        // 3. Issue token.
        let access_token = self.tokens.issue(user.id(), user.username())?;
        tracing::info!(user_id = %user.id(), username = %user.username(), "User logged in");

        Ok(AuthToken {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            user_id: user.id(),
            username: user.username().to_string(),
        })
    }

    async fn change_password(
        &self,
        request: ChangePasswordRequest,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        let mut user = cancellable(cancel, self.users.find_by_id(request.user_id))
            .await?
            .ok_or(CoreError::NotFound {
                entity: "user",
                id: request.user_id,
            })?;

        if !self
            .passwords
            .verify(&request.current_password, user.password_hash())?
        {
            return Err(CoreError::Unauthorized(
                CURRENT_PASSWORD_MISMATCH_MESSAGE.into(),
            ));
        }

        let hash = self.passwords.hash(&request.new_password)?;
        user.change_password_hash(hash, self.clock.now())?;

        if cancel.is_cancelled() {
            return Err(crate::error::StoreError::Cancelled.into());
        }
        if !self.users.update_password_hash(&user).await? {
            return Err(CoreError::NotFound {
                entity: "user",
                id: user.id(),
            });
        }

        tracing::info!(user_id = %user.id(), "Password changed");
        Ok(())
    }
}

fn invalid_credentials() -> CoreError {
    CoreError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.into())
}

#[async_trait]
impl Handler<LoginRequest> for AuthService {
    async fn handle(&self, request: LoginRequest, cancel: &CancellationToken) -> Outcome<AuthToken> {
        Outcome::from_core(self.login(request, cancel).await, LoginRequest::NAME)
    }
}

#[async_trait]
impl Handler<ChangePasswordRequest> for AuthService {
    async fn handle(&self, request: ChangePasswordRequest, cancel: &CancellationToken) -> Outcome<()> {
        Outcome::from_core(
            self.change_password(request, cancel).await,
            ChangePasswordRequest::NAME,
        )
    }
}
