//! Startup provisioning of the operator account.
//!
//! Seed credentials arrive in an explicit [`ProvisioningConfig`]; nothing is
//! read from the environment here.

use chrono::Utc;

use crate::auth::LoginRequest;
use crate::entities::{canonical_username, User};
use crate::error::{CoreError, DomainError, StoreError};
use crate::pipeline::{RequestValidator, Structural};
use crate::ports::{PasswordHashing, UserStore, USERNAME_CONSTRAINT};
use crate::validation::rules::login_rules;
use crate::validation::{ValidationContext, ValidationErrors};

/// Default operator username.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Credentials for the operator account created at startup.
#[derive(Clone)]
pub struct ProvisioningConfig {
    pub admin_username: String,
    pub admin_password: String,
    pub admin_full_name: Option<String>,
}

impl std::fmt::Debug for ProvisioningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningConfig")
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"[REDACTED]")
            .field("admin_full_name", &self.admin_full_name)
            .finish()
    }
}

/// Whether provisioning created the account or found it already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    AlreadyPresent,
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    /// The seed credentials would never pass the login rules.
    #[error("invalid admin credentials: {0}")]
    InvalidCredentials(ValidationErrors),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<StoreError> for ProvisioningError {
    fn from(err: StoreError) -> Self {
        Self::Core(err.into())
    }
}

impl From<DomainError> for ProvisioningError {
    fn from(err: DomainError) -> Self {
        Self::Core(err.into())
    }
}

/// Create the operator account unless one with the same username exists.
/// Safe to run on every startup.
pub async fn provision_admin(
    config: &ProvisioningConfig,
    users: &dyn UserStore,
    passwords: &dyn PasswordHashing,
) -> Result<Provisioned, ProvisioningError> {
    let candidate = LoginRequest {
        username: config.admin_username.clone(),
        password: config.admin_password.clone(),
    };
    let ctx = ValidationContext::new(Utc::now());
    let mut errors = Structural.validate(&candidate, &ctx);
    errors.merge(login_rules().evaluate(&candidate, &ctx));
    if !errors.is_empty() {
        return Err(ProvisioningError::InvalidCredentials(errors));
    }

    let username = canonical_username(&config.admin_username);
    if users.find_by_username(&username).await?.is_some() {
        tracing::debug!(%username, "Admin account already provisioned");
        return Ok(Provisioned::AlreadyPresent);
    }

    let hash = passwords.hash(&config.admin_password)?;
    let user = User::new(
        &username,
        hash,
        config.admin_full_name.clone(),
        Utc::now(),
    )?;

    match users.insert(user).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id(), %username, "Admin account provisioned");
            Ok(Provisioned::Created)
        }
        // Another instance won the race.
        Err(StoreError::UniqueViolation { constraint }) if constraint == USERNAME_CONSTRAINT => {
            Ok(Provisioned::AlreadyPresent)
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::memory::{MemoryStores, PlainHasher};
    use crate::ports::StoreFactory;

    fn config(username: &str, password: &str) -> ProvisioningConfig {
        ProvisioningConfig {
            admin_username: username.into(),
            admin_password: password.into(),
            admin_full_name: Some("Site Admin".into()),
        }
    }

    #[tokio::test]
    async fn provisioning_is_idempotent() {
        let stores = MemoryStores::new();
        let users = stores.users();
        let cfg = config("Admin", "secret1");

        let first = provision_admin(&cfg, users.as_ref(), &PlainHasher).await.unwrap();
        let second = provision_admin(&cfg, users.as_ref(), &PlainHasher).await.unwrap();

        assert_eq!(first, Provisioned::Created);
        assert_eq!(second, Provisioned::AlreadyPresent);
        let admin = users.find_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.full_name(), Some("Site Admin"));
        assert!(PlainHasher.verify("secret1", admin.password_hash()).unwrap());
    }

    #[tokio::test]
    async fn weak_seed_credentials_are_refused() {
        let stores = MemoryStores::new();
        let users = stores.users();

        let result = provision_admin(&config("admin", "123"), users.as_ref(), &PlainHasher).await;

        assert_matches!(result, Err(ProvisioningError::InvalidCredentials(errors)) => {
            assert!(errors.has_field("password"));
        });
        assert!(users.find_by_username("admin").await.unwrap().is_none());
    }

    #[test]
    fn debug_output_redacts_password() {
        let rendered = format!("{:?}", config("admin", "hunter22"));
        assert!(!rendered.contains("hunter22"));
    }
}
