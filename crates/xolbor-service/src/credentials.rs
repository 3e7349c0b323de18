//! Password credentials.
//!
//! The account service never sees how credentials are stored; it asks a
//! [`CredentialProvider`] to turn a password into an opaque credential string
//! and later to check a password against it.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;

use xolbor_core::LedgerError;

/// Hashes and verifies account passwords.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Derive a credential for `password`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::StoreUnavailable` if hashing fails.
    async fn set_credential(&self, password: &str) -> Result<String, LedgerError>;

    /// Check `password` against a stored credential.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::StoreUnavailable` if verification cannot run.
    async fn verify_credential(&self, password: &str, credential: &str)
        -> Result<bool, LedgerError>;
}

/// Argon2id credentials in PHC string format.
///
/// Hashing is CPU-bound, so both operations run on the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct Argon2Credentials {
    params: Option<Params>,
}

impl Argon2Credentials {
    /// Use the Argon2id defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom cost parameters (e.g. cheaper ones in tests).
    #[must_use]
    pub fn with_params(params: Params) -> Self {
        Self {
            params: Some(params),
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        match &self.params {
            Some(params) => Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone()),
            None => Argon2::default(),
        }
    }
}

fn unavailable(context: &str, err: impl std::fmt::Display) -> LedgerError {
    tracing::error!(error = %err, "{context}");
    LedgerError::StoreUnavailable("credential check unavailable".into())
}

#[async_trait]
impl CredentialProvider for Argon2Credentials {
    async fn set_credential(&self, password: &str) -> Result<String, LedgerError> {
        let argon2 = self.argon2();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| unavailable("Failed to hash password", e))
        })
        .await
        .map_err(|e| unavailable("Password hashing task failed", e))?
    }

    async fn verify_credential(
        &self,
        password: &str,
        credential: &str,
    ) -> Result<bool, LedgerError> {
        let argon2 = self.argon2();
        let password = password.to_owned();
        let credential = credential.to_owned();

        tokio::task::spawn_blocking(move || {
            let Ok(parsed) = PasswordHash::new(&credential) else {
                tracing::warn!("Stored credential is not a valid PHC string");
                return Ok(false);
            };
            match argon2.verify_password(password.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(unavailable("Failed to verify password", e)),
            }
        })
        .await
        .map_err(|e| unavailable("Password verification task failed", e))?
    }
}
