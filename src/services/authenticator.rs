use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::api::extractors::Principal;
use crate::repos::user_lookup::UserLookup;
use crate::services::password::{PasswordEncoder, PasswordError};

// verified against for unknown users so both failure paths cost one argon2 run
const DUMMY_PASSWORD: &str = "userNotFoundPassword";

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user and wrong password are the same error.
    #[error("bad credentials")]
    BadCredentials,
    #[error("password verification task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Username/password authentication against one user source.
///
/// One instance per trust domain (application users vs. management users);
/// the two never share a lookup.
#[derive(Clone)]
pub struct CredentialsAuthenticator {
    realm: &'static str,
    users: Arc<dyn UserLookup>,
    encoder: PasswordEncoder,
    dummy_hash: Arc<str>,
}

impl std::fmt::Debug for CredentialsAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsAuthenticator")
            .field("realm", &self.realm)
            .finish()
    }
}

impl CredentialsAuthenticator {
    pub fn new(
        realm: &'static str,
        users: Arc<dyn UserLookup>,
        encoder: PasswordEncoder,
    ) -> Result<Self, PasswordError> {
        let dummy_hash = encoder.encode(DUMMY_PASSWORD)?.into();
        Ok(Self {
            realm,
            users,
            encoder,
            dummy_hash,
        })
    }

    pub fn users(&self) -> &dyn UserLookup {
        self.users.as_ref()
    }

    /// Runs [`authenticate`](Self::authenticate) on the blocking pool; argon2 is
    /// too heavy for an async worker.
    pub async fn verify(&self, username: String, password: String) -> Result<Principal, AuthError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.authenticate(&username, &password)).await?
    }

    /// Blocking. Unknown users still pay one hash verification.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthError> {
        let mut record = match self.users.load(username) {
            Ok(record) => record,
            Err(err) => {
                debug!(realm = self.realm, error = %err, "user lookup failed");
                let _ = self.encoder.matches(password, &self.dummy_hash);
                return Err(AuthError::BadCredentials);
            }
        };

        let verified = self.encoder.matches(password, &record.password_hash);
        record.erase_credentials();

        if !verified {
            debug!(realm = self.realm, user = %username, "password mismatch");
            return Err(AuthError::BadCredentials);
        }

        Ok(Principal {
            username: record.username,
            authorities: record.authorities,
        })
    }
}
