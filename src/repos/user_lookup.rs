/*
 * Responsibility
 * - username → CredentialRecord の解決 (application user / management user)
 * - 永続化はしない (固定値 / 設定値から組み立てる)
 *
 * Notes
 * - load() は毎回新しい CredentialRecord を返す。呼び出し側が検証後に
 *   erase_credentials() で password_hash を消すため、共有インスタンスは返さない。
 */
use std::collections::BTreeSet;

use crate::config::ManagementUserConfig;
use crate::repos::error::UserNotFound;
use crate::services::password::{PasswordEncoder, PasswordError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub username: String,
    pub password_hash: String,
    pub authorities: BTreeSet<String>,
}

impl CredentialRecord {
    /// Drops the password hash once authentication is done with it.
    pub fn erase_credentials(&mut self) {
        self.password_hash.clear();
    }
}

pub trait UserLookup: Send + Sync {
    fn load(&self, username: &str) -> Result<CredentialRecord, UserNotFound>;
}

/// Hardcoded application user for the login flow (stand-in for a user table).
#[derive(Debug)]
pub struct ApplicationUsers {
    password_hash: String,
}

impl ApplicationUsers {
    pub const USERNAME: &'static str = "user";
    const PASSWORD: &'static str = "password";
    const AUTHORITIES: [&'static str; 3] = ["ROLE_USER", "read", "write"];

    pub fn new(encoder: &PasswordEncoder) -> Result<Self, PasswordError> {
        Ok(Self {
            password_hash: encoder.encode(Self::PASSWORD)?,
        })
    }
}

impl UserLookup for ApplicationUsers {
    fn load(&self, username: &str) -> Result<CredentialRecord, UserNotFound> {
        if username != Self::USERNAME {
            return Err(UserNotFound {
                source_name: "application",
                username: username.to_string(),
            });
        }

        Ok(CredentialRecord {
            username: Self::USERNAME.to_string(),
            password_hash: self.password_hash.clone(),
            authorities: Self::AUTHORITIES.iter().map(|a| a.to_string()).collect(),
        })
    }
}

/// Operator account for the management plane, built from configuration.
#[derive(Debug)]
pub struct ManagementUsers {
    username: String,
    password_hash: String,
    authorities: BTreeSet<String>,
}

impl ManagementUsers {
    pub fn new(
        config: &ManagementUserConfig,
        encoder: &PasswordEncoder,
    ) -> Result<Self, PasswordError> {
        Ok(Self {
            username: config.username.clone(),
            password_hash: encoder.encode(&config.password)?,
            authorities: parse_roles(&config.roles),
        })
    }
}

impl UserLookup for ManagementUsers {
    fn load(&self, username: &str) -> Result<CredentialRecord, UserNotFound> {
        if username != self.username {
            return Err(UserNotFound {
                source_name: "management",
                username: username.to_string(),
            });
        }

        Ok(CredentialRecord {
            username: self.username.clone(),
            password_hash: self.password_hash.clone(),
            authorities: self.authorities.clone(),
        })
    }
}

/// "ACTUATOR_ADMIN, ROLE_OPS" -> {"ROLE_ACTUATOR_ADMIN", "ROLE_OPS"}
pub fn parse_roles(roles: &str) -> BTreeSet<String> {
    roles
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| {
            if r.starts_with("ROLE_") {
                r.to_string()
            } else {
                format!("ROLE_{r}")
            }
        })
        .collect()
}
