//! HTTP Basic → SecurityContext (management chain only).
//!
//! Checked against the management authenticator; bearer tokens are never
//! consulted on this chain.

use axum::http::{HeaderMap, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::warn;

use crate::api::extractors::SecurityContext;
use crate::services::authenticator::CredentialsAuthenticator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicOutcome {
    NoCredentials,
    Authenticated,
    /// Credentials were offered but are malformed or wrong.
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedCredentials;

/// `None` without a Basic header; `Some(Err(_))` when it cannot be decoded.
pub fn basic_credentials(
    headers: &HeaderMap,
) -> Option<Result<(String, String), MalformedCredentials>> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;

    let decoded = STANDARD
        .decode(encoded.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok());

    Some(
        decoded
            .and_then(|s| {
                s.split_once(':')
                    .map(|(user, pass)| (user.to_string(), pass.to_string()))
            })
            .ok_or(MalformedCredentials),
    )
}

pub async fn authenticate_basic(
    headers: &HeaderMap,
    ctx: &mut SecurityContext,
    authenticator: &CredentialsAuthenticator,
) -> BasicOutcome {
    let (username, password) = match basic_credentials(headers) {
        None => return BasicOutcome::NoCredentials,
        Some(Err(MalformedCredentials)) => {
            warn!("malformed basic authorization header");
            return BasicOutcome::Rejected;
        }
        Some(Ok(creds)) => creds,
    };

    match authenticator.verify(username.clone(), password).await {
        Ok(principal) => {
            ctx.authenticate(principal);
            BasicOutcome::Authenticated
        }
        Err(err) => {
            warn!(user = %username, error = %err, "management authentication failed");
            BasicOutcome::Rejected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::sync::Arc;

    use crate::config::{ManagementUserConfig, PasswordHashConfig};
    use crate::repos::user_lookup::ManagementUsers;
    use crate::services::password::PasswordEncoder;

    fn authenticator() -> CredentialsAuthenticator {
        let encoder = PasswordEncoder::new(PasswordHashConfig {
            memory_kib: 1024,
            iterations: 1,
        })
        .unwrap();
        let users = ManagementUsers::new(
            &ManagementUserConfig {
                username: "ops".to_string(),
                password: "s3cret".to_string(),
                roles: "ACTUATOR_ADMIN".to_string(),
            },
            &encoder,
        )
        .unwrap();
        CredentialsAuthenticator::new("management", Arc::new(users), encoder).unwrap()
    }

    fn basic(raw: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", STANDARD.encode(raw))).unwrap(),
        );
        headers
    }

    #[test]
    fn decodes_user_and_password() {
        let creds = basic_credentials(&basic("ops:pa:ss")).unwrap().unwrap();
        assert_eq!(creds, ("ops".to_string(), "pa:ss".to_string()));
    }

    #[test]
    fn missing_or_other_scheme_is_no_credentials() {
        assert!(basic_credentials(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert!(basic_credentials(&headers).is_none());
    }

    #[test]
    fn undecodable_header_is_an_error() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic !!!"));
        assert_eq!(basic_credentials(&headers), Some(Err(MalformedCredentials)));
        assert!(basic_credentials(&basic("no-colon")).unwrap().is_err());
    }

    #[tokio::test]
    async fn management_user_gets_actuator_role() {
        let auth = authenticator();
        let mut ctx = SecurityContext::new();

        assert_eq!(
            authenticate_basic(&basic("ops:s3cret"), &mut ctx, &auth).await,
            BasicOutcome::Authenticated
        );
        assert!(ctx.principal().unwrap().has_role("ACTUATOR_ADMIN"));
    }

    #[tokio::test]
    async fn application_user_is_not_a_management_user() {
        let auth = authenticator();
        let mut ctx = SecurityContext::new();

        assert_eq!(
            authenticate_basic(&basic("user:password"), &mut ctx, &auth).await,
            BasicOutcome::Rejected
        );
        assert!(!ctx.is_authenticated());
    }
}
