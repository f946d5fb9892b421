//! Bearer token codec + validator (HS256 JWT).
//!
//! Single place that knows about the JWT library. The rest of the app only sees
//! `generate` / `get_subject` / `is_valid`.
//!
//! - decode IS the signature check: no claim is read before the MAC verifies
//! - `exp` is checked by `is_valid` (not by `get_subject`) with the same clock used at issue time
use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Upper bound for the validity window (one year).
pub const MAX_VALIDITY_SECONDS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Not three base64url segments, or a segment is not valid JSON.
    #[error("malformed token: {0}")]
    Format(String),
    /// MAC does not verify against the configured key (or the alg is not HS256).
    #[error("invalid token signature")]
    Signature,
    #[error("invalid token claims: {0}")]
    Claims(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::Signature,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => TokenError::Format(e.to_string()),
            _ => TokenError::Claims(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    // space-joined authorities
    #[serde(default)]
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default)]
    pub jti: Option<String>,
}

impl TokenClaims {
    pub fn authorities(&self) -> BTreeSet<String> {
        self.scope.split_whitespace().map(str::to_string).collect()
    }
}

/// Symmetric-key token service.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    validity: ChronoDuration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &Algorithm::HS256)
            .field("validity_seconds", &self.validity.num_seconds())
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], validity_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is evaluated by `is_valid` so that `get_subject` still works on expired tokens
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            validity: ChronoDuration::seconds(validity_seconds.min(MAX_VALIDITY_SECONDS) as i64),
        }
    }

    pub fn validity_seconds(&self) -> i64 {
        self.validity.num_seconds()
    }

    /// Issue a token for `subject` valid from now for the configured window.
    pub fn generate<I, S>(&self, subject: &str, authorities: I) -> Result<String, TokenError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.issue_at(subject, authorities, Utc::now())
    }

    /// Issue a token as if it had been created at `issued_at`.
    pub fn issue_at<I, S>(
        &self,
        subject: &str,
        authorities: I,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let scope = authorities
            .into_iter()
            .map(|a| a.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" ");

        let claims = TokenClaims {
            sub: subject.to_string(),
            scope,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.validity).timestamp(),
            jti: Some(Uuid::new_v4().to_string()),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify the signature and return the claims. Expiry is NOT checked here.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        if token.split('.').count() != 3 {
            return Err(TokenError::Format(
                "expected three dot-separated segments".to_string(),
            ));
        }
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    pub fn get_subject(&self, token: &str) -> Result<String, TokenError> {
        self.decode(token).map(|claims| claims.sub)
    }

    /// Total check: never errors, any problem yields `false`.
    pub fn is_valid(&self, token: &str, expected_subject: &str) -> bool {
        let claims = match self.decode(token) {
            Ok(claims) => claims,
            Err(TokenError::Signature) => {
                warn!("token validation failed: signature is invalid");
                return false;
            }
            Err(TokenError::Format(reason)) => {
                warn!(%reason, "token validation failed: token is malformed");
                return false;
            }
            Err(err) => {
                warn!(error = %err, "token validation failed");
                return false;
            }
        };

        // boundary is expired
        if claims.exp <= Utc::now().timestamp() {
            warn!(user = %expected_subject, "token validation failed: token has expired");
            return false;
        }

        if claims.sub != expected_subject {
            warn!(
                token_subject = %claims.sub,
                expected = %expected_subject,
                "token validation failed: subject mismatch"
            );
            return false;
        }

        true
    }
}
