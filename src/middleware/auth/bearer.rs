//! Bearer token → SecurityContext (application chain).
//!
//! Flow:
//! - no `Authorization: Bearer <token>` → nothing to do
//! - subject を取り出す (署名検証込み)。失敗は warn して未認証のまま続行
//! - context が空なら user lookup → is_valid → principal を context に入れる
//! - token があったのに context が空のままなら failed-login counter を 1 増やす
//!
//! Never rejects the request itself.

use axum::http::{HeaderMap, header};
use prometheus::IntCounter;
use tracing::{debug, warn};

use crate::api::extractors::{Principal, SecurityContext};
use crate::repos::user_lookup::UserLookup;
use crate::services::token::TokenService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerOutcome {
    NoToken,
    Authenticated,
    AlreadyAuthenticated,
    Rejected,
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub fn authenticate_bearer(
    headers: &HeaderMap,
    ctx: &mut SecurityContext,
    tokens: &TokenService,
    users: &dyn UserLookup,
    failed_logins: &IntCounter,
) -> BearerOutcome {
    let Some(token) = bearer_token(headers) else {
        return BearerOutcome::NoToken;
    };

    let outcome = match tokens.get_subject(token) {
        Err(err) => {
            warn!(error = %err, "bearer token could not be decoded");
            BearerOutcome::Rejected
        }
        Ok(_) if ctx.is_authenticated() => BearerOutcome::AlreadyAuthenticated,
        Ok(username) => match users.load(&username) {
            Err(err) => {
                // same outward result as a bad token
                debug!(error = %err, "bearer token subject is not a known user");
                BearerOutcome::Rejected
            }
            Ok(mut record) => {
                if tokens.is_valid(token, &record.username) {
                    record.erase_credentials();
                    ctx.authenticate(Principal {
                        username: record.username,
                        authorities: record.authorities,
                    });
                    BearerOutcome::Authenticated
                } else {
                    BearerOutcome::Rejected
                }
            }
        },
    };

    if !ctx.is_authenticated() {
        failed_logins.inc();
    }

    outcome
}
