/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - token service / 2 つの authenticator (application / management) / metrics / auditor / policy
 * - Clone 前提で持つ (内部は Arc)
 *
 * Notes
 * - application と management の authenticator は別インスタンス。user lookup を共有しない
 */
use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::policy::SecurityPolicy;
use crate::repos::user_lookup::{ApplicationUsers, ManagementUsers};
use crate::services::audit::{AuditSink, Auditor};
use crate::services::authenticator::CredentialsAuthenticator;
use crate::services::metrics::Metrics;
use crate::services::password::PasswordEncoder;
use crate::services::token::TokenService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub app_auth: Arc<CredentialsAuthenticator>,
    pub management_auth: Arc<CredentialsAuthenticator>,
    pub metrics: Arc<Metrics>,
    pub auditor: Arc<Auditor>,
    pub policy: Arc<SecurityPolicy>,
}

impl AppState {
    /// Builds every process-level service once; `sink` receives audit records.
    pub fn from_config(config: &Config, sink: Arc<dyn AuditSink>) -> anyhow::Result<Self> {
        let encoder =
            PasswordEncoder::new(config.password_hash).context("invalid password hash parameters")?;

        let app_users = ApplicationUsers::new(&encoder).context("hashing application user")?;
        let management_users = ManagementUsers::new(&config.management_user, &encoder)
            .context("hashing management user")?;

        let metrics = Arc::new(Metrics::new().context("registering metrics")?);
        let auditor = Arc::new(Auditor::new(&metrics, sink));

        Ok(Self {
            tokens: Arc::new(TokenService::new(
                config.jwt_secret_key.as_bytes(),
                config.jwt_validity_seconds,
            )),
            app_auth: Arc::new(
                CredentialsAuthenticator::new("application", Arc::new(app_users), encoder.clone())
                    .context("hashing application dummy password")?,
            ),
            management_auth: Arc::new(
                CredentialsAuthenticator::new("management", Arc::new(management_users), encoder)
                    .context("hashing management dummy password")?,
            ),
            metrics,
            auditor,
            policy: Arc::new(SecurityPolicy::standard()),
        })
    }
}
