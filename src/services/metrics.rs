//! Application meters.
//!
//! All custom meters are defined here so names and tags stay consistent.
//! The registry is owned by the app (no process-global recorder), which keeps
//! counts observable per test.
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

pub const LOGIN_TOTAL: &str = "auth_logins_total";
pub const SECURE_REQUESTS_TOTAL: &str = "api_requests_secure_total";
pub const AUDIT_EVENTS_TOTAL: &str = "app_audit_events_total";
pub const AUDIT_EVENTS_DURATION: &str = "app_audit_events_duration_seconds";

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    logins: IntCounterVec,
    secure_requests: IntCounterVec,
    audit_events: IntCounterVec,
    audit_durations: HistogramVec,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let logins = IntCounterVec::new(
            Opts::new(LOGIN_TOTAL, "Total number of login attempts by result."),
            &["result"],
        )?;
        let secure_requests = IntCounterVec::new(
            Opts::new(
                SECURE_REQUESTS_TOTAL,
                "Total number of requests to the secure endpoints.",
            ),
            &["endpoint"],
        )?;
        let audit_events = IntCounterVec::new(
            Opts::new(AUDIT_EVENTS_TOTAL, "Counts the total number of audited events."),
            &["method", "outcome"],
        )?;
        let audit_durations = HistogramVec::new(
            HistogramOpts::new(AUDIT_EVENTS_DURATION, "Records the duration of audited events."),
            &["method", "outcome"],
        )?;

        registry.register(Box::new(logins.clone()))?;
        registry.register(Box::new(secure_requests.clone()))?;
        registry.register(Box::new(audit_events.clone()))?;
        registry.register(Box::new(audit_durations.clone()))?;

        Ok(Self {
            registry,
            logins,
            secure_requests,
            audit_events,
            audit_durations,
        })
    }

    pub fn successful_logins(&self) -> IntCounter {
        self.logins.with_label_values(&["success"])
    }

    pub fn failed_logins(&self) -> IntCounter {
        self.logins.with_label_values(&["failure"])
    }

    pub fn secure_requests(&self, endpoint: &str) -> IntCounter {
        self.secure_requests.with_label_values(&[endpoint])
    }

    pub fn audit_events(&self) -> &IntCounterVec {
        &self.audit_events
    }

    pub fn audit_durations(&self) -> &HistogramVec {
        &self.audit_durations
    }

    /// Prometheus text exposition of everything registered here.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
