use std::error::Error as StdError;
use std::time::Duration;

use serde::Serialize;

use crate::api::extractors::Principal;

use super::sanitize;

// only cycle guard for `source()` chains
const MAX_CAUSE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "SUCCESS",
            Outcome::Failure => "FAILURE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContextType {
    Web,
    NonWeb,
}

/// Raw (unsanitized) request data captured when the operation runs inside an HTTP request.
#[derive(Debug, Clone, Default)]
pub struct RequestMetadata {
    pub remote_addr: Option<String>,
    pub request_uri: String,
    pub user_agent: Option<String>,
}

/// Who is calling and from where. Both parts are optional.
#[derive(Debug, Clone, Default)]
pub struct AuditScope {
    pub principal: Option<Principal>,
    pub request: Option<RequestMetadata>,
}

impl AuditScope {
    /// No principal, no request.
    pub fn non_web() -> Self {
        Self::default()
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn with_request(mut self, request: RequestMetadata) -> Self {
        self.request = Some(request);
        self
    }
}

/// What went wrong, captured from the error before it is handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDetail {
    pub exception_type: String,
    pub exception_message: Option<String>,
    pub root_cause_type: Option<String>,
    pub root_cause_message: Option<String>,
}

impl FailureDetail {
    pub fn from_error<E>(err: &E) -> Self
    where
        E: StdError + 'static,
    {
        Self::with_type(short_type_name::<E>(), err)
    }

    /// Like `from_error` but with a caller-chosen type label (e.g. `AppError::Forbidden`).
    pub fn with_type(exception_type: impl Into<String>, err: &(dyn StdError + 'static)) -> Self {
        let (root_cause_type, root_cause_message) = match root_cause(err) {
            Some(root) => (Some(type_label(root)), Some(root.to_string())),
            None => (None, None),
        };

        Self {
            exception_type: exception_type.into(),
            exception_message: Some(err.to_string()),
            root_cause_type,
            root_cause_message,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            exception_type: "Cancelled".to_string(),
            exception_message: Some("operation was dropped before completing".to_string()),
            root_cause_type: None,
            root_cause_message: None,
        }
    }

    pub fn panicked() -> Self {
        Self {
            exception_type: "Panic".to_string(),
            exception_message: None,
            root_cause_type: None,
            root_cause_message: None,
        }
    }
}

/// Deepest error reachable through `source()`, or `None` when `err` has no source.
///
/// A wrapped error often lives at offset 0 of its wrapper, so addresses say
/// nothing about identity here; the depth cap is what stops a cyclic chain.
pub fn root_cause<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a (dyn StdError + 'static)> {
    let mut current = err.source()?;
    for _ in 1..MAX_CAUSE_DEPTH {
        match current.source() {
            Some(next) => current = next,
            None => break,
        }
    }
    Some(current)
}

/// `resource_server::error::AppError` -> `AppError`, `Wrapper<io::Error>` -> `Wrapper`
pub fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .to_string()
}

// Concrete types are erased behind `dyn Error`; fall back to the Debug name
// that `#[derive(Debug)]` prints first.
fn type_label(err: &(dyn StdError + 'static)) -> String {
    if err.is::<std::io::Error>() {
        return "io::Error".to_string();
    }
    let debug = format!("{err:?}");
    let ident: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if ident.is_empty() {
        "Error".to_string()
    } else {
        ident
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub method: String,
    pub outcome: Outcome,
    pub duration_ms: f64,
    pub principal: String,
    pub roles: Vec<String>,
    pub context_type: ContextType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_cause_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_cause_message: Option<String>,
}

impl AuditRecord {
    pub fn build(
        method: &str,
        outcome: Outcome,
        elapsed: Duration,
        scope: &AuditScope,
        failure: Option<&FailureDetail>,
    ) -> Self {
        let (principal, roles) = match &scope.principal {
            Some(p) => (p.username.clone(), p.authorities.iter().cloned().collect()),
            None => ("anonymous".to_string(), Vec::new()),
        };

        let mut record = Self {
            method: method.to_string(),
            outcome,
            duration_ms: elapsed.as_nanos() as f64 / 1_000_000.0,
            principal,
            roles,
            context_type: ContextType::NonWeb,
            remote_addr: None,
            request_uri: None,
            user_agent: None,
            exception_type: None,
            exception_message: None,
            root_cause_type: None,
            root_cause_message: None,
        };

        if let Some(req) = &scope.request {
            record.context_type = ContextType::Web;
            record.remote_addr = Some(sanitize::ip_address(req.remote_addr.as_deref()));
            record.request_uri = Some(req.request_uri.clone());
            record.user_agent = Some(sanitize::user_agent(req.user_agent.as_deref()));
        }

        if let Some(failure) = failure {
            record.exception_type = Some(failure.exception_type.clone());
            record.exception_message = Some(sanitize::exception_message(
                failure.exception_message.as_deref(),
            ));
            if let Some(root_type) = &failure.root_cause_type {
                record.root_cause_type = Some(root_type.clone());
                record.root_cause_message = Some(sanitize::exception_message(
                    failure.root_cause_message.as_deref(),
                ));
            }
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct StorageError;

    impl fmt::Display for StorageError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "disk\nfull")
        }
    }

    impl StdError for StorageError {}

    #[derive(Debug, thiserror::Error)]
    #[error("could not save")]
    struct SaveError(#[source] StorageError);

    #[derive(Debug, thiserror::Error)]
    #[error("request failed")]
    struct RequestError(#[source] SaveError);

    #[test]
    fn short_names_drop_paths_and_generics() {
        assert_eq!(short_type_name::<SaveError>(), "SaveError");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
    }

    #[test]
    fn root_cause_is_the_deepest_source() {
        let err = RequestError(SaveError(StorageError));
        let detail = FailureDetail::from_error(&err);

        assert_eq!(detail.exception_type, "RequestError");
        assert_eq!(detail.root_cause_type.as_deref(), Some("StorageError"));
        assert_eq!(detail.root_cause_message.as_deref(), Some("disk\nfull"));
    }

    #[test]
    fn no_distinct_cause_means_no_root_cause() {
        let detail = FailureDetail::from_error(&StorageError);
        assert_eq!(detail.exception_type, "StorageError");
        assert!(detail.root_cause_type.is_none());
        assert!(detail.root_cause_message.is_none());
    }

    #[test]
    fn source_at_any_field_offset_is_found() {
        #[derive(Debug, thiserror::Error)]
        #[error("outer")]
        struct SourceFirst {
            #[source]
            inner: std::io::Error,
            code: u16,
        }

        #[derive(Debug, thiserror::Error)]
        #[error("outer")]
        struct SourceLast {
            code: u16,
            #[source]
            inner: std::io::Error,
        }

        let first = SourceFirst {
            inner: std::io::Error::other("boom"),
            code: 1,
        };
        let last = SourceLast {
            code: 2,
            inner: std::io::Error::other("boom"),
        };

        for detail in [FailureDetail::from_error(&first), FailureDetail::from_error(&last)] {
            assert_eq!(detail.root_cause_type.as_deref(), Some("io::Error"));
            assert_eq!(detail.root_cause_message.as_deref(), Some("boom"));
        }
        assert_eq!(first.code + last.code, 3);
    }

    #[test]
    fn cyclic_source_chain_terminates() {
        #[derive(Debug)]
        struct Loop;

        impl fmt::Display for Loop {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "loop")
            }
        }

        impl StdError for Loop {
            fn source(&self) -> Option<&(dyn StdError + 'static)> {
                Some(self)
            }
        }

        let detail = FailureDetail::from_error(&Loop);
        assert_eq!(detail.root_cause_type.as_deref(), Some("Loop"));
    }

    #[test]
    fn io_errors_are_labelled() {
        #[derive(Debug, thiserror::Error)]
        #[error("load failed")]
        struct LoadError(#[source] std::io::Error);

        let err = LoadError(std::io::Error::other("This is the real root cause"));
        let detail = FailureDetail::from_error(&err);
        assert_eq!(detail.root_cause_type.as_deref(), Some("io::Error"));
        assert_eq!(
            detail.root_cause_message.as_deref(),
            Some("This is the real root cause")
        );
    }

    #[test]
    fn non_web_record_has_no_request_fields() {
        let record = AuditRecord::build(
            "Jobs::nightly",
            Outcome::Success,
            Duration::from_micros(1500),
            &AuditScope::non_web(),
            None,
        );
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["contextType"], "NON_WEB");
        assert_eq!(json["principal"], "anonymous");
        assert_eq!(json["roles"], serde_json::json!([]));
        assert_eq!(json["durationMs"], 1.5);
        assert!(json.get("remoteAddr").is_none());
        assert!(json.get("requestUri").is_none());
        assert!(json.get("userAgent").is_none());
        assert!(json.get("exceptionType").is_none());
    }

    #[test]
    fn web_failure_record_is_sanitized() {
        let scope = AuditScope::non_web()
            .with_principal(Principal::new("testuser", ["ROLE_USER", "ROLE_READER"]))
            .with_request(RequestMetadata {
                remote_addr: Some("192.168.1.123".to_string()),
                request_uri: "/api/secure/data".to_string(),
                user_agent: None,
            });
        let err = SaveError(StorageError);
        let detail = FailureDetail::from_error(&err);

        let record = AuditRecord::build(
            "SecureApi::secure_data",
            Outcome::Failure,
            Duration::ZERO,
            &scope,
            Some(&detail),
        );
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["outcome"], "FAILURE");
        assert_eq!(json["contextType"], "WEB");
        assert_eq!(json["remoteAddr"], "192.168.1.XXX");
        assert_eq!(json["userAgent"], "n/a");
        assert_eq!(json["roles"], serde_json::json!(["ROLE_READER", "ROLE_USER"]));
        assert_eq!(json["exceptionType"], "SaveError");
        assert_eq!(json["rootCauseType"], "StorageError");
        assert_eq!(json["rootCauseMessage"], "disk\\nfull");
    }
}
