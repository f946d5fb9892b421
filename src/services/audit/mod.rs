/*
 * Responsibility
 * - 任意の operation (HTTP handler / 非 web 処理) を計測し、audit record と meter を残す
 * - 結果 (Ok / Err) は一切変換せず、そのまま呼び出し元へ返す
 *
 * Notes
 * - 記録は drop guard で行うので、future が cancel / panic しても 1 件残る
 * - sanitize は record 組み立て時に行う (FailureDetail / RequestMetadata は生の値)
 */
use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::services::metrics::Metrics;

mod meters;
mod record;
pub mod sanitize;
mod sink;

pub use meters::{AuditMeters, MeterCache};
pub use record::{
    AuditRecord, AuditScope, ContextType, FailureDetail, Outcome, RequestMetadata, root_cause,
    short_type_name,
};
pub use sink::{AuditSink, TracingSink};

pub struct Auditor {
    meters: MeterCache,
    sink: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for Auditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auditor")
            .field("meters", &self.meters.len())
            .finish()
    }
}

impl Auditor {
    pub fn new(metrics: &Metrics, sink: Arc<dyn AuditSink>) -> Self {
        Self {
            meters: MeterCache::new(metrics),
            sink,
        }
    }

    pub fn meters(&self) -> &MeterCache {
        &self.meters
    }

    /// Runs `fut` and records one audit event for it.
    pub async fn observe<T, E, F>(&self, operation: &str, scope: AuditScope, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: StdError + 'static,
    {
        let in_flight = self.start(operation, scope);
        let result = fut.await;
        match &result {
            Ok(_) => in_flight.success(),
            Err(err) => in_flight.failure(FailureDetail::from_error(err)),
        }
        result
    }

    pub fn observe_sync<T, E, F>(&self, operation: &str, scope: AuditScope, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: StdError + 'static,
    {
        let in_flight = self.start(operation, scope);
        let result = f();
        match &result {
            Ok(_) => in_flight.success(),
            Err(err) => in_flight.failure(FailureDetail::from_error(err)),
        }
        result
    }

    /// Starts the clock. The returned guard records exactly once: on
    /// `success`/`failure`, or as a FAILURE when dropped unfinished.
    pub fn start(&self, operation: &str, scope: AuditScope) -> InFlight<'_> {
        InFlight {
            auditor: self,
            operation: operation.to_string(),
            scope,
            started: Instant::now(),
            finished: false,
        }
    }

    fn record(
        &self,
        operation: &str,
        outcome: Outcome,
        elapsed: Duration,
        scope: &AuditScope,
        failure: Option<&FailureDetail>,
    ) {
        let meters = self.meters.get(operation, outcome);
        meters.counter.inc();
        meters.timer.observe(elapsed.as_secs_f64());

        let record = AuditRecord::build(operation, outcome, elapsed, scope, failure);
        self.sink.emit(&record);
    }
}

pub struct InFlight<'a> {
    auditor: &'a Auditor,
    operation: String,
    scope: AuditScope,
    started: Instant,
    finished: bool,
}

impl InFlight<'_> {
    pub fn success(mut self) {
        self.finish(Outcome::Success, None);
    }

    pub fn failure(mut self, detail: FailureDetail) {
        self.finish(Outcome::Failure, Some(&detail));
    }

    fn finish(&mut self, outcome: Outcome, failure: Option<&FailureDetail>) {
        if self.finished {
            return;
        }
        self.finished = true;
        let elapsed = self.started.elapsed();
        self.auditor
            .record(&self.operation, outcome, elapsed, &self.scope, failure);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let detail = if std::thread::panicking() {
            FailureDetail::panicked()
        } else {
            FailureDetail::cancelled()
        };
        self.finish(Outcome::Failure, Some(&detail));
    }
}
