//! Invocation instrumentation.
//!
//! Wraps one unit of work with start/end records, memory snapshots, a
//! performance record, and process-level one-shot records (cold start,
//! environment info).
//!
//! # Process flags
//! `warm` and `environment_logged` start `false` for a new [`Instrumentation`]
//! and flip to `true` on the first invocation. Construct one instance per
//! process; tests build fresh instances or call [`Instrumentation::reset`].

use std::fmt::{Debug, Display};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};

use crate::observability::context::{LogContext, RequestContext};
use crate::observability::entry::{LogEntry, LogSink, Severity, TracingSink};
use crate::observability::memory::{MemoryProbe, SysinfoProbe};
use crate::observability::metrics;

pub const REQUEST_STARTED: &str = "Request started";
pub const REQUEST_COMPLETED: &str = "Request completed";
pub const REQUEST_FAILED: &str = "Request failed";
pub const COLD_START_OPERATION: &str = "cold_start";

pub struct Instrumentation {
    sink: Arc<dyn LogSink>,
    probe: Arc<dyn MemoryProbe>,
    warm: AtomicBool,
    environment_logged: AtomicBool,
    process_started: Instant,
}

impl Instrumentation {
    pub fn new(sink: Arc<dyn LogSink>, probe: Arc<dyn MemoryProbe>) -> Self {
        Self {
            sink,
            probe,
            warm: AtomicBool::new(false),
            environment_logged: AtomicBool::new(false),
            process_started: Instant::now(),
        }
    }

    /// Records go to `tracing`, memory comes from `sysinfo`.
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink), Arc::new(SysinfoProbe::new()))
    }

    /// Forget that this process has served a request.
    pub fn reset(&self) {
        self.warm.store(false, Ordering::SeqCst);
        self.environment_logged.store(false, Ordering::SeqCst);
    }

    pub fn is_warm(&self) -> bool {
        self.warm.load(Ordering::SeqCst)
    }

    pub fn log(&self, severity: Severity, message: &str, ctx: &LogContext, data: Option<Value>) {
        let mut entry = LogEntry::new(severity, message, ctx);
        entry.data = data;
        self.sink.emit(entry);
    }

    pub fn log_performance(
        &self,
        ctx: &LogContext,
        operation: &str,
        duration: Duration,
        success: bool,
        error: Option<&str>,
    ) {
        let mut entry = LogEntry::new(Severity::Info, format!("Performance: {}", operation), ctx)
            .with_field("type", "PERFORMANCE")
            .with_field("operation", operation)
            .with_field("durationMs", duration.as_millis() as u64)
            .with_field("success", success);
        if let Some(error) = error {
            entry = entry.with_field("error", error);
        }
        self.sink.emit(entry);
        metrics::record_duration(operation, duration);
    }

    /// Emit a memory record for `phase`; silently skipped when unavailable.
    pub fn log_memory(&self, ctx: &LogContext, phase: &str) {
        let Some(snapshot) = self.probe.snapshot() else {
            return;
        };
        let mut entry = LogEntry::new(Severity::Debug, format!("Memory usage: {}", phase), ctx)
            .with_field("type", "MEMORY")
            .with_field("phase", phase);
        if let Ok(Value::Object(figures)) = serde_json::to_value(snapshot) {
            entry.fields.extend(figures);
        }
        self.sink.emit(entry);
    }

    /// Build and host facts, once per process.
    pub fn log_environment(&self, ctx: &LogContext) {
        if self.environment_logged.swap(true, Ordering::SeqCst) {
            return;
        }
        let data = json!({
            "crateVersion": env!("CARGO_PKG_VERSION"),
            "platform": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "uptimeSecs": self.process_started.elapsed().as_secs_f64(),
            "pid": std::process::id(),
        });
        self.log(Severity::Info, "Environment info", ctx, Some(data));
    }

    /// Start timing a sub-operation.
    pub fn timer<'a>(&'a self, ctx: &LogContext, operation: impl Into<String>) -> Timer<'a> {
        Timer {
            instrumentation: self,
            ctx: ctx.clone(),
            operation: operation.into(),
            started: Instant::now(),
        }
    }

    /// Run `operation` as one instrumented invocation of `function_name`.
    ///
    /// The operation's error is returned unmodified after being logged.
    pub async fn run<T, E, F, Fut>(
        &self,
        function_name: &str,
        request: RequestContext,
        operation: F,
    ) -> Result<T, E>
    where
        F: FnOnce(LogContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display + Debug,
    {
        let ctx = LogContext::new(function_name, &request);
        let started = Instant::now();

        self.log_environment(&ctx);
        if !self.warm.swap(true, Ordering::SeqCst) {
            self.log_performance(&ctx, COLD_START_OPERATION, Duration::ZERO, true, None);
        }
        self.log(Severity::Info, REQUEST_STARTED, &ctx, request.input_summary.clone());
        self.log_memory(&ctx, "start");

        let result = operation(ctx.clone()).await;
        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;

        match &result {
            Ok(_) => {
                self.log_memory(&ctx, "end");
                self.log_performance(&ctx, function_name, elapsed, true, None);
                self.sink.emit(
                    LogEntry::new(Severity::Info, REQUEST_COMPLETED, &ctx)
                        .with_field("success", true)
                        .with_field("durationMs", elapsed_ms),
                );
                metrics::record_request(function_name, true);
            }
            Err(err) => {
                let message = err.to_string();
                self.log(
                    Severity::Error,
                    REQUEST_FAILED,
                    &ctx,
                    Some(json!({
                        "errorName": short_type_name::<E>(),
                        "errorMessage": message,
                        "stack": format!("{:?}", err),
                        "durationMs": elapsed_ms,
                        "phase": "execution",
                    })),
                );
                self.log_performance(&ctx, function_name, elapsed, false, Some(&message));
                self.sink.emit(
                    LogEntry::new(Severity::Warn, REQUEST_COMPLETED, &ctx)
                        .with_field("success", false)
                        .with_field("durationMs", elapsed_ms),
                );
                metrics::record_request(function_name, false);
            }
        }

        result
    }
}

impl Debug for Instrumentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrumentation")
            .field("warm", &self.is_warm())
            .field("environment_logged", &self.environment_logged.load(Ordering::SeqCst))
            .finish()
    }
}

/// Times one sub-operation and reports it as a performance record.
pub struct Timer<'a> {
    instrumentation: &'a Instrumentation,
    ctx: LogContext,
    operation: String,
    started: Instant,
}

impl Timer<'_> {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        self.instrumentation
            .log_performance(&self.ctx, &self.operation, elapsed, true, None);
        elapsed
    }

    pub fn fail(self, error: &str) -> Duration {
        let elapsed = self.elapsed();
        self.instrumentation
            .log_performance(&self.ctx, &self.operation, elapsed, false, Some(error));
        elapsed
    }
}

fn short_type_name<E>() -> &'static str {
    let full = std::any::type_name::<E>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
