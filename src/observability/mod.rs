//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every instrumented invocation produces:
//!     → context.rs (request id + user + function name, threaded by value)
//!     → entry.rs (structured JSON records → LogSink)
//!     → memory.rs (RSS / virtual size snapshots at start and end)
//!     → metrics.rs (counters, latency histogram)
//!
//! Ambient diagnostics from every subsystem:
//!     → logging.rs (tracing subscriber, JSON or compact)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every record of one invocation
//! - Process-wide one-shot flags live on the Instrumentation instance
//! - Metrics are cheap and no-ops until an exporter is installed

pub mod context;
pub mod entry;
pub mod instrument;
pub mod logging;
pub mod memory;
pub mod metrics;
pub mod redact;

pub use context::{LogContext, RequestContext};
pub use entry::{LogEntry, LogSink, MemorySink, Severity, TracingSink};
pub use instrument::{Instrumentation, Timer};
pub use memory::{MemoryProbe, MemorySnapshot, NoopProbe, SysinfoProbe};
pub use redact::summarize_input;
