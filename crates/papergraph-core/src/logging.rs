//! Structured logging field name constants for papergraph.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, surfaced to the caller |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values |
//! | TRACE | Per-item iteration, high-volume data |

/// Subsystem originating the log event.
/// Values: "index", "store", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Logical operation name.
/// Examples: "rebuild", "search", "paginate", "build_graph"
pub const OPERATION: &str = "op";

/// Job handle being processed.
pub const JOB_ID: &str = "job_id";

/// Job kind enum variant.
pub const JOB_KIND: &str = "kind";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search or load.
pub const RESULT_COUNT: &str = "result_count";

/// Number of documents written to or read from the index.
pub const DOC_COUNT: &str = "documents";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
