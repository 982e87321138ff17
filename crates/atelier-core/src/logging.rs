//! Structured logging field name constants for the atelier backend.
//!
//! All crates use these constants for consistent structured logging fields
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, upload/delete completions |
//! | DEBUG | Decision points, per-variant outcomes |
//! | TRACE | High-volume per-item data |

/// Subsystem originating the log event.
/// Values: "api", "ingest", "media", "storage", "db"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "orchestrator", "transcoder", "placeholder", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "upload", "delete", "attach", "detach"
pub const OPERATION: &str = "op";

/// Media asset UUID being operated on.
pub const ASSET_ID: &str = "asset_id";

/// Variant name being produced or deleted ("sm", "720p", ...).
pub const VARIANT: &str = "variant";

/// Media kind of the asset ("image", "audio", "video", "document").
pub const KIND: &str = "kind";

/// Object-store path affected.
pub const STORAGE_PATH: &str = "storage_path";

/// Byte size of a payload or blob.
pub const SIZE_BYTES: &str = "size_bytes";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Current reference count after an attach/detach.
pub const REF_COUNT: &str = "ref_count";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
