//! Append-only error report storage.
//!
//! # Data Flow
//! ```text
//! POST /log-error body
//!     → report.rs (parse, validate, resolve local wall-clock time)
//!     → store.rs (year dir, per-day file, serialized single-line append)
//!
//! GET /get-logs
//!     → store.rs (walk <root>/<year>/*<suffix>, read each file)
//!     → file name → content mapping
//! ```
//!
//! # Layout
//! `<root>/<year>/<YYYY-MM-DD> ErrLog.txt`, one `HH:MM:SS - [<context>] <error>` line per report.

pub mod report;
pub mod store;

pub use report::{parse_timestamp, ErrorReport, ReportError};
pub use store::{format_line, LogSnapshot, LogStore, StoreError, StoredEntry};
