//! Livetrack CLI - producer and viewer tools for the livetrack server.
//!
//! The `livetrack` binary pushes pilot records, watches the live stream
//! and builds v1 records from recorded tracks.

pub mod input;
pub mod summary;

pub use input::{load_points, load_records};
pub use summary::{describe, summarize};

/// Log directives added on top of `RUST_LOG`.
pub const LOG_DIRECTIVES: [&str; 2] = ["livetrack=info", "livetrack_sdk=info"];
