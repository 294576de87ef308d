//! # archived-or-not
//!
//! Batch archive-check engine: for every file under a chosen directory
//! tree, ask a remote records archive whether it already holds an
//! equivalent file, then aggregate and export the answers.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to progress/status/error
//!   events, no polling required
//! - **Partial-failure tolerant** - One unreadable file or refused upload
//!   never aborts the batch
//! - **Cooperatively cancelable** - Cancellation is honored at file
//!   boundaries; an in-flight upload is allowed to finish
//!
//! ## Quick Start
//!
//! ```no_run
//! use archived_or_not::{BatchDispatcher, Credentials, OutputMode, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig {
//!         root: "/srv/intake/2026".into(),
//!         recursive: true,
//!         exclude_source: false,
//!         only_missing_files: false,
//!         output: OutputMode::Both,
//!         output_dir: None,
//!         max_file_size_mb: 1000,
//!         endpoint: "https://archive.example.edu/api/archived_or_not".into(),
//!         credentials: Credentials {
//!             username: "svc-records".into(),
//!             password: "secret".into(),
//!         },
//!         share_root: r"N:\PPDO\Records".into(),
//!         debug_log: false,
//!     };
//!
//!     let dispatcher = BatchDispatcher::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = dispatcher.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = dispatcher.start().await?;
//!     println!("{:?}: {} files", report.state, report.results.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP client for the archive-check endpoint
pub mod client;
/// Configuration types
pub mod config;
/// Optional structured debug log
pub mod debug_log;
/// Batch dispatcher (the core state machine)
pub mod dispatcher;
/// Directory traversal and ignore policy
pub mod enumerator;
/// Error types
pub mod error;
/// Result export (JSON and spreadsheet)
pub mod export;
/// Per-file upload budgets and the skip policy
pub mod timing;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use client::ArchiveCheckClient;
pub use config::{Credentials, OutputMode, RunConfig};
pub use dispatcher::BatchDispatcher;
pub use error::{Error, Result};
pub use export::{ExportFormat, ExportedFile, ResultExporter};
pub use timing::{TimeoutPlanner, UploadBudgets, UploadPlan};
pub use types::{
    CheckOutcome, Event, FileDescriptor, ProgressState, ResultMap, RunReport, RunState,
};
