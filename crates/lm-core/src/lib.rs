//! lm-core: shared error type, configuration, and the job data model.
//!
//! This crate is the foundational dependency for the other lossymirror
//! crates. It has no knowledge of external tools or of the filesystem walk.

pub mod config;
pub mod error;
pub mod job;

// Re-export the most commonly used items at the crate root.
pub use config::{Config, ScanErrorPolicy};
pub use error::{Error, Result};
pub use job::{Job, JobAction};
