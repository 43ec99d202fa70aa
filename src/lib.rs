//! lossymirror - mirror a lossless music library into a lossy copy.
//!
//! The binary wires these modules together; they are exposed here for
//! integration testing.

pub mod classify;
pub mod mirror;
pub mod pool;
pub mod rebase;
pub mod scanner;
