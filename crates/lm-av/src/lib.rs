//! # lm-av
//!
//! External audio tool plumbing for lossymirror.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg
//!   and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- builder running external
//!   processes either blocking or on the tokio runtime, with an optional
//!   timeout.
//! - **Stream probing** ([`CodecProber`], [`FfprobeProber`]) -- report the
//!   codec of a file's first audio stream.
//! - **Transcoding** ([`Transcoder`], [`FfmpegTranscoder`]) and verbatim
//!   [`copy_file`].

pub mod command;
pub mod probe;
pub mod tools;
pub mod transcode;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use probe::{CodecProber, FfprobeProber};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
pub use transcode::{copy_file, FfmpegTranscoder, Transcoder};
