//! Deciding which library files are lossless conversion candidates.

use std::path::Path;
use std::sync::Arc;

use lm_av::CodecProber;
use lm_core::Result;

/// Extensions that always hold a lossless codec.
pub const LOSSLESS_EXTENSIONS: &[&str] = &["flac"];

/// Extensions whose container may hold either ALAC or AAC.
pub const AMBIGUOUS_EXTENSIONS: &[&str] = &["m4a"];

/// Codec name the prober reports for Apple Lossless.
pub const LOSSLESS_CODEC: &str = "alac";

/// Lowercased extension of `path`, if it has one.
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Classifies files by extension, probing ambiguous containers.
#[derive(Clone)]
pub struct CodecClassifier {
    prober: Arc<dyn CodecProber>,
}

impl CodecClassifier {
    pub fn new(prober: Arc<dyn CodecProber>) -> Self {
        Self { prober }
    }

    /// Whether `path` should be converted.
    ///
    /// FLAC files are convertible without probing. `.m4a` files are probed
    /// and are convertible only if the first audio stream is ALAC. Anything
    /// else is not convertible and is never probed.
    ///
    /// # Errors
    ///
    /// A probe failure is returned as is. It is never treated as "not
    /// convertible", since that would silently leave tracks out of the mirror.
    pub fn is_convertible(&self, path: &Path) -> Result<bool> {
        let Some(ext) = extension_of(path) else {
            return Ok(false);
        };

        if LOSSLESS_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(true);
        }

        if AMBIGUOUS_EXTENSIONS.contains(&ext.as_str()) {
            let codec = self.prober.probe_codec(path)?;
            tracing::trace!(file = %path.display(), prober = self.prober.name(), codec = %codec, "classified container");
            return Ok(codec == LOSSLESS_CODEC);
        }

        Ok(false)
    }
}

impl std::fmt::Debug for CodecClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecClassifier")
            .field("prober", &self.prober.name())
            .finish()
    }
}
