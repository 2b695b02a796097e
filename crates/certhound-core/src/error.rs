//! Error types for discovery and policy validation.

use thiserror::Error;

use crate::types::ParsedCertificates;

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors that can occur while scanning an image for certificates.
///
/// Decode failures inside a single certificate candidate are *not* errors;
/// they are reported as [`crate::PartialCertificate`] records and the scan
/// keeps going.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The tar stream itself is malformed or unreadable.
    #[error("failed to read image tar: {0}")]
    Tar(#[source] std::io::Error),

    /// A file's content could not be buffered or spilled to disk.
    #[error("failed to buffer {path}: {source}")]
    Buffer {
        /// Path of the tar entry being buffered.
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading a buffered file back failed mid-scan.
    #[error("read error in {path}: {source}")]
    Io {
        /// Path of the file being scanned.
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Rewinding the scan cursor failed.
    #[error("failed to seek: {0}")]
    Seek(#[source] std::io::Error),

    /// The scan was cancelled cooperatively.
    #[error("scan cancelled")]
    Cancelled,

    /// One or more parsers failed. Records produced before the failure are
    /// preserved so callers can still report what was found.
    #[error("parser error finding certificates: {reasons}")]
    Parser {
        /// Joined error messages from every parser that failed.
        reasons: String,
        /// Everything discovered before (and despite) the failure.
        partial: Box<ParsedCertificates>,
    },

    /// A scanner bookkeeping invariant failed, such as a rewind distance
    /// that does not fit a seek offset.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ScanError {
    /// Returns true if the scan stopped because of cooperative cancellation
    /// rather than broken input.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors raised while loading or compiling a trust policy.
///
/// All of these are fatal at validator-compile time, before any certificate
/// is evaluated.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// The policy file could not be read.
    #[error("failed to read policy {path}: {source}")]
    Read {
        /// Path of the policy file.
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The policy document is not valid YAML for the expected schema.
    #[error("invalid policy document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The policy declares a version this build does not understand.
    #[error("unsupported policy version {found:?}, expected \"1\"")]
    Version {
        /// Version string found in the document.
        found: String,
    },

    /// An entry has neither a SHA-1 nor a SHA-256 fingerprint.
    #[error("entry at position {index} in {list} list has no fingerprints")]
    MissingFingerprint {
        /// Which list the entry came from (allow/forbid/require).
        list: &'static str,
        /// Zero-based position within that list.
        index: usize,
    },

    /// An entry has both fingerprint kinds set; only one is permitted.
    #[error("entry at position {index} in {list} list has both SHA-1 and SHA-256 fingerprints")]
    AmbiguousFingerprint {
        /// Which list the entry came from.
        list: &'static str,
        /// Zero-based position within that list.
        index: usize,
    },

    /// A fingerprint string is not valid hex of the right length.
    #[error("entry at position {index} in {list} list has an invalid {kind} fingerprint: {reason}")]
    InvalidFingerprint {
        /// Which list the entry came from.
        list: &'static str,
        /// Zero-based position within that list.
        index: usize,
        /// "SHA-1" or "SHA-256".
        kind: &'static str,
        /// Parse failure detail.
        reason: String,
    },
}
