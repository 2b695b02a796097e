//! Certificate discovery across a container image's tar stream.
//!
//! The engine walks tar entries strictly in stream order. Each regular file
//! is drained into a [`ByteSource`], then every registered parser runs
//! against it as its own blocking task; all tasks for a file are joined
//! before the next entry is touched, so peak memory stays at a small
//! multiple of one buffered file.

pub mod opener;
pub mod pem;

use std::io::Read;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::error::ScanError;
use crate::types::ParsedCertificates;

pub use opener::{ByteSource, SourceReader, SPILL_THRESHOLD};
pub use pem::PemScanner;

/// A certificate detector run against every regular file in the image.
pub trait CertificateParser: Send + Sync {
    /// Identifier recorded on every finding this parser produces.
    fn name(&self) -> &'static str;

    /// Scan one file's content for certificates.
    ///
    /// Decode failures must be reported as partials in the returned
    /// aggregate; an `Err` is reserved for IO failures and cancellation.
    fn scan(
        &self,
        token: &CancellationToken,
        location: &str,
        source: &ByteSource,
    ) -> Result<ParsedCertificates, ScanError>;
}

/// The default parser set: just the PEM scanner.
#[must_use]
pub fn default_parsers() -> Vec<Arc<dyn CertificateParser>> {
    vec![Arc::new(PemScanner)]
}

/// Scan a container image, given as a reader over its exported tar stream,
/// for certificates.
///
/// # Errors
///
/// Fails on malformed tar structure, on files that cannot be buffered, and
/// on cancellation. Parser errors do not abort the walk; they are returned
/// once at the end as [`ScanError::Parser`] with everything discovered so
/// far preserved inside the error.
pub async fn discover_certificates<R: Read>(
    token: &CancellationToken,
    tar_stream: R,
) -> Result<ParsedCertificates, ScanError> {
    discover_with_parsers(token, tar_stream, default_parsers()).await
}

/// [`discover_certificates`] with an explicit parser set.
pub async fn discover_with_parsers<R: Read>(
    token: &CancellationToken,
    tar_stream: R,
    parsers: Vec<Arc<dyn CertificateParser>>,
) -> Result<ParsedCertificates, ScanError> {
    let mut archive = tar::Archive::new(tar_stream);
    let mut results = ParsedCertificates::default();
    let mut errors: Vec<String> = Vec::new();

    for entry in archive.entries().map_err(ScanError::Tar)? {
        if token.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let mut entry = entry.map_err(ScanError::Tar)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path().map_err(ScanError::Tar)?;
        let location = format!("/{}", path.to_string_lossy().trim_start_matches("./"));
        let size = entry.size();
        debug!(location = %location, size, "scanning file");

        let source = Arc::new(ByteSource::from_reader(&location, size, &mut entry)?);

        let mut tasks: JoinSet<Result<ParsedCertificates, ScanError>> = JoinSet::new();
        for parser in &parsers {
            let parser = Arc::clone(parser);
            let source = Arc::clone(&source);
            let token = token.clone();
            let location = location.clone();
            tasks.spawn_blocking(move || parser.scan(&token, &location, &source));
        }

        let mut cancelled = false;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(parsed)) => results.merge(parsed),
                Ok(Err(ScanError::Cancelled)) => cancelled = true,
                Ok(Err(e)) => {
                    warn!(location = %location, error = %e, "parser failed");
                    errors.push(e.to_string());
                }
                Err(e) => errors.push(format!("parser task failed: {e}")),
            }
        }

        if cancelled || token.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
    }

    if errors.is_empty() {
        Ok(results)
    } else {
        Err(ScanError::Parser {
            reasons: errors.join("; "),
            partial: Box::new(results),
        })
    }
}
