//! Core data model: found and partial certificates.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::fingerprint::{Sha1Fingerprint, Sha256Fingerprint};

/// Owned summary of one parsed X.509 certificate.
///
/// The DER bytes are kept verbatim; fingerprints and PEM re-emission must
/// work from the exact byte range that was decoded, not from re-serialized
/// fields.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateInfo {
    /// Subject distinguished name (human-readable)
    pub subject: String,
    /// Issuer distinguished name (human-readable)
    pub issuer: String,
    /// Serial number (hex)
    pub serial: String,
    /// Not valid before
    pub not_before: DateTime<Utc>,
    /// Not valid after
    pub not_after: DateTime<Utc>,
    /// Signature bytes from the certificate
    pub signature: Vec<u8>,
    /// Raw DER encoding the certificate was decoded from
    pub der: Vec<u8>,
}

/// A fully decoded certificate discovered inside an image.
#[derive(Debug, Clone, Serialize)]
pub struct FoundCertificate {
    /// Path within the image filesystem where the certificate was found.
    pub location: String,
    /// Name of the parser which discovered the certificate.
    pub parser: &'static str,
    /// The parsed certificate.
    pub certificate: CertificateInfo,
    /// SHA-1 fingerprint of the DER bytes.
    pub fingerprint_sha1: Sha1Fingerprint,
    /// SHA-256 fingerprint of the DER bytes.
    pub fingerprint_sha256: Sha256Fingerprint,
}

/// A candidate that looked like a certificate but could not be fully decoded.
///
/// Partials are findings, not failures: truncated or mangled certificate
/// data in an image is exactly what an audit wants surfaced.
#[derive(Debug, Clone, Serialize)]
pub struct PartialCertificate {
    /// Path within the image filesystem where the candidate was seen.
    pub location: String,
    /// Name of the parser which flagged the candidate.
    pub parser: &'static str,
    /// Human-readable explanation of why decoding stopped.
    pub reason: String,
}

/// Aggregate result of scanning one image.
///
/// Ordering follows file visitation order within a scan; it is not stable
/// across runs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedCertificates {
    /// Fully decoded certificates.
    pub found: Vec<FoundCertificate>,
    /// Candidates that could not be decoded.
    pub partials: Vec<PartialCertificate>,
}

impl ParsedCertificates {
    /// Fold another aggregate into this one, preserving order.
    pub fn merge(&mut self, other: Self) {
        self.found.extend(other.found);
        self.partials.extend(other.partials);
    }

    /// True when nothing at all was discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.found.is_empty() && self.partials.is_empty()
    }
}
