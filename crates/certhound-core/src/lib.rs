//! # certhound-core
//!
//! Certificate discovery and trust-policy validation for container images.
//!
//! A container image ships a filesystem, and filesystems accumulate
//! certificate authorities: distro bundles, vendored test fixtures, the odd
//! corporate root someone baked in three years ago. Certhound walks the
//! image's exported tar stream, finds every PEM-encoded certificate it can
//! (including mangled and truncated ones), and checks the haul against an
//! allow/forbid/require trust policy.
//!
//! ## Data Flow
//!
//! ```text
//! tar stream
//!   -> discovery::discover_certificates()
//!        ByteSource per regular file (buffer or spill to temp file)
//!        PemScanner per file (tolerant byte scanner, restartable)
//!   -> ParsedCertificates { found, partials }
//!   -> policy::Validator::validate()
//!   -> ValidationOutcome { not_allowed, forbidden, required_but_absent }
//! ```
//!
//! Decode failures never abort a scan; they become [`PartialCertificate`]
//! records so an auditor can go look at the bytes themselves.

pub mod cancel;
pub mod discovery;
pub mod error;
pub mod fingerprint;
pub mod policy;
pub mod types;

pub use cancel::CancellationToken;
pub use discovery::{discover_certificates, discover_with_parsers, CertificateParser};
pub use error::{PolicyError, Result, ScanError};
pub use fingerprint::{Sha1Fingerprint, Sha256Fingerprint};
pub use types::{CertificateInfo, FoundCertificate, ParsedCertificates, PartialCertificate};
