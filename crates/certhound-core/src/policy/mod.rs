//! Trust policy: configuration schema and the compiled validator.

pub mod config;
pub mod validator;

pub use config::{CertificateEntry, Config, Fingerprints, EXPECTED_VERSION};
pub use validator::{ForbiddenCertificate, ValidationOutcome, Validator};
