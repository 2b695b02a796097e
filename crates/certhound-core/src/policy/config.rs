//! Trust policy configuration.
//!
//! A policy is a YAML document with a `version` field and three lists of
//! fingerprint entries. Each entry identifies exactly one certificate by
//! exactly one fingerprint kind:
//!
//! ```yaml
//! version: "1"
//! allow:
//!   - fingerprints:
//!       sha256: 01be16a1662a6d1a52caaf41eaec4c9dae4ec0fe43a7ee9f3413f1d84e3b3413
//!     comment: corporate root
//! forbid:
//!   - fingerprints:
//!       sha1: 0000000000000000000000000000000000000000
//! require: []
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::PolicyError;

/// The only policy schema version this build understands.
pub const EXPECTED_VERSION: &str = "1";

/// A full trust policy document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Schema version, must be `"1"`.
    pub version: String,
    /// Certificates permitted in the image (strict mode only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<CertificateEntry>,
    /// Certificates that must never appear, whatever the mode.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forbid: Vec<CertificateEntry>,
    /// Certificates that must be present; implicitly allowed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub require: Vec<CertificateEntry>,
}

/// One configured fingerprint rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateEntry {
    /// The fingerprint identifying the certificate.
    pub fingerprints: Fingerprints,
    /// Free-text note carried through to validation reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Fingerprint holder; exactly one field may be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprints {
    /// SHA-1 fingerprint, lowercase or uppercase hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    /// SHA-256 fingerprint, lowercase or uppercase hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl Config {
    /// Parse and validate a policy document.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if the YAML does not match the schema, the
    /// version is unsupported, or any entry has zero or two fingerprint
    /// kinds set.
    pub fn from_yaml(doc: &str) -> Result<Self, PolicyError> {
        let config: Self = serde_yaml::from_str(doc)?;
        if config.version != EXPECTED_VERSION {
            return Err(PolicyError::Version {
                found: config.version,
            });
        }
        config.check_entries()?;
        Ok(config)
    }

    /// Load a policy from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let doc = std::fs::read_to_string(path).map_err(|e| PolicyError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&doc)
    }

    /// Verify that every entry carries exactly one fingerprint kind.
    pub fn check_entries(&self) -> Result<(), PolicyError> {
        for (list, name) in self.lists() {
            for (index, entry) in list.iter().enumerate() {
                match (&entry.fingerprints.sha1, &entry.fingerprints.sha256) {
                    (None, None) => {
                        return Err(PolicyError::MissingFingerprint { list: name, index })
                    }
                    (Some(_), Some(_)) => {
                        return Err(PolicyError::AmbiguousFingerprint { list: name, index })
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn lists(&self) -> [(&[CertificateEntry], &'static str); 3] {
        [
            (&self.allow, "allow"),
            (&self.forbid, "forbid"),
            (&self.require, "require"),
        ]
    }
}
