//! Compiled trust-policy validator.
//!
//! A [`Validator`] is built once from a [`Config`] and is read-only from
//! then on: fingerprint strings are decoded up front into fixed-size keys,
//! so validation itself is a pure single pass over the found certificates.
//!
//! Precedence: `require` implies allow, and `forbid` always wins — a
//! certificate can be required and still be reported forbidden.

use std::collections::{HashMap, HashSet};

use crate::error::PolicyError;
use crate::fingerprint::{Sha1Fingerprint, Sha256Fingerprint};
use crate::policy::config::{CertificateEntry, Config};
use crate::types::FoundCertificate;

/// A parsed fingerprint from either family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryFingerprint {
    Sha1(Sha1Fingerprint),
    Sha256(Sha256Fingerprint),
}

impl EntryFingerprint {
    /// Decode the single fingerprint of a checked entry.
    fn parse(
        entry: &CertificateEntry,
        list: &'static str,
        index: usize,
    ) -> Result<Self, PolicyError> {
        if let Some(hex) = &entry.fingerprints.sha256 {
            let fp = Sha256Fingerprint::from_hex(hex).map_err(|e| {
                PolicyError::InvalidFingerprint {
                    list,
                    index,
                    kind: "SHA-256",
                    reason: e.to_string(),
                }
            })?;
            Ok(Self::Sha256(fp))
        } else if let Some(hex) = &entry.fingerprints.sha1 {
            let fp =
                Sha1Fingerprint::from_hex(hex).map_err(|e| PolicyError::InvalidFingerprint {
                    list,
                    index,
                    kind: "SHA-1",
                    reason: e.to_string(),
                })?;
            Ok(Self::Sha1(fp))
        } else {
            Err(PolicyError::MissingFingerprint { list, index })
        }
    }
}

/// A found certificate paired with the policy entry that forbade it.
#[derive(Debug, Clone)]
pub struct ForbiddenCertificate {
    /// The certificate discovered in the image.
    pub certificate: FoundCertificate,
    /// The `forbid` entry it matched.
    pub entry: CertificateEntry,
}

/// Output of one validation run.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    /// Certificates absent from the allow/require union (strict mode only).
    pub not_allowed: Vec<FoundCertificate>,
    /// Certificates matching a `forbid` entry.
    pub forbidden: Vec<ForbiddenCertificate>,
    /// `require` entries whose fingerprint was never seen.
    pub required_but_absent: Vec<CertificateEntry>,
}

impl ValidationOutcome {
    /// True iff no category has findings.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.not_allowed.is_empty()
            && self.forbidden.is_empty()
            && self.required_but_absent.is_empty()
    }
}

/// Runtime state compiled from a [`Config`].
#[derive(Debug)]
pub struct Validator {
    permissive: bool,
    allow_sha1: HashSet<Sha1Fingerprint>,
    allow_sha256: HashSet<Sha256Fingerprint>,
    forbid_sha1: HashMap<Sha1Fingerprint, CertificateEntry>,
    forbid_sha256: HashMap<Sha256Fingerprint, CertificateEntry>,
    required: Vec<(EntryFingerprint, CertificateEntry)>,
}

impl Validator {
    /// Compile a config into lookup sets.
    ///
    /// In permissive mode the allow sets stay empty; any certificate not
    /// explicitly forbidden passes. The forbid sets are always populated.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if any entry across the three lists has zero
    /// or two fingerprint kinds, or a fingerprint that is not valid hex of
    /// the right length.
    pub fn new(config: &Config, permissive: bool) -> Result<Self, PolicyError> {
        config.check_entries()?;

        let mut v = Self {
            permissive,
            allow_sha1: HashSet::new(),
            allow_sha256: HashSet::new(),
            forbid_sha1: HashMap::new(),
            forbid_sha256: HashMap::new(),
            required: Vec::with_capacity(config.require.len()),
        };

        if !permissive {
            for (index, entry) in config.allow.iter().enumerate() {
                v.insert_allowed(EntryFingerprint::parse(entry, "allow", index)?);
            }
            for (index, entry) in config.require.iter().enumerate() {
                v.insert_allowed(EntryFingerprint::parse(entry, "require", index)?);
            }
        }

        for (index, entry) in config.forbid.iter().enumerate() {
            match EntryFingerprint::parse(entry, "forbid", index)? {
                EntryFingerprint::Sha1(fp) => {
                    v.forbid_sha1.insert(fp, entry.clone());
                }
                EntryFingerprint::Sha256(fp) => {
                    v.forbid_sha256.insert(fp, entry.clone());
                }
            }
        }

        for (index, entry) in config.require.iter().enumerate() {
            let fp = EntryFingerprint::parse(entry, "require", index)?;
            v.required.push((fp, entry.clone()));
        }

        Ok(v)
    }

    fn insert_allowed(&mut self, fp: EntryFingerprint) {
        match fp {
            EntryFingerprint::Sha1(fp) => {
                self.allow_sha1.insert(fp);
            }
            EntryFingerprint::Sha256(fp) => {
                self.allow_sha256.insert(fp);
            }
        }
    }

    /// One-line summary of the compiled policy, for operator output.
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "{} allowed, {} forbidden, and {} required certificates, in {} mode",
            self.allow_sha1.len() + self.allow_sha256.len(),
            self.forbid_sha1.len() + self.forbid_sha256.len(),
            self.required.len(),
            if self.permissive {
                "permissive"
            } else {
                "strict"
            }
        )
    }

    /// Check a set of found certificates against the compiled policy.
    #[must_use]
    pub fn validate(&self, certs: &[FoundCertificate]) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();
        let mut seen_sha1: HashSet<Sha1Fingerprint> = HashSet::new();
        let mut seen_sha256: HashSet<Sha256Fingerprint> = HashSet::new();

        for fc in certs {
            seen_sha1.insert(fc.fingerprint_sha1);
            seen_sha256.insert(fc.fingerprint_sha256);

            if !self.permissive && !self.is_allowed(fc) {
                outcome.not_allowed.push(fc.clone());
            }

            // Forbid is checked unconditionally; it overrides allow,
            // require, and permissive mode.
            if let Some(entry) = self.forbidden_entry(fc) {
                outcome.forbidden.push(ForbiddenCertificate {
                    certificate: fc.clone(),
                    entry: entry.clone(),
                });
            }
        }

        for (fp, entry) in &self.required {
            let present = match fp {
                EntryFingerprint::Sha1(fp) => seen_sha1.contains(fp),
                EntryFingerprint::Sha256(fp) => seen_sha256.contains(fp),
            };
            if !present {
                outcome.required_but_absent.push(entry.clone());
            }
        }

        outcome
    }

    fn is_allowed(&self, fc: &FoundCertificate) -> bool {
        self.allow_sha1.contains(&fc.fingerprint_sha1)
            || self.allow_sha256.contains(&fc.fingerprint_sha256)
    }

    fn forbidden_entry(&self, fc: &FoundCertificate) -> Option<&CertificateEntry> {
        self.forbid_sha1
            .get(&fc.fingerprint_sha1)
            .or_else(|| self.forbid_sha256.get(&fc.fingerprint_sha256))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::config::Fingerprints;
    use crate::types::CertificateInfo;
    use chrono::Utc;

    fn make_found(der: &[u8]) -> FoundCertificate {
        let now = Utc::now();
        FoundCertificate {
            location: "/etc/ssl/certs/test.pem".into(),
            parser: "pem",
            certificate: CertificateInfo {
                subject: "CN=test".into(),
                issuer: "CN=test".into(),
                serial: "01".into(),
                not_before: now,
                not_after: now,
                signature: Vec::new(),
                der: der.to_vec(),
            },
            fingerprint_sha1: Sha1Fingerprint::of_der(der),
            fingerprint_sha256: Sha256Fingerprint::of_der(der),
        }
    }

    fn sha256_entry(der: &[u8], comment: Option<&str>) -> CertificateEntry {
        CertificateEntry {
            fingerprints: Fingerprints {
                sha1: None,
                sha256: Some(Sha256Fingerprint::of_der(der).to_hex()),
            },
            comment: comment.map(Into::into),
        }
    }

    fn sha1_entry(der: &[u8]) -> CertificateEntry {
        CertificateEntry {
            fingerprints: Fingerprints {
                sha1: Some(Sha1Fingerprint::of_der(der).to_hex()),
                sha256: None,
            },
            comment: None,
        }
    }

    fn config_v1() -> Config {
        Config {
            version: "1".into(),
            ..Config::default()
        }
    }

    #[test]
    fn test_strict_allowed_certificate_passes() {
        let mut config = config_v1();
        config.allow.push(sha256_entry(b"cert-a", None));

        let validator = Validator::new(&config, false).unwrap();
        let outcome = validator.validate(&[make_found(b"cert-a")]);
        assert!(outcome.is_pass());
    }

    #[test]
    fn test_strict_unknown_certificate_is_not_allowed() {
        let mut config = config_v1();
        config.allow.push(sha256_entry(b"cert-a", None));

        let validator = Validator::new(&config, false).unwrap();
        let outcome = validator.validate(&[make_found(b"cert-b")]);
        assert!(!outcome.is_pass());
        assert_eq!(outcome.not_allowed.len(), 1);
        assert_eq!(
            outcome.not_allowed[0].fingerprint_sha256,
            Sha256Fingerprint::of_der(b"cert-b")
        );
    }

    #[test]
    fn test_sha1_allow_entry_matches() {
        let mut config = config_v1();
        config.allow.push(sha1_entry(b"cert-a"));

        let validator = Validator::new(&config, false).unwrap();
        assert!(validator.validate(&[make_found(b"cert-a")]).is_pass());
    }

    #[test]
    fn test_required_certificate_is_implicitly_allowed() {
        let mut config = config_v1();
        config.require.push(sha256_entry(b"cert-a", None));

        let validator = Validator::new(&config, false).unwrap();
        let outcome = validator.validate(&[make_found(b"cert-a")]);
        assert!(outcome.is_pass());
    }

    #[test]
    fn test_required_but_absent_reported() {
        let mut config = config_v1();
        let entry = sha256_entry(b"cert-a", Some("must ship"));
        config.require.push(entry.clone());

        let validator = Validator::new(&config, false).unwrap();
        let outcome = validator.validate(&[]);
        assert_eq!(outcome.required_but_absent, vec![entry]);
        assert!(!outcome.is_pass());
    }

    #[test]
    fn test_forbid_overrides_require() {
        let mut config = config_v1();
        config.require.push(sha256_entry(b"cert-a", None));
        config.forbid.push(sha256_entry(b"cert-a", Some("banned")));

        let validator = Validator::new(&config, false).unwrap();
        let outcome = validator.validate(&[make_found(b"cert-a")]);
        assert!(outcome.not_allowed.is_empty());
        assert_eq!(outcome.forbidden.len(), 1);
        assert_eq!(
            outcome.forbidden[0].entry.comment.as_deref(),
            Some("banned")
        );
        assert!(!outcome.is_pass());
    }

    #[test]
    fn test_permissive_mode_skips_allow_check() {
        let validator = Validator::new(&config_v1(), true).unwrap();
        let outcome = validator.validate(&[make_found(b"anything")]);
        assert!(outcome.is_pass());
    }

    #[test]
    fn test_permissive_mode_still_forbids() {
        let mut config = config_v1();
        config.forbid.push(sha1_entry(b"cert-a"));

        let validator = Validator::new(&config, true).unwrap();
        let outcome = validator.validate(&[make_found(b"cert-a")]);
        assert_eq!(outcome.forbidden.len(), 1);
        assert!(outcome.not_allowed.is_empty());
    }

    #[test]
    fn test_invalid_fingerprint_hex_rejected_at_compile() {
        let mut config = config_v1();
        config.allow.push(CertificateEntry {
            fingerprints: Fingerprints {
                sha1: None,
                sha256: Some("not-hex".into()),
            },
            comment: None,
        });

        let err = Validator::new(&config, false).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::InvalidFingerprint {
                list: "allow",
                kind: "SHA-256",
                ..
            }
        ));
    }

    #[test]
    fn test_describe_mentions_mode() {
        let validator = Validator::new(&config_v1(), true).unwrap();
        assert!(validator.describe().contains("permissive mode"));
        let validator = Validator::new(&config_v1(), false).unwrap();
        assert!(validator.describe().contains("strict mode"));
    }
}
