//! Output formats and the JSON rendering contract.

use chrono::SecondsFormat;
use clap::ValueEnum;
use serde::Serialize;

use certhound_core::ParsedCertificates;

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Compact listing: location and subject
    #[default]
    Pretty,
    /// Adds parser, validity window, and SHA-256 fingerprint
    Wide,
    /// Machine-readable JSON
    Json,
    /// Re-emit every found certificate as a PEM block
    Pem,
}

/// Top-level JSON document for `inspect --output json`.
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    pub certificates: Vec<JsonCertificate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partials: Vec<JsonPartialCertificate>,
}

/// One found certificate on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonCertificate {
    pub file_location: String,
    pub owner: String,
    pub parser: String,
    /// Certificate signature bytes, uppercase hex.
    pub signature: String,
    /// RFC 3339.
    pub not_before: String,
    /// RFC 3339.
    pub not_after: String,
    /// Lowercase hex.
    #[serde(rename = "fingerprintSHA1")]
    pub fingerprint_sha1: String,
    /// Lowercase hex.
    #[serde(rename = "fingerprintSHA256")]
    pub fingerprint_sha256: String,
}

/// One partial certificate on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonPartialCertificate {
    pub file_location: String,
    pub parser: String,
    pub reason: String,
}

impl JsonOutput {
    /// Map a discovery aggregate onto the external JSON contract.
    #[must_use]
    pub fn from_results(results: &ParsedCertificates) -> Self {
        let certificates = results
            .found
            .iter()
            .map(|cert| JsonCertificate {
                file_location: cert.location.clone(),
                owner: cert.certificate.subject.clone(),
                parser: cert.parser.to_string(),
                signature: hex::encode_upper(&cert.certificate.signature),
                not_before: cert
                    .certificate
                    .not_before
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                not_after: cert
                    .certificate
                    .not_after
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                fingerprint_sha1: cert.fingerprint_sha1.to_hex(),
                fingerprint_sha256: cert.fingerprint_sha256.to_hex(),
            })
            .collect();

        let partials = results
            .partials
            .iter()
            .map(|p| JsonPartialCertificate {
                file_location: p.location.clone(),
                parser: p.parser.to_string(),
                reason: p.reason.clone(),
            })
            .collect();

        Self {
            certificates,
            partials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certhound_core::{
        CertificateInfo, FoundCertificate, PartialCertificate, Sha1Fingerprint, Sha256Fingerprint,
    };
    use chrono::{TimeZone, Utc};

    fn sample_results() -> ParsedCertificates {
        ParsedCertificates {
            found: vec![FoundCertificate {
                location: "/etc/ssl/certs/ca.pem".into(),
                parser: "pem",
                certificate: CertificateInfo {
                    subject: "CN=Test Root".into(),
                    issuer: "CN=Test Root".into(),
                    serial: "01".into(),
                    not_before: Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap(),
                    not_after: Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap(),
                    signature: vec![0xab, 0xcd],
                    der: b"fake-der".to_vec(),
                },
                fingerprint_sha1: Sha1Fingerprint::of_der(b"fake-der"),
                fingerprint_sha256: Sha256Fingerprint::of_der(b"fake-der"),
            }],
            partials: vec![PartialCertificate {
                location: "/var/log/app.log".into(),
                parser: "pem",
                reason: "found start of PEM encoded certificate, but could not find end".into(),
            }],
        }
    }

    #[test]
    fn test_json_field_names_match_contract() {
        let out = JsonOutput::from_results(&sample_results());
        let doc = serde_json::to_string(&out).unwrap();
        assert!(doc.contains("\"certificates\""));
        assert!(doc.contains("\"partials\""));
        assert!(doc.contains("\"fileLocation\""));
        assert!(doc.contains("\"owner\""));
        assert!(doc.contains("\"notBefore\""));
        assert!(doc.contains("\"notAfter\""));
        assert!(doc.contains("\"fingerprintSHA1\""));
        assert!(doc.contains("\"fingerprintSHA256\""));
    }

    #[test]
    fn test_json_value_formatting() {
        let out = JsonOutput::from_results(&sample_results());
        let cert = &out.certificates[0];
        assert_eq!(cert.signature, "ABCD");
        assert_eq!(cert.not_before, "2020-01-02T03:04:05Z");
        assert_eq!(cert.not_after, "2030-01-02T03:04:05Z");
        assert_eq!(cert.fingerprint_sha1, Sha1Fingerprint::of_der(b"fake-der").to_hex());
        assert!(cert
            .fingerprint_sha256
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_partials_omitted_when_empty() {
        let mut results = sample_results();
        results.partials.clear();
        let doc = serde_json::to_string(&JsonOutput::from_results(&results)).unwrap();
        assert!(!doc.contains("\"partials\""));
    }
}
