//! Tolerant PEM certificate scanner.
//!
//! Finds X.509 PEM-encoded certificates anywhere in a byte stream by
//! matching the `-----BEGIN CERTIFICATE-----` marker one byte at a time.
//! Whitespace and control characters are skipped during marker matching, so
//! certificates mangled by line wrapping or log transport still match. When
//! a block cannot be fully decoded it is recorded as a partial certificate
//! and scanning resumes, rewinding the cursor where consumed bytes might
//! hide the start of another certificate.

use chrono::{DateTime, TimeZone, Utc};
use std::io::{Read, Seek, SeekFrom};

use crate::cancel::CancellationToken;
use crate::discovery::opener::ByteSource;
use crate::discovery::CertificateParser;
use crate::error::ScanError;
use crate::fingerprint::{Sha1Fingerprint, Sha256Fingerprint};
use crate::types::{CertificateInfo, FoundCertificate, ParsedCertificates, PartialCertificate};

const PEM_BEGIN: &[u8] = b"-----BEGIN CERTIFICATE-----";
const PEM_END: &[u8] = b"-----END CERTIFICATE-----";

/// Index of the space inside each marker. The real space byte is in the
/// ignored set, so the matcher synthesizes it at the right position.
const BEGIN_SPACE_AT: usize = 10;
const END_SPACE_AT: usize = 8;

/// Bytes skipped transparently while matching markers.
const IGNORED: &[u8] = &[
    b'\n', b'\t', b'\r', b' ', 0x0c, 0x0b, 0x08, 0x00, b'"', b'\'',
];

const REASON_NO_END: &str = "found start of PEM encoded certificate, but could not find end";
const REASON_UNDECODABLE: &str =
    "a block of data looks like a PEM certificate, but cannot be decoded";

/// PEM certificate parser.
pub struct PemScanner;

impl PemScanner {
    /// Parser identifier recorded on every finding.
    pub const NAME: &'static str = "pem";
}

impl CertificateParser for PemScanner {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn scan(
        &self,
        token: &CancellationToken,
        location: &str,
        source: &ByteSource,
    ) -> Result<ParsedCertificates, ScanError> {
        let reader = source.open().map_err(|e| ScanError::Io {
            path: location.to_string(),
            source: e,
        })?;
        ScanCursor::new(reader, token, location).run()
    }
}

/// One pass over one file's bytes.
struct ScanCursor<'a, R> {
    reader: R,
    token: &'a CancellationToken,
    location: &'a str,
    results: ParsedCertificates,
}

impl<'a, R: Read + Seek> ScanCursor<'a, R> {
    fn new(reader: R, token: &'a CancellationToken, location: &'a str) -> Self {
        Self {
            reader,
            token,
            location,
            results: ParsedCertificates::default(),
        }
    }

    fn run(mut self) -> Result<ParsedCertificates, ScanError> {
        while self.match_header()? {
            let (block, footer_matched) = self.collect_block()?;
            self.resolve_block(block, footer_matched)?;
        }
        Ok(self.results)
    }

    /// Read one byte, or `None` at end of file.
    fn next_byte(&mut self) -> Result<Option<u8>, ScanError> {
        if self.token.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        let mut token = [0u8; 1];
        loop {
            match self.reader.read(&mut token) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(token[0])),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    return Err(ScanError::Io {
                        path: self.location.to_string(),
                        source: e,
                    })
                }
            }
        }
    }

    /// Scan forward until the BEGIN marker fully matches.
    ///
    /// Returns false when the file ends first. Ignored bytes never reset the
    /// match; any other mismatching byte resets it to empty.
    fn match_header(&mut self) -> Result<bool, ScanError> {
        let mut matched = 0usize;
        while matched < PEM_BEGIN.len() {
            let Some(b) = self.next_byte()? else {
                return Ok(false);
            };
            if IGNORED.contains(&b) {
                continue;
            }
            if b == PEM_BEGIN[matched] {
                matched += 1;
            } else {
                matched = 0;
            }
            if matched == BEGIN_SPACE_AT {
                matched += 1;
            }
        }
        Ok(true)
    }

    /// Accumulate the candidate block while matching the END marker.
    ///
    /// Every byte lands in the block, except ignored bytes seen while the
    /// footer match is partway through. Returns the block and whether the
    /// footer actually matched before end of file.
    fn collect_block(&mut self) -> Result<(Vec<u8>, bool), ScanError> {
        let mut block = PEM_BEGIN.to_vec();
        let mut footer = 0usize;

        loop {
            let Some(b) = self.next_byte()? else {
                return Ok((block, false));
            };

            if IGNORED.contains(&b) {
                if footer == 0 || footer == END_SPACE_AT + 1 {
                    block.push(b);
                }
                continue;
            }

            block.push(b);

            if b == PEM_END[footer] {
                footer += 1;
            } else {
                footer = 0;
            }
            if footer == END_SPACE_AT {
                footer += 1;
            }
            if footer == PEM_END.len() {
                return Ok((block, true));
            }
        }
    }

    /// Decide what the accumulated block was.
    fn resolve_block(&mut self, block: Vec<u8>, footer_matched: bool) -> Result<(), ScanError> {
        if !footer_matched {
            self.push_partial(REASON_NO_END.to_string());
            return self.rewind_past_header(block.len());
        }

        let Ok(decoded) = pem::parse(&block) else {
            self.push_partial(REASON_UNDECODABLE.to_string());
            // The footer that closed this block may belong to a real
            // certificate whose own BEGIN marker was swallowed into the
            // block; re-offer everything past our header.
            return self.rewind_past_header(block.len());
        };

        let der = decoded.into_contents();
        match parse_certificate(&der) {
            Ok(certificate) => {
                let fingerprint_sha1 = Sha1Fingerprint::of_der(&der);
                let fingerprint_sha256 = Sha256Fingerprint::of_der(&der);
                self.results.found.push(FoundCertificate {
                    location: self.location.to_string(),
                    parser: PemScanner::NAME,
                    certificate,
                    fingerprint_sha1,
                    fingerprint_sha256,
                });
            }
            Err(reason) => {
                self.push_partial(format!("failed to parse PEM certificate: {reason}"));
            }
        }
        Ok(())
    }

    /// Seek backward to just past the matched BEGIN marker, re-offering the
    /// bytes consumed while searching for a footer.
    fn rewind_past_header(&mut self, block_len: usize) -> Result<(), ScanError> {
        let delta = i64::try_from(block_len - PEM_BEGIN.len() + 1)
            .map_err(|e| ScanError::Internal(e.to_string()))?;
        self.reader
            .seek(SeekFrom::Current(-delta))
            .map_err(ScanError::Seek)?;
        Ok(())
    }

    fn push_partial(&mut self, reason: String) {
        self.results.partials.push(PartialCertificate {
            location: self.location.to_string(),
            parser: PemScanner::NAME,
            reason,
        });
    }
}

/// Parse one DER-encoded X.509 certificate into an owned summary.
fn parse_certificate(der: &[u8]) -> Result<CertificateInfo, String> {
    let (_, cert) = x509_parser::parse_x509_certificate(der).map_err(|e| e.to_string())?;

    Ok(CertificateInfo {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        serial: cert.raw_serial_as_string(),
        not_before: asn1_to_utc(cert.validity().not_before),
        not_after: asn1_to_utc(cert.validity().not_after),
        signature: cert.signature_value.data.to_vec(),
        der: der.to_vec(),
    })
}

/// Convert an ASN.1 `GeneralizedTime` / `UTCTime` to `DateTime<Utc>`.
fn asn1_to_utc(t: x509_parser::time::ASN1Time) -> DateTime<Utc> {
    Utc.timestamp_opt(t.timestamp(), 0)
        .single()
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_bytes(content: &[u8]) -> Result<ParsedCertificates, ScanError> {
        let source = ByteSource::Memory(content.to_vec());
        PemScanner.scan(&CancellationToken::new(), "/test/file", &source)
    }

    /// Self-signed certificate PEM + DER with the given common name.
    fn test_cert(cn: &str) -> (String, Vec<u8>) {
        let key = rcgen::KeyPair::generate().unwrap();
        let mut params = rcgen::CertificateParams::default();
        let mut dn = rcgen::DistinguishedName::new();
        dn.push(rcgen::DnType::CommonName, cn);
        params.distinguished_name = dn;
        let cert = params.self_signed(&key).unwrap();
        (cert.pem(), cert.der().as_ref().to_vec())
    }

    #[test]
    fn test_contiguous_certificates_all_found() {
        let (pem_a, _) = test_cert("alpha");
        let (pem_b, _) = test_cert("bravo");
        let (pem_c, _) = test_cert("charlie");
        let content = format!("{pem_a}{pem_b}{pem_c}");

        let results = scan_bytes(content.as_bytes()).unwrap();
        assert_eq!(results.found.len(), 3);
        assert!(results.partials.is_empty());

        let subjects: Vec<&str> = results
            .found
            .iter()
            .map(|f| f.certificate.subject.as_str())
            .collect();
        assert!(subjects[0].contains("alpha"));
        assert!(subjects[1].contains("bravo"));
        assert!(subjects[2].contains("charlie"));
        for f in &results.found {
            assert_eq!(f.location, "/test/file");
            assert_eq!(f.parser, "pem");
        }
    }

    #[test]
    fn test_certificate_surrounded_by_noise() {
        let (pem, der) = test_cert("noisy");
        let content = format!("random prefix bytes\n{pem}trailing data without markers");

        let results = scan_bytes(content.as_bytes()).unwrap();
        assert_eq!(results.found.len(), 1);
        assert!(results.partials.is_empty());
        assert_eq!(results.found[0].certificate.der, der);
    }

    #[test]
    fn test_mangled_markers_still_match() {
        let (pem, _) = test_cert("mangled");
        let clean = scan_bytes(pem.as_bytes()).unwrap();

        // Whitespace splattered inside both marker lines.
        let mangled = pem
            .replace("-----BEGIN CERTIFICATE-----", "--\n---BEG\tIN  CERTIF\r\nICATE-----")
            .replace("-----END CERTIFICATE-----", "-----E\nND CERTIFICATE--\t---");

        let results = scan_bytes(mangled.as_bytes()).unwrap();
        assert_eq!(results.found.len(), 1);
        assert!(results.partials.is_empty());
        assert_eq!(
            results.found[0].fingerprint_sha256,
            clean.found[0].fingerprint_sha256
        );
        assert_eq!(
            results.found[0].fingerprint_sha1,
            clean.found[0].fingerprint_sha1
        );
    }

    #[test]
    fn test_truncated_at_eof_reports_partial() {
        let content = b"-----BEGIN CERTIFICATE-----\nMIIBszCCAV\n";
        let results = scan_bytes(content).unwrap();
        assert!(results.found.is_empty());
        assert_eq!(results.partials.len(), 1);
        assert!(results.partials[0].reason.contains("could not find end"));
        assert_eq!(results.partials[0].location, "/test/file");
    }

    #[test]
    fn test_certificate_after_truncated_block_is_recovered() {
        let (pem, der) = test_cert("survivor");
        // A truncated block swallows the good certificate during its footer
        // search; the rewind must re-offer it.
        let content = format!("-----BEGIN CERTIFICATE-----\nMIIBszCCAV\n{pem}");

        let results = scan_bytes(content.as_bytes()).unwrap();
        assert_eq!(results.found.len(), 1);
        assert_eq!(results.found[0].certificate.der, der);
        assert!(results.found[0].certificate.subject.contains("survivor"));
        assert_eq!(results.partials.len(), 1);
        assert!(results.partials[0].reason.contains("cannot be decoded"));
    }

    #[test]
    fn test_undecodable_block_reports_partial() {
        let content =
            b"-----BEGIN CERTIFICATE-----\n!!!! not base64 at all !!!!\n-----END CERTIFICATE-----\n";
        let results = scan_bytes(content).unwrap();
        assert!(results.found.is_empty());
        assert_eq!(results.partials.len(), 1);
        assert!(results.partials[0].reason.contains("cannot be decoded"));
    }

    #[test]
    fn test_valid_base64_invalid_der_reports_parse_failure() {
        // "this is not a certificate"
        let content = b"-----BEGIN CERTIFICATE-----\ndGhpcyBpcyBub3QgYSBjZXJ0aWZpY2F0ZQ==\n-----END CERTIFICATE-----\n";
        let results = scan_bytes(content).unwrap();
        assert!(results.found.is_empty());
        assert_eq!(results.partials.len(), 1);
        assert!(results.partials[0]
            .reason
            .contains("failed to parse PEM certificate"));
    }

    #[test]
    fn test_fingerprints_match_der_digests() {
        let (pem, der) = test_cert("digest");
        let results = scan_bytes(pem.as_bytes()).unwrap();
        assert_eq!(results.found.len(), 1);
        assert_eq!(
            results.found[0].fingerprint_sha256,
            Sha256Fingerprint::of_der(&der)
        );
        assert_eq!(
            results.found[0].fingerprint_sha1,
            Sha1Fingerprint::of_der(&der)
        );
    }

    #[test]
    fn test_same_bytes_fingerprint_identically() {
        let (pem, _) = test_cert("twin");
        let first = scan_bytes(pem.as_bytes()).unwrap();
        let second = scan_bytes(pem.as_bytes()).unwrap();
        assert_eq!(
            first.found[0].fingerprint_sha256,
            second.found[0].fingerprint_sha256
        );
        assert_eq!(
            first.found[0].fingerprint_sha1,
            second.found[0].fingerprint_sha1
        );
    }

    #[test]
    fn test_cancellation_stops_scan() {
        let (pem, _) = test_cert("cancelled");
        let token = CancellationToken::new();
        token.cancel();

        let source = ByteSource::Memory(pem.into_bytes());
        let err = PemScanner.scan(&token, "/test/file", &source).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_empty_file_finds_nothing() {
        let results = scan_bytes(b"").unwrap();
        assert!(results.is_empty());
    }
}
