//! Certificate fingerprints: SHA-1 and SHA-256 over raw DER bytes.
//!
//! Fingerprints are the identity a trust policy keys on, so they are fixed
//! size byte arrays rather than strings: cheap to copy, usable directly as
//! map keys, and impossible to confuse with one another.

use ring::digest::{digest, SHA1_FOR_LEGACY_USE_ONLY, SHA256};
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// A fingerprint string failed to parse.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FingerprintError {
    /// Input was not valid hexadecimal.
    #[error("not valid hex: {0}")]
    InvalidHex(String),

    /// Input decoded to the wrong number of bytes.
    #[error("expected {expected} hex-encoded bytes, got {actual}")]
    BadLength {
        /// Bytes the fingerprint kind requires.
        expected: usize,
        /// Bytes actually decoded.
        actual: usize,
    },
}

macro_rules! fingerprint_type {
    ($name:ident, $len:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Parse from a hex string (case-insensitive, exact length).
            pub fn from_hex(s: &str) -> std::result::Result<Self, FingerprintError> {
                let bytes = hex::decode(s.trim())
                    .map_err(|e| FingerprintError::InvalidHex(e.to_string()))?;
                let arr: [u8; $len] =
                    bytes
                        .try_into()
                        .map_err(|v: Vec<u8>| FingerprintError::BadLength {
                            expected: $len,
                            actual: v.len(),
                        })?;
                Ok(Self(arr))
            }

            /// Raw fingerprint bytes.
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Lowercase hex encoding.
            #[must_use]
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }
    };
}

fingerprint_type!(
    Sha1Fingerprint,
    20,
    "SHA-1 fingerprint of a certificate's DER encoding."
);
fingerprint_type!(
    Sha256Fingerprint,
    32,
    "SHA-256 fingerprint of a certificate's DER encoding."
);

impl Sha1Fingerprint {
    /// Fingerprint raw DER bytes.
    ///
    /// SHA-1 survives here only because decades of certificate tooling
    /// identifies certificates by it; it carries no security weight.
    #[must_use]
    pub fn of_der(der: &[u8]) -> Self {
        let d = digest(&SHA1_FOR_LEGACY_USE_ONLY, der);
        let mut out = [0u8; 20];
        out.copy_from_slice(d.as_ref());
        Self(out)
    }
}

impl Sha256Fingerprint {
    /// Fingerprint raw DER bytes.
    #[must_use]
    pub fn of_der(der: &[u8]) -> Self {
        let d = digest(&SHA256, der);
        let mut out = [0u8; 32];
        out.copy_from_slice(d.as_ref());
        Self(out)
    }
}
