// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error types shared by every trust component.
//!
//! Callers are expected to fail closed on [`TrustError::Integrity`]: it means
//! signed data did not authenticate, as opposed to [`TrustError::Whitelist`]
//! where the data authenticated but could not be parsed.

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TrustError>;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum TrustError {
    /// Caller supplied structurally invalid input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A signature, hash or asserted field did not verify.
    #[error("integrity check failed: {0}")]
    Integrity(#[from] IntegrityError),

    /// Payload hash was valid but the content does not parse.
    #[error("whitelisted payload is malformed: {0}")]
    Whitelist(String),

    /// The request signer was closed and its secret wiped.
    #[error("signer is closed")]
    SignerClosed,

    /// Opaque failure reported by the injected rules container fetcher.
    #[error("failed to fetch governance rules: {0}")]
    Fetch(String),
}

/// Integrity failures, detailed enough to diagnose without leaking secrets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    #[error("invalid base64 encoding: {0}")]
    InvalidEncoding(String),

    #[error("decoded rules container is malformed: {0}")]
    MalformedRules(String),

    #[error("governance rules container has no signatures")]
    NoSignatures,

    #[error("insufficient valid signatures: {valid} valid, {required} required")]
    InsufficientSignatures { valid: usize, required: usize },

    #[error("envelope has no metadata")]
    MissingMetadata,

    #[error("envelope metadata has no payload")]
    MissingPayload,

    #[error("envelope metadata has no hash")]
    MissingHash,

    #[error("payload hash does not match the canonical or any legacy hash")]
    HashMismatch,

    #[error("field `{field}` mismatch: expected {expected:?}, envelope has {actual:?}")]
    FieldMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },
}

impl TrustError {
    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            TrustError::Validation(_) => "validation_error",
            TrustError::Integrity(inner) => inner.error_code(),
            TrustError::Whitelist(_) => "whitelist_parse_error",
            TrustError::SignerClosed => "signer_closed",
            TrustError::Fetch(_) => "fetch_error",
        }
    }

    /// True when signed data failed to authenticate.
    pub fn is_integrity(&self) -> bool {
        matches!(self, TrustError::Integrity(_))
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        TrustError::Validation(message.into())
    }
}

impl IntegrityError {
    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            IntegrityError::InvalidEncoding(_) => "invalid_encoding",
            IntegrityError::MalformedRules(_) => "malformed_rules",
            IntegrityError::NoSignatures => "no_signatures",
            IntegrityError::InsufficientSignatures { .. } => "insufficient_signatures",
            IntegrityError::MissingMetadata => "missing_metadata",
            IntegrityError::MissingPayload => "missing_payload",
            IntegrityError::MissingHash => "missing_hash",
            IntegrityError::HashMismatch => "hash_mismatch",
            IntegrityError::FieldMismatch { .. } => "field_mismatch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_signatures_reports_counts() {
        let err = TrustError::from(IntegrityError::InsufficientSignatures {
            valid: 1,
            required: 2,
        });
        assert!(err.is_integrity());
        assert_eq!(err.error_code(), "insufficient_signatures");
        assert!(err.to_string().contains("1 valid, 2 required"));
    }

    #[test]
    fn field_mismatch_names_field_and_values() {
        let err = IntegrityError::FieldMismatch {
            field: "label",
            expected: "cold storage".to_string(),
            actual: "attacker".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("`label`"));
        assert!(message.contains("cold storage"));
        assert!(message.contains("attacker"));
    }

    #[test]
    fn non_integrity_errors_have_distinct_codes() {
        assert_eq!(TrustError::SignerClosed.error_code(), "signer_closed");
        assert_eq!(
            TrustError::Whitelist("bad json".into()).error_code(),
            "whitelist_parse_error"
        );
        assert!(!TrustError::Fetch("timeout".into()).is_integrity());
        assert!(!TrustError::validation("empty").is_integrity());
    }
}
