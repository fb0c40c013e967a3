// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SuperAdmin threshold verification of governance rules.
//!
//! A container is trusted when at least `min_valid_signatures` of its
//! signatures verify against some key in the trusted SuperAdmin set. Which
//! key matches which entry does not matter. A key that fails to match an
//! entry only means "try the next key"; the error is raised once, at the
//! threshold.

use std::collections::HashSet;

use crate::crypto::ecdsa::{verify_raw, RawSignature};
use crate::crypto::keys::PublicKey;
use crate::error::{IntegrityError, Result, TrustError};

use super::container::{DecodedRulesContainer, GovernanceRulesContainer};

/// Verify that `container` carries enough SuperAdmin signatures.
///
/// # Errors
/// - `TrustError::Validation` if `min_valid_signatures` is zero or
///   `trusted_public_keys` is empty
/// - `IntegrityError::InvalidEncoding` if the payload is not base64
/// - `IntegrityError::NoSignatures` if the container has no signatures
/// - `IntegrityError::InsufficientSignatures` if the threshold is not met
pub fn verify_governance_rules(
    container: &GovernanceRulesContainer,
    min_valid_signatures: usize,
    trusted_public_keys: &[PublicKey],
) -> Result<()> {
    check_parameters(min_valid_signatures, trusted_public_keys)?;

    let payload = container.decode_payload()?;
    if container.signatures.is_empty() {
        return Err(IntegrityError::NoSignatures.into());
    }

    let valid = count_valid_signatures(container, &payload, trusted_public_keys);
    if valid < min_valid_signatures {
        tracing::warn!(
            valid,
            required = min_valid_signatures,
            total = container.signatures.len(),
            "Governance rules signature threshold not met"
        );
        return Err(IntegrityError::InsufficientSignatures {
            valid,
            required: min_valid_signatures,
        }
        .into());
    }

    tracing::debug!(
        valid,
        required = min_valid_signatures,
        "Governance rules signatures verified"
    );
    Ok(())
}

/// Verify `container` and decode its payload.
pub fn decode_and_verify_rules(
    container: &GovernanceRulesContainer,
    min_valid_signatures: usize,
    trusted_public_keys: &[PublicKey],
) -> Result<DecodedRulesContainer> {
    verify_governance_rules(container, min_valid_signatures, trusted_public_keys)?;
    DecodedRulesContainer::from_payload(&container.decode_payload()?)
}

/// Count distinct signatures that verify against at least one trusted key.
///
/// Empty and malformed entries are skipped. Copies of a signature count
/// once, including the `(r, n - s)` twin of a signature.
fn count_valid_signatures(
    container: &GovernanceRulesContainer,
    payload: &[u8],
    trusted_public_keys: &[PublicKey],
) -> usize {
    let mut seen = HashSet::new();

    container
        .signatures
        .iter()
        .filter(|entry| !entry.signature.trim().is_empty())
        .filter_map(|entry| RawSignature::from_base64(&entry.signature).ok())
        .filter(|signature| {
            trusted_public_keys
                .iter()
                .any(|key| verify_raw(key, payload, signature))
        })
        .filter(|signature| seen.insert(*signature.normalized().as_bytes()))
        .count()
}

fn check_parameters(min_valid_signatures: usize, trusted_public_keys: &[PublicKey]) -> Result<()> {
    if min_valid_signatures == 0 {
        return Err(TrustError::validation(
            "min_valid_signatures must be greater than zero",
        ));
    }
    if trusted_public_keys.is_empty() {
        return Err(TrustError::validation(
            "at least one trusted SuperAdmin public key is required",
        ));
    }
    Ok(())
}

/// Threshold and trusted key set bundled for repeated use, typically inside
/// the fetch closure handed to the rules container cache.
#[derive(Debug, Clone)]
pub struct GovernanceRulesVerifier {
    min_valid_signatures: usize,
    trusted_public_keys: Vec<PublicKey>,
}

impl GovernanceRulesVerifier {
    pub fn new(min_valid_signatures: usize, trusted_public_keys: Vec<PublicKey>) -> Result<Self> {
        check_parameters(min_valid_signatures, &trusted_public_keys)?;
        Ok(Self {
            min_valid_signatures,
            trusted_public_keys,
        })
    }

    /// For parameters already validated elsewhere.
    pub(crate) fn from_validated(min_valid_signatures: usize, trusted_public_keys: Vec<PublicKey>) -> Self {
        Self {
            min_valid_signatures,
            trusted_public_keys,
        }
    }

    pub fn min_valid_signatures(&self) -> usize {
        self.min_valid_signatures
    }

    pub fn trusted_public_keys(&self) -> &[PublicKey] {
        &self.trusted_public_keys
    }

    pub fn verify(&self, container: &GovernanceRulesContainer) -> Result<()> {
        verify_governance_rules(container, self.min_valid_signatures, &self.trusted_public_keys)
    }

    pub fn decode_and_verify(
        &self,
        container: &GovernanceRulesContainer,
    ) -> Result<DecodedRulesContainer> {
        decode_and_verify_rules(container, self.min_valid_signatures, &self.trusted_public_keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ecdsa::{generate_private_key, sign_data};
    use crate::crypto::keys::PrivateKey;
    use crate::governance::container::SignatureEntry;
    use base64ct::{Base64, Encoding};

    const PAYLOAD: &[u8] = br#"{"users":[],"groups":[],"timestamp":1700000000}"#;

    fn superadmins(n: usize) -> (Vec<PrivateKey>, Vec<PublicKey>) {
        let private: Vec<_> = (0..n).map(|_| generate_private_key()).collect();
        let public = private.iter().map(PrivateKey::public_key).collect();
        (private, public)
    }

    fn entry(user_id: &str, signature: String) -> SignatureEntry {
        SignatureEntry {
            user_id: user_id.to_string(),
            signature,
        }
    }

    fn container(signatures: Vec<SignatureEntry>) -> GovernanceRulesContainer {
        GovernanceRulesContainer {
            rules_container: Base64::encode_string(PAYLOAD),
            signatures,
        }
    }

    #[test]
    fn two_of_three_with_garbage_entry_passes() {
        let (private, public) = superadmins(3);
        let rules = container(vec![
            entry("sa-0", sign_data(&private[0], PAYLOAD).unwrap()),
            entry("sa-x", Base64::encode_string(&[7u8; 64])),
            entry("sa-2", sign_data(&private[2], PAYLOAD).unwrap()),
        ]);

        verify_governance_rules(&rules, 2, &public).unwrap();
    }

    #[test]
    fn one_of_two_required_fails_with_counts() {
        let (private, public) = superadmins(3);
        let rules = container(vec![
            entry("sa-0", sign_data(&private[0], PAYLOAD).unwrap()),
            entry("sa-x", "garbage".to_string()),
        ]);

        let err = verify_governance_rules(&rules, 2, &public).unwrap_err();
        assert!(matches!(
            err,
            TrustError::Integrity(IntegrityError::InsufficientSignatures {
                valid: 1,
                required: 2
            })
        ));
        assert!(err.to_string().contains("1 valid, 2 required"));
    }

    #[test]
    fn signer_reference_is_not_used_for_matching() {
        let (private, public) = superadmins(2);
        let rules = container(vec![
            entry("sa-1", sign_data(&private[0], PAYLOAD).unwrap()),
            entry("sa-0", sign_data(&private[1], PAYLOAD).unwrap()),
        ]);
        verify_governance_rules(&rules, 2, &public).unwrap();
    }

    #[test]
    fn untrusted_signer_does_not_count() {
        let (_, public) = superadmins(2);
        let outsider = generate_private_key();
        let rules = container(vec![entry("x", sign_data(&outsider, PAYLOAD).unwrap())]);

        let err = verify_governance_rules(&rules, 1, &public).unwrap_err();
        assert!(matches!(
            err,
            TrustError::Integrity(IntegrityError::InsufficientSignatures { valid: 0, .. })
        ));
    }

    #[test]
    fn duplicated_signature_counts_once() {
        let (private, public) = superadmins(2);
        let signature = sign_data(&private[0], PAYLOAD).unwrap();
        let rules = container(vec![entry("a", signature.clone()), entry("b", signature)]);

        assert!(verify_governance_rules(&rules, 2, &public).is_err());
    }

    #[test]
    fn negated_s_twin_counts_once() {
        let (private, public) = superadmins(2);
        let signature = sign_data(&private[0], PAYLOAD).unwrap();
        let twin = negated_s(&signature);
        assert_ne!(twin, signature);
        assert!(crate::crypto::ecdsa::verify_signature(&public[0], PAYLOAD, &twin));

        let rules = container(vec![entry("a", signature), entry("b", twin)]);
        let err = verify_governance_rules(&rules, 2, &public).unwrap_err();
        assert!(matches!(
            err,
            TrustError::Integrity(IntegrityError::InsufficientSignatures {
                valid: 1,
                required: 2
            })
        ));
    }

    fn negated_s(signature_b64: &str) -> String {
        let raw = RawSignature::from_base64(signature_b64).unwrap();
        let signature = p256::ecdsa::Signature::from_slice(raw.as_bytes()).unwrap();
        let (r, s) = signature.split_scalars();
        let twin = p256::ecdsa::Signature::from_scalars(r, -s).unwrap();
        RawSignature::from(&twin).to_base64()
    }

    #[test]
    fn signature_over_other_payload_is_rejected() {
        let (private, public) = superadmins(1);
        let rules = container(vec![entry("sa", sign_data(&private[0], b"other").unwrap())]);
        assert!(verify_governance_rules(&rules, 1, &public).is_err());
    }

    #[test]
    fn empty_signatures_are_skipped() {
        let (private, public) = superadmins(1);
        let rules = container(vec![
            entry("sa", String::new()),
            entry("sa", sign_data(&private[0], PAYLOAD).unwrap()),
        ]);
        verify_governance_rules(&rules, 1, &public).unwrap();
    }

    #[test]
    fn no_signatures_is_an_integrity_error() {
        let (_, public) = superadmins(1);
        let err = verify_governance_rules(&container(vec![]), 1, &public).unwrap_err();
        assert!(matches!(
            err,
            TrustError::Integrity(IntegrityError::NoSignatures)
        ));
    }

    #[test]
    fn invalid_payload_encoding_is_an_integrity_error() {
        let (private, public) = superadmins(1);
        let mut rules = container(vec![entry("sa", sign_data(&private[0], PAYLOAD).unwrap())]);
        rules.rules_container = "***".to_string();

        let err = verify_governance_rules(&rules, 1, &public).unwrap_err();
        assert!(matches!(
            err,
            TrustError::Integrity(IntegrityError::InvalidEncoding(_))
        ));
        assert!(err.to_string().contains("invalid base64 encoding"));
    }

    #[test]
    fn preconditions_are_validation_errors() {
        let (private, public) = superadmins(1);
        let rules = container(vec![entry("sa", sign_data(&private[0], PAYLOAD).unwrap())]);

        assert!(matches!(
            verify_governance_rules(&rules, 0, &public),
            Err(TrustError::Validation(_))
        ));
        assert!(matches!(
            verify_governance_rules(&rules, 1, &[]),
            Err(TrustError::Validation(_))
        ));
        assert!(GovernanceRulesVerifier::new(0, public.clone()).is_err());
        assert!(GovernanceRulesVerifier::new(1, vec![]).is_err());
    }

    #[test]
    fn verifier_decodes_payload() {
        let (private, public) = superadmins(2);
        let rules = container(vec![
            entry("sa-0", sign_data(&private[0], PAYLOAD).unwrap()),
            entry("sa-1", sign_data(&private[1], PAYLOAD).unwrap()),
        ]);

        let verifier = GovernanceRulesVerifier::new(2, public).unwrap();
        let decoded = verifier.decode_and_verify(&rules).unwrap();
        assert_eq!(decoded.timestamp, 1_700_000_000);
    }
}
