// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Whitelist envelope integrity checks.
//!
//! Verification order for a whitelisted record:
//!
//! 1. [`verify_envelope`]: the metadata hash matches the payload text
//!    (canonical or legacy hash)
//! 2. [`extract_address`] / [`extract_asset`]: the authenticated payload
//!    parses into a record
//! 3. [`verify_approvals`]: enough rules users signed the hash
//! 4. [`verify_field_match`]: a locally stored record agrees with the
//!    authenticated one

use std::collections::HashSet;

use crate::crypto::ecdsa::verify_signature;
use crate::crypto::hashing::hashes_equal;
use crate::error::{IntegrityError, Result, TrustError};
use crate::governance::DecodedRulesContainer;
use crate::models::{WhitelistedAddress, WhitelistedAsset};

use super::envelope::SignedWhitelistEnvelope;
use super::legacy_hash::{compute_hashes, PayloadKind};

/// Verify the hash of an address envelope.
pub fn verify_envelope(envelope: &SignedWhitelistEnvelope) -> Result<bool> {
    verify_envelope_as(envelope, PayloadKind::Address)
}

/// Verify the hash of an envelope carrying a record of `kind`.
///
/// # Errors
/// - `IntegrityError::MissingMetadata` / `MissingPayload` / `MissingHash`
///   when a piece is absent
/// - `IntegrityError::HashMismatch` when neither the canonical hash nor any
///   legacy hash matches
pub fn verify_envelope_as(envelope: &SignedWhitelistEnvelope, kind: PayloadKind) -> Result<bool> {
    let (payload, expected_hash) = metadata_parts(envelope)?;

    for (index, candidate) in compute_hashes(payload, kind).iter().enumerate() {
        if hashes_equal(candidate, expected_hash) {
            if index > 0 {
                tracing::warn!(
                    envelope_id = envelope.id.as_deref().unwrap_or_default(),
                    variant = index,
                    "Whitelist envelope matched a legacy payload hash"
                );
            }
            return Ok(true);
        }
    }

    tracing::warn!(
        envelope_id = envelope.id.as_deref().unwrap_or_default(),
        "Whitelist envelope hash mismatch"
    );
    Err(IntegrityError::HashMismatch.into())
}

/// Parse the whitelisted address, verifying the envelope first if `verify`.
///
/// # Errors
/// Integrity errors from [`verify_envelope`], or `TrustError::Whitelist` if
/// the payload does not parse as an address.
pub fn extract_address(envelope: &SignedWhitelistEnvelope, verify: bool) -> Result<WhitelistedAddress> {
    if verify {
        verify_envelope_as(envelope, PayloadKind::Address)?;
    }
    let (payload, _) = metadata_parts(envelope)?;

    let mut address: WhitelistedAddress = serde_json::from_str(payload)
        .map_err(|e| TrustError::Whitelist(format!("invalid address payload: {e}")))?;
    address.blockchain = address.blockchain.or_else(|| envelope.blockchain.clone());
    address.network = address.network.or_else(|| envelope.network.clone());
    Ok(address)
}

/// Parse the whitelisted asset, verifying the envelope first if `verify`.
pub fn extract_asset(envelope: &SignedWhitelistEnvelope, verify: bool) -> Result<WhitelistedAsset> {
    if verify {
        verify_envelope_as(envelope, PayloadKind::Asset)?;
    }
    let (payload, _) = metadata_parts(envelope)?;

    let mut asset: WhitelistedAsset = serde_json::from_str(payload)
        .map_err(|e| TrustError::Whitelist(format!("invalid asset payload: {e}")))?;
    asset.blockchain = asset.blockchain.or_else(|| envelope.blockchain.clone());
    asset.network = asset.network.or_else(|| envelope.network.clone());
    Ok(asset)
}

/// Check that a locally stored address agrees with the verified envelope.
///
/// Compares address, label, currency, network and contract type. A missing
/// value and an empty string are equal.
pub fn verify_field_match(db_record: &WhitelistedAddress, envelope: &SignedWhitelistEnvelope) -> Result<()> {
    let verified = extract_address(envelope, true)?;

    let fields = [
        ("address", Some(db_record.address.as_str()), Some(verified.address.as_str())),
        ("label", db_record.label.as_deref(), verified.label.as_deref()),
        ("currency", db_record.currency.as_deref(), verified.currency.as_deref()),
        ("network", db_record.network.as_deref(), verified.network.as_deref()),
        (
            "contract_type",
            db_record.contract_type.as_deref(),
            verified.contract_type.as_deref(),
        ),
    ];

    for (field, expected, actual) in fields {
        let expected = expected.unwrap_or_default();
        let actual = actual.unwrap_or_default();
        if expected != actual {
            tracing::warn!(field, "Whitelisted address field mismatch");
            return Err(IntegrityError::FieldMismatch {
                field,
                expected: expected.to_string(),
                actual: actual.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

/// Verify that at least `min_approvals` distinct rules users approved an
/// address envelope. Returns the number of distinct valid approvers.
pub fn verify_approvals(
    envelope: &SignedWhitelistEnvelope,
    rules: &DecodedRulesContainer,
    min_approvals: usize,
) -> Result<usize> {
    verify_approvals_as(envelope, PayloadKind::Address, rules, min_approvals)
}

/// [`verify_approvals`] for an envelope carrying a record of `kind`.
///
/// The envelope hash is verified first. An approval counts when the
/// approver is a rules user, their `hashes` include the envelope hash, and
/// their signature over the JSON array of `hashes` verifies with their key.
pub fn verify_approvals_as(
    envelope: &SignedWhitelistEnvelope,
    kind: PayloadKind,
    rules: &DecodedRulesContainer,
    min_approvals: usize,
) -> Result<usize> {
    if min_approvals == 0 {
        return Err(TrustError::validation("min_approvals must be greater than zero"));
    }
    verify_envelope_as(envelope, kind)?;
    let (_, envelope_hash) = metadata_parts(envelope)?;

    let signatures = envelope
        .signed
        .as_ref()
        .map(|block| block.signatures.as_slice())
        .unwrap_or_default();

    let mut approvers: HashSet<&str> = HashSet::new();
    for approval in signatures {
        if approvers.contains(approval.user_id.as_str()) {
            continue;
        }
        if !approval.hashes.iter().any(|h| hashes_equal(h, envelope_hash)) {
            continue;
        }
        let public_key = match rules.user_public_key(&approval.user_id) {
            Ok(Some(key)) => key,
            Ok(None) => {
                tracing::debug!(user_id = %approval.user_id, "Approver is not a rules user");
                continue;
            }
            Err(e) => {
                tracing::warn!(user_id = %approval.user_id, error = %e, "Approver key does not decode");
                continue;
            }
        };
        let message = serde_json::to_string(&approval.hashes)
            .map_err(|e| TrustError::Whitelist(format!("cannot encode approved hashes: {e}")))?;

        if verify_signature(&public_key, message.as_bytes(), &approval.signature) {
            approvers.insert(approval.user_id.as_str());
        }
    }

    let valid = approvers.len();
    if valid < min_approvals {
        return Err(IntegrityError::InsufficientSignatures {
            valid,
            required: min_approvals,
        }
        .into());
    }
    Ok(valid)
}

fn metadata_parts(envelope: &SignedWhitelistEnvelope) -> Result<(&str, &str)> {
    let metadata = envelope
        .metadata
        .as_ref()
        .ok_or(IntegrityError::MissingMetadata)?;
    let payload = metadata
        .payload_as_string
        .as_deref()
        .ok_or(IntegrityError::MissingPayload)?;
    let hash = metadata
        .hash
        .as_deref()
        .filter(|hash| !hash.trim().is_empty())
        .ok_or(IntegrityError::MissingHash)?;
    Ok((payload, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ecdsa::{generate_private_key, sign_data};
    use crate::crypto::hashing::sha256_hex;
    use crate::crypto::keys::{encode_public_key, PrivateKey};
    use crate::governance::RulesUser;
    use crate::whitelist::envelope::{
        ApproverSignature, SignedWhitelistBlock, WhitelistEnvelopeMetadata,
    };

    const ADDRESS_PAYLOAD: &str = r#"{"currency":"ETH","addressType":"individual","address":"0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12","memo":"","label":"Treasury","customerId":"","contractType":"","labels":["ops"]}"#;

    fn address_envelope(payload: &str, hash: &str) -> SignedWhitelistEnvelope {
        SignedWhitelistEnvelope::new(payload, hash).with_network("ETH", "mainnet")
    }

    fn valid_envelope() -> SignedWhitelistEnvelope {
        address_envelope(ADDRESS_PAYLOAD, &sha256_hex(ADDRESS_PAYLOAD.as_bytes()))
    }

    fn db_record() -> WhitelistedAddress {
        WhitelistedAddress {
            address: "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12".to_string(),
            label: Some("Treasury".to_string()),
            currency: Some("ETH".to_string()),
            network: Some("mainnet".to_string()),
            contract_type: None,
            ..Default::default()
        }
    }

    #[test]
    fn canonical_hash_verifies() {
        assert!(verify_envelope(&valid_envelope()).unwrap());
    }

    #[test]
    fn uppercase_hash_verifies() {
        let hash = sha256_hex(ADDRESS_PAYLOAD.as_bytes()).to_ascii_uppercase();
        assert!(verify_envelope(&address_envelope(ADDRESS_PAYLOAD, &hash)).unwrap());
    }

    #[test]
    fn legacy_hash_verifies() {
        // Signed before `contractType` and `labels` existed.
        let legacy_payload = r#"{"currency":"ETH","addressType":"individual","address":"0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12","memo":"","label":"Treasury","customerId":""}"#;
        let hash = sha256_hex(legacy_payload.as_bytes());

        assert!(verify_envelope(&address_envelope(ADDRESS_PAYLOAD, &hash)).unwrap());
    }

    #[test]
    fn unrelated_hash_fails() {
        let envelope = address_envelope(ADDRESS_PAYLOAD, &sha256_hex(b"something else"));
        let err = verify_envelope(&envelope).unwrap_err();
        assert!(matches!(
            err,
            TrustError::Integrity(IntegrityError::HashMismatch)
        ));
    }

    #[test]
    fn tampered_payload_fails() {
        let mut envelope = valid_envelope();
        let metadata = envelope.metadata.as_mut().unwrap();
        metadata.payload_as_string = Some(ADDRESS_PAYLOAD.replace("Treasury", "Attacker"));
        assert!(verify_envelope(&envelope).unwrap_err().is_integrity());
    }

    #[test]
    fn missing_pieces_are_distinct_errors() {
        let no_metadata = SignedWhitelistEnvelope::default();
        assert!(matches!(
            verify_envelope(&no_metadata),
            Err(TrustError::Integrity(IntegrityError::MissingMetadata))
        ));

        let no_payload = SignedWhitelistEnvelope {
            metadata: Some(WhitelistEnvelopeMetadata {
                hash: Some("ab".to_string()),
                payload_as_string: None,
            }),
            ..Default::default()
        };
        assert!(matches!(
            verify_envelope(&no_payload),
            Err(TrustError::Integrity(IntegrityError::MissingPayload))
        ));

        let no_hash = SignedWhitelistEnvelope {
            metadata: Some(WhitelistEnvelopeMetadata {
                hash: None,
                payload_as_string: Some("{}".to_string()),
            }),
            ..Default::default()
        };
        assert!(matches!(
            verify_envelope(&no_hash),
            Err(TrustError::Integrity(IntegrityError::MissingHash))
        ));
    }

    #[test]
    fn extract_address_fills_network_from_envelope() {
        let address = extract_address(&valid_envelope(), true).unwrap();
        assert_eq!(address.label.as_deref(), Some("Treasury"));
        assert_eq!(address.blockchain.as_deref(), Some("ETH"));
        assert_eq!(address.network.as_deref(), Some("mainnet"));
    }

    #[test]
    fn authentic_but_malformed_payload_is_whitelist_error() {
        let payload = r#"{"label":"no address here"}"#;
        let envelope = address_envelope(payload, &sha256_hex(payload.as_bytes()));

        let err = extract_address(&envelope, true).unwrap_err();
        assert!(matches!(err, TrustError::Whitelist(_)));
        assert!(!err.is_integrity());
    }

    #[test]
    fn extract_without_verification_skips_hash_check() {
        let envelope = address_envelope(ADDRESS_PAYLOAD, "not-the-hash");
        assert!(extract_address(&envelope, true).is_err());
        assert!(extract_address(&envelope, false).is_ok());
    }

    #[test]
    fn extract_asset_uses_asset_legacy_fields() {
        let payload = r#"{"contractAddress":"0xa0b8","symbol":"USDC","decimals":6,"isNFT":false}"#;
        let legacy = r#"{"contractAddress":"0xa0b8","symbol":"USDC","decimals":6}"#;
        let envelope = SignedWhitelistEnvelope::new(payload, sha256_hex(legacy.as_bytes()))
            .with_network("ETH", "mainnet");

        let asset = extract_asset(&envelope, true).unwrap();
        assert_eq!(asset.symbol.as_deref(), Some("USDC"));
        assert_eq!(asset.network.as_deref(), Some("mainnet"));

        assert!(verify_envelope(&envelope).is_err(), "address field list does not include isNFT");
    }

    #[test]
    fn matching_record_passes_field_check() {
        verify_field_match(&db_record(), &valid_envelope()).unwrap();
    }

    #[test]
    fn field_mismatch_names_field() {
        let mut record = db_record();
        record.label = Some("Cold storage".to_string());

        let err = verify_field_match(&record, &valid_envelope()).unwrap_err();
        match err {
            TrustError::Integrity(IntegrityError::FieldMismatch {
                field,
                expected,
                actual,
            }) => {
                assert_eq!(field, "label");
                assert_eq!(expected, "Cold storage");
                assert_eq!(actual, "Treasury");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn network_mismatch_is_detected() {
        let mut record = db_record();
        record.network = Some("sepolia".to_string());
        let err = verify_field_match(&record, &valid_envelope()).unwrap_err();
        assert!(matches!(
            err,
            TrustError::Integrity(IntegrityError::FieldMismatch { field: "network", .. })
        ));
    }

    #[test]
    fn field_check_requires_valid_envelope() {
        let envelope = address_envelope(ADDRESS_PAYLOAD, &sha256_hex(b"forged"));
        assert!(verify_field_match(&db_record(), &envelope)
            .unwrap_err()
            .is_integrity());
    }

    fn approver(id: &str) -> (PrivateKey, RulesUser) {
        let key = generate_private_key();
        let user = RulesUser {
            id: id.to_string(),
            public_key: encode_public_key(&key.public_key()).unwrap(),
            roles: vec![],
        };
        (key, user)
    }

    fn approval(user_id: &str, key: &PrivateKey, hashes: Vec<String>) -> ApproverSignature {
        let message = serde_json::to_string(&hashes).unwrap();
        ApproverSignature {
            user_id: user_id.to_string(),
            signature: sign_data(key, message.as_bytes()).unwrap(),
            hashes,
            comment: None,
        }
    }

    #[test]
    fn approvals_count_distinct_rules_users() {
        let (alice_key, alice) = approver("alice");
        let (bob_key, bob) = approver("bob");
        let (mallory_key, _) = approver("mallory");
        let rules = DecodedRulesContainer {
            users: vec![alice, bob],
            ..Default::default()
        };

        let hash = sha256_hex(ADDRESS_PAYLOAD.as_bytes());
        let mut envelope = valid_envelope();
        envelope.signed = Some(SignedWhitelistBlock {
            payload: None,
            signatures: vec![
                approval("alice", &alice_key, vec![hash.clone()]),
                approval("alice", &alice_key, vec![hash.clone()]),
                approval("mallory", &mallory_key, vec![hash.clone()]),
                approval("bob", &bob_key, vec![sha256_hex(b"other"), hash.clone()]),
            ],
        });

        assert_eq!(
            verify_approvals(&envelope, &rules, 2).unwrap(),
            2
        );

        let err = verify_approvals_as(&envelope, PayloadKind::Address, &rules, 3).unwrap_err();
        assert!(matches!(
            err,
            TrustError::Integrity(IntegrityError::InsufficientSignatures {
                valid: 2,
                required: 3
            })
        ));
    }

    #[test]
    fn approval_for_other_hash_does_not_count() {
        let (alice_key, alice) = approver("alice");
        let rules = DecodedRulesContainer {
            users: vec![alice],
            ..Default::default()
        };
        let mut envelope = valid_envelope();
        envelope.signed = Some(SignedWhitelistBlock {
            payload: None,
            signatures: vec![approval("alice", &alice_key, vec![sha256_hex(b"other")])],
        });

        assert!(verify_approvals(&envelope, &rules, 1).is_err());
        assert!(matches!(
            verify_approvals(&envelope, &rules, 0),
            Err(TrustError::Validation(_))
        ));
    }
}
