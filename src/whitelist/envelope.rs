// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed whitelist envelope as returned by the API.
//!
//! Every field is optional on the wire so that a missing piece surfaces as a
//! specific integrity error instead of a deserialization failure.

use serde::{Deserialize, Serialize};

/// Hash and payload text of a whitelisted record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistEnvelopeMetadata {
    /// Hex SHA-256 of `payload_as_string` (or of a legacy variant of it).
    #[serde(default)]
    pub hash: Option<String>,
    /// The record as the exact JSON text that was hashed.
    #[serde(default)]
    pub payload_as_string: Option<String>,
}

/// A whitelisted address or asset with its integrity metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignedWhitelistEnvelope {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub blockchain: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub metadata: Option<WhitelistEnvelopeMetadata>,
    /// Approver signatures. Older API versions name this block after the
    /// record type.
    #[serde(default, alias = "signedAddress", alias = "signedContractAddress")]
    pub signed: Option<SignedWhitelistBlock>,
}

/// Approvals collected for a whitelisted record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignedWhitelistBlock {
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub signatures: Vec<ApproverSignature>,
}

/// One approver's signature over the list of hashes they approved.
///
/// The signed message is the compact JSON array of `hashes`, e.g.
/// `["9f86d0…","60303a…"]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApproverSignature {
    pub user_id: String,
    /// Base64 raw `r‖s` signature.
    pub signature: String,
    #[serde(default)]
    pub hashes: Vec<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl SignedWhitelistEnvelope {
    /// Envelope with metadata only.
    pub fn new(payload_as_string: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            metadata: Some(WhitelistEnvelopeMetadata {
                hash: Some(hash.into()),
                payload_as_string: Some(payload_as_string.into()),
            }),
            ..Default::default()
        }
    }

    pub fn with_network(mut self, blockchain: impl Into<String>, network: impl Into<String>) -> Self {
        self.blockchain = Some(blockchain.into());
        self.network = Some(network.into());
        self
    }
}
