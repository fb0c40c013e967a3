// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Governance rules container: the signed wire form and its decoded payload.

use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};

use crate::crypto::keys::{decode_public_key, PublicKey};
use crate::error::{IntegrityError, Result, TrustError};

/// Role carried by the rules user that represents the HSM signing slot.
pub const HSM_SLOT_ROLE: &str = "HSMSLOT";

/// Governance rules as returned by the API: a base64 payload plus the
/// SuperAdmin signatures over the decoded payload bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceRulesContainer {
    /// Base64-encoded rules payload.
    pub rules_container: String,
    #[serde(default)]
    pub signatures: Vec<SignatureEntry>,
}

/// One SuperAdmin signature over the rules payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignatureEntry {
    /// Opaque reference to the signer. Not used for matching.
    #[serde(default)]
    pub user_id: String,
    /// Base64 raw `r‖s` signature.
    #[serde(default)]
    pub signature: String,
}

impl GovernanceRulesContainer {
    /// Base64-decode the payload.
    pub fn decode_payload(&self) -> std::result::Result<Vec<u8>, IntegrityError> {
        Base64::decode_vec(self.rules_container.trim())
            .map_err(|e| IntegrityError::InvalidEncoding(e.to_string()))
    }
}

/// Decoded, verified governance rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DecodedRulesContainer {
    #[serde(default)]
    pub users: Vec<RulesUser>,
    #[serde(default)]
    pub groups: Vec<RulesGroup>,
    /// Minimum number of distinct users that must approve a change.
    #[serde(default)]
    pub minimum_distinct_user_signatures: u32,
    /// Server-side creation time of this rules version (Unix seconds).
    #[serde(default)]
    pub timestamp: i64,
}

/// A user known to the governance rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RulesUser {
    pub id: String,
    /// PEM-encoded P-256 public key.
    pub public_key: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// A named group of rules users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RulesGroup {
    pub id: String,
    #[serde(default)]
    pub user_ids: Vec<String>,
}

impl RulesUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    /// Decode this user's public key.
    pub fn decoded_public_key(&self) -> Result<PublicKey> {
        decode_public_key(&self.public_key)
    }
}

impl DecodedRulesContainer {
    /// Parse the decoded payload bytes of a verified container.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload)
            .map_err(|e| IntegrityError::MalformedRules(e.to_string()).into())
    }

    pub fn find_user(&self, user_id: &str) -> Option<&RulesUser> {
        self.users.iter().find(|user| user.id == user_id)
    }

    pub fn find_group(&self, group_id: &str) -> Option<&RulesGroup> {
        self.groups.iter().find(|group| group.id == group_id)
    }

    pub fn users_with_role<'a>(&'a self, role: &'a str) -> impl Iterator<Item = &'a RulesUser> {
        self.users.iter().filter(move |user| user.has_role(role))
    }

    /// Public key of a rules user, or `None` if the user is unknown.
    pub fn user_public_key(&self, user_id: &str) -> Result<Option<PublicKey>> {
        self.find_user(user_id)
            .map(RulesUser::decoded_public_key)
            .transpose()
    }

    /// Public key of the HSM slot, used to check address signatures.
    ///
    /// # Errors
    /// `TrustError::Validation` if no user holds [`HSM_SLOT_ROLE`] or its key
    /// does not decode as P-256.
    pub fn get_hsm_public_key(&self) -> Result<PublicKey> {
        let user = self.users_with_role(HSM_SLOT_ROLE).next().ok_or_else(|| {
            TrustError::validation(format!("rules container has no {HSM_SLOT_ROLE} user"))
        })?;
        user.decoded_public_key()
    }
}
