// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Governance Rules
//!
//! The custody API publishes its governance rules (users, groups, HSM slot
//! key) as a base64 payload co-signed by SuperAdmins. Nothing in the payload
//! is trusted until enough SuperAdmin signatures verify.
//!
//! ## Flow
//!
//! 1. Fetch the [`GovernanceRulesContainer`] from the API (caller's client)
//! 2. [`GovernanceRulesVerifier::decode_and_verify`] checks the N-of-M
//!    SuperAdmin threshold and decodes a [`DecodedRulesContainer`]
//! 3. [`RulesContainerCache`] keeps the result for a TTL so hot paths such
//!    as address-signature checks skip steps 1-2

pub mod cache;
pub mod container;
pub mod verifier;

pub use cache::{RulesContainerCache, DEFAULT_CACHE_TTL};
pub use container::{
    DecodedRulesContainer, GovernanceRulesContainer, RulesGroup, RulesUser, SignatureEntry,
    HSM_SLOT_ROLE,
};
pub use verifier::{decode_and_verify_rules, verify_governance_rules, GovernanceRulesVerifier};
