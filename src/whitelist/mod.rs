// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Whitelist Integrity
//!
//! Whitelisted addresses and assets arrive as envelopes: the record as exact
//! JSON text, its SHA-256 hash, and the approvers' signatures over that hash.
//! A record is only used after its envelope verifies.
//!
//! ## Legacy Payloads
//!
//! Records approved before some optional fields existed were hashed without
//! them. [`legacy_hash`] recomputes those hashes so old approvals stay valid
//! without weakening the check for new ones.

pub mod envelope;
pub mod legacy_hash;
pub mod verifier;

pub use envelope::{
    ApproverSignature, SignedWhitelistBlock, SignedWhitelistEnvelope, WhitelistEnvelopeMetadata,
};
pub use legacy_hash::{compute_hashes, legacy_hashes, PayloadKind, LEGACY_HASH_VERSION};
pub use verifier::{
    extract_address, extract_asset, verify_approvals, verify_approvals_as, verify_envelope,
    verify_envelope_as, verify_field_match,
};
