// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Cryptographic Primitives
//!
//! Everything here is NIST P-256 / SHA-256 only. Other curves are rejected
//! when keys are decoded, so the signing and verification functions can take
//! typed keys and never re-check the curve themselves.
//!
//! - `hashing` - SHA-256 digests and constant-time comparison
//! - `keys` - PEM decoding/encoding of P-256 keys
//! - `ecdsa` - raw `r‖s` signatures over SHA-256

pub mod ecdsa;
pub mod hashing;
pub mod keys;

pub use ecdsa::{
    generate_private_key, sign_data, verify_raw, verify_signature, RawSignature, RAW_SIGNATURE_LEN,
};
pub use hashing::{constant_time_eq, hashes_equal, sha256, sha256_hex};
pub use keys::{
    decode_private_key, decode_public_key, encode_private_key, encode_public_key,
    get_public_key_from_private, PrivateKey, PublicKey,
};
