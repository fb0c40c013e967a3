// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! P-256 key decoding and encoding.
//!
//! Keys arrive as PEM text (SuperAdmin keys from configuration, user keys
//! from the governance rules container). The algorithm and named curve are
//! read from the DER structure before any key material is interpreted, so a
//! secp256k1 or Ed25519 key is rejected with a precise message instead of a
//! generic parse failure.

use pkcs8::der::Decode;
use pkcs8::{
    AlgorithmIdentifierRef, DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey,
    EncryptedPrivateKeyInfo, LineEnding, ObjectIdentifier, PrivateKeyInfo,
    SubjectPublicKeyInfoRef,
};
use zeroize::Zeroizing;

use crate::error::{Result, TrustError};

/// P-256 public key.
pub type PublicKey = p256::PublicKey;

/// P-256 private key.
pub type PrivateKey = p256::SecretKey;

/// id-ecPublicKey (RFC 5480).
const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// secp256r1 / prime256v1 / NIST P-256.
const SECP256R1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");

const PUBLIC_KEY_TAG: &str = "PUBLIC KEY";
const PKCS8_TAG: &str = "PRIVATE KEY";
const ENCRYPTED_PKCS8_TAG: &str = "ENCRYPTED PRIVATE KEY";
const SEC1_TAG: &str = "EC PRIVATE KEY";

/// Decode a SubjectPublicKeyInfo PEM into a P-256 public key.
///
/// # Errors
/// `TrustError::Validation` if the text is not a PEM public key, the key is
/// not an elliptic-curve key, or the curve is not P-256.
pub fn decode_public_key(pem_text: &str) -> Result<PublicKey> {
    let block = parse_pem(pem_text)?;
    if block.tag() != PUBLIC_KEY_TAG {
        return Err(TrustError::validation(format!(
            "expected a {PUBLIC_KEY_TAG} PEM block, found {}",
            block.tag()
        )));
    }

    let spki = SubjectPublicKeyInfoRef::from_der(block.contents())
        .map_err(|e| TrustError::validation(format!("invalid public key structure: {e}")))?;
    ensure_p256(&spki.algorithm)?;

    PublicKey::from_public_key_der(block.contents())
        .map_err(|e| TrustError::validation(format!("invalid P-256 public key: {e}")))
}

/// Decode a PEM private key into a P-256 private key.
///
/// Accepts PKCS#8 (`PRIVATE KEY`), encrypted PKCS#8 (`ENCRYPTED PRIVATE
/// KEY`, `password` required) and SEC1 (`EC PRIVATE KEY`). The password is
/// ignored for unencrypted keys.
pub fn decode_private_key(pem_text: &str, password: Option<&str>) -> Result<PrivateKey> {
    let block = parse_pem(pem_text)?;

    match block.tag() {
        PKCS8_TAG => decode_pkcs8(block.contents()),
        ENCRYPTED_PKCS8_TAG => {
            let password = password.ok_or_else(|| {
                TrustError::validation("encrypted private key requires a password")
            })?;
            let encrypted = EncryptedPrivateKeyInfo::from_der(block.contents()).map_err(|e| {
                TrustError::validation(format!("invalid encrypted private key: {e}"))
            })?;
            let document = encrypted.decrypt(password).map_err(|_| {
                TrustError::validation("failed to decrypt private key (wrong password?)")
            })?;
            decode_pkcs8(document.as_bytes())
        }
        SEC1_TAG => PrivateKey::from_sec1_der(block.contents()).map_err(|e| {
            TrustError::validation(format!("invalid SEC1 private key or curve is not P-256: {e}"))
        }),
        other => Err(TrustError::validation(format!(
            "unsupported private key PEM block: {other}"
        ))),
    }
}

/// Encode a public key as SubjectPublicKeyInfo PEM (LF line endings).
pub fn encode_public_key(key: &PublicKey) -> Result<String> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| TrustError::validation(format!("failed to encode public key: {e}")))
}

/// Encode a private key as unencrypted PKCS#8 PEM.
pub fn encode_private_key(key: &PrivateKey) -> Result<Zeroizing<String>> {
    key.to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| TrustError::validation(format!("failed to encode private key: {e}")))
}

/// Derive the public half of a private key.
pub fn get_public_key_from_private(key: &PrivateKey) -> PublicKey {
    key.public_key()
}

fn parse_pem(pem_text: &str) -> Result<pem::Pem> {
    pem::parse(pem_text.trim())
        .map_err(|e| TrustError::validation(format!("invalid PEM: {e}")))
}

fn decode_pkcs8(der: &[u8]) -> Result<PrivateKey> {
    let info = PrivateKeyInfo::from_der(der)
        .map_err(|e| TrustError::validation(format!("invalid PKCS#8 private key: {e}")))?;
    ensure_p256(&info.algorithm)?;

    PrivateKey::from_pkcs8_der(der)
        .map_err(|e| TrustError::validation(format!("invalid P-256 private key: {e}")))
}

fn ensure_p256(algorithm: &AlgorithmIdentifierRef<'_>) -> Result<()> {
    if algorithm.oid != EC_PUBLIC_KEY_OID {
        return Err(TrustError::validation(format!(
            "key is not an elliptic-curve key (algorithm {})",
            algorithm.oid
        )));
    }

    let curve = algorithm
        .parameters_oid()
        .map_err(|_| TrustError::validation("elliptic-curve key does not name its curve"))?;
    if curve != SECP256R1_OID {
        return Err(TrustError::validation(format!(
            "unsupported curve {curve}, only P-256 is accepted"
        )));
    }

    Ok(())
}
