// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ECDSA P-256 signatures in raw `r‖s` form.
//!
//! The custody API and its SDKs exchange signatures as base64 of the two
//! scalars concatenated, each left-padded to 32 bytes big-endian. This is
//! not DER. [`RawSignature::from_der`] and [`RawSignature::to_der`] convert
//! for callers that talk to DER-based tooling.

use base64ct::{Base64, Encoding};
use p256::ecdsa::signature::{RandomizedSigner, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::rand_core::OsRng;

use super::keys::{PrivateKey, PublicKey};
use crate::error::{Result, TrustError};

/// Byte length of one scalar (`ceil(256 / 8)`).
pub const SIGNATURE_COMPONENT_LEN: usize = 32;

/// Byte length of an encoded `r‖s` signature.
pub const RAW_SIGNATURE_LEN: usize = 2 * SIGNATURE_COMPONENT_LEN;

/// Fixed-size `r‖s` signature.
#[derive(Clone, PartialEq, Eq)]
pub struct RawSignature([u8; RAW_SIGNATURE_LEN]);

impl RawSignature {
    /// Wrap exactly [`RAW_SIGNATURE_LEN`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; RAW_SIGNATURE_LEN] = bytes.try_into().map_err(|_| {
            TrustError::validation(format!(
                "signature must be {RAW_SIGNATURE_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }

    /// Decode the base64 wire form.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = Base64::decode_vec(encoded.trim())
            .map_err(|e| TrustError::validation(format!("signature is not valid base64: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Convert an ASN.1 DER `ECDSA-Sig-Value` to raw form.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let signature = Signature::from_der(der)
            .map_err(|e| TrustError::validation(format!("invalid DER signature: {e}")))?;
        Ok(Self::from(&signature))
    }

    /// Convert to ASN.1 DER.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let signature = self.to_signature()?;
        Ok(signature.to_der().as_bytes().to_vec())
    }

    /// Base64 wire form.
    pub fn to_base64(&self) -> String {
        Base64::encode_string(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8; RAW_SIGNATURE_LEN] {
        &self.0
    }

    pub fn r(&self) -> &[u8] {
        &self.0[..SIGNATURE_COMPONENT_LEN]
    }

    pub fn s(&self) -> &[u8] {
        &self.0[SIGNATURE_COMPONENT_LEN..]
    }

    /// Low-s form of this signature.
    ///
    /// `(r, s)` and `(r, n - s)` verify alike, so two signatures are only the
    /// same signature if their normalized forms are equal. Out-of-range
    /// scalars are returned unchanged.
    pub fn normalized(&self) -> Self {
        match self.to_signature() {
            Ok(signature) => signature
                .normalize_s()
                .map(|low| Self::from(&low))
                .unwrap_or_else(|| self.clone()),
            Err(_) => self.clone(),
        }
    }

    fn to_signature(&self) -> Result<Signature> {
        Signature::from_slice(&self.0)
            .map_err(|e| TrustError::validation(format!("signature scalars out of range: {e}")))
    }
}

impl From<&Signature> for RawSignature {
    fn from(signature: &Signature) -> Self {
        let mut raw = [0u8; RAW_SIGNATURE_LEN];
        raw.copy_from_slice(&signature.to_bytes());
        Self(raw)
    }
}

impl std::fmt::Debug for RawSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawSignature({})", self.to_base64())
    }
}

/// Sign `data` (hashed with SHA-256) and return the base64 `r‖s` signature.
///
/// Signing is hedged with OS randomness, so two signatures over the same
/// data differ while both verify.
pub fn sign_data(private_key: &PrivateKey, data: &[u8]) -> Result<String> {
    let signing_key = SigningKey::from(private_key);
    let signature: Signature = signing_key
        .try_sign_with_rng(&mut OsRng, data)
        .map_err(|e| TrustError::validation(format!("ECDSA signing failed: {e}")))?;
    Ok(RawSignature::from(&signature).to_base64())
}

/// Verify a base64 `r‖s` signature over `data`.
///
/// Returns `false` for malformed base64, a decoded length other than
/// [`RAW_SIGNATURE_LEN`], out-of-range scalars, or a cryptographic mismatch.
pub fn verify_signature(public_key: &PublicKey, data: &[u8], signature_b64: &str) -> bool {
    let raw = match RawSignature::from_base64(signature_b64) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::trace!(error = %e, "Rejecting malformed signature");
            return false;
        }
    };
    verify_raw(public_key, data, &raw)
}

/// Verify an already decoded raw signature.
pub fn verify_raw(public_key: &PublicKey, data: &[u8], signature: &RawSignature) -> bool {
    let Ok(signature) = signature.to_signature() else {
        return false;
    };
    VerifyingKey::from(public_key)
        .verify(data, &signature)
        .is_ok()
}

/// Generate a fresh random P-256 private key.
pub fn generate_private_key() -> PrivateKey {
    PrivateKey::random(&mut OsRng)
}
