// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Request Authentication Module
//!
//! This module signs outgoing custody API requests with the TPV1 scheme.
//!
//! ## Auth Flow
//!
//! 1. Client is provisioned with an API key and a hex-encoded API secret
//! 2. For every request the client builds a message from:
//!    - a fresh UUID v4 nonce and the current Unix time in milliseconds
//!    - the HTTP method, host, path, and optional query / content type / body
//! 3. The message is signed with HMAC-SHA256 keyed by the secret
//! 4. The client sends `Authorization: TPV1-HMAC-SHA256 ApiKey=... Nonce=...
//!    Timestamp=... Signature=...`
//!
//! ## Security
//!
//! - The secret is held in an owned byte buffer and wiped on close/drop
//! - A closed signer refuses to sign
//! - Nonce and timestamp are never reused between calls

pub mod tpv1;

pub use tpv1::{AuthorizationHeader, RequestToSign, Tpv1Signer, AUTH_SCHEME};
