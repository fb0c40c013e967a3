// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Governance Trust - client-side integrity layer for a custody API
//!
//! Nothing the custody API returns is trusted on transport alone. Governance
//! rules must carry enough SuperAdmin signatures, whitelisted records must
//! match their signed hashes, and outgoing requests are HMAC-authenticated.
//!
//! ## Modules
//!
//! - `auth` - TPV1-HMAC-SHA256 request signing
//! - `config` - Environment configuration
//! - `crypto` - P-256 keys, ECDSA signatures, SHA-256 hashing
//! - `governance` - Rules container verification and caching
//! - `whitelist` - Whitelist envelope verification
//! - `models` - Whitelisted address and asset records

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod governance;
pub mod models;
pub mod whitelist;

pub use config::TrustConfig;
pub use error::{IntegrityError, Result, TrustError};
