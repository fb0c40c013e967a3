// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! TPV1 HMAC-SHA256 request signing.
//!
//! ## Wire Format
//!
//! ```text
//! message = "TPV1 <api_key> <nonce> <timestamp_ms> <METHOD> <host> <path> [<query>] [<content-type>] [<body>]"
//! header  = "TPV1-HMAC-SHA256 ApiKey=<api_key> Nonce=<nonce> Timestamp=<timestamp_ms> Signature=<base64 hmac>"
//! ```
//!
//! Optional parts are appended only when present and non-empty.
//!
//! ## Secret Handling
//!
//! The API secret lives in a byte buffer owned by the signer and is wiped with
//! volatile writes on [`Tpv1Signer::close`] or on drop. Copies made by the
//! caller (the hex string passed to [`Tpv1Signer::new`]) or by the allocator
//! on reallocation are outside the signer's reach.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use base64ct::{Base64, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;
use zeroize::Zeroize;

use crate::error::{Result, TrustError};

type HmacSha256 = Hmac<Sha256>;

/// Authorization scheme name in the header value.
pub const AUTH_SCHEME: &str = "TPV1-HMAC-SHA256";

/// Leading tag of the signed message.
const MESSAGE_TAG: &str = "TPV1";

/// Parts of an outgoing HTTP request covered by the signature.
#[derive(Debug, Clone, Default)]
pub struct RequestToSign<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub body: Option<&'a str>,
}

impl<'a> RequestToSign<'a> {
    pub fn new(method: &'a str, host: &'a str, path: &'a str) -> Self {
        Self {
            method,
            host,
            path,
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: &'a str) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_content_type(mut self, content_type: &'a str) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn with_body(mut self, body: &'a str) -> Self {
        self.body = Some(body);
        self
    }
}

/// A signed `Authorization` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeader {
    pub api_key: String,
    pub nonce: Uuid,
    /// Unix time in milliseconds.
    pub timestamp: i64,
    /// Base64 HMAC-SHA256 of the signed message.
    pub signature: String,
}

impl fmt::Display for AuthorizationHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{AUTH_SCHEME} ApiKey={} Nonce={} Timestamp={} Signature={}",
            self.api_key, self.nonce, self.timestamp, self.signature
        )
    }
}

impl FromStr for AuthorizationHeader {
    type Err = TrustError;

    fn from_str(value: &str) -> Result<Self> {
        let rest = value
            .strip_prefix(AUTH_SCHEME)
            .and_then(|rest| rest.strip_prefix(' '))
            .ok_or_else(|| TrustError::validation(format!("expected {AUTH_SCHEME} scheme")))?;

        let mut api_key = None;
        let mut nonce = None;
        let mut timestamp = None;
        let mut signature = None;

        for field in rest.split_whitespace() {
            let (name, field_value) = field
                .split_once('=')
                .ok_or_else(|| TrustError::validation(format!("malformed field `{field}`")))?;
            match name {
                "ApiKey" => api_key = Some(field_value.to_string()),
                "Nonce" => {
                    nonce = Some(Uuid::parse_str(field_value).map_err(|e| {
                        TrustError::validation(format!("invalid nonce: {e}"))
                    })?)
                }
                "Timestamp" => {
                    timestamp = Some(field_value.parse::<i64>().map_err(|e| {
                        TrustError::validation(format!("invalid timestamp: {e}"))
                    })?)
                }
                "Signature" => signature = Some(field_value.to_string()),
                other => {
                    return Err(TrustError::validation(format!(
                        "unknown authorization field `{other}`"
                    )))
                }
            }
        }

        let missing = |name: &str| TrustError::validation(format!("missing {name} field"));
        Ok(Self {
            api_key: api_key.ok_or_else(|| missing("ApiKey"))?,
            nonce: nonce.ok_or_else(|| missing("Nonce"))?,
            timestamp: timestamp.ok_or_else(|| missing("Timestamp"))?,
            signature: signature.ok_or_else(|| missing("Signature"))?,
        })
    }
}

/// Secret buffer plus the open/closed flag, guarded together.
struct SecretState {
    secret: Vec<u8>,
    closed: bool,
}

/// Signs outgoing API requests with the TPV1 scheme.
///
/// `OPEN` after construction, `CLOSED` after [`close`](Self::close). Closing
/// is idempotent and also happens on drop.
pub struct Tpv1Signer {
    api_key: String,
    state: Mutex<SecretState>,
}

impl Tpv1Signer {
    /// Create a signer from an API key and a hex-encoded secret.
    ///
    /// # Errors
    /// `TrustError::Validation` if the API key is empty or the secret is
    /// empty or not valid hex.
    pub fn new(api_key: impl Into<String>, secret_hex: &str) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TrustError::validation("API key must not be empty"));
        }
        if secret_hex.trim().is_empty() {
            return Err(TrustError::validation("API secret must not be empty"));
        }
        let secret = hex::decode(secret_hex.trim())
            .map_err(|_| TrustError::validation("API secret must be valid hex"))?;

        Ok(Self {
            api_key,
            state: Mutex::new(SecretState {
                secret,
                closed: false,
            }),
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn is_closed(&self) -> bool {
        self.lock_state().closed
    }

    /// Sign a request with a fresh nonce and the current time.
    pub fn sign_request(&self, request: &RequestToSign<'_>) -> Result<AuthorizationHeader> {
        self.sign_request_at(request, Uuid::new_v4(), Utc::now().timestamp_millis())
    }

    /// Sign a request with an explicit nonce and timestamp.
    pub(crate) fn sign_request_at(
        &self,
        request: &RequestToSign<'_>,
        nonce: Uuid,
        timestamp: i64,
    ) -> Result<AuthorizationHeader> {
        let message = build_message(&self.api_key, &nonce, timestamp, request);

        let mut mac = {
            let state = self.lock_state();
            if state.closed {
                return Err(TrustError::SignerClosed);
            }
            HmacSha256::new_from_slice(&state.secret)
                .map_err(|e| TrustError::validation(format!("invalid HMAC key: {e}")))?
        };
        mac.update(message.as_bytes());

        Ok(AuthorizationHeader {
            api_key: self.api_key.clone(),
            nonce,
            timestamp,
            signature: Base64::encode_string(&mac.finalize().into_bytes()),
        })
    }

    /// Wipe the secret. Further signing fails with `SignerClosed`.
    pub fn close(&self) {
        let mut state = self.lock_state();
        if state.closed {
            return;
        }
        state.secret.zeroize();
        state.closed = true;
        tracing::debug!(api_key = %self.api_key, "TPV1 signer closed");
    }

    fn lock_state(&self) -> MutexGuard<'_, SecretState> {
        // The state is a buffer plus a flag; a panic elsewhere cannot leave it torn.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Tpv1Signer {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Tpv1Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tpv1Signer")
            .field("api_key", &self.api_key)
            .field("secret", &"***")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Build the space-separated message covered by the HMAC.
pub(crate) fn build_message(
    api_key: &str,
    nonce: &Uuid,
    timestamp: i64,
    request: &RequestToSign<'_>,
) -> String {
    let nonce = nonce.to_string();
    let timestamp = timestamp.to_string();
    let method = request.method.to_uppercase();

    let mut parts: Vec<&str> = vec![
        MESSAGE_TAG,
        api_key,
        &nonce,
        &timestamp,
        &method,
        request.host,
        request.path,
    ];
    parts.extend(
        [request.query, request.content_type, request.body]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty()),
    );
    parts.join(" ")
}
