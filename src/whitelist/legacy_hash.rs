// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Canonical and legacy payload hashes for whitelist envelopes.
//!
//! Older producers signed whitelist payloads without some optional fields
//! that current payloads carry. To keep those artifacts verifiable, the
//! payload is re-hashed with each such field removed, and with all of them
//! removed. The field lists are fixed per payload kind and versioned with
//! [`LEGACY_HASH_VERSION`]; they are not configurable.
//!
//! Fields are removed textually (key, value and one adjoining comma) rather
//! than by re-serializing, so every other byte of the payload is exactly
//! what was signed.

use crate::crypto::hashing::sha256_hex;

/// Version of the legacy field lists below.
pub const LEGACY_HASH_VERSION: u32 = 1;

const ADDRESS_LEGACY_FIELDS: &[&str] = &["contractType", "labels"];
const ASSET_LEGACY_FIELDS: &[&str] = &["isNFT", "kindType"];

/// Kind of record carried by a whitelist envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Address,
    Asset,
}

impl PayloadKind {
    /// Optional fields that older producers left out of the signed payload.
    pub fn legacy_fields(self) -> &'static [&'static str] {
        match self {
            PayloadKind::Address => ADDRESS_LEGACY_FIELDS,
            PayloadKind::Asset => ASSET_LEGACY_FIELDS,
        }
    }
}

/// Canonical hash followed by each distinct legacy hash.
pub fn compute_hashes(payload: &str, kind: PayloadKind) -> Vec<String> {
    legacy_payloads(payload, kind)
        .iter()
        .map(|text| sha256_hex(text.as_bytes()))
        .collect()
}

/// Legacy hashes only (without the canonical one).
pub fn legacy_hashes(payload: &str, kind: PayloadKind) -> Vec<String> {
    compute_hashes(payload, kind).into_iter().skip(1).collect()
}

/// The payload followed by each distinct stripped variant, in fixed order:
/// each field alone, then all fields together.
fn legacy_payloads(payload: &str, kind: PayloadKind) -> Vec<String> {
    let fields = kind.legacy_fields();
    let mut field_sets: Vec<Vec<&str>> = fields.iter().map(|f| vec![*f]).collect();
    if fields.len() > 1 {
        field_sets.push(fields.to_vec());
    }

    let mut variants = vec![payload.to_string()];
    for set in field_sets {
        let stripped = set
            .iter()
            .fold(payload.to_string(), |text, field| strip_field(&text, field));
        if !variants.contains(&stripped) {
            variants.push(stripped);
        }
    }
    variants
}

/// Remove every member named `field` from the JSON text, at any depth.
fn strip_field(payload: &str, field: &str) -> String {
    let bytes = payload.as_bytes();
    let mut removals: Vec<(usize, usize)> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'"' {
            i += 1;
            continue;
        }

        let string_end = skip_string(bytes, i);
        let after = skip_whitespace(bytes, string_end);
        let is_key = after < bytes.len() && bytes[after] == b':';

        if is_key && string_end >= i + 2 && &payload[i + 1..string_end - 1] == field {
            let value_start = skip_whitespace(bytes, after + 1);
            let value_end = skip_value(bytes, value_start);
            let (mut start, end) = member_span(bytes, i, value_end);
            if let Some(&(_, last_end)) = removals.last() {
                start = start.max(last_end);
            }
            removals.push((start, end));
            i = value_end;
        } else {
            i = string_end;
        }
    }

    if removals.is_empty() {
        return payload.to_string();
    }

    let mut out = String::with_capacity(payload.len());
    let mut cursor = 0;
    for (start, end) in removals {
        out.push_str(&payload[cursor..start]);
        cursor = end.max(cursor);
    }
    out.push_str(&payload[cursor..]);
    out
}

/// Span of a member including one adjoining comma.
fn member_span(bytes: &[u8], key_start: usize, value_end: usize) -> (usize, usize) {
    let mut back = key_start;
    while back > 0 && bytes[back - 1].is_ascii_whitespace() {
        back -= 1;
    }
    if back > 0 && bytes[back - 1] == b',' {
        return (back - 1, value_end);
    }

    let forward = skip_whitespace(bytes, value_end);
    if forward < bytes.len() && bytes[forward] == b',' {
        return (key_start, skip_whitespace(bytes, forward + 1));
    }
    (key_start, value_end)
}

/// Index just past the closing quote of the string starting at `start`.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Index just past the JSON value starting at `start`.
fn skip_value(bytes: &[u8], start: usize) -> usize {
    if start >= bytes.len() {
        return bytes.len();
    }

    match bytes[start] {
        b'"' => skip_string(bytes, start),
        b'{' | b'[' => {
            let mut depth = 0usize;
            let mut i = start;
            while i < bytes.len() {
                match bytes[i] {
                    b'"' => {
                        i = skip_string(bytes, i);
                        continue;
                    }
                    b'{' | b'[' => depth += 1,
                    b'}' | b']' => {
                        depth -= 1;
                        if depth == 0 {
                            return i + 1;
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
            bytes.len()
        }
        _ => {
            let mut i = start;
            while i < bytes.len() && !matches!(bytes[i], b',' | b'}' | b']') {
                if bytes[i].is_ascii_whitespace() {
                    break;
                }
                i += 1;
            }
            i
        }
    }
}
