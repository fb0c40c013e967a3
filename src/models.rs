// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Whitelist Data Models
//!
//! Records carried (as JSON text) inside signed whitelist envelopes. These
//! are only meaningful after the envelope hash has been verified; see
//! [`crate::whitelist`].
//!
//! ## Model Categories
//!
//! - **Addresses**: Whitelisted withdrawal destinations
//! - **Assets**: Whitelisted contracts/tokens

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Whitelisted Address Models
// =============================================================================

/// A whitelisted withdrawal address.
///
/// `blockchain` and `network` are usually carried by the envelope rather
/// than the payload; extraction fills them in when the payload omits them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistedAddress {
    #[serde(default)]
    pub blockchain: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    /// On-chain address.
    pub address: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub address_type: Option<String>,
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub exchange_account_id: Option<String>,
    #[serde(default)]
    pub linked_internal_addresses: Vec<LinkedInternalAddress>,
    #[serde(default)]
    pub linked_wallets: Vec<LinkedWallet>,
}

/// Internal address allowed to send to a whitelisted address.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInternalAddress {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Wallet allowed to send to a whitelisted address.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LinkedWallet {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

// =============================================================================
// Whitelisted Asset Models
// =============================================================================

/// A whitelisted asset (token contract or NFT collection).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistedAsset {
    #[serde(default)]
    pub blockchain: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub decimals: Option<String>,
    #[serde(default)]
    pub kind_type: Option<String>,
    #[serde(default, rename = "isNFT")]
    pub is_nft: Option<bool>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub token_id: Option<String>,
}

/// Producers disagree on whether ids and decimals are JSON strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_payload_deserializes() {
        let payload = r#"{
            "currency": "ETH",
            "addressType": "individual",
            "address": "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12",
            "memo": "",
            "label": "Treasury",
            "customerId": "",
            "contractType": null,
            "linkedInternalAddresses": [{"id": 42, "address": "0xabc", "label": "hot"}],
            "linkedWallets": [{"id": "7", "name": "ops", "path": "m/44'/60'"}]
        }"#;

        let address: WhitelistedAddress = serde_json::from_str(payload).unwrap();
        assert_eq!(address.currency.as_deref(), Some("ETH"));
        assert_eq!(address.label.as_deref(), Some("Treasury"));
        assert_eq!(address.contract_type, None);
        assert_eq!(address.blockchain, None);
        assert_eq!(address.linked_internal_addresses[0].id.as_deref(), Some("42"));
        assert_eq!(address.linked_wallets[0].id.as_deref(), Some("7"));
    }

    #[test]
    fn address_requires_address_field() {
        let result = serde_json::from_str::<WhitelistedAddress>(r#"{"label":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn asset_payload_deserializes() {
        let payload = r#"{"contractAddress":"0xa0b8","symbol":"USDC","decimals":6,"isNFT":false,"kindType":"token"}"#;
        let asset: WhitelistedAsset = serde_json::from_str(payload).unwrap();
        assert_eq!(asset.decimals.as_deref(), Some("6"));
        assert_eq!(asset.is_nft, Some(false));
        assert_eq!(asset.kind_type.as_deref(), Some("token"));
    }
}
