//! Off-chain order metadata (hooks and flash-loan wiring) and its hash.
//!
//! Solvers read the hooks from this document. Its canonical serialization
//! must hash to the order's stored `app_data_hash`.

use std::collections::BTreeMap;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OrderError;

/// Current metadata schema version.
pub const APP_DATA_VERSION: &str = "1.3.0";

/// One hook entry as solvers see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookMetadata {
    pub target: Address,
    pub call_data: Bytes,
    /// Decimal string, as the metadata schema expects.
    pub gas_limit: String,
}

/// Pre- and post-settlement hooks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HooksMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre: Vec<HookMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post: Vec<HookMetadata>,
}

/// Flash loan the settlement should take before running the hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashLoanMetadata {
    pub lender: Address,
    pub token: Address,
    pub amount: U256,
    /// Account the borrowed funds are delivered to.
    pub receiver: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDataMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<HooksMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flashloan: Option<FlashLoanMetadata>,
}

/// The appData document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    pub version: String,
    pub app_code: String,
    #[serde(default)]
    pub metadata: AppDataMetadata,
}

impl AppData {
    /// Create an empty document for `app_code`.
    pub fn new(app_code: impl Into<String>) -> Self {
        Self {
            version: APP_DATA_VERSION.to_string(),
            app_code: app_code.into(),
            metadata: AppDataMetadata::default(),
        }
    }

    /// Add a pre-settlement hook.
    #[must_use]
    pub fn with_pre_hook(mut self, target: Address, call_data: Bytes, gas_limit: u64) -> Self {
        self.metadata
            .hooks
            .get_or_insert_with(HooksMetadata::default)
            .pre
            .push(HookMetadata {
                target,
                call_data,
                gas_limit: gas_limit.to_string(),
            });
        self
    }

    /// Add a post-settlement hook.
    #[must_use]
    pub fn with_post_hook(mut self, target: Address, call_data: Bytes, gas_limit: u64) -> Self {
        self.metadata
            .hooks
            .get_or_insert_with(HooksMetadata::default)
            .post
            .push(HookMetadata {
                target,
                call_data,
                gas_limit: gas_limit.to_string(),
            });
        self
    }

    /// Describe a flash loan to be taken by the settlement.
    #[must_use]
    pub fn with_flash_loan(mut self, flashloan: FlashLoanMetadata) -> Self {
        self.metadata.flashloan = Some(flashloan);
        self
    }

    /// Parse a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the text is not a valid document.
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Canonical serialization: compact JSON with lexicographically sorted keys.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if serialization fails.
    pub fn canonical_json(&self) -> serde_json::Result<String> {
        let value = sort_keys(serde_json::to_value(self)?);
        serde_json::to_string(&value)
    }

    /// `keccak256` of the canonical serialization.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if serialization fails.
    pub fn hash(&self) -> serde_json::Result<B256> {
        Ok(keccak256(self.canonical_json()?.as_bytes()))
    }

    /// Check this document against an order's stored hash.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::AppDataMismatch`] on a different hash.
    pub fn verify(&self, expected: B256) -> Result<(), OrderError> {
        let actual = self.hash().unwrap_or_default();
        if actual != expected {
            return Err(OrderError::AppDataMismatch { expected, actual });
        }
        Ok(())
    }

    /// Hooks to run before the swap.
    #[must_use]
    pub fn pre_hooks(&self) -> &[HookMetadata] {
        self.metadata.hooks.as_ref().map_or(&[][..], |h| h.pre.as_slice())
    }

    /// Hooks to run after the swap.
    #[must_use]
    pub fn post_hooks(&self) -> &[HookMetadata] {
        self.metadata.hooks.as_ref().map_or(&[][..], |h| h.post.as_slice())
    }
}

/// Rebuild every object with its keys in lexicographic order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_ignores_key_order_in_input() {
        let a = AppData::parse(r#"{"version":"1.3.0","appCode":"lendflow","metadata":{}}"#).unwrap();
        let b = AppData::parse(r#"{"metadata":{},"appCode":"lendflow","version":"1.3.0"}"#).unwrap();
        assert_eq!(a.hash().unwrap(), b.hash().unwrap());
        assert_eq!(
            a.canonical_json().unwrap(),
            r#"{"appCode":"lendflow","metadata":{},"version":"1.3.0"}"#
        );
    }

    #[test]
    fn hooks_change_the_hash() {
        let plain = AppData::new("lendflow");
        let hooked = plain
            .clone()
            .with_pre_hook(Address::repeat_byte(7), Bytes::from_static(&[1, 2]), 300_000);
        assert_ne!(plain.hash().unwrap(), hooked.hash().unwrap());
        assert_eq!(hooked.pre_hooks().len(), 1);
        assert!(hooked.post_hooks().is_empty());
    }

    #[test]
    fn verify_reports_mismatch() {
        let doc = AppData::new("lendflow");
        let hash = doc.hash().unwrap();
        assert!(doc.verify(hash).is_ok());
        assert!(matches!(
            doc.verify(B256::ZERO),
            Err(OrderError::AppDataMismatch { .. })
        ));
    }
}
