//! Core type definitions for Fabricant
//!
//! The JSON shape of these types matches what upstream transaction builders
//! emit: camelCase field names, instruction payloads as base64 strings, and
//! the account list under `keys`.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Lifecycle status of a transaction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Executed,
    Failed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Executed => write!(f, "executed"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One account reference inside an instruction
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMeta {
    /// Account identity (opaque, usually base58)
    pub pubkey: String,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn new(pubkey: impl Into<String>, is_signer: bool, is_writable: bool) -> Self {
        Self {
            pubkey: pubkey.into(),
            is_signer,
            is_writable,
        }
    }

    /// Writable, non-signing account
    pub fn writable(pubkey: impl Into<String>) -> Self {
        Self::new(pubkey, false, true)
    }

    /// Read-only, non-signing account
    pub fn readonly(pubkey: impl Into<String>) -> Self {
        Self::new(pubkey, false, false)
    }

    /// Signing account
    pub fn signer(pubkey: impl Into<String>) -> Self {
        Self::new(pubkey, true, false)
    }
}

/// A single program call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    /// Program identifier (opaque)
    pub program_id: String,
    /// Account references; order is significant
    #[serde(rename = "keys", default)]
    pub accounts: Vec<AccountMeta>,
    /// Encoded instruction data
    #[serde(with = "payload_base64", default)]
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new(program_id: impl Into<String>, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Self {
        Self {
            program_id: program_id.into(),
            accounts,
            data,
        }
    }

    /// Account at `index`, if the list is long enough
    pub fn account(&self, index: usize) -> Option<&AccountMeta> {
        self.accounts.get(index)
    }
}

/// A transaction as handed to the guard by the execution plumbing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(default)]
    pub status: TransactionStatus,
    /// Ordered instructions; order drives evaluation order
    #[serde(default)]
    pub instructions: Vec<Instruction>,
    /// Identities that sign this transaction
    #[serde(default)]
    pub signers: Vec<String>,
    /// Assets whose risk should be checked before execution
    #[serde(default)]
    pub asset_addresses: Vec<String>,
}

impl Transaction {
    /// Create an empty pending transaction
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: TransactionStatus::Pending,
            instructions: Vec::new(),
            signers: Vec::new(),
            asset_addresses: Vec::new(),
        }
    }

    pub fn with_instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn with_signer(mut self, signer: impl Into<String>) -> Self {
        self.signers.push(signer.into());
        self
    }

    pub fn with_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.asset_addresses.extend(assets.into_iter().map(Into::into));
        self
    }

    /// Derived copy carrying a new lifecycle status
    pub fn with_status(&self, status: TransactionStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Signer identities as a set
    pub fn signer_set(&self) -> HashSet<&str> {
        self.signers.iter().map(String::as_str).collect()
    }

    pub fn is_signer(&self, pubkey: &str) -> bool {
        self.signers.iter().any(|s| s == pubkey)
    }

    /// Parse from the JSON wire form
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Base64 (standard alphabet) encoding for instruction payloads
mod payload_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_status_leaves_original_untouched() {
        let tx = Transaction::new("tx-1").with_signer("Alice");
        let failed = tx.with_status(TransactionStatus::Failed);

        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(failed.status, TransactionStatus::Failed);
        assert_eq!(failed.signers, tx.signers);
    }

    #[test]
    fn test_parse_wire_json() {
        let json = r#"{
            "id": "tx-wire",
            "status": "pending",
            "instructions": [{
                "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                "keys": [{"pubkey": "Mint", "isSigner": false, "isWritable": true}],
                "data": "BgAA"
            }],
            "signers": ["Owner"],
            "assetAddresses": ["So11111111111111111111111111111111111111112"]
        }"#;

        let tx = Transaction::from_json(json).unwrap();
        assert_eq!(tx.instructions.len(), 1);
        assert_eq!(tx.instructions[0].data, vec![6, 0, 0]);
        assert_eq!(tx.instructions[0].accounts[0].pubkey, "Mint");
        assert!(tx.instructions[0].accounts[0].is_writable);
        assert!(tx.is_signer("Owner"));
        assert_eq!(tx.asset_addresses.len(), 1);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let tx = Transaction::from_json(r#"{"id": "bare"}"#).unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(tx.instructions.is_empty());
        assert!(tx.signers.is_empty());
        assert!(tx.asset_addresses.is_empty());
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let json = r#"{"id": "x", "instructions": [{"programId": "P", "keys": [], "data": "!!"}]}"#;
        assert!(Transaction::from_json(json).is_err());
    }

    #[test]
    fn test_payload_serializes_as_base64() {
        let ix = Instruction::new("P", vec![], vec![9]);
        let value = serde_json::to_value(&ix).unwrap();
        assert_eq!(value["data"], "CQ==");
        assert_eq!(value["programId"], "P");
    }
}
