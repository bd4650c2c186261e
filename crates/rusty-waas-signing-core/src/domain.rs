use serde::{Deserialize, Serialize};

use crate::ports::SdkError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCredentials {
    pub api_key_name: String,
    pub private_key: String,
}

impl SessionCredentials {
    pub fn is_complete(&self) -> bool {
        !self.api_key_name.trim().is_empty() && !self.private_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "ChainID")]
    pub chain_id: String,
    #[serde(rename = "Nonce")]
    pub nonce: u64,
    #[serde(rename = "MaxPriorityFeePerGas")]
    pub max_priority_fee_per_gas: String,
    #[serde(rename = "MaxFeePerGas")]
    pub max_fee_per_gas: String,
    #[serde(rename = "Gas")]
    pub gas: u64,
    #[serde(rename = "To")]
    pub to: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "Data", default)]
    pub data: String,
}

impl Transaction {
    pub fn from_json(raw: &str) -> Result<Self, SdkError> {
        serde_json::from_str(raw).map_err(|e| SdkError::MalformedInput(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Address", default)]
    pub address: String,
    #[serde(rename = "MPCKeys", default)]
    pub mpc_keys: Vec<String>,
}

impl AddressRecord {
    pub fn signing_key(&self) -> Result<&str, SdkError> {
        self.mpc_keys
            .first()
            .map(String::as_str)
            .ok_or_else(|| SdkError::InvalidAddress(format!("{} has no MPC keys", self.name)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSignatureOperation {
    #[serde(rename = "Operation")]
    pub operation: String,
    #[serde(rename = "MPCOperation")]
    pub mpc_operation: String,
    #[serde(rename = "Payload")]
    pub payload: String,
    #[serde(rename = "MPCData")]
    pub mpc_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(rename = "SignedPayload")]
    pub signed_payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(rename = "RawTransaction")]
    pub raw_transaction: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    pub credentials: SessionCredentials,
    pub address_name: String,
    pub device_group_name: String,
    pub transaction_json: String,
}

impl SigningRequest {
    pub fn is_ready(&self) -> bool {
        self.credentials.is_complete()
            && !self.address_name.trim().is_empty()
            && !self.device_group_name.trim().is_empty()
            && !self.transaction_json.trim().is_empty()
    }
}
