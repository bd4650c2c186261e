use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    AddressRecord, PendingSignatureOperation, SessionCredentials, Signature, SignedTransaction,
    Transaction,
};

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("malformed transaction input: {0}")]
    MalformedInput(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("could not find operation with name {0}")]
    OperationNotFound(String),
    #[error("sdk error: {0}")]
    Sdk(String),
}

#[async_trait]
pub trait MpcSdkPort: Send + Sync {
    async fn initialize(&self, verbose: bool) -> Result<(), SdkError>;
    async fn poll_pending_signatures(
        &self,
        device_group_name: &str,
    ) -> Result<Vec<PendingSignatureOperation>, SdkError>;
    async fn compute_operation(&self, mpc_data: &str) -> Result<(), SdkError>;
}

#[async_trait]
pub trait KeyServicePort: Send + Sync {
    async fn initialize(&self, credentials: &SessionCredentials) -> Result<(), SdkError>;
    async fn create_signature_request(
        &self,
        key_name: &str,
        transaction: &Transaction,
    ) -> Result<String, SdkError>;
    async fn wait_signature(&self, operation_name: &str) -> Result<Signature, SdkError>;
    async fn signed_transaction(
        &self,
        transaction: &Transaction,
        signature: &Signature,
    ) -> Result<SignedTransaction, SdkError>;
}

#[async_trait]
pub trait WalletServicePort: Send + Sync {
    async fn initialize(&self, credentials: &SessionCredentials) -> Result<(), SdkError>;
    async fn resolve_address(&self, address_name: &str) -> Result<AddressRecord, SdkError>;
}
