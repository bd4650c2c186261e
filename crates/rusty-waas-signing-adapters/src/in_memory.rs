use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use rusty_waas_signing_core::{
    AddressRecord, KeyServicePort, MpcSdkPort, PendingSignatureOperation, SdkError,
    SessionCredentials, Signature, SignedTransaction, Transaction, WalletServicePort,
};

/// Offline stand-in for the wallet platform. Every response is derived
/// deterministically from the request so demo runs are reproducible.
#[derive(Debug, Clone, Default)]
pub struct InMemorySdkAdapter {
    state: Arc<Mutex<SdkState>>,
}

#[derive(Debug, Default)]
struct SdkState {
    runtime_ready: bool,
    verbose: bool,
    key_service_ready: bool,
    wallet_service_ready: bool,
    created: Vec<CreatedOperation>,
    computed: Vec<String>,
    hide_pending: bool,
    compute_error: Option<String>,
    missing_addresses: Vec<String>,
    keyless_addresses: Vec<String>,
}

#[derive(Debug, Clone)]
struct CreatedOperation {
    name: String,
    sequence: u64,
    key_name: String,
    transaction: Transaction,
}

impl InMemorySdkAdapter {
    fn state(&self) -> Result<MutexGuard<'_, SdkState>, SdkError> {
        self.state
            .lock()
            .map_err(|e| SdkError::Transport(format!("sdk state lock poisoned: {e}")))
    }

    pub fn debug_fail_compute(&self, message: &str) -> Result<(), SdkError> {
        self.state()?.compute_error = Some(message.to_owned());
        Ok(())
    }

    pub fn debug_remove_address(&self, address_name: &str) -> Result<(), SdkError> {
        self.state()?.missing_addresses.push(address_name.to_owned());
        Ok(())
    }

    pub fn debug_strip_mpc_keys(&self, address_name: &str) -> Result<(), SdkError> {
        self.state()?.keyless_addresses.push(address_name.to_owned());
        Ok(())
    }

    pub fn debug_hide_pending(&self) -> Result<(), SdkError> {
        self.state()?.hide_pending = true;
        Ok(())
    }

    /// Returns `(operation name, key name)` for every signature request seen.
    pub fn debug_created_requests(&self) -> Result<Vec<(String, String)>, SdkError> {
        Ok(self
            .state()?
            .created
            .iter()
            .map(|op| (op.name.clone(), op.key_name.clone()))
            .collect())
    }

    pub fn debug_computed_operations(&self) -> Result<Vec<String>, SdkError> {
        Ok(self.state()?.computed.clone())
    }

    pub fn debug_runtime_verbose(&self) -> Result<bool, SdkError> {
        Ok(self.state()?.verbose)
    }
}

fn mpc_data_blob(operation_name: &str) -> String {
    format!("mpc-data/{operation_name}")
}

fn operation_for_blob(blob: &str) -> Option<&str> {
    blob.strip_prefix("mpc-data/")
}

fn payload_fixture(op: &CreatedOperation) -> String {
    format!(
        "0x{:032x}{:032x}",
        op.sequence.wrapping_mul(0x5afe_c0de),
        op.transaction.nonce ^ op.transaction.gas
    )
}

fn signed_payload_fixture(sequence: u64) -> String {
    format!("0x{:064x}{:064x}1b", sequence, sequence.wrapping_mul(7))
}

#[async_trait]
impl MpcSdkPort for InMemorySdkAdapter {
    async fn initialize(&self, verbose: bool) -> Result<(), SdkError> {
        let mut g = self.state()?;
        g.runtime_ready = true;
        g.verbose = verbose;
        Ok(())
    }

    async fn poll_pending_signatures(
        &self,
        device_group_name: &str,
    ) -> Result<Vec<PendingSignatureOperation>, SdkError> {
        let g = self.state()?;
        if !g.runtime_ready {
            return Err(SdkError::Validation("mpc runtime not initialized".to_owned()));
        }
        if g.hide_pending {
            return Ok(Vec::new());
        }
        // A shared device group sees operations it did not create, so the
        // listing always leads with one unrelated entry.
        let mut entries = vec![PendingSignatureOperation {
            operation: "operations/signature-0000".to_owned(),
            mpc_operation: format!("{device_group_name}/mpcOperations/0"),
            payload: "0x00000000000000000000000000000000000000000000000000000000deadc0de"
                .to_owned(),
            mpc_data: mpc_data_blob("operations/signature-0000"),
        }];
        entries.extend(g.created.iter().filter(|op| !g.computed.contains(&op.name)).map(|op| {
            PendingSignatureOperation {
                operation: op.name.clone(),
                mpc_operation: format!("{device_group_name}/mpcOperations/{}", op.sequence),
                payload: payload_fixture(op),
                mpc_data: mpc_data_blob(&op.name),
            }
        }));
        Ok(entries)
    }

    async fn compute_operation(&self, mpc_data: &str) -> Result<(), SdkError> {
        let mut g = self.state()?;
        if !g.runtime_ready {
            return Err(SdkError::Validation("mpc runtime not initialized".to_owned()));
        }
        if let Some(message) = g.compute_error.clone() {
            return Err(SdkError::Sdk(message));
        }
        let operation = operation_for_blob(mpc_data)
            .ok_or_else(|| SdkError::Sdk(format!("unrecognized MPC data blob: {mpc_data}")))?
            .to_owned();
        if !g.computed.contains(&operation) {
            g.computed.push(operation);
        }
        Ok(())
    }
}

#[async_trait]
impl KeyServicePort for InMemorySdkAdapter {
    async fn initialize(&self, credentials: &SessionCredentials) -> Result<(), SdkError> {
        if !credentials.is_complete() {
            return Err(SdkError::Validation("session credentials incomplete".to_owned()));
        }
        self.state()?.key_service_ready = true;
        Ok(())
    }

    async fn create_signature_request(
        &self,
        key_name: &str,
        transaction: &Transaction,
    ) -> Result<String, SdkError> {
        let mut g = self.state()?;
        if !g.key_service_ready {
            return Err(SdkError::Validation("key service not initialized".to_owned()));
        }
        let sequence = g.created.len() as u64 + 1;
        let name = format!("operations/signature-{sequence:04}");
        g.created.push(CreatedOperation {
            name: name.clone(),
            sequence,
            key_name: key_name.to_owned(),
            transaction: transaction.clone(),
        });
        Ok(name)
    }

    async fn wait_signature(&self, operation_name: &str) -> Result<Signature, SdkError> {
        let g = self.state()?;
        if !g.key_service_ready {
            return Err(SdkError::Validation("key service not initialized".to_owned()));
        }
        let created = g
            .created
            .iter()
            .find(|op| op.name == operation_name)
            .ok_or_else(|| SdkError::NotFound(format!("operation {operation_name}")))?;
        if !g.computed.contains(&created.name) {
            return Err(SdkError::Sdk(format!(
                "signature not complete for {operation_name}"
            )));
        }
        Ok(Signature {
            signed_payload: signed_payload_fixture(created.sequence),
        })
    }

    async fn signed_transaction(
        &self,
        transaction: &Transaction,
        signature: &Signature,
    ) -> Result<SignedTransaction, SdkError> {
        let g = self.state()?;
        if !g.key_service_ready {
            return Err(SdkError::Validation("key service not initialized".to_owned()));
        }
        let sig_hex = signature.signed_payload.trim_start_matches("0x");
        Ok(SignedTransaction {
            raw_transaction: format!(
                "0x02f872{:02x}{sig_hex}",
                (transaction.nonce & 0xff) as u8
            ),
        })
    }
}

#[async_trait]
impl WalletServicePort for InMemorySdkAdapter {
    async fn initialize(&self, credentials: &SessionCredentials) -> Result<(), SdkError> {
        if !credentials.is_complete() {
            return Err(SdkError::Validation("session credentials incomplete".to_owned()));
        }
        self.state()?.wallet_service_ready = true;
        Ok(())
    }

    async fn resolve_address(&self, address_name: &str) -> Result<AddressRecord, SdkError> {
        let g = self.state()?;
        if !g.wallet_service_ready {
            return Err(SdkError::Validation("wallet service not initialized".to_owned()));
        }
        if g.missing_addresses.iter().any(|a| a == address_name) {
            return Err(SdkError::NotFound(format!("address {address_name}")));
        }
        let tail = address_name.rsplit('/').next().unwrap_or(address_name);
        let mpc_keys = if g.keyless_addresses.iter().any(|a| a == address_name) {
            Vec::new()
        } else {
            vec![format!("pools/demo/deviceGroups/demo/mpcKeys/{tail}")]
        };
        Ok(AddressRecord {
            name: address_name.to_owned(),
            address: tail.to_owned(),
            mpc_keys,
        })
    }
}
