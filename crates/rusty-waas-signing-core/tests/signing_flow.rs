use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusty_waas_signing_core::{
    AddressRecord, FlowEvent, FlowState, KeyServicePort, MpcSdkPort, Orchestrator,
    PendingSignatureOperation, SdkError, SessionCredentials, Signature, SignedTransaction,
    SigningRequest, Transaction, WalletServicePort,
};

const GOERLI_TX: &str = r#"{
    "ChainID": "0x5",
    "Nonce": 0,
    "MaxPriorityFeePerGas": "0x400",
    "MaxFeePerGas": "0x400",
    "Gas": 63000,
    "To": "0xd8ddbfd00b958e94a024fb8c116ae89c70c60257",
    "Value": "0x1000",
    "Data": ""
}"#;

const RAW_TX: &str = "0x02f8700580820400820400825ef89470";

#[derive(Default)]
struct ScriptInner {
    calls: Vec<String>,
    created: Vec<String>,
    omit_created_from_pending: bool,
    strip_mpc_keys: bool,
    resolve_error: Option<String>,
    compute_error: Option<String>,
}

#[derive(Clone, Default)]
struct ScriptedSdk {
    inner: Arc<Mutex<ScriptInner>>,
}

impl ScriptedSdk {
    fn record(&self, call: String) {
        self.inner.lock().unwrap().calls.push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    fn fail_compute(&self, message: &str) {
        self.inner.lock().unwrap().compute_error = Some(message.to_owned());
    }

    fn fail_resolve(&self, message: &str) {
        self.inner.lock().unwrap().resolve_error = Some(message.to_owned());
    }

    fn omit_created_from_pending(&self) {
        self.inner.lock().unwrap().omit_created_from_pending = true;
    }

    fn strip_mpc_keys(&self) {
        self.inner.lock().unwrap().strip_mpc_keys = true;
    }
}

fn foreign_entry() -> PendingSignatureOperation {
    PendingSignatureOperation {
        operation: "operations/signature-other".to_owned(),
        mpc_operation: "pools/p/deviceGroups/dg/mpcOperations/other".to_owned(),
        payload: "0xdead".to_owned(),
        mpc_data: "bXBjLW90aGVy".to_owned(),
    }
}

fn pending_entry(operation: &str) -> PendingSignatureOperation {
    PendingSignatureOperation {
        operation: operation.to_owned(),
        mpc_operation: format!("pools/p/deviceGroups/dg/mpcOperations/{operation}"),
        payload: "0x7f2c8d91a4".to_owned(),
        mpc_data: "bXBjLWRhdGE=".to_owned(),
    }
}

#[async_trait]
impl MpcSdkPort for ScriptedSdk {
    async fn initialize(&self, verbose: bool) -> Result<(), SdkError> {
        self.record(format!("mpc.initialize({verbose})"));
        Ok(())
    }

    async fn poll_pending_signatures(
        &self,
        device_group_name: &str,
    ) -> Result<Vec<PendingSignatureOperation>, SdkError> {
        self.record(format!("mpc.poll({device_group_name})"));
        let inner = self.inner.lock().unwrap();
        let mut entries = vec![foreign_entry()];
        if !inner.omit_created_from_pending {
            entries.extend(inner.created.iter().map(|op| pending_entry(op)));
        }
        Ok(entries)
    }

    async fn compute_operation(&self, mpc_data: &str) -> Result<(), SdkError> {
        self.record(format!("mpc.compute({mpc_data})"));
        match self.inner.lock().unwrap().compute_error.clone() {
            Some(message) => Err(SdkError::Sdk(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl KeyServicePort for ScriptedSdk {
    async fn initialize(&self, credentials: &SessionCredentials) -> Result<(), SdkError> {
        self.record(format!("key.initialize({})", credentials.api_key_name));
        Ok(())
    }

    async fn create_signature_request(
        &self,
        key_name: &str,
        transaction: &Transaction,
    ) -> Result<String, SdkError> {
        self.record(format!("key.create({key_name},nonce={})", transaction.nonce));
        let mut inner = self.inner.lock().unwrap();
        let operation = format!("operations/signature-{}", inner.created.len() + 1);
        inner.created.push(operation.clone());
        Ok(operation)
    }

    async fn wait_signature(&self, operation_name: &str) -> Result<Signature, SdkError> {
        self.record(format!("key.wait({operation_name})"));
        Ok(Signature {
            signed_payload: format!("0xsigned:{operation_name}"),
        })
    }

    async fn signed_transaction(
        &self,
        transaction: &Transaction,
        signature: &Signature,
    ) -> Result<SignedTransaction, SdkError> {
        self.record(format!(
            "key.assemble(nonce={},payload={})",
            transaction.nonce, signature.signed_payload
        ));
        Ok(SignedTransaction {
            raw_transaction: RAW_TX.to_owned(),
        })
    }
}

#[async_trait]
impl WalletServicePort for ScriptedSdk {
    async fn initialize(&self, credentials: &SessionCredentials) -> Result<(), SdkError> {
        self.record(format!("wallet.initialize({})", credentials.api_key_name));
        Ok(())
    }

    async fn resolve_address(&self, address_name: &str) -> Result<AddressRecord, SdkError> {
        self.record(format!("wallet.resolve({address_name})"));
        let inner = self.inner.lock().unwrap();
        if let Some(message) = inner.resolve_error.clone() {
            return Err(SdkError::NotFound(message));
        }
        let mpc_keys = if inner.strip_mpc_keys {
            Vec::new()
        } else {
            vec!["pools/p/deviceGroups/dg/mpcKeys/k1".to_owned()]
        };
        Ok(AddressRecord {
            name: address_name.to_owned(),
            address: "0xd8ddbfd00b958e94a024fb8c116ae89c70c60257".to_owned(),
            mpc_keys,
        })
    }
}

fn orchestrator(sdk: &ScriptedSdk) -> Orchestrator<ScriptedSdk, ScriptedSdk, ScriptedSdk> {
    Orchestrator::new(sdk.clone(), sdk.clone(), sdk.clone(), true)
}

fn ready_request() -> SigningRequest {
    SigningRequest {
        credentials: SessionCredentials {
            api_key_name: "organizations/org/apiKeys/key".to_owned(),
            private_key: "pem-bytes".to_owned(),
        },
        address_name: "networks/goerli/addresses/0xd8dd".to_owned(),
        device_group_name: "pools/p/deviceGroups/dg".to_owned(),
        transaction_json: GOERLI_TX.to_owned(),
    }
}

fn event_name(event: &FlowEvent) -> &'static str {
    match event {
        FlowEvent::SignatureRequested { .. } => "signature_requested",
        FlowEvent::PollingStarted => "polling_started",
        FlowEvent::PendingSignatureFound { .. } => "pending_signature_found",
        FlowEvent::OperationComputed => "operation_computed",
        FlowEvent::SignatureReady { .. } => "signature_ready",
        FlowEvent::TransactionAssembled { .. } => "transaction_assembled",
    }
}

#[tokio::test]
async fn full_flow_emits_every_milestone_in_order() {
    let sdk = ScriptedSdk::default();
    let orch = orchestrator(&sdk);
    let mut events = Vec::new();

    let outcome = orch
        .sign_transaction(&ready_request(), |event| events.push(event))
        .await
        .expect("flow must succeed");

    let names: Vec<_> = events.iter().map(event_name).collect();
    assert_eq!(
        names,
        vec![
            "signature_requested",
            "polling_started",
            "pending_signature_found",
            "operation_computed",
            "signature_ready",
            "transaction_assembled",
        ]
    );

    assert_eq!(outcome.operation_name, "operations/signature-1");
    assert_eq!(outcome.pending_signature.operation, outcome.operation_name);
    assert_eq!(
        outcome.signature.signed_payload,
        "0xsigned:operations/signature-1"
    );
    assert_eq!(outcome.signed_transaction.raw_transaction, RAW_TX);
    assert_eq!(outcome.transitions.len(), 8);
    assert_eq!(
        outcome.transitions.last().expect("has transitions").to,
        FlowState::Done
    );

    assert_eq!(
        sdk.calls(),
        vec![
            "mpc.initialize(true)".to_owned(),
            "key.initialize(organizations/org/apiKeys/key)".to_owned(),
            "wallet.initialize(organizations/org/apiKeys/key)".to_owned(),
            "wallet.resolve(networks/goerli/addresses/0xd8dd)".to_owned(),
            "key.create(pools/p/deviceGroups/dg/mpcKeys/k1,nonce=0)".to_owned(),
            "mpc.poll(pools/p/deviceGroups/dg)".to_owned(),
            "mpc.compute(bXBjLWRhdGE=)".to_owned(),
            "key.wait(operations/signature-1)".to_owned(),
            "key.assemble(nonce=0,payload=0xsigned:operations/signature-1)".to_owned(),
        ]
    );
}

#[tokio::test]
async fn match_skips_unrelated_pending_operations() {
    let sdk = ScriptedSdk::default();
    let orch = orchestrator(&sdk);

    let outcome = orch
        .sign_transaction(&ready_request(), |_| {})
        .await
        .expect("flow must succeed");

    assert_eq!(outcome.pending_signature.operation, "operations/signature-1");
    assert_eq!(outcome.pending_signature.payload, "0x7f2c8d91a4");
}

#[tokio::test]
async fn missing_operation_reports_its_name() {
    let sdk = ScriptedSdk::default();
    sdk.omit_created_from_pending();
    let orch = orchestrator(&sdk);
    let mut events = Vec::new();

    let failure = orch
        .sign_transaction(&ready_request(), |event| events.push(event))
        .await
        .expect_err("match must fail");

    assert!(matches!(failure.error, SdkError::OperationNotFound(_)));
    assert_eq!(
        failure.to_string(),
        "could not find operation with name operations/signature-1"
    );

    // The failed run still hands back its transition trail, ending in Failed.
    let states: Vec<_> = failure.transitions.iter().map(|t| t.to).collect();
    assert_eq!(
        states,
        vec![
            FlowState::CollectingTx,
            FlowState::Submitting,
            FlowState::Polling,
            FlowState::Matching,
            FlowState::Failed,
        ]
    );

    let names: Vec<_> = events.iter().map(event_name).collect();
    assert_eq!(names, vec!["signature_requested", "polling_started"]);
    assert!(!sdk.calls().iter().any(|c| c.starts_with("mpc.compute")));
}

#[tokio::test]
async fn compute_rejection_halts_before_signature_wait() {
    let sdk = ScriptedSdk::default();
    sdk.fail_compute("MPC hardware unavailable");
    let orch = orchestrator(&sdk);
    let mut events = Vec::new();

    let failure = orch
        .sign_transaction(&ready_request(), |event| events.push(event))
        .await
        .expect_err("compute must fail");

    assert!(failure.to_string().contains("MPC hardware unavailable"));
    assert_eq!(failure.transitions.last().expect("trail").to, FlowState::Failed);

    let names: Vec<_> = events.iter().map(event_name).collect();
    assert_eq!(
        names,
        vec![
            "signature_requested",
            "polling_started",
            "pending_signature_found",
        ]
    );
    assert!(!sdk.calls().iter().any(|c| c.starts_with("key.wait")));
}

#[tokio::test]
async fn malformed_transaction_stops_before_submission() {
    let sdk = ScriptedSdk::default();
    let orch = orchestrator(&sdk);
    let mut request = ready_request();
    request.transaction_json = "{ \"ChainID\": ".to_owned();
    let mut events = Vec::new();

    let failure = orch
        .sign_transaction(&request, |event| events.push(event))
        .await
        .expect_err("parse must fail");

    assert!(matches!(failure.error, SdkError::MalformedInput(_)));
    assert!(events.is_empty());
    assert!(!sdk.calls().iter().any(|c| c.starts_with("key.create")));
}

#[tokio::test]
async fn unknown_address_is_fatal() {
    let sdk = ScriptedSdk::default();
    sdk.fail_resolve("networks/goerli/addresses/0xmissing");
    let orch = orchestrator(&sdk);
    let mut events = Vec::new();

    let failure = orch
        .sign_transaction(&ready_request(), |event| events.push(event))
        .await
        .expect_err("resolve must fail");

    assert!(matches!(failure.error, SdkError::NotFound(_)));
    assert!(events.is_empty());
    assert!(!sdk.calls().iter().any(|c| c.starts_with("key.create")));
}

#[tokio::test]
async fn address_without_mpc_keys_is_rejected() {
    let sdk = ScriptedSdk::default();
    sdk.strip_mpc_keys();
    let orch = orchestrator(&sdk);

    let failure = orch
        .sign_transaction(&ready_request(), |_| {})
        .await
        .expect_err("keyless address must fail");

    assert!(matches!(failure.error, SdkError::InvalidAddress(_)));
    assert!(!sdk.calls().iter().any(|c| c.starts_with("key.create")));
}

#[tokio::test]
async fn incomplete_request_makes_no_external_calls() {
    let sdk = ScriptedSdk::default();
    let orch = orchestrator(&sdk);
    let mut request = ready_request();
    request.address_name = String::new();
    let mut events = Vec::new();

    let failure = orch
        .sign_transaction(&request, |event| events.push(event))
        .await
        .expect_err("guard must reject");

    assert!(matches!(failure.error, SdkError::Validation(_)));
    let states: Vec<_> = failure.transitions.iter().map(|t| t.to).collect();
    assert_eq!(states, vec![FlowState::Failed]);
    assert!(events.is_empty());
    assert!(sdk.calls().is_empty());
}
