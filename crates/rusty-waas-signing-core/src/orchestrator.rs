use thiserror::Error;

use crate::domain::{
    PendingSignatureOperation, Signature, SignedTransaction, SigningRequest, Transaction,
};
use crate::ports::{KeyServicePort, MpcSdkPort, SdkError, WalletServicePort};
use crate::state_machine::{flow_transition, FlowAction, FlowState, FlowTransition};

#[derive(Debug, Clone)]
pub enum FlowEvent {
    SignatureRequested { operation: String },
    PollingStarted,
    PendingSignatureFound { operation: PendingSignatureOperation },
    OperationComputed,
    SignatureReady { signature: Signature },
    TransactionAssembled { signed: SignedTransaction },
}

#[derive(Debug, Clone)]
pub struct SigningOutcome {
    pub operation_name: String,
    pub pending_signature: PendingSignatureOperation,
    pub signature: Signature,
    pub signed_transaction: SignedTransaction,
    pub transitions: Vec<FlowTransition>,
}

/// Terminal error carrying the transition trail recorded up to and including
/// the `Fail` step, so callers can log where the flow stopped.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct FlowFailure {
    pub error: SdkError,
    pub transitions: Vec<FlowTransition>,
}

struct FlowProgress {
    state: FlowState,
    records: Vec<FlowTransition>,
}

impl FlowProgress {
    fn new() -> Self {
        Self {
            state: FlowState::CollectingRefs,
            records: Vec::new(),
        }
    }

    fn advance(&mut self, action: FlowAction) -> Result<(), SdkError> {
        let (next, record) = flow_transition(self.state, action)?;
        self.state = next;
        self.records.push(record);
        Ok(())
    }

    fn fail(mut self, error: SdkError) -> FlowFailure {
        // Fail is legal from every non-terminal state.
        let _ = self.advance(FlowAction::Fail);
        FlowFailure {
            error,
            transitions: self.records,
        }
    }
}

pub struct Orchestrator<M, K, W>
where
    M: MpcSdkPort,
    K: KeyServicePort,
    W: WalletServicePort,
{
    pub mpc_sdk: M,
    pub key_service: K,
    pub wallet_service: W,
    pub verbose: bool,
}

impl<M, K, W> Orchestrator<M, K, W>
where
    M: MpcSdkPort,
    K: KeyServicePort,
    W: WalletServicePort,
{
    pub fn new(mpc_sdk: M, key_service: K, wallet_service: W, verbose: bool) -> Self {
        Self {
            mpc_sdk,
            key_service,
            wallet_service,
            verbose,
        }
    }

    /// Drives one signature request end to end. `on_event` fires after each
    /// externally visible milestone, in order, and never after an error.
    /// Failures come back as a [`FlowFailure`] whose trail ends in the
    /// recorded `Fail` transition.
    pub async fn sign_transaction(
        &self,
        request: &SigningRequest,
        mut on_event: impl FnMut(FlowEvent),
    ) -> Result<SigningOutcome, FlowFailure> {
        let mut progress = FlowProgress::new();
        if !request.is_ready() {
            return Err(progress.fail(SdkError::Validation(
                "signing request incomplete".to_owned(),
            )));
        }
        match self.run_flow(request, &mut progress, &mut on_event).await {
            Ok(outcome) => Ok(outcome),
            Err(error) => Err(progress.fail(error)),
        }
    }

    async fn run_flow(
        &self,
        request: &SigningRequest,
        progress: &mut FlowProgress,
        on_event: &mut impl FnMut(FlowEvent),
    ) -> Result<SigningOutcome, SdkError> {
        progress.advance(FlowAction::ConfirmRefs)?;
        progress.advance(FlowAction::ConfirmTx)?;

        self.mpc_sdk.initialize(self.verbose).await?;
        self.key_service.initialize(&request.credentials).await?;
        self.wallet_service.initialize(&request.credentials).await?;

        let address = self
            .wallet_service
            .resolve_address(&request.address_name)
            .await?;
        let key_name = address.signing_key()?.to_owned();
        let transaction = Transaction::from_json(&request.transaction_json)?;

        let operation_name = self
            .key_service
            .create_signature_request(&key_name, &transaction)
            .await?;
        progress.advance(FlowAction::Submitted)?;
        on_event(FlowEvent::SignatureRequested {
            operation: operation_name.clone(),
        });

        on_event(FlowEvent::PollingStarted);
        let pending = self
            .mpc_sdk
            .poll_pending_signatures(&request.device_group_name)
            .await?;
        progress.advance(FlowAction::Polled)?;

        let matched = pending
            .into_iter()
            .find(|entry| entry.operation == operation_name)
            .ok_or_else(|| SdkError::OperationNotFound(operation_name.clone()))?;
        progress.advance(FlowAction::Matched)?;
        on_event(FlowEvent::PendingSignatureFound {
            operation: matched.clone(),
        });

        self.mpc_sdk.compute_operation(&matched.mpc_data).await?;
        progress.advance(FlowAction::Computed)?;
        on_event(FlowEvent::OperationComputed);

        let signature = self.key_service.wait_signature(&matched.operation).await?;
        progress.advance(FlowAction::SignatureReceived)?;
        on_event(FlowEvent::SignatureReady {
            signature: signature.clone(),
        });

        let signed = self
            .key_service
            .signed_transaction(&transaction, &signature)
            .await?;
        progress.advance(FlowAction::Assembled)?;
        on_event(FlowEvent::TransactionAssembled {
            signed: signed.clone(),
        });

        Ok(SigningOutcome {
            operation_name,
            pending_signature: matched,
            signature,
            signed_transaction: signed,
            transitions: std::mem::take(&mut progress.records),
        })
    }
}
