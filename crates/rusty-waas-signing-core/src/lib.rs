pub mod domain;
pub mod orchestrator;
pub mod ports;
pub mod state_machine;

pub use domain::{
    AddressRecord, PendingSignatureOperation, SessionCredentials, Signature, SignedTransaction,
    SigningRequest, Transaction,
};
pub use orchestrator::{FlowEvent, FlowFailure, Orchestrator, SigningOutcome};
pub use ports::{KeyServicePort, MpcSdkPort, SdkError, WalletServicePort};
pub use state_machine::{flow_transition, FlowAction, FlowState, FlowTransition};
