//! Wizard state for the signing walkthrough.
//!
//! One boolean per revealed step. Steps only ever accumulate; the sole way
//! back is a full restart.

use rusty_waas_signing_core::{
    FlowEvent, PendingSignatureOperation, SessionCredentials, Signature, SignedTransaction,
    SigningRequest,
};

/// Transaction prefilled in the editor. The defaults suffice for the Goerli
/// test network.
pub const INITIAL_TX_JSON: &str = r#"{
  "ChainID": "0x5",
  "Nonce": 0,
  "MaxPriorityFeePerGas": "0x400",
  "MaxFeePerGas": "0x400",
  "Gas": 63000,
  "To": "0xd8ddbfd00b958e94a024fb8c116ae89c70c60257",
  "Value": "0x1000",
  "Data": ""
}"#;

#[derive(Debug, Clone)]
pub struct WizardState {
    pub address_name: String,
    pub device_group_name: String,
    pub transaction_text: String,

    // Inputs lock when the step they feed is confirmed, so the draft the
    // worker signs is exactly the draft on screen.
    pub refs_editable: bool,
    pub transaction_editable: bool,

    pub show_step2: bool,
    pub show_step3: bool,
    pub show_step4: bool,
    pub show_step5: bool,
    pub show_step6: bool,
    pub show_step7: bool,
    pub show_step8: bool,
    pub show_step9: bool,
    pub show_error: bool,

    pub pending_signature: Option<PendingSignatureOperation>,
    pub signature: Option<Signature>,
    pub signed_transaction: Option<SignedTransaction>,
    pub error: Option<String>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            address_name: String::new(),
            device_group_name: String::new(),
            transaction_text: INITIAL_TX_JSON.to_owned(),
            refs_editable: true,
            transaction_editable: true,
            show_step2: false,
            show_step3: false,
            show_step4: false,
            show_step5: false,
            show_step6: false,
            show_step7: false,
            show_step8: false,
            show_step9: false,
            show_error: false,
            pending_signature: None,
            signature: None,
            signed_transaction: None,
            error: None,
        }
    }
}

impl WizardState {
    pub fn refs_filled(&self) -> bool {
        !self.address_name.trim().is_empty() && !self.device_group_name.trim().is_empty()
    }

    pub fn confirm_refs(&mut self) {
        self.refs_editable = false;
        self.show_step2 = true;
    }

    pub fn confirm_transaction(&mut self) {
        self.transaction_editable = false;
        self.show_step3 = true;
    }

    /// True once both Continue buttons were pressed and nothing has failed.
    pub fn wants_signing(&self) -> bool {
        self.show_step3 && !self.show_error
    }

    pub fn to_request(&self, credentials: &SessionCredentials) -> SigningRequest {
        SigningRequest {
            credentials: credentials.clone(),
            address_name: self.address_name.trim().to_owned(),
            device_group_name: self.device_group_name.trim().to_owned(),
            transaction_json: self.transaction_text.clone(),
        }
    }

    pub fn apply_event(&mut self, event: FlowEvent) {
        match event {
            FlowEvent::SignatureRequested { .. } => self.show_step4 = true,
            FlowEvent::PollingStarted => self.show_step5 = true,
            FlowEvent::PendingSignatureFound { operation } => {
                self.pending_signature = Some(operation);
                self.show_step6 = true;
            }
            FlowEvent::OperationComputed => self.show_step7 = true,
            FlowEvent::SignatureReady { signature } => {
                self.signature = Some(signature);
                self.show_step8 = true;
            }
            FlowEvent::TransactionAssembled { signed } => {
                self.signed_transaction = Some(signed);
                self.show_step9 = true;
            }
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.show_error = true;
    }

    pub fn restart(&mut self) {
        *self = Self::default();
    }
}
