use crate::ports::SdkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    CollectingRefs,
    CollectingTx,
    Submitting,
    Polling,
    Matching,
    Computing,
    AwaitingSignature,
    Assembling,
    Done,
    Failed,
}

impl FlowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FlowState::Done | FlowState::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowAction {
    ConfirmRefs,
    ConfirmTx,
    Submitted,
    Polled,
    Matched,
    Computed,
    SignatureReceived,
    Assembled,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowTransition {
    pub from: FlowState,
    pub to: FlowState,
    pub reason: &'static str,
}

pub fn flow_transition(
    from: FlowState,
    action: FlowAction,
) -> Result<(FlowState, FlowTransition), SdkError> {
    use FlowAction as A;
    use FlowState as S;

    let (to, reason) = match (from, action) {
        (S::CollectingRefs, A::ConfirmRefs) => (S::CollectingTx, "refs_confirmed"),
        (S::CollectingTx, A::ConfirmTx) => (S::Submitting, "tx_confirmed"),
        (S::Submitting, A::Submitted) => (S::Polling, "signature_requested"),
        (S::Polling, A::Polled) => (S::Matching, "pending_listed"),
        (S::Matching, A::Matched) => (S::Computing, "operation_matched"),
        (S::Computing, A::Computed) => (S::AwaitingSignature, "mpc_round_complete"),
        (S::AwaitingSignature, A::SignatureReceived) => (S::Assembling, "signature_received"),
        (S::Assembling, A::Assembled) => (S::Done, "transaction_assembled"),
        (s, A::Fail) if !s.is_terminal() => (S::Failed, "flow_failed"),
        (from, action) => {
            return Err(SdkError::Validation(format!(
                "illegal flow transition from {from:?} on {action:?}"
            )))
        }
    };

    Ok((to, FlowTransition { from, to, reason }))
}
