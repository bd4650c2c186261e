//! Background execution of the signing flow.
//!
//! The egui shell stays synchronous. Each wizard run spawns one worker
//! thread that drives the orchestrator on its own tokio runtime and reports
//! progress through a channel drained once per frame.

use std::sync::mpsc;
use std::thread;

use eframe::egui;

use rusty_waas_signing_adapters::{
    AdapterMode, HttpSdkAdapter, InMemorySdkAdapter, SdkAdapterConfig,
};
use rusty_waas_signing_core::{
    FlowEvent, FlowFailure, FlowTransition, Orchestrator, SdkError, SigningOutcome, SigningRequest,
};

/// Progress report from the signing worker.
pub enum WizardUpdate {
    Event(FlowEvent),
    Finished,
    Failed(String),
}

pub struct WizardBridge {
    config: SdkAdapterConfig,
    launched: bool,
    updates: Option<mpsc::Receiver<WizardUpdate>>,
}

impl WizardBridge {
    pub fn new(config: SdkAdapterConfig) -> Self {
        Self {
            config,
            launched: false,
            updates: None,
        }
    }

    /// True from launch until the terminal report has been drained.
    pub fn in_flight(&self) -> bool {
        self.launched && self.updates.is_some()
    }

    pub fn launched(&self) -> bool {
        self.launched
    }

    /// Spawns the signing worker. At most one worker runs per wizard round;
    /// further calls are ignored until [`WizardBridge::reset`].
    pub fn launch(&mut self, ctx: &egui::Context, request: SigningRequest) {
        if self.launched {
            return;
        }
        self.launched = true;
        tracing::info!("launching signing flow for {}", request.address_name);

        let (tx, rx) = mpsc::channel();
        self.updates = Some(rx);

        let config = self.config.clone();
        let ctx = ctx.clone();
        thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let outcome = rt.block_on(run_flow(config, request, |event| {
                let _ = tx.send(WizardUpdate::Event(event));
                ctx.request_repaint();
            }));
            let terminal = match outcome {
                Ok(()) => {
                    tracing::info!("signing flow finished");
                    WizardUpdate::Finished
                }
                Err(err) => {
                    tracing::warn!("signing flow failed: {err}");
                    WizardUpdate::Failed(err.to_string())
                }
            };
            let _ = tx.send(terminal);
            ctx.request_repaint();
        });
    }

    /// Drains pending reports, oldest first. The channel is dropped once a
    /// terminal report came through.
    pub fn poll(&mut self) -> Vec<WizardUpdate> {
        let mut drained = Vec::new();
        let Some(rx) = &self.updates else {
            return drained;
        };

        let mut finished = false;
        loop {
            match rx.try_recv() {
                Ok(update) => {
                    if matches!(update, WizardUpdate::Finished | WizardUpdate::Failed(_)) {
                        finished = true;
                    }
                    drained.push(update);
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    finished = true;
                    break;
                }
            }
        }
        if finished {
            self.updates = None;
        }
        drained
    }

    pub fn reset(&mut self) {
        self.launched = false;
        self.updates = None;
    }
}

async fn run_flow(
    config: SdkAdapterConfig,
    request: SigningRequest,
    on_event: impl FnMut(FlowEvent),
) -> Result<(), SdkError> {
    let verbose = config.verbose_sdk_logging;
    match config.mode {
        AdapterMode::InMemory => {
            let sdk = InMemorySdkAdapter::default();
            log_outcome(
                Orchestrator::new(sdk.clone(), sdk.clone(), sdk, verbose)
                    .sign_transaction(&request, on_event)
                    .await,
            )
        }
        AdapterMode::Http => {
            let sdk = HttpSdkAdapter::with_config(config)?;
            log_outcome(
                Orchestrator::new(sdk.clone(), sdk.clone(), sdk, verbose)
                    .sign_transaction(&request, on_event)
                    .await,
            )
        }
    }
}

/// Logs the transition trail whether the flow finished or failed, then hands
/// the shell a plain result.
fn log_outcome(outcome: Result<SigningOutcome, FlowFailure>) -> Result<(), SdkError> {
    match outcome {
        Ok(outcome) => {
            log_transitions(&outcome.transitions);
            Ok(())
        }
        Err(failure) => {
            log_transitions(&failure.transitions);
            Err(failure.error)
        }
    }
}

fn log_transitions(transitions: &[FlowTransition]) {
    for transition in transitions {
        tracing::debug!(
            "flow transition {:?} -> {:?} ({})",
            transition.from,
            transition.to,
            transition.reason
        );
    }
}
