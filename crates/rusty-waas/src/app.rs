//! Main application state and update loop

use eframe::egui;

use rusty_waas_signing_adapters::SdkAdapterConfig;
use rusty_waas_signing_core::SessionCredentials;

use crate::bridge::{WizardBridge, WizardUpdate};
use crate::state::WizardState;
use crate::ui;

/// Flows the operator must have completed before a signature can succeed.
const REQUIRED_DEMOS: &[&str] = &["Pool Creation", "Device Registration", "Address Generation"];

/// The main application state
pub struct App {
    credentials: SessionCredentials,
    wizard: WizardState,
    bridge: WizardBridge,
}

impl App {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        credentials: SessionCredentials,
        config: SdkAdapterConfig,
    ) -> Self {
        Self {
            credentials,
            wizard: WizardState::default(),
            bridge: WizardBridge::new(config),
        }
    }

    fn drain_bridge(&mut self) {
        for update in self.bridge.poll() {
            match update {
                WizardUpdate::Event(event) => self.wizard.apply_event(event),
                WizardUpdate::Finished => {}
                WizardUpdate::Failed(message) => self.wizard.fail(message),
            }
        }
    }

    fn maybe_launch(&mut self, ctx: &egui::Context) {
        if self.wizard.wants_signing() && !self.bridge.launched() {
            let request = self.wizard.to_request(&self.credentials);
            if request.is_ready() {
                self.bridge.launch(ctx, request);
            }
        }
    }

    fn render_wizard(&mut self, ui: &mut egui::Ui) {
        let creds_ok = self.credentials.is_complete();

        ui::styled_heading(ui, "Transaction Signing");
        ui.add_space(8.0);

        ui::card(ui, |ui| {
            ui::warning_message(
                ui,
                "Note: Ensure you have run the following demos before this one:",
            );
            for demo in REQUIRED_DEMOS {
                ui.label(format!("  • {demo}"));
            }
        });
        ui.add_space(8.0);

        if !creds_ok {
            ui::card(ui, |ui| {
                ui::warning_message(
                    ui,
                    "No session credentials configured. Set WAAS_API_KEY_NAME and \
                     WAAS_PRIVATE_KEY, or point WAAS_CREDENTIALS_FILE at an API key file.",
                );
            });
            ui.add_space(8.0);
        }

        ui::card(ui, |ui| {
            ui.label("1. Input your Address resource name below:");
            ui.add_enabled_ui(self.wizard.refs_editable, |ui| {
                ui::resource_input(
                    ui,
                    &mut self.wizard.address_name,
                    "networks/{network_id}/addresses/{address_id}",
                );
            });
            ui.add_space(4.0);
            ui.label("Input your DeviceGroup resource name below:");
            ui.add_enabled_ui(self.wizard.refs_editable, |ui| {
                ui::resource_input(
                    ui,
                    &mut self.wizard.device_group_name,
                    "pools/{pool_id}/deviceGroups/{device_group_id}",
                );
            });
            ui.add_space(6.0);
            let can_continue = self.wizard.refs_editable && self.wizard.refs_filled();
            if ui::primary_button_enabled(ui, "Continue", can_continue).clicked() {
                self.wizard.confirm_refs();
            }
        });
        ui.add_space(8.0);

        if self.wizard.show_step2 {
            ui::card(ui, |ui| {
                ui.label(
                    "2. Input your Transaction information below. The default values should \
                     suffice for the Goerli Network.",
                );
                ui.add_enabled_ui(self.wizard.transaction_editable, |ui| {
                    ui::multiline_input(ui, &mut self.wizard.transaction_text, "{ }", 10);
                });
                ui.add_space(6.0);
                let can_continue = self.wizard.transaction_editable
                    && !self.wizard.transaction_text.trim().is_empty()
                    && creds_ok;
                if ui::primary_button_enabled(ui, "Continue", can_continue).clicked() {
                    self.wizard.confirm_transaction();
                }
            });
            ui.add_space(8.0);
        }

        if self.wizard.show_step3 {
            ui::card(ui, |ui| {
                ui.label("3. Initiating Signature creation...");
            });
            ui.add_space(8.0);
        }

        if self.wizard.show_step4 {
            ui::card(ui, |ui| {
                ui.label("4. Successfully initiated Signature creation.");
            });
            ui.add_space(8.0);
        }

        if self.wizard.show_step5 {
            ui::card(ui, |ui| {
                ui.label("5. Polling for pending Signatures...");
            });
            ui.add_space(8.0);
        }

        if self.wizard.show_step6 {
            ui::card(ui, |ui| {
                ui.label("6. Found pending Signature with resource name:");
                if let Some(pending) = &self.wizard.pending_signature {
                    ui.label(egui::RichText::new(&pending.mpc_operation).monospace());
                    ui.label("with hexadecimal payload:");
                    ui::copyable_hex(ui, &pending.payload);
                }
            });
            ui.add_space(8.0);
        }

        if self.wizard.show_step7 {
            ui::card(ui, |ui| {
                ui.label("7. Processed pending Signature.");
            });
            ui.add_space(8.0);
        }

        if self.wizard.show_step8 {
            ui::card(ui, |ui| {
                ui.label("8. Got Signature with signed hexadecimal payload:");
                if let Some(signature) = &self.wizard.signature {
                    ui::copyable_hex(ui, &signature.signed_payload);
                }
            });
            ui.add_space(8.0);
        }

        if self.wizard.show_step9 {
            ui::card(ui, |ui| {
                ui.label("9. Got signed transaction:");
                if let Some(signed) = &self.wizard.signed_transaction {
                    ui::copyable_hex(ui, &signed.raw_transaction);
                }
                ui.add_space(4.0);
                ui.label("You can broadcast this value on-chain if it is a valid transaction.");
                ui::warning_message(
                    ui,
                    "You will need to fund your address with the native currency (e.g. ETH) \
                     for the broadcast to be successful.",
                );
            });
            ui.add_space(8.0);
        }

        if self.wizard.show_error {
            ui::card(ui, |ui| {
                if let Some(error) = &self.wizard.error {
                    ui::error_message(ui, error);
                }
            });
            ui.add_space(8.0);
        }

        if self.bridge.in_flight() {
            ui::loading_spinner(ui, "Working...");
            ui.add_space(8.0);
        }

        if self.wizard.show_step9 || self.wizard.show_error {
            if ui::secondary_button(ui, "Restart demo").clicked() {
                self.wizard.restart();
                self.bridge.reset();
            }
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        self.drain_bridge();
        self.maybe_launch(ctx);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.heading(
                    egui::RichText::new("🔐 Rusty-WaaS")
                        .size(22.0)
                        .color(egui::Color32::from_rgb(0, 212, 170)),
                );
            });
            ui.add_space(8.0);
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.label(
                egui::RichText::new(format!(
                    "rusty-waas {} · {} · built {}",
                    env!("CARGO_PKG_VERSION"),
                    env!("GIT_HASH"),
                    env!("BUILD_TIME"),
                ))
                .size(11.0)
                .color(egui::Color32::GRAY),
            );
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    self.render_wizard(ui);
                });
        });
    }
}
