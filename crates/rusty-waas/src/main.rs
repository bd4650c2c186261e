//! Rusty-WaaS: A Rust-native MPC wallet transaction signing GUI

use eframe::egui;
use eyre::WrapErr;

use rusty_waas_signing_adapters::{AdapterMode, SdkAdapterConfig};
use rusty_waas_signing_core::SessionCredentials;

mod app;
mod bridge;
mod state;
mod ui;

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Rusty-WaaS");

    let config = SdkAdapterConfig::from_env();
    let credentials = load_credentials(&config);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Rusty-WaaS")
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty-WaaS",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::App::new(cc, credentials, config)))),
    )
}

/// Session credentials come from `WAAS_CREDENTIALS_FILE` (an API key file in
/// JSON form) or from `WAAS_API_KEY_NAME`/`WAAS_PRIVATE_KEY`. The in-memory
/// adapter takes placeholder credentials, so the offline demo needs no setup.
fn load_credentials(config: &SdkAdapterConfig) -> SessionCredentials {
    if let Ok(path) = std::env::var("WAAS_CREDENTIALS_FILE") {
        match read_credentials_file(&path) {
            Ok(credentials) => return credentials,
            Err(err) => tracing::warn!("ignoring credentials file: {:#}", err),
        }
    }

    let credentials = SessionCredentials {
        api_key_name: std::env::var("WAAS_API_KEY_NAME").unwrap_or_default(),
        private_key: std::env::var("WAAS_PRIVATE_KEY").unwrap_or_default(),
    };
    if credentials.is_complete() {
        return credentials;
    }

    if config.mode == AdapterMode::InMemory {
        tracing::info!("no credentials configured, using the offline demo session");
        return SessionCredentials {
            api_key_name: "organizations/demo/apiKeys/offline".to_owned(),
            private_key: "demo-only-private-key".to_owned(),
        };
    }
    credentials
}

fn read_credentials_file(path: &str) -> eyre::Result<SessionCredentials> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading credentials file {path}"))?;
    serde_json::from_str(&raw).wrap_err("credentials file is not valid JSON")
}
