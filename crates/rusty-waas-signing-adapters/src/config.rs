use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterMode {
    InMemory,
    Http,
}

#[derive(Debug, Clone)]
pub struct SdkAdapterConfig {
    pub mode: AdapterMode,
    pub service_base_url: String,
    pub request_timeout_ms: u64,
    pub signature_wait_deadline_ms: u64,
    pub signature_poll_interval_ms: u64,
    pub verbose_sdk_logging: bool,
}

impl Default for SdkAdapterConfig {
    fn default() -> Self {
        Self {
            mode: AdapterMode::InMemory,
            service_base_url: "http://127.0.0.1:8400".to_owned(),
            request_timeout_ms: 15_000,
            signature_wait_deadline_ms: 60_000,
            signature_poll_interval_ms: 500,
            verbose_sdk_logging: true,
        }
    }
}

impl SdkAdapterConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = env::var("WAAS_ADAPTER_MODE") {
            config.mode = match raw.trim().to_ascii_lowercase().as_str() {
                "http" => AdapterMode::Http,
                _ => AdapterMode::InMemory,
            };
        }
        if let Ok(raw) = env::var("WAAS_SERVICE_URL") {
            let trimmed = raw.trim().trim_end_matches('/');
            if !trimmed.is_empty() {
                config.service_base_url = trimmed.to_owned();
            }
        }
        if let Some(v) = env_u64("WAAS_REQUEST_TIMEOUT_MS") {
            config.request_timeout_ms = v;
        }
        if let Some(v) = env_u64("WAAS_SIGNATURE_WAIT_DEADLINE_MS") {
            config.signature_wait_deadline_ms = v;
        }
        if let Some(v) = env_u64("WAAS_SIGNATURE_POLL_INTERVAL_MS") {
            config.signature_poll_interval_ms = v;
        }
        if let Ok(raw) = env::var("WAAS_SDK_VERBOSE") {
            config.verbose_sdk_logging = !matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            );
        }
        config
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|raw| raw.trim().parse().ok())
}
