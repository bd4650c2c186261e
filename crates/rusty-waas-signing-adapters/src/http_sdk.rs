use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::{sleep, Instant};

use rusty_waas_signing_core::{
    AddressRecord, KeyServicePort, MpcSdkPort, PendingSignatureOperation, SdkError,
    SessionCredentials, Signature, SignedTransaction, Transaction, WalletServicePort,
};

use crate::SdkAdapterConfig;

/// Talks to a wallet platform gateway over REST. Resource names double as
/// request paths, mirroring how the platform addresses addresses, keys and
/// signature operations.
#[derive(Debug, Clone)]
pub struct HttpSdkAdapter {
    config: SdkAdapterConfig,
    client: reqwest::Client,
    runtime: Arc<Mutex<RuntimeState>>,
}

#[derive(Debug, Default)]
struct RuntimeState {
    initialized: bool,
    verbose: bool,
    session: Option<SessionCredentials>,
}

#[derive(Debug, Deserialize)]
struct CreateSignatureResponse {
    #[serde(rename = "Operation")]
    operation: String,
}

#[derive(Debug, Deserialize)]
struct PendingSignaturesResponse {
    #[serde(rename = "PendingSignatures", default)]
    pending_signatures: Vec<PendingSignatureOperation>,
}

#[derive(Debug, Deserialize)]
struct SignatureStatusResponse {
    #[serde(rename = "SignedPayload", default)]
    signed_payload: Option<String>,
}

impl HttpSdkAdapter {
    pub fn with_config(config: SdkAdapterConfig) -> Result<Self, SdkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| SdkError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self {
            config,
            client,
            runtime: Arc::new(Mutex::new(RuntimeState::default())),
        })
    }

    fn runtime(&self) -> Result<MutexGuard<'_, RuntimeState>, SdkError> {
        self.runtime
            .lock()
            .map_err(|e| SdkError::Transport(format!("sdk runtime lock poisoned: {e}")))
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/v1/{path}",
            self.config.service_base_url.trim_end_matches('/')
        )
    }

    pub fn verbose(&self) -> Result<bool, SdkError> {
        Ok(self.runtime()?.verbose)
    }

    fn ensure_runtime(&self) -> Result<(), SdkError> {
        if !self.runtime()?.initialized {
            return Err(SdkError::Validation("mpc runtime not initialized".to_owned()));
        }
        Ok(())
    }

    fn store_session(&self, credentials: &SessionCredentials) -> Result<(), SdkError> {
        if !credentials.is_complete() {
            return Err(SdkError::Validation("session credentials incomplete".to_owned()));
        }
        self.runtime()?.session = Some(credentials.clone());
        Ok(())
    }

    fn with_session(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, SdkError> {
        let session = self
            .runtime()?
            .session
            .clone()
            .ok_or_else(|| SdkError::Validation("service session not initialized".to_owned()))?;
        Ok(builder
            .header("X-Api-Key-Name", session.api_key_name)
            .bearer_auth(session.private_key))
    }

    fn maybe_session(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, SdkError> {
        Ok(match self.runtime()?.session.clone() {
            Some(session) => builder
                .header("X-Api-Key-Name", session.api_key_name)
                .bearer_auth(session.private_key),
            None => builder,
        })
    }
}

async fn read_success(
    response: reqwest::Response,
    resource: &str,
) -> Result<reqwest::Response, SdkError> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(SdkError::NotFound(resource.to_owned()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            format!("status {status} from {resource}")
        } else {
            body
        };
        return Err(SdkError::Sdk(message));
    }
    Ok(response)
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, SdkError> {
    response
        .json::<T>()
        .await
        .map_err(|e| SdkError::Transport(format!("response decode failed: {e}")))
}

fn request_failed(resource: &str) -> impl Fn(reqwest::Error) -> SdkError + '_ {
    move |e| SdkError::Transport(format!("request to {resource} failed: {e}"))
}

#[async_trait]
impl MpcSdkPort for HttpSdkAdapter {
    async fn initialize(&self, verbose: bool) -> Result<(), SdkError> {
        let mut g = self.runtime()?;
        g.initialized = true;
        g.verbose = verbose;
        Ok(())
    }

    async fn poll_pending_signatures(
        &self,
        device_group_name: &str,
    ) -> Result<Vec<PendingSignatureOperation>, SdkError> {
        self.ensure_runtime()?;
        let url = self.endpoint(&format!("{device_group_name}/pendingSignatures"));
        let response = self
            .maybe_session(self.client.get(&url))?
            .send()
            .await
            .map_err(request_failed(device_group_name))?;
        let response = read_success(response, device_group_name).await?;
        let listing: PendingSignaturesResponse = decode(response).await?;
        Ok(listing.pending_signatures)
    }

    async fn compute_operation(&self, mpc_data: &str) -> Result<(), SdkError> {
        self.ensure_runtime()?;
        let url = self.endpoint("device:computeMpcOperation");
        let response = self
            .maybe_session(self.client.post(&url))?
            .json(&serde_json::json!({ "MPCData": mpc_data }))
            .send()
            .await
            .map_err(request_failed("device:computeMpcOperation"))?;
        read_success(response, "device:computeMpcOperation").await?;
        Ok(())
    }
}

#[async_trait]
impl KeyServicePort for HttpSdkAdapter {
    async fn initialize(&self, credentials: &SessionCredentials) -> Result<(), SdkError> {
        self.store_session(credentials)
    }

    async fn create_signature_request(
        &self,
        key_name: &str,
        transaction: &Transaction,
    ) -> Result<String, SdkError> {
        let url = self.endpoint(&format!("{key_name}/signatures"));
        let response = self
            .with_session(self.client.post(&url))?
            .json(&serde_json::json!({ "Transaction": transaction }))
            .send()
            .await
            .map_err(request_failed(key_name))?;
        let response = read_success(response, key_name).await?;
        let created: CreateSignatureResponse = decode(response).await?;
        Ok(created.operation)
    }

    async fn wait_signature(&self, operation_name: &str) -> Result<Signature, SdkError> {
        let url = self.endpoint(operation_name);
        let deadline =
            Instant::now() + Duration::from_millis(self.config.signature_wait_deadline_ms);
        loop {
            let response = self
                .with_session(self.client.get(&url))?
                .send()
                .await
                .map_err(request_failed(operation_name))?;
            let response = read_success(response, operation_name).await?;
            let status: SignatureStatusResponse = decode(response).await?;
            if let Some(payload) = status.signed_payload.filter(|p| !p.trim().is_empty()) {
                return Ok(Signature {
                    signed_payload: payload,
                });
            }
            if Instant::now() >= deadline {
                return Err(SdkError::Sdk(format!(
                    "signature wait deadline exceeded for {operation_name}"
                )));
            }
            sleep(Duration::from_millis(self.config.signature_poll_interval_ms)).await;
        }
    }

    async fn signed_transaction(
        &self,
        transaction: &Transaction,
        signature: &Signature,
    ) -> Result<SignedTransaction, SdkError> {
        let url = self.endpoint("transactions:assemble");
        let response = self
            .with_session(self.client.post(&url))?
            .json(&serde_json::json!({
                "Transaction": transaction,
                "Signature": signature,
            }))
            .send()
            .await
            .map_err(request_failed("transactions:assemble"))?;
        let response = read_success(response, "transactions:assemble").await?;
        decode(response).await
    }
}

#[async_trait]
impl WalletServicePort for HttpSdkAdapter {
    async fn initialize(&self, credentials: &SessionCredentials) -> Result<(), SdkError> {
        self.store_session(credentials)
    }

    async fn resolve_address(&self, address_name: &str) -> Result<AddressRecord, SdkError> {
        let url = self.endpoint(address_name);
        let response = self
            .with_session(self.client.get(&url))?
            .send()
            .await
            .map_err(request_failed(address_name))?;
        let response = read_success(response, address_name).await?;
        decode(response).await
    }
}
