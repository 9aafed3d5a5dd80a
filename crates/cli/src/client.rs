//! HTTP client for The Word server.

use anyhow::{Context, Result, anyhow};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use word_core::RoundNumber;
use word_server::api::{
    CreateRequest, ErrorBody, NonceResponse, RoundReceipt, RoundSummary, RoundView, ShoutRequest,
    WhisperRequest,
};

use crate::settings::{Credentials, Wallet};

pub struct ApiClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Fetch a one-time nonce to end a signed message with.
    pub async fn nonce(&self) -> Result<String> {
        let request = self.http_client.get(self.url("/auth/nonce"));
        let response: NonceResponse = self.send(request, "nonce").await?;
        Ok(response.nonce)
    }

    /// Sign `action` over a fresh nonce when a wallet is configured.
    pub async fn credentials(
        &self,
        wallet: Option<&Wallet>,
        action: &str,
    ) -> Result<Option<Credentials>> {
        let Some(wallet) = wallet else {
            return Ok(None);
        };
        let nonce = self.nonce().await?;
        wallet.sign(format!("{action}:{nonce}")).map(Some)
    }

    pub async fn get_round(&self, round: RoundNumber) -> Result<RoundView> {
        let request = self.http_client.get(self.url(&format!("/round/{round}")));
        self.send(request, "get round").await
    }

    /// List rounds; signed callers get their whisper and shout flags.
    pub async fn list_rounds(&self, caller: Option<&Credentials>) -> Result<Vec<RoundSummary>> {
        let mut request = self.http_client.get(self.url("/rounds"));
        if let Some(credentials) = caller {
            request = request.query(&[
                ("address", credentials.address.as_str()),
                ("signature", credentials.signature.as_str()),
                ("message", credentials.message.as_str()),
            ]);
        }
        self.send(request, "list rounds").await
    }

    pub async fn create(&self, body: &CreateRequest) -> Result<RoundReceipt> {
        let request = self.http_client.post(self.url("/create")).json(body);
        self.send(request, "create").await
    }

    pub async fn whisper(&self, body: &WhisperRequest) -> Result<()> {
        let request = self.http_client.post(self.url("/whisper")).json(body);
        let _: serde_json::Value = self.send(request, "whisper").await?;
        Ok(())
    }

    pub async fn shout(&self, body: &ShoutRequest) -> Result<RoundReceipt> {
        let request = self.http_client.post(self.url("/shout")).json(body);
        self.send(request, "shout").await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, action: &str) -> Result<T> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.base_url))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .with_context(|| format!("Failed to read {action} response body"))?;

        tracing::debug!(%status, "{action} response: {response_text}");

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorBody>(&response_text) {
                Ok(body) => anyhow!("{action} failed ({status}): {}: {}", body.error, body.message),
                Err(_) => anyhow!("{action} failed ({status}): {response_text}"),
            });
        }

        serde_json::from_str(&response_text).with_context(|| {
            format!("Failed to parse {action} response. Raw response: {response_text}")
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use runtime::{EngineHandle, InMemoryRoundRepository, ProofGateway, RoundService};
    use word_core::{Commitment, ProtocolConfig, encode_phrase};
    use word_server::auth::{InMemorySessionStore, NonceRegistry, resolver_for};
    use word_server::{AppState, router};
    use zk::{ProofEngine, StubEngine};

    use super::*;
    use crate::settings::Wallet;

    const HARDHAT_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    async fn serve() -> ApiClient {
        let protocol = ProtocolConfig {
            username_binding: false,
            ..ProtocolConfig::default()
        };
        let engine: Arc<dyn ProofEngine> = Arc::new(StubEngine::new(false));
        let service = RoundService::builder()
            .protocol(protocol)
            .repository(Arc::new(InMemoryRoundRepository::new()))
            .gateway(ProofGateway::new(
                EngineHandle::ready(engine),
                std::time::Duration::from_secs(5),
                false,
            ))
            .build()
            .unwrap();
        let nonces = Arc::new(NonceRegistry::default());
        let identity = resolver_for(
            protocol.identity_scheme,
            Arc::new(InMemorySessionStore::new()),
            nonces.clone(),
        );
        let app = router(AppState::new(service, identity, nonces));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        ApiClient::new(&format!("http://{address}/"))
    }

    fn wallet() -> Wallet {
        Wallet::new(word_server::auth::wallet::signing_key_from_hex(HARDHAT_KEY).unwrap())
    }

    fn prove(phrase: &str) -> (zk::ProofData, Commitment) {
        let elements = encode_phrase(phrase).unwrap();
        StubEngine::new(false).prove(&elements, None).unwrap()
    }

    #[tokio::test]
    async fn full_round_over_http() {
        let client = serve().await;
        let wallet = wallet();

        let (proof, commitment) = prove("hunter2");
        let receipt = client
            .create(&CreateRequest {
                commitment,
                username: None,
                proof: proof.clone(),
                hint: "a classic".to_string(),
                prize: Default::default(),
                address: None,
                signature: None,
                message: None,
            })
            .await
            .unwrap();
        assert_eq!(receipt.round, RoundNumber(1));

        let credentials = client
            .credentials(Some(&wallet), "the-word:whisper:1")
            .await
            .unwrap()
            .unwrap();
        client
            .whisper(&WhisperRequest {
                round: receipt.round,
                proof,
                username: None,
                address: Some(credentials.address.clone()),
                signature: Some(credentials.signature.clone()),
                message: Some(credentials.message.clone()),
            })
            .await
            .unwrap();

        // A used nonce no longer identifies the caller.
        let listed = client.list_rounds(Some(&credentials)).await.unwrap();
        assert_eq!(listed[0].whispered, None);

        let caller = client
            .credentials(Some(&wallet), "the-word:rounds")
            .await
            .unwrap();
        let listed = client.list_rounds(caller.as_ref()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].whispered, Some(true));

        let credentials = client
            .credentials(Some(&wallet), "the-word:shout:1")
            .await
            .unwrap()
            .unwrap();
        client
            .shout(&ShoutRequest {
                round: receipt.round,
                secret: "hunter2".to_string(),
                address: Some(credentials.address),
                signature: Some(credentials.signature),
                message: Some(credentials.message),
            })
            .await
            .unwrap();

        let round = client.get_round(receipt.round).await.unwrap();
        assert!(!round.active);
        assert_eq!(round.secret.as_deref(), Some("hunter2"));
    }

    #[tokio::test]
    async fn server_errors_carry_the_reason() {
        let client = serve().await;
        let err = client.get_round(RoundNumber(42)).await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("404"), "{text}");
        assert!(text.contains("RoundNotFound"), "{text}");
    }

    #[tokio::test]
    async fn unreachable_server_is_reported() {
        let client = ApiClient::new("http://127.0.0.1:1");
        let err = client.list_rounds(None).await.unwrap_err();
        assert!(err.to_string().contains("Failed to reach"));
    }
}
