use crate::{
    http_client::{AuthorizedClient, handle_http_response, parse_json_body},
    storage::LocalStorage,
};
use anyhow::{Context, Result};
use log::{error, info};
#[cfg(feature = "mock")]
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use trait_variant::make;

#[derive(Clone, Deserialize, PartialEq, Serialize)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

impl Debug for WifiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ScanResponse {
    #[serde(default)]
    devices: Vec<Value>,
}

/// Remote network configuration service
///
/// Status style reads never fail: they log and return an empty result so the
/// caller can simply ask again. Mutating calls return their error and are
/// never retried here since they are not idempotent on the backend.
#[make(Send)]
#[cfg_attr(feature = "mock", automock)]
pub trait BackendClient {
    async fn check_network(&self) -> Option<Value>;
    async fn connect_to_wifi(&self, credentials: WifiCredentials) -> Result<Value>;
    async fn scan_for_devices(&self) -> Vec<Value>;
    async fn save_network_config(&self, config: Value) -> Result<Value>;
}

#[derive(Clone, Debug)]
pub struct BackendGateway<S>
where
    S: LocalStorage,
{
    client: AuthorizedClient<S>,
    base_url: String,
}

impl<S> BackendGateway<S>
where
    S: LocalStorage,
{
    const NETWORK_STATUS_ENDPOINT: &str = "/network/status";
    const NETWORK_WIFI_ENDPOINT: &str = "/network/wifi";
    const NETWORK_SCAN_ENDPOINT: &str = "/network/scan";
    const NETWORK_CONFIG_ENDPOINT: &str = "/network/config";

    pub fn new(base_url: &str, storage: S) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("failed to create backend HTTP client")?;

        Ok(Self {
            client: AuthorizedClient::new(client, storage),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn build_url(&self, path: &str) -> String {
        let normalized_path = path.trim_start_matches('/');
        format!("{}/{normalized_path}", self.base_url)
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let url = self.build_url(path);
        info!("GET {url}");

        let res = self
            .client
            .send(self.client.get(&url))
            .await
            .context(format!("failed to send GET request to {url}"))?;

        parse_json_body(&handle_http_response(res, &format!("GET {url}")).await?)
    }

    /// POST a JSON body, the body itself is not logged since it may carry credentials
    async fn post_json(&self, path: &str, body: impl Serialize) -> Result<Value> {
        let url = self.build_url(path);
        info!("POST {url}");

        let res = self
            .client
            .send(self.client.post(&url).json(&body))
            .await
            .context(format!("failed to send POST request to {url}"))?;

        parse_json_body(&handle_http_response(res, &format!("POST {url}")).await?)
    }
}

impl<S> BackendClient for BackendGateway<S>
where
    S: LocalStorage + Send + Sync,
{
    async fn check_network(&self) -> Option<Value> {
        info!("checking network connection");

        match self.get(Self::NETWORK_STATUS_ENDPOINT).await {
            Ok(status) => Some(status),
            Err(e) => {
                error!("network check failed: {e:#}");
                None
            }
        }
    }

    async fn connect_to_wifi(&self, credentials: WifiCredentials) -> Result<Value> {
        self.post_json(Self::NETWORK_WIFI_ENDPOINT, credentials)
            .await
            .inspect_err(|e| error!("wifi connection failed: {e:#}"))
    }

    async fn scan_for_devices(&self) -> Vec<Value> {
        let scan = self
            .get(Self::NETWORK_SCAN_ENDPOINT)
            .await
            .and_then(|body| {
                serde_json::from_value::<ScanResponse>(body).context("failed to parse scan result")
            });

        match scan {
            Ok(scan) => scan.devices,
            Err(e) => {
                error!("device scan failed: {e:#}");
                vec![]
            }
        }
    }

    async fn save_network_config(&self, config: Value) -> Result<Value> {
        self.post_json(Self::NETWORK_CONFIG_ENDPOINT, config)
            .await
            .inspect_err(|e| error!("failed to save network config: {e:#}"))
    }
}
