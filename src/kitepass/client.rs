use crate::config::Config;
use crate::error::{KiteError, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Method, Response, Url};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};
use urlencoding::encode;

/// The two platform operations the demo flow depends on.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    async fn get_service_info(&self, service_id: &str) -> Result<Value>;

    async fn call_service(&self, service_id: &str, payload: &Value) -> Result<Value>;
}

/// HTTP client for the Kite platform API, authenticated with a KitePass API key.
///
/// Payment pre-authorization for `call_service` happens on the platform side;
/// this client only forwards the request.
pub struct KiteClient {
    http: Client,
    base_url: Url,
    verbose: bool,
}

impl KiteClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .user_agent(format!(
                "kitepass-demo/{} ({})",
                env!("CARGO_PKG_VERSION"),
                config.agent_name
            ))
            .default_headers(Self::default_headers(&config.api_key)?)
            .build()
            .map_err(|err| KiteError::InvalidConfig(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.api_base.clone(),
            verbose: config.verbose,
        })
    }

    fn default_headers(api_key: &str) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| KiteError::InvalidConfig("KITE_API_KEY is not a valid header value".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        Ok(headers)
    }

    fn service_url(&self, service_id: &str, suffix: &str) -> Result<Url> {
        // encode() leaves dots alone, and join() would resolve these as path steps
        if matches!(service_id, "" | "." | "..") {
            return Err(KiteError::InvalidConfig(format!(
                "'{service_id}' is not a usable service id"
            )));
        }
        self.base_url
            .join(&format!("v1/services/{}{}", encode(service_id), suffix))
            .map_err(|err| KiteError::InvalidConfig(format!("failed to construct service URL: {err}")))
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value> {
        trace!(%method, %url, "sending Kite API request");
        let started = Instant::now();

        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;

        self.log_exchange(&method, &url, &response, started.elapsed());
        decode_response(response).await
    }

    fn log_exchange(&self, method: &Method, url: &Url, response: &Response, elapsed: Duration) {
        let status = response.status();
        let elapsed_ms = elapsed.as_millis() as u64;
        if self.verbose {
            info!(%method, %url, %status, elapsed_ms, "Kite API call");
        } else {
            debug!(%method, %url, %status, elapsed_ms, "Kite API call");
        }
    }
}

async fn decode_response(response: Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(KiteError::Api { status, body });
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|err| KiteError::Decode(format!("{err} (body: {body})")))
}

#[async_trait]
impl ServiceClient for KiteClient {
    async fn get_service_info(&self, service_id: &str) -> Result<Value> {
        let url = self.service_url(service_id, "")?;
        self.send(Method::GET, url, None).await
    }

    async fn call_service(&self, service_id: &str, payload: &Value) -> Result<Value> {
        let url = self.service_url(service_id, "/call")?;
        self.send(Method::POST, url, Some(payload)).await
    }
}
