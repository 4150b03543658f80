use crate::client::ServiceClient;
use crate::config::Config;
use crate::error::{KiteError, Result};
use serde_json::Value;
use std::io::Write;
use tracing::{debug, info};

/// How far a run got before returning successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NoServiceId,
    InfoOnly,
    Called,
}

/// One pass of the demo: optional metadata fetch, then optional service call.
pub async fn run<C, W>(config: &Config, client: &C, out: &mut W) -> Result<Outcome>
where
    C: ServiceClient + ?Sized,
    W: Write,
{
    let Some(service_id) = config.service_id.as_deref() else {
        writeln!(
            out,
            "KITE_SERVICE_ID not set: skipping the service call, the KitePass API key initialized successfully."
        )?;
        writeln!(
            out,
            "Hint: copy a service ID from https://app.gokite.ai/, set KITE_SERVICE_ID and run again."
        )?;
        return Ok(Outcome::NoServiceId);
    };

    writeln!(out, "--- KitePass identity demo (Rust) ---")?;
    writeln!(out, "service_id: {service_id}")?;

    info!(service_id, "fetching service info");
    let service_info = client.get_service_info(service_id).await?;
    writeln!(out, "\n[service_info]\n")?;
    writeln!(out, "{service_info:#}")?;

    let Some(payload_json) = config.payload_json.as_deref() else {
        writeln!(out, "\nKITE_PAYLOAD_JSON not set: no call will be made.")?;
        writeln!(
            out,
            "Hint: set KITE_PAYLOAD_JSON='{{\"key\":\"value\"}}' and run again to trigger one call_service."
        )?;
        return Ok(Outcome::InfoOnly);
    };

    let payload: Value = serde_json::from_str(payload_json).map_err(KiteError::Payload)?;
    debug!(service_id, "payload parsed");

    info!(service_id, "calling service");
    let response = client.call_service(service_id, &payload).await?;
    writeln!(out, "\n[call_service response]\n")?;
    writeln!(out, "{response:#}")?;

    Ok(Outcome::Called)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Info(String),
        Invoke(String, Value),
    }

    struct RecordingClient {
        calls: Mutex<Vec<Call>>,
        fail_info: bool,
    }

    impl RecordingClient {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_info: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_info: true,
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ServiceClient for RecordingClient {
        async fn get_service_info(&self, service_id: &str) -> Result<Value> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Info(service_id.to_string()));
            if self.fail_info {
                return Err(KiteError::Api {
                    status: StatusCode::UNAUTHORIZED,
                    body: "bad key".to_string(),
                });
            }
            Ok(json!({"id": service_id, "name": "Weather"}))
        }

        async fn call_service(&self, service_id: &str, payload: &Value) -> Result<Value> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Invoke(service_id.to_string(), payload.clone()));
            Ok(json!({"status": "ok"}))
        }
    }

    fn config(service_id: Option<&str>, payload: Option<&str>) -> Config {
        let service_id = service_id.map(str::to_string);
        let payload = payload.map(str::to_string);
        Config::from_lookup(|key| match key {
            "KITE_API_KEY" => Some("api_key_test".to_string()),
            "KITE_SERVICE_ID" => service_id.clone(),
            "KITE_PAYLOAD_JSON" => payload.clone(),
            _ => None,
        })
        .unwrap()
    }

    async fn run_to_string(config: &Config, client: &RecordingClient) -> (Result<Outcome>, String) {
        let mut out = Vec::new();
        let outcome = run(config, client, &mut out).await;
        (outcome, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_without_service_id_makes_no_calls() {
        let client = RecordingClient::new();
        let (outcome, printed) = run_to_string(&config(None, Some("{}")), &client).await;

        assert_eq!(outcome.unwrap(), Outcome::NoServiceId);
        assert!(client.calls().is_empty());
        assert!(printed.contains("KITE_SERVICE_ID not set"));
        assert!(printed.contains("https://app.gokite.ai/"));
    }

    #[tokio::test]
    async fn test_without_payload_prints_info_once() {
        let client = RecordingClient::new();
        let (outcome, printed) = run_to_string(&config(Some("svc-1"), None), &client).await;

        assert_eq!(outcome.unwrap(), Outcome::InfoOnly);
        assert_eq!(client.calls(), vec![Call::Info("svc-1".to_string())]);
        assert_eq!(printed.matches("[service_info]").count(), 1);
        assert_eq!(printed.matches("\"Weather\"").count(), 1);
        assert!(printed.contains("service_id: svc-1"));
        assert!(printed.contains("KITE_PAYLOAD_JSON not set"));
        assert!(!printed.contains("[call_service response]"));
    }

    #[tokio::test]
    async fn test_with_payload_fetches_info_then_calls() {
        let client = RecordingClient::new();
        let (outcome, printed) =
            run_to_string(&config(Some("svc-1"), Some(r#"{"key":"value"}"#)), &client).await;

        assert_eq!(outcome.unwrap(), Outcome::Called);
        assert_eq!(
            client.calls(),
            vec![
                Call::Info("svc-1".to_string()),
                Call::Invoke("svc-1".to_string(), json!({"key": "value"})),
            ]
        );
        let info_at = printed.find("[service_info]").unwrap();
        let response_at = printed.find("[call_service response]").unwrap();
        assert!(info_at < response_at);
        assert!(printed.contains("\"status\": \"ok\""));
    }

    #[tokio::test]
    async fn test_invalid_payload_stops_before_call() {
        let client = RecordingClient::new();
        let (outcome, printed) =
            run_to_string(&config(Some("svc-1"), Some("not-json")), &client).await;

        assert!(matches!(outcome, Err(KiteError::Payload(_))));
        assert_eq!(client.calls(), vec![Call::Info("svc-1".to_string())]);
        assert!(printed.contains("[service_info]"));
        assert!(!printed.contains("[call_service response]"));
    }

    #[tokio::test]
    async fn test_scalar_payload_is_forwarded() {
        let client = RecordingClient::new();
        let (outcome, _) = run_to_string(&config(Some("svc-1"), Some("42")), &client).await;

        assert_eq!(outcome.unwrap(), Outcome::Called);
        assert_eq!(client.calls()[1], Call::Invoke("svc-1".to_string(), json!(42)));
    }

    #[tokio::test]
    async fn test_client_error_propagates() {
        let client = RecordingClient::failing();
        let (outcome, printed) =
            run_to_string(&config(Some("svc-1"), Some(r#"{"key":"value"}"#)), &client).await;

        assert!(matches!(outcome, Err(KiteError::Api { .. })));
        assert_eq!(client.calls().len(), 1);
        assert!(!printed.contains("[service_info]"));
    }
}
