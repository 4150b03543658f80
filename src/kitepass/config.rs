use crate::error::{KiteError, Result};
use std::env;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.gokite.ai";
pub const DEFAULT_AGENT_NAME: &str = "AgentPayGuard";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub service_id: Option<String>,
    pub payload_json: Option<String>,
    pub verbose: bool,
    pub api_base: Url,
    pub agent_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("KITE_API_KEY")
            .filter(|value| !value.trim().is_empty())
            .ok_or(KiteError::MissingEnv("KITE_API_KEY"))?;
        let service_id = trimmed(lookup("KITE_SERVICE_ID"));
        let payload_json = trimmed(lookup("KITE_PAYLOAD_JSON"));
        let verbose = lookup("KITE_VERBOSE").is_some_and(|value| is_truthy(&value));

        let raw_base = trimmed(lookup("KITE_API_BASE")).unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let mut api_base = Url::parse(&raw_base)
            .map_err(|err| KiteError::InvalidConfig(format!("KITE_API_BASE '{raw_base}' is not a valid URL: {err}")))?;
        if !api_base.path().ends_with('/') {
            let path = format!("{}/", api_base.path());
            api_base.set_path(&path);
        }

        let agent_name =
            trimmed(lookup("KITE_AGENT_NAME")).unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string());

        Ok(Self {
            api_key,
            service_id,
            payload_json,
            verbose,
            api_base,
            agent_name,
        })
    }

    /// Key prefix safe to show in logs.
    pub fn masked_api_key(&self) -> String {
        if self.api_key.chars().count() > 20 {
            let prefix: String = self.api_key.chars().take(20).collect();
            format!("{prefix}...")
        } else {
            "<too-short>".to_string()
        }
    }
}

/// Only the exact spellings `1`, `true` and `TRUE` switch verbose mode on.
pub fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE")
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Hydrates the process environment from `.env` unless `KITE_SKIP_DOTENV` is set.
/// Variables already present in the environment are left untouched.
pub fn load_dotenv() -> Result<()> {
    if env::var_os("KITE_SKIP_DOTENV").is_some() {
        return Ok(());
    }
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(KiteError::InvalidConfig(format!("failed to load .env: {err}"))),
    }
}
