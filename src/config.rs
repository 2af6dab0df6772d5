use crate::gateway::RetryPolicy;
use crate::prompt::Parameters;

fn backend_default() -> String {
    "openai_chat".to_string()
}

fn backend_config_default() -> toml::Value {
    toml::Value::Table(toml::map::Map::new())
}

const fn retry_backoff_ms_default() -> u64 {
    500
}

#[derive(serde::Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "backend_default")]
    pub backend: String,
    #[serde(default = "backend_config_default")]
    pub backend_config: toml::Value,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "retry_backoff_ms_default")]
    pub retry_backoff_ms: u64,
}

impl Config {
    /// Reads the config file at `path`, tolerating its absence. `env_api_key`
    /// fills in `backend_config.api_key` when the file does not set one.
    pub fn load(path: &std::path::Path, env_api_key: Option<String>) -> Result<Self, anyhow::Error> {
        let raw = match std::fs::read(path) {
            Ok(raw) => String::from_utf8(raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                String::new()
            }
            Err(e) => return Err(anyhow::format_err!("read {}: {}", path.display(), e)),
        };
        Self::from_toml(&raw, env_api_key)
    }

    pub fn from_toml(raw: &str, env_api_key: Option<String>) -> Result<Self, anyhow::Error> {
        let mut config = toml::from_str::<Config>(raw)?;

        let table = match &mut config.backend_config {
            toml::Value::Table(table) => table,
            _ => return Err(anyhow::format_err!("backend_config must be a table")),
        };
        if let Some(key) = env_api_key {
            if !table.contains_key("api_key") {
                table.insert("api_key".to_string(), toml::Value::String(key));
            }
        }

        Ok(config)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.backend_config.get("api_key").and_then(|v| v.as_str())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: std::time::Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum ApiKeyStatus {
    Missing,
    UnexpectedPrefix,
    SurroundingWhitespace,
    Ok,
}

pub fn check_api_key(key: Option<&str>) -> ApiKeyStatus {
    match key {
        None | Some("") => ApiKeyStatus::Missing,
        Some(key) if !key.starts_with("sk-proj-") => ApiKeyStatus::UnexpectedPrefix,
        Some(key) if key.trim() != key => ApiKeyStatus::SurroundingWhitespace,
        Some(_) => ApiKeyStatus::Ok,
    }
}
