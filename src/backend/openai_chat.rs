use crate::openai::chat::completions::{CreateRequest, CreateResponse};

pub struct Backend {
    client: crate::openai::Client,
    model: String,
    request_timeout: std::time::Duration,
}

fn model_default() -> String {
    crate::prompt::DEFAULT_MODEL.to_string()
}

fn base_url_default() -> String {
    crate::openai::DEFAULT_BASE_URL.to_string()
}

const fn request_timeout_secs_default() -> u64 {
    30
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    api_key: String,
    #[serde(default = "model_default")]
    model: String,
    #[serde(default = "base_url_default")]
    base_url: String,
    #[serde(default = "request_timeout_secs_default")]
    request_timeout_secs: u64,
}

// Keeps the client timeout past the gateway's per-attempt timeout.
const CLIENT_TIMEOUT_MARGIN: std::time::Duration = std::time::Duration::from_secs(5);

impl Backend {
    pub fn new(config: &Config) -> Result<Self, anyhow::Error> {
        let request_timeout = std::time::Duration::from_secs(config.request_timeout_secs);
        Ok(Self {
            client: crate::openai::Client::new(&config.api_key, config.base_url.clone(), request_timeout + CLIENT_TIMEOUT_MARGIN)?,
            model: config.model.clone(),
            request_timeout,
        })
    }
}

#[async_trait::async_trait]
impl super::Backend for Backend {
    async fn request(&self, req: &CreateRequest) -> Result<CreateResponse, anyhow::Error> {
        let resp = self.client.create_chat_completion(req).await?;
        if let Some(usage) = resp.usage.as_ref() {
            log::info!(
                "openai response {} from {}: {} prompt + {} completion tokens, finish reason {:?}",
                resp.id,
                resp.model,
                usage.prompt_tokens,
                usage.completion_tokens,
                resp.choices.first().and_then(|c| c.finish_reason.as_ref())
            );
        }
        Ok(resp)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn request_timeout(&self) -> std::time::Duration {
        self.request_timeout
    }
}
