use crate::backend::Backend;
use crate::image_input::{ImageInput, InputError};
use crate::openai::chat::completions::{CreateRequest, CreateResponse};
use crate::prompt;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("input: {0}")]
    Input(#[from] InputError),

    #[error("transport: {0:#}")]
    Transport(anyhow::Error),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl Error {
    /// Input errors and rejected requests fail the same way every time.
    /// Backend errors of unknown shape are assumed to be network failures.
    fn is_retryable(&self) -> bool {
        match self {
            Error::Input(_) => false,
            Error::Timeout(_) => true,
            Error::Transport(e) => e
                .downcast_ref::<crate::openai::Error>()
                .map_or(true, |e| e.is_transient()),
        }
    }
}

/// Outcome of a request the remote model answered.
#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
    Completed(String),
    /// The model answered but produced no choice with content.
    NoCompletion,
}

impl Classification {
    fn from_response(resp: &CreateResponse) -> Self {
        match resp.first_content() {
            Some(content) => Classification::Completed(content.to_string()),
            None => Classification::NoCompletion,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Classification::Completed(text) => text,
            Classification::NoCompletion => prompt::FALLBACK_TEXT,
        }
    }

    pub fn verdict(&self) -> Option<crate::verdict::Verdict> {
        match self {
            Classification::Completed(text) => Some(crate::verdict::Verdict::parse(text)),
            Classification::NoCompletion => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: std::time::Duration,
}

pub struct Gateway {
    backend: Box<dyn Backend + Send + Sync>,
    parameters: prompt::Parameters,
    retry: RetryPolicy,
}

impl Gateway {
    pub fn new(backend: Box<dyn Backend + Send + Sync>, parameters: prompt::Parameters, retry: RetryPolicy) -> Self {
        Self {
            backend,
            parameters,
            retry,
        }
    }

    pub async fn classify_path(&self, path: impl AsRef<std::path::Path>) -> Result<Classification, Error> {
        let image = ImageInput::from_path(path)?;
        self.classify(&image).await
    }

    pub async fn classify(&self, image: &ImageInput) -> Result<Classification, Error> {
        let req = prompt::build_request(self.backend.model(), &self.parameters, image);
        log::info!(
            "classifying {} byte {:?} image as {} with {}",
            image.bytes().len(),
            image.format(),
            image.media_type(),
            req.model
        );

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(&req).await {
                Ok(resp) => {
                    let classification = Classification::from_response(&resp);
                    if classification == Classification::NoCompletion {
                        log::warn!("response {} has no completion", resp.id);
                    }
                    log::debug!("classification: {:?}", classification);
                    return Ok(classification);
                }
                Err(e) if e.is_retryable() && attempt <= self.retry.max_retries => {
                    log::warn!("attempt {} failed, retrying: {}", attempt, e);
                    tokio::time::sleep(self.retry.backoff).await;
                }
                Err(e) => {
                    log::error!("attempt {} failed: {}", attempt, e);
                    return Err(e);
                }
            }
        }
    }

    async fn attempt(&self, req: &CreateRequest) -> Result<CreateResponse, Error> {
        let timeout = self.backend.request_timeout();
        tokio::time::timeout(timeout, self.backend.request(req))
            .await
            .map_err(|_| Error::Timeout(timeout))?
            .map_err(Error::Transport)
    }
}
