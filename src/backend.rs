pub mod openai_chat;

use crate::openai::chat::completions::{CreateRequest, CreateResponse};

#[async_trait::async_trait]
pub trait Backend {
    async fn request(&self, req: &CreateRequest) -> Result<CreateResponse, anyhow::Error>;
    fn model(&self) -> &str;
    fn request_timeout(&self) -> std::time::Duration;
}

pub fn new_backend_from_config(typ: &str, config: toml::Value) -> Result<Box<dyn Backend + Send + Sync>, anyhow::Error> {
    Ok(match typ {
        "openai_chat" => {
            let config = config.try_into()?;
            Box::new(openai_chat::Backend::new(&config)?)
        }
        _ => {
            return Err(anyhow::format_err!("unknown backend type: {}", typ));
        }
    })
}
