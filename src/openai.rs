pub mod chat;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct Client {
    client: reqwest::Client,
    base_url: String,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("request: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("request: {0} ({1})")]
    ReqwestWithBody(reqwest::Error, String),

    #[error("serde: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("api key is not a valid header value")]
    InvalidApiKey,
}

impl Error {
    /// Whether the same request might succeed if sent again: connection
    /// failures, timeouts, rate limiting and server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Reqwest(e) | Error::ReqwestWithBody(e, _) => match e.status() {
                Some(status) => status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS,
                None => !e.is_builder() && !e.is_decode(),
            },
            Error::SerdeJson(_) | Error::InvalidApiKey => false,
        }
    }
}

impl Client {
    pub fn new(api_key: impl AsRef<str>, base_url: impl Into<String>, timeout: std::time::Duration) -> Result<Self, Error> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::CONTENT_TYPE, reqwest::header::HeaderValue::from_static("application/json"));
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", api_key.as_ref()).parse().map_err(|_| Error::InvalidApiKey)?,
        );

        let base_url: String = base_url.into();
        Ok(Self {
            client: reqwest::ClientBuilder::new().default_headers(headers).timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn do_request<Req, Resp>(&self, path: &str, req: &Req) -> Result<Resp, Error>
    where
        Req: serde::Serialize,
        Resp: serde::de::DeserializeOwned,
    {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(req)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        if let Err(e) = resp.error_for_status_ref() {
            let body = resp.text().await.map_err(|e| e.without_url())?;
            return Err(Error::ReqwestWithBody(e.without_url(), body));
        }

        let body = resp.bytes().await.map_err(|e| e.without_url())?;
        Ok(serde_json::from_slice::<Resp>(&body)?)
    }

    pub async fn create_chat_completion(&self, req: &chat::completions::CreateRequest) -> Result<chat::completions::CreateResponse, Error> {
        self.do_request("/chat/completions", req).await
    }
}

/// A local HTTP server answering every request with the same canned
/// response, one request per connection. Returns the base URL and a counter
/// of requests served. With `status` of `None` the server reads the request
/// and never answers.
#[cfg(test)]
pub(crate) async fn serve_canned(
    status: Option<&'static str>,
    body: &'static str,
) -> (String, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let counter = counter.clone();
            tokio::spawn(async move {
                let mut buf = vec![];
                let mut chunk = [0u8; 8192];
                loop {
                    let n = match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => n,
                    };
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                        let content_length = headers
                            .lines()
                            .find_map(|l| l.strip_prefix("content-length:"))
                            .and_then(|v| v.trim().parse::<usize>().ok())
                            .unwrap_or(0);
                        if buf.len() >= end + 4 + content_length {
                            break;
                        }
                    }
                }
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

                let status = match status {
                    Some(status) => status,
                    None => {
                        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                        return;
                    }
                };
                let resp = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(resp.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}/v1", addr), hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    fn client(base_url: &str) -> Client {
        Client::new("sk-proj-test", base_url, std::time::Duration::from_secs(5)).unwrap()
    }

    fn request() -> chat::completions::CreateRequest {
        chat::completions::CreateRequest::new("gpt-4o-mini".to_string(), vec![])
    }

    #[test]
    fn test_new_rejects_bad_api_key() {
        assert!(matches!(
            Client::new("sk-bad\nkey", DEFAULT_BASE_URL, std::time::Duration::from_secs(1)),
            Err(Error::InvalidApiKey)
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_error() {
        // Nothing listens on port 1.
        let err = client("http://127.0.0.1:1/v1/").create_chat_completion(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Reqwest(..)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_success_decodes_response() {
        let (url, hits) = serve_canned(
            Some("200 OK"),
            r#"{"id":"chatcmpl-9","model":"gpt-4o-mini","choices":[{"index":0,"message":{"role":"assistant","content":"Damaged - Minor: scratched door"},"finish_reason":"stop"}],"usage":{"prompt_tokens":10,"completion_tokens":6,"total_tokens":16}}"#,
        )
        .await;
        let resp = client(&url).create_chat_completion(&request()).await.unwrap();
        assert_eq!(resp.id, "chatcmpl-9");
        assert_eq!(resp.first_content(), Some("Damaged - Minor: scratched door"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_status_captures_body() {
        let (url, _) = serve_canned(
            Some("401 Unauthorized"),
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        )
        .await;
        let err = client(&url).create_chat_completion(&request()).await.unwrap_err();
        match &err {
            Error::ReqwestWithBody(e, body) => {
                assert_eq!(e.status(), Some(reqwest::StatusCode::UNAUTHORIZED));
                assert!(body.contains("Incorrect API key provided"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let (url, _) = serve_canned(Some("503 Service Unavailable"), r#"{"error":{"message":"overloaded"}}"#).await;
        let err = client(&url).create_chat_completion(&request()).await.unwrap_err();
        assert!(matches!(err, Error::ReqwestWithBody(..)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_rate_limit_is_transient() {
        let (url, _) = serve_canned(Some("429 Too Many Requests"), r#"{"error":{"message":"slow down"}}"#).await;
        let err = client(&url).create_chat_completion(&request()).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_garbage_body_is_serde_error() {
        let (url, _) = serve_canned(Some("200 OK"), "<html>bad gateway</html>").await;
        let err = client(&url).create_chat_completion(&request()).await.unwrap_err();
        assert!(matches!(err, Error::SerdeJson(..)));
        assert!(!err.is_transient());
    }
}
