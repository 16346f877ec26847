use std::io;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::cli::chat::personality::Personality;

pub const DEFAULT_BACKEND_URL: &str = "https://financial-advisor-bot.deno.dev";

/// Multipart field the upload endpoint reads the document from.
pub const UPLOAD_FIELD_NAME: &str = "file";
pub const UPLOAD_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(
        "backend returned {status}{}",
        .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
    )]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error(
        "response field missing{}",
        .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
    )]
    MissingResponse { message: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: Role,
    pub content: String,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// What both endpoints answer with: `{ response }` on success, `{ error }` otherwise.
#[derive(Debug, Default, Deserialize)]
struct ApiReply {
    response: Option<String>,
    error: Option<String>,
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub async fn read(path: &Path) -> io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        Ok(Self { file_name, bytes })
    }
}

/// The two calls the chat screen makes. Both return the `response` field of the reply.
#[async_trait]
pub trait SageBackend: Send + Sync {
    async fn chat(
        &self,
        personality: Option<Personality>,
        request: &ChatRequest,
    ) -> Result<String, ClientError>;

    async fn upload(
        &self,
        personality: Option<Personality>,
        document: Document,
    ) -> Result<String, ClientError>;
}

pub struct SageClient {
    base_url: Url,
    client: reqwest::Client,
}

impl SageClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        // Join relative paths onto the base instead of replacing its last segment.
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url,
            client: builder.build()?,
        })
    }

    /// `<base>/<path>?personality=<key>`. With no persona selected the key is empty.
    pub fn endpoint(&self, path: &str, personality: Option<Personality>) -> Result<Url, ClientError> {
        let mut url = self.base_url.join(path)?;
        url.query_pairs_mut()
            .append_pair("personality", personality.map(Personality::key).unwrap_or(""));
        Ok(url)
    }

    async fn read_reply(response: reqwest::Response) -> Result<String, ClientError> {
        let status = response.status();
        let body = response.text().await?;

        debug!("Received response from Sage backend ({}): {}", status, body);

        if !status.is_success() {
            let reply: ApiReply = serde_json::from_str(&body).unwrap_or_default();
            error!("Sage backend request failed with status {}", status);
            return Err(ClientError::Status {
                status,
                message: reply.error,
            });
        }

        let reply: ApiReply = serde_json::from_str(&body)?;
        match reply.response {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(ClientError::MissingResponse {
                message: reply.error,
            }),
        }
    }
}

#[async_trait]
impl SageBackend for SageClient {
    async fn chat(
        &self,
        personality: Option<Personality>,
        request: &ChatRequest,
    ) -> Result<String, ClientError> {
        let url = self.endpoint("api/chat", personality)?;

        debug!(
            "Sending chat request to {}: {}",
            url,
            serde_json::to_string_pretty(request)?
        );

        let response = self.client.post(url).json(request).send().await?;
        Self::read_reply(response).await
    }

    async fn upload(
        &self,
        personality: Option<Personality>,
        document: Document,
    ) -> Result<String, ClientError> {
        let url = self.endpoint("api/upload", personality)?;

        debug!(
            "Uploading {} ({} bytes) to {}",
            document.file_name,
            document.bytes.len(),
            url
        );

        let part = Part::bytes(document.bytes)
            .file_name(document.file_name)
            .mime_str(UPLOAD_CONTENT_TYPE)?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        let response = self.client.post(url).multipart(form).send().await?;
        Self::read_reply(response).await
    }
}
