use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::personality::Personality;
use crate::sage_client::{ChatRequest, ClientError, Document, SageBackend};

enum Reply {
    Text(String),
    Status(StatusCode),
    Missing,
}

/// In-memory backend that answers every call the same way and records what it was sent.
pub(crate) struct FakeBackend {
    reply: Reply,
    chats: Mutex<Vec<(Option<Personality>, ChatRequest)>>,
    uploads: Mutex<Vec<(Option<Personality>, Document)>>,
}

impl FakeBackend {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            chats: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replying(text: &str) -> Self {
        Self::new(Reply::Text(text.to_string()))
    }

    pub(crate) fn failing() -> Self {
        Self::new(Reply::Status(StatusCode::SERVICE_UNAVAILABLE))
    }

    pub(crate) fn without_response() -> Self {
        Self::new(Reply::Missing)
    }

    pub(crate) fn chat_calls(&self) -> Vec<(Option<Personality>, ChatRequest)> {
        self.chats.lock().unwrap().clone()
    }

    pub(crate) fn upload_calls(&self) -> Vec<(Option<Personality>, Document)> {
        self.uploads.lock().unwrap().clone()
    }

    fn answer(&self) -> Result<String, ClientError> {
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Status(status) => Err(ClientError::Status {
                status: *status,
                message: Some("upstream down".to_string()),
            }),
            Reply::Missing => Err(ClientError::MissingResponse { message: None }),
        }
    }
}

#[async_trait]
impl SageBackend for FakeBackend {
    async fn chat(
        &self,
        personality: Option<Personality>,
        request: &ChatRequest,
    ) -> Result<String, ClientError> {
        self.chats
            .lock()
            .unwrap()
            .push((personality, request.clone()));
        self.answer()
    }

    async fn upload(
        &self,
        personality: Option<Personality>,
        document: Document,
    ) -> Result<String, ClientError> {
        self.uploads.lock().unwrap().push((personality, document));
        self.answer()
    }
}

/// Never answers. For exercising abandoned requests.
pub(crate) struct HangingBackend;

#[async_trait]
impl SageBackend for HangingBackend {
    async fn chat(
        &self,
        _personality: Option<Personality>,
        _request: &ChatRequest,
    ) -> Result<String, ClientError> {
        std::future::pending().await
    }

    async fn upload(
        &self,
        _personality: Option<Personality>,
        _document: Document,
    ) -> Result<String, ClientError> {
        std::future::pending().await
    }
}
