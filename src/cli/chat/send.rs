use tracing::{error, info};

use super::conversation_state::{ConversationState, Sender};
use crate::sage_client::{ApiMessage, ChatRequest, Role, SageBackend};

pub const CHAT_ERROR_TEXT: &str = "❌ An error occurred. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The Sage answered and the reply was appended.
    Replied,
    /// The request failed; the error bubble was appended.
    Failed,
    /// Nothing to send.
    EmptyDraft,
    /// Another request is still in flight. Nothing was touched.
    Busy,
}

/// Builds the outbound payload from the current transcript. Each message is sent once.
pub fn build_chat_request(state: &ConversationState) -> ChatRequest {
    let messages = state
        .messages()
        .iter()
        .map(|m| ApiMessage {
            role: match m.sender() {
                Sender::User => Role::User,
                Sender::Assistant => Role::Assistant,
            },
            content: m.text().to_string(),
        })
        .collect();

    ChatRequest {
        messages,
        context: state.extracted_context().map(str::to_string),
    }
}

/// Sends the current draft to the selected Sage.
///
/// The user's message is appended and the draft cleared before the request goes out. Errors
/// never reach the caller: they end up in the transcript as [`CHAT_ERROR_TEXT`]. The loading
/// flag is held by a guard for the whole exchange, so dropping this future also releases it.
pub async fn send_draft<B>(state: &mut ConversationState, backend: &B) -> SendOutcome
where
    B: SageBackend + ?Sized,
{
    let text = state.draft_text().trim().to_string();
    if text.is_empty() {
        return SendOutcome::EmptyDraft;
    }

    let Some(mut state) = state.try_begin_request() else {
        info!("Ignoring send while a request is in flight");
        return SendOutcome::Busy;
    };

    state.append_message(text, Sender::User);
    state.set_draft_text("");

    let request = build_chat_request(&state);
    let personality = state.selected_personality();
    match backend.chat(personality, &request).await {
        Ok(reply) => {
            state.append_message(reply, Sender::Assistant);
            SendOutcome::Replied
        }
        Err(e) => {
            error!("Chat error: {}", e);
            state.append_message(CHAT_ERROR_TEXT, Sender::Assistant);
            SendOutcome::Failed
        }
    }
}
