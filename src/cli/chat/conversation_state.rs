use std::fmt;
use std::ops::{Deref, DerefMut};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::personality::Personality;

/// Who wrote a message. Assistant messages are labelled "Sage" on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn label(self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "Sage",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: String,
    text: String,
    sender: Sender,
}

impl Message {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }
}

/// Everything the chat screen shows, plus the flag that keeps requests from overlapping.
///
/// Messages are append-only; the only way to drop them is [`ConversationState::reset`],
/// which [`ConversationState::select_personality`] also performs.
#[derive(Debug, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
    draft_text: String,
    sidebar_visible: bool,
    selected_personality: Option<Personality>,
    extracted_context: String,
    loading: bool,
    next_seq: u64,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn draft_text(&self) -> &str {
        &self.draft_text
    }

    pub fn set_draft_text(&mut self, text: impl Into<String>) {
        self.draft_text = text.into();
    }

    pub fn is_sidebar_visible(&self) -> bool {
        self.sidebar_visible
    }

    pub fn set_sidebar_visible(&mut self, visible: bool) {
        self.sidebar_visible = visible;
    }

    pub fn selected_personality(&self) -> Option<Personality> {
        self.selected_personality
    }

    /// Switches persona. Always wipes the transcript, even when `personality` is already
    /// selected, then seeds the persona's greeting.
    pub fn select_personality(&mut self, personality: Personality) -> &Message {
        self.reset();
        self.selected_personality = Some(personality);
        tracing::info!("Selected personality: {}", personality);
        self.append_message(personality.greeting(), Sender::Assistant)
    }

    pub fn append_message(&mut self, text: impl Into<String>, sender: Sender) -> &Message {
        let id = format!("{}-{}", Utc::now().timestamp_millis(), self.next_seq);
        self.next_seq += 1;

        self.messages.push(Message {
            id,
            text: text.into(),
            sender,
        });
        &self.messages[self.messages.len() - 1]
    }

    /// The uploaded document context, or `None` when nothing is attached.
    pub fn extracted_context(&self) -> Option<&str> {
        if self.extracted_context.is_empty() {
            None
        } else {
            Some(&self.extracted_context)
        }
    }

    pub fn set_extracted_context(&mut self, text: impl Into<String>) {
        self.extracted_context = text.into();
    }

    /// Clears messages, draft and context. Personality and sidebar are left alone.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.draft_text.clear();
        self.extracted_context.clear();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Marks a request as in flight. Returns `None` if one already is.
    ///
    /// The flag is cleared when the returned guard drops, including when the future holding
    /// it is abandoned at an await point.
    pub fn try_begin_request(&mut self) -> Option<RequestGuard<'_>> {
        if self.loading {
            return None;
        }
        self.loading = true;
        Some(RequestGuard { state: self })
    }
}

/// Exclusive access to the state for the duration of one request.
pub struct RequestGuard<'a> {
    state: &'a mut ConversationState,
}

impl Deref for RequestGuard<'_> {
    type Target = ConversationState;

    fn deref(&self) -> &ConversationState {
        self.state
    }
}

impl DerefMut for RequestGuard<'_> {
    fn deref_mut(&mut self) -> &mut ConversationState {
        self.state
    }
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        self.state.loading = false;
    }
}
