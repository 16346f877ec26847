use std::path::Path;

use tracing::{error, info};

use super::conversation_state::{ConversationState, Sender};
use crate::sage_client::{Document, SageBackend};

pub const UPLOAD_CONFIRMATION_TEXT: &str = "✅ Financial context uploaded. Let's continue.";
pub const UPLOAD_ERROR_TEXT: &str = "❌ Failed to upload document. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded,
    Failed,
    /// No file was picked. Nothing was touched.
    Cancelled,
    /// Another request is still in flight. Nothing was touched.
    Busy,
}

/// Uploads a picked document and keeps the extracted text as context for later turns.
///
/// `picked` is `None` when the user backed out of picking a file. A failed upload leaves any
/// earlier context in place and reports [`UPLOAD_ERROR_TEXT`] in the transcript. Like
/// [`send_draft`](super::send::send_draft), the loading flag is released when this future
/// finishes or is dropped.
pub async fn upload_document<B>(
    state: &mut ConversationState,
    backend: &B,
    picked: Option<&Path>,
) -> UploadOutcome
where
    B: SageBackend + ?Sized,
{
    let Some(path) = picked else {
        return UploadOutcome::Cancelled;
    };

    let Some(mut state) = state.try_begin_request() else {
        info!("Ignoring upload while a request is in flight");
        return UploadOutcome::Busy;
    };

    let personality = state.selected_personality();
    let uploaded = match Document::read(path).await {
        Ok(document) => backend.upload(personality, document).await.map_err(|e| {
            error!("Upload error: {}", e);
        }),
        Err(e) => {
            error!("Upload error: could not read {}: {}", path.display(), e);
            Err(())
        }
    };

    match uploaded {
        Ok(context) => {
            info!("Extracted {} bytes of context from {}", context.len(), path.display());
            state.set_extracted_context(context);
            state.append_message(UPLOAD_CONFIRMATION_TEXT, Sender::Assistant);
            UploadOutcome::Uploaded
        }
        Err(()) => {
            state.append_message(UPLOAD_ERROR_TEXT, Sender::Assistant);
            UploadOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::cli::chat::personality::Personality;
    use crate::cli::chat::test_support::{FakeBackend, HangingBackend};

    fn pdf() -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("statement")
            .suffix(".pdf")
            .tempfile()
            .unwrap();
        file.write_all(b"%PDF-1.4 fake").unwrap();
        file
    }

    #[tokio::test]
    async fn successful_upload_sets_context_and_confirms() {
        let backend = FakeBackend::replying("CTX");
        let mut state = ConversationState::new();
        state.select_personality(Personality::Littlefinger);
        let file = pdf();

        let outcome = upload_document(&mut state, &backend, Some(file.path())).await;

        assert_eq!(outcome, UploadOutcome::Uploaded);
        assert_eq!(state.extracted_context(), Some("CTX"));
        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[1].text(), UPLOAD_CONFIRMATION_TEXT);
        assert_eq!(state.messages()[1].sender(), Sender::Assistant);
        assert!(!state.is_loading());

        let uploads = backend.upload_calls();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, Some(Personality::Littlefinger));
        assert_eq!(uploads[0].1.bytes, b"%PDF-1.4 fake");
        assert!(uploads[0].1.file_name.starts_with("statement"));
        assert!(uploads[0].1.file_name.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn failed_upload_keeps_previous_context() {
        let backend = FakeBackend::failing();
        let mut state = ConversationState::new();
        state.set_extracted_context("old");
        let file = pdf();

        let outcome = upload_document(&mut state, &backend, Some(file.path())).await;

        assert_eq!(outcome, UploadOutcome::Failed);
        assert_eq!(state.extracted_context(), Some("old"));
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].text(), UPLOAD_ERROR_TEXT);
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn empty_response_is_a_failure() {
        let backend = FakeBackend::without_response();
        let mut state = ConversationState::new();
        let file = pdf();

        let outcome = upload_document(&mut state, &backend, Some(file.path())).await;

        assert_eq!(outcome, UploadOutcome::Failed);
        assert_eq!(state.extracted_context(), None);
        assert_eq!(state.messages().len(), 1);
    }

    #[tokio::test]
    async fn unreadable_file_is_a_failure_without_request() {
        let backend = FakeBackend::replying("CTX");
        let mut state = ConversationState::new();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.pdf");

        let outcome = upload_document(&mut state, &backend, Some(&missing)).await;

        assert_eq!(outcome, UploadOutcome::Failed);
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].text(), UPLOAD_ERROR_TEXT);
        assert!(backend.upload_calls().is_empty());
    }

    #[tokio::test]
    async fn cancellation_touches_nothing() {
        let backend = FakeBackend::replying("CTX");
        let mut state = ConversationState::new();
        state.select_personality(Personality::Mac);
        state.set_draft_text("draft");
        state.set_extracted_context("CTX");
        state.set_sidebar_visible(true);
        let before = state.messages().to_vec();

        let outcome = upload_document(&mut state, &backend, None).await;

        assert_eq!(outcome, UploadOutcome::Cancelled);
        assert_eq!(state.messages(), before.as_slice());
        assert_eq!(state.draft_text(), "draft");
        assert_eq!(state.extracted_context(), Some("CTX"));
        assert_eq!(state.selected_personality(), Some(Personality::Mac));
        assert!(state.is_sidebar_visible());
        assert!(!state.is_loading());
        assert!(backend.upload_calls().is_empty());
    }

    #[tokio::test]
    async fn upload_respects_in_flight_flag() {
        let backend = FakeBackend::replying("CTX");
        let mut state = ConversationState::new();
        let file = pdf();

        {
            let mut in_flight = state.try_begin_request().unwrap();
            let outcome = upload_document(&mut in_flight, &backend, Some(file.path())).await;
            assert_eq!(outcome, UploadOutcome::Busy);
            assert!(in_flight.messages().is_empty());
        }

        assert!(backend.upload_calls().is_empty());
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn abandoned_upload_releases_loading_flag() {
        let mut state = ConversationState::new();
        let file = pdf();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            upload_document(&mut state, &HangingBackend, Some(file.path())),
        )
        .await;

        assert!(abandoned.is_err());
        assert!(!state.is_loading());
        assert_eq!(state.extracted_context(), None);

        let backend = FakeBackend::replying("CTX");
        let outcome = upload_document(&mut state, &backend, Some(file.path())).await;
        assert_eq!(outcome, UploadOutcome::Uploaded);
        assert_eq!(state.extracted_context(), Some("CTX"));
    }
}
