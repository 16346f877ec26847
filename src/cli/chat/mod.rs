pub mod command;
pub mod conversation_state;
pub mod input_source;
pub mod personality;
pub mod prompt;
pub mod send;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use color_print::cformat;
use command::Command;
use conversation_state::{ConversationState, Message, Sender};
use crossterm::{cursor, queue, terminal};
use eyre::Result;
use input_source::InputSource;
use personality::Personality;
use prompt::{clamp_draft, generate_prompt, header_title};
use send::{send_draft, SendOutcome};
use tracing::{debug, info};
use upload::{upload_document, UploadOutcome};

use crate::config::Config;
use crate::sage_client::SageBackend;

const WELCOME_TEXT: &str = "
Ask your Sage anything about money.

Things to try
• /personas             Browse the Sages
• /persona lawyer       Talk to the Lawyer
• /upload statement.pdf Share a document as context

/help         Show the help dialogue
/quit         Quit the application
";

const HELP_TEXT: &str = "
Sage Chat

/personas [query]   List the Sages, optionally filtered
/persona <key>      Pick a Sage (starts a fresh conversation)
/upload [path]      Upload a PDF as context for the conversation
/context            Show whether document context is attached
/clear              Clear the conversation, keeping the Sage
/help               Show this help dialogue
/quit               Quit the application

Anything else is sent to the Sage.
";

/// The sidebar: every persona matching `query`, with icon, key and description.
pub fn render_personalities(query: &str) -> String {
    let matches = Personality::search(query);
    if matches.is_empty() {
        return format!("No Sage matches '{}'.\n", query.trim());
    }

    let mut out = String::from("Select Your Sage\n\n");
    for p in matches {
        out.push_str(&format!("{} {} ({})\n", p.icon(), p.title(), p.key()));
        out.push_str(&format!("   {}\n", p.description()));
    }
    out
}

pub fn render_message(message: &Message, personality: Option<Personality>) -> String {
    match message.sender() {
        Sender::User => cformat!("<bold>{}:</bold> {}", message.sender(), message.text()),
        Sender::Assistant => {
            let icon = personality.map(Personality::icon).unwrap_or("🧙");
            cformat!("{} <green>{}:</green> {}", icon, message.sender(), message.text())
        }
    }
}

pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    upload: Option<PathBuf>,
    interactive: bool,
    input_source: Option<InputSource>,
    conversation_state: ConversationState,
    backend: Box<dyn SageBackend>,
    initial_personality: Option<Personality>,
    max_draft_chars: usize,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write>,
        backend: Box<dyn SageBackend>,
        config: &Config,
        input: Option<String>,
        interactive: bool,
    ) -> Self {
        Self {
            output,
            input,
            upload: None,
            interactive,
            input_source: None,
            conversation_state: ConversationState::new(),
            backend,
            initial_personality: config.personality,
            max_draft_chars: config.max_draft_chars,
        }
    }

    /// Upload this document before anything else runs.
    pub fn with_upload(mut self, path: Option<PathBuf>) -> Self {
        self.upload = path;
        self
    }

    pub fn with_input_source(mut self, input_source: InputSource) -> Self {
        self.input_source = Some(input_source);
        self
    }

    pub fn conversation_state(&self) -> &ConversationState {
        &self.conversation_state
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        if self.run_session().await? {
            Ok(ExitCode::SUCCESS)
        } else {
            Ok(ExitCode::FAILURE)
        }
    }

    /// Runs the session. Returns `false` if a one-shot upload or question failed.
    pub async fn run_session(&mut self) -> Result<bool> {
        if let Some(personality) = self.initial_personality {
            self.select_personality(personality)?;
        }

        if self.interactive {
            self.print_welcome()?;
        }

        let mut ok = true;

        if let Some(path) = self.upload.take() {
            ok &= self.upload(Some(path)).await? != UploadOutcome::Failed;
        }

        // Non-interactive mode (single question)
        if let Some(input) = self.input.take() {
            ok &= self.ask(&input).await? != SendOutcome::Failed;
            return Ok(ok);
        }

        if self.interactive {
            self.run_interactive().await?;
        }

        Ok(ok)
    }

    fn print_welcome(&mut self) -> Result<()> {
        // A persona picked at startup already printed its own header.
        if self.conversation_state.selected_personality().is_none() {
            writeln!(self.output, "{}", cformat!("<bold>{}</bold>", header_title(None)))?;
        }
        writeln!(self.output, "{}", WELCOME_TEXT)?;
        Ok(())
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut input_source = match self.input_source.take() {
            Some(source) => source,
            None => InputSource::new()?,
        };

        loop {
            let prompt_text = generate_prompt(
                self.conversation_state.selected_personality(),
                self.conversation_state.is_sidebar_visible(),
            );

            let Some(line) = input_source.read_line(&prompt_text)? else {
                break;
            };

            if line.trim().is_empty() {
                continue;
            }

            match Command::parse(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => {
                    if let Err(e) = self.handle_command(command).await {
                        writeln!(self.output, "{}", cformat!("<red>Error:</red> {}", e))?;
                    }
                }
                Err(e) => {
                    writeln!(self.output, "{}", cformat!("<red>Error:</red> {}", e))?;
                }
            }
        }

        info!("Chat session ended");
        Ok(())
    }

    async fn handle_command(&mut self, command: Command) -> Result<()> {
        debug!("Handling command: {:?}", command);

        // Anything but browsing closes the sidebar, like tapping outside it.
        if !matches!(command, Command::Personas { .. }) {
            self.conversation_state.set_sidebar_visible(false);
        }

        match command {
            Command::Help => {
                writeln!(self.output, "{}", HELP_TEXT)?;
            }
            Command::Quit => {}
            Command::Clear => {
                self.conversation_state.reset();
                writeln!(self.output, "Conversation cleared.")?;
            }
            Command::Context => match self.conversation_state.extracted_context() {
                Some(context) => writeln!(
                    self.output,
                    "Document context attached ({} characters).",
                    context.chars().count()
                )?,
                None => writeln!(self.output, "No document context attached.")?,
            },
            Command::Personas { query } => {
                self.conversation_state.set_sidebar_visible(true);
                write!(self.output, "{}", render_personalities(&query))?;
                writeln!(self.output, "Pick one with /persona <key>.")?;
            }
            Command::Persona(personality) => {
                self.select_personality(personality)?;
            }
            Command::Upload { path } => {
                self.upload(path).await?;
            }
            Command::Ask { text } => {
                self.ask(&text).await?;
            }
        }

        Ok(())
    }

    fn select_personality(&mut self, personality: Personality) -> Result<()> {
        self.conversation_state.select_personality(personality);
        writeln!(
            self.output,
            "{}",
            cformat!("<bold>{}</bold>", header_title(Some(personality)))
        )?;
        self.render_from(0)
    }

    async fn ask(&mut self, text: &str) -> Result<SendOutcome> {
        let (draft, truncated) = clamp_draft(text, self.max_draft_chars);
        if truncated {
            writeln!(
                self.output,
                "Message shortened to {} characters.",
                self.max_draft_chars
            )?;
        }
        self.conversation_state.set_draft_text(draft);

        let from = self.conversation_state.messages().len();
        self.show_thinking()?;
        let outcome = send_draft(&mut self.conversation_state, self.backend.as_ref()).await;
        self.clear_thinking()?;

        match outcome {
            SendOutcome::Busy => writeln!(self.output, "Still waiting on the Sage.")?,
            SendOutcome::EmptyDraft => {}
            SendOutcome::Replied | SendOutcome::Failed => self.render_from(from)?,
        }
        Ok(outcome)
    }

    async fn upload(&mut self, path: Option<PathBuf>) -> Result<UploadOutcome> {
        let from = self.conversation_state.messages().len();
        if path.is_some() {
            self.show_thinking()?;
        }
        let outcome = upload_document(
            &mut self.conversation_state,
            self.backend.as_ref(),
            path.as_deref(),
        )
        .await;
        self.clear_thinking()?;

        match outcome {
            UploadOutcome::Cancelled => writeln!(self.output, "Upload cancelled.")?,
            UploadOutcome::Busy => writeln!(self.output, "Still waiting on the Sage.")?,
            UploadOutcome::Uploaded | UploadOutcome::Failed => self.render_from(from)?,
        }
        Ok(outcome)
    }

    /// Prints the assistant messages from index `from` on. The user's own lines are
    /// already on screen.
    fn render_from(&mut self, from: usize) -> Result<()> {
        let personality = self.conversation_state.selected_personality();
        for message in &self.conversation_state.messages()[from..] {
            if message.sender() == Sender::Assistant {
                writeln!(self.output, "{}", render_message(message, personality))?;
            }
        }
        Ok(())
    }

    fn show_thinking(&mut self) -> Result<()> {
        if self.interactive {
            write!(self.output, "Sage is thinking...")?;
            self.output.flush()?;
        }
        Ok(())
    }

    fn clear_thinking(&mut self) -> Result<()> {
        if self.interactive {
            queue!(
                self.output,
                cursor::MoveToColumn(0),
                terminal::Clear(terminal::ClearType::CurrentLine)
            )?;
            self.output.flush()?;
        }
        Ok(())
    }
}
