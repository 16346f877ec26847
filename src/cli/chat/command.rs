use std::path::PathBuf;

use eyre::{Result, bail};

use super::personality::Personality;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    /// Wipe the transcript but keep the persona.
    Clear,
    Context,
    /// Open the persona sidebar, optionally filtered.
    Personas { query: String },
    Persona(Personality),
    /// `path` is `None` when the user gave no file, which cancels the upload.
    Upload { path: Option<PathBuf> },
    Ask { text: String },
}

impl Command {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if !trimmed.starts_with('/') {
            return Ok(Self::Ask {
                text: input.to_string(),
            });
        }

        let (name, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (trimmed, ""),
        };

        Ok(match name {
            "/help" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            "/clear" => Self::Clear,
            "/context" => Self::Context,
            "/personas" => Self::Personas {
                query: rest.to_string(),
            },
            "/persona" => {
                if rest.is_empty() {
                    bail!("Usage: /persona <key>");
                }
                Self::Persona(rest.parse()?)
            }
            "/upload" => Self::Upload {
                path: (!rest.is_empty()).then(|| PathBuf::from(rest)),
            },
            _ => bail!("Unknown command: {}. Type /help for the list.", name),
        })
    }
}
