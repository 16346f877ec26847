use eyre::Result;
use rustyline::error::ReadlineError;
use rustyline::Editor;

use super::prompt;

/// Where REPL lines come from: a readline editor, or a fixed script in tests.
pub struct InputSource(Inner);

enum Inner {
    Readline(Editor<()>),
    Mock { index: usize, lines: Vec<String> },
}

impl InputSource {
    pub fn new() -> Result<Self> {
        Ok(Self(Inner::Readline(prompt::rl()?)))
    }

    pub fn new_mock<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Inner::Mock {
            index: 0,
            lines: lines.into_iter().map(Into::into).collect(),
        })
    }

    /// `Ok(None)` means the user is done (EOF, Ctrl-C, or the script ran out).
    pub fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match &mut self.0 {
            Inner::Readline(rl) => match rl.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str());
                    }
                    Ok(Some(line))
                }
                Err(ReadlineError::Eof | ReadlineError::Interrupted) => Ok(None),
                Err(e) => Err(e.into()),
            },
            Inner::Mock { index, lines } => {
                let line = lines.get(*index).cloned();
                *index += 1;
                Ok(line)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_replays_lines_then_ends() {
        let mut input = InputSource::new_mock(["/help", "hello"]);
        assert_eq!(input.read_line("> ").unwrap().as_deref(), Some("/help"));
        assert_eq!(input.read_line("> ").unwrap().as_deref(), Some("hello"));
        assert_eq!(input.read_line("> ").unwrap(), None);
    }
}
