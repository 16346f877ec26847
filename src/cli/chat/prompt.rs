use rustyline::{Config, Editor, Result};

use super::personality::Personality;

pub fn generate_prompt(personality: Option<Personality>, sidebar_visible: bool) -> String {
    if sidebar_visible {
        return "(pick a sage) > ".to_string();
    }
    match personality {
        Some(p) => format!("{} > ", p.icon()),
        None => "> ".to_string(),
    }
}

pub fn header_title(personality: Option<Personality>) -> &'static str {
    match personality {
        Some(_) => "Stoned Sage",
        None => "Select Your Sage",
    }
}

/// Cuts `input` down to `max_chars` characters. The flag is set when something was dropped.
pub fn clamp_draft(input: &str, max_chars: usize) -> (String, bool) {
    match input.char_indices().nth(max_chars) {
        Some((cut, _)) => (input[..cut].to_string(), true),
        None => (input.to_string(), false),
    }
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .build();
    Editor::with_config(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_shows_persona_icon() {
        assert_eq!(generate_prompt(None, false), "> ");
        assert_eq!(generate_prompt(Some(Personality::Mac), false), "🌿 > ");
        assert_eq!(generate_prompt(Some(Personality::Mac), true), "(pick a sage) > ");
    }

    #[test]
    fn header_depends_on_selection() {
        assert_eq!(header_title(None), "Select Your Sage");
        assert_eq!(header_title(Some(Personality::Lawyer)), "Stoned Sage");
    }

    #[test]
    fn clamp_counts_characters_not_bytes() {
        let long = "é".repeat(501);
        let (clamped, truncated) = clamp_draft(&long, 500);
        assert!(truncated);
        assert_eq!(clamped.chars().count(), 500);

        let (same, truncated) = clamp_draft("short", 500);
        assert!(!truncated);
        assert_eq!(same, "short");

        let exact = "a".repeat(500);
        assert_eq!(clamp_draft(&exact, 500), (exact.clone(), false));
    }
}
