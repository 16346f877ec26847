use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cli::chat::personality::Personality;
use crate::sage_client::DEFAULT_BACKEND_URL;

pub const BACKEND_URL_ENV: &str = "SAGE_BACKEND_URL";
pub const PERSONALITY_ENV: &str = "SAGE_PERSONALITY";

/// Longest draft the input box accepts, in characters.
pub const DEFAULT_MAX_DRAFT_CHARS: usize = 500;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    /// Persona selected at startup, if any.
    pub personality: Option<Personality>,
    pub max_draft_chars: usize,
    /// Unset means the HTTP client's default.
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            personality: None,
            max_draft_chars: DEFAULT_MAX_DRAFT_CHARS,
            request_timeout_secs: None,
        }
    }
}

/// Values given on the command line. They win over the environment and the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub backend_url: Option<String>,
    pub personality: Option<Personality>,
}

impl Config {
    /// Defaults, then the config file, then the environment, then `overrides`.
    pub fn load(overrides: Overrides) -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply(overrides)?;
        Ok(config)
    }

    /// Reads `path`, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .wrap_err_with(|| format!("Invalid config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) -> Result<()> {
        self.apply_with(overrides, |name| env::var(name).ok())
    }

    /// An environment value is only looked at when the matching override is absent, so a bad
    /// `SAGE_PERSONALITY` cannot fail a run that names its persona on the command line.
    fn apply_with<F>(&mut self, overrides: Overrides, env_var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = overrides.backend_url.or_else(|| env_var(BACKEND_URL_ENV)) {
            self.backend_url = url;
        }

        match overrides.personality {
            Some(personality) => self.personality = Some(personality),
            None => {
                if let Some(key) = env_var(PERSONALITY_ENV) {
                    let personality = key
                        .parse::<Personality>()
                        .wrap_err_with(|| format!("Invalid {}", PERSONALITY_ENV))?;
                    self.personality = Some(personality);
                }
            }
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.backend_url)
            .map_err(|e| eyre!("Invalid backend url '{}': {}", self.backend_url, e))?;
        if self.max_draft_chars == 0 {
            return Err(eyre!("max_draft_chars must be greater than zero"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sage-chat").join("config.json"))
    }
}
