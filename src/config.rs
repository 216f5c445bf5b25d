use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LogLevel;

#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub anthropic_secret: Option<String>,
    pub anthropic_model: String,
    pub anthropic_base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub log_level: LogLevel,
    pub database_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anthropic_secret: None,
            anthropic_model: "claude-3-haiku-20240307".to_string(),
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 100,
            temperature: 0.9,
            request_timeout_secs: 10,
            log_level: LogLevel::INFO,
            database_path: "parallaxlive.db".to_string(),
        }
    }
}

impl Config {
    pub const CONFIG_PATH: &'static str = "parallaxlive.conf";

    /// Reads the config file, or returns defaults when it does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigFileError> {
        let path = path.as_ref();
        if path.exists() {
            Ok(toml::from_str(&fs::read_to_string(path)?)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Like [`Config::load`], but walks through first-run setup when the file is missing.
    pub fn load_or_setup<P: AsRef<Path>>(path: P) -> Result<Self, ConfigFileError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Self::initial_setup(path)
        }
    }

    fn initial_setup(path: &Path) -> Result<Self, ConfigFileError> {
        println!("Welcome to ParallaxLive! Let's set up your configuration.");
        println!("Chat messages can be written by Claude. Without a key, local fallback messages are used.");
        println!("You can create a key at https://console.anthropic.com/settings/keys");

        let anthropic_secret = Self::prompt_input("Enter your Anthropic API secret key (leave empty to stay offline): ")?;

        let config = Config {
            anthropic_secret: if anthropic_secret.is_empty() { None } else { Some(anthropic_secret) },
            ..Config::default()
        };

        config.save(path)?;
        println!("Configuration saved successfully!");

        Ok(config)
    }

    fn prompt_input(prompt: &str) -> Result<String, ConfigFileError> {
        print!("{}", prompt);
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigFileError> {
        let toml = toml::to_string(self)?;
        fs::write(path.as_ref(), toml)?;
        log::info!("Config saved to: {:?}", path.as_ref());
        Ok(())
    }

    pub fn is_anthropic_configured(&self) -> bool {
        self.anthropic_secret
            .as_deref()
            .is_some_and(|secret| !secret.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
