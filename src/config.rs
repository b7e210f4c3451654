//! Configuration and color scheme management for shellfolio.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.shellfolio/config.toml`
//! - Built-in color schemes (default, solarized, monokai, nord, etc.)
//! - The virtual file table served by `ls` and `cat`
//!
//! # Configuration File
//!
//! ```toml
//! prompt = "guest@shellfolio:~$ "
//!
//! # Color scheme: default, solarized-dark, monokai, nord,
//! #               dracula, gruvbox-dark, tokyo-night
//! color_scheme = "nord"
//!
//! # Keep at most this many history entries (unbounded if omitted)
//! history_limit = 500
//!
//! motd = ["Welcome!", "Type 'help' to get started."]
//!
//! [files]
//! "about.txt" = "I build things."
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prompt printed before the input line
    pub prompt: String,
    /// Color scheme name
    pub color_scheme: String,
    /// Maximum history entries
    pub history_limit: Option<usize>,
    /// Lines shown when the shell starts
    pub motd: Vec<String>,
    /// Virtual files: name -> contents
    pub files: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut files = BTreeMap::new();
        files.insert(
            "about.txt".to_string(),
            "Hi, I'm a software engineer who likes terminals, compilers and small tools."
                .to_string(),
        );
        files.insert(
            "projects.txt".to_string(),
            "shellfolio - this site, a shell in your browser tab.".to_string(),
        );
        files.insert(
            "contact.txt".to_string(),
            "mail: hello@example.com".to_string(),
        );

        Self {
            prompt: "guest@shellfolio:~$ ".to_string(),
            color_scheme: "default".to_string(),
            history_limit: None,
            motd: vec![
                "Welcome to shellfolio.".to_string(),
                "Type 'help' to list commands. Tab completes, Ctrl+C interrupts.".to_string(),
            ],
            files,
        }
    }
}

impl Config {
    /// Load configuration from `~/.shellfolio/config.toml`
    ///
    /// Falls back to defaults if the file is missing or invalid.
    pub fn load() -> Self {
        match Self::get_config_path() {
            Some(path) if path.exists() => Self::load_or_default(&path),
            _ => Self::default(),
        }
    }

    /// Load configuration from a specific file, falling back to defaults
    pub fn load_or_default(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        data_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get the color scheme
    pub fn get_color_scheme(&self) -> ColorScheme {
        ColorScheme::by_name(&self.color_scheme)
    }
}

/// Directory holding the config file and log
pub fn data_dir() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".shellfolio"))
}

/// Color definition (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert to crossterm Color
    pub fn to_crossterm(&self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// Color scheme definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub name: String,
    pub prompt: Color,
    pub input: Color,
    pub output: Color,
    /// Dimmed completion shown after the cursor
    pub suggestion: Color,
    /// Engine diagnostics such as unknown commands
    pub error: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_scheme()
    }
}

impl ColorScheme {
    /// Colors in order: prompt, input, output, suggestion, error
    fn build(name: &str, [prompt, input, output, suggestion, error]: [Color; 5]) -> Self {
        Self {
            name: name.to_string(),
            prompt,
            input,
            output,
            suggestion,
            error,
        }
    }

    /// Default color scheme
    pub fn default_scheme() -> Self {
        Self::build(
            "default",
            [
                Color::new(0, 200, 0),
                Color::new(255, 255, 255),
                Color::new(200, 200, 200),
                Color::new(110, 110, 110),
                Color::new(230, 80, 80),
            ],
        )
    }

    /// Solarized Dark scheme
    pub fn solarized_dark() -> Self {
        Self::build(
            "solarized-dark",
            [
                Color::new(133, 153, 0),
                Color::new(253, 246, 227),
                Color::new(147, 161, 161),
                Color::new(88, 110, 117),
                Color::new(220, 50, 47),
            ],
        )
    }

    /// Monokai scheme
    pub fn monokai() -> Self {
        Self::build(
            "monokai",
            [
                Color::new(166, 226, 46),
                Color::new(248, 248, 242),
                Color::new(230, 219, 116),
                Color::new(117, 113, 94),
                Color::new(249, 38, 114),
            ],
        )
    }

    /// Nord scheme
    pub fn nord() -> Self {
        Self::build(
            "nord",
            [
                Color::new(136, 192, 208),
                Color::new(236, 239, 244),
                Color::new(216, 222, 233),
                Color::new(76, 86, 106),
                Color::new(191, 97, 106),
            ],
        )
    }

    /// Dracula scheme
    pub fn dracula() -> Self {
        Self::build(
            "dracula",
            [
                Color::new(189, 147, 249),
                Color::new(248, 248, 242),
                Color::new(241, 250, 140),
                Color::new(98, 114, 164),
                Color::new(255, 85, 85),
            ],
        )
    }

    /// Gruvbox Dark scheme
    pub fn gruvbox_dark() -> Self {
        Self::build(
            "gruvbox-dark",
            [
                Color::new(215, 153, 33),
                Color::new(235, 219, 178),
                Color::new(213, 196, 161),
                Color::new(102, 92, 84),
                Color::new(204, 36, 29),
            ],
        )
    }

    /// Tokyo Night scheme
    pub fn tokyo_night() -> Self {
        Self::build(
            "tokyo-night",
            [
                Color::new(122, 162, 247),
                Color::new(192, 202, 245),
                Color::new(169, 177, 214),
                Color::new(86, 95, 137),
                Color::new(247, 118, 142),
            ],
        )
    }

    /// Get scheme by name, if it exists
    pub fn find(name: &str) -> Option<Self> {
        let scheme = match name.to_lowercase().as_str() {
            "default" => Self::default_scheme(),
            "solarized-dark" | "solarized_dark" | "solarized" => Self::solarized_dark(),
            "monokai" => Self::monokai(),
            "nord" => Self::nord(),
            "dracula" => Self::dracula(),
            "gruvbox-dark" | "gruvbox_dark" | "gruvbox" => Self::gruvbox_dark(),
            "tokyo-night" | "tokyo_night" | "tokyonight" => Self::tokyo_night(),
            _ => return None,
        };
        Some(scheme)
    }

    /// Get scheme by name, falling back to the default scheme
    pub fn by_name(name: &str) -> Self {
        Self::find(name).unwrap_or_else(Self::default_scheme)
    }

    /// List available schemes
    pub fn list() -> Vec<&'static str> {
        vec![
            "default",
            "solarized-dark",
            "monokai",
            "nord",
            "dracula",
            "gruvbox-dark",
            "tokyo-night",
        ]
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
