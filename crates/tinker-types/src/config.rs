//! Console configuration, loaded from `console.toml`.

use std::path::Path;

use serde::Deserialize;

use crate::color::{Color, parse_hex_color};
use crate::error::{ConsoleError, Result};
use crate::input::Key;

/// Tunable console behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Key that opens and closes the console.
    pub toggle_key: Key,
    /// Scrollback capacity. Oldest lines are evicted first.
    pub max_lines: usize,
    /// History capacity.
    pub max_history: usize,
    /// Buffer prefix that switches completion to expression members.
    pub expression_prefix: String,
    /// Character standing in for a space inside a `call` expression.
    pub space_placeholder: char,
    /// Wrap width in characters.
    pub wrap_width: usize,
    /// Scrollback lines shown at once.
    pub visible_lines: usize,
    /// Disable the host's own input handling while the console is open.
    pub suppress_input: bool,
    /// Fail instead of returning the right operand when neither operand type
    /// implements an operator.
    pub strict_operators: bool,
    pub palette: Palette,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            toggle_key: Key::Backquote,
            max_lines: 100,
            max_history: 50,
            expression_prefix: "call ".to_string(),
            space_placeholder: '#',
            wrap_width: 80,
            visible_lines: 12,
            suppress_input: true,
            strict_operators: false,
            palette: Palette::default(),
        }
    }
}

impl ConsoleConfig {
    /// Parse a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ConsoleError::Config(format!("console.toml: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        log::info!("Loaded console config from {}", path.display());
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.max_lines == 0 {
            return Err(ConsoleError::Config("max_lines must be at least 1".into()));
        }
        if self.wrap_width == 0 {
            return Err(ConsoleError::Config("wrap_width must be at least 1".into()));
        }
        if self.toggle_key.function_slot().is_some() {
            return Err(ConsoleError::Config(
                "toggle_key must not be a function key; those are binding slots".into(),
            ));
        }
        if self.space_placeholder.is_whitespace() {
            return Err(ConsoleError::Config(
                "space_placeholder must not be whitespace".into(),
            ));
        }
        Ok(())
    }
}

/// Line colors as `#RRGGBB` strings.
#[derive(Debug, Clone, Deserialize)]
pub struct Palette {
    /// Echo of a submitted line.
    #[serde(default = "default_echo")]
    pub echo: String,
    /// Regular command output.
    #[serde(default = "default_output")]
    pub output: String,
    /// Errors and stack frames.
    #[serde(default = "default_error")]
    pub error: String,
    /// Informational notices.
    #[serde(default = "default_info")]
    pub info: String,
}

fn default_echo() -> String {
    "#F0DC64".to_string()
}
fn default_output() -> String {
    "#FFFFFF".to_string()
}
fn default_error() -> String {
    "#FF5050".to_string()
}
fn default_info() -> String {
    "#AAAAAA".to_string()
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            echo: default_echo(),
            output: default_output(),
            error: default_error(),
            info: default_info(),
        }
    }
}

impl Palette {
    pub fn echo_color(&self) -> Color {
        parse_hex_color(&self.echo).unwrap_or(Color::YELLOW)
    }

    pub fn output_color(&self) -> Color {
        parse_hex_color(&self.output).unwrap_or(Color::WHITE)
    }

    pub fn error_color(&self) -> Color {
        parse_hex_color(&self.error).unwrap_or(Color::RED)
    }

    pub fn info_color(&self) -> Color {
        parse_hex_color(&self.info).unwrap_or(Color::GRAY)
    }
}
