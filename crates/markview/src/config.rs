use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use markview_render::RawHtml;
use markview_render::RenderOptions;
use serde::Deserialize;
use thiserror::Error;

use crate::surface::SurfaceOptions;
use crate::surface::clamp_percent;

pub const DEFAULT_THEME: &str = "base16-ocean.dark";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub edit_debounce_ms: u64,
    pub highlight_settle_ms: u64,
    pub initial_split_percent: u8,
    pub syntax_theme: String,
    pub show_line_numbers: bool,
    pub watch: bool,
    pub escape_raw_html: bool,
    pub max_input_bytes: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            edit_debounce_ms: 500,
            highlight_settle_ms: 50,
            initial_split_percent: 50,
            syntax_theme: DEFAULT_THEME.to_string(),
            show_line_numbers: false,
            watch: false,
            escape_raw_html: false,
            max_input_bytes: None,
        }
    }
}

impl Config {
    /// `<config dir>/markview/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("markview").join("config.toml"))
    }

    pub fn from_toml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(path, &text)
    }

    /// Loads `explicit` if given (it must exist), otherwise the default path if present,
    /// otherwise the built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            max_input_bytes: self.max_input_bytes,
            raw_html: if self.escape_raw_html {
                RawHtml::Escape
            } else {
                RawHtml::Allow
            },
        }
    }

    pub fn surface_options(&self) -> SurfaceOptions {
        SurfaceOptions {
            edit_debounce: Duration::from_millis(self.edit_debounce_ms),
            highlight_settle: Duration::from_millis(self.highlight_settle_ms),
            initial_split_percent: clamp_percent(f32::from(self.initial_split_percent)),
        }
    }
}
