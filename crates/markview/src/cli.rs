use std::path::Path;
use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(
    name = "markview",
    version,
    about = "Live markdown preview with a side-by-side editor"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file. Defaults to <config dir>/markview/config.toml when it exists.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Where to write logs. Filter with MARKVIEW_LOG.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open a markdown file in the preview.
    Preview(FileArgs),
    /// Open a markdown file straight in the edit layout.
    Edit(FileArgs),
    /// Open any file in the preview, whatever its extension.
    Open(FileArgs),
}

#[derive(Clone, Debug, Args)]
pub struct FileArgs {
    pub file: PathBuf,

    /// Reload when the file changes on disk.
    #[arg(long)]
    pub watch: bool,

    /// Syntax theme for code blocks.
    #[arg(long, value_name = "NAME")]
    pub theme: Option<String>,

    /// Show line numbers in code blocks.
    #[arg(long)]
    pub line_numbers: bool,
}

/// What the app should do once the file is open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartMode {
    Preview,
    Edit,
}

impl Command {
    pub fn file_args(&self) -> &FileArgs {
        match self {
            Command::Preview(args) | Command::Edit(args) | Command::Open(args) => args,
        }
    }

    pub fn start_mode(&self) -> StartMode {
        match self {
            Command::Edit(_) => StartMode::Edit,
            Command::Preview(_) | Command::Open(_) => StartMode::Preview,
        }
    }

    /// `open` accepts anything; the other commands only markdown files.
    pub fn requires_markdown(&self) -> bool {
        !matches!(self, Command::Open(_))
    }
}

impl FileArgs {
    /// Command-line flags win over the config file.
    pub fn apply(&self, config: &mut Config) {
        if self.watch {
            config.watch = true;
        }
        if let Some(theme) = &self.theme {
            config.syntax_theme.clone_from(theme);
        }
        if self.line_numbers {
            config.show_line_numbers = true;
        }
    }
}

pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"))
}
