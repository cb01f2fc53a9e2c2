use std::fs;
use std::fs::OpenOptions;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub const LOG_ENV: &str = "MARKVIEW_LOG";
const DEFAULT_FILTER: &str = "markview=info";

/// `<cache dir>/markview/markview.log`, or `markview.log` in the working directory.
pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("markview"))
        .unwrap_or_default()
        .join("markview.log")
}

/// Sends tracing output to `path`; the terminal belongs to the UI. Failing to open the file is
/// reported once on stderr and the program carries on without logs.
pub fn init(path: &Path) {
    if let Err(err) = try_init(path) {
        eprintln!("markview: logging disabled ({}): {err}", path.display());
    }
}

fn try_init(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    // A subscriber installed earlier (tests, embedding) wins.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();
    tracing::info!(path = %path.display(), "logging initialized");
    Ok(())
}
