use std::process::ExitCode;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use anyhow::anyhow;
use anyhow::bail;
use clap::Parser;
use markview::app;
use markview::app::App;
use markview::app::AppOptions;
use markview::channel::ControllerLink;
use markview::channel::SurfaceId;
use markview::channel::surface_channel;
use markview::cli::Cli;
use markview::cli::StartMode;
use markview::cli::is_markdown;
use markview::config::Config;
use markview::document::TextDocument;
use markview::document::Workspace;
use markview::logging;
use markview::pane::PaneOptions;
use markview::registry::ControllerEvent;
use markview::registry::ViewRegistry;
use markview::watch::DocumentWatcher;
use markview_core::text::CodeHighlighter;
use markview_render::MarkdownRenderer;
use markview_render::RenderTransform;
use tracing::info;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("markview: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(logging::default_log_path);
    logging::init(&log_path);

    let mut config = Config::resolve(cli.config.as_deref()).context("loading configuration")?;
    let args = cli.command.file_args();
    args.apply(&mut config);
    if cli.command.requires_markdown() && !is_markdown(&args.file) {
        bail!(
            "{} is not a markdown file (expected .md or .markdown)",
            args.file.display()
        );
    }

    let workspace = Workspace::new();
    let document = workspace
        .open(&args.file)
        .with_context(|| format!("opening {}", args.file.display()))?;
    let transform: Arc<dyn RenderTransform> =
        Arc::new(MarkdownRenderer::with_options(config.render_options()));
    let highlighter = build_highlighter(&config.syntax_theme);

    let (events_tx, events_rx) = mpsc::channel();
    let mut registry = ViewRegistry::new(Arc::new(workspace.clone()), transform);
    let surface = SurfaceId::next();
    let (sink, inbox) = surface_channel();
    registry.attach(surface, document.clone(), Box::new(sink), events_tx.clone())?;
    let controller = thread::Builder::new()
        .name("markview-controller".to_string())
        .spawn(move || registry.run(events_rx))
        .context("starting controller thread")?;

    let _watcher = if config.watch {
        let watcher = DocumentWatcher::spawn(workspace.clone(), document.id(), document.path())
            .with_context(|| format!("watching {}", args.file.display()))?;
        Some(watcher)
    } else {
        None
    };

    let title = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.file.display().to_string());
    let mut app = App::new(
        ControllerLink::new(surface, events_tx.clone()),
        inbox,
        highlighter,
        AppOptions {
            title,
            surface: config.surface_options(),
            pane: PaneOptions {
                show_line_numbers: config.show_line_numbers,
                ..PaneOptions::default()
            },
        },
    );
    if cli.command.start_mode() == StartMode::Edit {
        app.request_toggle();
    }

    info!(path = %args.file.display(), "starting surface");
    let result = app::run_terminal(&mut app);

    let _ = events_tx.send(ControllerEvent::Shutdown);
    drop(app);
    controller
        .join()
        .map_err(|_| anyhow!("controller thread panicked"))?;
    result.context("terminal surface failed")
}

#[cfg(feature = "syntect")]
fn build_highlighter(theme: &str) -> Box<dyn CodeHighlighter> {
    use markview_syntax::syntect::SyntectHighlighter;

    match SyntectHighlighter::with_theme(theme) {
        Ok(highlighter) => Box::new(highlighter),
        Err(err) => {
            tracing::warn!(%err, "falling back to the default syntax theme");
            eprintln!("markview: {err}; using the default theme");
            Box::new(SyntectHighlighter::new())
        }
    }
}

#[cfg(not(feature = "syntect"))]
fn build_highlighter(_theme: &str) -> Box<dyn CodeHighlighter> {
    Box::new(markview_core::text::NoHighlight)
}
