mod app;
mod components;
mod config;
mod error;
mod event;
mod fs;
mod handler;
mod logging;
mod theme;
mod tui;
mod ui;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::app::App;
use crate::config::{AppConfig, PreviewConfig, TreeConfig};
use crate::event::{Event, EventHandler};
use crate::tui::{install_panic_hook, Tui};

/// Browse a directory subtree as a tree in the terminal.
#[derive(Parser, Debug)]
#[command(name = "bt", version, about)]
struct Cli {
    /// Root directory to browse (defaults to the configured path, then the current directory)
    path: Option<PathBuf>,

    /// Config file read on top of the standard locations
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Start with the preview pane hidden
    #[arg(long)]
    no_preview: bool,

    /// Lines kept visible between the selection and the window edge
    #[arg(long, value_name = "LINES")]
    edge_padding: Option<usize>,

    /// Run copy, move and delete through cp, mv and rm
    #[arg(long)]
    shell_ops: bool,

    /// Write logs here instead of the cache directory
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Flags expressed as a partial config that wins over every file.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            tree: TreeConfig {
                edge_padding: self.edge_padding,
                file_ops: self.shell_ops.then(|| "shell".to_string()),
                ..Default::default()
            },
            preview: PreviewConfig {
                enabled: self.no_preview.then_some(false),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();

    let log_path = logging::init(cli.log_file.as_deref());
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    let requested = cli
        .path
        .clone()
        .or_else(|| config.default_path().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let path = requested.canonicalize().map_err(|_| {
        error::AppError::InvalidPath(format!("{} does not exist", requested.display()))
    })?;

    tracing::info!(
        root = %path.display(),
        log = ?log_path,
        "starting"
    );

    let mut app = App::new(&path, &config)?;

    install_panic_hook();
    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(250));

    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(&mut app, frame);
        })?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Tick => app.clear_expired_status(),
            Event::Resize => {}
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    tracing::info!("exiting");
    Ok(())
}
