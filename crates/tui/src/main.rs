mod app;
mod events;
mod persist;
mod strings;
mod terminal;
mod theme;
mod ui;

use std::fs::OpenOptions;

use anyhow::{Context, Result};
use remote::{ClientConfig, HttpRemote};
use terminal::TerminalGuard;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, EnvFilter};

fn init_logging() -> Result<Option<WorkerGuard>> {
    let Some(dir) = persist::data_dir() else {
        return Ok(None);
    };
    let log_dir = dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("create log dir: {}", log_dir.display()))?;
    let mut opts = OpenOptions::new();
    opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let file = opts
        .open(log_dir.join("tui.log"))
        .context("open tui.log")?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_env("ZTERM_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(filter);
    let _ = tracing_subscriber::registry().with(file_layer).try_init();
    Ok(Some(guard))
}

fn main() -> Result<()> {
    let _log_guard = init_logging()?;

    let cfg = ClientConfig::from_env_and_file()?;
    tracing::info!(target: "tui", "starting against {}", cfg.base_url);
    let remote = HttpRemote::new(cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("build tokio runtime")?;

    let stored = match persist::load_pending() {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(target: "tui", "read pending newlines: {:#}", e);
            None
        }
    };

    let mut app = app::App::new(remote, rt.handle().clone(), stored);
    let res = {
        let mut term = TerminalGuard::new()?;
        events::run(&mut term.terminal, &mut app)
    };
    app.shutdown();
    res
}
