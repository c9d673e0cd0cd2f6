//! DeskFS shell: a line-oriented File Explorer for the virtual file system.
//!
//! This binary loads the configuration, boots the VFS from the persisted
//! snapshot, and runs a read-eval-print loop over stdin until `quit` or EOF.

mod app;
mod input;
mod render;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use deskfs_core::{Config, JsonFileStore, SnapshotStore, VfsError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::{App, Flow};
use crate::input::{parse_line, InputAction};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deskfs_shell=info,deskfs_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = load_config(std::env::args().nth(1).map(PathBuf::from))?;
    tracing::info!(snapshot = %config.storage.snapshot_path.display(), "starting shell");
    let store = JsonFileStore::new(&config.storage.snapshot_path);
    let mut app = App::boot(config, store);

    run(&mut app, io::stdin().lock(), io::stdout())
}

/// `config/default.toml` in the working directory when present, otherwise
/// `~/.config/deskfs/default.toml`.
fn default_config_path() -> PathBuf {
    let cfg_dir = if Path::new("config").exists() {
        PathBuf::from("config")
    } else {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/"))
            .join(".config")
            .join("deskfs")
    };
    cfg_dir.join("default.toml")
}

/// An explicitly named config must exist; the default location may be
/// absent, in which case built-in defaults apply.
fn load_config(explicit: Option<PathBuf>) -> anyhow::Result<Config> {
    match explicit {
        Some(path) => {
            Config::load(&path).with_context(|| format!("loading config {}", path.display()))
        }
        None => match Config::load(&default_config_path()) {
            Ok(config) => Ok(config),
            Err(VfsError::ConfigNotFound(_)) => Ok(Config::default()),
            Err(e) => Err(e.into()),
        },
    }
}

fn run<S: SnapshotStore>(
    app: &mut App<S>,
    input: impl BufRead,
    mut output: impl Write,
) -> anyhow::Result<()> {
    write!(output, "{}", app.prompt())?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        match parse_line(&line).map(|action| app.handle(action)) {
            Ok(Ok(Flow::Quit)) => return Ok(()),
            Ok(Ok(Flow::Continue(text))) => {
                if !text.is_empty() {
                    writeln!(output, "{text}")?;
                }
            }
            Ok(Err(e)) => writeln!(output, "error: {e:#}")?,
            Err(usage) => writeln!(output, "{usage}")?,
        }
        write!(output, "{}", app.prompt())?;
        output.flush()?;
    }

    // EOF behaves like `quit`
    writeln!(output)?;
    app.handle(InputAction::Quit)?;
    Ok(())
}
