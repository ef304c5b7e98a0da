use std::path::Path;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskflow::cli::Cli;
use taskflow::cmd::*;
use taskflow::config::Paths;
use taskflow::db::FileBlob;
use taskflow::error::Result;
use taskflow::store::TaskStore;
use taskflow::tui::run::run_tui;

/// Initialize tracing.
///
/// With a log file (UI mode) nothing is written to the terminal, so the
/// screen is not corrupted. Otherwise logs go to stderr, keeping stdout for
/// command output.
fn init_tracing(log_file: Option<&Path>) {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "taskflow=info".into());

    let file = log_file.and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    match file {
        Some(file) => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init(),
        // A UI session whose log file cannot be opened runs without logging.
        None if log_file.is_some() => {}
        None => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return Ok(());
    }

    let paths = Paths::from_env(cli.db.as_deref());
    paths.ensure_data_dir()?;
    init_tracing(cli.is_interactive().then(|| paths.log_file()).as_deref());
    info!(blob = %paths.blob.display(), "Opening task store");

    let mut store = TaskStore::open(FileBlob::new(&paths.blob));

    match cli.command {
        Commands::Ui => run_tui(&mut store)?,
        Commands::Add { title, due, desc, priority, category } => {
            cmd_add(&mut store, title, due, desc, priority, category)?;
        }
        Commands::List { filter, limit } => cmd_list(&store, &filter, limit),
        Commands::View { id } => cmd_view(&store, &id)?,
        Commands::Edit { id, title, desc, due, priority, category } => {
            cmd_edit(&mut store, &id, title, desc, due, priority, category)?;
        }
        Commands::Toggle { id } => {
            cmd_toggle(&mut store, &id)?;
        }
        Commands::Delete { id } => cmd_delete(&mut store, &id),
        Commands::Stats { json } => cmd_stats(&store, json)?,
        Commands::Categories => cmd_categories(&store),
        Commands::Completions { .. } => unreachable!("completions handled above"),
    }

    store.close();
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        print_error(&e);
        std::process::exit(1);
    }
}
