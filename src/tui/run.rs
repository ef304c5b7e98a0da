//! TUI entry point and terminal setup.

use std::io;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};
use tracing::info;

use crate::clock::Clock;
use crate::db::BlobStore;
use crate::error::Result;
use crate::store::TaskStore;
use crate::tui::app::App;

/// Take over the terminal and run the UI until the user quits.
/// The terminal is restored even when the event loop fails.
pub fn run_tui<B: BlobStore, C: Clock>(store: &mut TaskStore<B, C>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    info!("UI session started");

    let result = App::new(store).run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    info!("UI session ended");

    result?;
    Ok(())
}
