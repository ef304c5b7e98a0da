//! # TaskFlow
//!
//! A personal task list with a terminal UI and a scriptable CLI.
//!
//! ## Key Features
//!
//! - **Validated entry**: title and due date are required, and due dates may
//!   not lie in the past. Every rejected field is reported at once.
//! - **Views**: all, pending, completed, overdue, or one category; pending
//!   tasks first, then by earliest due date.
//! - **Live counts**: total, completed, pending and overdue, recomputed after
//!   every change.
//! - **Local storage**: the whole list lives in one JSON file, rewritten
//!   atomically on each mutation.
//! - **Remote tables**: an optional adapter mirrors tasks and projects to a
//!   hosted record service.
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the terminal UI
//! tf ui
//!
//! # Add a task due next Friday
//! tf add "Send invoice" --due "next friday" --priority high --category 2
//!
//! # What is late?
//! tf list --filter overdue
//!
//! # Mark it done
//! tf toggle 4
//! ```
//!
//! Data is stored in `~/.taskflow/tasks.json` unless `--db` or `TASKFLOW_DB`
//! points elsewhere.

pub mod cli;
pub mod clock;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod remote;
pub mod stats;
pub mod store;
pub mod task;
pub mod validate;
pub mod view;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

pub use error::{Result, TaskFlowError};
pub use store::TaskStore;
