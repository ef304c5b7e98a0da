//! Enumerations for TUI state management.

/// Application state for the terminal user interface.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    TaskList,
    TaskDetail,
    AddTask,
    EditTask,
    Help,
    Confirm,
}

/// Which pane of the task list receives navigation keys.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Focus {
    Sidebar,
    #[default]
    Table,
}

impl Focus {
    pub fn toggled(self) -> Self {
        match self {
            Focus::Sidebar => Focus::Table,
            Focus::Table => Focus::Sidebar,
        }
    }
}
