use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Personal task list with a terminal UI.
/// Storage defaults to ~/.taskflow/tasks.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "tf", version, about = "TaskFlow task list manager")]
pub struct Cli {
    /// Path to the JSON task file.
    #[arg(long, global = true, env = "TASKFLOW_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The terminal UI takes over the screen, so its logs go to a file.
    pub fn is_interactive(&self) -> bool {
        matches!(self.command, Commands::Ui)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "tf", "--db", "/tmp/t.json", "add", "Write report", "--due", "tomorrow", "--priority", "high",
            "--category", "2",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/t.json")));
        assert!(!cli.is_interactive());
        match cli.command {
            Commands::Add { title, due, priority, category, .. } => {
                assert_eq!(title, "Write report");
                assert_eq!(due, "tomorrow");
                assert_eq!(priority, Some(crate::fields::Priority::High));
                assert_eq!(category.as_deref(), Some("2"));
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_parse_list_filter() {
        let cli = Cli::try_parse_from(["tf", "list", "--filter", "overdue", "--limit", "5"]).unwrap();
        match cli.command {
            Commands::List { filter, limit } => {
                assert_eq!(filter, crate::view::Selector::Overdue);
                assert_eq!(limit, Some(5));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_ui_is_interactive() {
        let cli = Cli::try_parse_from(["tf", "ui"]).unwrap();
        assert!(cli.is_interactive());
    }
}
