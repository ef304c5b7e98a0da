//! Command implementations for the CLI interface.
//!
//! Each handler works against an open [`TaskStore`] and prints its result to
//! stdout. Failures are returned to `main`, which reports them and exits
//! non-zero.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::clock::Clock;
use crate::db::*;
use crate::error::{Result, TaskFlowError};
use crate::fields::*;
use crate::store::TaskStore;
use crate::task::{default_categories, resolve_category, Task};
use crate::validate::TaskDraft;
use crate::view::Selector;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI interface.
    Ui,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "friday" or "in Nd".
        #[arg(long)]
        due: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Priority: low | medium | high.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Category id (see `tf categories`).
        #[arg(long)]
        category: Option<String>,
    },

    /// List tasks, pending first and earliest due.
    List {
        /// all | pending | completed | overdue | <category id>.
        #[arg(long, default_value = "all")]
        filter: Selector,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task.
    View {
        id: String,
    },

    /// Edit fields on a task. Unset flags keep their current value.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        category: Option<String>,
    },

    /// Flip a task between pending and completed.
    Toggle {
        id: String,
    },

    /// Delete a task.
    Delete {
        id: String,
    },

    /// Show task counts.
    Stats {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the available categories.
    Categories,

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Add a new task.
pub fn cmd_add<B: BlobStore, C: Clock>(
    store: &mut TaskStore<B, C>,
    title: String,
    due: String,
    desc: Option<String>,
    priority: Option<Priority>,
    category: Option<String>,
) -> Result<Task> {
    let draft = TaskDraft {
        title,
        description: desc.unwrap_or_default(),
        due_date: due,
        priority,
        category_id: category,
    };
    let task = store.submit(&draft, None)?;
    println!("Added {} (#{})", task.title, task.id);
    Ok(task)
}

/// Print the filtered, sorted task list.
pub fn cmd_list<B: BlobStore, C: Clock>(store: &TaskStore<B, C>, filter: &Selector, limit: Option<usize>) {
    let categories = default_categories();
    let mut rows = store.view(filter);
    if let Some(n) = limit {
        rows.truncate(n);
    }
    println!("{} ({})", filter.heading(&categories), rows.len());
    if rows.is_empty() {
        println!("No tasks found.");
        return;
    }
    print_table(&rows, &categories, store.clock().now(), store.clock().today());
}

/// Print every field of one task.
pub fn cmd_view<B: BlobStore, C: Clock>(store: &TaskStore<B, C>, id: &str) -> Result<()> {
    let task = store.get(id).ok_or_else(|| TaskFlowError::not_found(id))?;
    let today = store.clock().today();
    let category = resolve_category(&default_categories(), &task.category_id);
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Status:       {}", format_status(task.status));
    println!("Priority:     {}", format_priority(task.priority));
    println!("Category:     {} ({})", category.name, category.color);
    println!(
        "Due:          {}",
        match task.due_date {
            Some(d) => format!("{d} ({})", format_due_relative(Some(d), today)),
            None => "-".into(),
        }
    );
    if task.is_overdue(store.clock().now()) {
        println!("              overdue");
    }
    println!("Created UTC:  {}", task.created_at.to_rfc3339());
    println!(
        "Completed:    {}",
        task.completed_at.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".into())
    );
    if let Some(updated) = task.updated_at {
        println!("Updated UTC:  {}", updated.to_rfc3339());
    }
    println!("Description:\n{}\n", task.description.as_deref().unwrap_or("-"));
    Ok(())
}

/// Re-validate a task with any overridden fields and save it.
#[allow(clippy::too_many_arguments)]
pub fn cmd_edit<B: BlobStore, C: Clock>(
    store: &mut TaskStore<B, C>,
    id: &str,
    title: Option<String>,
    desc: Option<String>,
    due: Option<String>,
    priority: Option<Priority>,
    category: Option<String>,
) -> Result<Task> {
    let current = store.get(id).ok_or_else(|| TaskFlowError::not_found(id))?;
    let draft = TaskDraft {
        title: title.unwrap_or_else(|| current.title.clone()),
        description: desc.or_else(|| current.description.clone()).unwrap_or_default(),
        due_date: due
            .or_else(|| current.due_date.map(|d| d.format("%Y-%m-%d").to_string()))
            .unwrap_or_default(),
        priority: priority.or(Some(current.priority)),
        category_id: category.or_else(|| Some(current.category_id.clone())),
    };
    let task = store.submit(&draft, Some(id))?;
    println!("Updated {} (#{})", task.title, task.id);
    Ok(task)
}

pub fn cmd_toggle<B: BlobStore, C: Clock>(store: &mut TaskStore<B, C>, id: &str) -> Result<Task> {
    let task = store.toggle_status(id)?;
    println!("{} is now {}", task.id, format_status(task.status));
    Ok(task)
}

/// Delete a task. Deleting an unknown id is not an error.
pub fn cmd_delete<B: BlobStore, C: Clock>(store: &mut TaskStore<B, C>, id: &str) {
    if store.delete(id) {
        println!("Deleted {id}.");
    } else {
        println!("No task {id}; nothing deleted.");
    }
}

pub fn cmd_stats<B: BlobStore, C: Clock>(store: &TaskStore<B, C>, json: bool) -> Result<()> {
    let stats = store.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!("{:<10} {}", "Total", stats.total);
    println!("{:<10} {}", "Completed", stats.completed);
    println!("{:<10} {}", "Pending", stats.pending);
    println!("{:<10} {}", "Overdue", stats.overdue);
    Ok(())
}

/// List categories with their task counts.
pub fn cmd_categories<B: BlobStore, C: Clock>(store: &TaskStore<B, C>) {
    println!("{:<4} {:<12} {:<9} {}", "ID", "Name", "Color", "Tasks");
    for c in default_categories() {
        let count = store.tasks().iter().filter(|t| t.category_id == c.id).count();
        println!("{:<4} {:<12} {:<9} {}", c.id, truncate(&c.name, 12), c.color, count);
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Report an error on stderr, one line per rejected field.
pub fn print_error(err: &TaskFlowError) {
    match err.field_errors() {
        Some(errors) => {
            eprintln!("Task not saved:");
            for (field, msg) in errors.iter() {
                eprintln!("  {field}: {msg}");
            }
        }
        None => eprintln!("Error: {err}"),
    }
}
