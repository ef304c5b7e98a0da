//! Main application logic for the terminal user interface.
//!
//! `App` borrows the task store for the length of a session. It keeps only
//! presentation state of its own: the active selector, table selection,
//! form contents and a one-line status message. Every list it draws is
//! derived from the store on each frame.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use tracing::debug;

use crate::clock::Clock;
use crate::db::{format_due_relative, BlobStore};
use crate::error::TaskFlowError;
use crate::fields::{format_priority, format_status};
use crate::store::TaskStore;
use crate::task::{default_categories, resolve_category, Category, Task};
use crate::tui::{
    colors::{category_color, priority_color, BRAND, DANGER, DARK_RED, GOLD, SUCCESS},
    enums::{AppState, Focus},
    input::InputField,
    task_form::{
        TaskForm, CATEGORY_GLOBAL_ORDER, DESCRIPTION_GLOBAL_ORDER, DUE_GLOBAL_ORDER, PRIORITY_GLOBAL_ORDER,
        TITLE_GLOBAL_ORDER,
    },
    utils::centered_rect,
};
use crate::view::Selector;

static ALL_TASKS: Selector = Selector::All;

/// Main application state for the terminal user interface.
pub struct App<'a, B: BlobStore, C: Clock> {
    store: &'a mut TaskStore<B, C>,
    state: AppState,
    focus: Focus,
    categories: Vec<Category>,
    selectors: Vec<Selector>,
    selector_state: ListState,
    task_list_state: TableState,
    task_form: TaskForm,
    /// Id of the task awaiting delete confirmation.
    confirm_delete: Option<String>,
    status_message: String,
}

impl<'a, B: BlobStore, C: Clock> App<'a, B, C> {
    pub fn new(store: &'a mut TaskStore<B, C>) -> Self {
        let categories = default_categories();
        let selectors = Selector::sidebar(&categories);
        let mut app = App {
            store,
            state: AppState::TaskList,
            focus: Focus::default(),
            task_form: TaskForm::new(&categories),
            categories,
            selectors,
            selector_state: ListState::default().with_selected(Some(0)),
            task_list_state: TableState::default(),
            confirm_delete: None,
            status_message: String::new(),
        };
        app.clamp_selection();
        app
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn selector(&self) -> &Selector {
        self.selector_state
            .selected()
            .and_then(|i| self.selectors.get(i))
            .unwrap_or(&ALL_TASKS)
    }

    /// Ids of the tasks in the current view, in display order.
    pub fn visible_ids(&self) -> Vec<String> {
        self.store.view(self.selector()).into_iter().map(|t| t.id.clone()).collect()
    }

    fn selected_task(&self) -> Option<&Task> {
        let idx = self.task_list_state.selected()?;
        let view = self.store.view(self.selector());
        let id = view.get(idx)?.id.clone();
        self.store.get(&id)
    }

    fn selected_task_id(&self) -> Option<String> {
        self.selected_task().map(|t| t.id.clone())
    }

    /// Keep the table selection inside the current view.
    fn clamp_selection(&mut self) {
        let len = self.store.view(self.selector()).len();
        let selected = match self.task_list_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.task_list_state.select(selected);
    }

    fn select_task(&mut self, id: &str) {
        if let Some(i) = self.visible_ids().iter().position(|v| v == id) {
            self.task_list_state.select(Some(i));
        } else {
            self.clamp_selection();
        }
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    fn move_selector(&mut self, down: bool) {
        let len = self.selectors.len();
        let current = self.selector_state.selected().unwrap_or(0);
        let next = if down { (current + 1) % len } else { (current + len - 1) % len };
        self.selector_state.select(Some(next));
        self.task_list_state.select(Some(0));
        self.clamp_selection();
    }

    fn move_task_selection(&mut self, down: bool) {
        let len = self.store.view(self.selector()).len();
        if len == 0 {
            return;
        }
        let next = match self.task_list_state.selected() {
            Some(i) if down => (i + 1).min(len - 1),
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.task_list_state.select(Some(next));
    }

    fn open_add_form(&mut self) {
        self.task_form = TaskForm::new(&self.categories);
        if let Selector::Category(id) = self.selector() {
            if let Some(i) = self.categories.iter().position(|c| &c.id == id) {
                self.task_form.category = i;
            }
        }
        self.state = AppState::AddTask;
    }

    fn open_edit_form(&mut self) {
        if let Some(task) = self.selected_task() {
            self.task_form = TaskForm::from_task(task, &self.categories);
            self.state = AppState::EditTask;
        }
    }

    fn toggle_selected(&mut self) {
        let Some(id) = self.selected_task_id() else {
            return;
        };
        match self.store.toggle_status(&id) {
            Ok(task) => {
                let verb = if task.is_completed() { "completed" } else { "reopened" };
                self.set_status_message(format!("Task {verb}: {}", task.title));
                self.select_task(&id);
            }
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
    }

    fn submit_form(&mut self) {
        let draft = self.task_form.to_draft();
        let editing = self.task_form.editing.clone();
        match self.store.submit(&draft, editing.as_deref()) {
            Ok(task) => {
                let verb = if editing.is_some() { "updated" } else { "created" };
                debug!(id = %task.id, "Task {verb} from form");
                self.set_status_message(format!("Task {verb}: {}", task.title));
                self.state = AppState::TaskList;
                self.select_task(&task.id);
            }
            Err(TaskFlowError::Validation(errors)) => {
                self.set_status_message(format!("Please fix {} field(s)", errors.len()));
                self.task_form.set_errors(errors);
            }
            Err(e) => {
                self.set_status_message(format!("Error: {e}"));
                self.state = AppState::TaskList;
                self.clamp_selection();
            }
        }
    }

    /// Handle keyboard input in the task list view.
    /// Returns true if the application should quit.
    fn handle_task_list_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::BackTab => self.focus = self.focus.toggled(),
            KeyCode::Left => self.focus = Focus::Sidebar,
            KeyCode::Right => self.focus = Focus::Table,
            KeyCode::Up | KeyCode::Char('k') => match self.focus {
                Focus::Sidebar => self.move_selector(false),
                Focus::Table => self.move_task_selection(false),
            },
            KeyCode::Down | KeyCode::Char('j') => match self.focus {
                Focus::Sidebar => self.move_selector(true),
                Focus::Table => self.move_task_selection(true),
            },
            KeyCode::Enter => {
                if self.selected_task().is_some() {
                    self.state = AppState::TaskDetail;
                }
            }
            KeyCode::Char('a') | KeyCode::Char('n') => self.open_add_form(),
            KeyCode::Char('e') => self.open_edit_form(),
            KeyCode::Char(' ') | KeyCode::Char('x') => self.toggle_selected(),
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_task_id() {
                    self.confirm_delete = Some(id);
                    self.state = AppState::Confirm;
                }
            }
            KeyCode::Char('h') | KeyCode::Char('?') | KeyCode::F(1) => self.state = AppState::Help,
            _ => {}
        }
        false
    }

    fn handle_detail_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => self.state = AppState::TaskList,
            KeyCode::Char('e') => self.open_edit_form(),
            KeyCode::Char(' ') | KeyCode::Char('x') => self.toggle_selected(),
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_task_id() {
                    self.confirm_delete = Some(id);
                    self.state = AppState::Confirm;
                }
            }
            _ => {}
        }
    }

    fn handle_form_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.state = AppState::TaskList;
                self.set_status_message("Cancelled");
            }
            KeyCode::Enter => self.submit_form(),
            KeyCode::Tab | KeyCode::Down => self.task_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.task_form.prev_field(),
            KeyCode::Left => self.task_form.handle_left_right(false),
            KeyCode::Right => self.task_form.handle_left_right(true),
            KeyCode::Home => self.task_form.handle_home_end(false),
            KeyCode::End => self.task_form.handle_home_end(true),
            KeyCode::Backspace => self.task_form.handle_backspace(),
            KeyCode::Delete => self.task_form.handle_delete(),
            KeyCode::Char(c) => self.task_form.handle_char(c),
            _ => {}
        }
    }

    fn handle_confirm_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                if let Some(id) = self.confirm_delete.take() {
                    let title = self.store.get(&id).map(|t| t.title.clone()).unwrap_or_default();
                    if self.store.delete(&id) {
                        self.set_status_message(format!("Task deleted: {title}"));
                    }
                }
                self.state = AppState::TaskList;
                self.clamp_selection();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm_delete = None;
                self.state = AppState::TaskList;
            }
            _ => {}
        }
    }

    /// Dispatch one key press on the current state.
    /// Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        self.clear_status_message();
        match self.state {
            AppState::TaskList => return self.handle_task_list_input(key, modifiers),
            AppState::TaskDetail => self.handle_detail_input(key),
            AppState::AddTask | AppState::EditTask => self.handle_form_input(key),
            AppState::Help => self.state = AppState::TaskList,
            AppState::Confirm => self.handle_confirm_input(key),
        }
        false
    }

    /// Poll for and handle keyboard events.
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    fn render_stats_header(&self, f: &mut Frame, area: Rect) {
        let stats = self.store.stats();
        let stat = |label: &'static str, value: usize, color: Color| {
            vec![
                Span::raw(format!("{label} ")),
                Span::styled(value.to_string(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::raw("   "),
            ]
        };
        let mut spans = vec![
            Span::styled("TASKFLOW", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("   "),
        ];
        spans.extend(stat("Total", stats.total, Color::White));
        spans.extend(stat("Completed", stats.completed, SUCCESS));
        spans.extend(stat("Pending", stats.pending, GOLD));
        spans.extend(stat("Overdue", stats.overdue, DANGER));

        let header = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_sidebar(&mut self, f: &mut Frame, area: Rect) {
        let now = self.store.clock().now();
        let tasks = self.store.tasks();
        let items: Vec<ListItem> = self
            .selectors
            .iter()
            .map(|sel| {
                let count = tasks.iter().filter(|t| sel.matches(t, now)).count();
                let (name, color) = match sel {
                    Selector::Category(id) => {
                        let c = resolve_category(&self.categories, id);
                        (c.name.clone(), category_color(&c))
                    }
                    other => (other.heading(&self.categories).trim_end_matches(" Tasks").to_string(), Color::White),
                };
                ListItem::new(Line::from(vec![
                    Span::styled("● ", Style::default().fg(color)),
                    Span::raw(format!("{name:<10} {count:>3}")),
                ]))
            })
            .collect();

        let border = if self.focus == Focus::Sidebar { GOLD } else { Color::White };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Views")
                    .border_style(Style::default().fg(border)),
            )
            .highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol("> ");
        f.render_stateful_widget(list, area, &mut self.selector_state);
    }

    /// Render the task list view: stats header, sidebar and table.
    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let now = self.store.clock().now();
        let today = self.store.clock().today();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);
        self.render_stats_header(f, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(22), Constraint::Min(0)])
            .split(chunks[1]);
        self.render_sidebar(f, body[0]);

        let header_cells = ["", "Title", "Due", "Priority", "Category"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells).style(Style::default().bg(BRAND).fg(Color::White)).height(1);

        let selector = self.selector().clone();
        let view = self.store.view(&selector);
        let rows: Vec<Row> = view
            .iter()
            .map(|task| {
                let category = resolve_category(&self.categories, &task.category_id);
                let style = if task.is_completed() {
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
                } else if task.is_overdue(now) {
                    Style::default().fg(DANGER)
                } else {
                    Style::default().fg(Color::White)
                };
                let check = if task.is_completed() { "[x]" } else { "[ ]" };
                Row::new(vec![
                    Cell::from(check),
                    Cell::from(task.title.clone()),
                    Cell::from(format_due_relative(task.due_date, today)),
                    Cell::from(format_priority(task.priority))
                        .style(Style::default().fg(priority_color(task.priority))),
                    Cell::from(category.name.clone()).style(Style::default().fg(category_color(&category))),
                ])
                .style(style)
            })
            .collect();
        let shown = rows.len();

        let widths = [
            Constraint::Length(3),
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(12),
        ];
        let border = if self.focus == Focus::Table { GOLD } else { Color::White };
        let title = if shown == 0 {
            format!("{} - no tasks, press 'a' to add one", selector.heading(&self.categories))
        } else {
            format!("{} ({shown}) - Press 'h' for help", selector.heading(&self.categories))
        };
        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(Style::default().fg(border)),
            )
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, body[1], &mut self.task_list_state);
    }

    fn render_task_detail(&mut self, f: &mut Frame, area: Rect) {
        let Some(task) = self.selected_task() else {
            self.state = AppState::TaskList;
            return;
        };
        let now = self.store.clock().now();
        let today = self.store.clock().today();
        let category = resolve_category(&self.categories, &task.category_id);
        let label = |s: &'static str| Span::styled(format!("{s:<12}"), Style::default().add_modifier(Modifier::BOLD));

        let due = match task.due_date {
            Some(d) => format!("{d} ({})", format_due_relative(Some(d), today)),
            None => "-".into(),
        };
        let mut lines = vec![
            Line::from(vec![label("Title"), Span::raw(task.title.clone())]),
            Line::from(vec![label("Status"), Span::raw(format_status(task.status))]),
            Line::from(vec![
                label("Priority"),
                Span::styled(format_priority(task.priority), Style::default().fg(priority_color(task.priority))),
            ]),
            Line::from(vec![
                label("Category"),
                Span::styled(category.name.clone(), Style::default().fg(category_color(&category))),
            ]),
            Line::from(vec![
                label("Due"),
                Span::styled(
                    due,
                    if task.is_overdue(now) { Style::default().fg(DANGER) } else { Style::default() },
                ),
            ]),
            Line::from(vec![label("Created"), Span::raw(task.created_at.format("%Y-%m-%d %H:%M UTC").to_string())]),
        ];
        if let Some(done) = task.completed_at {
            lines.push(Line::from(vec![label("Completed"), Span::raw(done.format("%Y-%m-%d %H:%M UTC").to_string())]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(task.description.clone().unwrap_or_else(|| "No description".into())));

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Task #{} - e edit, space toggle, d delete, Esc back", task.id)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn input_block<'b>(&self, order: usize, title: &'b str) -> Block<'b> {
        let focused = self.task_form.current_field == order;
        let mut block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(if focused { GOLD } else { Color::White }));
        if let Some(err) = self.task_form.error_for(order) {
            block = block
                .border_style(Style::default().fg(DANGER))
                .title_bottom(Line::from(Span::styled(err.to_string(), Style::default().fg(DANGER))));
        }
        block
    }

    fn render_input(&self, f: &mut Frame, area: Rect, order: usize, title: &str, input: &InputField) {
        f.render_widget(Paragraph::new(input.value.as_str()).block(self.input_block(order, title)), area);
        if self.task_form.current_field == order {
            let (before, _) = input.split_at_cursor();
            let x = area.x + 1 + before.chars().count() as u16;
            f.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
        }
    }

    fn render_task_form(&mut self, f: &mut Frame, area: Rect) {
        let outer = Block::default()
            .borders(Borders::ALL)
            .title(if self.task_form.is_edit() { "Edit Task" } else { "Add Task" });
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Description
                Constraint::Length(3), // Due Date
                Constraint::Length(3), // Priority
                Constraint::Length(3), // Category
                Constraint::Min(1),    // Instructions
            ])
            .split(inner);

        self.render_input(f, chunks[0], TITLE_GLOBAL_ORDER, "Title *", &self.task_form.title);
        self.render_input(f, chunks[1], DESCRIPTION_GLOBAL_ORDER, "Description", &self.task_form.description);
        self.render_input(f, chunks[2], DUE_GLOBAL_ORDER, "Due Date * (YYYY-MM-DD, today, friday, in 3d)", &self.task_form.due);

        let priority = self.task_form.selected_priority();
        let priority_line = Line::from(vec![
            Span::raw("< "),
            Span::styled(format_priority(priority), Style::default().fg(priority_color(priority))),
            Span::raw(" >"),
        ]);
        f.render_widget(
            Paragraph::new(priority_line).block(self.input_block(PRIORITY_GLOBAL_ORDER, "Priority")),
            chunks[3],
        );

        let category_line = match self.task_form.selected_category() {
            Some(c) => Line::from(vec![
                Span::raw("< "),
                Span::styled(c.name.clone(), Style::default().fg(category_color(c))),
                Span::raw(" >"),
            ]),
            None => Line::from("< none >"),
        };
        f.render_widget(
            Paragraph::new(category_line).block(self.input_block(CATEGORY_GLOBAL_ORDER, "Category")),
            chunks[4],
        );

        let help = Paragraph::new("Tab/↑↓ move between fields  ←→ change selection  Enter save  Esc cancel")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(help, chunks[5]);
    }

    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let heading = |s: &'static str| Line::from(Span::styled(s, Style::default().add_modifier(Modifier::BOLD)));
        let help_text = vec![
            heading("TaskFlow Help"),
            Line::from(""),
            heading("Task List:"),
            Line::from("  ↑/↓, k/j     Move selection"),
            Line::from("  Tab, ←/→     Switch between views and tasks"),
            Line::from("  Enter        View task details"),
            Line::from("  a/n          Add new task"),
            Line::from("  e            Edit selected task"),
            Line::from("  space/x      Toggle completed"),
            Line::from("  d/Del        Delete selected task"),
            Line::from("  h/?/F1       Show this help"),
            Line::from("  q/Esc        Quit"),
            Line::from(""),
            heading("Form:"),
            Line::from("  Tab/↑↓       Move between fields"),
            Line::from("  ←/→          Change priority or category"),
            Line::from("  Home/End     Jump to start or end of text"),
            Line::from("  Enter        Save"),
            Line::from("  Esc          Cancel"),
            Line::from(""),
            heading("Due Date Formats:"),
            Line::from("  YYYY-MM-DD   Specific date (e.g., 2024-12-25)"),
            Line::from("  today        Today's date"),
            Line::from("  tomorrow     Tomorrow's date"),
            Line::from("  friday       Next Friday (or today if it is Friday)"),
            Line::from("  in 3d        3 days from today (also w, m)"),
            Line::from("  eow, eom     End of week or month"),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help - Press any key to return"))
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Delete Task")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 25, area);
        f.render_widget(Clear, area);

        let title = self
            .confirm_delete
            .as_deref()
            .and_then(|id| self.store.get(id))
            .map(|t| t.title.clone())
            .unwrap_or_default();
        let text = vec![
            Line::from(""),
            Line::from(Span::styled("Delete this task?", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(title),
            Line::from(""),
            Line::from("This action cannot be undone."),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.state {
                AppState::TaskList => format!(
                    "{} of {} tasks | Press 'h' for help",
                    self.store.view(self.selector()).len(),
                    self.store.tasks().len()
                ),
                AppState::TaskDetail => "Task Details".to_string(),
                AppState::AddTask => "Add New Task".to_string(),
                AppState::EditTask => "Edit Task".to_string(),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Delete".to_string(),
            }
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(BRAND).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to the view for the current state.
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match self.state {
            AppState::TaskList => self.render_task_list(f, chunks[0]),
            AppState::TaskDetail => self.render_task_detail(f, chunks[0]),
            AppState::AddTask | AppState::EditTask => self.render_task_form(f, chunks[0]),
            AppState::Help => self.render_help(f, chunks[0]),
            AppState::Confirm => {
                self.render_task_list(f, chunks[0]);
                self.render_confirm(f, chunks[0]);
            }
        }
        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop. Runs until the user quits.
    pub fn run<T: Backend>(&mut self, terminal: &mut Terminal<T>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;
            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::db::MemoryBlob;
    use crate::validate::{Field, DUE_DATE_REQUIRED, TITLE_REQUIRED};
    use chrono::NaiveDate;
    use ratatui::backend::TestBackend;

    fn store() -> TaskStore<MemoryBlob, FixedClock> {
        let today = NaiveDate::from_ymd_opt(2023, 12, 19).unwrap();
        TaskStore::open_with_clock(MemoryBlob::new(), FixedClock::on(today))
    }

    fn press(app: &mut App<'_, MemoryBlob, FixedClock>, key: KeyCode) -> bool {
        app.handle_key(key, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App<'_, MemoryBlob, FixedClock>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_initial_view_is_sorted() {
        let mut s = store();
        let app = App::new(&mut s);
        assert_eq!(app.visible_ids(), ["3", "1", "2"]);
        assert_eq!(app.selected_task_id().as_deref(), Some("3"));
    }

    #[test]
    fn test_add_task_through_form() {
        let mut s = store();
        let mut app = App::new(&mut s);
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.state(), AppState::AddTask);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state(), AppState::AddTask);
        assert_eq!(app.task_form.errors.get(Field::Title), Some(TITLE_REQUIRED));
        assert_eq!(app.task_form.errors.get(Field::DueDate), Some(DUE_DATE_REQUIRED));

        type_text(&mut app, "Call plumber");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "2023-12-21");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.state(), AppState::TaskList);
        assert_eq!(app.status_message(), "Task created: Call plumber");
        assert_eq!(app.selected_task_id().as_deref(), Some("4"));
        drop(app);
        assert_eq!(s.stats().total, 4);
        assert_eq!(s.stats().pending, 3);
    }

    #[test]
    fn test_toggle_and_delete_with_confirm() {
        let mut s = store();
        let mut app = App::new(&mut s);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.status_message(), "Task completed: Buy groceries");

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.state(), AppState::Confirm);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.visible_ids().len(), 3);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.state(), AppState::TaskList);
        assert_eq!(app.visible_ids().len(), 2);
        drop(app);
        assert!(s.get("3").is_none());
    }

    #[test]
    fn test_sidebar_switches_view() {
        let mut s = store();
        let mut app = App::new(&mut s);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selector(), &Selector::Pending);
        assert_eq!(app.visible_ids(), ["3", "1"]);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selector(), &Selector::Completed);
        assert_eq!(app.visible_ids(), ["2"]);
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selector(), &Selector::Category("4".into()));
        assert!(app.visible_ids().is_empty());
        assert!(app.selected_task_id().is_none());
    }

    #[test]
    fn test_edit_form_updates_task() {
        let mut s = store();
        let mut app = App::new(&mut s);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state(), AppState::EditTask);
        press(&mut app, KeyCode::Char('!'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.status_message(), "Task updated: Complete project proposal!");
        drop(app);
        assert_eq!(s.get("1").map(|t| t.title.as_str()), Some("Complete project proposal!"));
        assert_eq!(s.tasks().len(), 3);
    }

    #[test]
    fn test_edit_past_due_task_is_rejected() {
        let mut s = store();
        let mut app = App::new(&mut s);
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state(), AppState::EditTask);
        assert_eq!(app.task_form.current_field, DUE_GLOBAL_ORDER);
        assert!(app.task_form.errors.get(Field::DueDate).is_some());
    }

    #[test]
    fn test_renders_every_state() {
        let mut s = store();
        let mut app = App::new(&mut s);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        for key in [KeyCode::Enter, KeyCode::Esc, KeyCode::Char('a'), KeyCode::Esc, KeyCode::Char('h')] {
            terminal.draw(|f| app.render(f)).unwrap();
            press(&mut app, key);
        }
        terminal.draw(|f| app.render(f)).unwrap();
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('d'));
        terminal.draw(|f| app.render(f)).unwrap();
        assert_eq!(app.state(), AppState::Confirm);
    }

    #[test]
    fn test_quit_keys() {
        let mut s = store();
        let mut app = App::new(&mut s);
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
        press(&mut app, KeyCode::Char('h'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.state(), AppState::TaskList);
    }
}
