//! Task form handling for the terminal user interface.
//!
//! The form collects a [`TaskDraft`] for a create or an edit. It holds the
//! field errors from the last rejected submit; editing a field clears that
//! field's error.

use crate::fields::Priority;
use crate::task::{Category, Task, DEFAULT_CATEGORY_ID};
use crate::tui::input::InputField;
use crate::validate::{Field, FieldErrors, TaskDraft};

/// Global order constants for form fields.
pub const TITLE_GLOBAL_ORDER: usize = 0;
pub const DESCRIPTION_GLOBAL_ORDER: usize = 1;
pub const DUE_GLOBAL_ORDER: usize = 2;
pub const PRIORITY_GLOBAL_ORDER: usize = 3;
pub const CATEGORY_GLOBAL_ORDER: usize = 4;

const FIELD_COUNT: usize = 5;

/// Task form for adding or editing a task.
pub struct TaskForm {
    pub title: InputField,
    pub description: InputField,
    pub due: InputField,
    pub priority: usize,
    pub category: usize,
    pub current_field: usize,
    pub priorities: Vec<Priority>,
    pub categories: Vec<Category>,
    pub errors: FieldErrors,
    /// Id of the task being edited; `None` for a new task.
    pub editing: Option<String>,
}

impl TaskForm {
    /// An empty form for a new task: medium priority, default category.
    pub fn new(categories: &[Category]) -> Self {
        let priorities = Priority::ALL.to_vec();
        let mut form = Self {
            title: InputField::new(),
            description: InputField::new(),
            due: InputField::new(),
            priority: priorities.iter().position(|&p| p == Priority::default()).unwrap_or(0),
            category: categories.iter().position(|c| c.id == DEFAULT_CATEGORY_ID).unwrap_or(0),
            current_field: TITLE_GLOBAL_ORDER,
            priorities,
            categories: categories.to_vec(),
            errors: FieldErrors::new(),
            editing: None,
        };
        form.update_active_field();
        form
    }

    /// A form populated from an existing task, submitting as an edit.
    pub fn from_task(task: &Task, categories: &[Category]) -> Self {
        let mut form = Self::new(categories);
        form.title = InputField::with_value(&task.title);
        form.description = InputField::with_value(task.description.as_deref().unwrap_or_default());
        form.due = InputField::with_value(
            &task.due_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
        );
        form.priority = form.priorities.iter().position(|&p| p == task.priority).unwrap_or(form.priority);
        // A dangling category keeps the default selection; saving will re-home the task.
        if let Some(i) = form.categories.iter().position(|c| c.id == task.category_id) {
            form.category = i;
        }
        form.editing = Some(task.id.clone());
        form.update_active_field();
        form
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    /// The form contents as an unvalidated draft.
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.value.clone(),
            description: self.description.value.clone(),
            due_date: self.due.value.clone(),
            priority: self.priorities.get(self.priority).copied(),
            category_id: self.categories.get(self.category).map(|c| c.id.clone()),
        }
    }

    pub fn selected_priority(&self) -> Priority {
        self.priorities.get(self.priority).copied().unwrap_or_default()
    }

    pub fn selected_category(&self) -> Option<&Category> {
        self.categories.get(self.category)
    }

    /// The validated field shown at form position `order`.
    pub fn field_at(order: usize) -> Option<Field> {
        match order {
            TITLE_GLOBAL_ORDER => Some(Field::Title),
            DESCRIPTION_GLOBAL_ORDER => Some(Field::Description),
            DUE_GLOBAL_ORDER => Some(Field::DueDate),
            PRIORITY_GLOBAL_ORDER => Some(Field::Priority),
            CATEGORY_GLOBAL_ORDER => Some(Field::Category),
            _ => None,
        }
    }

    /// Show the errors of a rejected submit and jump to the first bad field.
    pub fn set_errors(&mut self, errors: FieldErrors) {
        if let Some(first) = (0..FIELD_COUNT).find(|&i| Self::field_at(i).is_some_and(|f| errors.get(f).is_some())) {
            self.current_field = first;
            self.update_active_field();
        }
        self.errors = errors;
    }

    pub fn error_for(&self, order: usize) -> Option<&str> {
        Self::field_at(order).and_then(|f| self.errors.get(f))
    }

    fn touch(&mut self) {
        if let Some(field) = Self::field_at(self.current_field) {
            self.errors.clear(field);
        }
    }

    fn active_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            TITLE_GLOBAL_ORDER => Some(&mut self.title),
            DESCRIPTION_GLOBAL_ORDER => Some(&mut self.description),
            DUE_GLOBAL_ORDER => Some(&mut self.due),
            _ => None,
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
        self.update_active_field();
    }

    /// Update which field is currently active for editing.
    pub fn update_active_field(&mut self) {
        self.title.active = self.current_field == TITLE_GLOBAL_ORDER;
        self.description.active = self.current_field == DESCRIPTION_GLOBAL_ORDER;
        self.due.active = self.current_field == DUE_GLOBAL_ORDER;
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(input) = self.active_input() {
            input.handle_char(c);
            self.touch();
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(input) = self.active_input() {
            input.handle_backspace();
            self.touch();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(input) = self.active_input() {
            input.handle_delete();
            self.touch();
        }
    }

    /// Move the cursor in a text field, or cycle a selector.
    pub fn handle_left_right(&mut self, right: bool) {
        let cycle = |i: usize, len: usize| {
            if len == 0 {
                0
            } else if right {
                (i + 1) % len
            } else {
                (i + len - 1) % len
            }
        };
        match self.current_field {
            PRIORITY_GLOBAL_ORDER => {
                self.priority = cycle(self.priority, self.priorities.len());
                self.touch();
            }
            CATEGORY_GLOBAL_ORDER => {
                self.category = cycle(self.category, self.categories.len());
                self.touch();
            }
            _ => {
                if let Some(input) = self.active_input() {
                    if right {
                        input.move_cursor_right()
                    } else {
                        input.move_cursor_left()
                    }
                }
            }
        }
    }

    /// Jump to the start or end of the focused text input.
    pub fn handle_home_end(&mut self, end: bool) {
        if let Some(input) = self.active_input() {
            if end {
                input.move_end()
            } else {
                input.move_home()
            }
        }
    }
}
