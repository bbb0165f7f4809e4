use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use thiserror::Error;
use tracing::debug;

use crate::calendar::{parse_date, parse_time};
use crate::domain::{StoreError, Task, TaskColor, TaskDraft, TaskPatch, TaskStore, local_naive_to_utc};
use crate::popup::{Point, Position};

const MAX_FIELD_LEN: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { task_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Date,
    Time,
    Color,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::Title,
        FormField::Description,
        FormField::Date,
        FormField::Time,
        FormField::Color,
    ];

    fn step(self, delta: i32) -> Self {
        let len = Self::ORDER.len() as i32;
        let index = Self::ORDER.iter().position(|field| *field == self).unwrap_or(0) as i32;
        Self::ORDER[(index + delta).rem_euclid(len) as usize]
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Description => "Description",
            FormField::Date => "Date",
            FormField::Time => "Time",
            FormField::Color => "Color",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("title is required")]
    MissingTitle,
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("{0} does not exist in local time")]
    NonexistentLocalTime(NaiveDateTime),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Created(String),
    Updated(String),
}

#[derive(Debug, Clone)]
pub struct TaskForm {
    pub mode: FormMode,
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub color: TaskColor,
    pub focus: FormField,
    pub anchor: Option<Point>,
    pub position: Position,
}

impl TaskForm {
    /// New-task form for the clicked slot; minutes are dropped.
    pub fn create(clicked: NaiveDateTime, anchor: Option<Point>) -> Self {
        Self {
            mode: FormMode::Create,
            title: String::new(),
            description: String::new(),
            date: clicked.date().format("%Y-%m-%d").to_string(),
            time: format!("{:02}:00", clicked.hour()),
            color: TaskColor::default(),
            focus: FormField::Title,
            anchor,
            position: Position::default(),
        }
    }

    pub fn edit(task: &Task, anchor: Option<Point>) -> Self {
        let start = task.local_start();
        Self {
            mode: FormMode::Edit {
                task_id: task.id.clone(),
            },
            title: task.title.clone(),
            description: task.description.clone(),
            date: start.format("%Y-%m-%d").to_string(),
            time: task.time(),
            color: task.color,
            focus: FormField::Title,
            anchor,
            position: Position::default(),
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit { .. })
    }

    pub fn heading(&self) -> &'static str {
        if self.is_edit() { "Edit Task" } else { "Add Task" }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_edit() { "Update" } else { "Add" }
    }

    pub fn next_field(&mut self) {
        self.focus = self.focus.step(1);
    }

    pub fn prev_field(&mut self) {
        self.focus = self.focus.step(-1);
    }

    pub fn cycle_color(&mut self, delta: i32) {
        self.color = self.color.cycle(delta);
    }

    pub fn input_char(&mut self, value: char) {
        if let Some(field) = self.focused_text_mut() {
            if field.chars().count() < MAX_FIELD_LEN {
                field.push(value);
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.focused_text_mut() {
            field.pop();
        }
    }

    /// The text buffer behind the focused field; the color picker has none.
    fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::Date => Some(&mut self.date),
            FormField::Time => Some(&mut self.time),
            FormField::Color => None,
        }
    }

    /// Combines the date and time fields into one instant.
    pub fn starts_at(&self) -> Result<DateTime<Utc>, FormError> {
        let date = parse_date(&self.date).ok_or_else(|| FormError::InvalidDate(self.date.clone()))?;
        let time = parse_time(&self.time).ok_or_else(|| FormError::InvalidTime(self.time.clone()))?;
        let naive = date.and_time(time);
        local_naive_to_utc(naive).ok_or(FormError::NonexistentLocalTime(naive))
    }

    pub fn validate(&self) -> Result<DateTime<Utc>, FormError> {
        if self.title.trim().is_empty() {
            return Err(FormError::MissingTitle);
        }
        self.starts_at()
    }

    pub fn can_submit(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn submit(&self, store: &mut TaskStore) -> Result<FormOutcome, FormError> {
        let starts_at = self.validate()?;
        let title = self.title.trim().to_string();
        let description = self.description.trim().to_string();

        match &self.mode {
            FormMode::Create => {
                let id = store.add(
                    TaskDraft::new(title, starts_at)
                        .with_description(description)
                        .with_color(self.color),
                );
                Ok(FormOutcome::Created(id))
            }
            FormMode::Edit { task_id } => {
                store.update(
                    task_id,
                    TaskPatch {
                        title: Some(title),
                        description: Some(description),
                        starts_at: Some(starts_at),
                        color: Some(self.color),
                    },
                )?;
                debug!(task_id = %task_id, "form saved edits");
                Ok(FormOutcome::Updated(task_id.clone()))
            }
        }
    }
}
