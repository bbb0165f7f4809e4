use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

const ID_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskColor {
    #[default]
    Blue,
    Green,
    Yellow,
    Purple,
    Pink,
    Red,
}

impl TaskColor {
    pub const PALETTE: [TaskColor; 6] = [
        TaskColor::Blue,
        TaskColor::Green,
        TaskColor::Yellow,
        TaskColor::Purple,
        TaskColor::Pink,
        TaskColor::Red,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TaskColor::Blue => "blue",
            TaskColor::Green => "green",
            TaskColor::Yellow => "yellow",
            TaskColor::Purple => "purple",
            TaskColor::Pink => "pink",
            TaskColor::Red => "red",
        }
    }

    /// Steps through the palette, wrapping at both ends.
    pub fn cycle(self, delta: i32) -> TaskColor {
        let len = Self::PALETTE.len() as i32;
        let index = Self::PALETTE
            .iter()
            .position(|color| *color == self)
            .unwrap_or(0) as i32;
        Self::PALETTE[(index + delta).rem_euclid(len) as usize]
    }
}

impl Display for TaskColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown task color '{0}', expected one of blue, green, yellow, purple, pink, red")]
pub struct ColorParseError(pub String);

impl FromStr for TaskColor {
    type Err = ColorParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::PALETTE
            .iter()
            .copied()
            .find(|color| color.name() == normalized)
            .ok_or_else(|| ColorParseError(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub color: TaskColor,
}

impl Task {
    pub fn local_start(&self) -> DateTime<Local> {
        self.starts_at.with_timezone(&Local)
    }

    pub fn local_day(&self) -> NaiveDate {
        self.local_start().date_naive()
    }

    pub fn local_hour(&self) -> u32 {
        self.local_start().hour()
    }

    /// Clock time as stored for display, `HH:MM` in local time.
    pub fn time(&self) -> String {
        self.local_start().format("%H:%M").to_string()
    }

    pub fn short_title(&self) -> String {
        self.title
            .lines()
            .next()
            .unwrap_or("(untitled)")
            .to_string()
    }
}

/// A task that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub color: TaskColor,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, starts_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            starts_at,
            color: TaskColor::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_color(mut self, color: TaskColor) -> Self {
        self.color = color;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub color: Option<TaskColor>,
}

impl TaskPatch {
    fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(starts_at) = self.starts_at {
            task.starts_at = starts_at;
        }
        if let Some(color) = self.color {
            task.color = color;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    TaskNotFound(String),
}

#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with a handful of tasks around `today`.
    pub fn with_demo_tasks(today: NaiveDate) -> Self {
        let mut store = Self::new();
        let at = |offset_days: i64, hour: u32| {
            local_clock_on_date_to_utc(today + Duration::days(offset_days), hour, 0)
        };

        let demo = [
            (
                "Team Meeting",
                "Weekly sync with the development team",
                at(0, 10),
                TaskColor::Blue,
            ),
            (
                "Project Review",
                "Review Q1 project milestones",
                at(0, 14),
                TaskColor::Purple,
            ),
            ("Client Call", "Product demo with client", at(1, 11), TaskColor::Green),
            (
                "Team Meeting-45",
                "Weekly sync with the development team",
                at(2, 11),
                TaskColor::Green,
            ),
            (
                "Planning Session",
                "Sprint planning for next week",
                at(2, 9),
                TaskColor::Yellow,
            ),
        ];

        for (title, description, starts_at, color) in demo {
            if let Ok(starts_at) = starts_at {
                store.add(
                    TaskDraft::new(title, starts_at)
                        .with_description(description)
                        .with_color(color),
                );
            }
        }

        debug!(count = store.len(), "seeded demo tasks");
        store
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn add(&mut self, draft: TaskDraft) -> String {
        let mut id = generate_id();
        while self.task(&id).is_some() {
            id = generate_id();
        }

        info!(task_id = %id, title = %draft.title, "task added");
        self.tasks.push(Task {
            id: id.clone(),
            title: draft.title,
            description: draft.description,
            starts_at: draft.starts_at,
            color: draft.color,
        });
        id
    }

    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<(), StoreError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))?;
        patch.apply(task);
        info!(task_id = %id, "task updated");
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        let removed = self.tasks.len() != before;
        if removed {
            info!(task_id = %id, "task deleted");
        }
        removed
    }

    /// Tasks whose start falls on `day` in local time, in insertion order.
    pub fn tasks_on(&self, day: NaiveDate) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.local_day() == day)
            .collect()
    }

    pub fn tasks_in_hour(&self, day: NaiveDate, hour: u32) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.local_day() == day && task.local_hour() == hour)
            .collect()
    }
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

pub fn local_naive_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(local_datetime) => Some(local_datetime.with_timezone(&Utc)),
        LocalResult::Ambiguous(first, second) => Some(first.min(second).with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

pub fn local_clock_on_date_to_utc(day: NaiveDate, hour: u32, minute: u32) -> Result<DateTime<Utc>, String> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| "invalid clock time".to_string())?;
    local_naive_to_utc(day.and_time(time))
        .ok_or_else(|| "selected local time does not exist".to_string())
}
