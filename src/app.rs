//! Top-level view state and the single transition function that applies user
//! intents to it.

use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calendar::{first_day_of_month, shift_month, shift_week};
use crate::config::Settings;
use crate::domain::{StoreError, Task, TaskStore};
use crate::form::{FormError, FormOutcome, TaskForm};
use crate::popup::{Anchor, HideTimer, Point, Position, Size, place_form, place_tooltip};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
	#[default]
	Month,
	Week,
}

impl ViewMode {
	pub fn label(self) -> &'static str {
		match self {
			ViewMode::Month => "Month",
			ViewMode::Week => "Week",
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
	DateSelected {
		at: NaiveDateTime,
		anchor: Option<Point>,
	},
	TaskSelected {
		task_id: String,
		anchor: Option<Point>,
	},
	TaskDeleteRequested {
		task_id: String,
	},
	ConfirmDelete,
	CancelDelete,
	TaskHovered {
		task_id: String,
		anchor: Anchor,
	},
	TaskHoverLeft,
	TooltipEntered,
	TooltipLeft,
	ViewChanged(ViewMode),
	Navigate(i32),
	SelectDay(NaiveDate),
	MoveSelection(i64),
	CycleTask(i32),
	FormSubmit,
	FormCancel,
	ClickOutsideForm,
	Tick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tooltip {
	pub task_id: String,
	pub anchor: Anchor,
	pub position: Position,
}

#[derive(Debug)]
pub struct App {
	pub store: TaskStore,
	pub settings: Settings,
	pub view: ViewMode,
	pub month_cursor: NaiveDate,
	pub week_cursor: NaiveDate,
	pub selected_day: NaiveDate,
	pub selected_task: usize,
	pub form: Option<TaskForm>,
	pub pending_delete: Option<String>,
	pub tooltip: Option<Tooltip>,
	pub viewport: Size,
	pub status: String,
	hide_timer: HideTimer,
}

impl App {
	pub fn new(store: TaskStore, settings: Settings, today: NaiveDate) -> Self {
		Self {
			store,
			view: settings.default_view,
			settings,
			month_cursor: first_day_of_month(today),
			week_cursor: today,
			selected_day: today,
			selected_task: 0,
			form: None,
			pending_delete: None,
			tooltip: None,
			viewport: Size::new(80, 24),
			status: "Ready".to_string(),
			hide_timer: HideTimer::default(),
		}
	}

	/// Open popups are re-placed so a shrinking terminal cannot push them off screen.
	pub fn set_viewport(&mut self, viewport: Size) {
		if self.viewport == viewport {
			return;
		}
		self.viewport = viewport;
		if let Some(form) = self.form.as_mut() {
			form.position = place_form(form.anchor, viewport, &self.settings.popup);
		}
		if let Some(tooltip) = self.tooltip.as_mut() {
			tooltip.position = place_tooltip(tooltip.anchor, viewport, &self.settings.popup);
		}
	}

	pub fn selected_day_tasks(&self) -> Vec<&Task> {
		self.store.tasks_on(self.selected_day)
	}

	pub fn selected_task_id(&self) -> Option<String> {
		self.selected_day_tasks()
			.get(self.selected_task)
			.map(|task| task.id.clone())
	}

	/// How long the event loop may block before the next tick is due.
	pub fn poll_timeout(&self, now: Instant) -> Duration {
		let tick = self.settings.tick_rate();
		self.hide_timer
			.remaining(now)
			.map(|remaining| remaining.min(tick))
			.unwrap_or(tick)
	}

	pub fn dispatch(&mut self, intent: Intent, now: Instant) {
		match intent {
			Intent::DateSelected { at, anchor } => self.open_create_form(at, anchor),
			Intent::TaskSelected { task_id, anchor } => self.open_edit_form(&task_id, anchor),
			Intent::TaskDeleteRequested { task_id } => {
				if self.store.task(&task_id).is_none() {
					self.status = format!("task not found: {task_id}");
				} else if self.settings.confirm_delete {
					self.hide_tooltip();
					self.pending_delete = Some(task_id);
				} else {
					self.delete_task(&task_id);
				}
			}
			Intent::ConfirmDelete => {
				if let Some(task_id) = self.pending_delete.take() {
					self.delete_task(&task_id);
				}
			}
			Intent::CancelDelete => {
				if self.pending_delete.take().is_some() {
					self.status = "Delete cancelled".to_string();
				}
			}
			Intent::TaskHovered { task_id, anchor } => {
				if self.form.is_some() || self.pending_delete.is_some() {
					return;
				}
				self.hide_timer.cancel();
				let unchanged = self
					.tooltip
					.as_ref()
					.is_some_and(|tooltip| tooltip.task_id == task_id && tooltip.anchor == anchor);
				if !unchanged {
					let position = place_tooltip(anchor, self.viewport, &self.settings.popup);
					self.tooltip = Some(Tooltip {
						task_id,
						anchor,
						position,
					});
				}
			}
			Intent::TaskHoverLeft | Intent::TooltipLeft => {
				if self.tooltip.is_some() {
					self.hide_timer.schedule(now, self.settings.hide_delay());
				}
			}
			Intent::TooltipEntered => self.hide_timer.cancel(),
			Intent::ViewChanged(view) => {
				self.view = view;
				self.anchor_cursors();
				self.hide_tooltip();
			}
			Intent::Navigate(delta) => {
				match self.view {
					ViewMode::Month => {
						self.month_cursor = shift_month(self.month_cursor, delta);
						self.selected_day = self.month_cursor;
					}
					ViewMode::Week => {
						self.week_cursor = shift_week(self.week_cursor, delta);
						self.selected_day = shift_week(self.selected_day, delta);
					}
				}
				self.selected_task = 0;
				self.hide_tooltip();
			}
			Intent::SelectDay(day) => {
				self.selected_day = day;
				self.selected_task = 0;
				self.anchor_cursors();
			}
			Intent::MoveSelection(days) => {
				self.selected_day += chrono::Duration::days(days);
				self.selected_task = 0;
				self.anchor_cursors();
			}
			Intent::CycleTask(delta) => {
				let count = self.selected_day_tasks().len();
				if count == 0 {
					self.selected_task = 0;
				} else {
					let next = (self.selected_task as i64 + delta as i64).rem_euclid(count as i64);
					self.selected_task = next as usize;
				}
			}
			Intent::FormSubmit => self.submit_form(),
			Intent::FormCancel | Intent::ClickOutsideForm => {
				if self.form.take().is_some() {
					debug!("form closed without saving");
					self.status = "Edit cancelled".to_string();
				}
			}
			Intent::Tick => {
				if self.hide_timer.fire_if_due(now) {
					self.tooltip = None;
				}
			}
		}
	}

	fn open_create_form(&mut self, at: NaiveDateTime, anchor: Option<Point>) {
		self.hide_tooltip();
		self.selected_day = at.date();
		self.selected_task = 0;
		self.anchor_cursors();

		let mut form = TaskForm::create(at, anchor);
		form.position = place_form(form.anchor, self.viewport, &self.settings.popup);
		debug!(date = %at, "opened create form");
		self.form = Some(form);
	}

	fn open_edit_form(&mut self, task_id: &str, anchor: Option<Point>) {
		let Some(task) = self.store.task(task_id) else {
			self.status = format!("task not found: {task_id}");
			return;
		};

		let mut form = TaskForm::edit(task, anchor);
		form.position = place_form(form.anchor, self.viewport, &self.settings.popup);
		let day = task.local_day();
		let index = self
			.store
			.tasks_on(day)
			.iter()
			.position(|candidate| candidate.id == task_id)
			.unwrap_or(0);

		self.hide_tooltip();
		self.selected_day = day;
		self.selected_task = index;
		self.anchor_cursors();
		debug!(task_id = %task_id, "opened edit form");
		self.form = Some(form);
	}

	fn submit_form(&mut self) {
		let Some(form) = self.form.as_ref() else {
			return;
		};

		match form.submit(&mut self.store) {
			Ok(FormOutcome::Created(id)) => {
				self.status = format!("created task {id}");
				self.form = None;
			}
			Ok(FormOutcome::Updated(id)) => {
				self.status = format!("updated task {id}");
				self.form = None;
			}
			Err(FormError::Store(StoreError::TaskNotFound(id))) => {
				warn!(task_id = %id, "edited task no longer exists");
				self.status = format!("task not found: {id}");
				self.form = None;
			}
			Err(err) => {
				self.status = format!("error: {err}");
			}
		}
	}

	fn delete_task(&mut self, task_id: &str) {
		if self.store.delete(task_id) {
			self.status = format!("deleted task {task_id}");
		} else {
			self.status = format!("task not found: {task_id}");
		}
		if self
			.tooltip
			.as_ref()
			.is_some_and(|tooltip| tooltip.task_id == task_id)
		{
			self.hide_tooltip();
		}
		let count = self.selected_day_tasks().len();
		self.selected_task = self.selected_task.min(count.saturating_sub(1));
		info!(remaining = self.store.len(), "delete handled");
	}

	fn hide_tooltip(&mut self) {
		self.tooltip = None;
		self.hide_timer.cancel();
	}

	fn anchor_cursors(&mut self) {
		self.month_cursor = first_day_of_month(self.selected_day);
		self.week_cursor = self.selected_day;
	}
}

#[cfg(test)]
mod tests {
	use std::time::{Duration, Instant};

	use chrono::NaiveDate;

	use crate::config::Settings;
	use crate::domain::{TaskDraft, TaskStore, local_clock_on_date_to_utc};
	use crate::form::FormField;
	use crate::popup::{Anchor, Point, Size};

	use super::{App, Intent, ViewMode};

	fn day(year: i32, month: u32, day: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(year, month, day).unwrap()
	}

	fn app_with_task() -> (App, String) {
		let mut store = TaskStore::new();
		let id = store.add(TaskDraft::new(
			"Standup",
			local_clock_on_date_to_utc(day(2024, 3, 10), 9, 0).unwrap(),
		));
		let mut app = App::new(store, Settings::default(), day(2024, 3, 10));
		app.set_viewport(Size::new(120, 40));
		(app, id)
	}

	#[test]
	fn date_selected_opens_create_form_and_submit_adds() {
		let (mut app, _) = app_with_task();
		let now = Instant::now();
		let at = day(2024, 3, 12).and_hms_opt(10, 0, 0).unwrap();
		app.dispatch(
			Intent::DateSelected {
				at,
				anchor: Some(Point::new(119, 39)),
			},
			now,
		);

		let form = app.form.as_mut().expect("form should be open");
		assert_eq!(form.date, "2024-03-12");
		assert_eq!(form.time, "10:00");
		assert!(form.position.left + app.settings.popup.form_width <= 120);
		assert!(form.position.top + app.settings.popup.form_height <= 40);
		form.focus = FormField::Title;
		form.input_char('X');

		app.dispatch(Intent::FormSubmit, now);
		assert!(app.form.is_none());
		assert_eq!(app.store.tasks_on(day(2024, 3, 12)).len(), 1);
		assert_eq!(app.selected_day, day(2024, 3, 12));
	}

	#[test]
	fn resize_keeps_open_popups_inside_viewport() {
		let (mut app, id) = app_with_task();
		let now = Instant::now();
		app.set_viewport(Size::new(160, 60));
		app.dispatch(
			Intent::TaskHovered {
				task_id: id,
				anchor: Anchor::new(140, 50, 16, 1),
			},
			now,
		);
		app.dispatch(
			Intent::DateSelected {
				at: day(2024, 3, 12).and_hms_opt(10, 0, 0).unwrap(),
				anchor: Some(Point::new(150, 55)),
			},
			now,
		);
		let before = app.form.as_ref().unwrap().position;

		app.set_viewport(Size::new(80, 24));
		let popup = app.settings.popup;
		let form = app.form.as_ref().expect("form stays open");
		assert_ne!(form.position, before);
		assert!(form.position.left >= 0 && form.position.left + popup.form_width <= 80);
		assert!(form.position.top >= 0 && form.position.top + popup.form_height <= 24);
	}

	#[test]
	fn resize_re_places_visible_tooltip() {
		let (mut app, id) = app_with_task();
		app.set_viewport(Size::new(160, 60));
		app.dispatch(
			Intent::TaskHovered {
				task_id: id,
				anchor: Anchor::new(70, 10, 16, 1),
			},
			Instant::now(),
		);
		assert_eq!(app.tooltip.as_ref().unwrap().position.left, 70);

		app.set_viewport(Size::new(80, 24));
		let tooltip = app.tooltip.as_ref().expect("tooltip stays visible");
		assert!(tooltip.position.left + app.settings.popup.tooltip_width <= 80);
	}

	#[test]
	fn invalid_form_stays_open() {
		let (mut app, _) = app_with_task();
		let now = Instant::now();
		let at = day(2024, 3, 12).and_hms_opt(10, 0, 0).unwrap();
		app.dispatch(Intent::DateSelected { at, anchor: None }, now);
		app.dispatch(Intent::FormSubmit, now);

		assert!(app.form.is_some());
		assert_eq!(app.status, "error: title is required");
		assert_eq!(app.store.len(), 1);
	}

	#[test]
	fn click_outside_discards_edits() {
		let (mut app, id) = app_with_task();
		let now = Instant::now();
		app.dispatch(
			Intent::TaskSelected {
				task_id: id.clone(),
				anchor: None,
			},
			now,
		);
		app.form.as_mut().unwrap().title = "Changed".to_string();
		app.dispatch(Intent::ClickOutsideForm, now);

		assert!(app.form.is_none());
		assert_eq!(app.store.task(&id).unwrap().title, "Standup");
	}

	#[test]
	fn delete_waits_for_confirmation() {
		let (mut app, id) = app_with_task();
		let now = Instant::now();
		app.dispatch(
			Intent::TaskDeleteRequested {
				task_id: id.clone(),
			},
			now,
		);
		assert_eq!(app.pending_delete.as_deref(), Some(id.as_str()));
		app.dispatch(Intent::CancelDelete, now);
		assert_eq!(app.store.len(), 1);

		app.dispatch(
			Intent::TaskDeleteRequested {
				task_id: id.clone(),
			},
			now,
		);
		app.dispatch(Intent::ConfirmDelete, now);
		assert!(app.store.is_empty());
		assert!(app.pending_delete.is_none());
	}

	#[test]
	fn delete_without_confirmation_is_immediate() {
		let (mut app, id) = app_with_task();
		app.settings.confirm_delete = false;
		app.dispatch(Intent::TaskDeleteRequested { task_id: id }, Instant::now());
		assert!(app.store.is_empty());
	}

	#[test]
	fn tooltip_survives_moving_from_task_to_tooltip() {
		let (mut app, id) = app_with_task();
		let start = Instant::now();
		let anchor = Anchor::new(10, 5, 16, 1);
		app.dispatch(
			Intent::TaskHovered {
				task_id: id.clone(),
				anchor,
			},
			start,
		);
		assert!(app.tooltip.is_some());

		app.dispatch(Intent::TaskHoverLeft, start);
		assert_eq!(app.poll_timeout(start), Duration::from_millis(100));
		app.dispatch(Intent::TooltipEntered, start + Duration::from_millis(30));
		app.dispatch(Intent::Tick, start + Duration::from_millis(500));
		assert!(app.tooltip.is_some());

		app.dispatch(Intent::TooltipLeft, start + Duration::from_millis(600));
		app.dispatch(Intent::Tick, start + Duration::from_millis(650));
		assert!(app.tooltip.is_some());
		app.dispatch(Intent::Tick, start + Duration::from_millis(700));
		assert!(app.tooltip.is_none());
	}

	#[test]
	fn rehovering_the_task_cancels_hide() {
		let (mut app, id) = app_with_task();
		let start = Instant::now();
		let anchor = Anchor::new(10, 5, 16, 1);
		app.dispatch(
			Intent::TaskHovered {
				task_id: id.clone(),
				anchor,
			},
			start,
		);
		app.dispatch(Intent::TaskHoverLeft, start);
		app.dispatch(Intent::TaskHovered { task_id: id, anchor }, start + Duration::from_millis(50));
		app.dispatch(Intent::Tick, start + Duration::from_secs(1));
		assert!(app.tooltip.is_some());
	}

	#[test]
	fn navigation_follows_active_view() {
		let (mut app, _) = app_with_task();
		let now = Instant::now();
		for _ in 0..12 {
			app.dispatch(Intent::Navigate(1), now);
		}
		assert_eq!(app.month_cursor, day(2025, 3, 1));

		app.dispatch(Intent::ViewChanged(ViewMode::Week), now);
		app.dispatch(Intent::Navigate(-1), now);
		assert_eq!(app.selected_day, day(2025, 2, 22));
		assert_eq!(app.week_cursor, day(2025, 2, 22));
	}

	#[test]
	fn selecting_unknown_task_reports_not_found() {
		let (mut app, _) = app_with_task();
		app.dispatch(
			Intent::TaskSelected {
				task_id: "nope".to_string(),
				anchor: None,
			},
			Instant::now(),
		);
		assert!(app.form.is_none());
		assert_eq!(app.status, "task not found: nope");
	}

	#[test]
	fn cycle_task_wraps_within_selected_day() {
		let (mut app, _) = app_with_task();
		app.store.add(TaskDraft::new(
			"Lunch",
			local_clock_on_date_to_utc(day(2024, 3, 10), 12, 0).unwrap(),
		));
		let now = Instant::now();
		app.dispatch(Intent::CycleTask(1), now);
		assert_eq!(app.selected_task, 1);
		app.dispatch(Intent::CycleTask(1), now);
		assert_eq!(app.selected_task, 0);
		app.dispatch(Intent::CycleTask(-1), now);
		assert_eq!(app.selected_task, 1);
	}
}
