use std::error::Error;
use std::io;
use std::time::Instant;

use chrono::{Datelike, Local, NaiveDate, NaiveTime};
use crossterm::event::{
	self, DisableMouseCapture, EnableMouseCapture, Event as CEvent, KeyCode, KeyEventKind, MouseButton, MouseEvent,
	MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use tracing::debug;

use crate::app::{App, Intent, Tooltip, ViewMode};
use crate::calendar::{
	bucket_by_hour, format_time_12h, hour_label, hour_slots, month_cells, month_title, parse_time, week_days, week_title, MonthCell,
	DAYS_PER_WEEK, HOURS_PER_DAY, WEEKDAY_LABELS,
};
use crate::domain::{Task, TaskColor, TaskStore};
use crate::form::{FormField, TaskForm};
use crate::popup::{Anchor, Point, Size};

const FOCUSED_BORDER_COLOR: Color = Color::Yellow;
const INACTIVE_BORDER_COLOR: Color = Color::DarkGray;
const TODAY_COLOR: Color = Color::LightBlue;
const TIME_COLUMN_WIDTH: u16 = 6;
const DEFAULT_CREATE_HOUR: u32 = 10;

pub fn run_dashboard(app: &mut App) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	stdout.execute(EnableMouseCapture)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, app);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<(), Box<dyn Error>> {
	let mut hover: Option<HoverZone> = None;

	loop {
		app.dispatch(Intent::Tick, Instant::now());

		let mut hits = HitMap::default();
		terminal.draw(|frame| {
			let area = frame.area();
			app.set_viewport(Size::new(area.width.into(), area.height.into()));
			hits = draw_dashboard(frame, app);
		})?;

		if !event::poll(app.poll_timeout(Instant::now()))? {
			continue;
		}

		match event::read()? {
			CEvent::Key(key) => {
				if key.kind != KeyEventKind::Press {
					continue;
				}
				if handle_key(app, key.code, Instant::now()) {
					break;
				}
			}
			CEvent::Mouse(mouse) => handle_mouse(app, mouse, &hits, &mut hover, Instant::now()),
			CEvent::Resize(width, height) => app.set_viewport(Size::new(width.into(), height.into())),
			_ => {}
		}
	}

	Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitTarget {
	DayCell(NaiveDate),
	HourSlot(NaiveDate, u32),
	Task(String),
	Tooltip,
	TooltipEdit(String),
	TooltipDelete(String),
	Form,
	ConfirmYes,
	ConfirmNo,
}

/// Screen regions drawn in the last frame, topmost last.
#[derive(Debug, Default)]
pub struct HitMap {
	regions: Vec<(Rect, HitTarget)>,
}

impl HitMap {
	fn push(&mut self, area: Rect, target: HitTarget) {
		if area.width > 0 && area.height > 0 {
			self.regions.push((area, target));
		}
	}

	pub fn at(&self, point: Point) -> Option<(Rect, &HitTarget)> {
		self.regions
			.iter()
			.rev()
			.find(|(area, _)| anchor_from_rect(*area).contains(point))
			.map(|(area, target)| (*area, target))
	}

	#[cfg(test)]
	pub fn find(&self, target: &HitTarget) -> Option<Rect> {
		self.regions
			.iter()
			.find(|(_, candidate)| candidate == target)
			.map(|(area, _)| *area)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum HoverZone {
	Task { task_id: String, area: Rect },
	Tooltip,
}

fn hover_zone(hits: &HitMap, point: Point) -> Option<HoverZone> {
	match hits.at(point)? {
		(area, HitTarget::Task(task_id)) => Some(HoverZone::Task {
			task_id: task_id.clone(),
			area,
		}),
		(_, HitTarget::Tooltip | HitTarget::TooltipEdit(_) | HitTarget::TooltipDelete(_)) => Some(HoverZone::Tooltip),
		_ => None,
	}
}

fn hover_intents(previous: Option<&HoverZone>, next: Option<&HoverZone>) -> Vec<Intent> {
	if previous == next {
		return Vec::new();
	}

	let mut intents = Vec::new();
	match previous {
		Some(HoverZone::Task { .. }) => intents.push(Intent::TaskHoverLeft),
		Some(HoverZone::Tooltip) => intents.push(Intent::TooltipLeft),
		None => {}
	}
	match next {
		Some(HoverZone::Task { task_id, area }) => intents.push(Intent::TaskHovered {
			task_id: task_id.clone(),
			anchor: anchor_from_rect(*area),
		}),
		Some(HoverZone::Tooltip) => intents.push(Intent::TooltipEntered),
		None => {}
	}
	intents
}

fn handle_mouse(app: &mut App, mouse: MouseEvent, hits: &HitMap, hover: &mut Option<HoverZone>, now: Instant) {
	let point = Point::new(mouse.column.into(), mouse.row.into());
	match mouse.kind {
		MouseEventKind::Moved => {
			let next = hover_zone(hits, point);
			for intent in hover_intents(hover.as_ref(), next.as_ref()) {
				app.dispatch(intent, now);
			}
			*hover = next;
		}
		MouseEventKind::Down(MouseButton::Left) => {
			if let Some(intent) = click_intent(app, hits, point) {
				debug!(?intent, "mouse click");
				app.dispatch(intent, now);
			}
		}
		_ => {}
	}
}

fn click_intent(app: &App, hits: &HitMap, point: Point) -> Option<Intent> {
	let target = hits.at(point);

	if app.pending_delete.is_some() {
		return match target {
			Some((_, HitTarget::ConfirmYes)) => Some(Intent::ConfirmDelete),
			Some((_, HitTarget::ConfirmNo)) => Some(Intent::CancelDelete),
			_ => None,
		};
	}

	if app.form.is_some() {
		return match target {
			Some((_, HitTarget::Form)) => None,
			_ => Some(Intent::ClickOutsideForm),
		};
	}

	match target? {
		(_, HitTarget::TooltipEdit(task_id)) | (_, HitTarget::Task(task_id)) => Some(Intent::TaskSelected {
			task_id: task_id.clone(),
			anchor: Some(point),
		}),
		(_, HitTarget::TooltipDelete(task_id)) => Some(Intent::TaskDeleteRequested {
			task_id: task_id.clone(),
		}),
		(area, HitTarget::DayCell(date)) => Some(Intent::DateSelected {
			at: date.and_time(clock(DEFAULT_CREATE_HOUR)),
			anchor: Some(anchor_from_rect(area).center()),
		}),
		(area, HitTarget::HourSlot(date, hour)) => Some(Intent::DateSelected {
			at: date.and_time(clock(*hour)),
			anchor: Some(anchor_from_rect(area).center()),
		}),
		(_, HitTarget::Tooltip | HitTarget::Form | HitTarget::ConfirmYes | HitTarget::ConfirmNo) => None,
	}
}

fn handle_key(app: &mut App, code: KeyCode, now: Instant) -> bool {
	if app.pending_delete.is_some() {
		match code {
			KeyCode::Char('y') | KeyCode::Enter => app.dispatch(Intent::ConfirmDelete, now),
			KeyCode::Char('n') | KeyCode::Esc => app.dispatch(Intent::CancelDelete, now),
			_ => {}
		}
		return false;
	}

	if app.form.is_some() {
		match code {
			KeyCode::Esc => app.dispatch(Intent::FormCancel, now),
			KeyCode::Enter => app.dispatch(Intent::FormSubmit, now),
			_ => {
				if let Some(form) = app.form.as_mut() {
					edit_form(form, code);
				}
			}
		}
		return false;
	}

	let intent = match code {
		KeyCode::Char('q') | KeyCode::Esc => return true,
		KeyCode::Char('m') => Intent::ViewChanged(ViewMode::Month),
		KeyCode::Char('w') => Intent::ViewChanged(ViewMode::Week),
		KeyCode::Char('n') | KeyCode::PageDown => Intent::Navigate(1),
		KeyCode::Char('N') | KeyCode::PageUp => Intent::Navigate(-1),
		KeyCode::Char('t') => Intent::SelectDay(Local::now().date_naive()),
		KeyCode::Left | KeyCode::Char('h') => Intent::MoveSelection(-1),
		KeyCode::Right | KeyCode::Char('l') => Intent::MoveSelection(1),
		KeyCode::Up | KeyCode::Char('k') => Intent::MoveSelection(-7),
		KeyCode::Down | KeyCode::Char('j') => Intent::MoveSelection(7),
		KeyCode::Tab => Intent::CycleTask(1),
		KeyCode::BackTab => Intent::CycleTask(-1),
		KeyCode::Enter | KeyCode::Char('a') => Intent::DateSelected {
			at: app.selected_day.and_time(clock(DEFAULT_CREATE_HOUR)),
			anchor: None,
		},
		KeyCode::Char('e') => match app.selected_task_id() {
			Some(task_id) => Intent::TaskSelected { task_id, anchor: None },
			None => {
				app.status = "No task on the selected day".to_string();
				return false;
			}
		},
		KeyCode::Char('d') => match app.selected_task_id() {
			Some(task_id) => Intent::TaskDeleteRequested { task_id },
			None => {
				app.status = "No task on the selected day".to_string();
				return false;
			}
		},
		_ => return false,
	};

	app.dispatch(intent, now);
	false
}

fn edit_form(form: &mut TaskForm, code: KeyCode) {
	match code {
		KeyCode::Tab | KeyCode::Down => form.next_field(),
		KeyCode::BackTab | KeyCode::Up => form.prev_field(),
		KeyCode::Left if form.focus == FormField::Color => form.cycle_color(-1),
		KeyCode::Right if form.focus == FormField::Color => form.cycle_color(1),
		KeyCode::Backspace => form.backspace(),
		KeyCode::Char(value) => form.input_char(value),
		_ => {}
	}
}

fn draw_dashboard(frame: &mut Frame, app: &App) -> HitMap {
	let mut hits = HitMap::default();
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(4), Constraint::Min(10), Constraint::Length(4)])
		.split(frame.area());

	render_header(frame, layout[0], app);
	match app.view {
		ViewMode::Month => render_month(frame, layout[1], app, &mut hits),
		ViewMode::Week => render_week(frame, layout[1], app, &mut hits),
	}
	render_footer(frame, layout[2], app);

	if let Some(tooltip) = &app.tooltip {
		if let Some(task) = app.store.task(&tooltip.task_id) {
			render_tooltip(frame, app, tooltip, task, &mut hits);
		}
	}

	if let Some(form) = &app.form {
		render_form(frame, app, form, &mut hits);
	}

	if let Some(task_id) = &app.pending_delete {
		render_delete_confirm(frame, app, task_id, &mut hits);
	}

	hits
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
	let tab_style = |mode: ViewMode| {
		if app.view == mode {
			Style::default().fg(Color::Black).bg(Color::Blue).add_modifier(Modifier::BOLD)
		} else {
			Style::default().fg(Color::Gray)
		}
	};
	let period = match app.view {
		ViewMode::Month => month_title(app.month_cursor),
		ViewMode::Week => week_title(app.week_cursor),
	};

	let lines = vec![
		Line::from(vec![
			Span::styled(format!(" {} ", ViewMode::Month.label()), tab_style(ViewMode::Month)),
			Span::raw(" "),
			Span::styled(format!(" {} ", ViewMode::Week.label()), tab_style(ViewMode::Week)),
		]),
		Line::from(vec![
			Span::raw("← N  "),
			Span::styled(period, Style::default().add_modifier(Modifier::BOLD)),
			Span::raw("  n →"),
		]),
	];

	let header = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Calendar"));
	frame.render_widget(header, area);
}

fn render_month(frame: &mut Frame, area: Rect, app: &App, hits: &mut HitMap) {
	let cells = month_cells(app.month_cursor);
	let rows = cells.len().div_ceil(DAYS_PER_WEEK) as u16;
	let today = Local::now().date_naive();

	let sections = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(1), Constraint::Min(rows)])
		.split(area);
	let col_width = sections[0].width / DAYS_PER_WEEK as u16;
	let row_height = (sections[1].height / rows.max(1)).max(1);

	for (index, label) in WEEKDAY_LABELS.iter().enumerate() {
		let rect = Rect::new(sections[0].x + index as u16 * col_width, sections[0].y, col_width, 1);
		let header = Paragraph::new(Line::from(Span::styled(*label, Style::default().fg(Color::Gray))))
			.alignment(ratatui::layout::Alignment::Center);
		frame.render_widget(header, rect);
	}

	for (index, cell) in cells.iter().enumerate() {
		let row = (index / DAYS_PER_WEEK) as u16;
		let col = (index % DAYS_PER_WEEK) as u16;
		let rect = Rect::new(
			sections[1].x + col * col_width,
			sections[1].y + row * row_height,
			col_width,
			row_height,
		)
		.intersection(sections[1]);

		let MonthCell::Day(date) = *cell else {
			continue;
		};

		let selected = date == app.selected_day;
		let number_style = if date == today {
			Style::default().fg(TODAY_COLOR).add_modifier(Modifier::BOLD)
		} else {
			Style::default().fg(Color::Gray)
		};
		let block = Block::default()
			.borders(Borders::ALL)
			.border_style(border_style(selected))
			.title(Span::styled(format!("{}", date.day()), number_style));
		let inner = block.inner(rect);
		frame.render_widget(block, rect);
		hits.push(rect, HitTarget::DayCell(date));

		let tasks = app.store.tasks_on(date);
		let capacity = inner.height as usize;
		for (line_index, task) in tasks.iter().enumerate() {
			let line_y = inner.y + line_index as u16;
			if line_index + 1 == capacity && tasks.len() > capacity {
				let more = Paragraph::new(format!("+{} more", tasks.len() - line_index));
				frame.render_widget(more, Rect::new(inner.x, line_y, inner.width, 1));
				break;
			}
			if line_index >= capacity {
				break;
			}

			let label = format!("{} {}", format_time_12h(task.local_start().time()), task.short_title());
			let line_rect = Rect::new(inner.x, line_y, inner.width, 1);
			let highlighted = selected && line_index == app.selected_task;
			frame.render_widget(
				Paragraph::new(truncate(&label, inner.width as usize)).style(task_style(task.color, highlighted)),
				line_rect,
			);
			hits.push(line_rect, HitTarget::Task(task.id.clone()));
		}
	}
}

fn render_week(frame: &mut Frame, area: Rect, app: &App, hits: &mut HitMap) {
	let block = Block::default().borders(Borders::ALL).border_style(border_style(false));
	let inner = block.inner(area);
	frame.render_widget(block, area);

	let days = week_days(app.week_cursor);
	let today = Local::now().date_naive();
	let col_width = inner.width.saturating_sub(TIME_COLUMN_WIDTH) / DAYS_PER_WEEK as u16;
	let visible_hours = (inner.height.saturating_sub(1) as u32).min(HOURS_PER_DAY);
	let first_hour = first_visible_hour(visible_hours);

	for (index, date) in days.iter().enumerate() {
		let x = inner.x + TIME_COLUMN_WIDTH + index as u16 * col_width;
		let style = if *date == app.selected_day {
			Style::default().fg(FOCUSED_BORDER_COLOR).add_modifier(Modifier::BOLD)
		} else if *date == today {
			Style::default().fg(TODAY_COLOR)
		} else {
			Style::default().fg(Color::Gray)
		};
		let label = format!("{} {}", WEEKDAY_LABELS[index], date.day());
		frame.render_widget(
			Paragraph::new(Span::styled(label, style)),
			Rect::new(x, inner.y, col_width, 1),
		);
	}

	let buckets = days.map(|date| bucket_by_hour(&app.store, date));
	let day_tasks = days.map(|date| app.store.tasks_on(date));

	for (row, hour) in hour_slots().skip(first_hour as usize).take(visible_hours as usize).enumerate() {
		let y = inner.y + 1 + row as u16;
		frame.render_widget(
			Paragraph::new(Span::styled(hour_label(hour), Style::default().fg(Color::DarkGray))),
			Rect::new(inner.x, y, TIME_COLUMN_WIDTH, 1),
		);

		for (index, date) in days.iter().enumerate() {
			let slot = Rect::new(inner.x + TIME_COLUMN_WIDTH + index as u16 * col_width, y, col_width, 1);
			hits.push(slot, HitTarget::HourSlot(*date, hour));

			let tasks = &buckets[index][hour as usize];
			if tasks.is_empty() {
				frame.render_widget(
					Paragraph::new(Span::styled("·", Style::default().fg(Color::DarkGray))),
					slot,
				);
				continue;
			}

			let share = (slot.width / tasks.len() as u16).max(1);
			for (position, task) in tasks.iter().enumerate() {
				let offset = position as u16 * share;
				if offset >= slot.width {
					break;
				}
				let task_rect = Rect::new(slot.x + offset, y, share.min(slot.width - offset), 1);
				let highlighted = *date == app.selected_day
					&& day_tasks[index]
						.get(app.selected_task)
						.is_some_and(|selected| selected.id == task.id);
				frame.render_widget(
					Paragraph::new(truncate(&task.short_title(), task_rect.width as usize))
						.style(task_style(task.color, highlighted)),
					task_rect,
				);
				hits.push(task_rect, HitTarget::Task(task.id.clone()));
			}
		}
	}
}

/// Working hours stay on screen when the grid cannot show the whole day.
fn first_visible_hour(visible_hours: u32) -> u32 {
	if visible_hours >= HOURS_PER_DAY {
		0
	} else {
		7u32.min(HOURS_PER_DAY - visible_hours)
	}
}

fn render_tooltip(frame: &mut Frame, app: &App, tooltip: &Tooltip, task: &Task, hits: &mut HitMap) {
	let size = app.settings.popup.tooltip_size();
	let area = clamp_rect(frame.area(), tooltip.position.left, tooltip.position.top, size);
	frame.render_widget(Clear, area);

	let block = Block::default()
		.borders(Borders::ALL)
		.border_style(Style::default().fg(task_color(task.color)));
	let inner = block.inner(area);
	let mut lines = vec![Line::from(Span::styled(
		task.title.clone(),
		Style::default().add_modifier(Modifier::BOLD),
	))];
	if !task.description.is_empty() {
		lines.push(Line::from(Span::styled(
			task.description.clone(),
			Style::default().fg(Color::Gray),
		)));
	}
	lines.push(Line::from(Span::styled(
		format_time_12h(task.local_start().time()),
		Style::default().fg(Color::Gray),
	)));
	frame.render_widget(Paragraph::new(lines).block(block), area);
	hits.push(area, HitTarget::Tooltip);

	if inner.height == 0 {
		return;
	}
	let button_y = inner.y + inner.height - 1;
	let edit = Rect::new(inner.x, button_y, 6, 1).intersection(inner);
	let delete = Rect::new(inner.x + 7, button_y, 8, 1).intersection(inner);
	frame.render_widget(
		Paragraph::new("[Edit]").style(Style::default().fg(Color::Black).bg(Color::Blue)),
		edit,
	);
	frame.render_widget(
		Paragraph::new("[Delete]").style(Style::default().fg(Color::Black).bg(Color::Red)),
		delete,
	);
	hits.push(edit, HitTarget::TooltipEdit(task.id.clone()));
	hits.push(delete, HitTarget::TooltipDelete(task.id.clone()));
}

fn render_form(frame: &mut Frame, app: &App, form: &TaskForm, hits: &mut HitMap) {
	let full = frame.area();
	frame
		.buffer_mut()
		.set_style(full, Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM));

	let area = clamp_rect(full, form.position.left, form.position.top, app.settings.popup.form_size());
	frame.render_widget(Clear, area);
	hits.push(area, HitTarget::Form);

	let block = Block::default()
		.borders(Borders::ALL)
		.title(form.heading())
		.border_style(border_style(true));
	let value_width = block.inner(area).width.saturating_sub(14) as usize;

	let mut lines = Vec::new();
	for field in [FormField::Title, FormField::Description, FormField::Date, FormField::Time] {
		let value = match field {
			FormField::Title => form.title.as_str(),
			FormField::Description => form.description.as_str(),
			FormField::Date => form.date.as_str(),
			FormField::Time | FormField::Color => form.time.as_str(),
		};
		let focused = form.focus == field;
		let mut shown = tail(value, value_width.saturating_sub(1));
		if focused {
			shown.push('▏');
		}
		let mut spans = vec![
			Span::styled(format!("{:<13} ", field.label()), label_style(focused)),
			Span::styled(shown, value_style(focused)),
		];
		if field == FormField::Time {
			if let Some(time) = parse_time(&form.time) {
				spans.push(Span::styled(
					format!("  ({})", format_time_12h(time)),
					Style::default().fg(Color::DarkGray),
				));
			}
		}
		lines.push(Line::from(spans));
	}

	let mut swatches = vec![Span::styled(
		format!("{:<13} ", FormField::Color.label()),
		label_style(form.focus == FormField::Color),
	)];
	for color in TaskColor::PALETTE {
		let marker = if color == form.color { "[●]" } else { " ● " };
		swatches.push(Span::styled(marker, Style::default().fg(task_color(color))));
	}
	lines.push(Line::from(swatches));
	lines.push(Line::from(""));

	match form.validate() {
		Ok(_) => lines.push(Line::from(Span::styled(
			format!("Enter {} | Esc cancel", form.submit_label()),
			Style::default().fg(Color::Green),
		))),
		Err(err) => lines.push(Line::from(Span::styled(
			format!("{err} ({} disabled)", form.submit_label()),
			Style::default().fg(Color::LightRed),
		))),
	}
	lines.push(Line::from(Span::styled(
		"Tab/↑↓ field | ←→ color | Esc cancel",
		Style::default().fg(Color::DarkGray),
	)));

	frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_delete_confirm(frame: &mut Frame, app: &App, task_id: &str, hits: &mut HitMap) {
	let area = centered_rect(50, 25, frame.area());
	frame.render_widget(Clear, area);
	let title = app
		.store
		.task(task_id)
		.map(Task::short_title)
		.unwrap_or_else(|| task_id.to_string());

	let block = Block::default()
		.borders(Borders::ALL)
		.title("Delete task")
		.border_style(Style::default().fg(Color::Red));
	let inner = block.inner(area);
	let lines = vec![
		Line::from(format!("Delete '{title}'?")),
		Line::from(""),
		Line::from(vec![
			Span::raw("  "),
			Span::styled("[y] Delete", Style::default().fg(Color::Black).bg(Color::Red)),
			Span::raw("    "),
			Span::styled("[n] Cancel", Style::default().fg(Color::Black).bg(Color::Gray)),
		]),
	];
	frame.render_widget(Paragraph::new(lines).block(block), area);

	let button_y = inner.y + 2;
	hits.push(Rect::new(inner.x + 2, button_y, 10, 1).intersection(inner), HitTarget::ConfirmYes);
	hits.push(Rect::new(inner.x + 16, button_y, 10, 1).intersection(inner), HitTarget::ConfirmNo);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let help = if app.pending_delete.is_some() {
		"y/Enter delete | n/Esc cancel"
	} else if let Some(form) = &app.form {
		if form.can_submit() {
			"type to edit | Tab next field | Enter save | Esc or click outside to cancel"
		} else {
			"type to edit | Tab next field | Esc or click outside to cancel"
		}
	} else {
		"m/w view | n/N next/prev | arrows/hjkl day | Tab task | Enter/a add | e edit | d delete | t today | q quit"
	};
	let lines = vec![Line::from(help), Line::from(app.status.clone())];
	let footer = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn clamp_rect(area: Rect, left: i32, top: i32, size: Size) -> Rect {
	let clamp = |value: i32| value.clamp(0, u16::MAX as i32) as u16;
	Rect::new(
		area.x.saturating_add(clamp(left)),
		area.y.saturating_add(clamp(top)),
		clamp(size.width),
		clamp(size.height),
	)
	.intersection(area)
}

fn anchor_from_rect(area: Rect) -> Anchor {
	Anchor::new(area.x.into(), area.y.into(), area.width.into(), area.height.into())
}

fn clock(hour: u32) -> NaiveTime {
	NaiveTime::from_hms_opt(hour.min(HOURS_PER_DAY - 1), 0, 0).unwrap_or(NaiveTime::MIN)
}

fn truncate(text: &str, width: usize) -> String {
	text.chars().take(width).collect()
}

fn tail(text: &str, width: usize) -> String {
	let count = text.chars().count();
	text.chars().skip(count.saturating_sub(width)).collect()
}

fn border_style(focused: bool) -> Style {
	if focused {
		Style::default()
			.fg(FOCUSED_BORDER_COLOR)
			.add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(INACTIVE_BORDER_COLOR)
	}
}

fn label_style(focused: bool) -> Style {
	if focused {
		Style::default().fg(FOCUSED_BORDER_COLOR).add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(Color::Gray)
	}
}

fn value_style(focused: bool) -> Style {
	if focused {
		Style::default().fg(Color::White).bg(Color::Rgb(42, 45, 52))
	} else {
		Style::default().fg(Color::White)
	}
}

fn task_style(color: TaskColor, highlighted: bool) -> Style {
	let style = Style::default().fg(Color::Black).bg(task_color(color));
	if highlighted {
		style.add_modifier(Modifier::BOLD | Modifier::REVERSED)
	} else {
		style
	}
}

fn task_color(color: TaskColor) -> Color {
	match color {
		TaskColor::Blue => Color::Blue,
		TaskColor::Green => Color::Green,
		TaskColor::Yellow => Color::Yellow,
		TaskColor::Purple => Color::Magenta,
		TaskColor::Pink => Color::LightMagenta,
		TaskColor::Red => Color::Red,
	}
}

pub fn month_lines(store: &TaskStore, reference: NaiveDate) -> Vec<String> {
	let cells = month_cells(reference);
	let mut lines = vec![month_title(reference), WEEKDAY_LABELS.join(" ")];

	for week in cells.chunks(DAYS_PER_WEEK) {
		let row = week
			.iter()
			.map(|cell| match cell {
				MonthCell::Empty => "   ".to_string(),
				MonthCell::Day(date) => {
					let marker = if store.tasks_on(*date).is_empty() { ' ' } else { '*' };
					format!("{:>2}{marker}", date.day())
				}
			})
			.collect::<Vec<_>>()
			.join(" ");
		lines.push(row.trim_end().to_string());
	}

	for date in cells.iter().filter_map(|cell| cell.date()) {
		for task in store.tasks_on(date) {
			lines.push(task_line(date, task));
		}
	}

	lines
}

pub fn week_lines(store: &TaskStore, reference: NaiveDate) -> Vec<String> {
	let mut lines = vec![week_title(reference)];
	for (index, date) in week_days(reference).iter().enumerate() {
		lines.push(format!("{} {}", WEEKDAY_LABELS[index], date.format("%Y-%m-%d")));
		let mut any = false;
		for hour in hour_slots() {
			for task in store.tasks_in_hour(*date, hour) {
				any = true;
				lines.push(format!(
					"  {} {} [{}]",
					hour_label(hour),
					task.short_title(),
					task.color
				));
			}
		}
		if !any {
			lines.push("  (no tasks)".to_string());
		}
	}
	lines
}

fn task_line(date: NaiveDate, task: &Task) -> String {
	format!(
		"{} {:>8} {} [{}]",
		date.format("%Y-%m-%d"),
		format_time_12h(task.local_start().time()),
		task.short_title(),
		task.color
	)
}

#[cfg(test)]
mod tests {
	use std::time::Instant;

	use chrono::NaiveDate;
	use ratatui::backend::TestBackend;
	use ratatui::layout::Rect;
	use ratatui::Terminal;

	use crate::app::{App, Intent, ViewMode};
	use crate::config::Settings;
	use crate::domain::{TaskColor, TaskDraft, TaskStore, local_clock_on_date_to_utc};
	use crate::popup::{Point, Size};

	use super::{click_intent, draw_dashboard, hover_intents, month_lines, week_lines, HitMap, HitTarget, HoverZone};

	fn day(year: i32, month: u32, day: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(year, month, day).unwrap()
	}

	fn sample_app() -> (App, String) {
		let mut store = TaskStore::new();
		let id = store.add(
			TaskDraft::new("Dentist", local_clock_on_date_to_utc(day(2024, 3, 10), 14, 30).unwrap())
				.with_color(TaskColor::Pink),
		);
		(App::new(store, Settings::default(), day(2024, 3, 10)), id)
	}

	fn draw(app: &mut App, width: u16, height: u16) -> HitMap {
		let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
		let mut hits = HitMap::default();
		terminal
			.draw(|frame| {
				let area = frame.area();
				app.set_viewport(Size::new(area.width.into(), area.height.into()));
				hits = draw_dashboard(frame, app);
			})
			.unwrap();
		hits
	}

	#[test]
	fn month_view_maps_every_day_and_task() {
		let (mut app, id) = sample_app();
		let hits = draw(&mut app, 120, 48);

		for date in day(2024, 3, 1).iter_days().take(31) {
			assert!(hits.find(&HitTarget::DayCell(date)).is_some(), "missing {date}");
		}
		let task_rect = hits.find(&HitTarget::Task(id.clone())).expect("task should be drawn");
		let day_rect = hits.find(&HitTarget::DayCell(day(2024, 3, 10))).unwrap();
		assert!(task_rect.y > day_rect.y && task_rect.y < day_rect.y + day_rect.height);

		let point = Point::new(task_rect.x.into(), task_rect.y.into());
		assert_eq!(
			click_intent(&app, &hits, point),
			Some(Intent::TaskSelected {
				task_id: id,
				anchor: Some(point),
			})
		);
	}

	#[test]
	fn week_view_buckets_task_into_its_hour() {
		let (mut app, id) = sample_app();
		app.dispatch(Intent::ViewChanged(ViewMode::Week), Instant::now());
		let hits = draw(&mut app, 120, 40);

		let slot = hits.find(&HitTarget::HourSlot(day(2024, 3, 10), 14)).expect("slot drawn");
		let task = hits.find(&HitTarget::Task(id)).expect("task drawn");
		assert_eq!(slot.y, task.y);
		assert!(task.x >= slot.x && task.x < slot.x + slot.width);
	}

	#[test]
	fn clicking_an_empty_day_opens_form_at_ten() {
		let (mut app, _) = sample_app();
		let hits = draw(&mut app, 120, 48);
		let rect = hits.find(&HitTarget::DayCell(day(2024, 3, 20))).unwrap();
		let point = Point::new(i32::from(rect.x) + 1, i32::from(rect.y) + i32::from(rect.height) - 1);

		let intent = click_intent(&app, &hits, point).expect("click should map to an intent");
		let Intent::DateSelected { at, anchor } = intent.clone() else {
			panic!("expected date selection, got {intent:?}");
		};
		assert_eq!(at, day(2024, 3, 20).and_hms_opt(10, 0, 0).unwrap());
		assert!(anchor.is_some());

		app.dispatch(intent, Instant::now());
		let hits = draw(&mut app, 120, 48);
		let form = hits.find(&HitTarget::Form).expect("form drawn");
		assert_eq!(
			click_intent(&app, &hits, Point::new(form.x.into(), form.y.into())),
			None
		);
		assert_eq!(
			click_intent(&app, &hits, Point::new(0, 0)),
			Some(Intent::ClickOutsideForm)
		);
	}

	#[test]
	fn hover_moves_between_task_and_tooltip() {
		let area = Rect::new(4, 4, 10, 1);
		let task = HoverZone::Task {
			task_id: "abc".to_string(),
			area,
		};

		assert!(hover_intents(Some(&task), Some(&task)).is_empty());
		assert_eq!(
			hover_intents(Some(&task), Some(&HoverZone::Tooltip)),
			vec![Intent::TaskHoverLeft, Intent::TooltipEntered]
		);
		assert_eq!(hover_intents(Some(&HoverZone::Tooltip), None), vec![Intent::TooltipLeft]);
		assert!(matches!(
			hover_intents(None, Some(&task)).as_slice(),
			[Intent::TaskHovered { task_id, .. }] if task_id == "abc"
		));
	}

	#[test]
	fn text_renderings_mark_task_days() {
		let (app, _) = sample_app();
		let month = month_lines(&app.store, day(2024, 3, 1));
		assert_eq!(month[0], "March 2024");
		assert!(month.iter().any(|line| line.contains("10*")));
		assert!(month.iter().any(|line| line.contains("2:30 PM Dentist [pink]")));

		let week = week_lines(&app.store, day(2024, 3, 13));
		assert_eq!(week[0], "March 10 - March 16, 2024");
		assert!(week.contains(&"  14:00 Dentist [pink]".to_string()));
		assert_eq!(week.iter().filter(|line| *line == "  (no tasks)").count(), 6);
	}
}
