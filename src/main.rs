mod app;
mod calendar;
mod config;
mod domain;
mod form;
mod logging;
mod popup;
mod ui;

use std::error::Error;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};

use crate::app::{App, ViewMode};
use crate::calendar::format_time_12h;
use crate::config::{resolve_config_path, Settings};
use crate::domain::TaskStore;
use crate::logging::init_logging;
use crate::ui::{month_lines, run_dashboard, week_lines};

#[derive(Debug, Parser)]
#[command(name = "task-calendar", about = "Month and week task calendar for the terminal")]
struct Cli {
	#[arg(long)]
	config: Option<PathBuf>,
	#[arg(long, value_enum)]
	view: Option<ViewMode>,
	#[arg(long)]
	date: Option<String>,
	#[arg(long)]
	no_demo: bool,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Dashboard,
	Month,
	Week,
	Agenda {
		#[arg(long)]
		day: Option<String>,
		#[arg(long)]
		json: bool,
	},
}

fn main() {
	let log_guard = match init_logging() {
		Ok(guard) => Some(guard),
		Err(err) => {
			eprintln!("warning: failed to initialize logging: {err}");
			None
		}
	};

	let result = run();
	drop(log_guard);

	if let Err(err) = result {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	let config_path = resolve_config_path(cli.config);
	let mut settings = Settings::load(&config_path);
	if let Some(view) = cli.view {
		settings.default_view = view;
	}

	let today = Local::now().date_naive();
	let reference = parse_day(cli.date.as_deref())?;
	let store = if settings.seed_demo_tasks && !cli.no_demo {
		TaskStore::with_demo_tasks(today)
	} else {
		TaskStore::new()
	};
	if store.is_empty() {
		debug!("starting without tasks");
	}
	info!(tasks = store.len(), reference = %reference, "starting");

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::Dashboard => {
			let mut app = App::new(store, settings, reference);
			run_dashboard(&mut app)?;
		}
		Command::Month => {
			for line in month_lines(&store, reference) {
				println!("{line}");
			}
		}
		Command::Week => {
			for line in week_lines(&store, reference) {
				println!("{line}");
			}
		}
		Command::Agenda { day, json } => {
			let day = match day {
				Some(raw) => parse_day(Some(&raw))?,
				None => reference,
			};
			print_agenda(&store, day, json)?;
		}
	}

	Ok(())
}

fn parse_day(input: Option<&str>) -> Result<NaiveDate, Box<dyn Error>> {
	if let Some(raw) = input {
		Ok(NaiveDate::parse_from_str(raw, "%Y-%m-%d")?)
	} else {
		Ok(Local::now().date_naive())
	}
}

/// Serialized tasks of one day, with the local date and clock time alongside.
fn agenda_rows(store: &TaskStore, day: NaiveDate) -> Result<Vec<Value>, serde_json::Error> {
	store
		.tasks_on(day)
		.into_iter()
		.map(|task| {
			let mut row = serde_json::to_value(task)?;
			if let Value::Object(fields) = &mut row {
				fields.insert("date".to_string(), Value::String(day.format("%Y-%m-%d").to_string()));
				fields.insert("time".to_string(), Value::String(task.time()));
			}
			Ok(row)
		})
		.collect()
}

fn print_agenda(store: &TaskStore, day: NaiveDate, as_json: bool) -> Result<(), Box<dyn Error>> {
	let tasks = store.tasks_on(day);

	if as_json {
		println!("{}", serde_json::to_string_pretty(&agenda_rows(store, day)?)?);
		return Ok(());
	}

	println!("agenda for {}", day.format("%A, %d %B %Y"));
	if tasks.is_empty() {
		println!("no tasks on this day");
		return Ok(());
	}

	for task in tasks {
		println!(
			"{:>8} | {} | {} | {}",
			format_time_12h(task.local_start().time()),
			task.short_title(),
			task.color,
			task.id
		);
	}

	Ok(())
}
