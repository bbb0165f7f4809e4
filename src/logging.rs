use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::state_dir;

const LOG_LEVEL_ENV: &str = "TASK_CALENDAR_LOG_LEVEL";

/// Routes tracing output to a file; the terminal belongs to the dashboard.
///
/// Buffered lines are flushed when the returned guard is dropped.
pub fn init_logging() -> Result<WorkerGuard, Box<dyn Error>> {
	let (non_blocking, guard, log_file_path) = open_log_writer(&state_dir().join("logs"))?;

	let file_layer = fmt::layer()
		.with_writer(non_blocking)
		.with_ansi(false)
		.with_target(true)
		.with_line_number(true);

	tracing_subscriber::registry()
		.with(build_log_filter())
		.with(file_layer)
		.try_init()?;

	tracing::info!("logging to {}", log_file_path.display());
	Ok(guard)
}

fn open_log_writer(log_dir: &Path) -> Result<(NonBlocking, WorkerGuard, PathBuf), Box<dyn Error>> {
	fs::create_dir_all(log_dir)?;
	let path = log_file_path(log_dir);
	let file = fs::File::create(&path)?;
	let (writer, guard) = tracing_appender::non_blocking(file);
	Ok((writer, guard, path))
}

fn build_log_filter() -> EnvFilter {
	let level = std::env::var(LOG_LEVEL_ENV)
		.ok()
		.and_then(|raw| normalize_log_level(&raw))
		.unwrap_or("warn");
	EnvFilter::new(format!("{level},task_calendar={level}"))
}

fn normalize_log_level(raw: &str) -> Option<&'static str> {
	match raw.trim().to_ascii_lowercase().as_str() {
		"trace" => Some("trace"),
		"debug" => Some("debug"),
		"info" => Some("info"),
		"warn" | "warning" => Some("warn"),
		"error" => Some("error"),
		_ => None,
	}
}

fn log_file_path(log_dir: &Path) -> PathBuf {
	let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
	log_dir.join(format!("task-calendar-{timestamp}.log"))
}
