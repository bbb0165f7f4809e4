//! Month and week grid arithmetic.
//!
//! Weeks start on Sunday. Month navigation follows `Date(year, month + delta)`
//! semantics: the result is always the first day of the target month.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike};

use crate::domain::{Task, TaskStore};

pub const HOURS_PER_DAY: u32 = 24;
pub const DAYS_PER_WEEK: usize = 7;
pub const WEEKDAY_LABELS: [&str; DAYS_PER_WEEK] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthCell {
    Empty,
    Day(NaiveDate),
}

impl MonthCell {
    pub fn date(self) -> Option<NaiveDate> {
        match self {
            MonthCell::Empty => None,
            MonthCell::Day(date) => Some(date),
        }
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|date| date.pred_opt())
        .map(|date| date.day())
        .unwrap_or(28)
}

pub fn first_day_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// Number of blank cells before the 1st, 0 when the month starts on Sunday.
pub fn leading_blanks(reference: NaiveDate) -> usize {
    first_day_of_month(reference).weekday().num_days_from_sunday() as usize
}

pub fn month_cells(reference: NaiveDate) -> Vec<MonthCell> {
    let first = first_day_of_month(reference);
    let offset = leading_blanks(first);
    let count = days_in_month(first.year(), first.month());

    let mut cells = vec![MonthCell::Empty; offset];
    cells.extend(
        first
            .iter_days()
            .take(count as usize)
            .map(MonthCell::Day),
    );
    cells
}

pub fn shift_month(reference: NaiveDate, delta: i32) -> NaiveDate {
    let months = reference.year() * 12 + reference.month0() as i32 + delta;
    let year = months.div_euclid(12);
    let month = months.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(reference)
}

pub fn week_start(reference: NaiveDate) -> NaiveDate {
    reference - Duration::days(reference.weekday().num_days_from_sunday() as i64)
}

pub fn week_days(reference: NaiveDate) -> [NaiveDate; DAYS_PER_WEEK] {
    let start = week_start(reference);
    std::array::from_fn(|offset| start + Duration::days(offset as i64))
}

pub fn shift_week(reference: NaiveDate, delta: i32) -> NaiveDate {
    reference + Duration::weeks(delta as i64)
}

pub fn hour_slots() -> impl Iterator<Item = u32> {
    0..HOURS_PER_DAY
}

/// Tasks of one day column, bucketed by start hour.
pub fn bucket_by_hour<'a>(store: &'a TaskStore, day: NaiveDate) -> [Vec<&'a Task>; HOURS_PER_DAY as usize] {
    let mut slots: [Vec<&Task>; HOURS_PER_DAY as usize] = std::array::from_fn(|_| Vec::new());
    for task in store.tasks_on(day) {
        slots[task.local_hour() as usize].push(task);
    }
    slots
}

pub fn month_title(reference: NaiveDate) -> String {
    reference.format("%B %Y").to_string()
}

pub fn week_title(reference: NaiveDate) -> String {
    let days = week_days(reference);
    format!(
        "{} - {}",
        days[0].format("%B %-d"),
        days[DAYS_PER_WEEK - 1].format("%B %-d, %Y")
    )
}

pub fn hour_label(hour: u32) -> String {
    format!("{hour:02}:00")
}

/// Renders a clock time as `h:MM AM/PM`; midnight and noon both show as 12.
pub fn format_time_12h(time: NaiveTime) -> String {
    let hour = time.hour();
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let hour12 = match hour % 12 {
        0 => 12,
        other => other,
    };
    format!("{hour12}:{:02} {suffix}", time.minute())
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let (hours, minutes) = raw.trim().split_once(':')?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return None;
    }
    let hour = hours.parse::<u32>().ok()?;
    let minute = minutes.parse::<u32>().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};

    use crate::domain::{TaskDraft, TaskStore, local_clock_on_date_to_utc};

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn sample_dates() -> impl Iterator<Item = NaiveDate> {
        date(2023, 1, 1).iter_days().step_by(3).take(300)
    }

    #[test]
    fn month_cells_are_offset_plus_days() {
        for reference in sample_dates() {
            let cells = month_cells(reference);
            let offset = leading_blanks(reference);
            let days = days_in_month(reference.year(), reference.month()) as usize;

            assert_eq!(cells.len(), offset + days, "reference {reference}");
            assert!(cells[..offset].iter().all(|cell| *cell == MonthCell::Empty));
            assert!(cells[offset..].iter().all(|cell| cell.date().is_some()));
            assert_eq!(cells[offset].date().map(|day| day.day()), Some(1));
        }
    }

    #[test]
    fn march_2024_starts_on_friday() {
        let cells = month_cells(date(2024, 3, 17));
        assert_eq!(leading_blanks(date(2024, 3, 17)), 5);
        assert_eq!(cells.len(), 36);
        assert_eq!(cells[35], MonthCell::Day(date(2024, 3, 31)));
    }

    #[test]
    fn february_lengths() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 12), 31);
    }

    #[test]
    fn week_days_start_on_sunday_and_are_consecutive() {
        for reference in sample_dates() {
            let days = week_days(reference);
            assert_eq!(days[0].weekday(), Weekday::Sun);
            assert!(days.contains(&reference));
            for pair in days.windows(2) {
                assert_eq!(pair[1] - pair[0], Duration::days(1));
            }
        }
    }

    #[test]
    fn week_navigation_moves_seven_days() {
        let reference = date(2024, 12, 30);
        assert_eq!(shift_week(reference, 1), date(2025, 1, 6));
        assert_eq!(shift_week(reference, -1), date(2024, 12, 23));
    }

    #[test]
    fn twelve_month_steps_land_one_year_later() {
        for reference in sample_dates() {
            let mut cursor = reference;
            for _ in 0..12 {
                cursor = shift_month(cursor, 1);
            }
            assert_eq!(cursor.month(), reference.month());
            assert_eq!(cursor.year(), reference.year() + 1);
        }
    }

    #[test]
    fn month_navigation_does_not_roll_over_short_months() {
        assert_eq!(shift_month(date(2024, 1, 31), 1), date(2024, 2, 1));
        assert_eq!(shift_month(date(2024, 1, 31), -1), date(2023, 12, 1));
        assert_eq!(shift_month(date(2024, 3, 31), -13), date(2023, 2, 1));
    }

    #[test]
    fn formats_twelve_hour_clock() {
        let at = |hour, minute| NaiveTime::from_hms_opt(hour, minute, 0).unwrap();
        assert_eq!(format_time_12h(at(0, 5)), "12:05 AM");
        assert_eq!(format_time_12h(at(12, 0)), "12:00 PM");
        assert_eq!(format_time_12h(at(14, 30)), "2:30 PM");
        assert_eq!(format_time_12h(at(9, 7)), "9:07 AM");
    }

    #[test]
    fn parses_clock_strings() {
        assert_eq!(parse_time("14:30"), NaiveTime::from_hms_opt(14, 30, 0));
        assert_eq!(parse_time("9:05"), NaiveTime::from_hms_opt(9, 5, 0));
        assert_eq!(parse_time("24:00"), None);
        assert_eq!(parse_time("12:5"), None);
        assert_eq!(parse_time("noon"), None);
    }

    #[test]
    fn titles() {
        assert_eq!(month_title(date(2024, 3, 10)), "March 2024");
        assert_eq!(week_title(date(2024, 3, 13)), "March 10 - March 16, 2024");
        assert_eq!(hour_label(7), "07:00");
    }

    #[test]
    fn buckets_tasks_by_start_hour() {
        let mut store = TaskStore::new();
        let day = date(2024, 3, 10);
        let at = |hour, minute| local_clock_on_date_to_utc(day, hour, minute).unwrap();
        store.add(TaskDraft::new("a", at(14, 30)));
        store.add(TaskDraft::new("b", at(14, 0)));
        store.add(TaskDraft::new("c", at(8, 15)));

        let slots = bucket_by_hour(&store, day);
        let titles = |hour: usize| slots[hour].iter().map(|task| task.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles(14), vec!["a", "b"]);
        assert_eq!(titles(8), vec!["c"]);
        assert_eq!(slots.iter().map(Vec::len).sum::<usize>(), 3);
    }
}
