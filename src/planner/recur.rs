use chrono::{DateTime, Datelike, Local, NaiveDate, Timelike};
use uuid::Uuid;

use super::drag::at_day_minutes;
use super::event::PlanEvent;

/// Hard cap on one expansion, whatever the form asks for.
pub const MAX_OCCURRENCES: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repeat {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Repeat {
    pub fn label(&self) -> &'static str {
        match self {
            Repeat::None => "none",
            Repeat::Daily => "daily",
            Repeat::Weekly => "weekly",
            Repeat::Monthly => "monthly",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Repeat::None => Repeat::Daily,
            Repeat::Daily => Repeat::Weekly,
            Repeat::Weekly => Repeat::Monthly,
            Repeat::Monthly => Repeat::None,
        }
    }
}

/// Expand `template` into a bounded series. The template itself is the
/// first occurrence; each later one is a copy with a fresh id and a
/// shifted interval. `Repeat::None` or `count <= 1` yields the template
/// alone.
pub fn expand(template: PlanEvent, repeat: Repeat, count: usize) -> Vec<PlanEvent> {
    let count = count.clamp(1, MAX_OCCURRENCES);
    if repeat == Repeat::None {
        return vec![template];
    }

    let mut series = Vec::with_capacity(count);
    for i in 0..count {
        if i == 0 {
            series.push(template.clone());
            continue;
        }
        let mut occurrence = template.clone();
        occurrence.id = Uuid::new_v4().to_string();
        occurrence.start = shift(template.start, repeat, i as i32);
        occurrence.end = occurrence.start + template.duration();
        series.push(occurrence);
    }
    series
}

fn shift(start: DateTime<Local>, repeat: Repeat, steps: i32) -> DateTime<Local> {
    let minutes = start.hour() * 60 + start.minute();
    let date = match repeat {
        Repeat::None => start.date_naive(),
        Repeat::Daily => start.date_naive() + chrono::Duration::days(steps as i64),
        Repeat::Weekly => start.date_naive() + chrono::Duration::weeks(steps as i64),
        Repeat::Monthly => add_months(start.date_naive(), steps),
    };
    at_day_minutes(date, minutes)
}

/// Month arithmetic with day-of-month clamping (Jan 31 + 1 month = Feb 28).
pub(crate) fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + months;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).expect("valid clamped date")
}

fn days_in_month(year: i32, month: u32) -> u32 {
    if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("valid date")
    .signed_duration_since(NaiveDate::from_ymd_opt(year, month, 1).expect("valid date"))
    .num_days() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn template(y: i32, mo: u32, d: u32) -> PlanEvent {
        PlanEvent::new(
            "standup",
            Local.with_ymd_and_hms(y, mo, d, 9, 0, 0).unwrap(),
            Local.with_ymd_and_hms(y, mo, d, 9, 30, 0).unwrap(),
        )
    }

    #[test]
    fn daily_expansion_spaces_by_one_day() {
        let series = expand(template(2025, 6, 10), Repeat::Daily, 3);
        assert_eq!(series.len(), 3);
        for (i, ev) in series.iter().enumerate() {
            assert_eq!(ev.start.date_naive().day(), 10 + i as u32);
            assert_eq!(ev.duration().num_minutes(), 30);
        }
        let ids: HashSet<_> = series.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn weekly_expansion_keeps_the_weekday() {
        let series = expand(template(2025, 6, 10), Repeat::Weekly, 4);
        let weekday = series[0].start.weekday();
        assert!(series.iter().all(|e| e.start.weekday() == weekday));
        assert_eq!(series[3].start.date_naive(), NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
    }

    #[test]
    fn monthly_expansion_clamps_short_months() {
        let series = expand(template(2025, 1, 31), Repeat::Monthly, 4);
        let dates: Vec<NaiveDate> = series.iter().map(|e| e.start.date_naive()).collect();
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(dates[2], NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
        assert_eq!(dates[3], NaiveDate::from_ymd_opt(2025, 4, 30).unwrap());
    }

    #[test]
    fn monthly_expansion_crosses_year_end() {
        let series = expand(template(2025, 11, 15), Repeat::Monthly, 3);
        assert_eq!(
            series[2].start.date_naive(),
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
        );
    }

    #[test]
    fn count_is_bounded() {
        let series = expand(template(2025, 6, 10), Repeat::Daily, 10_000);
        assert_eq!(series.len(), MAX_OCCURRENCES);
        assert_eq!(expand(template(2025, 6, 10), Repeat::Daily, 0).len(), 1);
    }

    #[test]
    fn no_repeat_returns_only_the_template() {
        let series = expand(template(2025, 6, 10), Repeat::None, 5);
        assert_eq!(series.len(), 1);
    }
}
