//! Calendar-day time windows.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use derive_getters::Getters;

/// Half-open local-time interval `[start of day, start of next day)`.
///
/// The reuse check, the daily quota, the today listing and the reports all
/// use this one definition of "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Getters)]
pub struct DayWindow {
    date: NaiveDate,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DayWindow {
    /// Window covering `date`.
    pub fn for_date(date: NaiveDate) -> Self {
        let start = date.and_time(NaiveTime::MIN);
        let end = start
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDateTime::MAX);
        Self { date, start, end }
    }

    /// Window covering the day `moment` falls in.
    pub fn containing(moment: NaiveDateTime) -> Self {
        Self::for_date(moment.date())
    }

    /// True when `moment` is inside the window.
    pub fn contains(&self, moment: NaiveDateTime) -> bool {
        self.start <= moment && moment < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_window_bounds() {
        let window = DayWindow::containing(at("2026-10-19", "13:45:00"));
        assert_eq!(*window.start(), at("2026-10-19", "00:00:00"));
        assert_eq!(*window.end(), at("2026-10-20", "00:00:00"));
    }

    #[test]
    fn test_window_is_half_open() {
        let window = DayWindow::for_date(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert!(window.contains(at("2026-10-19", "00:00:00")));
        assert!(window.contains(at("2026-10-19", "23:59:59")));
        assert!(!window.contains(at("2026-10-20", "00:00:00")));
        assert!(!window.contains(at("2026-10-18", "23:59:59")));
    }
}
