//! Korea Standard Time calendar helpers.
//!
//! KST is a fixed UTC+9 with no daylight saving, so every conversion adds the
//! offset to the UTC instant. The host timezone is never consulted.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::config::{tags, MIN_BOUNDARY_TTL_SECS};
use crate::error::{AppError, Result};

pub const KST_OFFSET_HOURS: i64 = 9;
const SECS_PER_DAY: u32 = 86_400;

pub fn kst_now(now: DateTime<Utc>) -> NaiveDateTime {
    now.naive_utc() + Duration::hours(KST_OFFSET_HOURS)
}

pub fn kst_today(now: DateTime<Utc>) -> NaiveDate {
    kst_now(now).date()
}

/// Whole seconds until the next KST midnight, never below the floor.
pub fn seconds_until_next_boundary(now: DateTime<Utc>) -> u64 {
    let elapsed = kst_now(now).num_seconds_from_midnight();
    u64::from(SECS_PER_DAY - elapsed).max(MIN_BOUNDARY_TTL_SECS)
}

/// A resolved calendar day plus the string forms upstreams want.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub date: NaiveDate,
}

impl DateWindow {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    /// `YYYY-MM-DD`
    pub fn ymd(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// `YYYYMMDD`
    pub fn compact(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    pub fn tag(&self) -> String {
        schedule_tag(self.date)
    }

    pub fn month_tag(&self) -> String {
        schedule_month_tag(self.year(), self.month())
    }
}

/// Explicit `YYYY-MM-DD` / `YYYYMMDD`, or today in KST when absent or blank.
pub fn resolve_date_window(date: Option<&str>, now: DateTime<Utc>) -> Result<DateWindow> {
    match date.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_date(s).map(|date| DateWindow { date }),
        None => Ok(DateWindow { date: kst_today(now) }),
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    let invalid = || AppError::InvalidRequest(format!("invalid date '{s}', expected YYYY-MM-DD or YYYYMMDD"));

    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let y = s[0..4].parse().map_err(|_| invalid())?;
        let m = s[4..6].parse().map_err(|_| invalid())?;
        let d = s[6..8].parse().map_err(|_| invalid())?;
        return NaiveDate::from_ymd_opt(y, m, d).ok_or_else(invalid);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| invalid())
}

pub fn schedule_tag(date: NaiveDate) -> String {
    format!("{}{}", tags::SCHEDULE_PREFIX, date.format("%Y-%m-%d"))
}

pub fn schedule_month_tag(year: i32, month: u32) -> String {
    format!("{}{year:04}-{month:02}", tags::SCHEDULE_MONTH_PREFIX)
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)?.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn today_rolls_over_at_kst_midnight() {
        // 14:59 UTC is 23:59 KST, 15:00 UTC is the next day.
        assert_eq!(kst_today(utc(2025, 9, 11, 14, 59, 0)), NaiveDate::from_ymd_opt(2025, 9, 11).unwrap());
        assert_eq!(kst_today(utc(2025, 9, 11, 15, 0, 0)), NaiveDate::from_ymd_opt(2025, 9, 12).unwrap());
    }

    #[test]
    fn boundary_just_before_midnight_hits_floor() {
        // 23:59:30 KST
        assert_eq!(seconds_until_next_boundary(utc(2025, 9, 11, 14, 59, 30)), 60);
    }

    #[test]
    fn boundary_at_midnight_is_a_full_day() {
        assert_eq!(seconds_until_next_boundary(utc(2025, 9, 11, 15, 0, 0)), 86_400);
    }

    #[test]
    fn boundary_midday() {
        // 12:00 KST
        assert_eq!(seconds_until_next_boundary(utc(2025, 9, 12, 3, 0, 0)), 43_200);
    }

    #[test]
    fn accepts_both_date_forms() {
        let now = utc(2025, 1, 1, 0, 0, 0);
        let a = resolve_date_window(Some("2025-09-12"), now).unwrap();
        let b = resolve_date_window(Some("20250912"), now).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.ymd(), "2025-09-12");
        assert_eq!(a.compact(), "20250912");
        assert_eq!(a.tag(), "kbo-schedule-2025-09-12");
        assert_eq!(a.month_tag(), "kbo-schedule-month-2025-09");
    }

    #[test]
    fn missing_or_blank_date_is_kst_today() {
        let now = utc(2025, 9, 11, 16, 0, 0);
        assert_eq!(resolve_date_window(None, now).unwrap().ymd(), "2025-09-12");
        assert_eq!(resolve_date_window(Some("  "), now).unwrap().ymd(), "2025-09-12");
    }

    #[test]
    fn rejects_garbage_dates() {
        let now = utc(2025, 1, 1, 0, 0, 0);
        for bad in ["2025-13-01", "20250230", "tomorrow", "2025/09/12"] {
            let err = resolve_date_window(Some(bad), now).unwrap_err();
            assert!(matches!(err, AppError::InvalidRequest(_)), "{bad}");
        }
    }

    #[test]
    fn month_end_days() {
        assert_eq!(last_day_of_month(2025, 4), NaiveDate::from_ymd_opt(2025, 4, 30));
        assert_eq!(last_day_of_month(2024, 2), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(last_day_of_month(2025, 12), NaiveDate::from_ymd_opt(2025, 12, 31));
    }
}
