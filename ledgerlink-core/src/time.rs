//! Date utilities: provider dates and timezone-aware query windows.

use anyhow::{Result, bail};
use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Parse a transaction date. Accepts `2026-02-20`, RFC3339 timestamps, and
/// naive `2026-02-20T00:00:00` / `2026-02-20 00:00:00` forms (date part kept).
pub fn parse_provider_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive());
    }
    if let Some(prefix) = raw.get(..10) {
        let rest = &raw[10..];
        if rest.starts_with('T') || rest.starts_with(' ') {
            if let Ok(d) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
                return Ok(d);
            }
        }
    }
    bail!("invalid transaction date '{raw}'")
}

/// Inclusive calendar range used to scope transaction queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            bail!("window start {start} is after end {end}");
        }
        Ok(Self { start, end })
    }

    /// The last `days` calendar days ending today in `tz` (an IANA name like
    /// "America/Chicago").
    pub fn last_days(tz: &str, days: u32, now: DateTime<Utc>) -> Result<Self> {
        let tz: Tz = tz
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
        let end = now.with_timezone(&tz).date_naive();
        let start = end
            .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
            .ok_or_else(|| anyhow::anyhow!("window of {days} days underflows the calendar"))?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_provider_dates() {
        let d = NaiveDate::from_ymd_opt(2026, 2, 20).unwrap();
        assert_eq!(parse_provider_date("2026-02-20").unwrap(), d);
        assert_eq!(parse_provider_date("2026-02-20T23:10:00Z").unwrap(), d);
        assert_eq!(parse_provider_date("2026-02-20T00:00:00.000").unwrap(), d);
        assert_eq!(parse_provider_date(" 2026-02-20 08:00:00 ").unwrap(), d);
        assert!(parse_provider_date("02/20/2026").is_err());
        assert!(parse_provider_date("").is_err());
    }

    #[test]
    fn test_last_days_uses_local_calendar() {
        // 03:00 UTC on the 21st is still the 20th in Chicago (UTC-6 in Feb)
        let now = Utc.with_ymd_and_hms(2026, 2, 21, 3, 0, 0).unwrap();
        let w = DateWindow::last_days("America/Chicago", 30, now).unwrap();
        assert_eq!(w.end, NaiveDate::from_ymd_opt(2026, 2, 20).unwrap());
        assert_eq!(w.start, NaiveDate::from_ymd_opt(2026, 1, 22).unwrap());
        assert!(w.contains(w.start) && w.contains(w.end));
        assert!(DateWindow::last_days("Mars/Olympus", 30, now).is_err());
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        let a = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let b = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(DateWindow::new(a, b).is_err());
    }
}
