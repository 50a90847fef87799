//! Lightweight cron expression parser.
//! Supports: "MIN HOUR DOM MON DOW" (5-field, no seconds) with `*`, `*/N`,
//! comma lists, and single values in the minute and hour fields. Day
//! fields accept only `*`; the monitor runs many times a day, so day-level
//! scheduling is out of scope.

use chrono::{DateTime, Duration, Timelike, Utc};

/// A parsed schedule that can compute its next firing time.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    minutes: Vec<u32>,
    hours: Vec<u32>,
}

impl CronSchedule {
    /// Parse a 5-field cron expression.
    pub fn parse(expression: &str) -> Option<Self> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        if parts.len() != 5 {
            tracing::warn!(
                "Invalid cron expression: '{}' (need 5 fields: MIN HOUR DOM MON DOW)",
                expression
            );
            return None;
        }
        if parts[2] != "*" || parts[3] != "*" || parts[4] != "*" {
            tracing::warn!(
                "Unsupported cron expression: '{}' (day fields must be '*')",
                expression
            );
            return None;
        }

        Some(Self {
            minutes: parse_field(parts[0], 0, 59)?,
            hours: parse_field(parts[1], 0, 23)?,
        })
    }

    /// The next matching time strictly after `after`, scanning at minute
    /// granularity up to 48 hours ahead.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut candidate = after + Duration::minutes(1);
        candidate = candidate.with_second(0).unwrap_or(candidate);
        candidate = candidate.with_nanosecond(0).unwrap_or(candidate);

        for _ in 0..(48 * 60) {
            if self.minutes.contains(&candidate.minute()) && self.hours.contains(&candidate.hour())
            {
                return Some(candidate);
            }
            candidate += Duration::minutes(1);
        }
        None
    }
}

/// Parse one cron field into the list of matching values.
fn parse_field(field: &str, min: u32, max: u32) -> Option<Vec<u32>> {
    if field == "*" {
        return Some((min..=max).collect());
    }

    if let Some(step) = field.strip_prefix("*/") {
        let n: u32 = step.parse().ok()?;
        if n == 0 {
            return None;
        }
        return Some((min..=max).step_by(n as usize).collect());
    }

    if field.contains(',') {
        let vals: Result<Vec<u32>, _> = field.split(',').map(|s| s.trim().parse()).collect();
        let vals = vals.ok()?;
        if vals.iter().any(|v| *v < min || *v > max) {
            return None;
        }
        return Some(vals);
    }

    let n: u32 = field.parse().ok()?;
    if n >= min && n <= max { Some(vec![n]) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn every_two_minutes() {
        let schedule = CronSchedule::parse("*/2 * * * *").unwrap();
        let after = Utc.with_ymd_and_hms(2025, 5, 3, 19, 30, 12).unwrap();
        let next = schedule.next_after(after).unwrap();
        assert_eq!(next.minute(), 32);
        assert_eq!(next.second(), 0);
    }

    #[test]
    fn specific_time_rolls_to_next_day() {
        let schedule = CronSchedule::parse("0 8 * * *").unwrap();
        let after = Utc.with_ymd_and_hms(2025, 5, 3, 9, 0, 0).unwrap();
        let next = schedule.next_after(after).unwrap();
        assert_eq!(next.hour(), 8);
        assert_eq!(next.minute(), 0);
        assert_eq!(next.date_naive(), after.date_naive() + Duration::days(1));
    }

    #[test]
    fn comma_list() {
        let schedule = CronSchedule::parse("0,30 * * * *").unwrap();
        let after = Utc.with_ymd_and_hms(2025, 5, 3, 10, 5, 0).unwrap();
        assert_eq!(schedule.next_after(after).unwrap().minute(), 30);
    }

    #[test]
    fn next_is_strictly_after() {
        let schedule = CronSchedule::parse("*/2 * * * *").unwrap();
        let on_the_mark = Utc.with_ymd_and_hms(2025, 5, 3, 10, 2, 0).unwrap();
        let next = schedule.next_after(on_the_mark).unwrap();
        assert_eq!(next.minute(), 4);
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(CronSchedule::parse("bad").is_none());
        assert!(CronSchedule::parse("*/0 * * * *").is_none());
        assert!(CronSchedule::parse("99 * * * *").is_none());
        assert!(CronSchedule::parse("* * 1 * *").is_none());
        assert!(CronSchedule::parse("1,99 * * * *").is_none());
    }
}
