use crate::dto::FreshnessReport;
use chrono::{DateTime, Datelike, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Layout of the stored `Atualizado` field and of every timestamp we emit.
pub const LAYOUT: &str = "%d/%m %H:%M";

/// The feed is published from Brazil and its timestamps carry no offset.
pub const TIMEZONE: Tz = chrono_tz::America::Sao_Paulo;

/// How long after an update the feed is still considered current.
pub const FRESHNESS_WINDOW_MINUTES: i64 = 45;

#[derive(Debug, Error, PartialEq)]
pub enum FreshnessError {
    #[error("invalid timestamp {raw:?}: {reason}")]
    InvalidTimestamp { raw: String, reason: String },
    #[error("timestamp {raw:?} does not exist in {timezone}")]
    NonexistentLocalTime { raw: String, timezone: Tz },
}

/// Source of "now". Injected into the app state so tests can pin it.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Layout, timezone and window used to judge a feed.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    pub layout: &'static str,
    pub timezone: Tz,
    pub window: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            layout: LAYOUT,
            timezone: TIMEZONE,
            window: Duration::minutes(FRESHNESS_WINDOW_MINUTES),
        }
    }
}

/// Outcome of one freshness check.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub last_update: DateTime<Tz>,
    pub next_update: DateTime<Tz>,
    pub now: DateTime<Tz>,
}

impl Evaluation {
    /// Fresh while the next expected update is still strictly in the future.
    pub fn is_fresh(&self) -> bool {
        self.next_update > self.now
    }
}

impl FreshnessPolicy {
    /// Parses a year-less stored timestamp, attaching `year`.
    ///
    /// The value must be exactly what `layout` would print: zero-padded
    /// fields, single separators, no surrounding whitespace.
    pub fn parse(&self, raw: &str, year: i32) -> Result<DateTime<Tz>, FreshnessError> {
        let naive = NaiveDateTime::parse_from_str(
            &format!("{year} {raw}"),
            &format!("%Y {}", self.layout),
        )
        .map_err(|e| FreshnessError::InvalidTimestamp {
            raw: raw.to_string(),
            reason: e.to_string(),
        })?;

        if naive.format(self.layout).to_string() != raw {
            return Err(FreshnessError::InvalidTimestamp {
                raw: raw.to_string(),
                reason: format!("does not match layout {:?}", self.layout),
            });
        }

        self.timezone
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| FreshnessError::NonexistentLocalTime {
                raw: raw.to_string(),
                timezone: self.timezone,
            })
    }

    pub fn format(&self, at: &DateTime<Tz>) -> String {
        at.format(self.layout).to_string()
    }

    /// Judges the stored timestamp against `now`.
    ///
    /// The stored value has no year, so the year of `now` in the policy
    /// timezone is used. A December update checked in January is therefore
    /// dated almost a year ahead and reported as fresh.
    pub fn evaluate(&self, raw: &str, now: DateTime<Utc>) -> Result<Evaluation, FreshnessError> {
        let now = now.with_timezone(&self.timezone);
        let last_update = self.parse(raw, now.year())?;
        let next_update = last_update + self.window;

        Ok(Evaluation {
            last_update,
            next_update,
            now,
        })
    }

    pub fn report(&self, evaluation: &Evaluation) -> FreshnessReport {
        FreshnessReport {
            last_update: self.format(&evaluation.last_update),
            next_update: self.format(&evaluation.next_update),
            now: self.format(&evaluation.now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn local(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        TIMEZONE
            .with_ymd_and_hms(2026, month, day, hour, minute, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn fresh_inside_window() {
        let policy = FreshnessPolicy::default();
        let evaluation = policy.evaluate("10/05 12:00", local(5, 10, 12, 30)).unwrap();

        assert!(evaluation.is_fresh());
        let report = policy.report(&evaluation);
        assert_eq!(report.last_update, "10/05 12:00");
        assert_eq!(report.next_update, "10/05 12:45");
        assert_eq!(report.now, "10/05 12:30");
    }

    #[test]
    fn stale_after_window() {
        let policy = FreshnessPolicy::default();
        let evaluation = policy.evaluate("10/05 12:00", local(5, 10, 13, 0)).unwrap();

        assert!(!evaluation.is_fresh());
        let report = policy.report(&evaluation);
        assert_eq!(report.last_update, "10/05 12:00");
        assert_eq!(report.next_update, "10/05 12:45");
        assert_eq!(report.now, "10/05 13:00");
    }

    #[test]
    fn exactly_at_next_update_is_stale() {
        let policy = FreshnessPolicy::default();
        let evaluation = policy.evaluate("10/05 12:00", local(5, 10, 12, 45)).unwrap();

        assert!(!evaluation.is_fresh());
    }

    #[test]
    fn window_crosses_midnight() {
        let policy = FreshnessPolicy::default();
        let evaluation = policy.evaluate("31/12 23:30", local(12, 31, 23, 50)).unwrap();

        assert!(evaluation.is_fresh());
        assert_eq!(policy.format(&evaluation.next_update), "01/01 00:15");
        assert_eq!(evaluation.next_update.year(), 2027);
    }

    #[test]
    fn now_is_reported_in_policy_timezone() {
        let policy = FreshnessPolicy::default();
        // 15:30 UTC is 12:30 in Sao Paulo (UTC-3).
        let now = Utc.with_ymd_and_hms(2026, 5, 10, 15, 30, 0).unwrap();
        let evaluation = policy.evaluate("10/05 12:00", now).unwrap();

        assert_eq!(policy.format(&evaluation.now), "10/05 12:30");
        assert!(evaluation.is_fresh());
    }

    #[test]
    fn format_then_parse_keeps_fields() {
        let policy = FreshnessPolicy::default();
        let original = TIMEZONE.with_ymd_and_hms(2026, 3, 7, 8, 5, 0).unwrap();

        let parsed = policy.parse(&policy.format(&original), 2026).unwrap();

        assert_eq!(parsed.day(), 7);
        assert_eq!(parsed.month(), 3);
        assert_eq!(parsed.hour(), 8);
        assert_eq!(parsed.minute(), 5);
    }

    #[test]
    fn rejects_garbage() {
        let policy = FreshnessPolicy::default();
        let err = policy.evaluate("yesterday", local(5, 10, 12, 0)).unwrap_err();

        assert!(matches!(err, FreshnessError::InvalidTimestamp { ref raw, .. } if raw == "yesterday"));
    }

    #[test]
    fn rejects_empty_value() {
        let policy = FreshnessPolicy::default();

        assert!(policy.evaluate("", local(5, 10, 12, 0)).is_err());
    }

    #[test]
    fn rejects_loose_layouts() {
        let policy = FreshnessPolicy::default();

        for raw in [
            "10/0512:00",
            "1/5 9:0",
            " 10/05 12:00",
            "10/05 12:00 ",
            "10/05  12:00",
            "10/5 12:00",
        ] {
            assert!(
                matches!(policy.parse(raw, 2026), Err(FreshnessError::InvalidTimestamp { .. })),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn leap_day_only_valid_in_leap_years() {
        let policy = FreshnessPolicy::default();

        assert!(policy.parse("29/02 10:00", 2028).is_ok());
        assert!(policy.parse("29/02 10:00", 2026).is_err());
    }
}
