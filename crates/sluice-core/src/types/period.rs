//! Calendar periods
//!
//! A [`Period`] is a calendar-aware amount of time ("1 month", "2 weeks"),
//! as opposed to an exact [`chrono::Duration`]. Adding one month to the
//! 31st of January lands on the last day of February.

use crate::error::{CoreError, Result};
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar period made of independent fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub years: i32,
    pub months: i32,
    pub weeks: i32,
    pub days: i32,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub millis: i64,
}

impl Period {
    /// The empty period
    pub const ZERO: Period = Period {
        years: 0,
        months: 0,
        weeks: 0,
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
        millis: 0,
    };

    pub fn years(years: i32) -> Self {
        Self { years, ..Self::ZERO }
    }

    pub fn months(months: i32) -> Self {
        Self { months, ..Self::ZERO }
    }

    pub fn weeks(weeks: i32) -> Self {
        Self { weeks, ..Self::ZERO }
    }

    pub fn days(days: i32) -> Self {
        Self { days, ..Self::ZERO }
    }

    pub fn hours(hours: i64) -> Self {
        Self { hours, ..Self::ZERO }
    }

    pub fn minutes(minutes: i64) -> Self {
        Self { minutes, ..Self::ZERO }
    }

    pub fn seconds(seconds: i64) -> Self {
        Self { seconds, ..Self::ZERO }
    }

    pub fn millis(millis: i64) -> Self {
        Self { millis, ..Self::ZERO }
    }

    /// Field-wise sum of two periods
    pub fn plus(&self, other: &Period) -> Result<Period> {
        Ok(Period {
            years: self.years.checked_add(other.years).ok_or(CoreError::Overflow)?,
            months: self.months.checked_add(other.months).ok_or(CoreError::Overflow)?,
            weeks: self.weeks.checked_add(other.weeks).ok_or(CoreError::Overflow)?,
            days: self.days.checked_add(other.days).ok_or(CoreError::Overflow)?,
            hours: self.hours.checked_add(other.hours).ok_or(CoreError::Overflow)?,
            minutes: self.minutes.checked_add(other.minutes).ok_or(CoreError::Overflow)?,
            seconds: self.seconds.checked_add(other.seconds).ok_or(CoreError::Overflow)?,
            millis: self.millis.checked_add(other.millis).ok_or(CoreError::Overflow)?,
        })
    }

    /// Field-wise negation
    pub fn negated(&self) -> Result<Period> {
        Ok(Period {
            years: self.years.checked_neg().ok_or(CoreError::Overflow)?,
            months: self.months.checked_neg().ok_or(CoreError::Overflow)?,
            weeks: self.weeks.checked_neg().ok_or(CoreError::Overflow)?,
            days: self.days.checked_neg().ok_or(CoreError::Overflow)?,
            hours: self.hours.checked_neg().ok_or(CoreError::Overflow)?,
            minutes: self.minutes.checked_neg().ok_or(CoreError::Overflow)?,
            seconds: self.seconds.checked_neg().ok_or(CoreError::Overflow)?,
            millis: self.millis.checked_neg().ok_or(CoreError::Overflow)?,
        })
    }

    /// Field-wise difference of two periods
    pub fn minus(&self, other: &Period) -> Result<Period> {
        self.plus(&other.negated()?)
    }

    /// Apply this period to an instant.
    ///
    /// Calendar fields (years, months) are applied first, then the exact
    /// fields, so `2024-01-31 + P1M1D` is `2024-03-01`.
    pub fn add_to(&self, instant: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let months = i64::from(self.years) * 12 + i64::from(self.months);
        let shifted = if months >= 0 {
            u32::try_from(months)
                .ok()
                .and_then(|m| instant.checked_add_months(Months::new(m)))
        } else {
            u32::try_from(-months)
                .ok()
                .and_then(|m| instant.checked_sub_months(Months::new(m)))
        }
        .ok_or(CoreError::DateOutOfRange)?;

        let exact = self.exact_part().ok_or(CoreError::DateOutOfRange)?;
        shifted
            .checked_add_signed(exact)
            .ok_or(CoreError::DateOutOfRange)
    }

    /// Subtract this period from an instant
    pub fn subtract_from(&self, instant: DateTime<Utc>) -> Result<DateTime<Utc>> {
        self.negated()
            .map_err(|_| CoreError::DateOutOfRange)?
            .add_to(instant)
    }

    fn exact_part(&self) -> Option<Duration> {
        let days = i64::from(self.weeks)
            .checked_mul(7)?
            .checked_add(i64::from(self.days))?;
        Duration::try_days(days)?
            .checked_add(&Duration::try_hours(self.hours)?)?
            .checked_add(&Duration::try_minutes(self.minutes)?)?
            .checked_add(&Duration::try_seconds(self.seconds)?)?
            .checked_add(&Duration::try_milliseconds(self.millis)?)
    }

    /// Parse an ISO-8601 period such as `P1Y2M3W4DT5H6M7.5S`
    pub fn parse(text: &str) -> Result<Period> {
        let invalid = || CoreError::InvalidPeriod(text.to_string());
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let body = body
            .strip_prefix('P')
            .or_else(|| body.strip_prefix('p'))
            .ok_or_else(invalid)?;
        if body.is_empty() {
            return Err(invalid());
        }

        let mut period = Period::ZERO;
        let mut in_time = false;
        let mut number = String::new();
        for c in body.chars() {
            match c.to_ascii_uppercase() {
                'T' if !in_time && number.is_empty() => in_time = true,
                d if d.is_ascii_digit() || d == '.' || d == '-' => number.push(d),
                unit => {
                    if number.is_empty() {
                        return Err(invalid());
                    }
                    match (in_time, unit) {
                        (true, 'S') => {
                            let (secs, millis) = split_seconds(&number).ok_or_else(invalid)?;
                            period.seconds = secs;
                            period.millis = millis;
                        }
                        (_, 'S') => return Err(invalid()),
                        (false, 'Y') => period.years = number.parse().map_err(|_| invalid())?,
                        (false, 'M') => period.months = number.parse().map_err(|_| invalid())?,
                        (false, 'W') => period.weeks = number.parse().map_err(|_| invalid())?,
                        (false, 'D') => period.days = number.parse().map_err(|_| invalid())?,
                        (true, 'H') => period.hours = number.parse().map_err(|_| invalid())?,
                        (true, 'M') => period.minutes = number.parse().map_err(|_| invalid())?,
                        _ => return Err(invalid()),
                    }
                    number.clear();
                }
            }
        }
        if !number.is_empty() {
            return Err(invalid());
        }

        if negative {
            period.negated().map_err(|_| invalid())
        } else {
            Ok(period)
        }
    }
}

fn split_seconds(number: &str) -> Option<(i64, i64)> {
    match number.split_once('.') {
        None => Some((number.parse().ok()?, 0)),
        Some((whole, fraction)) => {
            let secs: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
            let digits: String = fraction.chars().chain("000".chars()).take(3).collect();
            let millis: i64 = digits.parse().ok()?;
            Some((secs, if secs < 0 { -millis } else { millis }))
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Period::ZERO {
            return write!(f, "PT0S");
        }
        write!(f, "P")?;
        for (value, unit) in [
            (i64::from(self.years), 'Y'),
            (i64::from(self.months), 'M'),
            (i64::from(self.weeks), 'W'),
            (i64::from(self.days), 'D'),
        ] {
            if value != 0 {
                write!(f, "{}{}", value, unit)?;
            }
        }
        if self.hours != 0 || self.minutes != 0 || self.seconds != 0 || self.millis != 0 {
            write!(f, "T")?;
            if self.hours != 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes != 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.millis != 0 {
                write!(f, "{}.{:03}S", self.seconds, self.millis.abs())?;
            } else if self.seconds != 0 {
                write!(f, "{}S", self.seconds)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_full_period() {
        let period = Period::parse("P1Y2M3W4DT5H6M7.5S").unwrap();
        assert_eq!(period.years, 1);
        assert_eq!(period.months, 2);
        assert_eq!(period.weeks, 3);
        assert_eq!(period.days, 4);
        assert_eq!(period.hours, 5);
        assert_eq!(period.minutes, 6);
        assert_eq!(period.seconds, 7);
        assert_eq!(period.millis, 500);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Period::parse("").is_err());
        assert!(Period::parse("P").is_err());
        assert!(Period::parse("1D").is_err());
        assert!(Period::parse("P1H").is_err());
        assert!(Period::parse("PT1").is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for text in ["P1D", "PT2H", "P1Y2MT3M", "PT1.250S"] {
            assert_eq!(Period::parse(text).unwrap().to_string(), text);
        }
        assert_eq!(Period::ZERO.to_string(), "PT0S");
    }

    #[test]
    fn test_month_addition_clamps_to_month_end() {
        let jan31 = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        let result = Period::months(1).add_to(jan31).unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_subtract_exact_fields() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let result = Period::hours(1).subtract_from(instant).unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2024, 2, 29, 23, 0, 0).unwrap());
    }

    #[test]
    fn test_plus_and_minus() {
        let sum = Period::days(2).plus(&Period::hours(3)).unwrap();
        assert_eq!(sum.days, 2);
        assert_eq!(sum.hours, 3);
        assert_eq!(sum.minus(&Period::days(2)).unwrap(), Period::hours(3));
    }

    #[test]
    fn test_extreme_fields_fail_instead_of_wrapping() {
        let min_years = Period::years(i32::MIN);
        assert_eq!(min_years.negated(), Err(CoreError::Overflow));
        assert_eq!(Period::days(1).minus(&min_years), Err(CoreError::Overflow));
        assert_eq!(
            Period::millis(i64::MAX).plus(&Period::millis(1)),
            Err(CoreError::Overflow)
        );

        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(min_years.subtract_from(instant), Err(CoreError::DateOutOfRange));
        assert!(Period::parse("-P-2147483648Y").is_err());
    }
}
