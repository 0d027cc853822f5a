//! Date and period functions
//!
//! Patterns use `strftime` syntax. Timezones are `UTC`, `Z` or a fixed
//! offset such as `+02:00`.

use super::{describe, optional, required};
use crate::context::EvaluationContext;
use crate::error::Result;
use crate::function::{FunctionArgs, NativeFunction};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sluice_core::{Period, Value, ValueType};
use std::fmt::Write;

pub(super) fn functions() -> Vec<NativeFunction> {
    vec![
        NativeFunction::new(
            describe("now", ValueType::DateTime, "Current time")
                .param(optional("timezone", ValueType::String)),
            |_, _| Ok(Value::DateTime(Utc::now())),
        )
        .with_preflight(timezone_preflight),
        NativeFunction::new(
            describe("parse_date", ValueType::DateTime, "Parses a date with a pattern")
                .param(required("value", ValueType::String))
                .param(required("pattern", ValueType::String))
                .param(optional("timezone", ValueType::String).with_default("UTC")),
            parse_date,
        ),
        NativeFunction::new(
            describe(
                "parse_unix_milliseconds",
                ValueType::DateTime,
                "Converts milliseconds since the epoch to a date",
            )
            .param(required("value", ValueType::Long)),
            |args, _| {
                let millis = args.required_long("value")?;
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .map(Value::DateTime)
                    .ok_or_else(|| args.invalid(format!("{} is out of range", millis)))
            },
        ),
        NativeFunction::new(
            describe("format_date", ValueType::String, "Formats a date with a pattern")
                .param(required("value", ValueType::DateTime))
                .param(required("format", ValueType::String))
                .param(optional("timezone", ValueType::String)),
            format_date,
        ),
        period_fn("years", |n| Ok(Period::years(i32::try_from(n)?))),
        period_fn("months", |n| Ok(Period::months(i32::try_from(n)?))),
        period_fn("weeks", |n| Ok(Period::weeks(i32::try_from(n)?))),
        period_fn("days", |n| Ok(Period::days(i32::try_from(n)?))),
        period_fn("hours", |n| Ok(Period::hours(n))),
        period_fn("minutes", |n| Ok(Period::minutes(n))),
        period_fn("seconds", |n| Ok(Period::seconds(n))),
        period_fn("millis", |n| Ok(Period::millis(n))),
        NativeFunction::new(
            describe("period", ValueType::Period, "Parses an ISO-8601 period")
                .param(required("value", ValueType::String)),
            |args, _| {
                let text = args.required_string("value")?;
                Ok(Value::Period(Period::parse(text)?))
            },
        ),
    ]
}

type PeriodCtor = fn(i64) -> std::result::Result<Period, std::num::TryFromIntError>;

fn period_fn(name: &'static str, ctor: PeriodCtor) -> NativeFunction {
    NativeFunction::new(
        describe(name, ValueType::Period, "Creates a period of the given length")
            .param(required("value", ValueType::Long)),
        move |args, _| {
            let amount = args.required_long("value")?;
            ctor(amount)
                .map(Value::Period)
                .map_err(|_| args.invalid(format!("{} {} is out of range", amount, name)))
        },
    )
}

/// Parse a timezone name into a fixed offset
pub(crate) fn parse_timezone(name: &str) -> Option<FixedOffset> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("utc") || name == "Z" {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match name.as_bytes().first()? {
        b'+' => (1, &name[1..]),
        b'-' => (-1, &name[1..]),
        _ => return None,
    };
    if !rest.is_ascii() {
        return None;
    }
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 18 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn timezone(args: &FunctionArgs<'_>) -> Result<FixedOffset> {
    let name = args.string("timezone")?.unwrap_or("UTC");
    parse_timezone(name).ok_or_else(|| args.invalid(format!("unknown timezone '{}'", name)))
}

fn timezone_preflight(args: &[Option<&Value>]) -> std::result::Result<(), String> {
    match args.first() {
        Some(Some(Value::String(name))) if parse_timezone(name).is_none() => {
            Err(format!("unknown timezone '{}'", name))
        }
        _ => Ok(()),
    }
}

fn parse_date(args: &FunctionArgs<'_>, _: &mut EvaluationContext<'_>) -> Result<Value> {
    let value = args.required_string("value")?;
    let pattern = args.required_string("pattern")?;
    let offset = timezone(args)?;

    if let Ok(parsed) = DateTime::parse_from_str(value, pattern) {
        return Ok(Value::DateTime(parsed.with_timezone(&Utc)));
    }
    let naive = NaiveDateTime::parse_from_str(value, pattern).or_else(|_| {
        NaiveDate::parse_from_str(value, pattern).map(|date| date.and_time(Default::default()))
    });
    let naive = naive.map_err(|e| {
        args.invalid(format!("unable to parse '{}' with '{}': {}", value, pattern, e))
    })?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|local| Value::DateTime(local.with_timezone(&Utc)))
        .ok_or_else(|| args.invalid(format!("'{}' is ambiguous", value)))
}

fn format_date(args: &FunctionArgs<'_>, _: &mut EvaluationContext<'_>) -> Result<Value> {
    let value = args
        .datetime("value")?
        .ok_or_else(|| args.invalid("'value' is required"))?;
    let format = args.required_string("format")?;
    let offset = timezone(args)?;
    let mut formatted = String::new();
    write!(formatted, "{}", value.with_timezone(&offset).format(format))
        .map_err(|_| args.invalid(format!("invalid date format '{}'", format)))?;
    Ok(Value::String(formatted))
}
