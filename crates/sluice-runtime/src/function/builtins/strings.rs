//! String functions

use super::{describe, optional, required};
use crate::context::EvaluationContext;
use crate::error::Result;
use crate::function::{FunctionArgs, NativeFunction};
use dashmap::DashMap;
use regex::Regex;
use sluice_core::{Value, ValueType};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Patterns beyond this many are compiled per call instead of cached
const MAX_CACHED_PATTERNS: usize = 1024;

pub(super) fn functions() -> Vec<NativeFunction> {
    let patterns = Arc::new(PatternCache::default());
    let split_patterns = patterns.clone();
    let match_patterns = patterns.clone();
    let replace_patterns = patterns;
    vec![
        unary("lowercase", "Lowercases a string", |s| s.to_lowercase()),
        unary("uppercase", "Uppercases a string", |s| s.to_uppercase()),
        unary("capitalize", "Uppercases the first character", capitalize),
        unary("uncapitalize", "Lowercases the first character", uncapitalize),
        unary("swapcase", "Swaps the case of every character", swapcase),
        unary("trim", "Removes leading and trailing whitespace", |s| s.trim().to_string()),
        NativeFunction::new(
            describe("abbreviate", ValueType::String, "Abbreviates a string with an ellipsis")
                .param(required("value", ValueType::String))
                .param(required("width", ValueType::Long)),
            abbreviate,
        ),
        affix("contains", "Checks whether a string contains another", |v, s| v.contains(s)),
        affix("starts_with", "Checks a string prefix", |v, s| v.starts_with(s)),
        affix("ends_with", "Checks a string suffix", |v, s| v.ends_with(s)),
        NativeFunction::new(
            describe("substring", ValueType::String, "Extracts characters by index")
                .param(required("value", ValueType::String))
                .param(required("start", ValueType::Long))
                .param(optional("end", ValueType::Long)),
            substring,
        ),
        NativeFunction::new(
            describe("concat", ValueType::String, "Concatenates two strings")
                .param(required("first", ValueType::String))
                .param(required("second", ValueType::String)),
            |args, _| {
                Ok(Value::String(format!(
                    "{}{}",
                    args.string("first")?.unwrap_or_default(),
                    args.string("second")?.unwrap_or_default()
                )))
            },
        ),
        NativeFunction::new(
            describe("join", ValueType::String, "Joins list elements into a string")
                .param(required("elements", ValueType::List))
                .param(optional("delimiter", ValueType::String).with_default("")),
            join,
        ),
        NativeFunction::new(
            describe("split", ValueType::List, "Splits a string around regex matches")
                .param(required("pattern", ValueType::String))
                .param(required("value", ValueType::String))
                .param(optional("limit", ValueType::Long).with_default(0i64)),
            move |args, _| split(&split_patterns, args),
        )
        .with_preflight(pattern_preflight),
        NativeFunction::new(
            describe("replace", ValueType::String, "Replaces occurrences of a substring")
                .param(required("value", ValueType::String))
                .param(required("search", ValueType::String))
                .param(optional("replacement", ValueType::String).with_default(""))
                .param(optional("max", ValueType::Long).with_default(-1i64)),
            replace,
        ),
        NativeFunction::new(
            describe("length", ValueType::Long, "Number of characters in a string")
                .param(required("value", ValueType::String)),
            |args, _| {
                let value = args.required_string("value")?;
                Ok(Value::Long(value.chars().count() as i64))
            },
        ),
        NativeFunction::new(
            describe("regex", ValueType::Map, "Matches a regex and returns its groups")
                .param(required("pattern", ValueType::String))
                .param(required("value", ValueType::String))
                .param(optional("group_names", ValueType::List)),
            move |args, _| regex_match(&match_patterns, args),
        )
        .with_preflight(pattern_preflight),
        NativeFunction::new(
            describe("regex_replace", ValueType::String, "Replaces regex matches")
                .param(required("pattern", ValueType::String))
                .param(required("value", ValueType::String))
                .param(required("replacement", ValueType::String))
                .param(optional("replace_all", ValueType::Boolean).with_default(true)),
            move |args, _| regex_replace(&replace_patterns, args),
        )
        .with_preflight(pattern_preflight),
    ]
}

fn unary(name: &str, description: &str, transform: fn(&str) -> String) -> NativeFunction {
    NativeFunction::new(
        describe(name, ValueType::String, description).param(required("value", ValueType::String)),
        move |args, _| Ok(Value::String(transform(args.required_string("value")?))),
    )
}

/// `contains`, `starts_with` and `ends_with` share a signature
fn affix(name: &str, description: &str, test: fn(&str, &str) -> bool) -> NativeFunction {
    let needle = match name {
        "starts_with" => "prefix",
        "ends_with" => "suffix",
        _ => "search",
    };
    NativeFunction::new(
        describe(name, ValueType::Boolean, description)
            .param(required("value", ValueType::String))
            .param(required(needle, ValueType::String))
            .param(optional("ignore_case", ValueType::Boolean).with_default(false)),
        move |args, _| {
            let value = args.required_string("value")?;
            let other = args.required_string(needle)?;
            let matched = if args.bool("ignore_case")?.unwrap_or(false) {
                test(&value.to_lowercase(), &other.to_lowercase())
            } else {
                test(value, other)
            };
            Ok(Value::Bool(matched))
        },
    )
}

fn map_first(s: &str, f: impl FnOnce(char) -> String) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => f(first) + chars.as_str(),
        None => String::new(),
    }
}

fn capitalize(s: &str) -> String {
    map_first(s, |c| c.to_uppercase().collect())
}

fn uncapitalize(s: &str) -> String {
    map_first(s, |c| c.to_lowercase().collect())
}

fn swapcase(s: &str) -> String {
    s.chars()
        .flat_map(|c| -> Box<dyn Iterator<Item = char>> {
            if c.is_uppercase() {
                Box::new(c.to_lowercase())
            } else if c.is_lowercase() {
                Box::new(c.to_uppercase())
            } else {
                Box::new(std::iter::once(c))
            }
        })
        .collect()
}

fn abbreviate(args: &FunctionArgs<'_>, _: &mut EvaluationContext<'_>) -> Result<Value> {
    let value = args.required_string("value")?;
    let width = args.required_long("width")?;
    if width < 4 {
        return Err(args.invalid("minimum abbreviation width is 4"));
    }
    let width = width as usize;
    if value.chars().count() <= width {
        return Ok(Value::from(value));
    }
    let kept: String = value.chars().take(width - 3).collect();
    Ok(Value::String(kept + "..."))
}

/// Character index from a possibly negative position, clamped to `len`
fn char_index(position: i64, len: usize) -> usize {
    if position < 0 {
        len.saturating_sub(position.unsigned_abs() as usize)
    } else {
        (position as usize).min(len)
    }
}

fn substring(args: &FunctionArgs<'_>, _: &mut EvaluationContext<'_>) -> Result<Value> {
    let value = args.required_string("value")?;
    let len = value.chars().count();
    let start = char_index(args.required_long("start")?, len);
    let end = args
        .long("end")?
        .map(|end| char_index(end, len))
        .unwrap_or(len);
    if start >= end {
        return Ok(Value::String(String::new()));
    }
    Ok(Value::String(value.chars().skip(start).take(end - start).collect()))
}

fn join(args: &FunctionArgs<'_>, _: &mut EvaluationContext<'_>) -> Result<Value> {
    let elements = args.list("elements")?.unwrap_or_default();
    let delimiter = args.string("delimiter")?.unwrap_or_default();
    let parts: Vec<String> = elements.iter().map(Value::to_string).collect();
    Ok(Value::String(parts.join(delimiter)))
}

fn replace(args: &FunctionArgs<'_>, _: &mut EvaluationContext<'_>) -> Result<Value> {
    let value = args.required_string("value")?;
    let search = args.required_string("search")?;
    let replacement = args.string("replacement")?.unwrap_or_default();
    let max = args.long("max")?.unwrap_or(-1);
    let replaced = if search.is_empty() || max == 0 {
        value.to_string()
    } else if max < 0 {
        value.replace(search, replacement)
    } else {
        value.replacen(search, replacement, max as usize)
    };
    Ok(Value::String(replaced))
}

/// Reject constant patterns that do not compile
fn pattern_preflight(args: &[Option<&Value>]) -> std::result::Result<(), String> {
    match args.first() {
        Some(Some(Value::String(pattern))) => Regex::new(pattern)
            .map(|_| ())
            .map_err(|e| format!("invalid regular expression: {}", e)),
        _ => Ok(()),
    }
}

/// Compiled regular expressions shared by the regex functions of one registry
#[derive(Debug, Default)]
struct PatternCache {
    compiled: DashMap<String, Regex>,
}

impl PatternCache {
    fn get(&self, args: &FunctionArgs<'_>) -> Result<Regex> {
        let pattern = args.required_string("pattern")?;
        if let Some(regex) = self.compiled.get(pattern) {
            return Ok(regex.value().clone());
        }
        let regex = Regex::new(pattern)
            .map_err(|e| args.invalid(format!("invalid regular expression: {}", e)))?;
        if self.compiled.len() < MAX_CACHED_PATTERNS {
            self.compiled.insert(pattern.to_string(), regex.clone());
        }
        Ok(regex)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.compiled.len()
    }
}

fn split(patterns: &PatternCache, args: &FunctionArgs<'_>) -> Result<Value> {
    let regex = patterns.get(args)?;
    let value = args.required_string("value")?;
    let limit = args.long("limit")?.unwrap_or(0);
    let parts: Vec<Value> = if limit > 0 {
        regex.splitn(value, limit as usize).map(Value::from).collect()
    } else {
        let mut parts: Vec<&str> = regex.split(value).collect();
        // A limit of zero drops trailing empty strings
        if limit == 0 {
            while parts.last() == Some(&"") {
                parts.pop();
            }
        }
        parts.into_iter().map(Value::from).collect()
    };
    Ok(Value::List(parts))
}

/// Map of capture groups plus a `matches` flag. Groups are keyed by their
/// position starting at "0" for the first group, or by the supplied names.
fn regex_match(patterns: &PatternCache, args: &FunctionArgs<'_>) -> Result<Value> {
    let regex = patterns.get(args)?;
    let value = args.required_string("value")?;
    let names: Vec<String> = args
        .list("group_names")?
        .unwrap_or_default()
        .iter()
        .map(Value::to_string)
        .collect();

    let mut result = BTreeMap::new();
    let captures = regex.captures(value);
    result.insert("matches".to_string(), Value::Bool(captures.is_some()));
    if let Some(captures) = captures {
        for (i, group) in captures.iter().skip(1).enumerate() {
            let key = names.get(i).cloned().unwrap_or_else(|| i.to_string());
            result.insert(key, group.map(|m| Value::from(m.as_str())).unwrap_or(Value::Null));
        }
    }
    Ok(Value::Map(result))
}

fn regex_replace(patterns: &PatternCache, args: &FunctionArgs<'_>) -> Result<Value> {
    let regex = patterns.get(args)?;
    let value = args.required_string("value")?;
    let replacement = args.required_string("replacement")?;
    let replaced = if args.bool("replace_all")?.unwrap_or(true) {
        regex.replace_all(value, replacement)
    } else {
        regex.replace(value, replacement)
    };
    Ok(Value::String(replaced.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Function;
    use crate::message::LogMessage;

    fn call(name: &str, values: Vec<Option<Value>>) -> Result<Value> {
        let functions = functions();
        let function = functions.iter().find(|f| f.descriptor().name == name).unwrap();
        let mut msg = LogMessage::empty();
        let mut ctx = EvaluationContext::new(&mut msg);
        function.evaluate(&FunctionArgs::new(function.descriptor(), values), &mut ctx)
    }

    fn s(value: &str) -> Option<Value> {
        Some(Value::from(value))
    }

    #[test]
    fn test_case_functions() {
        assert_eq!(call("capitalize", vec![s("hello")]), Ok(Value::from("Hello")));
        assert_eq!(call("uncapitalize", vec![s("Hello")]), Ok(Value::from("hello")));
        assert_eq!(call("swapcase", vec![s("aB-c")]), Ok(Value::from("Ab-C")));
        assert_eq!(call("uppercase", vec![s("ä")]), Ok(Value::from("Ä")));
    }

    #[test]
    fn test_abbreviate() {
        assert_eq!(
            call("abbreviate", vec![s("abcdefg"), Some(Value::Long(6))]),
            Ok(Value::from("abc..."))
        );
        assert!(call("abbreviate", vec![s("abcdefg"), Some(Value::Long(3))]).is_err());
    }

    #[test]
    fn test_contains_ignore_case() {
        assert_eq!(
            call("contains", vec![s("Hello World"), s("world"), Some(Value::Bool(true))]),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            call("starts_with", vec![s("Hello"), s("he"), Some(Value::Bool(false))]),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn test_substring_with_negative_indexes() {
        assert_eq!(
            call("substring", vec![s("abcdef"), Some(Value::Long(1)), Some(Value::Long(3))]),
            Ok(Value::from("bc"))
        );
        assert_eq!(
            call("substring", vec![s("abcdef"), Some(Value::Long(-2)), None]),
            Ok(Value::from("ef"))
        );
    }

    #[test]
    fn test_split_and_join() {
        assert_eq!(
            call("split", vec![s(","), s("a,b,,"), Some(Value::Long(0))]),
            Ok(Value::List(vec![Value::from("a"), Value::from("b")]))
        );
        assert_eq!(
            call(
                "join",
                vec![Some(Value::List(vec![Value::Long(1), Value::from("x")])), s("-")]
            ),
            Ok(Value::from("1-x"))
        );
    }

    #[test]
    fn test_replace_with_max() {
        assert_eq!(
            call("replace", vec![s("aaa"), s("a"), s("b"), Some(Value::Long(2))]),
            Ok(Value::from("bba"))
        );
    }

    #[test]
    fn test_regex_groups() {
        let result = call(
            "regex",
            vec![s(r"(\w+)@(\w+)"), s("user@host"), Some(Value::List(vec![Value::from("user")]))],
        )
        .unwrap();
        let map = result.as_map().unwrap();
        assert_eq!(map.get("matches"), Some(&Value::Bool(true)));
        assert_eq!(map.get("user"), Some(&Value::from("user")));
        assert_eq!(map.get("1"), Some(&Value::from("host")));
    }

    #[test]
    fn test_regex_replace() {
        assert_eq!(
            call("regex_replace", vec![s(r"\d"), s("a1b2"), s("#"), Some(Value::Bool(false))]),
            Ok(Value::from("a#b2"))
        );
    }

    #[test]
    fn test_pattern_preflight() {
        let pattern = Value::from("(unclosed");
        assert!(pattern_preflight(&[Some(&pattern), None]).is_err());
        assert!(pattern_preflight(&[None, None]).is_ok());
    }

    #[test]
    fn test_patterns_are_compiled_once() {
        let functions = functions();
        let descriptor = functions
            .iter()
            .find(|f| f.descriptor().name == "split")
            .unwrap()
            .descriptor();
        let patterns = PatternCache::default();

        for value in ["a,b", "c,d", "e"] {
            let args = FunctionArgs::new(descriptor, vec![s(","), s(value), Some(Value::Long(0))]);
            assert!(split(&patterns, &args).is_ok());
        }
        assert_eq!(patterns.len(), 1);

        let args = FunctionArgs::new(descriptor, vec![s(";"), s("x;y"), Some(Value::Long(0))]);
        assert!(split(&patterns, &args).is_ok());
        assert_eq!(patterns.len(), 2);

        let invalid = FunctionArgs::new(descriptor, vec![s("(unclosed"), s("x"), None]);
        assert!(split(&patterns, &invalid).is_err());
        assert_eq!(patterns.len(), 2);
    }
}
