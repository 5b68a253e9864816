//! The `format` keyword.
//!
//! Always annotates with the format name. Asserts only when the active
//! vocabulary set enables format assertion (or the caller forces it); in
//! that mode unknown format names pass unless the caller opted into
//! known-formats-only.

use std::net::{Ipv4Addr, Ipv6Addr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::context::KeywordOutcome;
use crate::draft::DraftRange;
use crate::keyword::{KeywordClass, KeywordSpec};
use crate::vocabulary::Vocabulary;

use super::KeywordEnv;

pub fn specs() -> Vec<KeywordSpec> {
    vec![KeywordSpec {
        name: "format",
        class: KeywordClass::Assertion,
        drafts: DraftRange::all(),
        vocabulary: Vocabulary::FormatAnnotation,
        depends_on: &[],
    }]
}

pub fn eval_format(
    env: &KeywordEnv<'_>,
    name: &str,
) -> crate::error::Result<KeywordOutcome> {
    if !env.assert_format {
        return Ok(KeywordOutcome::annotate("format", json!(name)));
    }
    let Some(s) = env.instance.as_str() else {
        return Ok(KeywordOutcome::annotate("format", json!(name)));
    };
    match validator(name) {
        Some(valid) => {
            if valid(s) {
                Ok(KeywordOutcome::annotate("format", json!(name)))
            } else {
                Ok(KeywordOutcome::fail(
                    "format",
                    format!("string is not a valid {name}"),
                ))
            }
        }
        None if env.only_known_formats => Ok(KeywordOutcome::fail(
            "format",
            format!("unknown format {name:?}"),
        )),
        None => Ok(KeywordOutcome::annotate("format", json!(name))),
    }
}

/// The format validators the engine knows.
fn validator(name: &str) -> Option<fn(&str) -> bool> {
    Some(match name {
        "date-time" => is_date_time,
        "date" => is_date,
        "time" => is_time,
        "duration" => is_duration,
        "email" => is_email,
        "hostname" => is_hostname,
        "ipv4" => is_ipv4,
        "ipv6" => is_ipv6,
        "uri" => is_uri,
        "uri-reference" => is_uri_reference,
        "uuid" => is_uuid,
        "json-pointer" => is_json_pointer,
        "regex" => is_regex,
        _ => return None,
    })
}

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn is_date(s: &str) -> bool {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap());
    let Some(captures) = RE.captures(s) else {
        return false;
    };
    let year: u32 = captures[1].parse().unwrap_or(0);
    let month: u32 = captures[2].parse().unwrap_or(0);
    let day: u32 = captures[3].parse().unwrap_or(0);
    let days_in_month = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => return false,
    };
    (1..=days_in_month).contains(&day)
}

fn is_time(s: &str) -> bool {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(\d{2}):(\d{2}):(\d{2})(\.\d+)?([zZ]|[+-]\d{2}:\d{2})$").unwrap()
    });
    let Some(captures) = RE.captures(s) else {
        return false;
    };
    let hour: u32 = captures[1].parse().unwrap_or(99);
    let minute: u32 = captures[2].parse().unwrap_or(99);
    // 60 admits leap seconds.
    let second: u32 = captures[3].parse().unwrap_or(99);
    if hour > 23 || minute > 59 || second > 60 {
        return false;
    }
    if let Some(offset) = captures.get(5) {
        let offset = offset.as_str();
        if let Some(rest) = offset.strip_prefix(['+', '-']) {
            let (oh, om) = rest.split_once(':').unwrap_or(("99", "99"));
            let oh: u32 = oh.parse().unwrap_or(99);
            let om: u32 = om.parse().unwrap_or(99);
            if oh > 23 || om > 59 {
                return false;
            }
        }
    }
    true
}

fn is_date_time(s: &str) -> bool {
    match s.split_once(['T', 't']) {
        Some((date, time)) => is_date(date) && is_time(time),
        None => false,
    }
}

fn is_duration(s: &str) -> bool {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"^P(?:\d+W|(?:\d+Y)?(?:\d+M)?(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+(?:\.\d+)?S)?)?)$",
        )
        .unwrap()
    });
    // "P" and "PT" alone carry no components.
    s != "P" && !s.ends_with('T') && RE.is_match(s)
}

fn is_email(s: &str) -> bool {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*$").unwrap()
    });
    RE.is_match(s)
}

fn is_hostname(s: &str) -> bool {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$").unwrap()
    });
    s.len() <= 253 && RE.is_match(s)
}

fn is_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}

fn is_ipv6(s: &str) -> bool {
    s.parse::<Ipv6Addr>().is_ok()
}

fn is_uri(s: &str) -> bool {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:\S*$").unwrap());
    RE.is_match(s)
}

fn is_uri_reference(s: &str) -> bool {
    !s.contains(char::is_whitespace)
}

fn is_uuid(s: &str) -> bool {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .unwrap()
    });
    RE.is_match(s)
}

fn is_json_pointer(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    if !s.starts_with('/') {
        return false;
    }
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.next(), Some('0') | Some('1')) {
            return false;
        }
    }
    true
}

fn is_regex(s: &str) -> bool {
    Regex::new(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date() {
        assert!(is_date("2024-02-29"));
        assert!(!is_date("2023-02-29"));
        assert!(!is_date("2024-13-01"));
        assert!(!is_date("2024-1-01"));
    }

    #[test]
    fn test_time() {
        assert!(is_time("23:59:60Z"));
        assert!(is_time("12:00:00+05:30"));
        assert!(!is_time("24:00:00Z"));
        assert!(!is_time("12:00:00"));
    }

    #[test]
    fn test_date_time() {
        assert!(is_date_time("2024-06-01T12:30:00Z"));
        assert!(is_date_time("2024-06-01t12:30:00.5-07:00"));
        assert!(!is_date_time("2024-06-01 12:30:00Z"));
    }

    #[test]
    fn test_duration() {
        assert!(is_duration("P1Y2M3DT4H5M6S"));
        assert!(is_duration("PT0.5S"));
        assert!(is_duration("P4W"));
        assert!(!is_duration("P"));
        assert!(!is_duration("P1YT"));
    }

    #[test]
    fn test_addresses() {
        assert!(is_ipv4("192.168.0.1"));
        assert!(!is_ipv4("256.0.0.1"));
        assert!(!is_ipv4("01.2.3.4"));
        assert!(is_ipv6("::1"));
        assert!(is_ipv6("2001:db8::8a2e:370:7334"));
        assert!(!is_ipv6("12345::"));
    }

    #[test]
    fn test_names() {
        assert!(is_hostname("example.com"));
        assert!(!is_hostname("-bad.example"));
        assert!(is_email("a.b@example.com"));
        assert!(!is_email("not an email"));
        assert!(is_uuid("123e4567-e89b-12d3-a456-426614174000"));
        assert!(!is_uuid("123e4567e89b12d3a456426614174000"));
    }

    #[test]
    fn test_pointers_and_uris() {
        assert!(is_json_pointer(""));
        assert!(is_json_pointer("/a/~0b/~1c"));
        assert!(!is_json_pointer("a/b"));
        assert!(!is_json_pointer("/a~2"));
        assert!(is_uri("https://example.com/x?y=1"));
        assert!(!is_uri("example.com/x"));
        assert!(is_uri_reference("/relative/path"));
    }

    #[test]
    fn test_regex_format() {
        assert!(is_regex("^a+$"));
        assert!(!is_regex("(unclosed"));
    }
}
