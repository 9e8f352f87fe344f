//! 日期规范化 (Date Formatting)
//!
//! 可解析的日期统一输出为 UTC ISO-8601 (毫秒精度)；无时区信息的输入按 UTC 处理。

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use tracing::warn;

/// 带偏移量的时间戳 (`+0000` 与 `+00:00` 均可)
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S %z",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%B %d %Y %I:%M:%S %p",
    "%B %d %Y %I:%M %p",
    "%b %d %Y %I:%M %p",
    "%B %d %Y %H:%M",
    "%d %B %Y %H:%M",
    "%m/%d/%Y %I:%M %p",
];

/// 日期格式；人类可读格式在逗号移除后匹配
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%m/%d/%Y",
];

fn weekday_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+").unwrap())
}

fn ordinal_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").unwrap())
}

/// 去掉星期前缀、序数后缀与逗号，合并空白
fn normalize(raw: &str) -> String {
    let text = weekday_prefix().replace(raw, "");
    let text = ordinal_suffix().replace_all(&text, "$1");
    text.replace(',', " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_exact(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .ok()
        .or_else(|| {
            OFFSET_FORMATS
                .iter()
                .find_map(|f| DateTime::parse_from_str(raw, f).ok())
        })
        .map(|d| d.with_timezone(&Utc))
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
                .map(|n| n.and_utc())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|n| n.and_utc())
        })
}

fn parse(raw: &str) -> Option<DateTime<Utc>> {
    parse_exact(raw)
        .or_else(|| {
            let normalized = normalize(raw);
            (normalized != raw).then(|| parse_exact(&normalized)).flatten()
        })
        .or_else(|| dateparser::parse_with_timezone(raw, &Utc).ok())
}

/// 格式化日期；无法解析时原样返回并记录警告
pub fn format_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    match parse(trimmed) {
        Some(date) => date.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => {
            warn!("Could not parse date: {}", raw);
            raw.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_readable_dates_become_utc_instants() {
        assert_eq!(format_date("2024-03-05T10:00:00+02:00"), "2024-03-05T08:00:00.000Z");
        assert_eq!(format_date("2024-03-05"), "2024-03-05T00:00:00.000Z");
        assert_eq!(format_date("Tue, 05 Mar 2024 10:00:00 GMT"), "2024-03-05T10:00:00.000Z");
    }

    #[test]
    fn compact_offsets_are_accepted() {
        assert_eq!(format_date("2024-03-05T10:00:00+0000"), "2024-03-05T10:00:00.000Z");
        assert_eq!(format_date("2024-03-05T10:00:00.250-0500"), "2024-03-05T15:00:00.250Z");
    }

    #[test]
    fn human_dates_are_parsed() {
        assert_eq!(format_date("March 5, 2024"), "2024-03-05T00:00:00.000Z");
        assert_eq!(format_date("Mar 15, 2024"), "2024-03-15T00:00:00.000Z");
        assert_eq!(format_date("March 5 2024"), "2024-03-05T00:00:00.000Z");
        assert_eq!(format_date("5 March 2024"), "2024-03-05T00:00:00.000Z");
    }

    #[test]
    fn bylines_with_weekdays_and_clock_times() {
        assert_eq!(format_date("Tuesday, March 5, 2024"), "2024-03-05T00:00:00.000Z");
        assert_eq!(format_date("Mar 5, 2024 10:30 AM"), "2024-03-05T10:30:00.000Z");
        assert_eq!(format_date("March 5th, 2024 2:15 PM"), "2024-03-05T14:15:00.000Z");
    }

    #[test]
    fn normalize_strips_byline_noise() {
        assert_eq!(normalize("Tuesday, March 5th,  2024"), "March 5 2024");
        assert_eq!(normalize("Sat. 2 Mar 2024"), "2 Mar 2024");
    }

    #[test]
    fn unparseable_dates_are_kept() {
        assert_eq!(format_date("sometime last week"), "sometime last week");
        assert_eq!(format_date("   "), "");
    }
}
