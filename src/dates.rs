//! Date parsing for the loosely formatted dates found in progress reports.
//!
//! Every successfully parsed value is expressed in local wall-clock time so that
//! grouping by calendar day never shifts an entry across local midnight.

use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Outcome of parsing a raw date. `Invalid` marks an ungroupable entry; it is
/// never replaced by "now" or an epoch value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    Valid(NaiveDateTime),
    Invalid,
}

impl ParsedDate {
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        match self {
            ParsedDate::Valid(value) => Some(*value),
            ParsedDate::Invalid => None,
        }
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.datetime().map(|value| value.date())
    }
}

/// English and Indonesian month names with the abbreviations seen in the wild.
static MONTHS: &[(&str, u32)] = &[
    ("jan", 1),
    ("january", 1),
    ("januari", 1),
    ("feb", 2),
    ("february", 2),
    ("februari", 2),
    ("peb", 2),
    ("pebruari", 2),
    ("mar", 3),
    ("march", 3),
    ("maret", 3),
    ("apr", 4),
    ("april", 4),
    ("may", 5),
    ("mei", 5),
    ("jun", 6),
    ("june", 6),
    ("juni", 6),
    ("jul", 7),
    ("july", 7),
    ("juli", 7),
    ("aug", 8),
    ("august", 8),
    ("agu", 8),
    ("agt", 8),
    ("ags", 8),
    ("agus", 8),
    ("agustus", 8),
    ("sep", 9),
    ("sept", 9),
    ("september", 9),
    ("oct", 10),
    ("october", 10),
    ("okt", 10),
    ("oktober", 10),
    ("nov", 11),
    ("november", 11),
    ("nop", 11),
    ("nopember", 11),
    ("dec", 12),
    ("december", 12),
    ("des", 12),
    ("desember", 12),
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
];

/// Years a progress record can plausibly carry. Anything outside is a typo.
const PLAUSIBLE_YEARS: RangeInclusive<i32> = 1970..=2100;

pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Parses `raw` against `today` (used for relative tokens).
pub fn parse_date(raw: &str, today: NaiveDate) -> ParsedDate {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ParsedDate::Invalid;
    }

    let lowered = trimmed.to_lowercase();
    match lowered.trim_end_matches(['.', ',']) {
        "today" | "hari ini" => return ParsedDate::Valid(today.and_time(NaiveTime::MIN)),
        "yesterday" | "kemarin" => {
            return today
                .pred_opt()
                .map(|day| ParsedDate::Valid(day.and_time(NaiveTime::MIN)))
                .unwrap_or(ParsedDate::Invalid);
        }
        _ => {}
    }

    let text = strip_weekday(trimmed);
    native_parse(text)
        .or_else(|| parse_parts(text))
        .or_else(|| parse_iso(text))
        .filter(|value| PLAUSIBLE_YEARS.contains(&value.year()))
        .map(ParsedDate::Valid)
        .unwrap_or(ParsedDate::Invalid)
}

/// Local calendar day of `raw`, or `None` when it cannot be parsed.
pub fn calendar_day(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    parse_date(raw, today).day()
}

/// `YYYY-MM-DD` key built from local components.
pub fn day_key(raw: &str, today: NaiveDate) -> Option<String> {
    calendar_day(raw, today).map(format_day_key)
}

pub fn format_day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

// "Thu, Feb 20, 2026" carries a weekday segment; "Feb 20, 2026" has only one comma.
fn strip_weekday(text: &str) -> &str {
    if text.matches(',').count() >= 2 {
        match text.split_once(',') {
            Some((_, rest)) => rest.trim(),
            None => text,
        }
    } else {
        text
    }
}

fn native_parse(text: &str) -> Option<NaiveDateTime> {
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Some(value.with_timezone(&Local).naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(value) = NaiveDateTime::parse_from_str(text, format) {
            return Some(value);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .map(|day| day.and_time(NaiveTime::MIN))
}

fn month_from_name(token: &str) -> Option<u32> {
    let key = token.trim_matches('.').to_lowercase();
    MONTHS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, month)| *month)
}

fn number(token: &str) -> Option<u32> {
    let digits = token
        .trim_matches('.')
        .trim_end_matches(|c: char| c.is_ascii_alphabetic());
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn time_of_day(token: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(token, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(token, "%H:%M"))
        .ok()
}

// Handles "20 Feb 2026", "Feb 20 2026", "14 Agustus 2026 09:15" and similar.
fn parse_parts(text: &str) -> Option<NaiveDateTime> {
    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '/' | '-'))
        .filter(|token| !token.is_empty())
        .collect();

    let month_index = tokens.iter().position(|token| month_from_name(token).is_some())?;
    let month = month_from_name(tokens[month_index])?;

    let before = month_index
        .checked_sub(1)
        .and_then(|index| number(tokens[index]));
    let after: Vec<u32> = tokens[month_index + 1..]
        .iter()
        .filter_map(|token| number(token))
        .collect();

    let (day, year) = match (before, after.as_slice()) {
        (Some(day), [year, ..]) => (day, *year),
        (None, [day, year, ..]) => (*day, *year),
        _ => return None,
    };
    let year = if year < 100 { year + 2000 } else { year };

    let date = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?;
    Some(date.and_time(clock(&tokens).unwrap_or(NaiveTime::MIN)))
}

// First `HH:MM[:SS]` token, honouring an am/pm marker glued on or following it.
fn clock(tokens: &[&str]) -> Option<NaiveTime> {
    let index = tokens.iter().position(|token| token.contains(':'))?;
    let token = tokens[index].to_ascii_lowercase();
    let next = tokens
        .get(index + 1)
        .map(|token| token.to_ascii_lowercase().replace('.', ""));

    let (digits, meridiem) = if let Some(rest) = token.strip_suffix("pm") {
        (rest, Some(true))
    } else if let Some(rest) = token.strip_suffix("am") {
        (rest, Some(false))
    } else {
        match next.as_deref() {
            Some("pm") => (token.as_str(), Some(true)),
            Some("am") => (token.as_str(), Some(false)),
            _ => (token.as_str(), None),
        }
    };
    let time = time_of_day(digits)?;

    let Some(pm) = meridiem else {
        return Some(time);
    };
    let hour = match (time.hour(), pm) {
        (0, _) | (13.., _) => return None,
        (12, false) => 0,
        (12, true) => 12,
        (hour, true) => hour + 12,
        (hour, false) => hour,
    };
    time.with_hour(hour)
}

fn parse_iso(text: &str) -> Option<NaiveDateTime> {
    let bytes = text.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(index, byte)| index == 4 || index == 7 || byte.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|day| day.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn weekday_prefixed_and_indonesian_forms_agree() {
        let expected = day(2026, 2, 14);
        assert_eq!(calendar_day("Sat, Feb 14, 2026", today()), expected);
        assert_eq!(calendar_day("Feb 14, 2026", today()), expected);
        assert_eq!(calendar_day("14 Februari 2026", today()), expected);
        assert_eq!(calendar_day("14 Feb 2026", today()), expected);
    }

    #[test]
    fn one_comma_weekday_form_falls_through_to_parts() {
        assert_eq!(strip_weekday("Sat, 14 Feb 2026"), "Sat, 14 Feb 2026");
        assert_eq!(calendar_day("Sat, 14 Feb 2026", today()), day(2026, 2, 14));
        assert_eq!(calendar_day("Kamis, 20 Februari 2026", today()), day(2026, 2, 20));
    }

    #[test]
    fn implausible_years_are_invalid() {
        assert_eq!(parse_date("0200/01/01", today()), ParsedDate::Invalid);
        assert_eq!(parse_date("-200000/01/01", today()), ParsedDate::Invalid);
        assert_eq!(parse_date("14 Feb 9026", today()), ParsedDate::Invalid);
        assert_eq!(calendar_day("1970/01/01", today()), day(1970, 1, 1));
    }

    #[test]
    fn meridiem_markers_shift_the_hour() {
        let at = |h, m| day(2026, 2, 14).unwrap().and_hms_opt(h, m, 0).unwrap();
        assert_eq!(
            parse_date("Sat, Feb 14, 2026 11:30 PM", today()),
            ParsedDate::Valid(at(23, 30))
        );
        assert_eq!(
            parse_date("14 Feb 2026 12:05am", today()),
            ParsedDate::Valid(at(0, 5))
        );
        assert_eq!(
            parse_date("14 Feb 2026 12:05 p.m.", today()),
            ParsedDate::Valid(at(12, 5))
        );
        assert_eq!(
            parse_date("14 Feb 2026 09:15 am", today()),
            ParsedDate::Valid(at(9, 15))
        );
    }

    #[test]
    fn single_comma_is_not_treated_as_weekday() {
        assert_eq!(strip_weekday("Feb 20, 2026"), "Feb 20, 2026");
        assert_eq!(strip_weekday("Thu, Feb 20, 2026"), "Feb 20, 2026");
    }

    #[test]
    fn relative_tokens_resolve_to_local_midnight() {
        let yesterday = day(2026, 2, 13).unwrap().and_time(NaiveTime::MIN);
        assert_eq!(parse_date("Kemarin", today()), ParsedDate::Valid(yesterday));
        assert_eq!(parse_date("yesterday", today()), ParsedDate::Valid(yesterday));
        assert_eq!(
            parse_date("Hari Ini", today()),
            ParsedDate::Valid(today().and_time(NaiveTime::MIN))
        );
    }

    #[test]
    fn garbage_is_invalid_not_today() {
        assert_eq!(parse_date("not a date", today()), ParsedDate::Invalid);
        assert_eq!(parse_date("", today()), ParsedDate::Invalid);
        assert_eq!(day_key("not a date", today()), None);
    }

    #[test]
    fn indonesian_august_variants() {
        for raw in ["3 Agu 2026", "3 agt 2026", "3 Ags 2026", "3 Agustus 2026"] {
            assert_eq!(calendar_day(raw, today()), day(2026, 8, 3), "{raw}");
        }
    }

    #[test]
    fn part_extraction_keeps_time() {
        let parsed = parse_date("20 Mei 2026 09:15", today());
        let expected = day(2026, 5, 20).unwrap().and_hms_opt(9, 15, 0).unwrap();
        assert_eq!(parsed, ParsedDate::Valid(expected));
    }

    #[test]
    fn strict_iso_and_keys() {
        assert_eq!(day_key("2026-02-10", today()).as_deref(), Some("2026-02-10"));
        assert_eq!(parse_date("2026-2-1x", today()), ParsedDate::Invalid);
        assert_eq!(parse_date("2026-02-30", today()), ParsedDate::Invalid);
    }

    #[test]
    fn naive_timestamps_keep_their_local_day() {
        assert_eq!(
            day_key("2026-02-14 23:59:00", today()).as_deref(),
            Some("2026-02-14")
        );
    }
}
