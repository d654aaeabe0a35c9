// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Target-specific literal syntax for directive arguments.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// How a target writes date and time constants.
pub trait LiteralStyle {
    /// Date constant.
    fn date(&self, value: NaiveDate) -> String;

    /// Time of day constant.
    fn time(&self, value: NaiveTime) -> String;

    /// Date-time constant.
    fn datetime(&self, value: NaiveDateTime) -> String;

    /// Quote character for membership lists of textual columns.
    fn quote(&self) -> char {
        '\''
    }
}

/// Constructor-call literals shared by the bundled targets.
///
/// `ctor_date`, `ctor_time` and `ctor_datetime` are called with their
/// components as integer arguments, e.g. `datetime.date(2024, 1, 31)`.
#[derive(Debug, Clone, Copy)]
pub struct ConstructorStyle {
    /// Date constructor.
    pub ctor_date: &'static str,

    /// Time constructor.
    pub ctor_time: &'static str,

    /// Date-time constructor.
    pub ctor_datetime: &'static str,

    /// Months counted from zero (JavaScript `Date`).
    pub zero_based_month: bool,

    /// Quote for textual list members.
    pub quote: char
}

impl ConstructorStyle {
    fn month(&self, month: u32) -> u32 {
        if self.zero_based_month { month - 1 } else { month }
    }
}

impl LiteralStyle for ConstructorStyle {
    fn date(&self, value: NaiveDate) -> String {
        format!(
            "{}({}, {}, {})",
            self.ctor_date,
            value.year(),
            self.month(value.month()),
            value.day()
        )
    }

    fn time(&self, value: NaiveTime) -> String {
        format!(
            "{}({}, {}, {})",
            self.ctor_time,
            value.hour(),
            value.minute(),
            value.second()
        )
    }

    fn datetime(&self, value: NaiveDateTime) -> String {
        format!(
            "{}({}, {}, {}, {}, {}, {})",
            self.ctor_datetime,
            value.year(),
            self.month(value.month()),
            value.day(),
            value.hour(),
            value.minute(),
            value.second()
        )
    }

    fn quote(&self) -> char {
        self.quote
    }
}

pub(super) fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

pub(super) fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

pub(super) fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .into_iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| parse_date(text).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PY: ConstructorStyle = ConstructorStyle {
        ctor_date:        "datetime.date",
        ctor_time:        "datetime.time",
        ctor_datetime:    "datetime.datetime",
        zero_based_month: false,
        quote:            '\''
    };

    #[test]
    fn date_constructor() {
        let d = parse_date("2024-01-31").unwrap();
        assert_eq!(PY.date(d), "datetime.date(2024, 1, 31)");
    }

    #[test]
    fn zero_based_month() {
        let js = ConstructorStyle {
            ctor_date: "new Date",
            zero_based_month: true,
            ..PY
        };
        assert_eq!(js.date(parse_date("2024-01-31").unwrap()), "new Date(2024, 0, 31)");
    }

    #[test]
    fn datetime_accepts_plain_date() {
        let dt = parse_datetime("2024-02-01").unwrap();
        assert_eq!(PY.datetime(dt), "datetime.datetime(2024, 2, 1, 0, 0, 0)");
        assert!(parse_datetime("2024-02-01T10:11:12").is_some());
    }

    #[test]
    fn time_with_or_without_seconds() {
        assert_eq!(PY.time(parse_time("08:30").unwrap()), "datetime.time(8, 30, 0)");
        assert!(parse_time("25:00").is_none());
    }
}
