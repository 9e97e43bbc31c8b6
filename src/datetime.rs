// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Time-of-day and timestamp values.
//!
//! Calendar dates use [`chrono::NaiveDate`] directly.

use core::fmt::{self, Debug, Display, Formatter};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use lazy_static::lazy_static;
use regex::Regex;

pub const MAX_TIME_PRECISION: u8 = 9;

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const SECONDS_PER_DAY: i64 = 86_400;

lazy_static! {
    static ref TIME_PATTERN: Regex = Regex::new(
        r"^(\d{2}):(\d{2}):(\d{2})(?:\.(\d+))?(?:([+-])(\d{2}):(\d{2}))?$"
    )
    .unwrap_or_else(|e| panic!("invalid time pattern: {e}"));
    static ref DATE_PATTERN: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$")
        .unwrap_or_else(|e| panic!("invalid date pattern: {e}"));
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    if !DATE_PATTERN.is_match(text) {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

fn write_offset(f: &mut Formatter<'_>, offset_minutes: i32) -> fmt::Result {
    let sign = if offset_minutes < 0 { '-' } else { '+' };
    let abs = offset_minutes.unsigned_abs();
    write!(f, "{sign}{:02}:{:02}", abs / 60, abs % 60)
}

fn write_fraction(f: &mut Formatter<'_>, nanos: u32, digits: u8) -> fmt::Result {
    if digits == 0 {
        return Ok(());
    }
    let all = format!("{nanos:09}");
    write!(f, ".{}", &all[..usize::from(digits.min(MAX_TIME_PRECISION))])
}

/// Round nanoseconds to `precision` fractional digits, ties away from zero.
/// Returns the rounded nanoseconds and whether rounding carried into the next second.
fn round_nanos(nanos: u32, precision: u8) -> (u32, bool) {
    let precision = precision.min(MAX_TIME_PRECISION);
    let unit = 10u32.pow(u32::from(MAX_TIME_PRECISION - precision));
    let rounded = (nanos + unit / 2) / unit * unit;
    if rounded >= 1_000_000_000 {
        (0, true)
    } else {
        (rounded, false)
    }
}

/// A time of day with a fractional-second precision and an optional UTC offset.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Time {
    time: NaiveTime,
    precision: u8,
    offset_minutes: Option<i32>,
}

impl Time {
    /// Build a time, rounding its fraction to `precision` digits.
    ///
    /// Rounding past the last nanosecond of the day wraps to midnight.
    pub fn new(time: NaiveTime, precision: u8, offset_minutes: Option<i32>) -> Self {
        let precision = precision.min(MAX_TIME_PRECISION);
        let nanos = time.nanosecond() % 1_000_000_000;
        let (nanos, carry) = round_nanos(nanos, precision);
        let base = NaiveTime::from_num_seconds_from_midnight_opt(time.num_seconds_from_midnight(), nanos)
            .unwrap_or(time);
        let time = if carry {
            base.overflowing_add_signed(Duration::seconds(1)).0
        } else {
            base
        };
        Self {
            time,
            precision,
            offset_minutes,
        }
    }

    pub fn from_hms_nano(
        hour: u32,
        minute: u32,
        second: u32,
        nano: u32,
        precision: u8,
        offset_minutes: Option<i32>,
    ) -> Option<Self> {
        NaiveTime::from_hms_nano_opt(hour, minute, second, nano)
            .map(|t| Self::new(t, precision, offset_minutes))
    }

    /// Parse `HH:MM:SS[.fff][+HH:MM]`. The precision is the number of fraction digits given.
    pub fn parse(text: &str) -> Option<Time> {
        let caps = TIME_PATTERN.captures(text)?;
        let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        let (hour, minute, second) = (num(1)?, num(2)?, num(3)?);
        let (nanos, precision) = match caps.get(4) {
            Some(frac) => {
                let digits = frac.as_str();
                let mut padded = digits.chars().take(9).collect::<String>();
                while padded.len() < 9 {
                    padded.push('0');
                }
                let precision = u8::try_from(digits.len()).ok()?.min(MAX_TIME_PRECISION);
                (padded.parse::<u32>().ok()?, precision)
            }
            None => (0, 0),
        };
        let offset = match caps.get(5) {
            Some(sign) => {
                let (h, m) = (num(6)?, num(7)?);
                if h > 23 || m > 59 {
                    return None;
                }
                let minutes = i32::try_from(h * 60 + m).ok()?;
                Some(if sign.as_str() == "-" { -minutes } else { minutes })
            }
            None => None,
        };
        let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?;
        Some(Time::new(time, precision, offset))
    }

    pub fn with_precision(&self, precision: u8) -> Time {
        Time::new(self.time, precision, self.offset_minutes)
    }

    pub fn with_offset(&self, offset_minutes: Option<i32>) -> Time {
        Time {
            offset_minutes,
            ..*self
        }
    }

    pub fn naive(&self) -> NaiveTime {
        self.time
    }

    pub fn hour(&self) -> u32 {
        self.time.hour()
    }

    pub fn minute(&self) -> u32 {
        self.time.minute()
    }

    pub fn second(&self) -> u32 {
        self.time.second()
    }

    pub fn nanosecond(&self) -> u32 {
        self.time.nanosecond() % 1_000_000_000
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn offset_minutes(&self) -> Option<i32> {
        self.offset_minutes
    }

    /// Nanoseconds since midnight, shifted to UTC when an offset is known.
    pub fn normalized_nanos(&self) -> i64 {
        let local = i64::from(self.time.num_seconds_from_midnight()) * NANOS_PER_SECOND
            + i64::from(self.nanosecond());
        let shift = i64::from(self.offset_minutes.unwrap_or(0)) * 60 * NANOS_PER_SECOND;
        (local - shift).rem_euclid(SECONDS_PER_DAY * NANOS_PER_SECOND)
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hour(),
            self.minute(),
            self.second()
        )?;
        write_fraction(f, self.nanosecond(), self.precision)?;
        if let Some(offset) = self.offset_minutes {
            write_offset(f, offset)?;
        }
        Ok(())
    }
}

impl Debug for Time {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// Granularity a timestamp was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimestampPrecision {
    Year,
    Month,
    Day,
    Minute,
    Second,
    Fraction(u8),
}

/// A point in time. An unknown local offset is `None`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    datetime: NaiveDateTime,
    offset_minutes: Option<i32>,
    precision: TimestampPrecision,
}

impl Timestamp {
    pub fn new(
        datetime: NaiveDateTime,
        offset_minutes: Option<i32>,
        precision: TimestampPrecision,
    ) -> Self {
        Self {
            datetime,
            offset_minutes,
            precision,
        }
    }

    /// Parse timestamp text: `2007T`, `2007-02T`, `2007-02-23`, `2007-02-23T12:14Z`,
    /// `2007-02-23T12:14:33.079-08:00`. An offset of `-00:00` means unknown.
    pub fn parse(text: &str) -> Option<Timestamp> {
        let year_end = text.find(['-', 'T'])?;
        if year_end != 4 {
            return None;
        }
        let year = text[..4].parse::<i32>().ok()?;
        let rest = &text[4..];

        if rest == "T" {
            let date = NaiveDate::from_ymd_opt(year, 1, 1)?;
            return Some(Self::new(date.and_time(NaiveTime::MIN), None, TimestampPrecision::Year));
        }

        let rest = rest.strip_prefix('-')?;
        let month = rest.get(..2)?.parse::<u32>().ok()?;
        let rest = &rest[2..];
        if rest == "T" {
            let date = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(Self::new(date.and_time(NaiveTime::MIN), None, TimestampPrecision::Month));
        }

        let rest = rest.strip_prefix('-')?;
        let day = rest.get(..2)?.parse::<u32>().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let rest = &rest[2..];
        if rest.is_empty() || rest == "T" {
            return Some(Self::new(date.and_time(NaiveTime::MIN), None, TimestampPrecision::Day));
        }

        let rest = rest.strip_prefix('T')?;
        let hour = rest.get(..2)?.parse::<u32>().ok()?;
        let rest = rest.get(2..)?.strip_prefix(':')?;
        let minute = rest.get(..2)?.parse::<u32>().ok()?;
        let mut rest = &rest[2..];

        let mut second = 0;
        let mut nanos = 0;
        let mut precision = TimestampPrecision::Minute;
        if let Some(after) = rest.strip_prefix(':') {
            second = after.get(..2)?.parse::<u32>().ok()?;
            rest = &after[2..];
            precision = TimestampPrecision::Second;
            if let Some(after) = rest.strip_prefix('.') {
                let digits_len = after.find(|c: char| !c.is_ascii_digit()).unwrap_or(after.len());
                if digits_len == 0 {
                    return None;
                }
                let digits = &after[..digits_len];
                let mut padded = digits.chars().take(9).collect::<String>();
                while padded.len() < 9 {
                    padded.push('0');
                }
                nanos = padded.parse::<u32>().ok()?;
                precision = TimestampPrecision::Fraction(
                    u8::try_from(digits_len).ok()?.min(MAX_TIME_PRECISION),
                );
                rest = &after[digits_len..];
            }
        }

        let offset_minutes = match rest {
            "Z" | "z" => Some(0),
            "-00:00" => None,
            _ => {
                let sign = match rest.get(..1)? {
                    "+" => 1,
                    "-" => -1,
                    _ => return None,
                };
                let h = rest.get(1..3)?.parse::<i32>().ok()?;
                if rest.get(3..4)? != ":" || rest.len() != 6 {
                    return None;
                }
                let m = rest.get(4..6)?.parse::<i32>().ok()?;
                if h > 23 || m > 59 {
                    return None;
                }
                Some(sign * (h * 60 + m))
            }
        };

        let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?;
        Some(Self::new(date.and_time(time), offset_minutes, precision))
    }

    pub fn naive_local(&self) -> NaiveDateTime {
        self.datetime
    }

    /// The instant expressed in UTC; an unknown offset is treated as UTC.
    pub fn naive_utc(&self) -> NaiveDateTime {
        self.datetime - Duration::minutes(i64::from(self.offset_minutes.unwrap_or(0)))
    }

    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }

    pub fn offset_minutes(&self) -> Option<i32> {
        self.offset_minutes
    }

    pub fn precision(&self) -> TimestampPrecision {
        self.precision
    }

    pub fn fraction_digits(&self) -> u8 {
        match self.precision {
            TimestampPrecision::Fraction(d) => d,
            _ => 0,
        }
    }

    /// Local time of day, carrying the timestamp's offset.
    pub fn time(&self) -> Time {
        Time::new(self.datetime.time(), self.fraction_digits(), self.offset_minutes)
    }

    pub fn is_midnight(&self) -> bool {
        self.datetime.time() == NaiveTime::MIN
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let d = self.datetime;
        match self.precision {
            TimestampPrecision::Year => return write!(f, "{:04}T", d.year()),
            TimestampPrecision::Month => return write!(f, "{:04}-{:02}T", d.year(), d.month()),
            TimestampPrecision::Day => {
                return write!(f, "{:04}-{:02}-{:02}", d.year(), d.month(), d.day())
            }
            _ => {}
        }
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}",
            d.year(),
            d.month(),
            d.day(),
            d.hour(),
            d.minute()
        )?;
        if self.precision != TimestampPrecision::Minute {
            write!(f, ":{:02}", d.second())?;
            write_fraction(f, d.nanosecond() % 1_000_000_000, self.fraction_digits())?;
        }
        match self.offset_minutes {
            Some(0) => f.write_str("Z"),
            Some(offset) => write_offset(f, offset),
            None => f.write_str("-00:00"),
        }
    }
}

impl Debug for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}
