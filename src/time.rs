use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{DateTime, ParseResult, Utc};

use crate::error::{Result, StacError};

pub const DEFAULT_TIME_PATTERN: &str = "%Y-%m-%d";

/// Parses `input` with a strftime-style `pattern` and reads the result as UTC.
///
/// Fields the pattern leaves out take the strptime defaults: year 1900,
/// January, day 1 and midnight. `%Y-%m` therefore resolves to the first of the
/// month and `%Y-%m-%d %H` keeps its hour.
pub fn parse_time(input: &str, pattern: &str) -> Result<DateTime<Utc>> {
    let to_error = |source: chrono::ParseError| StacError::TimeParse {
        input: input.to_string(),
        pattern: pattern.to_string(),
        source,
    };

    let mut parsed = Parsed::new();
    parse(&mut parsed, input, StrftimeItems::new(pattern)).map_err(to_error)?;
    fill_missing_fields(&mut parsed).map_err(to_error)?;

    // オフセットは無視してUTCとして扱う
    let naive = parsed.to_naive_datetime_with_offset(0).map_err(to_error)?;
    Ok(naive.and_utc())
}

fn fill_missing_fields(parsed: &mut Parsed) -> ParseResult<()> {
    let has_year = parsed.year().is_some()
        || parsed.year_div_100().is_some()
        || parsed.year_mod_100().is_some()
        || parsed.isoyear().is_some();
    let has_other_calendar = parsed.ordinal().is_some()
        || parsed.isoweek().is_some()
        || parsed.week_from_sun().is_some()
        || parsed.week_from_mon().is_some();

    if !has_year {
        parsed.set_year(1900)?;
    }
    if !has_other_calendar {
        if parsed.month().is_none() {
            parsed.set_month(1)?;
        }
        if parsed.day().is_none() {
            parsed.set_day(1)?;
        }
    }

    match (parsed.hour_div_12(), parsed.hour_mod_12()) {
        (None, None) => parsed.set_hour(0)?,
        // %I without %p reads as AM
        (None, Some(_)) => parsed.set_ampm(false)?,
        _ => {}
    }
    if parsed.minute().is_none() {
        parsed.set_minute(0)?;
    }
    if parsed.second().is_none() {
        parsed.set_second(0)?;
    }

    Ok(())
}

/// Closed time window used by the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn parse(start: &str, end: &str, pattern: &str) -> Result<Self> {
        Ok(Self::new(
            parse_time(start, pattern)?,
            parse_time(end, pattern)?,
        ))
    }

    /// `start <= time <= end`.
    pub fn contains(&self, time: &DateTime<Utc>) -> bool {
        self.start <= *time && *time <= self.end
    }

    /// Overlap with an interval whose `None` bounds are open-ended.
    /// An interval without any bound is treated as unknown and never overlaps.
    pub fn overlaps(&self, start: Option<&DateTime<Utc>>, end: Option<&DateTime<Utc>>) -> bool {
        if start.is_none() && end.is_none() {
            return false;
        }

        end.map_or(true, |end| self.start <= *end) && start.map_or(true, |start| self.end >= *start)
    }
}
