//! Interval tokens
//!
//! Parses the ISO-8601 duration subset accepted for bucketed queries and
//! translates it into the engine's native interval syntax.
//!
//! # Supported Syntax
//!
//! ```text
//! P[nY][nM][nW][nD][T[nH][nM]]
//! ```
//!
//! A `T` switches the vocabulary from date units (`YEAR`, `MONTH`, `WEEK`,
//! `DAY`) to time units (`HOUR`, `MINUTE`), so `P1M` is one month while
//! `PT1M` is one minute. Engine intervals carry exactly one magnitude and
//! unit, so tokens with several components are rejected here instead of
//! producing an interval clause the engine would refuse.
//!
//! Widths are capped at [`MAX_INTERVAL_YEARS`] so that bucket boundaries
//! stay inside the engine's calendar range (years 0000 through 9999).
//!
//! # Examples
//!
//! ```text
//! P1Y   -> 1 YEAR
//! P1M   -> 1 MONTH
//! P2W   -> 2 WEEK
//! PT6H  -> 6 HOUR
//! PT15M -> 15 MINUTE
//! ```

use nom::{
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, map_res, opt},
    multi::{many0, many1},
    sequence::{pair, preceded},
    IResult,
};

use crate::query::error::{QueryError, QueryResult};

/// Widest accepted interval, in years
pub const MAX_INTERVAL_YEARS: u32 = 1000;

/// Unit of a bucket interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
}

impl IntervalUnit {
    /// Resolve a designator letter in the date or time part of a token
    fn from_designator(designator: char, time_part: bool) -> Option<Self> {
        match (time_part, designator) {
            (false, 'Y') => Some(Self::Year),
            (false, 'M') => Some(Self::Month),
            (false, 'W') => Some(Self::Week),
            (false, 'D') => Some(Self::Day),
            (true, 'H') => Some(Self::Hour),
            (true, 'M') => Some(Self::Minute),
            _ => None,
        }
    }

    /// Spelled-out unit name used in engine interval clauses
    pub fn sql_name(&self) -> &'static str {
        match self {
            Self::Year => "YEAR",
            Self::Month => "MONTH",
            Self::Week => "WEEK",
            Self::Day => "DAY",
            Self::Hour => "HOUR",
            Self::Minute => "MINUTE",
        }
    }

    /// Largest magnitude whose width stays within [`MAX_INTERVAL_YEARS`]
    pub fn max_amount(&self) -> u32 {
        match self {
            Self::Year => MAX_INTERVAL_YEARS,
            Self::Month => MAX_INTERVAL_YEARS * 12,
            Self::Week => MAX_INTERVAL_YEARS * 52,
            Self::Day => MAX_INTERVAL_YEARS * 365,
            Self::Hour => MAX_INTERVAL_YEARS * 365 * 24,
            Self::Minute => MAX_INTERVAL_YEARS * 365 * 24 * 60,
        }
    }

    /// Fixed width in seconds, for units that have one
    pub fn fixed_seconds(&self) -> Option<i64> {
        match self {
            Self::Year | Self::Month => None,
            Self::Week => Some(7 * 24 * 3600),
            Self::Day => Some(24 * 3600),
            Self::Hour => Some(3600),
            Self::Minute => Some(60),
        }
    }
}

/// A validated bucket interval: one magnitude and one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub amount: u32,
    pub unit: IntervalUnit,
}

impl Interval {
    pub fn new(amount: u32, unit: IntervalUnit) -> Self {
        Self { amount, unit }
    }

    /// Parse and validate an interval token
    pub fn parse(token: &str) -> QueryResult<Self> {
        let (_, (date_part, time_part)) = all_consuming(duration)(token)
            .map_err(|_| invalid(token, "expected an ISO-8601 duration such as P1M or PT6H"))?;

        let mut components = date_part
            .into_iter()
            .map(|(amount, designator)| (amount, designator, false))
            .chain(
                time_part
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(amount, designator)| (amount, designator, true)),
            );

        let (amount, designator, is_time) = components
            .next()
            .ok_or_else(|| invalid(token, "duration has no components"))?;

        if components.next().is_some() {
            return Err(invalid(
                token,
                "only a single duration component is supported",
            ));
        }

        if amount == 0 {
            return Err(invalid(token, "magnitude must be greater than zero"));
        }

        let unit = IntervalUnit::from_designator(designator, is_time)
            .ok_or_else(|| invalid(token, "unsupported duration unit"))?;

        if amount > unit.max_amount() {
            return Err(invalid(
                token,
                &format!("interval is wider than {} years", MAX_INTERVAL_YEARS),
            ));
        }

        Ok(Self { amount, unit })
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.unit.sql_name())
    }
}

/// Translate an interval token into the engine's interval expression
pub fn translate_interval(token: &str) -> QueryResult<String> {
    Interval::parse(token).map(|interval| interval.to_string())
}

fn invalid(token: &str, reason: &str) -> QueryError {
    QueryError::InvalidInterval {
        token: token.to_string(),
        reason: reason.to_string(),
    }
}

type Component = (u32, char);

/// One `<digits><unit>` component drawn from the given unit letters
fn component(units: &'static str) -> impl FnMut(&str) -> IResult<&str, Component> {
    move |input| pair(map_res(digit1, |digits: &str| digits.parse::<u32>()), one_of(units))(input)
}

/// `P` followed by date components and an optional `T` time part
fn duration(input: &str) -> IResult<&str, (Vec<Component>, Option<Vec<Component>>)> {
    preceded(
        char('P'),
        pair(
            many0(component("YMWD")),
            opt(preceded(char('T'), many1(component("HM")))),
        ),
    )(input)
}
