use std::fmt;
use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{UpkeepError, UpkeepResult};

static PERIOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(\d+)\s*([dwm])\s*$").expect("valid regex"));

/// Largest accepted amount, for any unit.
pub const MAX_AMOUNT: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
}

impl PeriodUnit {
    pub fn suffix(&self) -> char {
        match self {
            PeriodUnit::Day => 'd',
            PeriodUnit::Week => 'w',
            PeriodUnit::Month => 'm',
        }
    }
}

/// A calendar offset such as "5d", "2w" or "1m".
///
/// Months are kept as a distinct unit so that adding them follows the
/// calendar rather than a fixed number of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    amount: u32,
    unit: PeriodUnit,
}

impl Period {
    /// Parse `<positive integer><d|w|m>`, case-insensitive, whitespace tolerated.
    /// Amounts above [`MAX_AMOUNT`] are rejected.
    pub fn parse(raw: &str) -> UpkeepResult<Self> {
        let caps = PERIOD_RE
            .captures(raw)
            .ok_or_else(|| UpkeepError::InvalidPeriod(raw.to_string()))?;
        let amount: u32 = caps[1]
            .parse()
            .map_err(|_| UpkeepError::InvalidPeriod(raw.to_string()))?;
        let unit = match caps[2].to_ascii_lowercase().as_str() {
            "d" => PeriodUnit::Day,
            "w" => PeriodUnit::Week,
            _ => PeriodUnit::Month,
        };
        if amount == 0 || amount > MAX_AMOUNT {
            return Err(UpkeepError::InvalidPeriod(raw.to_string()));
        }
        Ok(Self { amount, unit })
    }

    /// Blank input means "not recurring".
    pub fn parse_optional(raw: Option<&str>) -> UpkeepResult<Option<Self>> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => Self::parse(value).map(Some),
        }
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn unit(&self) -> PeriodUnit {
        self.unit
    }

    /// Advance `date` by this period. Month steps clamp to the last valid
    /// day of the target month (Jan 31 + 1m lands on Feb 28/29).
    pub fn add_to(&self, date: NaiveDate) -> UpkeepResult<NaiveDate> {
        let shifted = match self.unit {
            PeriodUnit::Day => date.checked_add_days(Days::new(u64::from(self.amount))),
            PeriodUnit::Week => date.checked_add_days(Days::new(u64::from(self.amount) * 7)),
            PeriodUnit::Month => date.checked_add_months(Months::new(self.amount)),
        };
        shifted.ok_or_else(|| UpkeepError::InvalidPeriod(self.to_string()))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

impl FromStr for Period {
    type Err = UpkeepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::parse(s)
    }
}

impl TryFrom<String> for Period {
    type Error = UpkeepError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Period::parse(&value)
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}
