//! Lookback windows such as `6mo` or `ytd`.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Serialize, Serializer};

use crate::domain::error::TradelensError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    Days(u32),
    Months(u32),
    YearToDate,
    Max,
}

impl Timeframe {
    /// First calendar date inside the window ending at `as_of`.
    /// `None` means unbounded.
    pub fn start_date(&self, as_of: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Timeframe::Days(n) => as_of.checked_sub_days(Days::new(u64::from(n))),
            Timeframe::Months(n) => as_of.checked_sub_months(Months::new(n)),
            Timeframe::YearToDate => NaiveDate::from_ymd_opt(as_of.year(), 1, 1),
            Timeframe::Max => None,
        }
    }
}

impl FromStr for Timeframe {
    type Err = TradelensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tf = match s.trim().to_ascii_lowercase().as_str() {
            "1d" => Timeframe::Days(1),
            "5d" => Timeframe::Days(5),
            "1w" => Timeframe::Days(7),
            "1m" | "1mo" => Timeframe::Months(1),
            "3mo" => Timeframe::Months(3),
            "6mo" => Timeframe::Months(6),
            "1y" => Timeframe::Months(12),
            "2y" => Timeframe::Months(24),
            "5y" => Timeframe::Months(60),
            "10y" => Timeframe::Months(120),
            "ytd" => Timeframe::YearToDate,
            "max" => Timeframe::Max,
            other => {
                return Err(TradelensError::invalid(format!(
                    "unknown timeframe '{other}' (expected 1d,5d,1w,1mo,3mo,6mo,1y,2y,5y,10y,ytd,max)"
                )));
            }
        };
        Ok(tf)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Timeframe::Days(7) => write!(f, "1w"),
            Timeframe::Days(n) => write!(f, "{n}d"),
            Timeframe::Months(n) if n >= 12 && n % 12 == 0 => write!(f, "{}y", n / 12),
            Timeframe::Months(n) => write!(f, "{n}mo"),
            Timeframe::YearToDate => write!(f, "ytd"),
            Timeframe::Max => write!(f, "max"),
        }
    }
}

impl Serialize for Timeframe {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parse_all_labels() {
        for label in ["1d", "5d", "1w", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max"] {
            let tf: Timeframe = label.parse().unwrap();
            assert_eq!(tf.to_string(), label);
        }
        assert_eq!("1m".parse::<Timeframe>().unwrap(), Timeframe::Months(1));
        assert_eq!(" 6MO ".parse::<Timeframe>().unwrap(), Timeframe::Months(6));
    }

    #[test]
    fn parse_unknown() {
        assert!(matches!(
            "7q".parse::<Timeframe>(),
            Err(TradelensError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn start_dates() {
        let as_of = d(2024, 8, 31);
        assert_eq!(Timeframe::Days(5).start_date(as_of), Some(d(2024, 8, 26)));
        assert_eq!(Timeframe::Months(6).start_date(as_of), Some(d(2024, 2, 29)));
        assert_eq!(Timeframe::Months(12).start_date(as_of), Some(d(2023, 8, 31)));
        assert_eq!(Timeframe::YearToDate.start_date(as_of), Some(d(2024, 1, 1)));
        assert_eq!(Timeframe::Max.start_date(as_of), None);
    }
}
