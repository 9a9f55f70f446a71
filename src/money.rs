//! Fixed-point currency amounts.
//!
//! Amounts are kept as integer minor units (cents) so bids never go through
//! floating point. `850.00` is stored as `85000`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MINOR_PER_MAJOR: i64 = 100;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Whole currency units, `None` on overflow.
    pub fn from_major(major: i64) -> Option<Self> {
        major.checked_mul(MINOR_PER_MAJOR).map(Self)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = MINOR_PER_MAJOR as u64;
        write!(f, "{}{}.{:02}", sign, abs / per, abs % per)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseAmountError {
    #[error("amount is empty")]
    Empty,
    #[error("invalid amount: {0}")]
    Invalid(String),
    #[error("amount has more than two decimal places: {0}")]
    TooPrecise(String),
    #[error("amount out of range: {0}")]
    Overflow(String),
}

impl FromStr for Amount {
    type Err = ParseAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseAmountError::Empty);
        }
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(frac) {
            return Err(ParseAmountError::Invalid(s.to_owned()));
        }
        if frac.len() > 2 {
            return Err(ParseAmountError::TooPrecise(s.to_owned()));
        }

        let overflow = || ParseAmountError::Overflow(s.to_owned());
        let whole: i64 = whole.parse().map_err(|_| overflow())?;
        // "5" after the point means 50 cents
        let cents: i64 = format!("{:0<2}", frac).parse().map_err(|_| overflow())?;
        let minor = whole
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(cents))
            .ok_or_else(overflow)?;

        Ok(Self(if negative { -minor } else { minor }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_two_decimal_places() {
        assert_eq!(Amount::from_minor(85000).to_string(), "850.00");
        assert_eq!(Amount::from_minor(5).to_string(), "0.05");
        assert_eq!(Amount::from_minor(-125).to_string(), "-1.25");
    }

    #[test]
    fn parses_decimal_strings() {
        assert_eq!("850.00".parse::<Amount>(), Ok(Amount::from_minor(85000)));
        assert_eq!("820".parse::<Amount>(), Ok(Amount::from_minor(82000)));
        assert_eq!("0.5".parse::<Amount>(), Ok(Amount::from_minor(50)));
        assert_eq!("-3.10".parse::<Amount>(), Ok(Amount::from_minor(-310)));
    }

    #[test]
    fn rejects_malformed_strings() {
        assert_eq!("".parse::<Amount>(), Err(ParseAmountError::Empty));
        assert!(matches!(
            "1.234".parse::<Amount>(),
            Err(ParseAmountError::TooPrecise(_))
        ));
        assert!(matches!(
            "12a".parse::<Amount>(),
            Err(ParseAmountError::Invalid(_))
        ));
        assert!(matches!(
            ".50".parse::<Amount>(),
            Err(ParseAmountError::Invalid(_))
        ));
        assert!(matches!(
            "99999999999999999999".parse::<Amount>(),
            Err(ParseAmountError::Overflow(_))
        ));
    }

    #[test]
    fn orders_by_minor_units() {
        assert!(Amount::from_minor(85000) > Amount::from_minor(82000));
        assert_eq!(Amount::from_major(800), Some(Amount::from_minor(80000)));
        assert!(!Amount::ZERO.is_positive());
    }
}
