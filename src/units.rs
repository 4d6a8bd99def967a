use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Sub},
};

use serde::{de, de::Visitor, Deserialize, Serialize};

/// Stamps are the chain's internal unit of fee consumption. Precise, so an integer newtype.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StampsNewtype(pub i64);

impl fmt::Display for StampsNewtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for StampsNewtype {
    fn from(amount: i64) -> Self {
        StampsNewtype(amount)
    }
}

/// Stamps per whole XIAN. The chain variable this comes from may be missing or garbled, in which
/// case we carry a zero rate and conversions collapse to zero rather than erroring.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StampRate(pub i64);

impl StampRate {
    pub const NONE: StampRate = StampRate(0);
}

impl fmt::Display for StampRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StampsNewtype {
    /// Convert stamps to the display unit. A zero rate means the rate fetch degraded; treat the
    /// fee as zero instead of dividing by zero.
    pub fn to_xian(self, rate: StampRate) -> XianNewtype {
        if rate.0 == 0 {
            XianNewtype(0.0)
        } else {
            XianNewtype(self.0 as f64 / rate.0 as f64)
        }
    }
}

/// An amount of XIAN, the display currency. Imprecise, only for presentation-side sums.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct XianNewtype(pub f64);

impl fmt::Display for XianNewtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let XianNewtype(amount) = self;
        write!(f, "{amount}")
    }
}

impl Add for XianNewtype {
    type Output = Self;

    fn add(self, XianNewtype(rhs): Self) -> Self::Output {
        let XianNewtype(lhs) = self;
        XianNewtype(lhs + rhs)
    }
}

impl AddAssign for XianNewtype {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for XianNewtype {
    type Output = Self;

    fn sub(self, XianNewtype(rhs): Self) -> Self::Output {
        let XianNewtype(lhs) = self;
        XianNewtype(lhs - rhs)
    }
}

impl Sum for XianNewtype {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(XianNewtype(0.0), Add::add)
    }
}

impl From<f64> for XianNewtype {
    fn from(amount: f64) -> Self {
        XianNewtype(amount)
    }
}

/// Reward amounts arrive from the chain as decimal strings, occasionally as bare JSON numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RewardAmount(pub f64);

struct RewardAmountVisitor;

impl Visitor<'_> for RewardAmountVisitor {
    type Value = RewardAmount;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "a reward amount as a decimal string like \"12.5\", or as a number"
        )
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse::<f64>()
            .map(RewardAmount)
            .map_err(|error| de::Error::custom(format!("failed to parse {v} as f64: {error}")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(RewardAmount(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(RewardAmount(v as f64))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(RewardAmount(v as f64))
    }
}

impl<'de> Deserialize<'de> for RewardAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(RewardAmountVisitor)
    }
}
