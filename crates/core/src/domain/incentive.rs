use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Incentive kinds the calculator has a formula for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncentiveKind {
    FixedCashAmount,
    FixedRateRebate,
    AmountPerUom,
}

impl IncentiveKind {
    pub const ALL: [IncentiveKind; 3] =
        [Self::FixedCashAmount, Self::FixedRateRebate, Self::AmountPerUom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FixedCashAmount => "fixed_cash_amount",
            Self::FixedRateRebate => "fixed_rate_rebate",
            Self::AmountPerUom => "amount_per_uom",
        }
    }

    fn flag(self) -> u8 {
        match self {
            Self::FixedCashAmount => 1 << 0,
            Self::FixedRateRebate => 1 << 1,
            Self::AmountPerUom => 1 << 2,
        }
    }
}

impl fmt::Display for IncentiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncentiveKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixed_cash_amount" | "fixedcashamount" => Ok(Self::FixedCashAmount),
            "fixed_rate_rebate" | "fixedraterebate" => Ok(Self::FixedRateRebate),
            "amount_per_uom" | "amountperuom" => Ok(Self::AmountPerUom),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown incentive kind `{other}` (expected fixed_cash_amount|fixed_rate_rebate|amount_per_uom)"
            ))),
        }
    }
}

/// Incentive tag carried by a rebate record.
///
/// Stores hold incentive tags as text, so a rebate may reference a tag that
/// has no formula. Such rebates deserialize fine and are rejected by the
/// calculator rather than at load time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IncentiveType {
    Known(IncentiveKind),
    Unrecognized(String),
}

impl IncentiveType {
    pub fn kind(&self) -> Option<IncentiveKind> {
        match self {
            Self::Known(kind) => Some(*kind),
            Self::Unrecognized(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(kind) => kind.as_str(),
            Self::Unrecognized(tag) => tag,
        }
    }
}

impl From<IncentiveKind> for IncentiveType {
    fn from(kind: IncentiveKind) -> Self {
        Self::Known(kind)
    }
}

impl From<&str> for IncentiveType {
    fn from(value: &str) -> Self {
        value.parse::<IncentiveKind>().map_or_else(
            |_| Self::Unrecognized(value.trim().to_string()),
            Self::Known,
        )
    }
}

impl From<String> for IncentiveType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<IncentiveType> for String {
    fn from(value: IncentiveType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for IncentiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of incentive kinds a product accepts, kept as bit flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<IncentiveKind>", into = "Vec<IncentiveKind>")]
pub struct SupportedIncentives(u8);

impl SupportedIncentives {
    pub const NONE: SupportedIncentives = SupportedIncentives(0);

    pub fn all() -> Self {
        IncentiveKind::ALL.into_iter().collect()
    }

    pub fn only(kind: IncentiveKind) -> Self {
        Self(kind.flag())
    }

    pub fn with(mut self, kind: IncentiveKind) -> Self {
        self.insert(kind);
        self
    }

    pub fn insert(&mut self, kind: IncentiveKind) {
        self.0 |= kind.flag();
    }

    pub fn contains(&self, kind: IncentiveKind) -> bool {
        self.0 & kind.flag() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = IncentiveKind> + '_ {
        IncentiveKind::ALL.into_iter().filter(|kind| self.contains(*kind))
    }

    /// Comma separated tag list, the form stores persist.
    pub fn to_tags(&self) -> String {
        self.iter().map(|kind| kind.as_str()).collect::<Vec<_>>().join(",")
    }

    pub fn parse_tags(tags: &str) -> Result<Self, DomainError> {
        tags.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::parse::<IncentiveKind>)
            .collect()
    }
}

impl FromIterator<IncentiveKind> for SupportedIncentives {
    fn from_iter<I: IntoIterator<Item = IncentiveKind>>(iter: I) -> Self {
        let mut set = Self::NONE;
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl From<Vec<IncentiveKind>> for SupportedIncentives {
    fn from(kinds: Vec<IncentiveKind>) -> Self {
        kinds.into_iter().collect()
    }
}

impl From<SupportedIncentives> for Vec<IncentiveKind> {
    fn from(set: SupportedIncentives) -> Self {
        set.iter().collect()
    }
}
