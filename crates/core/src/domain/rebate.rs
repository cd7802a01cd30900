use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::incentive::IncentiveType;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RebateId(pub String);

/// A rebate agreement. Only the fields its incentive uses are read by the
/// calculator; the rest are carried along untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rebate {
    pub id: RebateId,
    pub incentive: IncentiveType,
    pub amount: Decimal,
    pub percentage: Decimal,
}

impl Rebate {
    pub fn new(
        id: impl Into<String>,
        incentive: impl Into<IncentiveType>,
        amount: Decimal,
        percentage: Decimal,
    ) -> Self {
        Self { id: RebateId(id.into()), incentive: incentive.into(), amount, percentage }
    }
}
