use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::rebate::RebateId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalculationId(pub String);

/// A successful calculation as recorded by the result sink.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebateCalculation {
    pub id: CalculationId,
    pub rebate_id: RebateId,
    pub amount: Decimal,
    pub calculated_at: DateTime<Utc>,
}

impl RebateCalculation {
    pub fn record(rebate_id: RebateId, amount: Decimal) -> Self {
        Self {
            id: CalculationId(Uuid::new_v4().to_string()),
            rebate_id,
            amount,
            calculated_at: Utc::now(),
        }
    }
}
