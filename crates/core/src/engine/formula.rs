use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::incentive::IncentiveKind;
use crate::domain::product::Product;
use crate::domain::rebate::Rebate;

/// A value a formula reads, named by where it comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaInput {
    RebateAmount,
    RebatePercentage,
    ProductPrice,
    Volume,
}

impl FormulaInput {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RebateAmount => "rebate.amount",
            Self::RebatePercentage => "rebate.percentage",
            Self::ProductPrice => "product.price",
            Self::Volume => "request.volume",
        }
    }
}

impl fmt::Display for FormulaInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One formula per incentive kind, holding exactly the inputs it uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RebateFormula {
    FixedCashAmount { amount: Decimal },
    FixedRateRebate { price: Decimal, percentage: Decimal, volume: Decimal },
    AmountPerUom { amount: Decimal, volume: Decimal },
}

impl RebateFormula {
    pub fn for_kind(
        kind: IncentiveKind,
        product: &Product,
        rebate: &Rebate,
        volume: Decimal,
    ) -> Self {
        match kind {
            IncentiveKind::FixedCashAmount => Self::FixedCashAmount { amount: rebate.amount },
            IncentiveKind::FixedRateRebate => Self::FixedRateRebate {
                price: product.price,
                percentage: rebate.percentage,
                volume,
            },
            IncentiveKind::AmountPerUom => Self::AmountPerUom { amount: rebate.amount, volume },
        }
    }

    pub fn kind(&self) -> IncentiveKind {
        match self {
            Self::FixedCashAmount { .. } => IncentiveKind::FixedCashAmount,
            Self::FixedRateRebate { .. } => IncentiveKind::FixedRateRebate,
            Self::AmountPerUom { .. } => IncentiveKind::AmountPerUom,
        }
    }

    /// Inputs in the order they are validated.
    pub fn inputs(&self) -> Vec<(FormulaInput, Decimal)> {
        match *self {
            Self::FixedCashAmount { amount } => vec![(FormulaInput::RebateAmount, amount)],
            Self::FixedRateRebate { price, percentage, volume } => vec![
                (FormulaInput::ProductPrice, price),
                (FormulaInput::RebatePercentage, percentage),
                (FormulaInput::Volume, volume),
            ],
            Self::AmountPerUom { amount, volume } => {
                vec![(FormulaInput::RebateAmount, amount), (FormulaInput::Volume, volume)]
            }
        }
    }

    pub fn expression(&self) -> &'static str {
        match self {
            Self::FixedCashAmount { .. } => "rebate.amount",
            Self::FixedRateRebate { .. } => "product.price * rebate.percentage * request.volume",
            Self::AmountPerUom { .. } => "rebate.amount * request.volume",
        }
    }

    /// Raw product of the inputs, unrounded. `None` on decimal overflow.
    pub fn evaluate(&self) -> Option<Decimal> {
        match *self {
            Self::FixedCashAmount { amount } => Some(amount),
            Self::FixedRateRebate { price, percentage, volume } => {
                price.checked_mul(percentage)?.checked_mul(volume)
            }
            Self::AmountPerUom { amount, volume } => amount.checked_mul(volume),
        }
    }
}
