use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::incentive::IncentiveKind;
use crate::engine::formula::FormulaInput;

/// Progress of a single calculation. A failed calculation stops at the last
/// stage it completed; only a successful one reaches `Stored`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationStage {
    Start,
    LookupComplete,
    Validated,
    Computed,
    Stored,
}

/// What the caller should do about a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureDisposition {
    /// The request or the stored records are not eligible; fix the input.
    Rejected,
    /// A collaborator failed; the same request may succeed on retry.
    Persistence,
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum CalculationFailure {
    #[error("rebate `{rebate_id}` was not found")]
    RebateNotFound { rebate_id: String },
    #[error("product `{product_id}` was not found")]
    ProductNotFound { product_id: String },
    #[error("incentive type `{incentive}` has no calculation strategy")]
    UnsupportedIncentiveType { incentive: String },
    #[error("product `{product_id}` does not support incentive `{incentive}`")]
    IncentiveNotSupportedByProduct { product_id: String, incentive: IncentiveKind },
    #[error("{input} must not be zero")]
    InvalidZeroInput { input: FormulaInput },
    #[error("{input} must not be negative (got {value})")]
    NegativeInput { input: FormulaInput, value: Decimal },
    #[error("rebate amount overflowed evaluating `{expression}`")]
    ArithmeticOverflow { expression: String },
    #[error("record lookup failed: {message}")]
    LookupFailed { message: String },
    #[error("rebate amount {amount} was computed but not stored: {message}")]
    StoreFailed { amount: Decimal, message: String },
}

impl CalculationFailure {
    pub fn code(&self) -> &'static str {
        match self {
            Self::RebateNotFound { .. } => "rebate_not_found",
            Self::ProductNotFound { .. } => "product_not_found",
            Self::UnsupportedIncentiveType { .. } => "unsupported_incentive_type",
            Self::IncentiveNotSupportedByProduct { .. } => "incentive_not_supported_by_product",
            Self::InvalidZeroInput { .. } => "invalid_zero_input",
            Self::NegativeInput { .. } => "negative_input",
            Self::ArithmeticOverflow { .. } => "arithmetic_overflow",
            Self::LookupFailed { .. } => "lookup_failed",
            Self::StoreFailed { .. } => "store_failed",
        }
    }

    pub fn disposition(&self) -> FailureDisposition {
        match self {
            Self::LookupFailed { .. } | Self::StoreFailed { .. } => FailureDisposition::Persistence,
            _ => FailureDisposition::Rejected,
        }
    }

    /// Last stage the calculation completed before this failure.
    pub fn failed_after(&self) -> CalculationStage {
        match self {
            Self::LookupFailed { .. } => CalculationStage::Start,
            Self::RebateNotFound { .. }
            | Self::ProductNotFound { .. }
            | Self::UnsupportedIncentiveType { .. }
            | Self::IncentiveNotSupportedByProduct { .. }
            | Self::InvalidZeroInput { .. }
            | Self::NegativeInput { .. } => CalculationStage::LookupComplete,
            Self::ArithmeticOverflow { .. } => CalculationStage::Validated,
            Self::StoreFailed { .. } => CalculationStage::Computed,
        }
    }
}

/// Caller-facing outcome of one calculation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub success: bool,
    /// Last stage the calculation completed.
    pub stage: CalculationStage,
    pub amount: Option<Decimal>,
    pub failure: Option<CalculationFailure>,
}

impl CalculationResult {
    pub fn stored(amount: Decimal) -> Self {
        Self { success: true, stage: CalculationStage::Stored, amount: Some(amount), failure: None }
    }

    pub fn failed(failure: CalculationFailure) -> Self {
        Self { success: false, stage: failure.failed_after(), amount: None, failure: Some(failure) }
    }

    /// Amount the engine produced, including one the sink failed to record.
    pub fn computed_amount(&self) -> Option<Decimal> {
        match &self.failure {
            Some(CalculationFailure::StoreFailed { amount, .. }) => Some(*amount),
            _ => self.amount,
        }
    }
}
