use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::incentive::{IncentiveKind, SupportedIncentives};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub price: Decimal,
    pub supported_incentives: SupportedIncentives,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        price: Decimal,
        supported_incentives: SupportedIncentives,
    ) -> Result<Self, DomainError> {
        let product = Self { id: ProductId(id.into()), price, supported_incentives };
        product.validate()?;
        Ok(product)
    }

    /// Checks the invariants `new` enforces. Fields are public, so records
    /// assembled elsewhere are checked again before they are persisted.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.0.trim().is_empty() {
            return Err(DomainError::InvariantViolation(
                "product identifier must not be empty".to_string(),
            ));
        }
        if self.price < Decimal::ZERO {
            return Err(DomainError::InvariantViolation(format!(
                "product `{}` has negative price {}",
                self.id.0, self.price
            )));
        }

        Ok(())
    }

    pub fn supports(&self, kind: IncentiveKind) -> bool {
        self.supported_incentives.contains(kind)
    }
}
