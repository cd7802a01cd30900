use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use rebate_core::domain::calculation::RebateCalculation;
use rebate_core::domain::product::{Product, ProductId};
use rebate_core::domain::rebate::{Rebate, RebateId};
use rebate_core::errors::{ApplicationError, DomainError};
use rebate_core::ports::{ProductLookup, RebateStore};

pub mod memory;
pub mod product;
pub mod rebate;

pub use memory::{InMemoryProductRepository, InMemoryRebateRepository};
pub use product::SqlProductRepository;
pub use rebate::SqlRebateRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid record: {0}")]
    Invalid(#[from] DomainError),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Invalid(error) => ApplicationError::Domain(error),
            other => ApplicationError::Persistence(other.to_string()),
        }
    }
}

/// Product lookups plus the write path used for seeding and administration.
#[async_trait]
pub trait ProductRepository: ProductLookup {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn save(&self, product: Product) -> Result<(), RepositoryError>;
}

/// Rebate lookups, the calculation sink and its history.
#[async_trait]
pub trait RebateRepository: RebateStore {
    async fn find_by_id(&self, id: &RebateId) -> Result<Option<Rebate>, RepositoryError>;
    async fn save(&self, rebate: Rebate) -> Result<(), RepositoryError>;
    async fn record_calculation(
        &self,
        calculation: RebateCalculation,
    ) -> Result<(), RepositoryError>;
    async fn list_calculations(
        &self,
        rebate_id: &RebateId,
    ) -> Result<Vec<RebateCalculation>, RepositoryError>;
}

pub(crate) fn parse_decimal(field: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value.trim())
        .map_err(|error| RepositoryError::Decode(format!("{field} `{value}`: {error}")))
}
