//! Collaborators the rebate service reads from and writes to.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::product::{Product, ProductId};
use crate::domain::rebate::{Rebate, RebateId};
use crate::errors::ApplicationError;

#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, ApplicationError>;
}

#[async_trait]
pub trait RebateStore: Send + Sync {
    async fn find_rebate(&self, id: &RebateId) -> Result<Option<Rebate>, ApplicationError>;

    /// Records a successful calculation. Never called for a failed one.
    async fn store_calculation_result(
        &self,
        rebate: &Rebate,
        amount: Decimal,
    ) -> Result<(), ApplicationError>;
}

#[async_trait]
impl<T: ProductLookup + ?Sized> ProductLookup for Arc<T> {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, ApplicationError> {
        (**self).find_product(id).await
    }
}

#[async_trait]
impl<T: RebateStore + ?Sized> RebateStore for Arc<T> {
    async fn find_rebate(&self, id: &RebateId) -> Result<Option<Rebate>, ApplicationError> {
        (**self).find_rebate(id).await
    }

    async fn store_calculation_result(
        &self,
        rebate: &Rebate,
        amount: Decimal,
    ) -> Result<(), ApplicationError> {
        (**self).store_calculation_result(rebate, amount).await
    }
}
