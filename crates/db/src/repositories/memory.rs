use std::collections::HashMap;

use rust_decimal::Decimal;
use tokio::sync::RwLock;

use rebate_core::domain::calculation::RebateCalculation;
use rebate_core::domain::product::{Product, ProductId};
use rebate_core::domain::rebate::{Rebate, RebateId};
use rebate_core::errors::ApplicationError;
use rebate_core::ports::{ProductLookup, RebateStore};

use super::{ProductRepository, RebateRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, Product>>,
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        product.validate()?;
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProductLookup for InMemoryProductRepository {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, ApplicationError> {
        Ok(self.find_by_id(id).await?)
    }
}

#[derive(Default)]
pub struct InMemoryRebateRepository {
    rebates: RwLock<HashMap<String, Rebate>>,
    calculations: RwLock<Vec<RebateCalculation>>,
}

#[async_trait::async_trait]
impl RebateRepository for InMemoryRebateRepository {
    async fn find_by_id(&self, id: &RebateId) -> Result<Option<Rebate>, RepositoryError> {
        let rebates = self.rebates.read().await;
        Ok(rebates.get(&id.0).cloned())
    }

    async fn save(&self, rebate: Rebate) -> Result<(), RepositoryError> {
        let mut rebates = self.rebates.write().await;
        rebates.insert(rebate.id.0.clone(), rebate);
        Ok(())
    }

    async fn record_calculation(
        &self,
        calculation: RebateCalculation,
    ) -> Result<(), RepositoryError> {
        self.calculations.write().await.push(calculation);
        Ok(())
    }

    async fn list_calculations(
        &self,
        rebate_id: &RebateId,
    ) -> Result<Vec<RebateCalculation>, RepositoryError> {
        let calculations = self.calculations.read().await;
        Ok(calculations.iter().filter(|entry| &entry.rebate_id == rebate_id).cloned().collect())
    }
}

#[async_trait::async_trait]
impl RebateStore for InMemoryRebateRepository {
    async fn find_rebate(&self, id: &RebateId) -> Result<Option<Rebate>, ApplicationError> {
        Ok(self.find_by_id(id).await?)
    }

    async fn store_calculation_result(
        &self,
        rebate: &Rebate,
        amount: Decimal,
    ) -> Result<(), ApplicationError> {
        Ok(self.record_calculation(RebateCalculation::record(rebate.id.clone(), amount)).await?)
    }
}
