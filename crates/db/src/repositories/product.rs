use sqlx::Row;

use rebate_core::domain::incentive::SupportedIncentives;
use rebate_core::domain::product::{Product, ProductId};
use rebate_core::errors::ApplicationError;
use rebate_core::ports::ProductLookup;

use super::{parse_decimal, ProductRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price: String =
        row.try_get("price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let supported: String = row
        .try_get("supported_incentives")
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let supported_incentives = SupportedIncentives::parse_tags(&supported)
        .map_err(|e| RepositoryError::Decode(format!("product `{id}`: {e}")))?;
    let price = parse_decimal("product.price", &price)?;

    Product::new(id, price, supported_incentives)
        .map_err(|e| RepositoryError::Decode(e.to_string()))
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query("SELECT id, price, supported_incentives FROM product WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        product.validate()?;

        sqlx::query(
            "INSERT INTO product (id, price, supported_incentives)
             VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 price = excluded.price,
                 supported_incentives = excluded.supported_incentives",
        )
        .bind(&product.id.0)
        .bind(product.price.to_string())
        .bind(product.supported_incentives.to_tags())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ProductLookup for SqlProductRepository {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, ApplicationError> {
        Ok(self.find_by_id(id).await?)
    }
}
