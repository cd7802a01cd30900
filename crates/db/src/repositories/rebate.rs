use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use rebate_core::domain::calculation::{CalculationId, RebateCalculation};
use rebate_core::domain::incentive::IncentiveType;
use rebate_core::domain::rebate::{Rebate, RebateId};
use rebate_core::errors::ApplicationError;
use rebate_core::ports::RebateStore;

use super::{parse_decimal, RebateRepository, RepositoryError};
use crate::DbPool;

pub struct SqlRebateRepository {
    pool: DbPool,
}

impl SqlRebateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode<T>(result: Result<T, sqlx::Error>) -> Result<T, RepositoryError> {
    result.map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_rebate(row: &sqlx::sqlite::SqliteRow) -> Result<Rebate, RepositoryError> {
    let id: String = decode(row.try_get("id"))?;
    let incentive: String = decode(row.try_get("incentive"))?;
    let amount: String = decode(row.try_get("amount"))?;
    let percentage: String = decode(row.try_get("percentage"))?;

    Ok(Rebate {
        id: RebateId(id),
        // Unknown tags are kept so the calculator can report them.
        incentive: IncentiveType::from(incentive),
        amount: parse_decimal("rebate.amount", &amount)?,
        percentage: parse_decimal("rebate.percentage", &percentage)?,
    })
}

fn row_to_calculation(row: &sqlx::sqlite::SqliteRow) -> Result<RebateCalculation, RepositoryError> {
    let id: String = decode(row.try_get("id"))?;
    let rebate_id: String = decode(row.try_get("rebate_id"))?;
    let amount: String = decode(row.try_get("amount"))?;
    let calculated_at: String = decode(row.try_get("calculated_at"))?;

    let calculated_at = DateTime::parse_from_rfc3339(&calculated_at)
        .map_err(|e| RepositoryError::Decode(format!("calculated_at `{calculated_at}`: {e}")))?
        .with_timezone(&Utc);

    Ok(RebateCalculation {
        id: CalculationId(id),
        rebate_id: RebateId(rebate_id),
        amount: parse_decimal("rebate_calculation.amount", &amount)?,
        calculated_at,
    })
}

#[async_trait::async_trait]
impl RebateRepository for SqlRebateRepository {
    async fn find_by_id(&self, id: &RebateId) -> Result<Option<Rebate>, RepositoryError> {
        let row = sqlx::query("SELECT id, incentive, amount, percentage FROM rebate WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_rebate).transpose()
    }

    async fn save(&self, rebate: Rebate) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO rebate (id, incentive, amount, percentage)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 incentive = excluded.incentive,
                 amount = excluded.amount,
                 percentage = excluded.percentage",
        )
        .bind(&rebate.id.0)
        .bind(rebate.incentive.as_str())
        .bind(rebate.amount.to_string())
        .bind(rebate.percentage.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_calculation(
        &self,
        calculation: RebateCalculation,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO rebate_calculation (id, rebate_id, amount, calculated_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&calculation.id.0)
        .bind(&calculation.rebate_id.0)
        .bind(calculation.amount.to_string())
        .bind(calculation.calculated_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_calculations(
        &self,
        rebate_id: &RebateId,
    ) -> Result<Vec<RebateCalculation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, rebate_id, amount, calculated_at
             FROM rebate_calculation
             WHERE rebate_id = ?
             ORDER BY calculated_at ASC, rowid ASC",
        )
        .bind(&rebate_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_calculation).collect()
    }
}

#[async_trait::async_trait]
impl RebateStore for SqlRebateRepository {
    async fn find_rebate(&self, id: &RebateId) -> Result<Option<Rebate>, ApplicationError> {
        Ok(self.find_by_id(id).await?)
    }

    async fn store_calculation_result(
        &self,
        rebate: &Rebate,
        amount: Decimal,
    ) -> Result<(), ApplicationError> {
        let calculation = RebateCalculation::record(rebate.id.clone(), amount);
        tracing::debug!(
            event_name = "persistence.rebate_calculation.insert",
            calculation_id = %calculation.id.0,
            rebate_id = %rebate.id.0,
            amount = %amount,
            "recording rebate calculation"
        );
        Ok(self.record_calculation(calculation).await?)
    }
}
