use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

struct ProductContract {
    id: &'static str,
    price: &'static str,
    supported_incentives: &'static str,
}

struct RebateContract {
    id: &'static str,
    incentive: &'static str,
    amount: &'static str,
    percentage: &'static str,
}

const DEMO_PRODUCTS: &[ProductContract] = &[
    ProductContract {
        id: "prod-standard",
        price: "100",
        supported_incentives: "fixed_cash_amount,fixed_rate_rebate,amount_per_uom",
    },
    ProductContract {
        id: "prod-cash-only",
        price: "19.99",
        supported_incentives: "fixed_cash_amount",
    },
    ProductContract {
        id: "prod-free-sample",
        price: "0",
        supported_incentives: "fixed_rate_rebate,amount_per_uom",
    },
];

const DEMO_REBATES: &[RebateContract] = &[
    RebateContract {
        id: "rebate-cash-10",
        incentive: "fixed_cash_amount",
        amount: "10",
        percentage: "0",
    },
    RebateContract {
        id: "rebate-rate-50",
        incentive: "fixed_rate_rebate",
        amount: "0",
        percentage: "50",
    },
    RebateContract {
        id: "rebate-uom-10",
        incentive: "amount_per_uom",
        amount: "10",
        percentage: "0",
    },
    RebateContract {
        id: "rebate-legacy-points",
        incentive: "loyalty_points",
        amount: "5",
        percentage: "0",
    },
];

/// Small catalog covering every incentive kind, a product that supports only
/// one of them, a zero-priced product and a rebate with an unknown tag.
pub struct DemoCatalog;

impl DemoCatalog {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_catalog.sql");

    /// Upserts the catalog. Recorded calculations are left alone.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        tracing::info!(
            event_name = "persistence.fixtures.demo_catalog_loaded",
            products = DEMO_PRODUCTS.len(),
            rebates = DEMO_REBATES.len(),
            "demo catalog loaded"
        );

        Ok(SeedResult {
            product_ids: DEMO_PRODUCTS.iter().map(|product| product.id).collect(),
            rebate_ids: DEMO_REBATES.iter().map(|rebate| rebate.id).collect(),
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for product in DEMO_PRODUCTS {
            let matches: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM product
                 WHERE id = ?1 AND price = ?2 AND supported_incentives = ?3)",
            )
            .bind(product.id)
            .bind(product.price)
            .bind(product.supported_incentives)
            .fetch_one(pool)
            .await?;
            checks.push((product.id, matches == 1));
        }

        for rebate in DEMO_REBATES {
            let matches: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM rebate
                 WHERE id = ?1 AND incentive = ?2 AND amount = ?3 AND percentage = ?4)",
            )
            .bind(rebate.id)
            .bind(rebate.incentive)
            .bind(rebate.amount)
            .bind(rebate.percentage)
            .fetch_one(pool)
            .await?;
            checks.push((rebate.id, matches == 1));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub product_ids: Vec<&'static str>,
    pub rebate_ids: Vec<&'static str>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use rebate_core::domain::incentive::{IncentiveKind, IncentiveType};
    use rebate_core::domain::product::ProductId;
    use rebate_core::domain::rebate::RebateId;

    use super::*;
    use crate::repositories::{
        ProductRepository, RebateRepository, SqlProductRepository, SqlRebateRepository,
    };
    use crate::{connect_with_settings, migrations};

    async fn migrated_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[test]
    fn sql_fixture_is_valid() {
        assert!(!DemoCatalog::SQL.is_empty());
        for product in DEMO_PRODUCTS {
            assert!(DemoCatalog::SQL.contains(product.id), "fixture missing {}", product.id);
        }
        for rebate in DEMO_REBATES {
            assert!(DemoCatalog::SQL.contains(rebate.id), "fixture missing {}", rebate.id);
        }
    }

    #[tokio::test]
    async fn verify_demo_catalog_and_idempotency() {
        let pool = migrated_pool().await;

        let empty = DemoCatalog::verify(&pool).await.expect("verify empty database");
        assert!(!empty.all_present);

        let first = DemoCatalog::load(&pool).await.expect("load demo catalog");
        let first_verification = DemoCatalog::verify(&pool).await.expect("verify demo catalog");
        assert!(first_verification.all_present);
        assert_eq!(first.product_ids.len(), 3);
        assert_eq!(first.rebate_ids.len(), 4);

        DemoCatalog::load(&pool).await.expect("reload demo catalog");
        let second_verification =
            DemoCatalog::verify(&pool).await.expect("re-verify demo catalog");
        assert_eq!(first_verification.checks, second_verification.checks);

        let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product")
            .fetch_one(&pool)
            .await
            .expect("count products");
        assert_eq!(products, 3);
    }

    #[tokio::test]
    async fn demo_catalog_decodes_through_repositories() {
        let pool = migrated_pool().await;
        DemoCatalog::load(&pool).await.expect("load demo catalog");

        let products = SqlProductRepository::new(pool.clone());
        let rebates = SqlRebateRepository::new(pool);

        let cash_only = products
            .find_by_id(&ProductId("prod-cash-only".to_string()))
            .await
            .expect("find product")
            .expect("product seeded");
        assert_eq!(cash_only.price, Decimal::new(1_999, 2));
        assert!(cash_only.supports(IncentiveKind::FixedCashAmount));
        assert!(!cash_only.supports(IncentiveKind::AmountPerUom));

        let legacy = rebates
            .find_by_id(&RebateId("rebate-legacy-points".to_string()))
            .await
            .expect("find rebate")
            .expect("rebate seeded");
        assert_eq!(legacy.incentive, IncentiveType::Unrecognized("loyalty_points".to_string()));
    }
}
