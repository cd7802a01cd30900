use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::engine::outcome::{CalculationFailure, CalculationResult, FailureDisposition};
use crate::engine::{CalculationRequest, DeterministicRebateEngine, EngineInput, RebateEngine};
use crate::errors::ApplicationError;
use crate::ports::{ProductLookup, RebateStore};

/// Resolves the records for a request, runs the engine and records the result.
///
/// Holds no per-call state, so one instance can serve concurrent callers.
pub struct RebateService<P, R, E = DeterministicRebateEngine> {
    products: P,
    rebates: R,
    engine: E,
}

impl<P, R> RebateService<P, R, DeterministicRebateEngine> {
    pub fn new(products: P, rebates: R) -> Self {
        Self::with_engine(products, rebates, DeterministicRebateEngine::default())
    }
}

impl<P, R, E> RebateService<P, R, E> {
    pub fn with_engine(products: P, rebates: R, engine: E) -> Self {
        Self { products, rebates, engine }
    }
}

impl<P, R, E> RebateService<P, R, E>
where
    P: ProductLookup,
    R: RebateStore,
    E: RebateEngine,
{
    pub async fn calculate(&self, request: &CalculationRequest) -> CalculationResult {
        match self.run(request).await {
            Ok(amount) => {
                info!(
                    event_name = "rebate.calculation.stored",
                    rebate_id = %request.rebate_id.0,
                    product_id = %request.product_id.0,
                    amount = %amount,
                    "rebate calculation stored"
                );
                CalculationResult::stored(amount)
            }
            Err(failure) => {
                match failure.disposition() {
                    FailureDisposition::Rejected => info!(
                        event_name = "rebate.calculation.rejected",
                        rebate_id = %request.rebate_id.0,
                        product_id = %request.product_id.0,
                        failure_code = failure.code(),
                        reason = %failure,
                        "rebate calculation rejected"
                    ),
                    FailureDisposition::Persistence => warn!(
                        event_name = "rebate.calculation.store_failed",
                        rebate_id = %request.rebate_id.0,
                        product_id = %request.product_id.0,
                        failure_code = failure.code(),
                        reason = %failure,
                        "rebate calculation could not reach the store"
                    ),
                }
                CalculationResult::failed(failure)
            }
        }
    }

    async fn run(&self, request: &CalculationRequest) -> Result<Decimal, CalculationFailure> {
        let rebate = self.rebates.find_rebate(&request.rebate_id).await.map_err(lookup_failed)?;
        let product =
            self.products.find_product(&request.product_id).await.map_err(lookup_failed)?;
        debug!(
            rebate_found = rebate.is_some(),
            product_found = product.is_some(),
            "rebate calculation lookups complete"
        );

        let computed = self.engine.calculate(EngineInput {
            request,
            product: product.as_ref(),
            rebate: rebate.as_ref(),
        })?;
        let amount = computed.amount;
        debug!(amount = %amount, "rebate amount computed");

        self.rebates.store_calculation_result(computed.rebate, amount).await.map_err(|error| {
            CalculationFailure::StoreFailed { amount, message: error.to_string() }
        })?;

        Ok(amount)
    }
}

fn lookup_failed(error: ApplicationError) -> CalculationFailure {
    CalculationFailure::LookupFailed { message: error.to_string() }
}
