pub mod formula;
pub mod outcome;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductId};
use crate::domain::rebate::{Rebate, RebateId};

use self::formula::RebateFormula;
use self::outcome::CalculationFailure;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub rebate_id: RebateId,
    pub product_id: ProductId,
    pub volume: Decimal,
}

impl CalculationRequest {
    pub fn new(
        rebate_id: impl Into<String>,
        product_id: impl Into<String>,
        volume: Decimal,
    ) -> Self {
        Self {
            rebate_id: RebateId(rebate_id.into()),
            product_id: ProductId(product_id.into()),
            volume,
        }
    }
}

/// Validation rules beyond the zero check every formula input gets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    pub reject_negative_inputs: bool,
}

/// Records resolved for one request. Either record may be missing.
#[derive(Clone, Copy, Debug)]
pub struct EngineInput<'a> {
    pub request: &'a CalculationRequest,
    pub product: Option<&'a Product>,
    pub rebate: Option<&'a Rebate>,
}

/// An amount together with the rebate it was computed for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComputedRebate<'a> {
    pub rebate: &'a Rebate,
    pub amount: Decimal,
}

pub trait RebateEngine: Send + Sync {
    fn calculate<'a>(
        &self,
        input: EngineInput<'a>,
    ) -> Result<ComputedRebate<'a>, CalculationFailure>;
}

#[derive(Clone, Debug, Default)]
pub struct DeterministicRebateEngine {
    policy: ValidationPolicy,
}

impl DeterministicRebateEngine {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }
}

impl RebateEngine for DeterministicRebateEngine {
    fn calculate<'a>(
        &self,
        input: EngineInput<'a>,
    ) -> Result<ComputedRebate<'a>, CalculationFailure> {
        calculate_rebate(input, self.policy)
    }
}

pub fn calculate_rebate(
    input: EngineInput<'_>,
    policy: ValidationPolicy,
) -> Result<ComputedRebate<'_>, CalculationFailure> {
    let (rebate, formula) = select_formula(input)?;
    validate_formula_inputs(&formula, policy)?;

    let amount = formula.evaluate().ok_or_else(|| CalculationFailure::ArithmeticOverflow {
        expression: formula.expression().to_string(),
    })?;

    Ok(ComputedRebate { rebate, amount })
}

/// Resolves the formula for a request, checking record presence, the
/// incentive tag and the product's supported incentives, in that order.
pub fn select_formula(
    input: EngineInput<'_>,
) -> Result<(&Rebate, RebateFormula), CalculationFailure> {
    let rebate = input.rebate.ok_or_else(|| CalculationFailure::RebateNotFound {
        rebate_id: input.request.rebate_id.0.clone(),
    })?;
    let product = input.product.ok_or_else(|| CalculationFailure::ProductNotFound {
        product_id: input.request.product_id.0.clone(),
    })?;

    let kind = rebate.incentive.kind().ok_or_else(|| {
        CalculationFailure::UnsupportedIncentiveType { incentive: rebate.incentive.to_string() }
    })?;

    if !product.supports(kind) {
        return Err(CalculationFailure::IncentiveNotSupportedByProduct {
            product_id: product.id.0.clone(),
            incentive: kind,
        });
    }

    Ok((rebate, RebateFormula::for_kind(kind, product, rebate, input.request.volume)))
}

pub fn validate_formula_inputs(
    formula: &RebateFormula,
    policy: ValidationPolicy,
) -> Result<(), CalculationFailure> {
    let inputs = formula.inputs();

    if let Some((input, _)) = inputs.iter().find(|(_, value)| value.is_zero()) {
        return Err(CalculationFailure::InvalidZeroInput { input: *input });
    }

    if policy.reject_negative_inputs {
        if let Some((input, value)) = inputs.iter().find(|(_, value)| *value < Decimal::ZERO) {
            return Err(CalculationFailure::NegativeInput { input: *input, value: *value });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        calculate_rebate, CalculationRequest, DeterministicRebateEngine, EngineInput,
        RebateEngine, ValidationPolicy,
    };
    use crate::domain::incentive::{IncentiveKind, IncentiveType, SupportedIncentives};
    use crate::domain::product::{Product, ProductId};
    use crate::domain::rebate::Rebate;
    use crate::engine::formula::FormulaInput;
    use crate::engine::outcome::CalculationFailure;

    fn product(supported: SupportedIncentives) -> Product {
        Product {
            id: ProductId("1".to_string()),
            price: Decimal::new(100, 0),
            supported_incentives: supported,
        }
    }

    fn rebate(incentive: impl Into<IncentiveType>) -> Rebate {
        Rebate::new("1", incentive, Decimal::new(10, 0), Decimal::new(50, 0))
    }

    fn request(volume: i64) -> CalculationRequest {
        CalculationRequest::new("1", "1", Decimal::new(volume, 0))
    }

    fn run(
        request: &CalculationRequest,
        product: Option<&Product>,
        rebate: Option<&Rebate>,
    ) -> Result<Decimal, CalculationFailure> {
        DeterministicRebateEngine::default()
            .calculate(EngineInput { request, product, rebate })
            .map(|computed| computed.amount)
    }

    #[test]
    fn fixed_cash_amount_pays_the_rebate_amount() {
        let product = product(SupportedIncentives::only(IncentiveKind::FixedCashAmount));
        let rebate = rebate(IncentiveKind::FixedCashAmount);

        assert_eq!(run(&request(10), Some(&product), Some(&rebate)), Ok(Decimal::new(10, 0)));
    }

    #[test]
    fn fixed_rate_rebate_multiplies_price_percentage_and_volume() {
        let product = product(SupportedIncentives::only(IncentiveKind::FixedRateRebate));
        let rebate = rebate(IncentiveKind::FixedRateRebate);

        assert_eq!(run(&request(10), Some(&product), Some(&rebate)), Ok(Decimal::new(50_000, 0)));
    }

    #[test]
    fn amount_per_uom_multiplies_amount_and_volume() {
        let product = product(SupportedIncentives::only(IncentiveKind::AmountPerUom));
        let rebate = rebate(IncentiveKind::AmountPerUom);

        assert_eq!(run(&request(10), Some(&product), Some(&rebate)), Ok(Decimal::new(100, 0)));
    }

    #[test]
    fn missing_rebate_wins_over_every_other_check() {
        for volume in [-5, 0, 10] {
            let result = run(&request(volume), None, None);
            assert_eq!(
                result,
                Err(CalculationFailure::RebateNotFound { rebate_id: "1".to_string() })
            );
        }
    }

    #[test]
    fn missing_product_fails_regardless_of_rebate_or_volume() {
        for kind in IncentiveKind::ALL {
            let rebate = rebate(kind);
            for volume in [-5, 0, 10] {
                let result = run(&request(volume), None, Some(&rebate));
                assert_eq!(
                    result,
                    Err(CalculationFailure::ProductNotFound { product_id: "1".to_string() })
                );
            }
        }
    }

    #[test]
    fn unrecognized_incentive_is_unsupported() {
        let product = product(SupportedIncentives::all());
        let rebate = rebate("loyalty_points");

        assert_eq!(
            run(&request(10), Some(&product), Some(&rebate)),
            Err(CalculationFailure::UnsupportedIncentiveType {
                incentive: "loyalty_points".to_string()
            })
        );
    }

    #[test]
    fn product_must_support_the_rebate_incentive() {
        let product = product(SupportedIncentives::only(IncentiveKind::FixedCashAmount));
        let rebate = rebate(IncentiveKind::FixedRateRebate);

        assert_eq!(
            run(&request(10), Some(&product), Some(&rebate)),
            Err(CalculationFailure::IncentiveNotSupportedByProduct {
                product_id: "1".to_string(),
                incentive: IncentiveKind::FixedRateRebate,
            })
        );
    }

    #[test]
    fn support_check_runs_before_zero_check() {
        let product = product(SupportedIncentives::NONE);
        let rebate = Rebate::new("1", IncentiveKind::AmountPerUom, Decimal::ZERO, Decimal::ZERO);

        assert!(matches!(
            run(&request(0), Some(&product), Some(&rebate)),
            Err(CalculationFailure::IncentiveNotSupportedByProduct { .. })
        ));
    }

    #[test]
    fn zero_volume_fails_fixed_rate_rebate() {
        let product = product(SupportedIncentives::only(IncentiveKind::FixedRateRebate));
        let rebate = rebate(IncentiveKind::FixedRateRebate);

        assert_eq!(
            run(&request(0), Some(&product), Some(&rebate)),
            Err(CalculationFailure::InvalidZeroInput { input: FormulaInput::Volume })
        );
    }

    #[test]
    fn zero_check_only_covers_inputs_the_formula_uses() {
        let product = Product {
            id: ProductId("1".to_string()),
            price: Decimal::ZERO,
            supported_incentives: SupportedIncentives::only(IncentiveKind::FixedCashAmount),
        };
        let rebate = Rebate::new("1", IncentiveKind::FixedCashAmount, Decimal::TEN, Decimal::ZERO);

        assert_eq!(run(&request(0), Some(&product), Some(&rebate)), Ok(Decimal::TEN));
    }

    #[test]
    fn zero_price_fails_fixed_rate_rebate_before_volume() {
        let product = Product {
            id: ProductId("1".to_string()),
            price: Decimal::ZERO,
            supported_incentives: SupportedIncentives::all(),
        };
        let rebate = rebate(IncentiveKind::FixedRateRebate);

        assert_eq!(
            run(&request(0), Some(&product), Some(&rebate)),
            Err(CalculationFailure::InvalidZeroInput { input: FormulaInput::ProductPrice })
        );
    }

    #[test]
    fn negative_volume_passes_by_default() {
        let product = product(SupportedIncentives::only(IncentiveKind::AmountPerUom));
        let rebate = rebate(IncentiveKind::AmountPerUom);

        assert_eq!(run(&request(-3), Some(&product), Some(&rebate)), Ok(Decimal::new(-30, 0)));
    }

    #[test]
    fn negative_volume_is_rejected_when_policy_demands_it() {
        let product = product(SupportedIncentives::only(IncentiveKind::AmountPerUom));
        let rebate = rebate(IncentiveKind::AmountPerUom);
        let request = request(-3);

        let result = calculate_rebate(
            EngineInput { request: &request, product: Some(&product), rebate: Some(&rebate) },
            ValidationPolicy { reject_negative_inputs: true },
        );

        assert_eq!(
            result,
            Err(CalculationFailure::NegativeInput {
                input: FormulaInput::Volume,
                value: Decimal::new(-3, 0)
            })
        );
    }

    #[test]
    fn overflow_becomes_a_failure() {
        let product = product(SupportedIncentives::only(IncentiveKind::AmountPerUom));
        let rebate = Rebate::new("1", IncentiveKind::AmountPerUom, Decimal::MAX, Decimal::ONE);

        assert!(matches!(
            run(&request(2), Some(&product), Some(&rebate)),
            Err(CalculationFailure::ArithmeticOverflow { .. })
        ));
    }

    #[test]
    fn computed_amount_carries_the_rebate_it_was_computed_for() {
        let product = product(SupportedIncentives::all());
        let rebate = rebate(IncentiveKind::FixedCashAmount);
        let request = request(1);

        let computed = DeterministicRebateEngine::default()
            .calculate(EngineInput {
                request: &request,
                product: Some(&product),
                rebate: Some(&rebate),
            })
            .expect("eligible request");

        assert!(std::ptr::eq(computed.rebate, &rebate));
        assert_eq!(computed.amount, Decimal::TEN);
    }

    #[test]
    fn repeated_calculation_yields_identical_amount() {
        let engine = DeterministicRebateEngine::default();
        let product = product(SupportedIncentives::all());
        let rebate = rebate(IncentiveKind::FixedRateRebate);
        let request = request(7);
        let input =
            EngineInput { request: &request, product: Some(&product), rebate: Some(&rebate) };

        assert_eq!(engine.calculate(input), engine.calculate(input));
    }
}
