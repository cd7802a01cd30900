pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod ports;
pub mod service;

pub use domain::calculation::{CalculationId, RebateCalculation};
pub use domain::incentive::{IncentiveKind, IncentiveType, SupportedIncentives};
pub use domain::product::{Product, ProductId};
pub use domain::rebate::{Rebate, RebateId};
pub use engine::formula::{FormulaInput, RebateFormula};
pub use engine::outcome::{
    CalculationFailure, CalculationResult, CalculationStage, FailureDisposition,
};
pub use engine::{
    CalculationRequest, ComputedRebate, DeterministicRebateEngine, EngineInput, RebateEngine,
    ValidationPolicy,
};
pub use errors::{ApplicationError, DomainError};
pub use ports::{ProductLookup, RebateStore};
pub use service::RebateService;
