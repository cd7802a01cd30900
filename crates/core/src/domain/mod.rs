pub mod calculation;
pub mod incentive;
pub mod product;
pub mod rebate;
