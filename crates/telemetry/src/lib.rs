//! # Hindsight Telemetry
//!
//! Cost accounting for completion runs: a static pricing table plus the
//! estimator that turns a backend usage summary into dollars.

pub mod estimator;
pub mod pricing;

pub use estimator::{CostEstimate, CostEstimator, ModelCost, PricingMatch};
pub use pricing::{ModelPricing, PricingTable};
