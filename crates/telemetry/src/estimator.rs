//! Cost estimation over a backend usage summary.
//!
//! Input tokens are priced at the non-cached rate uniformly; the estimate
//! is a conservative upper bound, not an invoice.

use crate::pricing::{PriceResolution, PricingTable};
use hindsight_core::backend::UsageSummary;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Estimates are rounded to this many decimal places.
const PRECISION_DECIMALS: i32 = 6;

/// How a model in the usage summary matched the price table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMatch {
    Exact,
    Prefix,
    /// Not in the table; the model contributes zero estimated cost but is
    /// kept in the breakdown so the gap is visible.
    UnknownModel,
}

/// Cost breakdown for one model's usage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCost {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_calls: u64,
    pub cost_usd: f64,
    pub pricing: PricingMatch,
}

/// The estimate for one completion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEstimate {
    pub total_estimated_usd: f64,
    pub by_model: Vec<ModelCost>,
}

/// Maps reported token usage to estimated cost against an injected,
/// read-only price table. Never fails: unknown models are flagged, not
/// errors.
pub struct CostEstimator {
    table: PricingTable,
}

impl CostEstimator {
    pub fn new(table: PricingTable) -> Self {
        Self { table }
    }

    pub fn with_defaults() -> Self {
        Self::new(PricingTable::with_defaults())
    }

    /// Estimate the cost of one usage summary.
    pub fn estimate(&self, usage: &UsageSummary) -> CostEstimate {
        let mut by_model = Vec::with_capacity(usage.models.len());
        let mut total = 0.0;

        for (model, model_usage) in &usage.models {
            let (cost, pricing) = match self.table.resolve(model) {
                Some((p, PriceResolution::Exact)) => (
                    p.cost(model_usage.input_tokens, model_usage.output_tokens),
                    PricingMatch::Exact,
                ),
                Some((p, PriceResolution::Prefix)) => (
                    p.cost(model_usage.input_tokens, model_usage.output_tokens),
                    PricingMatch::Prefix,
                ),
                None => {
                    debug!(model = %model, "No pricing entry; estimating zero cost");
                    (0.0, PricingMatch::UnknownModel)
                }
            };
            total += cost;
            by_model.push(ModelCost {
                model: model.clone(),
                input_tokens: model_usage.input_tokens,
                output_tokens: model_usage.output_tokens,
                total_calls: model_usage.total_calls,
                cost_usd: round(cost),
                pricing,
            });
        }

        CostEstimate {
            total_estimated_usd: round(total),
            by_model,
        }
    }
}

fn round(value: f64) -> f64 {
    let factor = 10f64.powi(PRECISION_DECIMALS);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage_of(entries: &[(&str, u64, u64)]) -> UsageSummary {
        let mut usage = UsageSummary::default();
        for (model, input, output) in entries {
            usage.record(*model, *input, *output);
        }
        usage
    }

    #[test]
    fn known_model_cost() {
        let estimator = CostEstimator::with_defaults();
        // kimi-k2.5 is $0.60/M input, $3.00/M output:
        // 2000/1e6*0.60 + 1000/1e6*3.00 = 0.0012 + 0.003 = 0.0042
        let estimate = estimator.estimate(&usage_of(&[("kimi-k2.5", 2000, 1000)]));
        assert!((estimate.total_estimated_usd - 0.0042).abs() < 1e-10);
        assert_eq!(estimate.by_model.len(), 1);
        assert_eq!(estimate.by_model[0].pricing, PricingMatch::Exact);
    }

    #[test]
    fn unknown_model_costs_zero_and_is_flagged() {
        let estimator = CostEstimator::with_defaults();
        let estimate = estimator.estimate(&usage_of(&[("mystery-model-9000", 5000, 5000)]));
        assert_eq!(estimate.total_estimated_usd, 0.0);
        assert_eq!(estimate.by_model[0].pricing, PricingMatch::UnknownModel);
        assert_eq!(estimate.by_model[0].input_tokens, 5000);
    }

    #[test]
    fn mixed_models_sum_and_unknowns_do_not_fail() {
        let estimator = CostEstimator::with_defaults();
        let estimate = estimator.estimate(&usage_of(&[
            ("kimi-k2.5", 2000, 1000),
            ("mystery-model", 999, 999),
        ]));
        assert!((estimate.total_estimated_usd - 0.0042).abs() < 1e-10);
        assert_eq!(estimate.by_model.len(), 2);
    }

    #[test]
    fn versioned_name_uses_prefix_pricing() {
        let estimator = CostEstimator::with_defaults();
        let estimate = estimator.estimate(&usage_of(&[("kimi-k2.5-20260115", 2000, 1000)]));
        assert!((estimate.total_estimated_usd - 0.0042).abs() < 1e-10);
        assert_eq!(estimate.by_model[0].pricing, PricingMatch::Prefix);
    }

    #[test]
    fn totals_round_to_six_decimals() {
        let estimator = CostEstimator::with_defaults();
        // 1 input token on kimi-k2.5 = 0.0000006, rounds to 0.000001
        let estimate = estimator.estimate(&usage_of(&[("kimi-k2.5", 1, 0)]));
        assert!((estimate.total_estimated_usd - 0.000001).abs() < 1e-12);
    }

    #[test]
    fn empty_usage_estimates_zero() {
        let estimator = CostEstimator::with_defaults();
        let estimate = estimator.estimate(&UsageSummary::default());
        assert_eq!(estimate.total_estimated_usd, 0.0);
        assert!(estimate.by_model.is_empty());
    }
}
