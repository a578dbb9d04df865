//! Built-in pricing table for the models hindsight drives.
//!
//! Prices are in USD per 1 million tokens. Each entry names a model or a
//! model-name prefix; responses often carry a dated suffix
//! (`kimi-k2.5-20260115`), so lookup falls back from exact match to the
//! longest matching prefix. The table is immutable after construction and
//! injected into the estimator, never read as a global.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-million-token pricing for a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Price per 1M input tokens in USD (non-cached rate).
    pub input_per_m: f64,
    /// Price per 1M output tokens in USD.
    pub output_per_m: f64,
}

impl ModelPricing {
    pub fn new(input_per_m: f64, output_per_m: f64) -> Self {
        Self {
            input_per_m,
            output_per_m,
        }
    }

    /// Compute cost for the given token counts.
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 * self.input_per_m + output_tokens as f64 * self.output_per_m)
            / 1_000_000.0
    }
}

/// How a model name resolved against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceResolution {
    Exact,
    Prefix,
}

/// Immutable pricing table.
pub struct PricingTable {
    prices: HashMap<String, ModelPricing>,
}

impl PricingTable {
    /// Create a pricing table with built-in model prices.
    pub fn with_defaults() -> Self {
        let mut prices = HashMap::new();

        // ── Moonshot / Kimi ────────────────────────────────────────
        prices.insert("kimi-k2.5".into(), ModelPricing::new(0.60, 3.00));
        prices.insert("kimi-k2-turbo-preview".into(), ModelPricing::new(1.15, 8.00));
        prices.insert("kimi-k2-turbo".into(), ModelPricing::new(1.15, 8.00));
        prices.insert("kimi-k2".into(), ModelPricing::new(0.60, 2.50));

        // ── OpenAI (via proxy) ─────────────────────────────────────
        prices.insert("gpt-5.3-codex".into(), ModelPricing::new(1.25, 10.00));
        prices.insert("gpt-5.1-codex-mini".into(), ModelPricing::new(0.25, 2.00));
        prices.insert("gpt-5.2".into(), ModelPricing::new(1.75, 14.00));
        prices.insert("gpt-5".into(), ModelPricing::new(1.25, 10.00));

        // ── Others occasionally routed through the same proxy ──────
        prices.insert("claude-sonnet-4".into(), ModelPricing::new(3.00, 15.00));
        prices.insert("deepseek-v3".into(), ModelPricing::new(0.27, 1.10));

        Self { prices }
    }

    /// Create an empty pricing table.
    pub fn empty() -> Self {
        Self {
            prices: HashMap::new(),
        }
    }

    /// Create a table from explicit entries (config overrides).
    pub fn from_entries(entries: impl IntoIterator<Item = (String, ModelPricing)>) -> Self {
        Self {
            prices: entries.into_iter().collect(),
        }
    }

    /// Apply config-supplied overrides on top of this table, consuming it.
    /// Called once at startup; the result is still read-only afterwards.
    pub fn with_overrides(
        mut self,
        entries: impl IntoIterator<Item = (String, ModelPricing)>,
    ) -> Self {
        self.prices.extend(entries);
        self
    }

    /// Resolve pricing for a model name: exact match first, then the
    /// longest known prefix. Case-insensitive.
    pub fn resolve(&self, model: &str) -> Option<(ModelPricing, PriceResolution)> {
        if let Some(p) = self.prices.get(model) {
            return Some((*p, PriceResolution::Exact));
        }

        let model_lower = model.to_lowercase();
        let mut best: Option<(&str, &ModelPricing)> = None;
        for (key, pricing) in &self.prices {
            if model_lower.starts_with(&key.to_lowercase())
                && best.is_none_or(|(k, _)| key.len() > k.len())
            {
                best = Some((key.as_str(), pricing));
            }
        }
        best.map(|(_, p)| (*p, PriceResolution::Prefix))
    }

    /// List all known model names, sorted.
    pub fn models(&self) -> Vec<String> {
        let mut names: Vec<String> = self.prices.keys().cloned().collect();
        names.sort();
        names
    }

    /// Pricing for an exact model name, if present.
    pub fn get(&self, model: &str) -> Option<ModelPricing> {
        self.prices.get(model).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}
