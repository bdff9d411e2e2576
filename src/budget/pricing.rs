//! Per-model prices, in USD per million tokens.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPrice {
    pub model: &'static str,
    pub input_per_million: f64,
    pub output_per_million: f64,
}

const fn price(model: &'static str, input: f64, output: f64) -> ModelPrice {
    ModelPrice {
        model,
        input_per_million: input,
        output_per_million: output,
    }
}

/// Models with known pricing, keyed by `provider/name`.
pub const KNOWN_PRICES: &[ModelPrice] = &[
    price("openai/gpt-4o", 5.0, 15.0),
    price("openai/gpt-4o-mini", 0.15, 0.6),
    price("openai/gpt-4-turbo", 10.0, 30.0),
    price("openai/gpt-3.5-turbo", 0.5, 1.5),
    price("anthropic/claude-3-opus-20240229", 15.0, 75.0),
    price("anthropic/claude-3-5-sonnet-20240620", 3.0, 15.0),
    price("anthropic/claude-3-haiku-20240307", 0.25, 1.25),
    price("azure/gpt-4o", 5.0, 15.0),
    price("gemini/gemini-1.5-pro", 3.5, 10.5),
    price("gemini/gemini-1.5-flash", 0.35, 1.05),
];

#[derive(Debug, Clone)]
pub struct PricingTable {
    prices: Vec<ModelPrice>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::with_prices(KNOWN_PRICES.to_vec())
    }
}

impl PricingTable {
    pub fn with_prices(prices: Vec<ModelPrice>) -> Self {
        Self { prices }
    }

    pub fn lookup(&self, model: &str) -> Option<&ModelPrice> {
        self.prices.iter().find(|p| p.model == model)
    }

    /// `None` when the model has no known price.
    pub fn cost(&self, model: &str, input_tokens: usize, output_tokens: usize) -> Option<f64> {
        self.lookup(model).map(|p| {
            input_tokens as f64 * p.input_per_million / 1_000_000.0
                + output_tokens as f64 * p.output_per_million / 1_000_000.0
        })
    }

    /// Models whose name contains `filter`, case-insensitively.
    pub fn matching(&self, filter: Option<&str>) -> Vec<&ModelPrice> {
        let needle = filter.map(|f| f.to_lowercase());
        self.prices
            .iter()
            .filter(|p| match &needle {
                Some(n) => p.model.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .collect()
    }
}

/// Strictly greater: a cost equal to the ceiling is allowed.
pub fn exceeds_maximum(cost: f64, ceiling: f64) -> bool {
    cost > ceiling
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_for_known_model() {
        let table = PricingTable::default();
        let cost = table.cost("openai/gpt-4o", 1_000_000, 100_000).unwrap();
        assert!((cost - 6.5).abs() < 1e-9);
        let cost = table.cost("anthropic/claude-3-opus-20240229", 100_000, 0).unwrap();
        assert!((cost - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_model_has_no_cost() {
        assert_eq!(PricingTable::default().cost("openai/gpt-9", 10, 10), None);
    }

    #[test]
    fn test_exceeds_maximum() {
        assert!(exceeds_maximum(5.01, 5.00));
        assert!(!exceeds_maximum(5.00, 5.00));
        assert!(!exceeds_maximum(0.0, 5.00));
    }

    #[test]
    fn test_matching_filter() {
        let table = PricingTable::default();
        let claude = table.matching(Some("CLAUDE"));
        assert!(!claude.is_empty());
        assert!(claude.iter().all(|p| p.model.starts_with("anthropic/")));
        assert_eq!(table.matching(None).len(), KNOWN_PRICES.len());
    }
}
