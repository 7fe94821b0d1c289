//! Informational cost estimate for a run.
//!
//! The estimate is linear in characters: every request costs its document
//! plus the prompt template, converted to tokens at a fixed ratio and priced
//! per million tokens. It is shown to the user before processing and never
//! gates anything.

use serde::Deserialize;

/// Pricing used for the estimate.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Pricing {
    #[serde(default = "default_price")]
    pub price_per_million_tokens: f64,
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,
}

fn default_price() -> f64 {
    0.15
}
fn default_chars_per_token() -> usize {
    4
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            price_per_million_tokens: default_price(),
            chars_per_token: default_chars_per_token(),
        }
    }
}

impl Pricing {
    fn cost(&self, chars: u64) -> f64 {
        let tokens = chars as f64 / self.chars_per_token.max(1) as f64;
        tokens * self.price_per_million_tokens / 1_000_000.0
    }
}

/// Estimated cost of sending a set of documents.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostEstimate {
    pub requests: usize,
    /// Characters sent, each document capped at the truncation limit.
    pub sent_chars: u64,
    /// Characters that would be sent without truncation.
    pub total_chars: u64,
    /// Cost with truncation applied (what will actually be sent).
    pub as_sent: f64,
    /// Cost without truncation.
    pub untruncated: f64,
}

impl CostEstimate {
    /// Estimate for documents of `sizes` characters each.
    pub fn compute<I>(sizes: I, prompt_overhead: usize, limit: usize, pricing: &Pricing) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut estimate = CostEstimate::default();
        for size in sizes {
            estimate.requests += 1;
            estimate.sent_chars += (size.min(limit) + prompt_overhead) as u64;
            estimate.total_chars += (size + prompt_overhead) as u64;
        }
        estimate.as_sent = pricing.cost(estimate.sent_chars);
        estimate.untruncated = pricing.cost(estimate.total_chars);
        estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_each_document_at_limit() {
        let pricing = Pricing {
            price_per_million_tokens: 1.0,
            chars_per_token: 4,
        };
        let estimate = CostEstimate::compute([100, 1_000], 20, 500, &pricing);
        assert_eq!(estimate.requests, 2);
        assert_eq!(estimate.sent_chars, 120 + 520);
        assert_eq!(estimate.total_chars, 120 + 1_020);
        assert!((estimate.as_sent - 640.0 / 4.0 / 1_000_000.0).abs() < 1e-12);
        assert!(estimate.untruncated > estimate.as_sent);
    }

    #[test]
    fn empty_run_costs_nothing() {
        let estimate = CostEstimate::compute(Vec::<usize>::new(), 50, 10, &Pricing::default());
        assert_eq!(estimate, CostEstimate::default());
    }

    #[test]
    fn default_pricing_matches_small_model() {
        // 4M characters at 4 chars/token = 1M tokens = $0.15
        let estimate = CostEstimate::compute([4_000_000], 0, usize::MAX, &Pricing::default());
        assert!((estimate.as_sent - 0.15).abs() < 1e-9);
    }
}
