//! Token pricing configuration and calculations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::constants::{models, providers};

/// Token pricing configuration per provider/model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPricing {
    /// Price per 1K input tokens in USD
    pub input_price_per_1k: f64,
    /// Price per 1K output tokens in USD
    pub output_price_per_1k: f64,
}

impl Default for TokenPricing {
    fn default() -> Self {
        // Flat gpt-4o-mini input rate, applied to every token
        Self {
            input_price_per_1k: 0.00015,
            output_price_per_1k: 0.00015,
        }
    }
}

impl TokenPricing {
    /// Calculate cost for given token usage
    pub fn calculate_cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        let input_cost = (input_tokens as f64 / 1000.0) * self.input_price_per_1k;
        let output_cost = (output_tokens as f64 / 1000.0) * self.output_price_per_1k;
        input_cost + output_cost
    }
}

/// Pricing per provider/model combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub pricing: HashMap<String, TokenPricing>,
    /// Used for models without an entry
    pub fallback: TokenPricing,
}

impl Default for PricingConfig {
    fn default() -> Self {
        let mut pricing = HashMap::new();

        pricing.insert(format!("{}/{}", providers::OPENAI, models::GPT_4O_MINI), TokenPricing {
            input_price_per_1k: 0.00015,
            output_price_per_1k: 0.0006,
        });
        pricing.insert(format!("{}/{}", providers::GEMINI, models::GEMINI_2_0_FLASH), TokenPricing {
            input_price_per_1k: 0.0001,
            output_price_per_1k: 0.0004,
        });

        Self {
            pricing,
            fallback: TokenPricing::default(),
        }
    }
}

impl PricingConfig {
    /// Get pricing for a specific provider/model combination
    pub fn get_pricing(&self, provider: &str, model: &str) -> &TokenPricing {
        let key = format!("{}/{}", provider, model);
        self.pricing.get(&key).unwrap_or(&self.fallback)
    }

    /// Calculate cost for a provider/model combination
    pub fn calculate_cost(&self, provider: &str, model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
        self.get_pricing(provider, model)
            .calculate_cost(input_tokens, output_tokens)
    }

    /// Add or update pricing for a provider/model
    pub fn set_pricing(&mut self, provider: &str, model: &str, pricing: TokenPricing) {
        let key = format!("{}/{}", provider, model);
        self.pricing.insert(key, pricing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_model_cost() {
        let config = PricingConfig::default();
        let cost = config.calculate_cost("openai", "gpt-4o-mini", 1000, 1000);
        assert!((cost - 0.00075).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_model_uses_fallback() {
        let config = PricingConfig::default();
        let cost = config.calculate_cost("openai", "mystery", 2000, 0);
        assert!((cost - 0.0003).abs() < 1e-12);
    }

    #[test]
    fn test_set_pricing_overrides() {
        let mut config = PricingConfig::default();
        config.set_pricing("gemini", "gemini-2.0-flash", TokenPricing {
            input_price_per_1k: 0.0,
            output_price_per_1k: 0.0,
        });
        assert_eq!(config.calculate_cost("gemini", "gemini-2.0-flash", 5000, 5000), 0.0);
    }
}
