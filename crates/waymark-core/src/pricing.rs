//! Per-model pricing used to compute usage-ledger costs at write time.

/// External services tracked in the usage ledger.
pub mod service {
    /// Generative-AI text/multimodal endpoint.
    pub const GENAI: &str = "genai";
    /// Places text-search endpoint.
    pub const PLACES: &str = "places";
}

/// USD rates per single token for a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenRates {
    pub input: f64,
    pub output: f64,
}

const PER_MILLION: f64 = 1_000_000.0;

/// Pricing table for the generative service, per 1M tokens.
///
/// Rates as of December 2024; unknown models price at zero rather than
/// failing the ledger write.
const GENAI_PRICING: &[(&str, f64, f64)] = &[
    ("gemini-2.5-flash", 0.15, 0.60),
    ("gemini-2.5-pro", 1.25, 10.0),
    ("gemini-2.0-flash", 0.10, 0.40),
    ("gemini-2.0-flash-exp", 0.0, 0.0),
    ("gemini-1.5-flash", 0.075, 0.30),
    ("gemini-1.5-pro", 1.25, 5.0),
];

/// Look up token rates for a generative model.
pub fn rates_for(service_name: &str, model: &str) -> Option<TokenRates> {
    if service_name != service::GENAI {
        return None;
    }
    GENAI_PRICING
        .iter()
        .find(|(name, _, _)| *name == model)
        .map(|(_, input, output)| TokenRates {
            input: input / PER_MILLION,
            output: output / PER_MILLION,
        })
}

/// Compute the USD cost of one external call.
///
/// Returns 0.0 for unknown models, non-token services, or missing counts.
pub fn calculate_cost(
    service_name: &str,
    model: Option<&str>,
    input_tokens: Option<i64>,
    output_tokens: Option<i64>,
) -> f64 {
    let Some(model) = model else {
        return 0.0;
    };
    let Some(rates) = rates_for(service_name, model) else {
        return 0.0;
    };
    match (input_tokens, output_tokens) {
        (Some(input), Some(output)) => input as f64 * rates.input + output as f64 * rates.output,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_model_cost() {
        // gemini-2.0-flash: $0.10 in / $0.40 out per 1M tokens
        let cost = calculate_cost(service::GENAI, Some("gemini-2.0-flash"), Some(1_000_000), Some(1_000_000));
        assert!((cost - 0.50).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_model_costs_zero() {
        let cost = calculate_cost(service::GENAI, Some("mystery-model"), Some(1000), Some(1000));
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn test_missing_tokens_cost_zero() {
        let cost = calculate_cost(service::GENAI, Some("gemini-2.0-flash"), None, Some(10));
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn test_places_service_has_no_token_pricing() {
        let cost = calculate_cost(service::PLACES, Some("text-search"), Some(10), Some(10));
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn test_free_preview_model() {
        let cost = calculate_cost(
            service::GENAI,
            Some("gemini-2.0-flash-exp"),
            Some(5_000_000),
            Some(5_000_000),
        );
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn test_missing_model_costs_zero() {
        assert_eq!(calculate_cost(service::GENAI, None, Some(10), Some(10)), 0.0);
    }
}
