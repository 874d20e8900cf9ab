//! Model registry and pricing.
//!
//! A static table mapping model identifiers to provider, tokenizer encoding,
//! context window size, and per-million-token prices. Defined once at compile
//! time and never mutated.

use serde::Serialize;
use thiserror::Error;

/// Model used when the caller does not specify one.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Errors that can occur when resolving a model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model id is not in the registry. Carries the full list of known
    /// ids for diagnostics.
    #[error("unsupported model: {model} (known models: {})", .known.join(", "))]
    UnsupportedModel {
        model: String,
        known: Vec<&'static str>,
    },
}

/// Per-million-token prices for a model.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pricing {
    /// Cost per 1M input tokens.
    pub input_price: f64,
    /// Cost per 1M output tokens.
    pub output_price: f64,
    /// Currency the prices are denominated in.
    pub currency: &'static str,
}

/// Static configuration for a single model.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelConfig {
    /// Display name.
    pub name: &'static str,
    /// Provider the model belongs to (e.g. "OpenAI", "Anthropic").
    pub provider: &'static str,
    /// tiktoken encoding name, when the provider supports exact tokenization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<&'static str>,
    /// Maximum context window size in tokens.
    pub max_tokens: usize,
    /// Pricing information.
    pub pricing: Pricing,
}

const USD: &str = "USD";

/// The registry table. Order here is the order `supported_models` reports.
const MODELS: &[(&str, ModelConfig)] = &[
    (
        "gpt-4",
        ModelConfig {
            name: "GPT-4",
            provider: "OpenAI",
            encoding: Some("cl100k_base"),
            max_tokens: 8_192,
            pricing: Pricing {
                input_price: 30.0,
                output_price: 60.0,
                currency: USD,
            },
        },
    ),
    (
        "gpt-4-turbo",
        ModelConfig {
            name: "GPT-4 Turbo",
            provider: "OpenAI",
            encoding: Some("cl100k_base"),
            max_tokens: 128_000,
            pricing: Pricing {
                input_price: 10.0,
                output_price: 30.0,
                currency: USD,
            },
        },
    ),
    (
        "gpt-4o",
        ModelConfig {
            name: "GPT-4o",
            provider: "OpenAI",
            encoding: Some("o200k_base"),
            max_tokens: 128_000,
            pricing: Pricing {
                input_price: 5.0,
                output_price: 15.0,
                currency: USD,
            },
        },
    ),
    (
        "gpt-4o-mini",
        ModelConfig {
            name: "GPT-4o mini",
            provider: "OpenAI",
            encoding: Some("o200k_base"),
            max_tokens: 128_000,
            pricing: Pricing {
                input_price: 0.15,
                output_price: 0.6,
                currency: USD,
            },
        },
    ),
    (
        "gpt-3.5-turbo",
        ModelConfig {
            name: "GPT-3.5 Turbo",
            provider: "OpenAI",
            encoding: Some("cl100k_base"),
            max_tokens: 16_385,
            pricing: Pricing {
                input_price: 0.5,
                output_price: 1.5,
                currency: USD,
            },
        },
    ),
    (
        "claude-3-opus",
        ModelConfig {
            name: "Claude 3 Opus",
            provider: "Anthropic",
            encoding: None,
            max_tokens: 200_000,
            pricing: Pricing {
                input_price: 15.0,
                output_price: 75.0,
                currency: USD,
            },
        },
    ),
    (
        "claude-3-sonnet",
        ModelConfig {
            name: "Claude 3 Sonnet",
            provider: "Anthropic",
            encoding: None,
            max_tokens: 200_000,
            pricing: Pricing {
                input_price: 3.0,
                output_price: 15.0,
                currency: USD,
            },
        },
    ),
    (
        "claude-3-haiku",
        ModelConfig {
            name: "Claude 3 Haiku",
            provider: "Anthropic",
            encoding: None,
            max_tokens: 200_000,
            pricing: Pricing {
                input_price: 0.25,
                output_price: 1.25,
                currency: USD,
            },
        },
    ),
    (
        "claude-3-5-sonnet",
        ModelConfig {
            name: "Claude 3.5 Sonnet",
            provider: "Anthropic",
            encoding: None,
            max_tokens: 200_000,
            pricing: Pricing {
                input_price: 3.0,
                output_price: 15.0,
                currency: USD,
            },
        },
    ),
    (
        "gemini-1.5-pro",
        ModelConfig {
            name: "Gemini 1.5 Pro",
            provider: "Google",
            encoding: None,
            max_tokens: 1_048_576,
            pricing: Pricing {
                input_price: 3.5,
                output_price: 10.5,
                currency: USD,
            },
        },
    ),
    (
        "gemini-1.5-flash",
        ModelConfig {
            name: "Gemini 1.5 Flash",
            provider: "Google",
            encoding: None,
            max_tokens: 1_048_576,
            pricing: Pricing {
                input_price: 0.35,
                output_price: 1.05,
                currency: USD,
            },
        },
    ),
    (
        "mistral-large",
        ModelConfig {
            name: "Mistral Large",
            provider: "Mistral",
            encoding: None,
            max_tokens: 32_000,
            pricing: Pricing {
                input_price: 4.0,
                output_price: 12.0,
                currency: USD,
            },
        },
    ),
];

/// Look up a model by id.
pub fn lookup(model_id: &str) -> Result<&'static ModelConfig, ModelError> {
    MODELS
        .iter()
        .find(|(id, _)| *id == model_id)
        .map(|(_, config)| config)
        .ok_or_else(|| ModelError::UnsupportedModel {
            model: model_id.to_string(),
            known: supported_models(),
        })
}

/// Get the configuration for a model id.
pub fn model_config(model_id: &str) -> Result<&'static ModelConfig, ModelError> {
    lookup(model_id)
}

/// List every known model id, in registry definition order.
pub fn supported_models() -> Vec<&'static str> {
    MODELS.iter().map(|(id, _)| *id).collect()
}

/// List model ids whose provider matches `provider` (case-insensitive).
///
/// Unknown providers yield an empty list, not an error.
pub fn models_by_provider(provider: &str) -> Vec<&'static str> {
    MODELS
        .iter()
        .filter(|(_, config)| config.provider.eq_ignore_ascii_case(provider))
        .map(|(id, _)| *id)
        .collect()
}
