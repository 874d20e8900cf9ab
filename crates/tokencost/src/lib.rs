//! Offline token counting and cost estimation for LLM providers.
//!
//! Estimates how many tokens a text or chat conversation will consume for a
//! given model, and converts that into a monetary estimate using a static
//! per-model pricing table. OpenAI models are counted exactly via
//! tiktoken-rs; other providers use a character-based approximation. There
//! are no network calls and no persisted state.
//!
//! # Example
//!
//! ```
//! use tokencost::{count_tokens, estimate_cost, CountOptions, CostOptions};
//!
//! let count = count_tokens("Hello, world!", &CountOptions::default()).unwrap();
//! assert!(count.tokens > 0);
//! assert_eq!(count.characters, 13);
//!
//! let estimate = estimate_cost(
//!     "Hello, world!",
//!     &CostOptions::for_model("gpt-4").with_output_tokens(500),
//! )
//! .unwrap();
//! assert!(estimate.total_cost > 0.0);
//! ```

mod cost;
mod counter;
mod models;

pub use cost::{
    check_token_limit, estimate_chat_cost, estimate_cost, format_cost, format_tokens,
    CostEstimate, CostOptions, LimitCheck,
};
pub use counter::{
    count_chat_tokens, count_tokens, CountOptions, Message, Role, TokenCount,
};
pub use models::{
    model_config, models_by_provider, supported_models, ModelConfig, ModelError, Pricing,
    DEFAULT_MODEL,
};
