//! Token counting using tiktoken-rs, with an approximation fallback.
//!
//! Models whose provider ships a tiktoken encoding are counted exactly via
//! the external tokenizer; for everything else (or when the caller forces
//! it) a character/whitespace/punctuation heuristic is used instead.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;

use crate::models::{self, ModelConfig, ModelError, DEFAULT_MODEL};

/// Punctuation characters the approximation weighs as likely token splits.
const PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '(', ')', '[', ']', '{', '}', '\'', '"',
];

/// Options accepted by the counting operations.
#[derive(Debug, Clone, Default)]
pub struct CountOptions {
    /// Model id to count against. Defaults to [`DEFAULT_MODEL`].
    pub model: Option<String>,
    /// Skip exact tokenization even when the model supports it.
    pub approximate_only: bool,
    /// Accepted for forward compatibility; currently has no effect on the
    /// count (special tokens are never included).
    pub include_special_tokens: bool,
}

impl CountOptions {
    /// Options targeting a specific model, everything else default.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Self::default()
        }
    }
}

/// Result of counting tokens in a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenCount {
    /// Number of tokens in the text.
    pub tokens: usize,
    /// Number of characters (Unicode scalar values) in the text.
    pub characters: usize,
}

impl TokenCount {
    /// Create a new token count.
    pub fn new(tokens: usize, characters: usize) -> Self {
        Self { tokens, characters }
    }

    /// Create a zero token count.
    pub fn zero() -> Self {
        Self {
            tokens: 0,
            characters: 0,
        }
    }
}

impl std::ops::Add for TokenCount {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            tokens: self.tokens + other.tokens,
            characters: self.characters + other.characters,
        }
    }
}

impl std::ops::AddAssign for TokenCount {
    fn add_assign(&mut self, other: Self) {
        self.tokens += other.tokens;
        self.characters += other.characters;
    }
}

/// Role of a chat message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Optional author name, counted as extra overhead for models with
    /// exact tokenization support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// Create a message with the given role and content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Attach an author name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

// Global encoder cache - built lazily, one encoder per encoding name.
// Populating it twice for the same encoding is harmless.
static ENCODERS: OnceLock<Mutex<HashMap<&'static str, Arc<CoreBPE>>>> = OnceLock::new();

fn encoder_for(encoding: &'static str) -> Option<Arc<CoreBPE>> {
    let cache = ENCODERS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut cache = cache.lock().ok()?;
    if let Some(bpe) = cache.get(encoding) {
        return Some(Arc::clone(bpe));
    }
    let bpe = Arc::new(build_encoder(encoding)?);
    cache.insert(encoding, Arc::clone(&bpe));
    Some(bpe)
}

fn build_encoder(encoding: &str) -> Option<CoreBPE> {
    match encoding {
        "cl100k_base" => tiktoken_rs::cl100k_base().ok(),
        "o200k_base" => tiktoken_rs::o200k_base().ok(),
        "p50k_base" => tiktoken_rs::p50k_base().ok(),
        "r50k_base" => tiktoken_rs::r50k_base().ok(),
        _ => None,
    }
}

/// Exact token count via tiktoken. `None` on any failure, so callers can
/// fall back to the approximation.
fn exact_token_count(encoding: &'static str, text: &str) -> Option<usize> {
    let bpe = encoder_for(encoding)?;
    Some(bpe.encode_ordinary(text).len())
}

/// Heuristic token count for text we cannot tokenize exactly.
///
/// An average English sub-word token spans roughly 4 characters, and spaces
/// and punctuation are frequently split into their own tokens, so each
/// contributes a fractional extra token beyond the character baseline.
pub(crate) fn approximate_token_count(text: &str) -> usize {
    let characters = text.chars().count();
    let spaces = text.chars().filter(|c| c.is_whitespace()).count();
    let punctuation = text.chars().filter(|c| PUNCTUATION.contains(c)).count();
    let estimate = characters as f64 / 4.0 + spaces as f64 * 0.3 + punctuation as f64 * 0.5;
    estimate.ceil() as usize
}

fn resolve_model(options: &CountOptions) -> Result<&'static ModelConfig, ModelError> {
    models::lookup(options.model.as_deref().unwrap_or(DEFAULT_MODEL))
}

fn count_for_model(text: &str, model: &ModelConfig, options: &CountOptions) -> TokenCount {
    let characters = text.chars().count();
    let tokens = match model.encoding {
        Some(encoding) if !options.approximate_only => {
            exact_token_count(encoding, text).unwrap_or_else(|| approximate_token_count(text))
        }
        _ => approximate_token_count(text),
    };
    TokenCount::new(tokens, characters)
}

/// Count tokens in a text string.
///
/// Empty text short-circuits to a zero count without consulting the model
/// registry. Otherwise the model (default [`DEFAULT_MODEL`]) decides the
/// strategy: exact tokenization when the model carries an encoding and
/// `approximate_only` is false, the approximation formula otherwise. Exact
/// tokenizer failures are swallowed and replaced with the approximation.
///
/// The `characters` field is always the raw character length of the input,
/// regardless of counting strategy.
pub fn count_tokens(text: &str, options: &CountOptions) -> Result<TokenCount, ModelError> {
    if text.is_empty() {
        return Ok(TokenCount::zero());
    }
    let model = resolve_model(options)?;
    Ok(count_for_model(text, model, options))
}

/// Per-message token overhead for conversational structure (role markers,
/// separators) by provider family.
fn message_overhead(model: &ModelConfig) -> usize {
    if model.encoding.is_some() {
        4
    } else if model.provider.eq_ignore_ascii_case("anthropic") {
        3
    } else {
        2
    }
}

/// Count tokens for a chat conversation, including per-message and
/// conversation-level structural overhead.
///
/// Overhead is provider-dependent: models with exact tokenization get +4
/// tokens per message (plus the tokens of the `name` field when present)
/// and +3 once per conversation; Anthropic models get +3 per message;
/// everything else +2. Overhead never contributes to `characters`.
///
/// An empty message slice yields a zero count; the conversation-level
/// overhead only applies when at least one message exists.
pub fn count_chat_tokens(messages: &[Message], options: &CountOptions) -> Result<TokenCount, ModelError> {
    let model = resolve_model(options)?;
    if messages.is_empty() {
        return Ok(TokenCount::zero());
    }

    let mut total = TokenCount::zero();
    for message in messages {
        total += count_for_model(&message.content, model, options);
        total.tokens += message_overhead(model);
        if model.encoding.is_some() {
            if let Some(name) = &message.name {
                total.tokens += count_for_model(name, model, options).tokens;
            }
        }
    }
    if model.encoding.is_some() {
        total.tokens += 3;
    }
    Ok(total)
}
