//! Token counting over a conversation.

use anyhow::{Context, Result};
use tiktoken_rs::CoreBPE;
use tracing::warn;

use crate::domain::{ContentBlock, Message, Role};

/// Tokenizer for one model.
pub struct TokenCounter {
    bpe: CoreBPE,
}

impl TokenCounter {
    /// Encoding registered for the model name (without provider prefix),
    /// falling back to `cl100k_base`.
    pub fn for_model(model: &str) -> Result<Self> {
        let name = model.rsplit('/').next().unwrap_or(model);
        let bpe = match tiktoken_rs::get_bpe_from_model(name) {
            Ok(bpe) => bpe,
            Err(_) => {
                warn!(
                    "No model-specific encoding for {}, defaulting to 'cl100k_base'",
                    model
                );
                tiktoken_rs::cl100k_base().context("Failed to load cl100k_base encoding")?
            }
        };
        Ok(Self { bpe })
    }

    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Count every block of every message from scratch.
    ///
    /// Images are counted by tokenizing their data URL, which approximates
    /// rather than matches what a vision model bills.
    pub fn evaluate(&self, messages: &[Message]) -> TokenAccount {
        let mut account = TokenAccount::default();

        for message in messages {
            for block in &message.content {
                let tokens = match block {
                    ContentBlock::Text(text) => {
                        let n = self.count(text);
                        account.content_tokens += n;
                        n
                    }
                    ContentBlock::Image(url) => {
                        let n = self.count(url);
                        account.image_tokens += n;
                        n
                    }
                };
                if message.role == Role::User {
                    account.input_tokens += tokens;
                } else {
                    account.output_tokens += tokens;
                }
            }
        }

        account.total_tokens = account.input_tokens + account.output_tokens;
        account
    }
}

/// Token totals for one evaluation. `cost` is `None` for unpriced models.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TokenAccount {
    pub content_tokens: usize,
    pub image_tokens: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
    pub cost: Option<f64>,
}
