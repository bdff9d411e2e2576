//! Provider credentials.
//!
//! A model id looks like `<provider>/<model>` (`openai/gpt-4o`). The provider
//! prefix decides which environment variables must be present. A bare model
//! name is treated as an OpenAI model.

use crate::config::ConfigError;
use std::fmt;
use tracing::debug;

pub const OPENAI_DEFAULT_BASE: &str = "https://api.openai.com/v1/";
pub const ANTHROPIC_DEFAULT_BASE: &str = "https://api.anthropic.com/v1/";
pub const GEMINI_DEFAULT_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Anthropic,
    Gemini,
    Azure,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
            Provider::Azure => "azure",
        }
    }

    fn from_prefix(prefix: &str) -> Result<Self, ConfigError> {
        match prefix {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "gemini" => Ok(Provider::Gemini),
            "azure" => Ok(Provider::Azure),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `<provider>/<model>` id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelId {
    pub provider: Provider,
    /// Model name as the provider knows it (no prefix)
    pub name: String,
}

impl ModelId {
    pub fn parse(model: &str) -> Result<Self, ConfigError> {
        match model.split_once('/') {
            Some((prefix, name)) => Ok(Self {
                provider: Provider::from_prefix(prefix)?,
                name: name.to_string(),
            }),
            None => Ok(Self {
                provider: Provider::OpenAi,
                name: model.to_string(),
            }),
        }
    }

    /// The canonical prefixed form used for pricing lookups.
    pub fn qualified(&self) -> String {
        format!("{}/{}", self.provider, self.name)
    }
}

/// Everything needed to authenticate against one provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub provider: Provider,
    pub api_key: String,
    pub api_base: String,
    /// Azure only
    pub api_version: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .finish()
    }
}

fn required(provider: Provider, variable: &'static str) -> Result<String, ConfigError> {
    match std::env::var(variable) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingCredential {
            provider: provider.as_str(),
            variable,
        }),
    }
}

fn optional(variable: &str) -> Option<String> {
    std::env::var(variable).ok().filter(|v| !v.trim().is_empty())
}

impl Credentials {
    /// Resolve credentials for `model` from the environment.
    pub fn from_env(model: &ModelId) -> Result<Self, ConfigError> {
        let provider = model.provider;
        let credentials = match provider {
            Provider::OpenAi => Self {
                provider,
                api_key: required(provider, "OPENAI_API_KEY")?,
                api_base: optional("OPENAI_API_BASE")
                    .unwrap_or_else(|| OPENAI_DEFAULT_BASE.to_string()),
                api_version: None,
            },
            Provider::Anthropic => Self {
                provider,
                api_key: required(provider, "ANTHROPIC_API_KEY")?,
                api_base: ANTHROPIC_DEFAULT_BASE.to_string(),
                api_version: None,
            },
            Provider::Gemini => Self {
                provider,
                api_key: required(provider, "GEMINI_API_KEY")?,
                api_base: GEMINI_DEFAULT_BASE.to_string(),
                api_version: None,
            },
            Provider::Azure => Self {
                provider,
                api_key: required(provider, "AZURE_API_KEY")?,
                api_base: required(provider, "AZURE_API_BASE")?,
                api_version: Some(required(provider, "AZURE_API_VERSION")?),
            },
        };
        debug!(
            "Resolved {} credentials (base {})",
            credentials.provider, credentials.api_base
        );
        Ok(credentials)
    }

    /// Endpoint (relative to `api_base`) for streaming chat completions.
    pub fn chat_endpoint(&self, model: &str) -> String {
        match self.provider {
            Provider::OpenAi | Provider::Gemini => "chat/completions".to_string(),
            Provider::Anthropic => "messages".to_string(),
            Provider::Azure => format!(
                "openai/deployments/{}/chat/completions?api-version={}",
                model,
                self.api_version.as_deref().unwrap_or_default()
            ),
        }
    }

    /// Endpoint (relative to `api_base`) for embeddings.
    pub fn embeddings_endpoint(&self, model: &str) -> Result<String, ConfigError> {
        match self.provider {
            Provider::OpenAi | Provider::Gemini => Ok("embeddings".to_string()),
            Provider::Azure => Ok(format!(
                "openai/deployments/{}/embeddings?api-version={}",
                model,
                self.api_version.as_deref().unwrap_or_default()
            )),
            Provider::Anthropic => Err(ConfigError::EmbeddingsUnsupported {
                provider: self.provider.as_str(),
            }),
        }
    }

    /// Authentication headers for this provider.
    pub fn auth_headers(&self) -> Vec<(&'static str, String)> {
        match self.provider {
            Provider::OpenAi | Provider::Gemini => {
                vec![("Authorization", format!("Bearer {}", self.api_key))]
            }
            Provider::Azure => vec![("api-key", self.api_key.clone())],
            Provider::Anthropic => vec![
                ("x-api-key", self.api_key.clone()),
                ("anthropic-version", ANTHROPIC_VERSION.to_string()),
            ],
        }
    }
}
