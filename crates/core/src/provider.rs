use std::str::FromStr;

use crate::error::InsightError;

/// Variable consulted when the provider-specific key is not set.
pub const FALLBACK_API_KEY_ENV: &str = "API_KEY";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    Gemini,
    Openai,
    Grok,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-2.5-flash",
                env_var: "GEMINI_API_KEY",
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-5.1",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Openai => "OpenAI",
            Provider::Grok => "Grok",
        }
    }

    /// Look up the API key for this provider, falling back to `API_KEY`.
    pub fn api_key_from_env(&self) -> Option<String> {
        let config = self.config();
        std::env::var(config.env_var)
            .or_else(|_| std::env::var(FALLBACK_API_KEY_ENV))
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn require_api_key(&self, api_key: Option<&str>) -> Result<String, InsightError> {
        api_key
            .map(str::to_string)
            .ok_or_else(|| InsightError::MissingApiKey {
                env_var: self.config().env_var.to_string(),
            })
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::Openai),
            "grok" => Ok(Provider::Grok),
            other => Err(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_provider_is_gemini_flash() {
        let provider = Provider::default();
        assert_eq!(provider, Provider::Gemini);
        assert_eq!(provider.config().model, "gemini-2.5-flash");
    }

    #[test]
    fn test_parse_provider_names() {
        assert_eq!("Gemini".parse::<Provider>(), Ok(Provider::Gemini));
        assert_eq!(" openai ".parse::<Provider>(), Ok(Provider::Openai));
        assert_eq!("grok".parse::<Provider>(), Ok(Provider::Grok));
        assert_eq!("claude".parse::<Provider>(), Err("claude".to_string()));
    }

    #[test]
    fn test_require_api_key_names_env_var() {
        let err = Provider::Openai.require_api_key(None).unwrap_err();
        match err {
            InsightError::MissingApiKey { env_var } => assert_eq!(env_var, "OPENAI_API_KEY"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            Provider::Openai.require_api_key(Some("k")).unwrap(),
            "k".to_string()
        );
    }
}
