use thiserror::Error;

pub const NO_EVENTS_MESSAGE: &str =
    "No events tracked yet. Interact with the sandbox environment to generate data for analysis.";
pub const EMPTY_RESPONSE_MESSAGE: &str = "Unable to generate analysis at this time.";
pub const REQUEST_FAILED_MESSAGE: &str =
    "An error occurred while analyzing the event data. Please ensure your API key is valid.";

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("No events to analyze")]
    EmptyInput,

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid API response: {reason}")]
    MalformedResponse { reason: String },

    #[error("API returned an empty analysis")]
    EmptyResponse,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InsightError {
    /// Text shown in place of an analysis when the request did not produce one.
    pub fn display_text(&self) -> &'static str {
        match self {
            InsightError::EmptyInput => NO_EVENTS_MESSAGE,
            InsightError::EmptyResponse => EMPTY_RESPONSE_MESSAGE,
            _ => REQUEST_FAILED_MESSAGE,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorefrontError {
    #[error("Cart is empty!")]
    EmptyCart,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown provider '{value}' in {env_var} (expected gemini, openai or grok)")]
    UnknownProvider { env_var: String, value: String },

    #[error("Unknown timeline order '{value}' in {env_var} (expected lexicographic or chronological)")]
    UnknownTimelineOrder { env_var: String, value: String },
}
