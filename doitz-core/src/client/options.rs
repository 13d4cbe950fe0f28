use serde_json::{Map, Value};

pub const API_KEY_ENV: &str = "IDOIT_API_KEY";
pub const LANGUAGE_ENV: &str = "IDOIT_API_LANGUAGE";
pub const DEFAULT_LANGUAGE: &str = "en";

/// Parameters sent with every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// The API key of the i-doit installation.
    pub api_key: Option<String>,
    /// Language of the labels the server returns.
    pub language: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl ClientOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Reads `IDOIT_API_KEY` and `IDOIT_API_LANGUAGE`, falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value: &String| !value.is_empty());

        Self {
            api_key: non_empty(API_KEY_ENV),
            language: non_empty(LANGUAGE_ENV).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        }
    }

    /// The `apikey`/`language` members merged into the params of every envelope.
    pub(crate) fn common_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        if let Some(key) = &self.api_key {
            params.insert("apikey".to_string(), Value::from(key.as_str()));
        }
        params.insert("language".to_string(), Value::from(self.language.as_str()));
        params
    }
}
