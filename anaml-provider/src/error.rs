//! Error types for mapping, transport and provider configuration

use std::sync::LazyLock;

use anaml_core::provider::{ErrorKind, ProviderError};
use regex::Regex;
use thiserror::Error;

static UNKNOWN_VARIANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"unknown variant `([^`]*)`").expect("unknown variant pattern is valid")
});

/// Errors raised while composing or flattening a resource
#[derive(Debug, Error)]
pub enum MapError {
    /// None of the mutually exclusive blocks is populated
    #[error("No variant selected for '{field}': set one of {}", expected.join(", "))]
    NoVariantSelected { field: String, expected: Vec<String> },

    /// A field has a shape that cannot be coerced
    #[error("Invalid value for '{field}': expected {expected}, got {got}")]
    InvalidFieldType {
        field: String,
        expected: &'static str,
        got: &'static str,
    },

    /// An identifier string is not a decimal integer
    #[error("Invalid identifier '{value}' in '{field}': must be parsable as an integer")]
    InvalidIdentifierFormat { field: String, value: String },

    /// A required attribute is absent
    #[error("Missing required attribute '{0}'")]
    MissingAttribute(String),

    /// A configured token is outside its fixed vocabulary
    #[error("Unknown {vocabulary} '{token}', expected one of {}", expected.join(", "))]
    UnknownToken {
        vocabulary: &'static str,
        token: String,
        expected: Vec<&'static str>,
    },

    /// The backend returned a discriminator no variant is declared for
    #[error("Unknown variant tag '{tag}' in backend record")]
    UnknownVariantTag { tag: String },

    /// The backend record does not match its declared shape
    #[error("Malformed backend record: {0}")]
    Wire(#[source] serde_json::Error),
}

impl MapError {
    pub fn invalid_type(field: impl Into<String>, expected: &'static str, got: &'static str) -> Self {
        Self::InvalidFieldType {
            field: field.into(),
            expected,
            got,
        }
    }

    /// Classify a decode failure, separating unknown discriminators from
    /// other malformed records
    pub fn from_wire(err: serde_json::Error) -> Self {
        let tag = UNKNOWN_VARIANT
            .captures(&err.to_string())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        match tag {
            Some(tag) => Self::UnknownVariantTag { tag },
            None => Self::Wire(err),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MapError::UnknownVariantTag { .. } => ErrorKind::UnknownVariantTag,
            MapError::Wire(_) => ErrorKind::Backend,
            _ => ErrorKind::Configuration,
        }
    }
}

impl From<MapError> for ProviderError {
    fn from(err: MapError) -> Self {
        ProviderError::new(err.kind(), err.to_string()).with_cause(err)
    }
}

/// Errors raised by the REST client
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend does not know the object
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Non-success response
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Network or connection failure
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body is not the expected JSON
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<ClientError> for ProviderError {
    fn from(err: ClientError) -> Self {
        ProviderError::backend(err.to_string()).with_cause(err)
    }
}

/// Errors in the provider block
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting is neither configured nor present in the environment
    #[error("Missing provider setting '{name}': configure it or set {env}")]
    Missing { name: &'static str, env: &'static str },

    /// The host is not a valid absolute URL
    #[error("Invalid host '{host}': {source}")]
    InvalidHost {
        host: String,
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl From<ConfigError> for ProviderError {
    fn from(err: ConfigError) -> Self {
        ProviderError::configuration(err.to_string()).with_cause(err)
    }
}
