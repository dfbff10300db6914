use std::fmt;

use crate::context::ContextId;

/// Registry and configuration failures. Per-specimen gaps are never errors;
/// they surface as `FeatureResult::NotApplicable`.
#[derive(Debug)]
pub enum FeatureError {
    DuplicateName(String),
    UnknownFeature(String),
    /// Names on the dependency cycle, in declaration order.
    Cycle(Vec<String>),
    /// A cache built for one context was handed a different one.
    ContextMismatch { cache: ContextId, context: ContextId },
    Config(toml::de::Error),
    Io(std::io::Error),
}

impl fmt::Display for FeatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureError::DuplicateName(name) => write!(f, "feature '{name}' already registered"),
            FeatureError::UnknownFeature(name) => write!(f, "unknown feature '{name}'"),
            FeatureError::Cycle(names) => {
                write!(f, "dependency cycle among features: {}", names.join(", "))
            }
            FeatureError::ContextMismatch { cache, context } => write!(
                f,
                "cache belongs to context {} but was used with context {}",
                cache.as_uuid(),
                context.as_uuid()
            ),
            FeatureError::Config(e) => write!(f, "invalid feature config: {e}"),
            FeatureError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for FeatureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeatureError::Config(e) => Some(e),
            FeatureError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for FeatureError {
    fn from(e: toml::de::Error) -> Self {
        FeatureError::Config(e)
    }
}

impl From<std::io::Error> for FeatureError {
    fn from(e: std::io::Error) -> Self {
        FeatureError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, FeatureError>;
