use std::fmt;

use serde::{Deserialize, Serialize};

/// A computed feature value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Scalar(f64),
    /// Fixed-arity tuple; the arity is part of the feature's contract.
    Tuple(Vec<f64>),
}

impl FeatureValue {
    pub fn pair(a: f64, b: f64) -> Self {
        Self::Tuple(vec![a, b])
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Tuple(_) => None,
        }
    }

    pub fn as_pair(&self) -> Option<(f64, f64)> {
        match self {
            Self::Tuple(values) => match values.as_slice() {
                [a, b] => Some((*a, *b)),
                _ => None,
            },
            Self::Scalar(_) => None,
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

impl From<(f64, f64)> for FeatureValue {
    fn from((a, b): (f64, f64)) -> Self {
        Self::pair(a, b)
    }
}

/// Why a feature produced no value for a specimen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum NotApplicable {
    /// No node matches the named mark.
    MissingMark(String),
    /// The named dependency was itself not applicable.
    Dependency(String),
    /// The function ran and found nothing to measure.
    InsufficientData,
}

impl fmt::Display for NotApplicable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotApplicable::MissingMark(mark) => write!(f, "no nodes for mark '{mark}'"),
            NotApplicable::Dependency(name) => write!(f, "dependency '{name}' not applicable"),
            NotApplicable::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

/// Outcome of evaluating one feature against one context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureResult {
    Value(FeatureValue),
    NotApplicable(NotApplicable),
}

impl FeatureResult {
    pub fn is_applicable(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn value(&self) -> Option<&FeatureValue> {
        match self {
            Self::Value(v) => Some(v),
            Self::NotApplicable(_) => None,
        }
    }

    pub fn scalar(&self) -> Option<f64> {
        self.value().and_then(FeatureValue::as_scalar)
    }

    pub fn pair(&self) -> Option<(f64, f64)> {
        self.value().and_then(FeatureValue::as_pair)
    }
}

impl From<Option<FeatureValue>> for FeatureResult {
    fn from(value: Option<FeatureValue>) -> Self {
        match value {
            Some(v) => Self::Value(v),
            None => Self::NotApplicable(NotApplicable::InsufficientData),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let r = FeatureResult::Value(FeatureValue::pair(0.5, 0.0));
        assert_eq!(r.pair(), Some((0.5, 0.0)));
        assert_eq!(r.scalar(), None);
        assert!(r.is_applicable());

        let s = FeatureResult::Value(FeatureValue::Scalar(2.0));
        assert_eq!(s.scalar(), Some(2.0));
        assert_eq!(s.pair(), None);
    }

    #[test]
    fn test_none_is_insufficient_data() {
        let r = FeatureResult::from(None);
        assert_eq!(r, FeatureResult::NotApplicable(NotApplicable::InsufficientData));
        assert!(!r.is_applicable());
        assert!(r.value().is_none());
    }

    #[test]
    fn test_serialize_shape() {
        let r = FeatureResult::Value(FeatureValue::pair(0.5, 0.0));
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            serde_json::json!({"value": [0.5, 0.0]})
        );
        let na = FeatureResult::NotApplicable(NotApplicable::MissingMark("axon".into()));
        assert_eq!(
            serde_json::to_value(&na).unwrap(),
            serde_json::json!({"not_applicable": {"reason": "missing_mark", "detail": "axon"}})
        );
    }
}
