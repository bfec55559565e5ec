//! Error types for the animation subsystem

use thiserror::Error;

/// Caller errors when starting, reversing or stopping an animation
#[derive(Debug, Error, PartialEq)]
pub enum AnimationError {
    #[error("unknown element '{id}'")]
    UnknownElement { id: String, suggestions: Vec<String> },

    /// The element exists but layout has not placed it
    #[error("element '{id}' has no calculated layout")]
    UnresolvedElement { id: String },
}

impl AnimationError {
    pub fn unknown(id: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self::UnknownElement {
            id: id.into(),
            suggestions,
        }
    }

    pub fn unresolved(id: impl Into<String>) -> Self {
        Self::UnresolvedElement { id: id.into() }
    }

    pub fn suggestions(&self) -> Option<&[String]> {
        match self {
            Self::UnknownElement { suggestions, .. } => Some(suggestions),
            Self::UnresolvedElement { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = AnimationError::unknown("nav.buton", vec!["nav.button".to_string()]);
        insta::assert_snapshot!(err.to_string(), @"unknown element 'nav.buton'");
        assert_eq!(err.suggestions().map(<[String]>::len), Some(1));
        assert_eq!(
            AnimationError::unresolved("x").to_string(),
            "element 'x' has no calculated layout"
        );
    }
}
