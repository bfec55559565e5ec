//! Error types for the layout engine

use std::fmt;

use thiserror::Error;

/// Errors that can occur while building or validating an element graph
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Anchor or stretch rule referencing an element that does not exist
    #[error("element '{element}' references undefined element '{name}'")]
    UndefinedIdentifier {
        element: String,
        name: String,
        suggestions: Vec<String>,
    },

    /// Two elements share an id
    #[error("duplicate element id '{id}'")]
    DuplicateElement { id: String },

    /// Invalid layout configuration
    #[error("invalid layout for element '{element}': {reason}")]
    InvalidLayout { element: String, reason: String },
}

impl LayoutError {
    /// Create an undefined identifier error with suggestions
    pub fn undefined(
        element: impl Into<String>,
        name: impl Into<String>,
        suggestions: Vec<String>,
    ) -> Self {
        Self::UndefinedIdentifier {
            element: element.into(),
            name: name.into(),
            suggestions,
        }
    }

    pub fn duplicate(id: impl Into<String>) -> Self {
        Self::DuplicateElement { id: id.into() }
    }

    /// Create an invalid layout error
    pub fn invalid_layout(element: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLayout {
            element: element.into(),
            reason: reason.into(),
        }
    }

    /// Get suggestions if available
    pub fn suggestions(&self) -> Option<&[String]> {
        match self {
            Self::UndefinedIdentifier { suggestions, .. } => Some(suggestions),
            _ => None,
        }
    }
}

/// Why an element was left unresolved after the last layout pass
#[derive(Debug, Clone, PartialEq)]
pub enum UnresolvedReason {
    /// A referenced element does not exist in the graph
    MissingTarget {
        target: String,
        suggestions: Vec<String>,
    },
    /// The element sits on a dependency cycle
    Cycle { cycle: Vec<String> },
    /// The element waits on other elements that never resolved
    Blocked { waiting_on: Vec<String> },
    /// Dependencies look satisfiable but the pass limit was reached first
    PassLimit,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::MissingTarget {
                target,
                suggestions,
            } => {
                write!(f, "target '{}' does not exist", target)?;
                if !suggestions.is_empty() {
                    write!(f, " (did you mean {}?)", suggestions.join(", "))?;
                }
                Ok(())
            }
            UnresolvedReason::Cycle { cycle } => {
                write!(f, "circular dependency: {}", cycle.join(" -> "))
            }
            UnresolvedReason::Blocked { waiting_on } => {
                write!(f, "waiting on unresolved {}", waiting_on.join(", "))
            }
            UnresolvedReason::PassLimit => f.write_str("pass limit reached"),
        }
    }
}

/// An element that could not be placed, with the diagnosed cause
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedElement {
    pub id: String,
    pub reason: UnresolvedReason,
}

impl fmt::Display for UnresolvedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_identifier_display() {
        let err = LayoutError::undefined("label", "buton", vec!["button".to_string()]);
        insta::assert_snapshot!(err.to_string(), @"element 'label' references undefined element 'buton'");
        assert_eq!(err.suggestions(), Some(&["button".to_string()][..]));
    }

    #[test]
    fn test_unresolved_reason_display() {
        let missing = UnresolvedElement {
            id: "title".to_string(),
            reason: UnresolvedReason::MissingTarget {
                target: "heder".to_string(),
                suggestions: vec!["header".to_string()],
            },
        };
        insta::assert_snapshot!(missing.to_string(), @"title: target 'heder' does not exist (did you mean header?)");

        let blocked = UnresolvedReason::Blocked {
            waiting_on: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(blocked.to_string(), "waiting on unresolved a, b");
    }
}
