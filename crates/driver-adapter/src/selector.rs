//! Selector value type supplied by test authors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque expression identifying where to look for UI element(s).
///
/// Selectors are immutable values owned by test code; the engine passes them
/// through to the driver untouched and never rewrites them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector expression
    Css(String),

    /// XPath expression
    XPath(String),

    /// Visible-text match (exact or substring)
    Text { content: String, exact: bool },
}

impl Selector {
    pub fn css(expr: impl Into<String>) -> Self {
        Selector::Css(expr.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Selector::XPath(expr.into())
    }

    /// Substring text match.
    pub fn text(content: impl Into<String>) -> Self {
        Selector::Text {
            content: content.into(),
            exact: false,
        }
    }

    /// Exact (trimmed) text match.
    pub fn exact_text(content: impl Into<String>) -> Self {
        Selector::Text {
            content: content.into(),
            exact: true,
        }
    }

    /// Get strategy name as string
    pub fn kind(&self) -> &'static str {
        match self {
            Selector::Css(_) => "css",
            Selector::XPath(_) => "xpath",
            Selector::Text { .. } => "text",
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(expr) => write!(f, "css:{expr}"),
            Selector::XPath(expr) => write!(f, "xpath:{expr}"),
            Selector::Text { content, exact } => {
                if *exact {
                    write!(f, "text={content}")
                } else {
                    write!(f, "text~{content}")
                }
            }
        }
    }
}

impl From<&str> for Selector {
    fn from(expr: &str) -> Self {
        Selector::Css(expr.to_string())
    }
}

impl From<String> for Selector {
    fn from(expr: String) -> Self {
        Selector::Css(expr)
    }
}
