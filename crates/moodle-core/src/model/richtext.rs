//! Rich-text summary fields.

use serde::{Deserialize, Serialize};

/// HTML-formatted text as the site stores it.
///
/// No markup is interpreted; the raw HTML is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(String);

impl RichText {
    /// Wrap an HTML fragment.
    pub fn from_html(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    /// Returns the raw HTML.
    pub fn html(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}
