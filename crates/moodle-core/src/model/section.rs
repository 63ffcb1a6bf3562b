//! Course sections.

use serde::Deserialize;

use super::{Block, RichText};

/// A section (week or topic) of a course with its activities.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawSection")]
pub struct Section {
    pub id: i64,
    pub title: String,
    pub description: RichText,
    pub blocks: Vec<Block>,
}

#[derive(Deserialize)]
struct RawSection {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    modules: Vec<Block>,
}

impl From<RawSection> for Section {
    fn from(raw: RawSection) -> Self {
        Self {
            id: raw.id,
            title: raw.name,
            description: RichText::from_html(raw.summary),
            blocks: raw.modules,
        }
    }
}
