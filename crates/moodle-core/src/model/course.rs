//! Course records.

use serde::Deserialize;

use super::RichText;

/// A course the user is enrolled in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawCourse")]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub description: RichText,
    /// Link to the course page on the site.
    pub url: String,
}

#[derive(Deserialize)]
struct RawCourse {
    id: i64,
    fullname: String,
    #[serde(default)]
    viewurl: String,
    #[serde(default)]
    coursecategory: String,
    #[serde(default)]
    summary: String,
}

impl From<RawCourse> for Course {
    fn from(raw: RawCourse) -> Self {
        Self {
            id: raw.id,
            title: raw.fullname,
            category: raw.coursecategory,
            description: RichText::from_html(raw.summary),
            url: raw.viewurl,
        }
    }
}
