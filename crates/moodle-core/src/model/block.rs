//! Course activities and resources.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One activity or resource inside a section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawModule")]
pub struct Block {
    pub id: i64,
    pub title: String,
    /// Link to the activity page on the site.
    pub url: String,
    pub kind: BlockKind,
}

/// Kind-specific data of a [`Block`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// External link.
    Link { url: String },
    /// Single downloadable file.
    File(FileInfo),
    Folder,
    Assignment {
        opens_at: Option<DateTime<Utc>>,
        due_at: Option<DateTime<Utc>>,
        cutoff_at: Option<DateTime<Utc>>,
    },
    Quiz {
        opens_at: Option<DateTime<Utc>>,
        closes_at: Option<DateTime<Utc>>,
    },
    /// Any module type not modelled above, with its module name.
    Unknown { module: String },
}

/// Metadata of a file resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub file_name: String,
    pub size_bytes: u64,
    pub download_url: String,
    pub mime_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawModule {
    id: i64,
    #[serde(default)]
    url: String,
    #[serde(default)]
    name: String,
    modname: String,
    #[serde(default)]
    dates: Vec<RawDate>,
    #[serde(default)]
    contents: Vec<RawContent>,
}

#[derive(Deserialize)]
struct RawDate {
    #[serde(default)]
    dataid: String,
    timestamp: i64,
}

#[derive(Deserialize)]
struct RawContent {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    filesize: u64,
    #[serde(default)]
    fileurl: String,
    #[serde(default)]
    timecreated: Option<i64>,
    #[serde(default)]
    timemodified: Option<i64>,
    #[serde(default)]
    mimetype: Option<String>,
}

impl From<RawModule> for Block {
    fn from(raw: RawModule) -> Self {
        let kind = block_kind(&raw);
        Self {
            id: raw.id,
            title: raw.name,
            url: raw.url,
            kind,
        }
    }
}

fn block_kind(raw: &RawModule) -> BlockKind {
    let date = |dataid: &str| {
        raw.dates
            .iter()
            .find(|d| d.dataid == dataid)
            .and_then(|d| timestamp(d.timestamp))
    };

    match (raw.modname.as_str(), raw.contents.first()) {
        ("url", Some(content)) => BlockKind::Link {
            url: content.fileurl.clone(),
        },
        ("resource", Some(content)) => BlockKind::File(FileInfo {
            file_name: content.filename.clone(),
            size_bytes: content.filesize,
            download_url: content.fileurl.clone(),
            mime_type: content.mimetype.clone(),
            created_at: content.timecreated.and_then(timestamp),
            modified_at: content.timemodified.and_then(timestamp),
        }),
        ("folder", _) => BlockKind::Folder,
        ("assign", _) => BlockKind::Assignment {
            opens_at: date("allowsubmissionsfromdate"),
            due_at: date("duedate"),
            cutoff_at: date("cutoffdate"),
        },
        ("quiz", _) => BlockKind::Quiz {
            opens_at: date("timeopen"),
            closes_at: date("timeclose"),
        },
        (module, _) => BlockKind::Unknown {
            module: module.to_string(),
        },
    }
}

// Zero means "not set" on the wire.
fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Block {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn url_module_is_link() {
        let block = decode(
            r#"{"id": 1, "name": "Slides", "modname": "url",
                "url": "https://moodle.example/mod/url/view.php?id=1",
                "contents": [{"type": "url", "fileurl": "https://example.com/slides"}]}"#,
        );
        assert_eq!(
            block.kind,
            BlockKind::Link {
                url: "https://example.com/slides".to_string()
            }
        );
        assert_eq!(block.title, "Slides");
    }

    #[test]
    fn resource_module_is_file() {
        let block = decode(
            r#"{"id": 2, "name": "Lecture 1", "modname": "resource",
                "contents": [{"type": "file", "filename": "lecture1.pdf", "filesize": 1024,
                              "fileurl": "https://moodle.example/pluginfile.php/1/lecture1.pdf",
                              "timecreated": 1700000000, "timemodified": 1700003600,
                              "mimetype": "application/pdf"}]}"#,
        );
        let BlockKind::File(file) = block.kind else {
            panic!("expected file block");
        };
        assert_eq!(file.file_name, "lecture1.pdf");
        assert_eq!(file.size_bytes, 1024);
        assert_eq!(file.mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(file.created_at.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(file.modified_at.unwrap().timestamp(), 1_700_003_600);
    }

    #[test]
    fn resource_without_contents_is_unknown() {
        let block = decode(r#"{"id": 3, "name": "Hidden", "modname": "resource"}"#);
        assert_eq!(
            block.kind,
            BlockKind::Unknown {
                module: "resource".to_string()
            }
        );
    }

    #[test]
    fn assignment_reads_dates() {
        let block = decode(
            r#"{"id": 4, "name": "Lab 1", "modname": "assign", "dates": [
                {"label": "Opened:", "timestamp": 1700000000, "dataid": "allowsubmissionsfromdate"},
                {"label": "Due:", "timestamp": 1700600000, "dataid": "duedate"}]}"#,
        );
        let BlockKind::Assignment {
            opens_at,
            due_at,
            cutoff_at,
        } = block.kind
        else {
            panic!("expected assignment block");
        };
        assert_eq!(opens_at.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(due_at.unwrap().timestamp(), 1_700_600_000);
        assert!(cutoff_at.is_none());
    }

    #[test]
    fn quiz_and_folder_and_other() {
        let quiz = decode(
            r#"{"id": 5, "name": "Quiz 1", "modname": "quiz", "dates": [
                {"timestamp": 1700000000, "dataid": "timeopen"},
                {"timestamp": 0, "dataid": "timeclose"}]}"#,
        );
        assert_eq!(
            quiz.kind,
            BlockKind::Quiz {
                opens_at: DateTime::from_timestamp(1_700_000_000, 0),
                closes_at: None,
            }
        );

        let folder = decode(r#"{"id": 6, "name": "Labs", "modname": "folder"}"#);
        assert_eq!(folder.kind, BlockKind::Folder);

        let forum = decode(r#"{"id": 7, "name": "News", "modname": "forum"}"#);
        assert_eq!(
            forum.kind,
            BlockKind::Unknown {
                module: "forum".to_string()
            }
        );
    }
}
