//! Typed records decoded from web-service payloads.
//!
//! These are consumers of the envelope: the client hands each successful
//! payload to `serde_json`, which goes through the raw wire shapes here.

mod block;
mod course;
mod richtext;
mod section;

pub use block::{Block, BlockKind, FileInfo};
pub use course::Course;
pub use richtext::RichText;
pub use section::Section;
