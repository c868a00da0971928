//! Field path expressions for schema-typed messages.
//!
//! A path names a field inside a message by chaining field names with `.` and
//! selects one element of a repeated field with `[index]`:
//!
//! ```text
//! address.lines[2]      field "address", field "lines", element 2
//! contacts[0].email     field "contacts", element 0, field "email"
//! ""                    the whole message
//! ```
//!
//! # Example
//!
//! ```
//! use protopath_path::{Path, PathSyntaxError};
//!
//! let path: Path = "contacts[0].email".parse().unwrap();
//! assert_eq!(path.len(), 3);
//! assert_eq!(path.to_string(), "contacts[0].email");
//!
//! assert!(matches!(
//!     Path::parse("contacts[x]"),
//!     Err(PathSyntaxError::InvalidIndex { .. })
//! ));
//! ```

use thiserror::Error;

mod parser;
pub mod types;
pub use types::{Path, Segment};

pub mod validate;
pub use validate::{validate_segments, MAX_PATH_LENGTH};

/// Malformed path text or segment list.
///
/// `pos` is a byte offset into the text for [`Path::parse`] and a segment
/// position for [`Path::from_segments`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathSyntaxError {
    #[error("empty path segment at {pos}")]
    EmptySegment { pos: usize },
    #[error("invalid array index {text:?} at {pos}")]
    InvalidIndex { pos: usize, text: String },
    #[error("unclosed '[' at {pos}")]
    UnclosedBracket { pos: usize },
    #[error("unexpected character {ch:?} at {pos}")]
    UnexpectedChar { pos: usize, ch: char },
    #[error("array index at {pos} does not follow a field name")]
    MisplacedIndex { pos: usize },
    #[error("path has {len} segments, limit is {MAX_PATH_LENGTH}")]
    PathTooLong { len: usize },
    #[error("root path has no parent")]
    NoParent,
}

/// Parse a path expression. Shorthand for [`Path::parse`].
pub fn parse_path(text: &str) -> Result<Path, PathSyntaxError> {
    Path::parse(text)
}

/// Format a path back to its canonical text.
pub fn format_path(path: &Path) -> String {
    path.to_string()
}
