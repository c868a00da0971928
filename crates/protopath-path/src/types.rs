//! Type definitions for field paths.

use std::fmt;
use std::str::FromStr;

use crate::parser::PathParser;
use crate::validate::validate_segments;
use crate::PathSyntaxError;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Selects a field of the current message by name.
    Field(String),
    /// Selects one element of the repeated field named by the previous step.
    Index(usize),
}

impl Segment {
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Segment::Field(name) => Some(name),
            Segment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Field(_) => None,
            Segment::Index(idx) => Some(*idx),
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Segment::Index(_))
    }
}

/// A parsed field path.
///
/// The empty path selects the whole message. Paths are immutable; every
/// constructor checks that index segments only follow field segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The empty (root) path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path expression such as `a.b[3].c`.
    ///
    /// # Example
    ///
    /// ```
    /// use protopath_path::{Path, Segment};
    ///
    /// let path = Path::parse("a.b[3].c").unwrap();
    /// assert_eq!(
    ///     path.segments(),
    ///     &[
    ///         Segment::Field("a".into()),
    ///         Segment::Field("b".into()),
    ///         Segment::Index(3),
    ///         Segment::Field("c".into()),
    ///     ]
    /// );
    /// assert!(Path::parse("").unwrap().is_empty());
    /// ```
    pub fn parse(text: &str) -> Result<Self, PathSyntaxError> {
        let segments = PathParser::parse(text)?;
        validate_segments(&segments)?;
        Ok(Self { segments })
    }

    /// Build a path from already split segments.
    pub fn from_segments(segments: Vec<Segment>) -> Result<Self, PathSyntaxError> {
        validate_segments(&segments)?;
        Ok(Self { segments })
    }

    /// `true` for the root selector.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// The path without its last segment.
    ///
    /// # Errors
    ///
    /// Returns [`PathSyntaxError::NoParent`] for the root path.
    pub fn parent(&self) -> Result<Path, PathSyntaxError> {
        match self.segments.split_last() {
            Some((_, rest)) => Ok(Path {
                segments: rest.to_vec(),
            }),
            None => Err(PathSyntaxError::NoParent),
        }
    }

    /// `true` if every segment of `prefix` matches the start of this path.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                Segment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
