//! Structural validation of path segments.

use crate::parser::is_delimiter;
use crate::types::Segment;
use crate::PathSyntaxError;

/// Maximum allowed path depth.
pub const MAX_PATH_LENGTH: usize = 256;

/// Check segment order and field names.
///
/// Positions in the returned errors are segment positions, not byte offsets.
///
/// # Errors
///
/// - more than [`MAX_PATH_LENGTH`] segments
/// - an index that does not directly follow a field name
/// - an empty field name, or one containing `.`, `[` or `]`
pub fn validate_segments(segments: &[Segment]) -> Result<(), PathSyntaxError> {
    if segments.len() > MAX_PATH_LENGTH {
        return Err(PathSyntaxError::PathTooLong {
            len: segments.len(),
        });
    }

    let mut prev_is_field = false;
    for (pos, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Field(name) => {
                if name.is_empty() {
                    return Err(PathSyntaxError::EmptySegment { pos });
                }
                if let Some(ch) = name.chars().find(|c| is_delimiter(*c)) {
                    return Err(PathSyntaxError::UnexpectedChar { pos, ch });
                }
                prev_is_field = true;
            }
            Segment::Index(_) => {
                if !prev_is_field {
                    return Err(PathSyntaxError::MisplacedIndex { pos });
                }
                prev_is_field = false;
            }
        }
    }
    Ok(())
}
