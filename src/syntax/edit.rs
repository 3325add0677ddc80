//! Byte-span edits applied to a document's source text.

use crate::error::{ModifierError, Result};
use std::ops::Range;

/// A replacement of a byte range in the source with new text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Byte range to replace.
    pub range: Range<usize>,
    /// New text.
    pub new_text: String,
}

impl TextEdit {
    /// Create a new replacement edit.
    pub fn replace(range: Range<usize>, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }

    /// Create an insertion edit.
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            range: at..at,
            new_text: text.into(),
        }
    }

    /// Create a deletion edit.
    pub fn delete(range: Range<usize>) -> Self {
        Self {
            range,
            new_text: String::new(),
        }
    }
}

/// Applies edits to `source`, last offset first.
///
/// Insertions at the same offset keep their relative order. Overlapping
/// replacements are rejected.
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> Result<String> {
    let mut ordered: Vec<(usize, &TextEdit)> = edits.iter().enumerate().collect();
    ordered.sort_by(|(ia, a), (ib, b)| {
        b.range
            .start
            .cmp(&a.range.start)
            .then_with(|| b.range.end.cmp(&a.range.end))
            .then_with(|| ib.cmp(ia))
    });

    let mut result = source.to_string();
    let mut floor = usize::MAX;
    for (_, edit) in ordered {
        let Range { start, end } = edit.range.clone();
        if start > end || end > source.len() {
            return Err(ModifierError::TransformFailed {
                message: format!("edit range {start}..{end} is outside the source"),
            });
        }
        if end > floor {
            return Err(ModifierError::TransformFailed {
                message: format!("edit range {start}..{end} overlaps another edit"),
            });
        }
        if !source.is_char_boundary(start) || !source.is_char_boundary(end) {
            return Err(ModifierError::TransformFailed {
                message: format!("edit range {start}..{end} splits a character"),
            });
        }
        result.replace_range(start..end, &edit.new_text);
        floor = start;
    }
    Ok(result)
}
