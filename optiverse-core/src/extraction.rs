//! Parses a free-form oracle reply into a single candidate program.
//!
//! # Grammar
//!
//! ```text
//! reply       := description? fence info? NEWLINE body fence rest?
//! fence       := "```" "`"*
//! ```
//!
//! The first run of three or more backticks in the reply opens the block and the rest of its line
//! is an optional info string (e.g. a language tag) which is dropped. The block is closed by the
//! next backtick run which is at least as long as the opening one, so a body with ```` ``` ```` inside
//! is kept whole when it is fenced with four backticks. Only the first block is used, anything
//! after it is ignored. The text before the opening fence becomes the candidate description.

#[cfg(test)]
#[path = "../tests/unit/extraction_test.rs"]
mod extraction_test;

use std::fmt::{Display, Formatter};

const MIN_FENCE_LEN: usize = 3;

/// A candidate extracted from oracle reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extracted {
    /// Candidate program text.
    pub source: String,
    /// Explanation written before the code block, if any.
    pub description: Option<String>,
}

/// An error which happens when oracle reply does not follow the delimiter convention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtractionError {
    /// Reply has no fenced block at all.
    NoCodeBlock,
    /// Reply opens a fenced block, but never closes it.
    Unterminated,
    /// Fenced block has no content.
    EmptyBlock,
}

impl Display for ExtractionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionError::NoCodeBlock => write!(f, "no fenced code block found in oracle reply"),
            ExtractionError::Unterminated => write!(f, "fenced code block in oracle reply is not closed"),
            ExtractionError::EmptyBlock => write!(f, "fenced code block in oracle reply is empty"),
        }
    }
}

impl std::error::Error for ExtractionError {}

/// Extracts candidate source from the first fenced code block of oracle reply.
pub fn extract(response: &str) -> Result<Extracted, ExtractionError> {
    let (open, fence_len) = find_fence(response, MIN_FENCE_LEN).ok_or(ExtractionError::NoCodeBlock)?;
    let after_open = &response[open + fence_len..];

    let (close, _) = find_fence(after_open, fence_len).ok_or(ExtractionError::Unterminated)?;
    let block = &after_open[..close];

    // NOTE the first line of a block is an info string, unless the block is a single line
    let body = match block.find('\n') {
        Some(newline) => &block[newline + 1..],
        None => block,
    };

    let source = body.trim();
    if source.is_empty() {
        return Err(ExtractionError::EmptyBlock);
    }

    let description = Some(response[..open].trim()).filter(|text| !text.is_empty()).map(str::to_string);

    Ok(Extracted { source: source.to_string(), description })
}

/// Returns a fence which is longer than any backtick run inside the source, so the source can be
/// wrapped into a block which [`extract`] reads back whole.
pub fn fence_for(source: &str) -> String {
    let longest = source.split(|ch: char| ch != '`').map(str::len).max().unwrap_or(0);

    "`".repeat((longest + 1).max(MIN_FENCE_LEN))
}

/// Finds the first run of at least `min_len` backticks and returns its position and length.
fn find_fence(text: &str, min_len: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut idx = 0;

    while idx < bytes.len() {
        let len = bytes[idx..].iter().take_while(|byte| **byte == b'`').count();

        if len >= min_len {
            return Some((idx, len));
        }

        idx += len.max(1);
    }

    None
}
