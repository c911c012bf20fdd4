//! Size measurement for Flex payloads.
//!
//! Byte sizes are those of compact JSON with slashes and non-ASCII characters
//! left unescaped, which is what `serde_json` writes by default. Text lengths
//! are counted in Unicode code points.

use crate::schema::ELLIPSIS;
use serde::Serialize;
use std::io;

/// Measures serialized payloads and text values.
#[derive(Debug, Default, Clone, Copy)]
pub struct SizeMeter;

impl SizeMeter {
    pub fn new() -> Self {
        Self
    }

    /// Byte length of the compact JSON serialization of `value`.
    pub fn json_size<T: Serialize + ?Sized>(&self, value: &T) -> usize {
        let mut counter = ByteCounter::default();
        match serde_json::to_writer(&mut counter, value) {
            Ok(()) => counter.0,
            // Values built from `serde_json::Value` cannot fail to serialize.
            Err(_) => usize::MAX,
        }
    }

    /// Length of `text` in code points.
    pub fn text_size(&self, text: &str) -> usize {
        text.chars().count()
    }

    /// Length of `text` in UTF-8 bytes.
    pub fn byte_size(&self, text: &str) -> usize {
        text.len()
    }
}

#[derive(Default)]
struct ByteCounter(usize);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Truncate to at most `max` code points. When truncation happens the result
/// is `max - 3` code points followed by `...`, so its length is exactly `max`.
pub fn truncate_chars(text: &str, max: usize) -> (String, bool) {
    if text.char_indices().nth(max).is_none() {
        return (text.to_string(), false);
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let end = text
        .char_indices()
        .nth(keep)
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    (format!("{}{ELLIPSIS}", &text[..end]), true)
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
