//! Character-offset bookkeeping and context windows.

/// Marker added where a context window was clipped.
pub const ELLIPSIS: &str = "...";

/// Text with a character-to-byte index, so entity positions can be reported
/// as character offsets while slicing stays on UTF-8 boundaries.
#[derive(Debug)]
pub struct SourceText<'a> {
    text: &'a str,
    /// Byte offset of each character, followed by `text.len()`.
    starts: Vec<usize>,
}

impl<'a> SourceText<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut starts: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        starts.push(text.len());
        Self { text, starts }
    }

    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.starts.len() - 1
    }

    /// Character offset of a byte offset on a character boundary.
    pub fn char_offset(&self, byte: usize) -> usize {
        self.starts.partition_point(|&start| start < byte)
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.starts[char_index.min(self.char_len())]
    }

    /// `text[start - window .. end + window]` in characters, trimmed, with an
    /// ellipsis on each side that was clipped.
    pub fn context(&self, start: usize, end: usize, window: usize) -> String {
        let len = self.char_len();
        let from = start.min(len).saturating_sub(window);
        let to = end.max(start).saturating_add(window).min(len);

        let slice = &self.text[self.byte_offset(from)..self.byte_offset(to)];
        let mut context = String::with_capacity(slice.len() + 2 * ELLIPSIS.len());
        if from > 0 {
            context.push_str(ELLIPSIS);
        }
        context.push_str(slice.trim());
        if to < len {
            context.push_str(ELLIPSIS);
        }
        context
    }
}
