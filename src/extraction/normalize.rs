//! Case and diacritic folding.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Strip diacritics and lower-case: `"São Vicente"` becomes `"sao vicente"`.
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Text folded character by character, remembering which original
/// character each folded character came from.
///
/// Searching the folded text and mapping hits back through [`origin`]
/// gives offsets into the original text even when folding changes the
/// number of characters.
///
/// [`origin`]: FoldedText::origin
#[derive(Debug, Clone)]
pub struct FoldedText {
    text: String,
    origins: Vec<usize>,
    original_len: usize,
}

impl FoldedText {
    /// Lower-case `text`, also stripping diacritics when `strip_diacritics`.
    pub fn new(text: &str, strip_diacritics: bool) -> Self {
        let mut folded = String::with_capacity(text.len());
        let mut origins = Vec::with_capacity(text.len());
        let mut original_len = 0;

        for (index, c) in text.chars().enumerate() {
            original_len = index + 1;
            if strip_diacritics {
                for d in std::iter::once(c).nfd().filter(|d| !is_combining_mark(*d)) {
                    for lower in d.to_lowercase() {
                        folded.push(lower);
                        origins.push(index);
                    }
                }
            } else {
                for lower in c.to_lowercase() {
                    folded.push(lower);
                    origins.push(index);
                }
            }
        }

        Self {
            text: folded,
            origins,
            original_len,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Original character offset of the folded character at `folded_index`.
    /// Indices past the end map to the end of the original text.
    pub fn origin(&self, folded_index: usize) -> usize {
        self.origins
            .get(folded_index)
            .copied()
            .unwrap_or(self.original_len)
    }

    /// Original `[start, end)` character span of a folded `[start, end)` span.
    pub fn origin_span(&self, start: usize, end: usize) -> (usize, usize) {
        let origin_start = self.origin(start);
        let origin_end = if end == 0 || end <= start {
            origin_start
        } else {
            self.origin(end - 1) + 1
        };
        (origin_start, origin_end.min(self.original_len))
    }
}
