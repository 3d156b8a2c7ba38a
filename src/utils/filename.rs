//! Filename helpers.

use sha2::{Digest, Sha256};

/// Longest file name `sanitize_filename` produces.
const MAX_NAME_CHARS: usize = 100;
/// Hex digits of the source hash appended to altered ids.
const ID_HASH_CHARS: usize = 8;

/// Replace characters that are unsafe in file names and limit the length.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('_');
    if trimmed.is_empty() {
        "document".to_string()
    } else {
        trimmed.chars().take(MAX_NAME_CHARS).collect()
    }
}

/// Store id for a source identifier, with spaces as underscores.
///
/// The id doubles as a file name. When sanitising has to replace characters
/// or truncate, a short hash of the source is appended so distinct sources
/// keep distinct ids.
pub fn document_id(source: &str) -> String {
    let source = source.trim();
    let source = source
        .strip_suffix(".pdf")
        .or_else(|| source.strip_suffix(".PDF"))
        .unwrap_or(source);
    let joined = source.split_whitespace().collect::<Vec<_>>().join("_");
    let safe = sanitize_filename(&joined);
    if safe == joined {
        return safe;
    }

    let digest = hex::encode(Sha256::digest(source.as_bytes()));
    let base: String = safe.chars().take(MAX_NAME_CHARS - ID_HASH_CHARS - 1).collect();
    format!("{}-{}", base, &digest[..ID_HASH_CHARS])
}
