//! Console output icons.
//!
//! Standardized glyphs so every command styles its output the same way.

use console::{style, StyledObject};

/// Success checkmark icon (green ✓).
pub fn success() -> StyledObject<&'static str> {
    style("✓").green()
}

/// Info/progress arrow icon (cyan →).
pub fn info() -> StyledObject<&'static str> {
    style("→").cyan()
}

/// Warning icon (yellow !).
pub fn warn() -> StyledObject<&'static str> {
    style("!").yellow()
}

/// Error icon (red ✗).
pub fn error() -> StyledObject<&'static str> {
    style("✗").red()
}

/// Skipped item (yellow ⊘).
pub fn skipped() -> StyledObject<&'static str> {
    style("⊘").yellow()
}

/// Dim arrow for secondary info.
pub fn dim_arrow() -> StyledObject<&'static str> {
    style("→").dim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icons_render_glyphs() {
        console::set_colors_enabled(false);
        assert_eq!(success().to_string(), "✓");
        assert_eq!(info().to_string(), "→");
        assert_eq!(warn().to_string(), "!");
        assert_eq!(error().to_string(), "✗");
        assert_eq!(skipped().to_string(), "⊘");
        assert_eq!(dim_arrow().to_string(), "→");
    }
}
