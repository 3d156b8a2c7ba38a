//! Normalization of raw extracted text.

/// Blank lines allowed in a row.
const MAX_BLANK_RUN: usize = 2;

/// Clean raw PDF text.
///
/// Line endings become `\n`, control characters other than tab and newline
/// are dropped, whitespace inside each line collapses to single spaces, and
/// runs of blank lines are cut to two.
pub fn clean_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let printable: String = unified
        .chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect();

    let mut lines: Vec<String> = Vec::new();
    let mut blank_run = 0;

    for line in printable.split('\n') {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            blank_run += 1;
            if blank_run <= MAX_BLANK_RUN {
                lines.push(collapsed);
            }
        } else {
            blank_run = 0;
            lines.push(collapsed);
        }
    }

    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_endings_normalized() {
        assert_eq!(clean_text("um\r\ndois\rtres"), "um\ndois\ntres");
    }

    #[test]
    fn test_control_characters_stripped() {
        assert_eq!(clean_text("ca\u{0}rta\u{7} de\u{1b} doação"), "carta de doação");
        assert_eq!(clean_text("a\tb"), "a b");
    }

    #[test]
    fn test_blank_line_runs_capped_at_two() {
        assert_eq!(clean_text("um\n\n\n\n\n\ndois"), "um\n\n\ndois");
        assert_eq!(clean_text("um\n\ndois"), "um\n\ndois");
    }

    #[test]
    fn test_intra_line_whitespace_collapsed() {
        assert_eq!(
            clean_text("   Carta    de   doação  \n  século   XVI "),
            "Carta de doação\nséculo XVI"
        );
    }

    #[test]
    fn test_whitespace_only_lines_count_as_blank() {
        assert_eq!(clean_text("a\n   \n \t \n  \n\nb"), "a\n\n\nb");
    }
}
