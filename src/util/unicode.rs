use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Collapse tabs and line breaks into single spaces so a server-supplied
/// title renders on one line.
pub fn single_line(s: &str) -> String {
    s.split(['\t', '\n', '\r'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate a string to fit within `max_cells` terminal cells, appending `…` if truncated.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells == 1 {
        return "\u{2026}".to_string();
    }
    let budget = max_cells - 1;
    let mut width = 0;
    let mut result = String::new();
    for grapheme in s.graphemes(true) {
        let gw = display_width(grapheme);
        if width + gw > budget {
            break;
        }
        width += gw;
        result.push_str(grapheme);
    }
    result.push('\u{2026}');
    result
}

/// Right-pad with spaces to `width` cells. Wider strings are returned as is.
pub fn pad_to_width(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(display_width(s));
    format!("{}{}", s, " ".repeat(pad))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_width_wide_chars() {
        assert_eq!(display_width("ship it"), 7);
        assert_eq!(display_width("修复登录"), 8);
        assert_eq!(display_width("🚀 launch"), 9);
        assert_eq!(display_width("re\u{0301}sume\u{0301}"), 6);
    }

    #[test]
    fn single_line_collapses_breaks() {
        assert_eq!(single_line("Fix\r\nlogin\tflow"), "Fix login flow");
        assert_eq!(single_line("plain"), "plain");
    }

    #[test]
    fn truncate_fits() {
        assert_eq!(truncate_to_width("Review PR", 9), "Review PR");
        assert_eq!(truncate_to_width("Review PR", 20), "Review PR");
    }

    #[test]
    fn truncate_ascii() {
        assert_eq!(truncate_to_width("Update onboarding docs", 10), "Update on\u{2026}");
    }

    #[test]
    fn truncate_never_splits_wide_chars() {
        let result = truncate_to_width("修复登录问题", 6);
        assert_eq!(result, "修复\u{2026}");
        assert!(display_width(&result) <= 6);
    }

    #[test]
    fn truncate_keeps_clusters_whole() {
        let result = truncate_to_width("cafe\u{0301} menu", 5);
        assert_eq!(result, "cafe\u{0301}\u{2026}");
    }

    #[test]
    fn truncate_tiny_budgets() {
        assert_eq!(truncate_to_width("anything", 0), "");
        assert_eq!(truncate_to_width("anything", 1), "\u{2026}");
    }

    #[test]
    fn pad_to_width_counts_cells() {
        assert_eq!(pad_to_width("t-1", 5), "t-1  ");
        assert_eq!(pad_to_width("任务", 5), "任务 ");
        assert_eq!(pad_to_width("too-long", 3), "too-long");
    }
}
