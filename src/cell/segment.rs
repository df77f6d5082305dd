// src/cell/segment.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

/// A category tag such as `[必修]` opens a new course block.
pub static BLOCK_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(考查|必修|选修|实践|理论|考试)\]").expect("block marker regex"));

/// Turn the HTML line-break escapes some exporters leave behind into newlines.
pub fn clean_cell_text(raw: &str) -> String {
    raw.replace("&#13;", "\n").replace("&#10;", "\n")
}

/// Split one cell into course blocks.
///
/// A line carrying a category tag starts a block and the following lines are
/// space-joined onto it. Text before the first tag is dropped. A cell with no
/// tag at all becomes a single block of its trimmed lines, newline-joined.
pub fn segment_cell(raw: &str) -> Vec<String> {
    let cleaned = clean_cell_text(raw);
    let lines: Vec<&str> = cleaned
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for &line in &lines {
        if BLOCK_MARKER.is_match(line) {
            if !current.is_empty() {
                blocks.push(current.join(" "));
            }
            current = vec![line];
        } else if !current.is_empty() {
            current.push(line);
        } else {
            trace!(line, "dropping text before first course marker");
        }
    }
    if !current.is_empty() {
        blocks.push(current.join(" "));
    }

    if blocks.is_empty() {
        blocks.push(lines.join("\n"));
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cells_have_no_blocks() {
        assert!(segment_cell("").is_empty());
        assert!(segment_cell("  \n\t ").is_empty());
        assert!(segment_cell("&#10;&#13;").is_empty());
    }

    #[test]
    fn markers_split_blocks_and_join_continuations() {
        let cell = "数据结构[必修]\n张三-t001[主讲]\nA301 [1-16周]\n操作系统[选修]\n李四[主讲]";
        assert_eq!(
            segment_cell(cell),
            vec![
                "数据结构[必修] 张三-t001[主讲] A301 [1-16周]".to_string(),
                "操作系统[选修] 李四[主讲]".to_string(),
            ]
        );
    }

    #[test]
    fn html_escapes_act_as_line_breaks() {
        let cell = "高数[考试]&#10;王五老师&#13;&#10;B202";
        assert_eq!(segment_cell(cell), vec!["高数[考试] 王五老师 B202".to_string()]);
    }

    #[test]
    fn text_before_first_marker_is_dropped() {
        let cell = "(上午)\n线性代数[理论]\nC101";
        assert_eq!(segment_cell(cell), vec!["线性代数[理论] C101".to_string()]);
    }

    #[test]
    fn unmarked_cell_is_one_block() {
        let cell = "  大学英语 \r\n 赵六老师\n";
        assert_eq!(segment_cell(cell), vec!["大学英语\n赵六老师".to_string()]);
    }
}
