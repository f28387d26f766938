//! Line scan: code/comment/blank classification independent of the parser.
//!
//! Block-comment state is carried across lines. A line counts as code if any
//! non-whitespace text sits outside a comment; otherwise, if non-blank, it is
//! a comment line. Blank lines count toward neither. Markers inside a quoted
//! string on the same line are ignored; strings spanning lines are not tracked.

use super::language::CommentSyntax;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounts {
    pub code: usize,
    pub comment: usize,
    pub blank: usize,
}

pub fn count_lines(source: &str, syntax: CommentSyntax) -> LineCounts {
    let mut counts = LineCounts::default();
    let mut in_block = false;

    for line in source.lines() {
        if line.trim().is_empty() {
            counts.blank += 1;
            continue;
        }
        let (has_code, still_in_block) = scan_line(line, syntax, in_block);
        in_block = still_in_block;
        if has_code {
            counts.code += 1;
        } else {
            counts.comment += 1;
        }
    }

    counts
}

/// Returns (line has code outside comments, block comment still open at EOL).
fn scan_line(line: &str, syntax: CommentSyntax, mut in_block: bool) -> (bool, bool) {
    let mut rest = line;
    let mut has_code = false;

    loop {
        if in_block {
            let Some((_, close)) = syntax.block else {
                return (has_code, false);
            };
            match rest.find(close) {
                Some(pos) => {
                    rest = &rest[pos + close.len()..];
                    in_block = false;
                }
                None => return (has_code, true),
            }
            continue;
        }

        match next_marker(rest, syntax) {
            Some((pos, Marker::Line)) => {
                has_code |= !rest[..pos].trim().is_empty();
                return (has_code, false);
            }
            Some((pos, Marker::BlockOpen(len))) => {
                has_code |= !rest[..pos].trim().is_empty();
                rest = &rest[pos + len..];
                in_block = true;
            }
            None => {
                has_code |= !rest.trim().is_empty();
                return (has_code, false);
            }
        }
    }
}

enum Marker {
    Line,
    BlockOpen(usize),
}

/// First comment opener in `text` that sits outside a quoted span.
fn next_marker(text: &str, syntax: CommentSyntax) -> Option<(usize, Marker)> {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == open {
                quote = None;
            }
            continue;
        }
        if syntax.quotes.contains(&c) {
            quote = Some(c);
            continue;
        }

        let tail = &text[i..];
        if tail.starts_with(syntax.line) {
            return Some((i, Marker::Line));
        }
        if let Some((open, _)) = syntax.block {
            if tail.starts_with(open) {
                return Some((i, Marker::BlockOpen(open.len())));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const C_LIKE: CommentSyntax = CommentSyntax {
        line: "//",
        block: Some(("/*", "*/")),
        quotes: &['"', '\'', '`'],
    };

    const HASH: CommentSyntax = CommentSyntax {
        line: "#",
        block: None,
        quotes: &['"', '\''],
    };

    #[test]
    fn blank_lines_count_toward_neither() {
        let counts = count_lines("let a = 1;\n\n   \nlet b = 2;\n", C_LIKE);
        assert_eq!(counts.code, 2);
        assert_eq!(counts.comment, 0);
        assert_eq!(counts.blank, 2);
    }

    #[test]
    fn block_comment_state_spans_lines() {
        let src = "/**\n * Docs\n\n * more\n */\nfunction f() {}\n";
        let counts = count_lines(src, C_LIKE);
        assert_eq!(counts.comment, 4);
        assert_eq!(counts.blank, 1);
        assert_eq!(counts.code, 1);
    }

    #[test]
    fn trailing_comments_keep_line_as_code() {
        let src = "x = 1; // set x\ny = 2; /* open\nstill comment */ z = 3;\n// only comment\n";
        let counts = count_lines(src, C_LIKE);
        assert_eq!(counts.code, 3);
        assert_eq!(counts.comment, 1);
    }

    #[test]
    fn single_line_block_comment_is_comment() {
        let counts = count_lines("/* header */\ncode();\n", C_LIKE);
        assert_eq!(counts.comment, 1);
        assert_eq!(counts.code, 1);
    }

    #[test]
    fn hash_comments_for_python() {
        let counts = count_lines("# comment\nx = 1  # trailing\n\n", HASH);
        assert_eq!(counts.comment, 1);
        assert_eq!(counts.code, 1);
        assert_eq!(counts.blank, 1);
    }

    #[test]
    fn markers_inside_strings_are_code() {
        let src = "const open = \"/*\";\nconst url = 'http://x';\nlet t = `//`; // real\nnext();\n";
        let counts = count_lines(src, C_LIKE);
        assert_eq!(counts.code, 4);
        assert_eq!(counts.comment, 0);
    }

    #[test]
    fn escaped_quote_does_not_close_string() {
        let src = "s = \"a\\\" /* b\";\n/* c */\n";
        let counts = count_lines(src, C_LIKE);
        assert_eq!(counts.code, 1);
        assert_eq!(counts.comment, 1);
    }

    #[test]
    fn hash_inside_python_string_is_code() {
        let counts = count_lines("color = '#fff'\n", HASH);
        assert_eq!(counts.code, 1);
        assert_eq!(counts.comment, 0);
    }

    #[test]
    fn empty_source_counts_nothing() {
        assert_eq!(count_lines("", C_LIKE), LineCounts::default());
    }
}
