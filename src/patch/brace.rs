//! Brace-depth matching.
//!
//! Braces inside string literals or comments are counted like any other
//! brace. The files this crate patches are machine-generated and formatted
//! consistently, so that is accepted.

/// Return the index of the `}` that closes the `{` at `open_index`.
///
/// Returns `None` if `open_index` is not an opening brace or the buffer ends
/// before the depth returns to zero. Callers treat `None` as "structure not
/// found" rather than an error.
pub fn match_brace(buffer: &str, open_index: usize) -> Option<usize> {
    let bytes = buffer.as_bytes();
    if bytes.get(open_index) != Some(&b'{') {
        return None;
    }

    let mut depth = 1usize;
    for (offset, &byte) in bytes[open_index + 1..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open_index + 1 + offset);
                }
            }
            _ => {}
        }
    }

    None
}

/// True when every `}` closes an earlier `{` and none are left open.
pub fn is_balanced(buffer: &str) -> bool {
    let mut depth = 0i64;
    for byte in buffer.bytes() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Brace nesting depth at byte offset `index` (braces before it only).
pub fn depth_at(buffer: &str, index: usize) -> i64 {
    buffer.as_bytes()[..index.min(buffer.len())]
        .iter()
        .fold(0, |depth, &byte| match byte {
            b'{' => depth + 1,
            b'}' => depth - 1,
            _ => depth,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_flat() {
        let text = "a { b } c";
        assert_eq!(match_brace(text, 2), Some(6));
    }

    #[test]
    fn test_match_nested() {
        let text = "x {\n  y {\n  }\n}\nz";
        let close = match_brace(text, 2).expect("should match");
        assert_eq!(&text[close..], "}\nz");
    }

    #[test]
    fn test_match_unbalanced() {
        assert_eq!(match_brace("a { { }", 2), None);
    }

    #[test]
    fn test_match_wrong_start() {
        assert_eq!(match_brace("abc { }", 0), None);
        assert_eq!(match_brace("abc", 10), None);
    }

    #[test]
    fn test_balanced() {
        assert!(is_balanced("a { b { } } c"));
        assert!(is_balanced("no braces"));
        assert!(!is_balanced("} {"));
        assert!(!is_balanced("{ {"));
    }

    #[test]
    fn test_depth_at() {
        let text = "a { b { c } }";
        assert_eq!(depth_at(text, 0), 0);
        assert_eq!(depth_at(text, 4), 1);
        assert_eq!(depth_at(text, 8), 2);
        assert_eq!(depth_at(text, text.len()), 0);
    }
}
