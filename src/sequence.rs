//! Sequence literal splitting.

/// Split a sequence literal such as `[a,b,c]` or `a,b,c` into its raw tokens.
///
/// Outer brackets are optional. Commas nested inside bracket pairs do not
/// split, so `[[a-z]+,.*]` yields the two tokens `[a-z]+` and `.*`.
/// Tokens are trimmed; an empty literal (or `[]`) yields no tokens.
pub fn split_sequence(literal: &str) -> Vec<&str> {
    let inner = strip_outer_brackets(literal.trim()).trim();
    if inner.is_empty() {
        return Vec::new();
    }

    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                tokens.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    tokens.push(inner[start..].trim());
    tokens
}

/// Remove one pair of enclosing brackets, but only when the opening bracket
/// at the start is closed by the bracket at the end.
fn strip_outer_brackets(s: &str) -> &str {
    if !(s.starts_with('[') && s.ends_with(']')) || s.len() < 2 {
        return s;
    }
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != s.len() - 1 {
                    // `[a-z]+,[0-9]` : the first group closes early.
                    return s;
                }
            }
            _ => {}
        }
    }
    &s[1..s.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracketed_and_bare() {
        assert_eq!(split_sequence("[5,10,15]"), vec!["5", "10", "15"]);
        assert_eq!(split_sequence("5,10,15"), vec!["5", "10", "15"]);
    }

    #[test]
    fn test_nested_brackets_do_not_split() {
        assert_eq!(split_sequence("[[a-z]+,.*]"), vec!["[a-z]+", ".*"]);
        assert_eq!(split_sequence("[[1,2],[3]]"), vec!["[1,2]", "[3]"]);
    }

    #[test]
    fn test_unbracketed_leading_group() {
        assert_eq!(split_sequence("[a-z]+,[0-9]"), vec!["[a-z]+", "[0-9]"]);
    }

    #[test]
    fn test_single_and_empty() {
        assert_eq!(split_sequence("ts"), vec!["ts"]);
        assert_eq!(split_sequence("[/bin/sh]"), vec!["/bin/sh"]);
        assert!(split_sequence("").is_empty());
        assert!(split_sequence("[]").is_empty());
    }

    #[test]
    fn test_tokens_are_trimmed() {
        assert_eq!(split_sequence("[dev, staging , prod]"), vec!["dev", "staging", "prod"]);
        assert_eq!(split_sequence("[-p,5050:5050]"), vec!["-p", "5050:5050"]);
    }
}
