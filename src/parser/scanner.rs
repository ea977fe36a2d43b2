//! Bracket- and string-aware scanning of argument text
//!
//! JSON arguments may contain parentheses and commas inside strings or
//! nested objects, so a plain regex capture cannot find where an argument
//! list ends. These helpers walk the text once, tracking nesting depth and
//! quoted regions.

/// Byte offset of the `)` closing the `(` at `open`
pub fn find_closing_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in text.char_indices().skip_while(|(i, _)| *i < open) {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' | '`' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return (ch == ')').then_some(i);
                }
            }
            _ => {}
        }
    }

    None
}

/// Split an argument list on top-level commas
///
/// Returns an empty list for blank input. A trailing comma is ignored.
pub fn split_top_level(args: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, ch) in args.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' | '`' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(args[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }

    let last = args[start..].trim();
    if !last.is_empty() {
        parts.push(last.to_string());
    }

    parts
}

/// Strip one pair of matching single or double quotes
pub fn unquote(arg: &str) -> Option<&str> {
    let arg = arg.trim();
    ['\'', '"']
        .into_iter()
        .find_map(|q| arg.strip_prefix(q)?.strip_suffix(q))
        .filter(|inner| !inner.contains(['\'', '"']))
}

/// Parse a chain of `.name(args)` calls
///
/// Returns `None` when `text` holds anything other than such calls.
pub fn parse_call_chain(text: &str) -> Option<Vec<(String, String)>> {
    let mut calls = Vec::new();
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        let after_dot = rest.strip_prefix('.')?.trim_start();
        let name_len = after_dot
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after_dot.len());
        let (name, tail) = after_dot.split_at(name_len);
        if name.is_empty() {
            return None;
        }

        let open = tail.len() - tail.trim_start().len();
        if !tail[open..].starts_with('(') {
            return None;
        }
        let close = find_closing_paren(tail, open)?;

        calls.push((name.to_string(), tail[open + 1..close].trim().to_string()));
        rest = tail[close + 1..].trim_start();
    }

    Some(calls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_closing_paren_nested() {
        let text = r#"find({"a": {"$in": [1, 2]}}).limit(5)"#;
        let close = find_closing_paren(text, 4).unwrap();
        assert_eq!(&text[close + 1..], ".limit(5)");
    }

    #[test]
    fn test_find_closing_paren_ignores_strings() {
        let text = r#"find({"name": "a)b", "x": 'c(d'})"#;
        assert_eq!(find_closing_paren(text, 4), Some(text.len() - 1));

        let escaped = r#"find({"q": "say \") hi"})"#;
        assert_eq!(find_closing_paren(escaped, 4), Some(escaped.len() - 1));
    }

    #[test]
    fn test_find_closing_paren_unbalanced() {
        assert_eq!(find_closing_paren("find({)", 4), None);
        assert_eq!(find_closing_paren("find({}", 4), None);
    }

    #[test]
    fn test_split_top_level() {
        assert!(split_top_level("  ").is_empty());
        assert_eq!(
            split_top_level(r#"{"a": 1, "b": [1, 2]}, {"$set": {"c": "x,y"}}"#),
            vec![r#"{"a": 1, "b": [1, 2]}"#, r#"{"$set": {"c": "x,y"}}"#]
        );
        assert_eq!(split_top_level("'name', {},"), vec!["'name'", "{}"]);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'email'"), Some("email"));
        assert_eq!(unquote(" \"email_1\" "), Some("email_1"));
        assert_eq!(unquote("'mixed\""), None);
        assert_eq!(unquote("email"), None);
    }

    #[test]
    fn test_parse_call_chain() {
        let calls = parse_call_chain(r#" .limit(10) .sort({"a": -1}).skip( 5 )"#).unwrap();
        assert_eq!(
            calls,
            vec![
                ("limit".to_string(), "10".to_string()),
                ("sort".to_string(), r#"{"a": -1}"#.to_string()),
                ("skip".to_string(), "5".to_string()),
            ]
        );

        assert_eq!(parse_call_chain(""), Some(vec![]));
        assert!(parse_call_chain(".limit").is_none());
        assert!(parse_call_chain("garbage").is_none());
        assert!(parse_call_chain(".limit(1").is_none());
    }
}
