//! Graphviz DOT helpers.

/// Escapes text for use inside a quoted DOT label.
///
/// Besides quotes, backslashes and line breaks this escapes angle brackets and record
/// delimiters, which show up in JVM names such as `<init>` and in switch listings.
///
/// ```rust
/// use jarscope::utils::escape_dot;
///
/// assert_eq!(escape_dot("<init>"), "\\<init\\>");
/// ```
#[must_use]
pub fn escape_dot(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            '<' | '>' | '{' | '}' | '|' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}
