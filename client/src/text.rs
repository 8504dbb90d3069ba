//! Plain-text helpers
//!
//! Titles and messages authored on the web front-end arrive with markup;
//! the client only ever shows them as plain text.

/// Strip tags and decode the handful of entities the editor emits
pub fn plain_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '<' if !in_tag && chars.peek().is_some_and(|&n| opens_tag(n)) => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    out.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// A `<` starts a tag only before a letter, `/` or `!`
fn opens_tag(next: char) -> bool {
    next.is_ascii_alphabetic() || next == '/' || next == '!'
}

/// Keep at most `max` characters (not bytes)
pub fn truncate_chars(input: &str, max: usize) -> String {
    input.chars().take(max).collect()
}

/// `None` for missing or whitespace-only values, trimmed text otherwise
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_strips_markup() {
        assert_eq!(plain_text("<p>Hola <b>mundo</b></p>"), "Hola mundo");
        assert_eq!(plain_text("  Tom &amp; Jerry "), "Tom & Jerry");
        assert_eq!(plain_text("sin etiquetas"), "sin etiquetas");
    }

    #[test]
    fn test_plain_text_keeps_bare_angle_brackets() {
        assert_eq!(plain_text("x<3 y"), "x<3 y");
        assert_eq!(plain_text("a < b y c > d"), "a < b y c > d");
        assert_eq!(plain_text("<!-- nota -->Hola</p>"), "Hola");
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate_chars("ñandú", 3), "ñan");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  x ")), Some("x".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
