//! Plain-text helpers for summary layout
//!
//! Widths are measured in chars, which is what terminal columns approximate
//! for the text the activity API returns.

/// Number of columns a string occupies
pub fn display_width(s: &str) -> usize {
    s.chars().count()
}

/// Left-align `s` in a field of `width` columns
///
/// Strings already at or past the width get a single trailing space so the
/// next column never touches them.
pub fn pad_right(s: &str, width: usize) -> String {
    let len = display_width(s);
    if len >= width {
        format!("{} ", s)
    } else {
        format!("{}{}", s, " ".repeat(width - len))
    }
}

/// Keep at most `lines` lines; when more exist the next line becomes `...`
pub fn ellipsis(text: &str, lines: usize) -> String {
    let limit = lines.saturating_add(1);
    let mut parts: Vec<&str> = text.splitn(limit, '\n').collect();
    if parts.len() == limit {
        parts[lines] = "...";
    }
    parts.join("\n")
}

/// Word-wrap one line of text to `width` columns
///
/// Words longer than the width are split hard. An empty input yields a single
/// empty line so blank lines survive wrapping.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word = word;
        let mut word_len = display_width(word);

        if current_len > 0 && current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
            continue;
        }

        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
        }

        while word_len > width {
            let split = word.char_indices().nth(width).map(|(i, _)| i).unwrap_or(word.len());
            lines.push(word[..split].to_string());
            word = &word[split..];
            word_len -= width;
        }

        current.push_str(word);
        current_len = word_len;
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}
