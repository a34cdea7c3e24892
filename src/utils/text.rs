/// First `max_chars` characters of `value`. Never splits a code point.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    match value.char_indices().nth(max_chars) {
        Some((end, _)) => value[..end].to_string(),
        None => value.to_string(),
    }
}
