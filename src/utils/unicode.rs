//! Unicode-safe helpers for working with UTF-8 strings.

use unicode_width::UnicodeWidthStr;

/// Convert a character index (0-based) to a byte index in the given string.
/// If `n` exceeds the number of characters, returns `s.len()`.
pub fn char_to_byte_index(s: &str, n: usize) -> usize {
    match s.char_indices().nth(n) {
        Some((i, _)) => i,
        None => s.len(),
    }
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Terminal columns taken by the first `n` characters of `s`.
pub fn prefix_width(s: &str, n: usize) -> usize {
    s[..char_to_byte_index(s, n)].width()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_multibyte_text() {
        let s = "aé漢b";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 9), s.len());
        assert_eq!(char_len(s), 4);
    }

    #[test]
    fn wide_characters_take_two_columns() {
        assert_eq!(prefix_width("漢字x", 2), 4);
        assert_eq!(prefix_width("abc", 1), 1);
    }
}
