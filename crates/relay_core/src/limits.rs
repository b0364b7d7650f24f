//! Discord text limits, counted in characters.

pub const MAX_CONTENT_CHARS: usize = 2000;
pub const MAX_TITLE_CHARS: usize = 256;
pub const MAX_DESCRIPTION_CHARS: usize = 4096;
pub const MAX_FOOTER_CHARS: usize = 2048;
pub const MAX_AUTHOR_CHARS: usize = 256;

const TRUNCATED_MARKER: char = '…';

/// Cuts `text` to at most `max_chars` characters, marking the cut.
pub fn clamp_text(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some(_) => {
            let mut kept: String = text.chars().take(max_chars - 1).collect();
            kept.push(TRUNCATED_MARKER);
            kept
        }
    }
}

/// Keeps the last `max_chars` characters of `text`, marking the cut at the front.
pub fn tail_text(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let skip = total - (max_chars - 1);
    let mut kept = String::with_capacity(text.len());
    kept.push(TRUNCATED_MARKER);
    kept.extend(text.chars().skip(skip));
    kept
}

#[cfg(test)]
mod tests {
    use super::{clamp_text, tail_text};

    #[test]
    fn short_text_kept_as_is() {
        assert_eq!(clamp_text("short", 10), "short");
        assert_eq!(tail_text("short", 10), "short");
    }

    #[test]
    fn clamped_text_ends_with_marker() {
        let clamped = clamp_text("abcdefghij", 5);
        assert_eq!(clamped, "abcd…");
        assert_eq!(clamped.chars().count(), 5);
    }

    #[test]
    fn clamping_respects_multibyte_characters() {
        let clamped = clamp_text("ねこねこねこ", 4);
        assert_eq!(clamped, "ねこね…");
    }

    #[test]
    fn tail_keeps_latest_lines() {
        let tail = tail_text("line1\nline2\nline3", 6);
        assert_eq!(tail, "…line3");
        assert_eq!(tail.chars().count(), 6);
    }
}
