//! Small string and slice helpers shared by the analysis and chat pipelines.

/// First `max_chars` characters of `text`, cut on a char boundary.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// The last `n` items, or all of them when there are fewer.
pub(crate) fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
    }

    #[test]
    fn tail_takes_the_newest() {
        let items = [1, 2, 3, 4, 5];
        assert_eq!(tail(&items, 2), &[4, 5]);
        assert_eq!(tail(&items, 10).len(), 5);
        assert!(tail(&items, 0).is_empty());
    }
}
