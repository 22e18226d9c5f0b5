//! Greedy word wrapping for scrollback lines.

/// Break `text` into lines of at most `width` chars where possible.
///
/// A line is broken at the last space that fits. A word longer than `width`
/// is kept whole and broken at the first space after it. Existing line
/// breaks are kept, so wrapping already wrapped text changes nothing.
pub fn wrap(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut out: Vec<String> = Vec::new();
    for line in text.split('\n') {
        let mut rest: Vec<char> = line.chars().collect();
        while rest.len() > width {
            let fit = rest[..=width].iter().rposition(|&c| c == ' ');
            let brk = fit.or_else(|| rest.iter().position(|&c| c == ' '));
            let Some(brk) = brk else {
                break;
            };
            out.push(rest[..brk].iter().collect());
            rest.drain(..=brk);
        }
        out.push(rest.into_iter().collect());
    }
    out.join("\n")
}

/// [`wrap`] split into individual lines.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    wrap(text, width).split('\n').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_text_unchanged() {
        assert_eq!(wrap("hello world", 80), "hello world");
    }

    #[test]
    fn breaks_at_last_fitting_space() {
        assert_eq!(wrap("the quick brown fox", 10), "the quick\nbrown fox");
    }

    #[test]
    fn space_exactly_at_width_fits() {
        assert_eq!(wrap("abcde fgh", 5), "abcde\nfgh");
    }

    #[test]
    fn overlong_word_breaks_after_itself() {
        assert_eq!(wrap("abcdefghij xy", 4), "abcdefghij\nxy");
        assert_eq!(wrap("abcdefghij", 4), "abcdefghij");
    }

    #[test]
    fn existing_breaks_are_kept() {
        assert_eq!(wrap("a b\nc d", 80), "a b\nc d");
        assert_eq!(wrap_lines("one two\nthree", 3), vec!["one", "two", "three"]);
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(wrap("\u{e9}\u{e9}\u{e9} \u{e9}\u{e9}", 4), "\u{e9}\u{e9}\u{e9}\n\u{e9}\u{e9}");
    }

    proptest! {
        #[test]
        fn wrapping_is_idempotent(text in "[a-z \n]{0,120}", width in 1usize..30) {
            let once = wrap(&text, width);
            prop_assert_eq!(wrap(&once, width), once);
        }

        #[test]
        fn wrapped_lines_fit_or_have_no_space(text in "[a-z ]{0,120}", width in 1usize..30) {
            for line in wrap_lines(&text, width) {
                prop_assert!(line.chars().count() <= width || !line.contains(' '));
            }
        }

        #[test]
        fn only_spaces_become_breaks(text in "[a-z ]{0,120}", width in 1usize..30) {
            let wrapped = wrap(&text, width);
            prop_assert_eq!(wrapped.replace('\n', " "), text);
        }
    }
}
