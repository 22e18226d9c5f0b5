//! Character classes and word-boundary scanning.
//!
//! Shared by the lexer and by tab-completion, which works on partially typed
//! lines that do not parse. Positions are char indices.

/// Characters that make up binary and assignment operators.
pub fn is_operator_char(c: char) -> bool {
    matches!(c, '=' | '!' | '<' | '>' | '+' | '-' | '*' | '/' | '&' | '|' | '^' | '%')
}

/// Operator characters plus member access, grouping and argument
/// separators.
pub fn is_delimiter(c: char) -> bool {
    is_operator_char(c) || matches!(c, '.' | '(' | ')' | ',')
}

/// Characters that end a word for completion.
pub fn is_word_break(c: char) -> bool {
    is_delimiter(c) || c.is_whitespace() || c == '@' || c == '"'
}

pub fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether `s` is a plain identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_identifier_start) && chars.all(is_identifier_char)
}

/// Start of the word ending at `cursor`.
pub fn word_start(chars: &[char], cursor: usize) -> usize {
    let cursor = cursor.min(chars.len());
    chars[..cursor]
        .iter()
        .rposition(|&c| is_word_break(c))
        .map_or(0, |i| i + 1)
}

/// End of the word containing `cursor`.
pub fn word_end(chars: &[char], cursor: usize) -> usize {
    let cursor = cursor.min(chars.len());
    chars[cursor..]
        .iter()
        .position(|&c| is_word_break(c))
        .map_or(chars.len(), |i| cursor + i)
}

/// Unmatched open parentheses before `pos`.
pub fn depth_at(chars: &[char], pos: usize) -> usize {
    let mut depth = 0usize;
    for &c in &chars[..pos.min(chars.len())] {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {},
        }
    }
    depth
}

/// Start of the member chain ending at `end` (exclusive), e.g. the
/// `player.Weapon(1)` in `x = player.Weapon(1).`. Parenthesized groups are
/// skipped; the chain stops at the first delimiter other than `.` at its
/// own depth.
pub fn chain_start(chars: &[char], end: usize) -> usize {
    let mut depth = 0usize;
    let mut i = end.min(chars.len());
    while i > 0 {
        let c = chars[i - 1];
        match c {
            ')' => depth += 1,
            '(' if depth == 0 => break,
            '(' => depth -= 1,
            '.' => {},
            c if depth == 0 && (is_delimiter(c) || c.is_whitespace() || c == '@') => break,
            _ => {},
        }
        i -= 1;
    }
    i
}

/// The last non-whitespace character before `pos`.
pub fn preceding_char(chars: &[char], pos: usize) -> Option<char> {
    chars[..pos.min(chars.len())]
        .iter()
        .rev()
        .find(|c| !c.is_whitespace())
        .copied()
}
