//! Turns stdin lines into console input events.
//!
//! Plain text is typed and submitted with Enter. Key names in angle
//! brackets press that key instead, e.g. `call pl<tab>` or `<up>`; a line
//! that ends in a key is not submitted.

use tinker_types::input::{InputEvent, Key};

/// Parse a key token such as `tab`, `s-tab`, `f3` or `wheel+2`.
fn key_event(token: &str) -> Option<InputEvent> {
    let token = token.to_ascii_lowercase();
    if let Some(delta) = token.strip_prefix("wheel") {
        return delta.parse().ok().map(InputEvent::Wheel);
    }
    let (shift, name) = match token.strip_prefix("s-") {
        Some(name) => (true, name),
        None => (false, token.as_str()),
    };
    let key = match name {
        "toggle" | "`" => Key::Backquote,
        "esc" => Key::Escape,
        "enter" => Key::Enter,
        "bs" => Key::Backspace,
        "del" => Key::Delete,
        "tab" => Key::Tab,
        "up" => Key::Up,
        "down" => Key::Down,
        "left" => Key::Left,
        "right" => Key::Right,
        f => Key::F(f.strip_prefix('f')?.parse().ok()?),
    };
    Some(InputEvent::KeyPress { key, shift })
}

/// Events for one frame of input.
pub fn line_events(line: &str) -> Vec<InputEvent> {
    let mut events = Vec::new();
    let mut rest = line;
    let mut ends_with_key = false;
    while !rest.is_empty() {
        if let Some(open) = rest.strip_prefix('<')
            && let Some(close) = open.find('>')
            && let Some(event) = key_event(&open[..close])
        {
            events.push(event);
            rest = &open[close + 1..];
            ends_with_key = true;
            continue;
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            events.push(InputEvent::Text(c));
        }
        rest = chars.as_str();
        ends_with_key = false;
    }
    if !ends_with_key && !events.is_empty() {
        events.push(InputEvent::key(Key::Enter));
    }
    events
}
