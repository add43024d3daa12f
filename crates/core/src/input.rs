/// Keys the feed reacts to. Anything else maps to `Key::Other`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    PageUp,
    PageDown,
    Home,
    End,
    Space,
    Character(char),
    Other,
}

/// What a key press asks the feed to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
    Next,
    Previous,
    First,
    Last,
    /// Zero-based slide index.
    JumpTo(usize),
    TogglePlayback,
}

/// Map a key press to a feed command.
#[must_use]
pub fn command_for_key(key: Key) -> Option<KeyCommand> {
    match key {
        Key::ArrowDown | Key::PageDown => Some(KeyCommand::Next),
        Key::ArrowUp | Key::PageUp => Some(KeyCommand::Previous),
        Key::Home => Some(KeyCommand::First),
        Key::End => Some(KeyCommand::Last),
        Key::Space => Some(KeyCommand::TogglePlayback),
        Key::Character(ch) => match ch.to_ascii_lowercase() {
            'j' => Some(KeyCommand::Next),
            'k' => Some(KeyCommand::Previous),
            'p' => Some(KeyCommand::TogglePlayback),
            digit @ '1'..='9' => digit
                .to_digit(10)
                .map(|value| KeyCommand::JumpTo(value as usize - 1)),
            _ => None,
        },
        Key::Other => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_vim_keys_navigate() {
        assert_eq!(command_for_key(Key::ArrowDown), Some(KeyCommand::Next));
        assert_eq!(command_for_key(Key::Character('J')), Some(KeyCommand::Next));
        assert_eq!(command_for_key(Key::ArrowUp), Some(KeyCommand::Previous));
        assert_eq!(command_for_key(Key::Character('k')), Some(KeyCommand::Previous));
    }

    #[test]
    fn digits_jump_zero_based() {
        assert_eq!(command_for_key(Key::Character('1')), Some(KeyCommand::JumpTo(0)));
        assert_eq!(command_for_key(Key::Character('9')), Some(KeyCommand::JumpTo(8)));
        assert_eq!(command_for_key(Key::Character('0')), None);
    }

    #[test]
    fn space_toggles_playback() {
        assert_eq!(command_for_key(Key::Space), Some(KeyCommand::TogglePlayback));
        assert_eq!(command_for_key(Key::Other), None);
    }
}
