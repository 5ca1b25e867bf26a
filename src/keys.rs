//! Physical key identifiers
//!
//! Keys are written in the portable key-sequence text format: single
//! printable characters (`A`, `7`, `/`), function keys (`F1`..`F35`) and a
//! fixed set of named keys (`Space`, `Esc`, `PgUp`, ...). Letters are stored
//! upper-case so `a` and `A` name the same key.

use crate::error::KeyParseError;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Keys that have a name instead of a character
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Space,
    Escape,
    Tab,
    Backspace,
    Return,
    Enter,
    Insert,
    Delete,
    Pause,
    Print,
    Home,
    End,
    Left,
    Up,
    Right,
    Down,
    PageUp,
    PageDown,
}

impl NamedKey {
    const ALL: [NamedKey; 18] = [
        NamedKey::Space,
        NamedKey::Escape,
        NamedKey::Tab,
        NamedKey::Backspace,
        NamedKey::Return,
        NamedKey::Enter,
        NamedKey::Insert,
        NamedKey::Delete,
        NamedKey::Pause,
        NamedKey::Print,
        NamedKey::Home,
        NamedKey::End,
        NamedKey::Left,
        NamedKey::Up,
        NamedKey::Right,
        NamedKey::Down,
        NamedKey::PageUp,
        NamedKey::PageDown,
    ];

    /// Portable text name
    pub fn name(self) -> &'static str {
        match self {
            NamedKey::Space => "Space",
            NamedKey::Escape => "Esc",
            NamedKey::Tab => "Tab",
            NamedKey::Backspace => "Backspace",
            NamedKey::Return => "Return",
            NamedKey::Enter => "Enter",
            NamedKey::Insert => "Ins",
            NamedKey::Delete => "Del",
            NamedKey::Pause => "Pause",
            NamedKey::Print => "Print",
            NamedKey::Home => "Home",
            NamedKey::End => "End",
            NamedKey::Left => "Left",
            NamedKey::Up => "Up",
            NamedKey::Right => "Right",
            NamedKey::Down => "Down",
            NamedKey::PageUp => "PgUp",
            NamedKey::PageDown => "PgDown",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }
}

/// Highest function key number accepted
pub const MAX_FUNCTION_KEY: u8 = 35;

/// A physical key
///
/// Character keys compare and hash case-insensitively, so `Char('a')` and
/// `Char('A')` are the same key.
#[derive(Clone, Copy, Debug)]
pub enum Key {
    /// Printable character key
    Char(char),
    /// `F1`..`F35`
    Function(u8),
    Named(NamedKey),
}

impl Key {
    /// Character key, normalising letters to upper case
    pub fn char(c: char) -> Self {
        Key::Char(c.to_ascii_uppercase())
    }

    /// Canonical form, with character keys upper-cased
    pub fn normalized(self) -> Self {
        match self {
            Key::Char(c) => Key::char(c),
            other => other,
        }
    }

    /// Parse the first key of a portable key-sequence text
    pub fn parse_portable(text: &str) -> Result<Self, KeyParseError> {
        // Sequences are ", "-separated; a lone "," is itself a key
        let first = match text.trim() {
            "," => ",",
            t => t.split(", ").next().unwrap_or(t).trim(),
        };
        if first.is_empty() {
            return Err(KeyParseError::Empty);
        }

        let mut chars = first.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_control() || c.is_whitespace() {
                return Err(KeyParseError::Unsupported(first.to_string()));
            }
            return Ok(Key::char(c));
        }

        if let Some(named) = NamedKey::from_name(first) {
            return Ok(Key::Named(named));
        }

        if let Some(num) = first.strip_prefix(['F', 'f']) {
            if let Ok(n) = num.parse::<u8>() {
                if (1..=MAX_FUNCTION_KEY).contains(&n) {
                    return Ok(Key::Function(n));
                }
            }
        }

        Err(KeyParseError::Unsupported(first.to_string()))
    }

    /// Portable text form, as stored in the key-map file
    pub fn to_portable(self) -> String {
        match self {
            Key::Char(c) => c.to_ascii_uppercase().to_string(),
            Key::Function(n) => format!("F{}", n),
            Key::Named(named) => named.name().to_string(),
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self.normalized(), other.normalized()) {
            (Key::Char(a), Key::Char(b)) => a == b,
            (Key::Function(a), Key::Function(b)) => a == b,
            (Key::Named(a), Key::Named(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.normalized() {
            Key::Char(c) => (0u8, c).hash(state),
            Key::Function(n) => (1u8, n).hash(state),
            Key::Named(named) => (2u8, named).hash(state),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_portable())
    }
}

impl FromStr for Key {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::parse_portable(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_characters() {
        assert_eq!(Key::parse_portable("A").unwrap(), Key::Char('A'));
        assert_eq!(Key::parse_portable("a").unwrap(), Key::Char('A'));
        assert_eq!(Key::parse_portable("7").unwrap(), Key::Char('7'));
        assert_eq!(Key::parse_portable(",").unwrap(), Key::Char(','));
        assert_eq!(Key::parse_portable("+").unwrap(), Key::Char('+'));
    }

    #[test]
    fn test_parse_named_and_function_keys() {
        assert_eq!(Key::parse_portable("Space").unwrap(), Key::Named(NamedKey::Space));
        assert_eq!(Key::parse_portable("esc").unwrap(), Key::Named(NamedKey::Escape));
        assert_eq!(Key::parse_portable("PgDown").unwrap(), Key::Named(NamedKey::PageDown));
        assert_eq!(Key::parse_portable("F12").unwrap(), Key::Function(12));
        assert!(Key::parse_portable("F36").is_err());
        assert!(Key::parse_portable("F0").is_err());
    }

    #[test]
    fn test_sequence_uses_first_key() {
        assert_eq!(Key::parse_portable("Q, W").unwrap(), Key::Char('Q'));
    }

    #[test]
    fn test_rejects_chords_and_blanks() {
        assert_eq!(Key::parse_portable(""), Err(KeyParseError::Empty));
        assert_eq!(Key::parse_portable("   "), Err(KeyParseError::Empty));
        assert!(matches!(
            Key::parse_portable("Ctrl+A"),
            Err(KeyParseError::Unsupported(_))
        ));
    }

    #[test]
    fn test_raw_lowercase_char_is_same_key() {
        use std::collections::HashSet;

        assert_eq!(Key::Char('a'), Key::Char('A'));
        assert_eq!(Key::Char('a').normalized(), Key::Char('A'));
        assert_eq!(Key::Char('a').to_portable(), "A");
        assert_ne!(Key::Char('a'), Key::Char('B'));

        let set: HashSet<Key> = [Key::Char('q'), Key::Char('Q')].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_portable_text_roundtrip() {
        let keys = [
            Key::Char('Z'),
            Key::Char('z'),
            Key::Function(1),
            Key::Function(MAX_FUNCTION_KEY),
            Key::Named(NamedKey::Return),
            Key::Named(NamedKey::Insert),
        ];
        for key in keys {
            assert_eq!(Key::parse_portable(&key.to_portable()).unwrap(), key);
        }
    }
}
