//! Activation keys and key-string parsing

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

/// Default keys that activate the focused node
pub const DEFAULT_ACTIVATION_KEYS: &[&str] = &["enter", "space"];

/// Keys that act like a primary click on the focused node
///
/// Serialized as the key strings it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationKeys {
    names: Vec<String>,
    keys: Vec<KeyEvent>,
}

impl Default for ActivationKeys {
    fn default() -> Self {
        Self {
            names: DEFAULT_ACTIVATION_KEYS.iter().map(|s| s.to_string()).collect(),
            keys: DEFAULT_ACTIVATION_KEYS
                .iter()
                .filter_map(|s| parse_key_string(s))
                .collect(),
        }
    }
}

impl ActivationKeys {
    /// Parse key strings like `"enter"`, `"space"`, `"ctrl+o"`
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, ConfigError> {
        let mut keys = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let key =
                parse_key_string(name).ok_or_else(|| ConfigError::InvalidKey(name.to_string()))?;
            keys.push(key);
        }
        Ok(Self {
            names: names.iter().map(|s| s.as_ref().to_string()).collect(),
            keys,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether `key` activates. Releases never do; modifiers must match.
    pub fn is_activation(&self, key: &KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return false;
        }
        self.keys
            .iter()
            .any(|bound| key_matches(bound, key))
    }
}

impl Serialize for ActivationKeys {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.names.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ActivationKeys {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let names: Vec<String> = Vec::deserialize(deserializer)?;
        ActivationKeys::parse(&names).map_err(serde::de::Error::custom)
    }
}

/// Compare code and modifiers, ignoring kind and state.
/// Character keys compare case-insensitively.
fn key_matches(bound: &KeyEvent, key: &KeyEvent) -> bool {
    let codes_match = match (&bound.code, &key.code) {
        (KeyCode::Char(c1), KeyCode::Char(c2)) => c1.eq_ignore_ascii_case(c2),
        _ => bound.code == key.code,
    };
    codes_match && bound.modifiers == key.modifiers
}

/// Parse a key string like "enter", "space", "ctrl+o", "shift+tab" into a KeyEvent
pub fn parse_key_string(key_str: &str) -> Option<KeyEvent> {
    let key_str = key_str.trim().to_lowercase();

    if key_str.is_empty() {
        return None;
    }

    if key_str == "shift+tab" || key_str == "backtab" {
        return Some(press(KeyCode::BackTab, KeyModifiers::SHIFT));
    }

    let parts: Vec<&str> = key_str.split('+').collect();
    let mut modifiers = KeyModifiers::empty();
    let key_part = parts.last()?.trim();

    for part in &parts[..parts.len() - 1] {
        match part.trim() {
            "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
            "shift" => modifiers |= KeyModifiers::SHIFT,
            "alt" => modifiers |= KeyModifiers::ALT,
            _ => return None,
        }
    }

    let code = match key_part {
        "esc" | "escape" => KeyCode::Esc,
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "delete" => KeyCode::Delete,
        "space" => KeyCode::Char(' '),
        f if f.len() > 1 && f.starts_with('f') => {
            let n: u8 = f[1..].parse().ok()?;
            if !(1..=12).contains(&n) {
                return None;
            }
            KeyCode::F(n)
        }
        c if c.chars().count() == 1 => KeyCode::Char(c.chars().next()?),
        _ => return None,
    };

    Some(press(code, modifiers))
}

fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
    KeyEvent {
        code,
        modifiers,
        kind: KeyEventKind::Press,
        state: KeyEventState::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_keys() {
        assert_eq!(parse_key_string("enter").unwrap().code, KeyCode::Enter);
        assert_eq!(parse_key_string(" Space ").unwrap().code, KeyCode::Char(' '));
        assert_eq!(parse_key_string("f5").unwrap().code, KeyCode::F(5));
        assert!(parse_key_string("f13").is_none());
        assert!(parse_key_string("").is_none());
        assert!(parse_key_string("hyper+x").is_none());
    }

    #[test]
    fn test_parse_modifiers() {
        let key = parse_key_string("ctrl+o").unwrap();
        assert_eq!(key.code, KeyCode::Char('o'));
        assert!(key.modifiers.contains(KeyModifiers::CONTROL));

        let key = parse_key_string("shift+tab").unwrap();
        assert_eq!(key.code, KeyCode::BackTab);
    }

    #[test]
    fn test_default_activation_keys() {
        let keys = ActivationKeys::default();
        assert!(keys.is_activation(&press(KeyCode::Enter, KeyModifiers::NONE)));
        assert!(keys.is_activation(&press(KeyCode::Char(' '), KeyModifiers::NONE)));
        assert!(!keys.is_activation(&press(KeyCode::Enter, KeyModifiers::CONTROL)));
        assert!(!keys.is_activation(&press(KeyCode::Char('a'), KeyModifiers::NONE)));

        let mut release = press(KeyCode::Enter, KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert!(!keys.is_activation(&release));
    }

    #[test]
    fn test_activation_keys_serde() {
        let keys: ActivationKeys = serde_json::from_str(r#"["enter", "ctrl+o"]"#).unwrap();
        assert!(keys.is_activation(&press(KeyCode::Char('O'), KeyModifiers::CONTROL)));
        assert_eq!(serde_json::to_string(&keys).unwrap(), r#"["enter","ctrl+o"]"#);

        let bad = serde_json::from_str::<ActivationKeys>(r#"["enter", "nope"]"#);
        assert!(bad.is_err());
    }
}
