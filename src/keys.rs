//! Automation key encoding.
//!
//! Keys are stored in SendKeys notation: optional `^` (ctrl), `+` (shift)
//! and `%` (alt) prefixes followed by a braced key name such as `{F9}` or a
//! single literal character.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyChord {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// Key name without braces or modifier markers, e.g. `F9` or `a`.
    pub key: String,
}

impl KeyChord {
    /// Decompose a stored key. Modifier flags are set if their marker
    /// appears anywhere in the string; every marker and brace is stripped
    /// from the key name.
    pub fn parse(encoded: &str) -> Self {
        KeyChord {
            ctrl: encoded.contains('^'),
            shift: encoded.contains('+'),
            alt: encoded.contains('%'),
            key: encoded
                .chars()
                .filter(|c| !matches!(c, '^' | '+' | '%' | '{' | '}'))
                .collect(),
        }
    }

    /// SendKeys form: `^+{F9}`. Named keys (more than one character, or
    /// anything starting with `F`) are braced.
    pub fn to_send_keys(&self) -> String {
        let key = if self.key.is_empty() { "F9" } else { self.key.as_str() };
        let mut out = String::new();
        if self.ctrl {
            out.push('^');
        }
        if self.shift {
            out.push('+');
        }
        if self.alt {
            out.push('%');
        }
        if key.chars().count() > 1 || key.starts_with('F') {
            out.push('{');
            out.push_str(key);
            out.push('}');
        } else {
            out.push_str(key);
        }
        out
    }

    /// xdotool form: `ctrl+shift+F9`.
    pub fn to_xdotool(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if self.ctrl {
            parts.push("ctrl".into());
        }
        if self.shift {
            parts.push("shift".into());
        }
        if self.alt {
            parts.push("alt".into());
        }
        parts.push(xdotool_key_name(&self.key));
        parts.join("+")
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_send_keys())
    }
}

fn xdotool_key_name(key: &str) -> String {
    match key.to_uppercase().as_str() {
        "" => "F9".into(),
        "ENTER" => "Return".into(),
        "ESC" | "ESCAPE" => "Escape".into(),
        "TAB" => "Tab".into(),
        "BS" | "BKSP" | "BACKSPACE" => "BackSpace".into(),
        "DEL" | "DELETE" => "Delete".into(),
        "SPACE" | " " => "space".into(),
        "UP" => "Up".into(),
        "DOWN" => "Down".into(),
        "LEFT" => "Left".into(),
        "RIGHT" => "Right".into(),
        "HOME" => "Home".into(),
        "END" => "End".into(),
        "PGUP" => "Prior".into(),
        "PGDN" => "Next".into(),
        _ => key.to_string(),
    }
}
