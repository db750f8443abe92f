//! Settings form state, kept as a plain value and rebuilt from the stored
//! [`Settings`] whenever the form opens.

use serde::{Deserialize, Serialize};

use crate::keys::KeyChord;
use crate::settings::{DEFAULT_LAUNCH_COMMAND, DEFAULT_SHELL, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
}

/// Form edits a UI can apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    /// Open the form, discarding unsaved edits.
    Open,
    Cancel,
    /// A key press in the key field, as the UI reports it (`F8`, `a`, `Control`).
    KeyPressed(String),
    SetModifier(Modifier, bool),
    SetLaunchCommand(String),
    SetDefaultShell(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub settings_open: bool,
    pub auto_enabled: bool,
    /// Key without modifiers or braces, as shown in the input.
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub launch_command: String,
    pub default_shell: String,
    /// Stored key in full, for the status line.
    pub current_key: String,
    #[serde(skip)]
    saved: Settings,
}

impl ViewState {
    pub fn from_settings(settings: &Settings, auto_enabled: bool) -> Self {
        let mut state = ViewState {
            settings_open: false,
            auto_enabled,
            key: String::new(),
            ctrl: false,
            shift: false,
            alt: false,
            launch_command: String::new(),
            default_shell: String::new(),
            current_key: String::new(),
            saved: settings.clone(),
        };
        state.sync();
        state
    }

    /// Reset every form field from the last saved settings.
    fn sync(&mut self) {
        let stored = if self.saved.automation_key.is_empty() {
            crate::settings::DEFAULT_AUTOMATION_KEY.to_string()
        } else {
            self.saved.automation_key.clone()
        };
        let chord = KeyChord::parse(&stored);
        self.ctrl = chord.ctrl;
        self.shift = chord.shift;
        self.alt = chord.alt;
        self.key = chord.key;
        self.current_key = stored;
        self.launch_command = self.saved.launch_command.clone();
        self.default_shell = if self.saved.default_shell.is_empty() {
            DEFAULT_SHELL.to_string()
        } else {
            self.saved.default_shell.clone()
        };
    }

    pub fn apply(&mut self, action: ViewAction) {
        match action {
            ViewAction::Open => {
                self.sync();
                self.settings_open = true;
            }
            ViewAction::Cancel => self.settings_open = false,
            ViewAction::KeyPressed(key) => {
                if !matches!(key.as_str(), "Control" | "Shift" | "Alt") {
                    self.key = key.to_uppercase();
                }
            }
            ViewAction::SetModifier(modifier, on) => match modifier {
                Modifier::Ctrl => self.ctrl = on,
                Modifier::Shift => self.shift = on,
                Modifier::Alt => self.alt = on,
            },
            ViewAction::SetLaunchCommand(cmd) => self.launch_command = cmd,
            ViewAction::SetDefaultShell(shell) => self.default_shell = shell,
        }
    }

    /// Compose settings from the form and close it. The result becomes the
    /// new baseline for later `Open` actions.
    pub fn save(&mut self) -> Settings {
        let chord = KeyChord {
            ctrl: self.ctrl,
            shift: self.shift,
            alt: self.alt,
            key: self.key.clone(),
        };
        let settings = Settings {
            automation_key: chord.to_send_keys(),
            launch_command: non_empty_or(&self.launch_command, DEFAULT_LAUNCH_COMMAND),
            default_shell: non_empty_or(&self.default_shell, DEFAULT_SHELL),
        };
        self.saved = settings.clone();
        self.current_key = settings.automation_key.clone();
        self.settings_open = false;
        settings
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(key: &str) -> Settings {
        Settings {
            automation_key: key.into(),
            ..Settings::default()
        }
    }

    #[test]
    fn decomposes_stored_key() {
        let view = ViewState::from_settings(&stored("^%{F8}"), true);
        assert!(view.ctrl && view.alt && !view.shift);
        assert_eq!(view.key, "F8");
        assert_eq!(view.current_key, "^%{F8}");
        assert!(view.auto_enabled);
        assert!(!view.settings_open);
    }

    #[test]
    fn modifier_key_presses_are_ignored() {
        let mut view = ViewState::from_settings(&Settings::default(), false);
        view.apply(ViewAction::KeyPressed("f5".into()));
        view.apply(ViewAction::KeyPressed("Shift".into()));
        assert_eq!(view.key, "F5");
    }

    #[test]
    fn save_composes_send_keys() {
        let mut view = ViewState::from_settings(&Settings::default(), false);
        view.apply(ViewAction::Open);
        view.apply(ViewAction::KeyPressed("F2".into()));
        view.apply(ViewAction::SetModifier(Modifier::Ctrl, true));
        view.apply(ViewAction::SetModifier(Modifier::Shift, true));
        let settings = view.save();
        assert_eq!(settings.automation_key, "^+{F2}");
        assert!(!view.settings_open);
        assert_eq!(view.current_key, "^+{F2}");
    }

    #[test]
    fn single_letter_is_not_braced() {
        let mut view = ViewState::from_settings(&Settings::default(), false);
        view.apply(ViewAction::KeyPressed("q".into()));
        view.apply(ViewAction::SetModifier(Modifier::Alt, true));
        assert_eq!(view.save().automation_key, "%Q");
    }

    #[test]
    fn empty_fields_fall_back_to_defaults() {
        let mut view = ViewState::from_settings(&Settings::default(), false);
        view.key.clear();
        view.apply(ViewAction::SetLaunchCommand(String::new()));
        view.apply(ViewAction::SetDefaultShell(String::new()));
        let settings = view.save();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn reopening_discards_unsaved_edits() {
        let mut view = ViewState::from_settings(&stored("{F9}"), false);
        view.apply(ViewAction::Open);
        view.apply(ViewAction::KeyPressed("F1".into()));
        view.apply(ViewAction::SetLaunchCommand("yarn dev".into()));
        view.apply(ViewAction::Cancel);
        view.apply(ViewAction::Open);
        assert_eq!(view.key, "F9");
        assert_eq!(view.launch_command, "pnpm start");
    }

    #[test]
    fn saved_value_becomes_new_baseline() {
        let mut view = ViewState::from_settings(&Settings::default(), false);
        view.apply(ViewAction::SetLaunchCommand("npm run serve".into()));
        view.save();
        view.apply(ViewAction::Open);
        assert_eq!(view.launch_command, "npm run serve");
    }
}
