//! Messages exchanged between a panel UI and the host, one JSON object per
//! line, tagged by `type`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::scanner::RootResult;
use crate::settings::Settings;
use crate::terminal::TerminalInfo;

/// Events sent by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum UiMessage {
    /// Open a terminal named `name` in `path` and type `cmd` into it.
    Launch { name: String, path: PathBuf, cmd: String },
    /// Reveal a directory in the OS file browser.
    OpenDir { path: PathBuf },
    /// Copy a project path to the clipboard.
    CopyLog {
        #[serde(default)]
        path: String,
    },
    SaveSettings { settings: Settings },
    ToggleAuto { enabled: bool },
    Refresh,
    /// Kill whatever listens on a TCP port. Input is validated by the host.
    KillPort { port: String },
    /// Pair an Android device over Wi-Fi.
    AdbPair { code: String, target: String },
    SetRoots { roots: Vec<PathBuf> },
    Terminals,
}

impl UiMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            UiMessage::Launch { .. } => "launch",
            UiMessage::OpenDir { .. } => "openDir",
            UiMessage::CopyLog { .. } => "copyLog",
            UiMessage::SaveSettings { .. } => "saveSettings",
            UiMessage::ToggleAuto { .. } => "toggleAuto",
            UiMessage::Refresh => "refresh",
            UiMessage::KillPort { .. } => "killPort",
            UiMessage::AdbPair { .. } => "adbPair",
            UiMessage::SetRoots { .. } => "setRoots",
            UiMessage::Terminals => "terminals",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Messages sent back to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostMessage {
    Projects {
        projects: Vec<RootResult>,
        settings: Settings,
        auto_enabled: bool,
    },
    /// One-line user notification.
    Notice { level: NoticeLevel, message: String },
    Terminals { terminals: Vec<TerminalInfo> },
}

impl HostMessage {
    pub fn info(message: impl Into<String>) -> Self {
        HostMessage::Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        HostMessage::Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
