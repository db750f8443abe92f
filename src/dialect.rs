//! OS-specific command lines for the host's side channels.

use std::path::Path;

use crate::commands::ProcessCommand;
use crate::keys::KeyChord;

/// Window title the automation keystroke is aimed at.
pub const DEFAULT_WINDOW_TITLE: &str = "Visual Studio Code";

/// Builds the command lines whose shape depends on the host OS family.
pub trait ShellDialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Kill the process listening on `port` (already validated).
    fn kill_port(&self, port: &str) -> ProcessCommand;

    /// Focus the window whose title matches and send `encoded`, a key in
    /// SendKeys notation as stored in settings.
    fn send_keys(&self, window_title: &str, encoded: &str) -> ProcessCommand;

    fn open_folder(&self, path: &Path) -> ProcessCommand;

    /// Put `text` on the clipboard.
    fn copy_to_clipboard(&self, text: &str) -> ProcessCommand;

    /// Shell to run in a terminal given the configured one.
    fn resolve_shell(&self, configured: &str) -> String;
}

/// Windows: PowerShell for everything that needs scripting.
pub struct PowerShell;

/// Linux and macOS: bash pipelines and desktop tools.
pub struct Posix;

/// Pick the dialect for the platform this binary was built for.
pub fn detect() -> Box<dyn ShellDialect> {
    if cfg!(windows) {
        Box::new(PowerShell)
    } else {
        Box::new(Posix)
    }
}

/// Escape a value for a single-quoted PowerShell string.
fn ps_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl ShellDialect for PowerShell {
    fn name(&self) -> &'static str {
        "powershell"
    }

    fn kill_port(&self, port: &str) -> ProcessCommand {
        ProcessCommand::new(
            "powershell",
            [
                "-Command".to_string(),
                format!("Stop-Process -Id (Get-NetTCPConnection -LocalPort {port}).OwningProcess -Force"),
            ],
        )
    }

    /// SendKeys understands the stored notation natively, so it is passed
    /// through untouched.
    fn send_keys(&self, window_title: &str, encoded: &str) -> ProcessCommand {
        let script = format!(
            "$wshell = New-Object -ComObject WScript.Shell; if ($wshell.AppActivate({})) {{ $wshell.SendKeys({}) }}",
            ps_quote(window_title),
            ps_quote(encoded),
        );
        ProcessCommand::new("powershell", ["-Command".to_string(), script])
    }

    fn open_folder(&self, path: &Path) -> ProcessCommand {
        ProcessCommand::new("explorer", [path.display().to_string()])
    }

    fn copy_to_clipboard(&self, text: &str) -> ProcessCommand {
        ProcessCommand::new("clip", Vec::<String>::new()).with_stdin(text)
    }

    fn resolve_shell(&self, configured: &str) -> String {
        if configured.is_empty() {
            crate::settings::DEFAULT_SHELL.to_string()
        } else {
            configured.to_string()
        }
    }
}

impl ShellDialect for Posix {
    fn name(&self) -> &'static str {
        "posix"
    }

    fn kill_port(&self, port: &str) -> ProcessCommand {
        ProcessCommand::new(
            "bash",
            [
                "-c".to_string(),
                format!("lsof -i :{port} | grep LISTEN | awk '{{print $2}}' | xargs kill -9"),
            ],
        )
    }

    fn send_keys(&self, window_title: &str, encoded: &str) -> ProcessCommand {
        let chord = KeyChord::parse(encoded);
        ProcessCommand::new(
            "xdotool",
            [
                "search".to_string(),
                "--name".to_string(),
                window_title.to_string(),
                "windowactivate".to_string(),
                "--sync".to_string(),
                "key".to_string(),
                chord.to_xdotool(),
            ],
        )
    }

    fn open_folder(&self, path: &Path) -> ProcessCommand {
        let opener = if cfg!(target_os = "macos") { "open" } else { "xdg-open" };
        ProcessCommand::new(opener, [path.display().to_string()])
    }

    fn copy_to_clipboard(&self, text: &str) -> ProcessCommand {
        let tool = if cfg!(target_os = "macos") { "pbcopy" } else { "wl-copy" };
        ProcessCommand::new(tool, Vec::<String>::new()).with_stdin(text)
    }

    /// Windows shell names (`cmd.exe`, `powershell.exe`) mean nothing here;
    /// fall back to the login shell.
    fn resolve_shell(&self, configured: &str) -> String {
        if configured.is_empty() || configured.to_lowercase().ends_with(".exe") {
            std::env::var("SHELL").unwrap_or_else(|_| "/bin/bash".to_string())
        } else {
            configured.to_string()
        }
    }
}
