use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use portable_pty::{Child, ChildKiller, CommandBuilder, MasterPty, PtySize, native_pty_system};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const ROWS: u16 = 24;
const COLS: u16 = 120;
const SCROLLBACK: usize = 500;

/// Lines of screen text kept in a snapshot.
pub const SNAPSHOT_LINES: usize = 12;

/// A terminal to open: a shell in a directory with a command typed into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalSpec {
    pub name: String,
    pub cwd: Option<PathBuf>,
    pub shell: String,
    pub command: String,
}

/// What the UI sees of a launched terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalInfo {
    pub name: String,
    pub cwd: Option<PathBuf>,
    pub shell: String,
    pub pid: Option<u32>,
    pub running: bool,
    pub exit_code: Option<u32>,
    /// Last non-blank lines on screen.
    pub screen: Vec<String>,
}

struct TerminalSession {
    spec: TerminalSpec,
    child: Box<dyn Child + Send + Sync>,
    // Dropping the master closes the PTY.
    _master: Box<dyn MasterPty + Send>,
    // Held open so the shell keeps its stdin.
    _writer: Box<dyn Write + Send>,
    screen: Arc<Mutex<vt100::Parser>>,
    exit_code: Option<u32>,
}

/// Terminals launched by this host, in launch order.
#[derive(Default)]
pub struct Terminals {
    sessions: Vec<TerminalSession>,
}

impl Terminals {
    /// Open a PTY running the requested shell, then type the command into it.
    pub fn launch(&mut self, spec: TerminalSpec) -> Result<()> {
        let pty = native_pty_system()
            .openpty(PtySize {
                rows: ROWS,
                cols: COLS,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| Error::Pty(format!("failed to open PTY: {e}")))?;

        let mut cmd = CommandBuilder::new(&spec.shell);
        if let Some(ref cwd) = spec.cwd {
            cmd.cwd(cwd);
        }
        #[cfg(not(windows))]
        cmd.env("TERM", "xterm-256color");

        let child = pty
            .slave
            .spawn_command(cmd)
            .map_err(|e| Error::Pty(format!("failed to spawn '{}': {e}", spec.shell)))?;
        let mut writer = pty
            .master
            .take_writer()
            .map_err(|e| Error::Pty(format!("failed to get PTY writer: {e}")))?;
        let reader = pty
            .master
            .try_clone_reader()
            .map_err(|e| Error::Pty(format!("failed to get PTY reader: {e}")))?;

        let screen = Arc::new(Mutex::new(vt100::Parser::new(ROWS, COLS, SCROLLBACK)));
        spawn_reader_thread(reader, Arc::clone(&screen), spec.name.clone());

        if !spec.command.is_empty() {
            let line = if cfg!(windows) {
                format!("{}\r\n", spec.command)
            } else {
                format!("{}\r", spec.command)
            };
            writer.write_all(line.as_bytes())?;
            writer.flush()?;
        }

        tracing::info!(
            "terminal '{}' started (pid {:?}) in {:?}: {}",
            spec.name,
            child.process_id(),
            spec.cwd,
            spec.command
        );
        self.reap();
        self.sessions.retain(|s| s.exit_code.is_none());
        self.sessions.push(TerminalSession {
            spec,
            child,
            _master: pty.master,
            _writer: writer,
            screen,
            exit_code: None,
        });
        Ok(())
    }

    /// Report every terminal, then close the ones whose shell has exited.
    /// An exited terminal appears in exactly one snapshot.
    pub fn snapshot(&mut self) -> Vec<TerminalInfo> {
        self.reap();
        let infos: Vec<TerminalInfo> = self
            .sessions
            .iter()
            .map(|session| {
                let contents = match session.screen.lock() {
                    Ok(parser) => parser.screen().contents(),
                    Err(poisoned) => poisoned.into_inner().screen().contents(),
                };
                TerminalInfo {
                    name: session.spec.name.clone(),
                    cwd: session.spec.cwd.clone(),
                    shell: session.spec.shell.clone(),
                    pid: session.child.process_id(),
                    running: session.exit_code.is_none(),
                    exit_code: session.exit_code,
                    screen: tail_lines(&contents, SNAPSHOT_LINES),
                }
            })
            .collect();
        self.sessions.retain(|s| s.exit_code.is_none());
        infos
    }

    /// Record exit codes of shells that have finished.
    fn reap(&mut self) {
        for session in self.sessions.iter_mut().filter(|s| s.exit_code.is_none()) {
            match session.child.try_wait() {
                Ok(Some(status)) => {
                    tracing::info!(
                        "terminal '{}' exited (code {})",
                        session.spec.name,
                        status.exit_code()
                    );
                    session.exit_code = Some(status.exit_code());
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("error checking '{}': {e}", session.spec.name),
            }
        }
    }
}

impl Drop for Terminals {
    fn drop(&mut self) {
        for session in &mut self.sessions {
            if session.exit_code.is_none() {
                tracing::debug!("killing terminal '{}'", session.spec.name);
                let _ = session.child.kill();
            }
        }
    }
}

/// Feed PTY output into the session's screen until EOF.
fn spawn_reader_thread(
    mut reader: Box<dyn Read + Send>,
    screen: Arc<Mutex<vt100::Parser>>,
    name: String,
) {
    std::thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => match screen.lock() {
                    Ok(mut parser) => parser.process(&buf[..n]),
                    Err(_) => break,
                },
                Err(e) => {
                    tracing::debug!("terminal '{name}' read error: {e}");
                    break;
                }
            }
        }
        tracing::debug!("terminal reader done: {name}");
    });
}

/// Last `max` non-blank lines, right-trimmed.
pub fn tail_lines(contents: &str, max: usize) -> Vec<String> {
    let lines: Vec<String> = contents
        .lines()
        .map(|l| l.trim_end().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(max);
    lines[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_skips_blank_lines() {
        let contents = "$ pnpm dev\n\n  ready in 300ms   \n\n\n";
        assert_eq!(tail_lines(contents, 5), vec!["$ pnpm dev", "  ready in 300ms"]);
    }

    #[test]
    fn tail_keeps_only_the_end() {
        let contents = "1\n2\n3\n4";
        assert_eq!(tail_lines(contents, 2), vec!["3", "4"]);
        assert!(tail_lines("", 3).is_empty());
    }

    #[test]
    fn vt100_screen_strips_escape_sequences() {
        let mut parser = vt100::Parser::new(ROWS, COLS, 0);
        parser.process(b"\x1b[32mVITE\x1b[0m ready\r\n");
        assert_eq!(tail_lines(&parser.screen().contents(), 3), vec!["VITE ready"]);
    }

    #[test]
    fn no_terminals_no_snapshot() {
        assert!(Terminals::default().snapshot().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn exited_terminal_is_reported_once_then_closed() {
        let mut terminals = Terminals::default();
        terminals
            .launch(TerminalSpec {
                name: "short".into(),
                cwd: None,
                shell: "/bin/sh".into(),
                command: "exit 3".into(),
            })
            .expect("launch");

        let mut exited = None;
        for _ in 0..200 {
            let snapshot = terminals.snapshot();
            assert_eq!(snapshot.len(), 1);
            if !snapshot[0].running {
                exited = Some(snapshot[0].clone());
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(25));
        }
        let exited = exited.expect("shell exits");
        assert_eq!(exited.name, "short");
        assert_eq!(exited.exit_code, Some(3));
        assert!(terminals.snapshot().is_empty());
    }
}
