use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::automation::{AutomationTimer, DEFAULT_INTERVAL};
use crate::commands::{ProcessCommand, adb_pair_line, parse_port};
use crate::dialect::{DEFAULT_WINDOW_TITLE, ShellDialect};
use crate::error::Result;
use crate::protocol::{HostMessage, UiMessage};
use crate::scanner::{ScanOptions, scan_roots};
use crate::settings::{DEFAULT_AUTOMATION_KEY, Settings, StateStore};
use crate::terminal::{TerminalInfo, TerminalSpec, Terminals};

/// Side effects the controller triggers. The real implementation talks to
/// the OS; tests record calls instead.
pub trait Effects {
    fn open_terminal(&mut self, spec: TerminalSpec) -> Result<()>;
    fn terminals(&mut self) -> Vec<TerminalInfo>;
    /// Run a command to completion.
    fn run(&mut self, command: ProcessCommand) -> Result<()>;
    /// Start a command and forget about it.
    fn run_detached(&mut self, command: ProcessCommand);
}

/// Effects backed by real PTYs and processes.
#[derive(Default)]
pub struct SystemEffects {
    terminals: Terminals,
}

impl Effects for SystemEffects {
    fn open_terminal(&mut self, spec: TerminalSpec) -> Result<()> {
        self.terminals.launch(spec)
    }

    fn terminals(&mut self) -> Vec<TerminalInfo> {
        self.terminals.snapshot()
    }

    fn run(&mut self, command: ProcessCommand) -> Result<()> {
        command.run()
    }

    fn run_detached(&mut self, command: ProcessCommand) {
        command.run_detached();
    }
}

/// Called from the timer thread with the schedule generation; returns
/// `false` once nobody is listening anymore.
pub type TickSink = Arc<dyn Fn(u64) -> bool + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Root used when no project roots are configured.
    pub workspace: Option<PathBuf>,
    pub interval: Duration,
    pub window_title: String,
    pub scan: ScanOptions,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            workspace: None,
            interval: DEFAULT_INTERVAL,
            window_title: DEFAULT_WINDOW_TITLE.to_string(),
            scan: ScanOptions::default(),
        }
    }
}

/// Owns the settings store and the automation schedule, and routes UI
/// messages to side effects.
pub struct Controller<E: Effects> {
    config: ControllerConfig,
    store: StateStore,
    dialect: Box<dyn ShellDialect>,
    effects: E,
    automation: AutomationTimer,
    tick_sink: TickSink,
}

impl<E: Effects> Controller<E> {
    pub fn new(
        config: ControllerConfig,
        store: StateStore,
        dialect: Box<dyn ShellDialect>,
        effects: E,
        tick_sink: TickSink,
    ) -> Self {
        tracing::info!(
            "controller ready (dialect {}, state {})",
            dialect.name(),
            store.path().display()
        );
        Self {
            config,
            store,
            dialect,
            effects,
            automation: AutomationTimer::new(),
            tick_sink,
        }
    }

    pub fn auto_enabled(&self) -> bool {
        self.automation.is_running()
    }

    /// Dispatch one UI message and return what should be sent back.
    pub fn handle(&mut self, message: UiMessage) -> Vec<HostMessage> {
        tracing::debug!("handling {}", message.kind());
        let mut out = Vec::new();
        match message {
            UiMessage::Launch { name, path, cmd } => {
                let spec = TerminalSpec {
                    shell: self.dialect.resolve_shell(&self.store.settings().default_shell),
                    name,
                    cwd: Some(path),
                    command: cmd,
                };
                let name = spec.name.clone();
                if let Err(e) = self.effects.open_terminal(spec) {
                    tracing::error!("launch of '{name}' failed: {e}");
                    out.push(HostMessage::error(format!("Failed to launch {name}: {e}")));
                }
            }
            UiMessage::OpenDir { path } => {
                self.effects.run_detached(self.dialect.open_folder(&path));
            }
            UiMessage::CopyLog { path } => {
                if !path.is_empty() {
                    match self.effects.run(self.dialect.copy_to_clipboard(&path)) {
                        Ok(()) => out.push(HostMessage::info("Path copied to clipboard.")),
                        Err(e) => out.push(HostMessage::error(format!("Failed to copy path: {e}"))),
                    }
                }
            }
            UiMessage::SaveSettings { settings } => match self.store.save_settings(&settings) {
                Ok(()) => {
                    tracing::info!("settings saved: {settings:?}");
                    out.push(HostMessage::info("One Workflow settings updated."));
                    out.push(self.projects());
                }
                Err(e) => out.push(HostMessage::error(format!("Failed to save settings: {e}"))),
            },
            UiMessage::ToggleAuto { enabled } => {
                self.set_automation(enabled);
                out.push(self.projects());
            }
            UiMessage::Refresh => out.push(self.projects()),
            UiMessage::KillPort { port } => {
                let Some(port) = parse_port(port.trim()) else {
                    tracing::debug!("ignoring invalid port input {port:?}");
                    return out;
                };
                match self.effects.run(self.dialect.kill_port(port)) {
                    Ok(()) => out.push(HostMessage::info(format!("Port {port} killed successfully."))),
                    Err(e) => out.push(HostMessage::error(format!("Failed to kill port {port}: {e}"))),
                }
            }
            UiMessage::AdbPair { code, target } => {
                let Some(line) = adb_pair_line(&code, &target) else {
                    return out;
                };
                let spec = TerminalSpec {
                    name: "ADB Pair".to_string(),
                    cwd: None,
                    shell: self.dialect.resolve_shell(&self.store.settings().default_shell),
                    command: line,
                };
                if let Err(e) = self.effects.open_terminal(spec) {
                    out.push(HostMessage::error(format!("ADB Pair failed: {e}")));
                }
            }
            UiMessage::SetRoots { roots } => match self.store.save_project_roots(&roots) {
                Ok(()) => out.push(self.projects()),
                Err(e) => out.push(HostMessage::error(format!("Failed to save roots: {e}"))),
            },
            UiMessage::Terminals => out.push(HostMessage::Terminals {
                terminals: self.effects.terminals(),
            }),
        }
        out
    }

    /// Scan every root and bundle the result with current settings.
    pub fn projects(&self) -> HostMessage {
        let roots = self.store.project_roots(self.config.workspace.as_deref());
        let projects = scan_roots(&roots, self.config.scan);
        tracing::info!(
            "scanned {} root(s): {} project(s)",
            projects.len(),
            projects.iter().map(|r| r.items.len()).sum::<usize>()
        );
        HostMessage::Projects {
            projects,
            settings: self.store.settings(),
            auto_enabled: self.auto_enabled(),
        }
    }

    /// The only place the schedule changes: always cancel, then maybe
    /// start fresh.
    fn set_automation(&mut self, enabled: bool) {
        self.automation.stop();
        if enabled {
            let sink = Arc::clone(&self.tick_sink);
            self.automation
                .start(self.config.interval, move |generation| sink(generation));
        }
    }

    /// Send the configured keystroke, unless the tick belongs to a
    /// schedule that has since been cancelled.
    pub fn on_automation_tick(&mut self, generation: u64) {
        if !self.automation.is_current(generation) {
            tracing::debug!("dropping stale tick from schedule {generation}");
            return;
        }
        let settings: Settings = self.store.settings();
        let key = if settings.automation_key.is_empty() {
            DEFAULT_AUTOMATION_KEY
        } else {
            settings.automation_key.as_str()
        };
        tracing::debug!("sending {key} to '{}'", self.config.window_title);
        let command = self.dialect.send_keys(&self.config.window_title, key);
        self.effects.run_detached(command);
    }
}
