use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::controller::ControllerConfig;
use crate::dialect::DEFAULT_WINDOW_TITLE;
use crate::scanner::ScanOptions;

/// Background host for the One Workflow sidebar: scans for runnable
/// projects and performs launches, port kills and automated keystrokes on
/// behalf of the UI.
#[derive(Debug, Clone, Parser)]
#[command(name = "one-workflow", version = env!("ONE_WORKFLOW_VERSION"))]
pub struct DaemonConfig {
    /// Unix socket to listen on [default: $XDG_RUNTIME_DIR/one-workflow.sock]
    #[arg(long, env = "ONE_WORKFLOW_SOCKET")]
    pub socket: Option<PathBuf>,

    /// Where settings and project roots are persisted
    /// [default: <config dir>/one-workflow/state.json]
    #[arg(long, env = "ONE_WORKFLOW_STATE")]
    pub state_file: Option<PathBuf>,

    /// Root scanned when no project roots are configured [default: current dir]
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Milliseconds between automated keystrokes
    #[arg(long, default_value_t = 5000)]
    pub interval_ms: u64,

    /// Title of the window that receives the automated keystroke
    #[arg(long, default_value = DEFAULT_WINDOW_TITLE)]
    pub window_title: String,

    /// Stop descending this many directories below each root
    #[arg(long)]
    pub max_depth: Option<usize>,
}

/// Default socket path, under `$XDG_RUNTIME_DIR` or `/tmp`.
pub fn default_socket_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join("one-workflow.sock")
}

impl DaemonConfig {
    pub fn socket_path(&self) -> PathBuf {
        self.socket
            .clone()
            .unwrap_or_else(default_socket_path)
    }

    pub fn state_file(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(crate::settings::state_file_path)
    }

    pub fn controller(&self) -> ControllerConfig {
        let workspace = self
            .workspace
            .clone()
            .or_else(|| std::env::current_dir().ok());
        ControllerConfig {
            workspace,
            // Zero would spin the timer thread.
            interval: Duration::from_millis(self.interval_ms.max(1)),
            window_title: self.window_title.clone(),
            scan: ScanOptions {
                max_depth: self.max_depth,
            },
        }
    }
}
