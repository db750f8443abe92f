use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};

use one_workflow::config::default_socket_path;
#[cfg(unix)]
use one_workflow::ipc;
use one_workflow::protocol::{HostMessage, NoticeLevel, UiMessage};
use one_workflow::settings::Settings;
use one_workflow::view_state::{Modifier, ViewAction, ViewState};

/// Send a request to a running one-workflow host and print its replies.
#[derive(Debug, Parser)]
#[command(name = "one-workflow-ctl", version = env!("ONE_WORKFLOW_VERSION"))]
struct Cli {
    /// Host socket [default: $XDG_RUNTIME_DIR/one-workflow.sock]
    #[arg(long, env = "ONE_WORKFLOW_SOCKET", global = true)]
    socket: Option<PathBuf>,

    /// Print raw reply lines instead of a summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rescan project roots and list runnable projects
    Refresh,
    /// Open a terminal in a project directory and run a command there
    Launch {
        path: PathBuf,
        /// Terminal name [default: directory name]
        #[arg(long)]
        name: Option<String>,
        /// Command to type [default: the configured launch command]
        #[arg(long)]
        cmd: Option<String>,
    },
    /// Reveal a directory in the file browser
    OpenDir { path: PathBuf },
    /// Copy a path to the clipboard
    Copy { path: String },
    /// Turn the automated keystroke on or off
    Auto { state: Toggle },
    /// Kill the process listening on a TCP port
    KillPort { port: String },
    /// Pair an Android device over Wi-Fi
    AdbPair { target: String, code: String },
    /// Replace the list of scanned roots
    Roots { roots: Vec<PathBuf> },
    /// List terminals opened by the host
    Terminals,
    /// Edit settings; unspecified fields keep their stored values
    Settings {
        /// Key pressed by automation, e.g. F9 or a
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        ctrl: Option<bool>,
        #[arg(long)]
        shift: Option<bool>,
        #[arg(long)]
        alt: Option<bool>,
        #[arg(long)]
        launch_command: Option<String>,
        #[arg(long)]
        shell: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("one-workflow-ctl: {e:#}");
            process::exit(1);
        }
    }
}

#[cfg(not(unix))]
fn run(_cli: Cli) -> anyhow::Result<bool> {
    bail!("one-workflow-ctl talks over a Unix socket, which this platform lacks")
}

/// Returns `false` when the host answered with an error notice.
#[cfg(unix)]
fn run(cli: Cli) -> anyhow::Result<bool> {
    let socket = cli.socket.clone().unwrap_or_else(default_socket_path);

    let message = match cli.command {
        Command::Refresh => UiMessage::Refresh,
        Command::Launch { path, name, cmd } => {
            let name = match name {
                Some(n) => n,
                None => path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
            };
            let cmd = match cmd {
                Some(c) => c,
                None => current_settings(&socket)?.0.launch_command,
            };
            UiMessage::Launch { name, path, cmd }
        }
        Command::OpenDir { path } => UiMessage::OpenDir { path },
        Command::Copy { path } => UiMessage::CopyLog { path },
        Command::Auto { state } => UiMessage::ToggleAuto {
            enabled: matches!(state, Toggle::On),
        },
        Command::KillPort { port } => UiMessage::KillPort { port },
        Command::AdbPair { target, code } => UiMessage::AdbPair { code, target },
        Command::Roots { roots } => UiMessage::SetRoots {
            roots: roots.iter().map(|r| absolute(r)).collect(),
        },
        Command::Terminals => UiMessage::Terminals,
        Command::Settings {
            key,
            ctrl,
            shift,
            alt,
            launch_command,
            shell,
        } => {
            let (settings, auto_enabled) = current_settings(&socket)?;
            let mut actions = vec![ViewAction::Open];
            actions.extend(key.map(ViewAction::KeyPressed));
            actions.extend(ctrl.map(|on| ViewAction::SetModifier(Modifier::Ctrl, on)));
            actions.extend(shift.map(|on| ViewAction::SetModifier(Modifier::Shift, on)));
            actions.extend(alt.map(|on| ViewAction::SetModifier(Modifier::Alt, on)));
            actions.extend(launch_command.map(ViewAction::SetLaunchCommand));
            actions.extend(shell.map(ViewAction::SetDefaultShell));
            UiMessage::SaveSettings {
                settings: edit_settings(&settings, auto_enabled, actions),
            }
        }
    };

    let replies = ipc::request(&socket, &message)
        .with_context(|| format!("one-workflow not reachable at {}", socket.display()))?;
    let mut ok = true;
    for reply in &replies {
        if cli.json {
            println!("{}", serde_json::to_string(reply)?);
        } else {
            print_reply(reply);
        }
        if matches!(reply, HostMessage::Notice { level: NoticeLevel::Error, .. }) {
            ok = false;
        }
    }
    Ok(ok)
}

#[cfg(unix)]
fn current_settings(socket: &Path) -> anyhow::Result<(Settings, bool)> {
    let replies = ipc::request(socket, &UiMessage::Refresh)
        .with_context(|| format!("one-workflow not reachable at {}", socket.display()))?;
    for reply in replies {
        if let HostMessage::Projects {
            settings,
            auto_enabled,
            ..
        } = reply
        {
            return Ok((settings, auto_enabled));
        }
    }
    bail!("host did not report its settings")
}

fn edit_settings(settings: &Settings, auto_enabled: bool, actions: Vec<ViewAction>) -> Settings {
    let mut view = ViewState::from_settings(settings, auto_enabled);
    for action in actions {
        view.apply(action);
    }
    view.save()
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn print_reply(reply: &HostMessage) {
    match reply {
        HostMessage::Projects {
            projects,
            settings,
            auto_enabled,
        } => {
            for root in projects {
                println!("{}", root.root.display());
                if root.items.is_empty() {
                    println!("  (no runnable projects)");
                }
                for project in &root.items {
                    let scripts: Vec<&str> = project.scripts.keys().map(String::as_str).collect();
                    println!(
                        "  {:<24} {}  [{}]",
                        project.name,
                        project.path.display(),
                        scripts.join(", ")
                    );
                }
            }
            println!(
                "automation: {} (key {}), launch: {}, shell: {}",
                if *auto_enabled { "on" } else { "off" },
                settings.automation_key,
                settings.launch_command,
                settings.default_shell
            );
        }
        HostMessage::Notice { level, message } => match level {
            NoticeLevel::Info => println!("{message}"),
            NoticeLevel::Error => eprintln!("error: {message}"),
        },
        HostMessage::Terminals { terminals } => {
            if terminals.is_empty() {
                println!("no terminals");
            }
            for terminal in terminals {
                let state = match (terminal.running, terminal.exit_code) {
                    (true, _) => "running".to_string(),
                    (false, Some(code)) => format!("exited {code}"),
                    (false, None) => "exited".to_string(),
                };
                let pid = terminal
                    .pid
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{} (pid {pid}, {state}) {}", terminal.name, terminal.shell);
                for line in &terminal.screen {
                    println!("  | {line}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_edit_keeps_unspecified_fields() {
        let stored = Settings {
            automation_key: "^{F9}".into(),
            launch_command: "pnpm dev".into(),
            default_shell: "/bin/zsh".into(),
        };
        let edited = edit_settings(
            &stored,
            false,
            vec![
                ViewAction::Open,
                ViewAction::KeyPressed("F8".into()),
                ViewAction::SetModifier(Modifier::Shift, true),
            ],
        );
        assert_eq!(edited.automation_key, "^+{F8}");
        assert_eq!(edited.launch_command, "pnpm dev");
        assert_eq!(edited.default_shell, "/bin/zsh");
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["one-workflow-ctl", "auto", "on"]).expect("parses");
        assert!(matches!(cli.command, Command::Auto { state: Toggle::On }));

        let cli = Cli::try_parse_from(["one-workflow-ctl", "--json", "kill-port", "5173"])
            .expect("parses");
        assert!(cli.json);
        assert!(matches!(cli.command, Command::KillPort { ref port } if port == "5173"));
    }
}
