use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// An OS command line to run outside any terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Text piped to the process's stdin, if any.
    pub stdin: Option<String>,
}

impl ProcessCommand {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ProcessCommand {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
        }
    }

    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Run to completion and fail on a non-zero exit.
    pub fn run(&self) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(if self.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let (Some(input), Some(mut pipe)) = (&self.stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes())?;
        }

        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::CommandFailed {
                program: self.program.clone(),
                status: status.to_string(),
            })
        }
    }

    /// Run on a background thread, logging the outcome only.
    pub fn run_detached(self) {
        std::thread::spawn(move || match self.run() {
            Ok(()) => tracing::debug!("{} finished", self.program),
            Err(e) => tracing::debug!("{e}"),
        });
    }
}

/// A TCP port typed by the user: exactly four or five ASCII digits.
pub fn parse_port(input: &str) -> Option<&str> {
    let valid = (4..=5).contains(&input.len()) && input.bytes().all(|b| b.is_ascii_digit());
    valid.then_some(input)
}

/// The command line typed into the pairing terminal.
pub fn adb_pair_line(code: &str, target: &str) -> Option<String> {
    let (code, target) = (code.trim(), target.trim());
    if code.is_empty() || target.is_empty() {
        return None;
    }
    Some(format!("adb pair {target} {code}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_requires_four_or_five_digits() {
        assert_eq!(parse_port("5173"), Some("5173"));
        assert_eq!(parse_port("65535"), Some("65535"));
        assert_eq!(parse_port("abc"), None);
        assert_eq!(parse_port("80"), None);
        assert_eq!(parse_port("123456"), None);
        assert_eq!(parse_port("51a3"), None);
        assert_eq!(parse_port(""), None);
    }

    #[test]
    fn port_rejects_non_ascii_digits() {
        assert_eq!(parse_port("５１７３"), None);
    }

    #[test]
    fn adb_pair_needs_both_fields() {
        assert_eq!(
            adb_pair_line("123456", "192.168.1.5:45678").as_deref(),
            Some("adb pair 192.168.1.5:45678 123456")
        );
        assert_eq!(adb_pair_line("", "192.168.1.5:45678"), None);
        assert_eq!(adb_pair_line("123456", "  "), None);
    }

    #[cfg(unix)]
    #[test]
    fn run_reports_exit_failure() {
        assert!(ProcessCommand::new("true", Vec::<String>::new()).run().is_ok());
        let err = ProcessCommand::new("false", Vec::<String>::new()).run().unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }

    #[test]
    fn run_reports_missing_program() {
        let err = ProcessCommand::new("definitely-not-a-real-binary-xyz", ["x"]).run().unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn stdin_is_piped() {
        ProcessCommand::new("cat", Vec::<String>::new())
            .with_stdin("hello")
            .run()
            .expect("cat reads stdin");
    }
}
