use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;

use futures::channel::mpsc;

use crate::error::Result;
use crate::protocol::{HostMessage, UiMessage};

/// Everything the event loop reacts to.
pub enum Event {
    /// A UI message plus the connection its replies go to.
    Request { message: UiMessage, reply: Reply },
    /// A tick from the automation schedule with this generation.
    AutomationTick(u64),
}

/// Write side of one client connection.
pub struct Reply {
    writer: Box<dyn Write + Send>,
}

impl Reply {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Box::new(writer),
        }
    }

    /// Send each message as one JSON line. A client that hung up is not an
    /// error worth more than a debug line.
    pub fn send(mut self, messages: &[HostMessage]) {
        for message in messages {
            let line = match serde_json::to_string(message) {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!("cannot encode reply: {e}");
                    continue;
                }
            };
            if let Err(e) = writeln!(self.writer, "{line}") {
                tracing::debug!("client went away: {e}");
                return;
            }
        }
        let _ = self.writer.flush();
    }
}

/// Bind the socket and forward each connection's request line into `tx`
/// from a background thread. A stale socket file is replaced.
pub fn spawn_listener(path: &Path, tx: mpsc::UnboundedSender<Event>) -> Result<()> {
    let _ = std::fs::remove_file(path);
    let listener = UnixListener::bind(path)?;
    tracing::info!("listening on {}", path.display());

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("accept failed: {e}");
                    continue;
                }
            };
            if let Some(event) = read_request(stream) {
                if tx.unbounded_send(event).is_err() {
                    tracing::debug!("event loop gone; listener exiting");
                    break;
                }
            }
        }
    });
    Ok(())
}

fn read_request(stream: UnixStream) -> Option<Event> {
    let writer = match stream.try_clone() {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!("cannot clone client stream: {e}");
            return None;
        }
    };
    let mut line = String::new();
    if let Err(e) = BufReader::new(stream).read_line(&mut line) {
        tracing::warn!("failed to read request: {e}");
        return None;
    }
    match parse_request(&line) {
        Ok(message) => Some(Event::Request {
            message,
            reply: Reply::new(writer),
        }),
        Err(e) => {
            tracing::warn!("bad request {:?}: {e}", line.trim());
            Reply::new(writer).send(&[HostMessage::error(format!("Bad request: {e}"))]);
            None
        }
    }
}

pub fn parse_request(line: &str) -> Result<UiMessage> {
    Ok(serde_json::from_str(line.trim())?)
}

/// Client side: send one message and collect every reply line until the
/// host closes the connection.
pub fn request(path: &Path, message: &UiMessage) -> Result<Vec<HostMessage>> {
    let mut stream = UnixStream::connect(path)?;
    let line = serde_json::to_string(message)?;
    writeln!(stream, "{line}")?;
    stream.flush()?;

    let mut replies = Vec::new();
    for line in BufReader::new(stream).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        replies.push(serde_json::from_str(&line)?);
    }
    Ok(replies)
}
