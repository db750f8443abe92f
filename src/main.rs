use clap::Parser;
use tracing_subscriber::EnvFilter;

use one_workflow::config::DaemonConfig;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("one_workflow=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = DaemonConfig::parse();
    tracing::info!(
        "one-workflow {} ({})",
        env!("ONE_WORKFLOW_VERSION"),
        env!("ONE_WORKFLOW_COMMIT")
    );
    run(config)
}

#[cfg(unix)]
fn run(config: DaemonConfig) -> anyhow::Result<()> {
    use std::sync::Arc;

    use anyhow::Context;
    use futures::channel::mpsc;
    use futures::executor::block_on_stream;

    use one_workflow::controller::{Controller, SystemEffects, TickSink};
    use one_workflow::dialect;
    use one_workflow::ipc::{self, Event};
    use one_workflow::settings::StateStore;

    let (tx, rx) = mpsc::unbounded::<Event>();

    let socket = config.socket_path();
    ipc::spawn_listener(&socket, tx.clone())
        .with_context(|| format!("failed to bind socket {}", socket.display()))?;

    let tick_sink: TickSink = Arc::new(move |generation: u64| {
        tx.unbounded_send(Event::AutomationTick(generation)).is_ok()
    });

    let mut controller = Controller::new(
        config.controller(),
        StateStore::new(config.state_file()),
        dialect::detect(),
        SystemEffects::default(),
        tick_sink,
    );

    // The tick sink holds a sender, so the stream never ends: the host runs
    // until the process is killed.
    for event in block_on_stream(rx) {
        match event {
            Event::Request { message, reply } => {
                let replies = controller.handle(message);
                reply.send(&replies);
            }
            Event::AutomationTick(generation) => controller.on_automation_tick(generation),
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn run(_config: DaemonConfig) -> anyhow::Result<()> {
    anyhow::bail!("one-workflow listens on a Unix socket, which this platform lacks")
}
