use ring_kv::clock::RoundClock;
use ring_kv::config::NodeConfig;
use ring_kv::membership::SharedMembership;
use ring_kv::node::Node;
use ring_kv::server::{NodeRuntime, router};
use ring_kv::storage::{FanoutSink, OutcomeJournal, QuorumOnly, TracingSink};
use ring_kv::transport::UdpTransport;

use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: ring-kv --bind <addr:port> [--peer <addr:port>]... [--http <addr:port>]");
        eprintln!("                [--round-ms <ms>] [--timeout-rounds <n>]");
        eprintln!("Example: ring-kv --bind 127.0.0.1:5000 --peer 127.0.0.1:5001 --peer 127.0.0.1:5002");
        return Ok(());
    }

    let config = NodeConfig::from_env()?.with_args(&args)?;
    config.validate()?;

    let local = config.local_address();
    let members = config.members();
    tracing::info!("Starting node {} with {} initial member(s)", local, members.len());
    if members.len() < 3 {
        tracing::warn!("Fewer than 3 members: requests are refused until more join");
    }

    // 1. Transport (UDP):
    let transport = UdpTransport::bind(config.bind).await?;

    // 2. Outcome log. Everything goes to tracing; only quorum decisions reach
    //    the bounded journal behind /txn:
    let journal = OutcomeJournal::bounded(config.journal_capacity);
    let sink = Arc::new(
        FanoutSink::new()
            .with(Arc::new(TracingSink))
            .with(Arc::new(QuorumOnly::new(journal.clone()))),
    );

    // 3. Node and its runtime:
    let membership = SharedMembership::new(members);
    let clock = RoundClock::new();
    let node = Node::new(
        local,
        transport,
        membership.clone(),
        sink,
        clock.clone(),
        config.transaction_timeout,
    );

    let (runtime, handle) = NodeRuntime::new(
        node,
        clock,
        membership,
        journal,
        Duration::from_millis(config.round_interval_ms),
    );
    runtime.spawn();

    // 4. HTTP client API:
    let app = router(handle);
    let http_addr = config.http_addr();

    tracing::info!("HTTP server listening on {}", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
