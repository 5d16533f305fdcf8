#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Node registry server entrypoint.
//!
//! Wires configuration, storage, metrics, the eviction worker, and the
//! HTTP surface together, then serves until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use noderegistry::api::{build_router, serve, AppState};
use noderegistry::config::Config;
use noderegistry::core::eviction;
use noderegistry::core::security::replay_cache::ReplayCache;
use noderegistry::core::state::{
    ClusterStore, InMemoryClusterStore, InMemoryNodeStore, NodeRegistrationStore, SledStores,
};
use noderegistry::monitoring::Metrics;

struct Stores {
    clusters: Arc<dyn ClusterStore>,
    nodes: Arc<dyn NodeRegistrationStore>,
}

fn open_stores(connection: &str) -> Stores {
    if connection.is_empty() {
        info!("no ConnectionStrings__DefaultConnection set; using in-memory stores");
        return Stores {
            clusters: Arc::new(InMemoryClusterStore::new()),
            nodes: Arc::new(InMemoryNodeStore::new()),
        };
    }

    info!(path = connection, "opening durable sled stores");
    match SledStores::open(connection) {
        Ok(sled) => {
            let SledStores { clusters, nodes, .. } = sled;
            Stores {
                clusters: Arc::new(clusters),
                nodes: Arc::new(nodes),
            }
        }
        Err(err) => {
            error!(error = %err, "failed to open sled store; falling back to in-memory");
            Stores {
                clusters: Arc::new(InMemoryClusterStore::new()),
                nodes: Arc::new(InMemoryNodeStore::new()),
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .compact()
        .try_init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    info!(
        host = %config.host,
        port = config.port,
        max_per_group = config.max_per_group,
        rate_limiting_disabled = config.rate_limiting_disabled,
        "noderegistry starting"
    );

    let Stores { clusters, nodes } = open_stores(&config.default_connection);
    let metrics = Arc::new(Metrics::new().expect("metrics init failed"));
    let replay_cache = Arc::new(ReplayCache::new(config.nonce_window));

    let (hint_tx, hint_rx) = tokio::sync::mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let eviction_worker = tokio::spawn(eviction::run(
        nodes.clone(),
        hint_rx,
        shutdown_rx.clone(),
        config.max_per_group,
        metrics.clone(),
    ));

    let state = AppState {
        clusters,
        nodes,
        replay_cache,
        eviction_hints: hint_tx,
        max_per_group: config.max_per_group,
        metrics,
    };
    let router = build_router(state);
    let addr = std::net::SocketAddr::new(config.host, config.port);

    let server = tokio::spawn(serve(addr, router, shutdown_rx));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    let _ = shutdown_tx.send(true);
    if let Err(err) = server.await {
        error!(error = %err, "http server task panicked");
    }
    if tokio::time::timeout(Duration::from_secs(5), eviction_worker)
        .await
        .is_err()
    {
        error!("eviction worker did not stop within the shutdown grace period");
    }
}
