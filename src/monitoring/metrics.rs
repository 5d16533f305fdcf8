// Copyright (c) 2026 Noderegistry
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use prometheus::{IntCounterVec, IntGauge, Opts, Registry};
use thiserror::Error;

/// Metrics errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus")]
    Prom,
}

/// Metrics container, registered once at startup and shared behind an
/// `Arc` with every request handler and the eviction worker.
#[derive(Clone)]
pub struct Metrics {
    /// Registry exposed at `/metrics`.
    pub registry: Registry,

    /// `/discover` requests, labeled by outcome status token.
    pub discover_requests_total: IntCounterVec,
    /// Fingerprints rejected by the anti-replay cache.
    pub replay_dropped_total: IntCounterVec,
    /// Rows deleted by the eviction worker.
    pub evictions_total: IntCounterVec,
    /// `/clusters` registrations, labeled by outcome.
    pub cluster_registrations_total: IntCounterVec,
    /// Rows evicted by the most recently processed eviction hint (0 if
    /// that group was already within `MaxPerGroup`).
    pub groups_over_cap: IntGauge,
}

impl Metrics {
    /// Create and register metrics.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let discover_requests_total = IntCounterVec::new(
            Opts::new(
                "registry_discover_requests_total",
                "Discovery requests handled, by outcome",
            ),
            &["status"],
        )
        .map_err(|_| MetricsError::Prom)?;

        let replay_dropped_total = IntCounterVec::new(
            Opts::new(
                "registry_replay_dropped_total",
                "Requests dropped by the anti-replay cache",
            ),
            &["status"],
        )
        .map_err(|_| MetricsError::Prom)?;

        let evictions_total = IntCounterVec::new(
            Opts::new(
                "registry_evictions_total",
                "Node registrations deleted by the eviction worker",
            ),
            &["status"],
        )
        .map_err(|_| MetricsError::Prom)?;

        let cluster_registrations_total = IntCounterVec::new(
            Opts::new(
                "registry_cluster_registrations_total",
                "Cluster registration attempts, by outcome",
            ),
            &["status"],
        )
        .map_err(|_| MetricsError::Prom)?;

        let groups_over_cap = IntGauge::new(
            "registry_groups_over_cap",
            "Groups whose row count exceeded MaxPerGroup at last eviction scan",
        )
        .map_err(|_| MetricsError::Prom)?;

        registry
            .register(Box::new(discover_requests_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(replay_dropped_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(evictions_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(cluster_registrations_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(groups_over_cap.clone()))
            .map_err(|_| MetricsError::Prom)?;

        Ok(Self {
            registry,
            discover_requests_total,
            replay_dropped_total,
            evictions_total,
            cluster_registrations_total,
            groups_over_cap,
        })
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let families = self.registry.gather();
        let mut buf = Vec::new();
        encoder
            .encode(&families, &mut buf)
            .map_err(|_| MetricsError::Prom)?;
        String::from_utf8(buf).map_err(|_| MetricsError::Prom)
    }
}
