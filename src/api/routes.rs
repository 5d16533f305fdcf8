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

//! Route handlers: the thin HTTP shell around the core's admission
//! pipeline and registrar.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::instrument;

use crate::api::dto::{
    discover_response_status, register_response, DiscoverRequestBody, DiscoverResponseBody,
    ErrorBody, RegisterClusterRequest,
};
use crate::core::admission::{self, DiscoverOutcome, DiscoverRequest};
use crate::core::eviction::EvictionHint;
use crate::core::registrar;
use crate::core::security::replay_cache::ReplayCache;
use crate::core::state::{ClusterStore, NodeRegistrationStore};
use crate::monitoring::Metrics;

/// Shared application state, cloned (cheaply, via `Arc`) into every request.
#[derive(Clone)]
pub struct AppState {
    /// Cluster store.
    pub clusters: Arc<dyn ClusterStore>,
    /// Node registration store.
    pub nodes: Arc<dyn NodeRegistrationStore>,
    /// Anti-replay cache.
    pub replay_cache: Arc<ReplayCache>,
    /// Eviction hint producer.
    pub eviction_hints: tokio::sync::mpsc::UnboundedSender<EvictionHint>,
    /// Configured `MaxPerGroup`.
    pub max_per_group: usize,
    /// Metrics registry.
    pub metrics: Arc<Metrics>,
}

/// `POST /clusters`.
#[instrument(skip_all)]
pub async fn register_cluster(
    State(state): State<AppState>,
    Json(body): Json<RegisterClusterRequest>,
) -> impl IntoResponse {
    let outcome = match registrar::register(
        state.clusters.as_ref(),
        &body.cluster_id,
        &body.public_key,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(error = %err, "cluster store unavailable");
            state
                .metrics
                .cluster_registrations_total
                .with_label_values(&["internal_error"])
                .inc();
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "internal_error",
                }),
            )
                .into_response();
        }
    };

    let (status, token) = register_response(&outcome);
    state
        .metrics
        .cluster_registrations_total
        .with_label_values(&[token])
        .inc();

    if status.is_success() {
        status.into_response()
    } else {
        (status, Json(ErrorBody { error: token })).into_response()
    }
}

/// `POST /discover`.
#[instrument(skip_all)]
pub async fn discover(
    State(state): State<AppState>,
    Json(body): Json<DiscoverRequestBody>,
) -> impl IntoResponse {
    let req = DiscoverRequest {
        cluster_id: body.cluster_id,
        version_name: body.version_name,
        version_number: body.version_number,
        payload_base64: body.payload,
        nonce_base64: body.nonce,
        signature_base64: body.signature,
    };

    let outcome = match admission::admit(
        state.clusters.as_ref(),
        state.nodes.as_ref(),
        &state.replay_cache,
        &state.eviction_hints,
        state.max_per_group,
        &req,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(error = %err, "storage layer unavailable during discover");
            state
                .metrics
                .discover_requests_total
                .with_label_values(&["internal_error"])
                .inc();
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "internal_error",
                }),
            )
                .into_response();
        }
    };

    let (status, token) = discover_response_status(&outcome);
    state
        .metrics
        .discover_requests_total
        .with_label_values(&[token])
        .inc();
    if matches!(outcome, DiscoverOutcome::Success { .. }) {
        tracing::info!(status = token, "discover admitted");
    } else {
        tracing::warn!(status = token, "discover rejected");
    }
    if matches!(outcome, DiscoverOutcome::ReplayAttackDetected) {
        state
            .metrics
            .replay_dropped_total
            .with_label_values(&["replay_attack_detected"])
            .inc();
    }

    match outcome {
        DiscoverOutcome::Success { nodes } => {
            (status, Json(DiscoverResponseBody { nodes })).into_response()
        }
        _ => (status, Json(ErrorBody { error: token })).into_response(),
    }
}

/// `GET /healthz`: a liveness probe with no dependency on the storage
/// layer, so a slow store never fails the probe.
#[instrument(skip_all)]
pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

/// `GET /metrics`: Prometheus text exposition.
#[instrument(skip_all)]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}
