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

//! Axum router assembly and the HTTP listen loop.

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::routes::{discover, healthz, metrics, register_cluster, AppState};

/// Assemble the router: `/clusters`, `/discover`, `/healthz`, `/metrics`,
/// wrapped with request tracing and a permissive CORS policy (the client
/// population is untrusted and unauthenticated beyond per-request
/// signatures, so origin restriction buys nothing here).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/clusters", post(register_cluster))
        .route("/discover", post(discover))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `router` on `addr` until `shutdown` reports `true`.
pub async fn serve(
    addr: std::net::SocketAddr,
    router: Router,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await
}
