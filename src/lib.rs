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

//! A centralized discovery registry for nodes of independently operated
//! clusters.
//!
//! This crate provides:
//! - Signature-authenticated, anti-replay-protected discovery admission
//! - Trust-on-first-use cluster key binding
//! - Asynchronous, out-of-band eviction bounding per-group registration count
//! - Interchangeable in-memory and sled-backed storage
//! - An Axum HTTP surface, Prometheus metrics, and structured logging

/// Core protocol primitives: data model, admission pipeline, registrar,
/// anti-replay cache, eviction worker, crypto, and storage contract.
pub mod core;
/// HTTP surface: routes, DTOs, and router/server assembly.
pub mod api;
/// Configuration loading from environment variables and `.env`.
pub mod config;
/// Observability (metrics, structured logging helpers).
pub mod monitoring;
