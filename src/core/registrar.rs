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

//! The cluster registrar: trust-on-first-use key binding with idempotent
//! re-registration.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::core::security::crypto;
use crate::core::state::{ClusterStore, StoreError};
use crate::core::types::{parse_cluster_id, Cluster};

/// Outcome of a registration attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The cluster id was unused; the key is now bound to it.
    Created,
    /// The cluster id was already bound to byte-identical key material.
    AlreadyExists,
    /// The cluster id is bound to a different key; the request is rejected.
    PublicKeyMismatch,
    /// `cluster_id` was not a well-formed 128-bit identifier.
    InvalidGuidFormat,
    /// `public_key` did not base64-decode to a valid P-256 public key.
    InvalidPublicKey,
}

/// Register `(cluster_id_text, public_key_base64)` against `store`, per
/// §4.2's four-step procedure.
pub async fn register(
    store: &dyn ClusterStore,
    cluster_id_text: &str,
    public_key_base64: &str,
) -> Result<RegisterOutcome, StoreError> {
    let Some(cluster_id) = parse_cluster_id(cluster_id_text) else {
        return Ok(RegisterOutcome::InvalidGuidFormat);
    };

    let Ok(public_key) = BASE64.decode(public_key_base64) else {
        return Ok(RegisterOutcome::InvalidPublicKey);
    };

    if !crypto::validate_public_key(&public_key) {
        return Ok(RegisterOutcome::InvalidPublicKey);
    }

    if let Some(existing) = store.get(cluster_id).await? {
        return Ok(if existing.public_key == public_key {
            RegisterOutcome::AlreadyExists
        } else {
            RegisterOutcome::PublicKeyMismatch
        });
    }

    let inserted = store
        .add(Cluster {
            cluster_id,
            public_key: public_key.clone(),
        })
        .await?;

    if inserted {
        return Ok(RegisterOutcome::Created);
    }

    // Lost the uniqueness race between our `get` miss and `add`: the
    // storage layer's atomicity guarantee is authoritative here, so defer
    // to whatever the winner actually persisted.
    match store.get(cluster_id).await? {
        Some(existing) if existing.public_key == public_key => Ok(RegisterOutcome::AlreadyExists),
        Some(_) => Ok(RegisterOutcome::PublicKeyMismatch),
        None => Err(StoreError::Unavailable),
    }
}
