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

//! The discovery admission handler: the twelve-step pipeline that
//! authenticates, persists, and answers a `/discover` request.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::core::eviction::EvictionHint;
use crate::core::security::crypto;
use crate::core::security::replay_cache::ReplayCache;
use crate::core::state::{ClusterStore, NewNodeRegistration, NodeRegistrationStore, StoreError};
use crate::core::types::{
    parse_cluster_id, GroupKey, MAX_PAYLOAD_BYTES, MAX_VERSION_NAME_CHARS, NONCE_LEN,
};

/// The inbound discovery request, exactly as received from the wire.
#[derive(Clone, Debug)]
pub struct DiscoverRequest {
    /// 36-character textual cluster id.
    pub cluster_id: String,
    /// Caller-supplied version label.
    pub version_name: String,
    /// Caller-supplied version ordinal.
    pub version_number: i64,
    /// Base64 text of the encrypted payload.
    pub payload_base64: String,
    /// Base64 text of the 4-byte server-bound nonce.
    pub nonce_base64: String,
    /// Base64 text of the ECDSA-P256/SHA-256 signature.
    pub signature_base64: String,
}

/// Outcome of the admission pipeline. Maps 1:1 to the HTTP surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiscoverOutcome {
    /// Admitted; carries the peer payloads (already base64-encoded) to
    /// return to the caller.
    Success { nodes: Vec<String> },
    /// `cluster_id` does not reference a known cluster.
    ClusterNotFound,
    /// `cluster_id` was not a well-formed 128-bit identifier.
    InvalidGuidFormat,
    /// `payload`, `nonce`, or `signature` did not base64-decode.
    InvalidBase64,
    /// The decoded nonce was not exactly [`NONCE_LEN`] bytes.
    InvalidNonceSize,
    /// The decoded payload exceeded [`MAX_PAYLOAD_BYTES`].
    PayloadTooLarge,
    /// `version_name` was empty (or exceeded the length bound).
    InvalidPayload,
    /// The fingerprint `(nonce, signature)` was already seen this window.
    ReplayAttackDetected,
    /// Signature verification failed against the cluster's stored key.
    SignatureVerificationFailed,
}

/// Build the exact byte string the client signs: the UTF-8 concatenation
/// of the five fields, no separators, no whitespace.
fn signed_message(
    cluster_id_text: &str,
    version_name: &str,
    version_number: i64,
    payload_base64: &str,
    nonce_base64: &str,
) -> Vec<u8> {
    let mut msg = String::with_capacity(
        cluster_id_text.len()
            + version_name.len()
            + 20
            + payload_base64.len()
            + nonce_base64.len(),
    );
    msg.push_str(cluster_id_text);
    msg.push_str(version_name);
    msg.push_str(&version_number.to_string());
    msg.push_str(payload_base64);
    msg.push_str(nonce_base64);
    msg.into_bytes()
}

/// Run the twelve-step admission pipeline against `req`.
///
/// Step order is load-bearing: later checks assume earlier ones passed
/// (signature verification needs the cluster's public key from step 2;
/// the replay check at step 7 must record the fingerprint even when a
/// later step fails, so it runs before signature verification, not after).
pub async fn admit(
    clusters: &dyn ClusterStore,
    nodes: &dyn NodeRegistrationStore,
    replay_cache: &ReplayCache,
    eviction_hints: &tokio::sync::mpsc::UnboundedSender<EvictionHint>,
    max_per_group: usize,
    req: &DiscoverRequest,
) -> Result<DiscoverOutcome, StoreError> {
    // 1. Parse cluster_id.
    let Some(cluster_id) = parse_cluster_id(&req.cluster_id) else {
        return Ok(DiscoverOutcome::InvalidGuidFormat);
    };

    // 2. Lookup cluster.
    let Some(cluster) = clusters.get(cluster_id).await? else {
        return Ok(DiscoverOutcome::ClusterNotFound);
    };

    // 3. Decode base64 of payload, nonce, signature.
    let (Ok(payload_bytes), Ok(nonce_bytes), Ok(signature_bytes)) = (
        BASE64.decode(&req.payload_base64),
        BASE64.decode(&req.nonce_base64),
        BASE64.decode(&req.signature_base64),
    ) else {
        return Ok(DiscoverOutcome::InvalidBase64);
    };

    // 4. Nonce length.
    if nonce_bytes.len() != NONCE_LEN {
        return Ok(DiscoverOutcome::InvalidNonceSize);
    }

    // 5. Payload size.
    if payload_bytes.len() > MAX_PAYLOAD_BYTES {
        return Ok(DiscoverOutcome::PayloadTooLarge);
    }

    // 6. version_name non-empty (and within the length bound).
    if req.version_name.is_empty() || req.version_name.chars().count() > MAX_VERSION_NAME_CHARS {
        return Ok(DiscoverOutcome::InvalidPayload);
    }

    // 7. Anti-replay check. Recorded regardless of what happens next.
    let fresh = replay_cache.check_and_record(&req.nonce_base64, &req.signature_base64);
    if !fresh {
        return Ok(DiscoverOutcome::ReplayAttackDetected);
    }

    // 8. Signature verification.
    let message = signed_message(
        &req.cluster_id,
        &req.version_name,
        req.version_number,
        &req.payload_base64,
        &req.nonce_base64,
    );
    if !crypto::verify(&cluster.public_key, &message, &signature_bytes) {
        return Ok(DiscoverOutcome::SignatureVerificationFailed);
    }

    let group = GroupKey::new(cluster_id, req.version_name.clone(), req.version_number);

    // 9. Read peers before the write, so the caller never sees its own row.
    let peers = nodes.peers(&group, max_per_group).await?;

    // 10. Persist registration.
    let mut encrypted_payload = Vec::with_capacity(NONCE_LEN + payload_bytes.len());
    encrypted_payload.extend_from_slice(&nonce_bytes);
    encrypted_payload.extend_from_slice(&payload_bytes);
    nodes
        .insert(NewNodeRegistration {
            cluster_id,
            version_name: req.version_name.clone(),
            version_number: req.version_number,
            encrypted_payload,
        })
        .await?;

    // 11. Enqueue eviction hint, fire-and-forget.
    let _ = eviction_hints.send(EvictionHint {
        cluster_id,
        version_name: req.version_name.clone(),
        version_number: req.version_number,
    });

    // 12. Respond with the peer payloads as base64 text.
    let node_payloads = peers
        .into_iter()
        .map(|row| BASE64.encode(row.encrypted_payload))
        .collect();

    Ok(DiscoverOutcome::Success {
        nodes: node_payloads,
    })
}
