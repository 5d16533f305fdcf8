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

//! Core data model: clusters, node registrations, groups, and the canonical
//! encoding used to persist them.

use bincode::Options;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Canonical serialization error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Value could not be serialized.
    #[error("serialization")]
    Serialize,
    /// Bytes could not be deserialized.
    #[error("deserialization")]
    Deserialize,
    /// Decoded value would exceed the configured size limit.
    #[error("size limit exceeded")]
    TooLarge,
}

/// Canonical bincode options (deterministic, fixed-width integers).
fn bincode_opts() -> impl Options {
    // Fixint encoding provides a stable on-disk representation.
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encode a value for storage with deterministic rules.
pub fn encode_canonical<T: Serialize>(v: &T) -> Result<Vec<u8>, CodecError> {
    bincode_opts()
        .serialize(v)
        .map_err(|_| CodecError::Serialize)
}

/// Decode a stored value with a hard size cap, defending against a corrupted
/// or hostile on-disk blob inflating an unbounded container length.
pub fn decode_canonical_limited<T: DeserializeOwned>(
    bytes: &[u8],
    max: usize,
) -> Result<T, CodecError> {
    if bytes.len() > max {
        return Err(CodecError::TooLarge);
    }
    bincode_opts()
        .with_limit(max as u64)
        .deserialize(bytes)
        .map_err(|_| CodecError::Deserialize)
}

/// Upper bound on a stored node registration's encoded size (payload cap
/// plus nonce prefix plus encoding overhead for the surrounding fields).
pub const MAX_STORED_REGISTRATION_BYTES: usize = 32 * 1024;

/// Maximum accepted `encrypted_payload` size, before the server-bound nonce
/// is prepended, per the admission handler's payload-size check.
pub const MAX_PAYLOAD_BYTES: usize = 10 * 1024;

/// Length in bytes of the server-bound nonce prefix.
pub const NONCE_LEN: usize = 4;

/// Maximum length of `version_name`, counted in `char`s (the nearest
/// faithful analogue of the original service's UTF-16 code-unit bound).
pub const MAX_VERSION_NAME_CHARS: usize = 255;

/// Cluster identifier: a 128-bit id, the primary key of a `Cluster` row.
pub type ClusterId = Uuid;

/// Parse a cluster id from its 36-character textual form.
pub fn parse_cluster_id(text: &str) -> Option<ClusterId> {
    Uuid::parse_str(text).ok()
}

/// A registered cluster: its id and the asymmetric public key bound to it.
///
/// `public_key` is an opaque, self-describing SPKI (DER) encoding of an
/// ECDSA P-256 public key. The registry never inspects it beyond curve
/// validity; it stores the bytes verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Primary key.
    pub cluster_id: ClusterId,
    /// SPKI-encoded ECDSA P-256 public key, stored verbatim.
    pub public_key: Vec<u8>,
}

/// The logical partition nodes are isolated under for discovery.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    /// Owning cluster.
    pub cluster_id: ClusterId,
    /// Deployment/version label, as supplied by the caller.
    pub version_name: String,
    /// Version ordinal; negative values are permitted.
    pub version_number: i64,
}

impl GroupKey {
    /// Construct a group key.
    pub fn new(cluster_id: ClusterId, version_name: impl Into<String>, version_number: i64) -> Self {
        Self {
            cluster_id,
            version_name: version_name.into(),
            version_number,
        }
    }
}

/// One persisted discovery registration. Immutable once written; the only
/// party that ever deletes a row is the eviction worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRegistration {
    /// Surrogate id, assigned on insert, monotonically increasing per store.
    pub id: i64,
    /// Owning cluster.
    pub cluster_id: ClusterId,
    /// Deployment/version label.
    pub version_name: String,
    /// Version ordinal.
    pub version_number: i64,
    /// `nonce (4 bytes) ‖ original encrypted payload`, opaque to the server.
    pub encrypted_payload: Vec<u8>,
    /// Server-assigned monotonic ordinal, used only for relative ordering.
    pub server_timestamp: i64,
}

impl NodeRegistration {
    /// The group this registration belongs to.
    pub fn group(&self) -> GroupKey {
        GroupKey::new(self.cluster_id, self.version_name.clone(), self.version_number)
    }
}
