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

//! Byte-key encodings for the sled-backed store's composite index.
//!
//! Keys are built so that sled's native ascending byte-order iteration
//! doubles as the ordering the specification asks for: a prefix scan over
//! one group's keys visits rows oldest-first (ascending `server_timestamp`,
//! then ascending surrogate id).

use crate::core::types::{ClusterId, GroupKey};

/// Encode the id used as the primary key of the registrations tree.
pub fn registration_id_key(id: i64) -> [u8; 8] {
    id.to_be_bytes()
}

/// Decode a registration primary key back to its surrogate id.
pub fn decode_registration_id_key(bytes: &[u8]) -> Option<i64> {
    let arr: [u8; 8] = bytes.try_into().ok()?;
    Some(i64::from_be_bytes(arr))
}

/// Encode the byte prefix identifying one group's slice of the secondary
/// index. Distinct groups never share a prefix: `version_name` is
/// length-prefixed so that e.g. `("a", 12)` and `("a1", 2)` cannot collide.
pub fn group_prefix(group: &GroupKey) -> Vec<u8> {
    let name = group.version_name.as_bytes();
    let mut out = Vec::with_capacity(16 + 4 + name.len() + 8);
    out.extend_from_slice(group.cluster_id.as_bytes());
    out.extend_from_slice(&(name.len() as u32).to_be_bytes());
    out.extend_from_slice(name);
    out.extend_from_slice(&group.version_number.to_be_bytes());
    out
}

/// Encode a full secondary-index key: `group_prefix ‖ timestamp ‖ id`.
/// Ascending byte order visits rows oldest-first.
pub fn group_index_key(group: &GroupKey, server_timestamp: i64, id: i64) -> Vec<u8> {
    let mut out = group_prefix(group);
    out.extend_from_slice(&server_timestamp.to_be_bytes());
    out.extend_from_slice(&id.to_be_bytes());
    out
}

/// Encode the primary key of the clusters tree.
pub fn cluster_key(cluster_id: &ClusterId) -> [u8; 16] {
    *cluster_id.as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn distinct_groups_never_share_a_prefix() {
        let cluster = Uuid::new_v4();
        let a = GroupKey::new(cluster, "a", 12);
        let b = GroupKey::new(cluster, "a1", 2);
        let pa = group_prefix(&a);
        let pb = group_prefix(&b);
        assert!(!pa.starts_with(&pb) && !pb.starts_with(&pa));
    }

    #[test]
    fn ascending_keys_order_oldest_first() {
        let cluster = Uuid::new_v4();
        let g = GroupKey::new(cluster, "prod", 1);
        let k1 = group_index_key(&g, 100, 1);
        let k2 = group_index_key(&g, 100, 2);
        let k3 = group_index_key(&g, 101, 1);
        assert!(k1 < k2);
        assert!(k2 < k3);
    }
}
