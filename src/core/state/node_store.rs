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

//! The node registration store: insert, group-scoped reads, and eviction.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use super::StoreError;
use crate::core::types::{GroupKey, NodeRegistration};

/// Input to `NodeRegistrationStore::insert`. Lacks `id` and
/// `server_timestamp` — the store assigns both atomically on insert so two
/// concurrent admissions can never collide or observe each other's values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewNodeRegistration {
    /// Owning cluster.
    pub cluster_id: crate::core::types::ClusterId,
    /// Caller-supplied version label.
    pub version_name: String,
    /// Caller-supplied version number.
    pub version_number: i64,
    /// Opaque encrypted payload, already size-checked by the caller.
    pub encrypted_payload: Vec<u8>,
}

/// Node registration store contract.
#[async_trait]
pub trait NodeRegistrationStore: Send + Sync {
    /// Persist a new registration, assigning it an id and server timestamp.
    /// Returns the stored row.
    async fn insert(&self, reg: NewNodeRegistration) -> Result<NodeRegistration, StoreError>;

    /// Read every row for `group`, ordered oldest (`server_timestamp`,
    /// then `id`) ascending first.
    async fn list_group_oldest_first(
        &self,
        group: &GroupKey,
    ) -> Result<Vec<NodeRegistration>, StoreError>;

    /// Read every row for `group`, newest first — the ordering the peer
    /// read path uses.
    async fn list_group_newest_first(
        &self,
        group: &GroupKey,
    ) -> Result<Vec<NodeRegistration>, StoreError> {
        let mut rows = self.list_group_oldest_first(group).await?;
        rows.reverse();
        Ok(rows)
    }

    /// Delete exactly the rows whose ids are in `ids`. Implementations must
    /// make this atomic with respect to concurrent inserts into the same
    /// group — a row inserted mid-eviction must never be the one deleted.
    async fn evict_ids(&self, group: &GroupKey, ids: &[i64]) -> Result<(), StoreError>;

    /// The peer-read query: up to `max` most recent rows for `group`,
    /// newest first. Used by the admission handler's step 9, executed
    /// before the handler's own insert so a caller never sees its own
    /// just-written row.
    async fn peers(&self, group: &GroupKey, max: usize) -> Result<Vec<NodeRegistration>, StoreError> {
        let mut rows = self.list_group_newest_first(group).await?;
        rows.truncate(max);
        Ok(rows)
    }
}

/// In-memory, concurrent node registration store.
///
/// Ordering is *not* maintained as an insertion invariant: two admissions
/// racing for the same group can fetch distinct, ordered timestamp-counter
/// values and still push to the per-group vector out of that order. Rather
/// than serialize inserts to preserve a sorted-at-insert invariant, every
/// read sorts at read time — acceptable per the storage contract's looser
/// locking discipline for the in-memory variant.
pub struct InMemoryNodeStore {
    groups: DashMap<GroupKey, Vec<NodeRegistration>>,
    next_id: AtomicI64,
    next_timestamp: AtomicI64,
}

impl InMemoryNodeStore {
    /// Construct an empty store. `next_id` starts at 1; `next_timestamp` is
    /// seeded from wall-clock nanoseconds since `UNIX_EPOCH` so timestamps
    /// stay monotonically increasing and roughly comparable across process
    /// restarts.
    pub fn new() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0);
        Self {
            groups: DashMap::new(),
            next_id: AtomicI64::new(1),
            next_timestamp: AtomicI64::new(seed),
        }
    }
}

impl Default for InMemoryNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeRegistrationStore for InMemoryNodeStore {
    async fn insert(&self, reg: NewNodeRegistration) -> Result<NodeRegistration, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let server_timestamp = self.next_timestamp.fetch_add(1, Ordering::SeqCst);
        let row = NodeRegistration {
            id,
            cluster_id: reg.cluster_id,
            version_name: reg.version_name,
            version_number: reg.version_number,
            encrypted_payload: reg.encrypted_payload,
            server_timestamp,
        };
        self.groups
            .entry(row.group())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn list_group_oldest_first(
        &self,
        group: &GroupKey,
    ) -> Result<Vec<NodeRegistration>, StoreError> {
        let mut rows = self
            .groups
            .get(group)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        rows.sort_by_key(|r| (r.server_timestamp, r.id));
        Ok(rows)
    }

    async fn evict_ids(&self, group: &GroupKey, ids: &[i64]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        if let Some(mut rows) = self.groups.get_mut(group) {
            rows.retain(|r| !ids.contains(&r.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn input(cluster_id: Uuid, name: &str, number: i64) -> NewNodeRegistration {
        NewNodeRegistration {
            cluster_id,
            version_name: name.to_string(),
            version_number: number,
            encrypted_payload: b"payload".to_vec(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_distinct_increasing_ids() {
        let store = InMemoryNodeStore::new();
        let cluster_id = Uuid::new_v4();
        let a = store.insert(input(cluster_id, "v1", 1)).await.unwrap();
        let b = store.insert(input(cluster_id, "v1", 1)).await.unwrap();
        assert!(b.id > a.id);
        assert!(b.server_timestamp > a.server_timestamp);
    }

    #[tokio::test]
    async fn group_listing_is_ordered_oldest_first() {
        let store = InMemoryNodeStore::new();
        let cluster_id = Uuid::new_v4();
        for _ in 0..5 {
            store.insert(input(cluster_id, "v1", 1)).await.unwrap();
        }
        let group = GroupKey::new(cluster_id, "v1", 1);
        let rows = store.list_group_oldest_first(&group).await.unwrap();
        for w in rows.windows(2) {
            assert!(w[0].server_timestamp <= w[1].server_timestamp);
        }
        let newest = store.list_group_newest_first(&group).await.unwrap();
        assert_eq!(newest.first().unwrap().id, rows.last().unwrap().id);
    }

    #[tokio::test]
    async fn peers_returns_at_most_max_newest_first() {
        let store = InMemoryNodeStore::new();
        let cluster_id = Uuid::new_v4();
        for _ in 0..8 {
            store.insert(input(cluster_id, "v1", 1)).await.unwrap();
        }
        let group = GroupKey::new(cluster_id, "v1", 1);
        let top = store.peers(&group, 5).await.unwrap();
        assert_eq!(top.len(), 5);
        let all_newest_first = store.list_group_newest_first(&group).await.unwrap();
        assert_eq!(top, all_newest_first[..5]);
    }

    #[tokio::test]
    async fn distinct_groups_are_isolated() {
        let store = InMemoryNodeStore::new();
        let cluster_id = Uuid::new_v4();
        store.insert(input(cluster_id, "v1", 1)).await.unwrap();
        store.insert(input(cluster_id, "v2", 1)).await.unwrap();
        let g1 = GroupKey::new(cluster_id, "v1", 1);
        let g2 = GroupKey::new(cluster_id, "v2", 1);
        assert_eq!(store.list_group_oldest_first(&g1).await.unwrap().len(), 1);
        assert_eq!(store.list_group_oldest_first(&g2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn evict_ids_removes_only_named_rows() {
        let store = InMemoryNodeStore::new();
        let cluster_id = Uuid::new_v4();
        let rows: Vec<_> = {
            let mut out = Vec::new();
            for _ in 0..3 {
                out.push(store.insert(input(cluster_id, "v1", 1)).await.unwrap());
            }
            out
        };
        let group = GroupKey::new(cluster_id, "v1", 1);
        store.evict_ids(&group, &[rows[0].id]).await.unwrap();
        let remaining = store.list_group_oldest_first(&group).await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|r| r.id != rows[0].id));
    }
}
