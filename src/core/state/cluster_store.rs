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

//! The cluster store: `get`/`add`, with `add` atomic on `cluster_id`
//! uniqueness so the registrar can collapse concurrent-registration races.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::StoreError;
use crate::core::types::{Cluster, ClusterId};

/// Cluster store contract. Implementations must guarantee that two
/// concurrent `add` calls with the same `cluster_id` result in exactly one
/// persisted row and exactly one caller observing `inserted = true`.
#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// Look up a cluster by id.
    async fn get(&self, cluster_id: ClusterId) -> Result<Option<Cluster>, StoreError>;

    /// Insert a cluster. Returns `true` if this call inserted the row,
    /// `false` if a row for `cluster_id` already existed (the caller must
    /// then compare public keys itself — this contract says nothing about
    /// byte equality, only about who won the race).
    async fn add(&self, cluster: Cluster) -> Result<bool, StoreError>;
}

/// In-memory, concurrent cluster store. Backed by a single `DashMap`; the
/// shard lock `entry()` takes for the duration of the match arm is what
/// makes `add` atomic on uniqueness.
#[derive(Default)]
pub struct InMemoryClusterStore {
    clusters: DashMap<ClusterId, Cluster>,
}

impl InMemoryClusterStore {
    /// Construct an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClusterStore for InMemoryClusterStore {
    async fn get(&self, cluster_id: ClusterId) -> Result<Option<Cluster>, StoreError> {
        Ok(self.clusters.get(&cluster_id).map(|r| r.value().clone()))
    }

    async fn add(&self, cluster: Cluster) -> Result<bool, StoreError> {
        match self.clusters.entry(cluster.cluster_id) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vac) => {
                vac.insert(cluster);
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(id: ClusterId, key: &[u8]) -> Cluster {
        Cluster {
            cluster_id: id,
            public_key: key.to_vec(),
        }
    }

    #[tokio::test]
    async fn second_add_with_same_id_is_rejected() {
        let store = InMemoryClusterStore::new();
        let id = ClusterId::new_v4();
        assert!(store.add(cluster(id, b"key-a")).await.unwrap());
        assert!(!store.add(cluster(id, b"key-a")).await.unwrap());
        assert!(!store.add(cluster(id, b"key-b")).await.unwrap());
        assert_eq!(store.get(id).await.unwrap().unwrap().public_key, b"key-a");
    }

    #[tokio::test]
    async fn concurrent_adds_yield_exactly_one_winner() {
        use std::sync::Arc;
        let store = Arc::new(InMemoryClusterStore::new());
        let id = ClusterId::new_v4();
        let mut handles = Vec::new();
        for i in 0..16u8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.add(cluster(id, &[i])).await.unwrap()
            }));
        }
        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
