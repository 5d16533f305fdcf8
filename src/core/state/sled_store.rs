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

//! Durable `sled`-backed implementations of the storage contract.
//!
//! `SledClusterStore` holds one tree keyed by cluster id. `SledNodeStore`
//! holds two trees that must stay consistent with each other: a primary
//! tree keyed by surrogate id holding the encoded row, and a secondary
//! index tree keyed by [`key_codec::group_index_key`] holding nothing but
//! the primary key, used for ordered group-scoped scans and atomic
//! eviction. Every write that touches both trees does so inside a single
//! sled transaction.

use async_trait::async_trait;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::sync::atomic::{AtomicI64, Ordering};

use super::key_codec;
use super::StoreError;
use crate::core::types::{
    decode_canonical_limited, encode_canonical, Cluster, ClusterId, GroupKey, NodeRegistration,
    MAX_STORED_REGISTRATION_BYTES,
};
use crate::core::state::cluster_store::ClusterStore;
use crate::core::state::node_store::{NewNodeRegistration, NodeRegistrationStore};

fn abort_unavailable<E>(_: E) -> ConflictableTransactionError<StoreError> {
    ConflictableTransactionError::Abort(StoreError::Unavailable)
}

fn map_tx_error(err: TransactionError<StoreError>) -> StoreError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(_) => StoreError::Unavailable,
    }
}

/// Durable cluster store backed by a single sled tree.
#[derive(Clone)]
pub struct SledClusterStore {
    tree: sled::Tree,
}

impl SledClusterStore {
    /// Wrap an already-open tree.
    pub fn new(tree: sled::Tree) -> Self {
        Self { tree }
    }
}

#[async_trait]
impl ClusterStore for SledClusterStore {
    async fn get(&self, cluster_id: ClusterId) -> Result<Option<Cluster>, StoreError> {
        let key = key_codec::cluster_key(&cluster_id);
        let raw = self
            .tree
            .get(key)
            .map_err(|_| StoreError::Unavailable)?;
        match raw {
            None => Ok(None),
            Some(bytes) => {
                let cluster: Cluster = decode_canonical_limited(&bytes, MAX_STORED_REGISTRATION_BYTES)
                    .map_err(|_| StoreError::Corrupt)?;
                Ok(Some(cluster))
            }
        }
    }

    async fn add(&self, cluster: Cluster) -> Result<bool, StoreError> {
        let key = key_codec::cluster_key(&cluster.cluster_id);
        let encoded = encode_canonical(&cluster).map_err(|_| StoreError::Corrupt)?;

        let result: Result<bool, TransactionError<StoreError>> =
            self.tree.transaction(|tx| {
                if tx.get(&key).map_err(abort_unavailable)?.is_some() {
                    return Ok(false);
                }
                tx.insert(&key, encoded.clone())
                    .map_err(abort_unavailable)?;
                Ok(true)
            });

        result.map_err(map_tx_error)
    }
}

/// Durable node registration store backed by two sled trees kept
/// consistent via sled's multi-tree transactions.
pub struct SledNodeStore {
    rows: sled::Tree,
    index: sled::Tree,
    next_timestamp: AtomicI64,
}

impl SledNodeStore {
    /// Wrap the already-open `rows` (primary) and `index` (secondary) trees.
    /// `next_timestamp` is seeded from wall-clock nanoseconds so values
    /// stay increasing across restarts even though sled's own id generator
    /// resets per tree, not per process.
    pub fn new(rows: sled::Tree, index: sled::Tree) -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0);
        Self {
            rows,
            index,
            next_timestamp: AtomicI64::new(seed),
        }
    }

    fn next_id(&self) -> Result<i64, StoreError> {
        self.rows
            .generate_id()
            .map(|id| id as i64)
            .map_err(|_| StoreError::Unavailable)
    }
}

#[async_trait]
impl NodeRegistrationStore for SledNodeStore {
    async fn insert(&self, reg: NewNodeRegistration) -> Result<NodeRegistration, StoreError> {
        let id = self.next_id()?;
        let server_timestamp = self.next_timestamp.fetch_add(1, Ordering::SeqCst);
        let row = NodeRegistration {
            id,
            cluster_id: reg.cluster_id,
            version_name: reg.version_name,
            version_number: reg.version_number,
            encrypted_payload: reg.encrypted_payload,
            server_timestamp,
        };
        let row_key = key_codec::registration_id_key(id);
        let row_bytes = encode_canonical(&row).map_err(|_| StoreError::Corrupt)?;
        let index_key = key_codec::group_index_key(&row.group(), server_timestamp, id);

        let result: Result<(), TransactionError<StoreError>> =
            (&self.rows, &self.index).transaction(|(rows, index)| {
                rows.insert(&row_key, row_bytes.clone())
                    .map_err(abort_unavailable)?;
                index
                    .insert(index_key.clone(), &row_key[..])
                    .map_err(abort_unavailable)?;
                Ok(())
            });
        result.map_err(map_tx_error)?;
        Ok(row)
    }

    async fn list_group_oldest_first(
        &self,
        group: &GroupKey,
    ) -> Result<Vec<NodeRegistration>, StoreError> {
        let prefix = key_codec::group_prefix(group);
        let mut out = Vec::new();
        for item in self.index.scan_prefix(&prefix) {
            let (_, row_key) = item.map_err(|_| StoreError::Unavailable)?;
            let raw = self
                .rows
                .get(&row_key)
                .map_err(|_| StoreError::Unavailable)?
                .ok_or(StoreError::Corrupt)?;
            let row: NodeRegistration =
                decode_canonical_limited(&raw, MAX_STORED_REGISTRATION_BYTES)
                    .map_err(|_| StoreError::Corrupt)?;
            out.push(row);
        }
        Ok(out)
    }

    async fn evict_ids(&self, group: &GroupKey, ids: &[i64]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let prefix = key_codec::group_prefix(group);
        let mut index_keys_to_remove = Vec::new();
        let mut row_keys_to_remove = Vec::new();
        for item in self.index.scan_prefix(&prefix) {
            let (index_key, row_key) = item.map_err(|_| StoreError::Unavailable)?;
            if let Some(id) = key_codec::decode_registration_id_key(&row_key) {
                if ids.contains(&id) {
                    index_keys_to_remove.push(index_key.to_vec());
                    row_keys_to_remove.push(row_key.to_vec());
                }
            }
        }

        let result: Result<(), TransactionError<StoreError>> =
            (&self.rows, &self.index).transaction(|(rows, index)| {
                for key in &row_keys_to_remove {
                    rows.remove(key.as_slice()).map_err(abort_unavailable)?;
                }
                for key in &index_keys_to_remove {
                    index.remove(key.as_slice()).map_err(abort_unavailable)?;
                }
                Ok(())
            });
        result.map_err(map_tx_error)
    }
}

/// Bundle of durable stores sharing one `sled::Db`.
pub struct SledStores {
    /// Durable cluster store.
    pub clusters: SledClusterStore,
    /// Durable node registration store.
    pub nodes: SledNodeStore,
    db: sled::Db,
}

impl SledStores {
    /// Open (or create) a sled database at `path` and build both stores
    /// over it, each on its own named tree.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|_| StoreError::Unavailable)?;
        let clusters_tree = db
            .open_tree("clusters")
            .map_err(|_| StoreError::Unavailable)?;
        let rows_tree = db
            .open_tree("registrations")
            .map_err(|_| StoreError::Unavailable)?;
        let index_tree = db
            .open_tree("registrations_by_group")
            .map_err(|_| StoreError::Unavailable)?;
        Ok(Self {
            clusters: SledClusterStore::new(clusters_tree),
            nodes: SledNodeStore::new(rows_tree, index_tree),
            db,
        })
    }

    /// Flush all trees to disk. Intended for graceful-shutdown paths.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush().map(|_| ()).map_err(|_| StoreError::Unavailable)
    }
}
