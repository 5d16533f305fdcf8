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

//! The eviction worker: a single consumer of group hints that enforces
//! the per-group registration cap out of band from the request path.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::core::state::NodeRegistrationStore;
use crate::core::types::{ClusterId, GroupKey};
use crate::monitoring::Metrics;

/// One unit of eviction work: "re-check this group's row count".
/// Cheap and fixed-size by design — producers never block on the
/// unbounded channel this travels over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvictionHint {
    /// Owning cluster.
    pub cluster_id: ClusterId,
    /// Group version label.
    pub version_name: String,
    /// Group version ordinal.
    pub version_number: i64,
}

impl EvictionHint {
    fn group(&self) -> GroupKey {
        GroupKey::new(self.cluster_id, self.version_name.clone(), self.version_number)
    }
}

/// Enforce the cap for one group: delete the oldest rows beyond
/// `max_per_group`, tie-broken by surrogate id (lower id evicted first).
/// Returns the number of rows deleted, for metrics.
async fn enforce_cap(
    store: &dyn NodeRegistrationStore,
    group: &GroupKey,
    max_per_group: usize,
) -> Result<usize, crate::core::state::StoreError> {
    let rows = store.list_group_oldest_first(group).await?;
    if rows.len() <= max_per_group {
        return Ok(0);
    }
    let overshoot = rows.len() - max_per_group;
    let ids: Vec<i64> = rows[..overshoot].iter().map(|r| r.id).collect();
    store.evict_ids(group, &ids).await?;
    Ok(ids.len())
}

/// Run the eviction worker until `shutdown` reports `true`, draining any
/// hints already in the channel before returning. Per-hint failures are
/// logged and swallowed — one bad hint never stops the worker.
pub async fn run(
    store: Arc<dyn NodeRegistrationStore>,
    mut hints: mpsc::UnboundedReceiver<EvictionHint>,
    mut shutdown: watch::Receiver<bool>,
    max_per_group: usize,
    metrics: Arc<Metrics>,
) {
    loop {
        tokio::select! {
            biased;
            hint = hints.recv() => {
                match hint {
                    Some(hint) => process_hint(store.as_ref(), hint, max_per_group, &metrics).await,
                    None => break,
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    drain_remaining(store.as_ref(), &mut hints, max_per_group, &metrics).await;
                    break;
                }
            }
        }
    }
}

async fn drain_remaining(
    store: &dyn NodeRegistrationStore,
    hints: &mut mpsc::UnboundedReceiver<EvictionHint>,
    max_per_group: usize,
    metrics: &Metrics,
) {
    while let Ok(hint) = hints.try_recv() {
        process_hint(store, hint, max_per_group, metrics).await;
    }
}

async fn process_hint(
    store: &dyn NodeRegistrationStore,
    hint: EvictionHint,
    max_per_group: usize,
    metrics: &Metrics,
) {
    let group = hint.group();
    match enforce_cap(store, &group, max_per_group).await {
        Ok(0) => metrics.groups_over_cap.set(0),
        Ok(evicted) => {
            metrics
                .evictions_total
                .with_label_values(&["evicted"])
                .inc_by(evicted as u64);
            metrics.groups_over_cap.set(evicted as i64);
        }
        Err(err) => {
            metrics
                .evictions_total
                .with_label_values(&["failed"])
                .inc();
            tracing::warn!(
                cluster_id = %group.cluster_id,
                version_name = %group.version_name,
                version_number = group.version_number,
                error = %err,
                "eviction hint failed; group left for a later pass"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{InMemoryNodeStore, NewNodeRegistration};
    use uuid::Uuid;

    #[tokio::test]
    async fn enforce_cap_keeps_only_the_newest_rows() {
        let store = InMemoryNodeStore::new();
        let cluster_id = Uuid::new_v4();
        let mut last_id = 0;
        for _ in 0..8 {
            let row = store
                .insert(NewNodeRegistration {
                    cluster_id,
                    version_name: "prod".into(),
                    version_number: 1,
                    encrypted_payload: b"x".to_vec(),
                })
                .await
                .unwrap();
            last_id = row.id;
        }
        let group = GroupKey::new(cluster_id, "prod", 1);
        enforce_cap(&store, &group, 5).await.unwrap();
        let remaining = store.list_group_oldest_first(&group).await.unwrap();
        assert_eq!(remaining.len(), 5);
        assert_eq!(remaining.last().unwrap().id, last_id);
    }

    #[tokio::test]
    async fn enforce_cap_is_a_no_op_under_the_limit() {
        let store = InMemoryNodeStore::new();
        let cluster_id = Uuid::new_v4();
        store
            .insert(NewNodeRegistration {
                cluster_id,
                version_name: "prod".into(),
                version_number: 1,
                encrypted_payload: b"x".to_vec(),
            })
            .await
            .unwrap();
        let group = GroupKey::new(cluster_id, "prod", 1);
        enforce_cap(&store, &group, 5).await.unwrap();
        assert_eq!(store.list_group_oldest_first(&group).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn worker_processes_hints_then_stops_on_shutdown() {
        let store: Arc<dyn NodeRegistrationStore> = Arc::new(InMemoryNodeStore::new());
        let cluster_id = Uuid::new_v4();
        for _ in 0..7 {
            store
                .insert(NewNodeRegistration {
                    cluster_id,
                    version_name: "prod".into(),
                    version_number: 1,
                    encrypted_payload: b"x".to_vec(),
                })
                .await
                .unwrap();
        }

        let (hint_tx, hint_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        hint_tx
            .send(EvictionHint {
                cluster_id,
                version_name: "prod".into(),
                version_number: 1,
            })
            .unwrap();

        let worker_store = store.clone();
        let metrics = Arc::new(Metrics::new().unwrap());
        let handle = tokio::spawn(run(worker_store, hint_rx, shutdown_rx, 5, metrics));

        // Give the worker a turn to drain the hint before asking it to stop.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        let group = GroupKey::new(cluster_id, "prod", 1);
        assert_eq!(store.list_group_oldest_first(&group).await.unwrap().len(), 5);
    }
}
