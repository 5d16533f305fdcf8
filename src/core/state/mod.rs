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

//! The storage contract: two narrow store traits, and two interchangeable
//! implementations (in-memory, sled-backed).

pub mod cluster_store;
pub mod key_codec;
pub mod node_store;
pub mod sled_store;

pub use cluster_store::{ClusterStore, InMemoryClusterStore};
pub use node_store::{InMemoryNodeStore, NewNodeRegistration, NodeRegistrationStore};
pub use sled_store::{SledClusterStore, SledNodeStore, SledStores};

use thiserror::Error;

/// Storage-layer error. The core treats any variant here as §7's
/// `InternalError` — the only failure classes the storage contract can
/// surface that the admission handler didn't already rule out upstream.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database could not complete the operation.
    #[error("storage unavailable")]
    Unavailable,
    /// A stored value could not be decoded (corruption, or an incompatible
    /// on-disk format).
    #[error("stored value corrupt")]
    Corrupt,
}
