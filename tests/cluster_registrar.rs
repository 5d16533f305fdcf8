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

//! Trust-on-first-use cluster registration, against both storage backends.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use noderegistry::core::registrar::{register, RegisterOutcome};
use noderegistry::core::state::{ClusterStore, InMemoryClusterStore, SledStores};
use p256::ecdsa::SigningKey;
use p256::pkcs8::EncodePublicKey;

fn public_key_base64() -> String {
    let signing_key = SigningKey::random(&mut rand::rngs::OsRng);
    BASE64.encode(
        signing_key
            .verifying_key()
            .to_public_key_der()
            .unwrap()
            .as_bytes(),
    )
}

async fn exercise(store: &dyn ClusterStore) {
    let cluster_id = uuid::Uuid::new_v4().to_string();
    let key_a = public_key_base64();
    let key_b = public_key_base64();

    assert_eq!(
        register(store, &cluster_id, &key_a).await.unwrap(),
        RegisterOutcome::Created
    );
    assert_eq!(
        register(store, &cluster_id, &key_a).await.unwrap(),
        RegisterOutcome::AlreadyExists
    );
    assert_eq!(
        register(store, &cluster_id, &key_b).await.unwrap(),
        RegisterOutcome::PublicKeyMismatch
    );

    let stored = store.get(uuid::Uuid::parse_str(&cluster_id).unwrap()).await.unwrap();
    assert_eq!(stored.unwrap().public_key, BASE64.decode(&key_a).unwrap());
}

#[tokio::test]
async fn in_memory_store_honours_first_writer_wins() {
    exercise(&InMemoryClusterStore::new()).await;
}

#[tokio::test]
async fn sled_store_honours_first_writer_wins() {
    let dir = tempfile::tempdir().unwrap();
    let stores = SledStores::open(dir.path().to_str().unwrap()).unwrap();
    exercise(&stores.clusters).await;
}

#[tokio::test]
async fn malformed_cluster_id_is_rejected_before_touching_storage() {
    let store = InMemoryClusterStore::new();
    let outcome = register(&store, "not-a-real-guid", &public_key_base64())
        .await
        .unwrap();
    assert_eq!(outcome, RegisterOutcome::InvalidGuidFormat);
}

#[tokio::test]
async fn non_p256_key_is_rejected() {
    let store = InMemoryClusterStore::new();
    let cluster_id = uuid::Uuid::new_v4().to_string();
    let garbage = BASE64.encode(b"not a key at all");
    let outcome = register(&store, &cluster_id, &garbage).await.unwrap();
    assert_eq!(outcome, RegisterOutcome::InvalidPublicKey);
}
