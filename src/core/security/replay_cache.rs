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

//! Anti-replay cache: a sliding-window seen-set keyed by request fingerprint.
//!
//! Single-process and in-memory by design (§4.3 of the specification) — it
//! is a denial-of-replay mechanism, not a correctness barrier across process
//! restarts. Deterministic, allocation-light, and safe for concurrent use
//! without an external lock, in the spirit of `networking::peer_score`'s
//! windowed decay map.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// A fingerprint is the pair of on-the-wire base64 texts `(nonce, signature)`.
type Fingerprint = (String, String);

fn fingerprint_of(nonce_text: &str, signature_text: &str) -> Fingerprint {
    (nonce_text.to_string(), signature_text.to_string())
}

/// Sliding-window anti-replay cache.
pub struct ReplayCache {
    window: Duration,
    seen: DashMap<Fingerprint, Instant>,
}

impl ReplayCache {
    /// Create a cache with the given sliding window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: DashMap::new(),
        }
    }

    /// Check whether `(nonce_text, signature_text)` has been seen inside the
    /// current window, recording it if not.
    ///
    /// Returns `false` when either argument is empty. On a genuine hit, the
    /// entry's expiry is **not** refreshed — a fingerprint that is replayed
    /// repeatedly keeps expiring on its original schedule, not an
    /// ever-extending one.
    pub fn check_and_record(&self, nonce_text: &str, signature_text: &str) -> bool {
        if nonce_text.is_empty() || signature_text.is_empty() {
            return false;
        }
        let key = fingerprint_of(nonce_text, signature_text);
        let now = Instant::now();

        match self.seen.entry(key) {
            Entry::Occupied(mut occ) => {
                if *occ.get() <= now {
                    // Expired: the window has elapsed since the original
                    // observation, so this occurrence is fresh again.
                    occ.insert(now + self.window);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vac) => {
                vac.insert(now + self.window);
                true
            }
        }
    }

    /// Whether the cache currently tracks no fingerprints.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
