// Copyright (c) 2026 Noderegistry
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use noderegistry::core::security::replay_cache::ReplayCache;
use std::time::Duration;

#[derive(Clone, Debug, Arbitrary)]
struct Input {
    nonce: String,
    signature: String,
    repeat: u8,
}

fuzz_target!(|inp: Input| {
    let cache = ReplayCache::new(Duration::from_secs(60));
    for _ in 0..=(inp.repeat % 8) {
        let _ = cache.check_and_record(&inp.nonce, &inp.signature);
    }
});
