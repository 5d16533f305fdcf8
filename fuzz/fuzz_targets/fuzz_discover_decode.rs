// Copyright (c) 2026 Noderegistry
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use noderegistry::core::types::parse_cluster_id;

#[derive(Clone, Debug, Arbitrary)]
struct Input {
    cluster_id_text: String,
    payload_base64: String,
    nonce_base64: String,
    signature_base64: String,
}

fuzz_target!(|inp: Input| {
    // None of these should ever panic on arbitrary text, well-formed or not.
    let _ = parse_cluster_id(&inp.cluster_id_text);
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    let _ = BASE64.decode(&inp.payload_base64);
    let _ = BASE64.decode(&inp.nonce_base64);
    let _ = BASE64.decode(&inp.signature_base64);
});
