// Copyright (c) 2026 Noderegistry
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use libfuzzer_sys::fuzz_target;
use noderegistry::core::security::crypto;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never be mistaken for a valid SPKI-encoded
    // P-256 public key, and must never panic the DER/ASN.1 parser.
    let _ = crypto::validate_public_key(data);
    let _ = crypto::verify(data, data, data);
});
