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
#![deny(missing_docs)]

//! ECDSA P-256/SHA-256 verification and SPKI public-key validation.
//!
//! The public key wire format is a self-describing SPKI (X.509
//! `SubjectPublicKeyInfo`, DER) blob — the format .NET's
//! `ECDsa.ExportSubjectPublicKeyInfo()` produces, which is what the
//! original client library emits. Signatures are the fixed 64-byte `r ‖ s`
//! encoding (.NET's `ECDsa.SignData` default), not a DER `SEQUENCE`.

use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey;

/// Verify an ECDSA P-256/SHA-256 signature over `message`.
///
/// Any parsing exception, length mismatch, or verification failure returns
/// `false` — this function never panics and never propagates an error.
pub fn verify(public_key_bytes: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(key) = VerifyingKey::from_public_key_der(public_key_bytes) else {
        return false;
    };
    let Ok(sig) = Signature::from_slice(signature) else {
        return false;
    };
    key.verify(message, &sig).is_ok()
}

/// Parse a self-describing public-key encoding and confirm it names the
/// P-256 curve. Returns `false` on any malformed input.
pub fn validate_public_key(bytes: &[u8]) -> bool {
    VerifyingKey::from_public_key_der(bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::Signer;
    use p256::ecdsa::SigningKey;
    use p256::pkcs8::EncodePublicKey;

    fn gen_keypair() -> (SigningKey, Vec<u8>) {
        let sk = SigningKey::random(&mut rand::rngs::OsRng);
        let spki = sk
            .verifying_key()
            .to_public_key_der()
            .expect("encode spki")
            .as_bytes()
            .to_vec();
        (sk, spki)
    }

    #[test]
    fn verifies_genuine_signature() {
        let (sk, spki) = gen_keypair();
        let msg = b"cluster-id-version-name-1-payload-nonce";
        let sig: Signature = sk.sign(msg);
        assert!(verify(&spki, msg, sig.to_bytes().as_slice()));
    }

    #[test]
    fn rejects_tampered_message() {
        let (sk, spki) = gen_keypair();
        let sig: Signature = sk.sign(b"original message");
        assert!(!verify(&spki, b"tampered message", sig.to_bytes().as_slice()));
    }

    #[test]
    fn rejects_garbage_public_key() {
        assert!(!validate_public_key(b"not a key"));
        assert!(!verify(b"not a key", b"msg", b"0123456789012345678901234567890123456789012345678901234567890123"));
    }

    #[test]
    fn validates_genuine_p256_key() {
        let (_, spki) = gen_keypair();
        assert!(validate_public_key(&spki));
    }
}
