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

//! Dev/test keypair generator: a P-256 signing key, written to disk in
//! PKCS8 DER, with its SPKI-encoded public key (the form `POST /clusters`
//! expects) printed as base64.

use anyhow::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use p256::ecdsa::SigningKey;
use p256::pkcs8::{EncodePrivateKey, EncodePublicKey};
use std::path::PathBuf;

fn main() -> Result<()> {
    let out_dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());
    let mut key_path = PathBuf::from(out_dir);
    std::fs::create_dir_all(&key_path)?;
    key_path.push("cluster.key");

    let signing_key = SigningKey::random(&mut rand::rngs::OsRng);
    let pkcs8 = signing_key.to_pkcs8_der()?;
    std::fs::write(&key_path, pkcs8.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(&key_path, std::fs::Permissions::from_mode(0o600));
    }

    let public_key_der = signing_key.verifying_key().to_public_key_der()?;
    println!("{}", BASE64.encode(public_key_der.as_bytes()));
    Ok(())
}
