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

//! JSON wire types for the HTTP surface, and the outcome→(status, token)
//! mapping that §7 calls the "boundary translator".

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::core::admission::DiscoverOutcome;
use crate::core::registrar::RegisterOutcome;

/// `POST /clusters` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterClusterRequest {
    /// 36-character textual cluster id.
    pub cluster_id: String,
    /// Base64-encoded SPKI public key.
    pub public_key: String,
}

/// `POST /discover` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverRequestBody {
    /// 36-character textual cluster id.
    pub cluster_id: String,
    /// Caller-supplied version label.
    pub version_name: String,
    /// Caller-supplied version ordinal.
    pub version_number: i64,
    /// Base64 text of the encrypted payload.
    pub payload: String,
    /// Base64 text of the 4-byte server-bound nonce.
    pub nonce: String,
    /// Base64 text of the ECDSA-P256/SHA-256 signature.
    pub signature: String,
}

/// `POST /discover` success body.
#[derive(Debug, Serialize)]
pub struct DiscoverResponseBody {
    /// Base64 payloads of the requesting group's peers, newest first.
    pub nodes: Vec<String>,
}

/// Shared error body: `{ "error": <short_token> }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// The short error token from §6's fixed vocabulary.
    pub error: &'static str,
}

/// Map a [`RegisterOutcome`] to its HTTP status and, for non-2xx outcomes,
/// error token.
pub fn register_response(outcome: &RegisterOutcome) -> (StatusCode, &'static str) {
    match outcome {
        RegisterOutcome::Created => (StatusCode::CREATED, "created"),
        RegisterOutcome::AlreadyExists => (StatusCode::OK, "already_exists"),
        RegisterOutcome::PublicKeyMismatch => (StatusCode::CONFLICT, "public_key_mismatch"),
        RegisterOutcome::InvalidGuidFormat => (StatusCode::BAD_REQUEST, "invalid_guid_format"),
        RegisterOutcome::InvalidPublicKey => (StatusCode::BAD_REQUEST, "invalid_public_key"),
    }
}

/// Map a [`DiscoverOutcome`] to its HTTP status and, for non-2xx outcomes,
/// error token. `Success` carries no token — callers branch on the variant
/// to build [`DiscoverResponseBody`] instead.
pub fn discover_response_status(outcome: &DiscoverOutcome) -> (StatusCode, &'static str) {
    match outcome {
        DiscoverOutcome::Success { .. } => (StatusCode::OK, "success"),
        DiscoverOutcome::ClusterNotFound => (StatusCode::NOT_FOUND, "cluster_not_found"),
        DiscoverOutcome::InvalidGuidFormat => (StatusCode::BAD_REQUEST, "invalid_guid_format"),
        DiscoverOutcome::InvalidBase64 => (StatusCode::BAD_REQUEST, "invalid_base64"),
        DiscoverOutcome::InvalidNonceSize => (StatusCode::BAD_REQUEST, "nonce_must_be_4_bytes"),
        DiscoverOutcome::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
        DiscoverOutcome::InvalidPayload => (StatusCode::BAD_REQUEST, "version_name_required"),
        DiscoverOutcome::ReplayAttackDetected => {
            (StatusCode::FORBIDDEN, "replay_attack_detected")
        }
        DiscoverOutcome::SignatureVerificationFailed => {
            (StatusCode::UNAUTHORIZED, "signature_verification_failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_success_maps_to_200() {
        let outcome = DiscoverOutcome::Success { nodes: vec![] };
        assert_eq!(discover_response_status(&outcome).0, StatusCode::OK);
    }

    #[test]
    fn every_error_outcome_has_a_distinct_http_status_or_token() {
        let outcomes = [
            DiscoverOutcome::ClusterNotFound,
            DiscoverOutcome::InvalidGuidFormat,
            DiscoverOutcome::InvalidBase64,
            DiscoverOutcome::InvalidNonceSize,
            DiscoverOutcome::PayloadTooLarge,
            DiscoverOutcome::InvalidPayload,
            DiscoverOutcome::ReplayAttackDetected,
            DiscoverOutcome::SignatureVerificationFailed,
        ];
        for outcome in &outcomes {
            let (status, token) = discover_response_status(outcome);
            assert_ne!(status, StatusCode::OK);
            assert!(!token.is_empty());
        }
    }
}
