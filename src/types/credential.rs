// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::error::{Result, RollcallError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;

/// A namespace-scoped registry credential with its decoded payload.
///
/// The encoded form is dropped as soon as it is decoded and the payload
/// never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub namespace: String,
    pub name: String,
    pub payload: Vec<u8>,
}

impl Credential {
    /// Decode a base64 payload, failing before anything touches the store
    pub fn decode(namespace: &str, name: &str, encoded: &str) -> Result<Self> {
        let payload = STANDARD
            .decode(encoded.trim())
            .map_err(|source| RollcallError::DecodeError {
                namespace: namespace.to_string(),
                name: name.to_string(),
                source,
            })?;

        Ok(Credential {
            namespace: namespace.to_string(),
            name: name.to_string(),
            payload,
        })
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("payload", &format_args!("<{} bytes>", self.payload.len()))
            .finish()
    }
}
