// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// A single key/value override for a live ConfigMap, plus the Deployment
/// that has to restart before the value takes effect
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamicConfigEntry {
    pub namespace: String,
    pub config_object_name: String,
    pub workload_name: String,
    pub key: String,
    pub value: Option<String>,
}

impl DynamicConfigEntry {
    /// The override value, if one was provided and is not blank
    pub fn provided_value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.trim().is_empty())
    }
}
