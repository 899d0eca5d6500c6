// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Idempotent provisioning of shared credentials and live configuration.

pub mod config_patch;
pub mod credentials;

pub use config_patch::{ConfigStore, DynamicConfigPatcher, PatchOutcome};
pub use credentials::{CredentialProvisioner, ProvisionOutcome, SecretStore};
