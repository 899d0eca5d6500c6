// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource and domain types.

pub mod application;
pub mod config_entry;
pub mod credential;

pub use application::{Application, ApplicationStatus, HealthStatus, SyncStatus};
pub use config_entry::DynamicConfigEntry;
pub use credential::Credential;
