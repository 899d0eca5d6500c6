// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! API server backed implementations of the store seams, plus CRD discovery
//! and namespace management.

pub mod applications;
pub mod crd;
pub mod namespaces;
pub mod secrets;
pub mod workloads;

pub use applications::KubeApplications;
pub use crd::wait_for_application_crd;
pub use secrets::KubeSecretStore;
pub use workloads::KubeConfigStore;
