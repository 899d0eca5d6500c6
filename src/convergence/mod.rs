// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Readiness gate over GitOps-managed applications.

pub mod poller;
pub mod source;

pub use poller::{ConvergencePoller, ConvergenceResult, PollSettings};
pub use source::{ApplicationSource, RefreshMode, RefreshStrategy};
