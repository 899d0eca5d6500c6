// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod constants;
pub mod convergence;
pub mod error;
pub mod install;
pub mod kubernetes;
pub mod provisioning;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;
