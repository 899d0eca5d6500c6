// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Seams between the poller and the store holding application resources.

use crate::error::Result;
use crate::types::ApplicationStatus;
use async_trait::async_trait;
use std::fmt;

/// How thoroughly the GitOps controller should re-evaluate an application
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshMode {
    /// Full re-evaluation, bypassing the manifest cache
    Hard,
    /// Targeted retry of a single application
    Soft,
}

impl RefreshMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshMode::Hard => "hard",
            RefreshMode::Soft => "soft",
        }
    }
}

impl fmt::Display for RefreshMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read access to application resources
#[async_trait]
pub trait ApplicationSource: Send + Sync {
    /// All applications in `namespace`, as one consistent list
    async fn list_applications(&self, namespace: &str) -> Result<Vec<ApplicationStatus>>;

    async fn get_application(&self, namespace: &str, name: &str) -> Result<ApplicationStatus>;
}

/// Recovery capability: ask the controller to re-evaluate an application
#[async_trait]
pub trait RefreshStrategy: Send + Sync {
    async fn request_refresh(&self, namespace: &str, name: &str, mode: RefreshMode) -> Result<()>;
}
