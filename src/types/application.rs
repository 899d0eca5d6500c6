// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::gitops;
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Argo CD Application, reduced to the fields rollcall reads
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "argoproj.io", version = "v1alpha1", kind = "Application")]
#[kube(namespaced)]
#[kube(status = "ApplicationResourceStatus")]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<ApplicationDestination>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDestination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResourceStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<ApplicationCondition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_state: Option<OperationState>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
pub struct SyncState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
pub struct HealthState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
pub struct ApplicationCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
pub struct OperationState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    Synced,
    OutOfSync,
    Unknown,
}

impl SyncStatus {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("Synced") => SyncStatus::Synced,
            Some("OutOfSync") => SyncStatus::OutOfSync,
            _ => SyncStatus::Unknown,
        }
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Progressing,
    Degraded,
    Unknown,
}

impl HealthStatus {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("Healthy") => HealthStatus::Healthy,
            Some("Progressing") => HealthStatus::Progressing,
            Some("Degraded") => HealthStatus::Degraded,
            _ => HealthStatus::Unknown,
        }
    }
}

/// Observed state of one application. Owned by the GitOps controller.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {
    pub name: String,
    pub sync_status: SyncStatus,
    pub health_status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
}

impl ApplicationStatus {
    pub fn is_ready(&self) -> bool {
        self.sync_status == SyncStatus::Synced && self.health_status == HealthStatus::Healthy
    }

    /// True when the diagnostic carries the hung-sync marker
    pub fn is_stuck(&self) -> bool {
        self.last_message
            .as_deref()
            .is_some_and(|m| m.contains(gitops::STUCK_MARKER))
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (sync={:?}, health={:?})",
            self.name, self.sync_status, self.health_status
        )
    }
}

impl From<&Application> for ApplicationStatus {
    fn from(app: &Application) -> Self {
        let status = app.status.as_ref();

        let sync_status = SyncStatus::parse(
            status
                .and_then(|s| s.sync.as_ref())
                .and_then(|s| s.status.as_deref()),
        );
        let health = status.and_then(|s| s.health.as_ref());
        let health_status = HealthStatus::parse(health.and_then(|h| h.status.as_deref()));

        let mut messages: Vec<&str> = Vec::new();
        if let Some(conditions) = status.and_then(|s| s.conditions.as_ref()) {
            messages.extend(conditions.iter().filter_map(|c| c.message.as_deref()));
        }
        if let Some(message) = status
            .and_then(|s| s.operation_state.as_ref())
            .and_then(|o| o.message.as_deref())
        {
            messages.push(message);
        }
        if let Some(message) = health.and_then(|h| h.message.as_deref()) {
            messages.push(message);
        }
        messages.retain(|m| !m.is_empty());

        ApplicationStatus {
            name: app.name_any(),
            sync_status,
            health_status,
            last_message: (!messages.is_empty()).then(|| messages.join("; ")),
        }
    }
}
