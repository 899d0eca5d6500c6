// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Live configuration overrides.
//!
//! Merges a key/value pair into a ConfigMap and restarts the Deployment that
//! reads it by scaling it to zero and stamping `restartedAt`. The replica
//! count is left at zero: restoring the desired scale is up to the caller
//! (a later install step or the GitOps controller re-syncing the Deployment).

use crate::constants::{annotations, CONFLICT_RETRIES};
use crate::error::{is_conflict, Result, RollcallError};
use crate::types::DynamicConfigEntry;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use k8s_openapi::api::apps::v1::Deployment;
use tracing::{info, instrument, warn};

/// ConfigMap and Deployment operations the patcher needs
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Merge-patch `data.<key> = value` into the named ConfigMap
    async fn merge_config_value(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
    ) -> kube::Result<()>;

    async fn get_workload(&self, namespace: &str, name: &str) -> kube::Result<Deployment>;

    async fn replace_workload(&self, namespace: &str, deployment: &Deployment) -> kube::Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Config patched; the workload was scaled to zero at `restarted_at`
    Applied { restarted_at: DateTime<Utc> },
    Skipped { reason: String },
}

pub struct DynamicConfigPatcher<S> {
    store: S,
}

impl<S: ConfigStore> DynamicConfigPatcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(
        skip(self, entry),
        fields(
            config = %format!("{}/{}", entry.namespace, entry.config_object_name),
            workload = %entry.workload_name
        )
    )]
    pub async fn apply_config_override(&self, entry: &DynamicConfigEntry) -> Result<PatchOutcome> {
        let Some(value) = entry.provided_value() else {
            info!("{} not provided, not updating {}", entry.key, entry.config_object_name);
            return Ok(PatchOutcome::Skipped {
                reason: "value not provided".to_string(),
            });
        };

        self.store
            .merge_config_value(&entry.namespace, &entry.config_object_name, &entry.key, value)
            .await
            .map_err(|e| RollcallError::PatchError {
                namespace: entry.namespace.clone(),
                resource: format!("configmap/{}", entry.config_object_name),
                message: e.to_string(),
            })?;
        info!("Set {} in configmap {}", entry.key, entry.config_object_name);

        let restarted_at = self.restart_workload(entry).await.map_err(|e| {
            RollcallError::PatchError {
                namespace: entry.namespace.clone(),
                resource: format!("deployment/{}", entry.workload_name),
                message: format!(
                    "configmap {} was updated but the restart failed: {}",
                    entry.config_object_name, e
                ),
            }
        })?;

        info!(
            "Scaled deployment {} to zero, restartedAt {}",
            entry.workload_name,
            restarted_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        Ok(PatchOutcome::Applied { restarted_at })
    }

    async fn restart_workload(&self, entry: &DynamicConfigEntry) -> kube::Result<DateTime<Utc>> {
        let mut attempt = 0u32;

        loop {
            let mut deployment = self
                .store
                .get_workload(&entry.namespace, &entry.workload_name)
                .await?;
            let restarted_at = Utc::now();
            mark_restarted(&mut deployment, restarted_at);

            match self
                .store
                .replace_workload(&entry.namespace, &deployment)
                .await
            {
                Ok(()) => return Ok(restarted_at),
                Err(e) if is_conflict(&e) && attempt + 1 < CONFLICT_RETRIES => {
                    attempt += 1;
                    warn!(
                        "Conflict updating deployment {}, retrying ({}/{})",
                        entry.workload_name, attempt, CONFLICT_RETRIES
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Scale to zero and stamp the restart time, keeping other annotations
fn mark_restarted(deployment: &mut Deployment, at: DateTime<Utc>) {
    deployment
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(
            annotations::RESTARTED_AT.to_string(),
            at.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
    deployment.spec.get_or_insert_with(Default::default).replicas = Some(0);
}
