// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Argo CD Applications read and refreshed through the API server

use crate::constants::annotations;
use crate::convergence::{ApplicationSource, RefreshMode, RefreshStrategy};
use crate::error::{is_not_found, Result, RollcallError};
use crate::types::{Application, ApplicationStatus};
use async_trait::async_trait;
use kube::{
    api::{ListParams, Patch, PatchParams},
    Api, Client,
};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct KubeApplications {
    client: Client,
}

impl KubeApplications {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Application> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ApplicationSource for KubeApplications {
    #[instrument(skip(self))]
    async fn list_applications(&self, namespace: &str) -> Result<Vec<ApplicationStatus>> {
        let list = self.api(namespace).list(&ListParams::default()).await?;
        debug!("Listed {} applications", list.items.len());
        Ok(list.items.iter().map(ApplicationStatus::from).collect())
    }

    #[instrument(skip(self))]
    async fn get_application(&self, namespace: &str, name: &str) -> Result<ApplicationStatus> {
        let app = self
            .api(namespace)
            .get(name)
            .await
            .map_err(|e| RollcallError::FetchError {
                application: format!("{}/{}", namespace, name),
                message: if is_not_found(&e) {
                    "not found".to_string()
                } else {
                    e.to_string()
                },
            })?;
        Ok(ApplicationStatus::from(&app))
    }
}

#[async_trait]
impl RefreshStrategy for KubeApplications {
    /// Merge patch, so the annotation is added when absent and replaced otherwise
    #[instrument(skip(self))]
    async fn request_refresh(&self, namespace: &str, name: &str, mode: RefreshMode) -> Result<()> {
        let refresh = BTreeMap::from([(annotations::REFRESH, mode.as_str())]);
        let patch = json!({ "metadata": { "annotations": refresh } });
        self.api(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}
