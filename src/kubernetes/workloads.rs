// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::provisioning::ConfigStore;
use async_trait::async_trait;
use k8s_openapi::api::{apps::v1::Deployment, core::v1::ConfigMap};
use kube::{
    api::{Patch, PatchParams, PostParams},
    Api, Client,
};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::instrument;

/// ConfigMaps and Deployments backed by the API server
#[derive(Clone)]
pub struct KubeConfigStore {
    client: Client,
}

impl KubeConfigStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfigStore for KubeConfigStore {
    #[instrument(skip(self, value))]
    async fn merge_config_value(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
    ) -> kube::Result<()> {
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let data = BTreeMap::from([(key, value)]);
        let patch = json!({ "data": data });
        config_maps
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_workload(&self, namespace: &str, name: &str) -> kube::Result<Deployment> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        deployments.get(name).await
    }

    #[instrument(skip(self, deployment))]
    async fn replace_workload(&self, namespace: &str, deployment: &Deployment) -> kube::Result<()> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let name = deployment.metadata.name.clone().unwrap_or_default();
        deployments
            .replace(&name, &PostParams::default(), deployment)
            .await?;
        Ok(())
    }
}
