// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::kubernetes::namespaces;
use crate::provisioning::SecretStore;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{api::PostParams, Api, Client};
use tracing::instrument;

/// Secrets and namespaces backed by the API server
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl KubeSecretStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn namespace_exists(&self, name: &str) -> kube::Result<bool> {
        namespaces::namespace_exists(&self.client, name).await
    }

    async fn create_namespace(&self, name: &str) -> kube::Result<()> {
        namespaces::create_namespace(&self.client, name).await
    }

    #[instrument(skip(self))]
    async fn get_secret(&self, namespace: &str, name: &str) -> kube::Result<Option<Secret>> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        secrets.get_opt(name).await
    }

    #[instrument(skip(self, secret))]
    async fn create_secret(&self, namespace: &str, secret: &Secret) -> kube::Result<()> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        secrets.create(&PostParams::default(), secret).await?;
        Ok(())
    }

    #[instrument(skip(self, secret))]
    async fn replace_secret(&self, namespace: &str, secret: &Secret) -> kube::Result<()> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let name = secret.metadata.name.clone().unwrap_or_default();
        secrets.replace(&name, &PostParams::default(), secret).await?;
        Ok(())
    }
}
