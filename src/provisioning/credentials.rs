// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Registry credential provisioning.
//!
//! Ensures a namespace and a `kubernetes.io/dockerconfigjson` secret exist
//! with the desired payload. Every step tolerates a concurrent writer: an
//! `AlreadyExists` on create falls through to the update path, and an update
//! conflict re-reads the secret before trying again.

use crate::constants::{registry, CONFLICT_RETRIES};
use crate::error::{is_already_exists, is_conflict, Result, RollcallError};
use crate::types::Credential;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Namespace and secret operations the provisioner needs
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn namespace_exists(&self, name: &str) -> kube::Result<bool>;

    async fn create_namespace(&self, name: &str) -> kube::Result<()>;

    async fn get_secret(&self, namespace: &str, name: &str) -> kube::Result<Option<Secret>>;

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> kube::Result<()>;

    async fn replace_secret(&self, namespace: &str, secret: &Secret) -> kube::Result<()>;
}

/// What provisioning did to the stored secret
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created,
    Updated,
    Unchanged,
}

pub struct CredentialProvisioner<S> {
    store: S,
}

impl<S: SecretStore> CredentialProvisioner<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Ensure `namespace/name` holds the decoded `encoded_payload`
    #[instrument(skip(self, encoded_payload))]
    pub async fn ensure_credential(
        &self,
        namespace: &str,
        name: &str,
        encoded_payload: &str,
    ) -> Result<ProvisionOutcome> {
        let credential = Credential::decode(namespace, name, encoded_payload)?;

        self.ensure_namespace(&credential).await?;

        let outcome = match self.store.get_secret(namespace, name).await {
            Ok(None) => self.create(&credential).await?,
            Ok(Some(existing)) => self.update(&credential, existing).await?,
            Err(e) => return Err(provision_error(&credential, "failed to get secret", e)),
        };

        info!("Secret {}/{} {:?}", namespace, name, outcome);
        Ok(outcome)
    }

    async fn ensure_namespace(&self, credential: &Credential) -> Result<()> {
        let namespace = &credential.namespace;

        match self.store.namespace_exists(namespace).await {
            Ok(true) => {
                debug!("Namespace {} already exists", namespace);
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => return Err(provision_error(credential, "failed to check namespace", e)),
        }

        info!("Creating namespace {}", namespace);
        match self.store.create_namespace(namespace).await {
            Ok(()) => Ok(()),
            Err(e) if is_already_exists(&e) => {
                debug!("Namespace {} was created concurrently", namespace);
                Ok(())
            }
            Err(e) => Err(provision_error(credential, "failed to create namespace", e)),
        }
    }

    async fn create(&self, credential: &Credential) -> Result<ProvisionOutcome> {
        let secret = registry_secret(credential);

        match self.store.create_secret(&credential.namespace, &secret).await {
            Ok(()) => Ok(ProvisionOutcome::Created),
            Err(e) if is_already_exists(&e) => {
                debug!(
                    "Secret {}/{} was created concurrently, updating instead",
                    credential.namespace, credential.name
                );
                let existing = self.refetch(credential).await?;
                self.update(credential, existing).await
            }
            Err(e) => Err(provision_error(credential, "failed to create secret", e)),
        }
    }

    async fn update(&self, credential: &Credential, mut existing: Secret) -> Result<ProvisionOutcome> {
        let mut attempt = 0u32;

        loop {
            if payload_of(&existing) == Some(credential.payload.as_slice()) {
                debug!(
                    "Secret {}/{} already holds the desired payload",
                    credential.namespace, credential.name
                );
                return Ok(ProvisionOutcome::Unchanged);
            }

            existing.data = Some(registry_data(credential));
            match self
                .store
                .replace_secret(&credential.namespace, &existing)
                .await
            {
                Ok(()) => return Ok(ProvisionOutcome::Updated),
                Err(e) if is_conflict(&e) && attempt + 1 < CONFLICT_RETRIES => {
                    attempt += 1;
                    warn!(
                        "Conflict updating secret {}/{}, retrying ({}/{})",
                        credential.namespace, credential.name, attempt, CONFLICT_RETRIES
                    );
                    existing = self.refetch(credential).await?;
                }
                Err(e) => return Err(provision_error(credential, "failed to update secret", e)),
            }
        }
    }

    async fn refetch(&self, credential: &Credential) -> Result<Secret> {
        match self
            .store
            .get_secret(&credential.namespace, &credential.name)
            .await
        {
            Ok(Some(secret)) => Ok(secret),
            Ok(None) => Err(RollcallError::ProvisionError {
                namespace: credential.namespace.clone(),
                name: credential.name.clone(),
                message: "secret disappeared while updating".to_string(),
            }),
            Err(e) => Err(provision_error(credential, "failed to get secret", e)),
        }
    }
}

fn provision_error(credential: &Credential, context: &str, err: kube::Error) -> RollcallError {
    RollcallError::ProvisionError {
        namespace: credential.namespace.clone(),
        name: credential.name.clone(),
        message: format!("{}: {}", context, err),
    }
}

fn registry_data(credential: &Credential) -> BTreeMap<String, ByteString> {
    BTreeMap::from([(
        registry::SECRET_KEY.to_string(),
        ByteString(credential.payload.clone()),
    )])
}

fn registry_secret(credential: &Credential) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(credential.name.clone()),
            namespace: Some(credential.namespace.clone()),
            ..Default::default()
        },
        type_: Some(registry::SECRET_TYPE.to_string()),
        data: Some(registry_data(credential)),
        ..Default::default()
    }
}

/// The registry payload, if the secret holds nothing else
fn payload_of(secret: &Secret) -> Option<&[u8]> {
    let data = secret.data.as_ref()?;
    if data.len() != 1 {
        return None;
    }
    data.get(registry::SECRET_KEY).map(|b| b.0.as_slice())
}
