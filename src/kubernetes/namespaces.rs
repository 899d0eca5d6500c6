// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace management utilities

use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client,
};
use tracing::{debug, info, instrument};

#[instrument(skip(client))]
pub async fn namespace_exists(client: &Client, namespace: &str) -> kube::Result<bool> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let found = namespaces.get_opt(namespace).await?.is_some();
    debug!("Namespace {} exists: {}", namespace, found);
    Ok(found)
}

/// Create a namespace; AlreadyExists is returned to the caller as-is
#[instrument(skip(client))]
pub async fn create_namespace(client: &Client, namespace: &str) -> kube::Result<()> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let ns = Namespace {
        metadata: ObjectMeta {
            name: Some(namespace.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    namespaces.create(&PostParams::default(), &ns).await?;
    info!("Namespace {} created", namespace);
    Ok(())
}
