// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster installation sequence.
//!
//! Runs the bootstrap script, applies the OAuth redirect proxy override and
//! provisions the registry pull secret. The first failing step aborts the
//! sequence. Waiting for the GitOps applications to converge is left to the
//! caller.

use crate::config::Config;
use crate::constants::registry;
use crate::error::{Result, RollcallError};
use crate::install::{InstallCommand, InstallEnvironment, InstallInvocation};
use crate::provisioning::{
    ConfigStore, CredentialProvisioner, DynamicConfigPatcher, PatchOutcome, ProvisionOutcome,
    SecretStore,
};
use tracing::info;

/// What each post-install step did
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallReport {
    pub config_override: PatchOutcome,
    pub credential: ProvisionOutcome,
}

pub struct InstallationOrchestrator<C, P, S> {
    config: Config,
    command: C,
    patcher: DynamicConfigPatcher<P>,
    provisioner: CredentialProvisioner<S>,
}

impl<C, P, S> InstallationOrchestrator<C, P, S>
where
    C: InstallCommand,
    P: ConfigStore,
    S: SecretStore,
{
    pub fn new(config: Config, command: C, config_store: P, secret_store: S) -> Self {
        Self {
            config,
            command,
            patcher: DynamicConfigPatcher::new(config_store),
            provisioner: CredentialProvisioner::new(secret_store),
        }
    }

    pub async fn install(&self) -> Result<InstallReport> {
        let Some(quay_token) = self.config.quay_token.as_deref() else {
            return Err(RollcallError::InvalidConfig(
                "QUAY_TOKEN must hold a base64-encoded docker config.json".to_string(),
            ));
        };

        if let Some(proxy) = self.config.oauth_redirect_proxy_url.as_deref() {
            url::Url::parse(proxy).map_err(|e| {
                RollcallError::InvalidConfig(format!(
                    "OAUTH_REDIRECT_PROXY_URL is not a valid URL: {}",
                    e
                ))
            })?;
        }

        let environment = InstallEnvironment::from_config(&self.config);
        let invocation = InstallInvocation::bootstrap(&self.config, environment);

        info!(
            "Installing from {} (branch {}, test branch id {})",
            invocation.working_dir.display(),
            self.config.target_branch,
            self.config.test_branch_id
        );
        self.command.run(&invocation).await?;
        info!("Install command finished");

        let config_override = self
            .patcher
            .apply_config_override(&self.config.oauth_proxy_entry())
            .await?;

        let credential = self
            .provisioner
            .ensure_credential(registry::SECRET_NAMESPACE, registry::SECRET_NAME, quay_token)
            .await?;

        Ok(InstallReport {
            config_override,
            credential,
        })
    }
}
