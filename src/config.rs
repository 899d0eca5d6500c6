// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{gitops, install, oauth_proxy, poll};
use crate::error::{Result, RollcallError};
use crate::types::DynamicConfigEntry;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration loaded from environment variables
#[derive(Clone)]
pub struct Config {
    /// Checkout of the infra-deployments repository holding the install script
    pub install_dir: PathBuf,
    pub target_branch: String,
    /// Organization owning the fork the install pushes preview changes to
    pub fork_organization: String,
    pub fork_remote: String,
    pub github_token: Option<String>,
    /// base64-encoded docker config.json with registry login credentials
    pub quay_token: Option<String>,
    pub default_quay_org: Option<String>,
    pub default_quay_org_token: Option<String>,
    pub image_tag_expiration: String,
    pub pac_github_app_id: Option<String>,
    pub pac_github_app_private_key: Option<String>,
    pub oauth_redirect_proxy_url: Option<String>,
    /// Suffix the install script appends to preview branches
    pub test_branch_id: String,
    pub gitops_namespace: String,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, treating empty values as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let config = Config {
            install_dir: PathBuf::from(get_or("INFRA_DEPLOYMENTS_DIR", install::DEFAULT_DIR)),
            target_branch: get_or("INFRA_DEPLOYMENTS_BRANCH", install::DEFAULT_BRANCH),
            fork_organization: get_or("MY_GITHUB_ORG", install::DEFAULT_FORK_ORGANIZATION),
            fork_remote: install::DEFAULT_FORK_NAME.to_string(),
            github_token: get("GITHUB_TOKEN"),
            quay_token: get("QUAY_TOKEN"),
            default_quay_org: get("DEFAULT_QUAY_ORG"),
            default_quay_org_token: get("DEFAULT_QUAY_ORG_TOKEN"),
            image_tag_expiration: get_or(
                "IMAGE_TAG_EXPIRATION",
                install::DEFAULT_IMAGE_TAG_EXPIRATION,
            ),
            pac_github_app_id: get("E2E_PAC_GITHUB_APP_ID"),
            pac_github_app_private_key: get("E2E_PAC_GITHUB_APP_PRIVATE_KEY"),
            oauth_redirect_proxy_url: get("OAUTH_REDIRECT_PROXY_URL"),
            test_branch_id: random_branch_id(),
            gitops_namespace: get_or("GITOPS_NAMESPACE", gitops::NAMESPACE),
            poll_interval: Duration::from_secs(parse_secs(
                "POLL_INTERVAL_SECS",
                get("POLL_INTERVAL_SECS"),
                poll::INTERVAL_SECS,
            )?),
            poll_timeout: Duration::from_secs(parse_secs(
                "POLL_TIMEOUT_SECS",
                get("POLL_TIMEOUT_SECS"),
                poll::TIMEOUT_SECS,
            )?),
        };

        Ok(config)
    }

    /// The OAuth redirect proxy override applied after installation
    pub fn oauth_proxy_entry(&self) -> DynamicConfigEntry {
        DynamicConfigEntry {
            namespace: oauth_proxy::NAMESPACE.to_string(),
            config_object_name: oauth_proxy::CONFIG_MAP.to_string(),
            workload_name: oauth_proxy::DEPLOYMENT.to_string(),
            key: oauth_proxy::KEY.to_string(),
            value: self.oauth_redirect_proxy_url.clone(),
        }
    }
}

fn parse_secs(key: &str, value: Option<String>, default: u64) -> Result<u64> {
    match value {
        Some(v) => v.trim().parse().map_err(|e| {
            RollcallError::InvalidConfig(format!("{} must be a number of seconds: {}", key, e))
        }),
        None => Ok(default),
    }
}

fn random_branch_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect()
}

fn redacted(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "<redacted>"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("install_dir", &self.install_dir)
            .field("target_branch", &self.target_branch)
            .field("fork_organization", &self.fork_organization)
            .field("fork_remote", &self.fork_remote)
            .field("github_token", &redacted(&self.github_token))
            .field("quay_token", &redacted(&self.quay_token))
            .field("default_quay_org", &self.default_quay_org)
            .field("default_quay_org_token", &redacted(&self.default_quay_org_token))
            .field("image_tag_expiration", &self.image_tag_expiration)
            .field("pac_github_app_id", &self.pac_github_app_id)
            .field(
                "pac_github_app_private_key",
                &redacted(&self.pac_github_app_private_key),
            )
            .field("oauth_redirect_proxy_url", &self.oauth_redirect_proxy_url)
            .field("test_branch_id", &self.test_branch_id)
            .field("gitops_namespace", &self.gitops_namespace)
            .field("poll_interval", &self.poll_interval)
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}
