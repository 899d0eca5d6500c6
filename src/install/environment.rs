// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::config::Config;
use std::collections::BTreeMap;
use std::fmt;

/// Variables handed to the install process on top of the inherited
/// environment. Built from [`Config`]; never written to this process.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct InstallEnvironment {
    vars: BTreeMap<String, String>,
}

impl InstallEnvironment {
    pub fn from_config(config: &Config) -> Self {
        let optional = |value: &Option<String>| value.clone().unwrap_or_default();

        let vars = BTreeMap::from([
            ("MY_GITHUB_ORG", config.fork_organization.clone()),
            ("MY_GITHUB_TOKEN", optional(&config.github_token)),
            ("MY_GIT_FORK_REMOTE", config.fork_remote.clone()),
            ("TEST_BRANCH_ID", config.test_branch_id.clone()),
            ("QUAY_TOKEN", optional(&config.quay_token)),
            ("IMAGE_CONTROLLER_QUAY_ORG", optional(&config.default_quay_org)),
            ("IMAGE_CONTROLLER_QUAY_TOKEN", optional(&config.default_quay_org_token)),
            (
                "BUILD_SERVICE_IMAGE_TAG_EXPIRATION",
                config.image_tag_expiration.clone(),
            ),
            ("PAC_GITHUB_APP_ID", optional(&config.pac_github_app_id)),
            (
                "PAC_GITHUB_APP_PRIVATE_KEY",
                optional(&config.pac_github_app_private_key),
            ),
            // vault is the token storage the e2e suites expect
            ("IS_VAULT_TOKEN_STORAGE_TYPE", "true".to_string()),
            ("INFRA_DEPLOYMENTS_BRANCH", config.target_branch.clone()),
        ]);

        Self {
            vars: vars.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// Values carry tokens; only the keys are printed.
impl fmt::Debug for InstallEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.vars.keys()).finish()
    }
}
