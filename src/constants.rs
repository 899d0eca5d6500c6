// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys used by rollcall
pub mod annotations {
    /// Argo CD re-evaluates an application when this is set to "hard" or "soft"
    pub const REFRESH: &str = "argocd.argoproj.io/refresh";
    /// Restart timestamp stamped on the Deployment's own metadata
    pub const RESTARTED_AT: &str = "kubectl.kubernetes.io/restartedAt";
}

/// GitOps controller layout
pub mod gitops {
    pub const NAMESPACE: &str = "openshift-gitops";
    /// Application set owning every other application
    pub const AGGREGATE_APPLICATION: &str = "all-application-sets";
    /// Diagnostic marker of a sync that hangs on the repo server
    pub const STUCK_MARKER: &str = "context deadline exceeded";
}

/// Polling defaults
pub mod poll {
    pub const INTERVAL_SECS: u64 = 10;
    pub const TIMEOUT_SECS: u64 = 1800;
}

/// Registry credential shared with test namespaces
pub mod registry {
    pub const SECRET_NAMESPACE: &str = "e2e-secrets";
    pub const SECRET_NAME: &str = "quay-repository";
    pub const SECRET_TYPE: &str = "kubernetes.io/dockerconfigjson";
    pub const SECRET_KEY: &str = ".dockerconfigjson";
}

/// OAuth redirect proxy override consumed by the SPI OAuth service
pub mod oauth_proxy {
    pub const NAMESPACE: &str = "spi-system";
    pub const CONFIG_MAP: &str = "spi-oauth-service-environment-config";
    pub const DEPLOYMENT: &str = "spi-oauth-service";
    pub const KEY: &str = "OAUTH_REDIRECT_PROXY_URL";
}

/// External install procedure
pub mod install {
    pub const DEFAULT_DIR: &str = "tmp/infra-deployments";
    pub const DEFAULT_BRANCH: &str = "main";
    pub const DEFAULT_FORK_NAME: &str = "qe";
    pub const DEFAULT_FORK_ORGANIZATION: &str = "redhat-appstudio-qe";
    pub const DEFAULT_IMAGE_TAG_EXPIRATION: &str = "6h";
    pub const SCRIPT: &str = "hack/bootstrap-cluster.sh";
    pub const ARGS: &[&str] = &["preview", "--keycloak", "--toolchain"];
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}

/// Conflicting updates are re-read and retried this many times
pub const CONFLICT_RETRIES: u32 = 3;
