// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RollcallError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// Transient, per application. Absorbed into "not ready" while polling.
    #[error("Failed to fetch application {application}: {message}")]
    FetchError { application: String, message: String },

    #[error(
        "Applications in {namespace} did not converge before the deadline; not ready: [{}], stuck: [{}]",
        not_ready.join(", "),
        stuck.join(", ")
    )]
    TimeoutError {
        namespace: String,
        not_ready: Vec<String>,
        stuck: Vec<String>,
    },

    #[error("Polling applications in {namespace} was cancelled")]
    Cancelled { namespace: String },

    #[error("Failed to decode payload for secret {namespace}/{name}: {source}")]
    DecodeError {
        namespace: String,
        name: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("Failed to provision secret {namespace}/{name}: {message}")]
    ProvisionError {
        namespace: String,
        name: String,
        message: String,
    },

    #[error("Failed to patch {resource} in namespace {namespace}: {message}")]
    PatchError {
        namespace: String,
        resource: String,
        message: String,
    },

    #[error("Install command {command} failed: {message}")]
    InstallProcessError { command: String, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CRD not available: {0}")]
    CrdUnavailable(String),
}

pub type Result<T> = std::result::Result<T, RollcallError>;

/// Returns true when the API server answered 404.
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 404)
}

/// Returns true when a create raced with another writer.
pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 409 && ae.reason == "AlreadyExists")
}

/// Returns true for an optimistic concurrency conflict on update.
pub fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 409 && ae.reason == "Conflict")
}
