// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mock Kubernetes API server and in-memory store fakes.

use crate::convergence::{ApplicationSource, RefreshMode, RefreshStrategy};
use crate::error::{Result, RollcallError};
use crate::install::{InstallCommand, InstallInvocation};
use crate::provisioning::{ConfigStore, SecretStore};
use crate::types::{ApplicationStatus, HealthStatus, SyncStatus};
use async_trait::async_trait;
use futures::future::BoxFuture;
use http::{Request, Response};
use http_body_util::BodyExt;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::core::ErrorResponse;
use kube::Client;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

// =============================================================================
// Mock API server
// =============================================================================

/// A request the mock API server received
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    /// Build a kube Client from this mock service; clone first to keep a handle
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = BoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let (parts, body) = req.into_parts();
        let method = parts.method.to_string();
        let path = parts.uri.path().to_string();

        let response = self.find_response(&method, &path);
        let requests = self.requests.clone();

        Box::pin(async move {
            let body = body.collect().await.map_err(tower::BoxError::from)?.to_bytes();
            requests.lock().unwrap().push(RecordedRequest {
                method,
                path,
                body: String::from_utf8_lossy(&body).to_string(),
            });

            let (status, body) = response.unwrap_or_else(|| (404, not_found_json("resource", "unknown")));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a mock namespace JSON response
pub fn namespace_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        }
    })
    .to_string()
}

/// Create a mock secret JSON response
pub fn secret_json(namespace: &str, name: &str, encoded_config: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "resourceVersion": "1"
        },
        "type": "kubernetes.io/dockerconfigjson",
        "data": { ".dockerconfigjson": encoded_config }
    })
    .to_string()
}

/// Create a mock Argo CD Application JSON object
pub fn application_value(name: &str, sync: &str, health: &str) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": "argoproj.io/v1alpha1",
        "kind": "Application",
        "metadata": {
            "name": name,
            "namespace": "openshift-gitops",
            "resourceVersion": "1"
        },
        "spec": { "project": "default" },
        "status": {
            "sync": { "status": sync },
            "health": { "status": health }
        }
    })
}

/// Create a mock Deployment JSON response
pub fn deployment_json(namespace: &str, name: &str, replicas: i32) -> String {
    serde_json::json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "resourceVersion": "7"
        },
        "spec": {
            "replicas": replicas,
            "selector": { "matchLabels": { "app": name } },
            "template": { "metadata": { "labels": { "app": name } } }
        }
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(404, "NotFound", &format!("{} \"{}\" not found", resource, name))
}

/// Create a Status failure response
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// An API error as kube surfaces it
pub fn api_error(code: u16, reason: &str, message: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: message.to_string(),
        reason: reason.to_string(),
        code,
    })
}

// =============================================================================
// Applications
// =============================================================================

pub fn app_status(
    name: &str,
    sync_status: SyncStatus,
    health_status: HealthStatus,
    message: Option<&str>,
) -> ApplicationStatus {
    ApplicationStatus {
        name: name.to_string(),
        sync_status,
        health_status,
        last_message: message.map(str::to_string),
    }
}

pub fn ready_app(name: &str) -> ApplicationStatus {
    app_status(name, SyncStatus::Synced, HealthStatus::Healthy, None)
}

pub fn progressing_app(name: &str) -> ApplicationStatus {
    app_status(name, SyncStatus::Synced, HealthStatus::Progressing, None)
}

pub fn stuck_app(name: &str) -> ApplicationStatus {
    app_status(
        name,
        SyncStatus::OutOfSync,
        HealthStatus::Healthy,
        Some("rpc error: code = Unknown desc = context deadline exceeded"),
    )
}

#[derive(Default)]
struct ApplicationsState {
    /// Upcoming list results; `None` makes the list call fail
    queued: VecDeque<Option<Vec<ApplicationStatus>>>,
    current: Option<Vec<ApplicationStatus>>,
    list_calls: usize,
    refreshes: Vec<(String, RefreshMode)>,
    fail_refresh: bool,
}

/// Scripted application store. Each list call consumes the next queued
/// snapshot and keeps returning the last one once the queue runs dry.
#[derive(Clone, Default)]
pub struct FakeApplications {
    state: Arc<Mutex<ApplicationsState>>,
}

impl FakeApplications {
    pub fn new(initial: Vec<ApplicationStatus>) -> Self {
        Self::default().then_list(initial)
    }

    pub fn failing_list() -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().queued.push_back(None);
        fake
    }

    pub fn then_list(self, applications: Vec<ApplicationStatus>) -> Self {
        self.state
            .lock()
            .unwrap()
            .queued
            .push_back(Some(applications));
        self
    }

    pub fn with_failing_refresh(self) -> Self {
        self.state.lock().unwrap().fail_refresh = true;
        self
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn refreshes(&self) -> Vec<(String, RefreshMode)> {
        self.state.lock().unwrap().refreshes.clone()
    }
}

#[async_trait]
impl ApplicationSource for FakeApplications {
    async fn list_applications(&self, namespace: &str) -> Result<Vec<ApplicationStatus>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        if let Some(next) = state.queued.pop_front() {
            state.current = next;
        }
        state.current.clone().ok_or_else(|| RollcallError::FetchError {
            application: format!("{}/*", namespace),
            message: "connection refused".to_string(),
        })
    }

    async fn get_application(&self, namespace: &str, name: &str) -> Result<ApplicationStatus> {
        let state = self.state.lock().unwrap();
        state
            .current
            .iter()
            .flatten()
            .chain(state.queued.front().into_iter().flatten().flatten())
            .find(|a| a.name == name)
            .cloned()
            .ok_or_else(|| RollcallError::FetchError {
                application: format!("{}/{}", namespace, name),
                message: "not found".to_string(),
            })
    }
}

#[async_trait]
impl RefreshStrategy for FakeApplications {
    async fn request_refresh(&self, namespace: &str, name: &str, mode: RefreshMode) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.refreshes.push((name.to_string(), mode));
        if state.fail_refresh {
            return Err(RollcallError::KubeError(api_error(
                500,
                "InternalError",
                &format!("failed to patch {}/{}", namespace, name),
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Secrets
// =============================================================================

#[derive(Default)]
struct SecretsState {
    namespaces: BTreeSet<String>,
    secrets: BTreeMap<(String, String), Secret>,
    calls: Vec<String>,
    namespace_race: bool,
    secret_race: Option<Secret>,
    replace_conflicts: u32,
    fail_get_secret: bool,
}

/// Secret store kept in memory, with switches for the races a real API
/// server produces
#[derive(Clone, Default)]
pub struct InMemorySecretStore {
    state: Arc<Mutex<SecretsState>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(self, namespace: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .namespaces
            .insert(namespace.to_string());
        self
    }

    pub fn with_secret(self, namespace: &str, name: &str, payload: &[u8]) -> Self {
        let secret = dockerconfig_secret(namespace, name, payload);
        {
            let mut state = self.state.lock().unwrap();
            state.namespaces.insert(namespace.to_string());
            state
                .secrets
                .insert((namespace.to_string(), name.to_string()), secret);
        }
        self
    }

    /// Namespace lookup misses, but another writer creates it first
    pub fn with_namespace_race(self) -> Self {
        self.state.lock().unwrap().namespace_race = true;
        self
    }

    /// Secret lookup misses, but another writer creates it with `payload` first
    pub fn with_secret_race(self, namespace: &str, name: &str, payload: &[u8]) -> Self {
        self.state.lock().unwrap().secret_race = Some(dockerconfig_secret(namespace, name, payload));
        self
    }

    pub fn with_replace_conflicts(self, conflicts: u32) -> Self {
        self.state.lock().unwrap().replace_conflicts = conflicts;
        self
    }

    pub fn with_failing_get(self) -> Self {
        self.state.lock().unwrap().fail_get_secret = true;
        self
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.state.lock().unwrap().namespaces.contains(namespace)
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.state
            .lock()
            .unwrap()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn payload(&self, namespace: &str, name: &str) -> Option<Vec<u8>> {
        self.secret(namespace, name)
            .and_then(|s| s.data)
            .and_then(|d| d.get(".dockerconfigjson").map(|b| b.0.clone()))
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of create/replace calls that reached the store
    pub fn writes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with("create_secret") || c.starts_with("replace_secret"))
            .count()
    }
}

pub fn dockerconfig_secret(namespace: &str, name: &str, payload: &[u8]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        type_: Some("kubernetes.io/dockerconfigjson".to_string()),
        data: Some(BTreeMap::from([(
            ".dockerconfigjson".to_string(),
            ByteString(payload.to_vec()),
        )])),
        ..Default::default()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn namespace_exists(&self, name: &str) -> kube::Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("namespace_exists {}", name));
        if state.namespace_race {
            return Ok(false);
        }
        Ok(state.namespaces.contains(name))
    }

    async fn create_namespace(&self, name: &str) -> kube::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create_namespace {}", name));
        if state.namespace_race || state.namespaces.contains(name) {
            state.namespace_race = false;
            state.namespaces.insert(name.to_string());
            return Err(api_error(
                409,
                "AlreadyExists",
                &format!("namespaces \"{}\" already exists", name),
            ));
        }
        state.namespaces.insert(name.to_string());
        Ok(())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> kube::Result<Option<Secret>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("get_secret {}/{}", namespace, name));
        if state.fail_get_secret {
            return Err(api_error(403, "Forbidden", "secrets is forbidden"));
        }
        Ok(state
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> kube::Result<()> {
        let mut state = self.state.lock().unwrap();
        let name = secret.metadata.name.clone().unwrap_or_default();
        state.calls.push(format!("create_secret {}/{}", namespace, name));

        if let Some(raced) = state.secret_race.take() {
            state
                .secrets
                .insert((namespace.to_string(), name.clone()), raced);
        }
        let key = (namespace.to_string(), name.clone());
        if state.secrets.contains_key(&key) {
            return Err(api_error(
                409,
                "AlreadyExists",
                &format!("secrets \"{}\" already exists", name),
            ));
        }
        state.secrets.insert(key, secret.clone());
        Ok(())
    }

    async fn replace_secret(&self, namespace: &str, secret: &Secret) -> kube::Result<()> {
        let mut state = self.state.lock().unwrap();
        let name = secret.metadata.name.clone().unwrap_or_default();
        state.calls.push(format!("replace_secret {}/{}", namespace, name));

        if state.replace_conflicts > 0 {
            state.replace_conflicts -= 1;
            return Err(api_error(
                409,
                "Conflict",
                "the object has been modified; please apply your changes to the latest version",
            ));
        }
        let key = (namespace.to_string(), name.clone());
        if !state.secrets.contains_key(&key) {
            return Err(api_error(404, "NotFound", &format!("secrets \"{}\" not found", name)));
        }
        state.secrets.insert(key, secret.clone());
        Ok(())
    }
}

// =============================================================================
// Config maps and workloads
// =============================================================================

#[derive(Default)]
struct ConfigState {
    config_maps: BTreeMap<(String, String), BTreeMap<String, String>>,
    deployments: BTreeMap<(String, String), Deployment>,
    calls: Vec<String>,
    fail_merge: bool,
    fail_get_workload: bool,
    replace_conflicts: u32,
}

#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    state: Arc<Mutex<ConfigState>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_map(self, namespace: &str, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .config_maps
            .insert((namespace.to_string(), name.to_string()), BTreeMap::new());
        self
    }

    pub fn with_deployment(
        self,
        namespace: &str,
        name: &str,
        replicas: i32,
        annotations: &[(&str, &str)],
    ) -> Self {
        let annotations: BTreeMap<String, String> = annotations
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let deployment = Deployment {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                annotations: (!annotations.is_empty()).then_some(annotations),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(replicas),
                ..Default::default()
            }),
            ..Default::default()
        };
        self.state
            .lock()
            .unwrap()
            .deployments
            .insert((namespace.to_string(), name.to_string()), deployment);
        self
    }

    pub fn with_failing_merge(self) -> Self {
        self.state.lock().unwrap().fail_merge = true;
        self
    }

    pub fn with_failing_workload_get(self) -> Self {
        self.state.lock().unwrap().fail_get_workload = true;
        self
    }

    pub fn with_replace_conflicts(self, conflicts: u32) -> Self {
        self.state.lock().unwrap().replace_conflicts = conflicts;
        self
    }

    pub fn config_value(&self, namespace: &str, name: &str, key: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .config_maps
            .get(&(namespace.to_string(), name.to_string()))
            .and_then(|data| data.get(key).cloned())
    }

    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.state
            .lock()
            .unwrap()
            .deployments
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn merge_config_value(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
    ) -> kube::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("merge_config_value {}/{}", namespace, name));
        if state.fail_merge {
            return Err(api_error(422, "Invalid", "malformed merge patch"));
        }
        match state
            .config_maps
            .get_mut(&(namespace.to_string(), name.to_string()))
        {
            Some(data) => {
                data.insert(key.to_string(), value.to_string());
                Ok(())
            }
            None => Err(api_error(
                404,
                "NotFound",
                &format!("configmaps \"{}\" not found", name),
            )),
        }
    }

    async fn get_workload(&self, namespace: &str, name: &str) -> kube::Result<Deployment> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("get_workload {}/{}", namespace, name));
        if state.fail_get_workload {
            return Err(api_error(503, "ServiceUnavailable", "apiserver is shutting down"));
        }
        state
            .deployments
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| {
                api_error(
                    404,
                    "NotFound",
                    &format!("deployments.apps \"{}\" not found", name),
                )
            })
    }

    async fn replace_workload(&self, namespace: &str, deployment: &Deployment) -> kube::Result<()> {
        let mut state = self.state.lock().unwrap();
        let name = deployment.metadata.name.clone().unwrap_or_default();
        state.calls.push(format!("replace_workload {}/{}", namespace, name));
        if state.replace_conflicts > 0 {
            state.replace_conflicts -= 1;
            return Err(api_error(409, "Conflict", "the object has been modified"));
        }
        state
            .deployments
            .insert((namespace.to_string(), name), deployment.clone());
        Ok(())
    }
}

// =============================================================================
// Install command
// =============================================================================

#[derive(Clone, Default)]
pub struct FakeInstallCommand {
    invocations: Arc<Mutex<Vec<InstallInvocation>>>,
    failure: Option<String>,
}

impl FakeInstallCommand {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn invocations(&self) -> Vec<InstallInvocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl InstallCommand for FakeInstallCommand {
    async fn run(&self, invocation: &InstallInvocation) -> Result<()> {
        self.invocations.lock().unwrap().push(invocation.clone());
        match &self.failure {
            Some(message) => Err(RollcallError::InstallProcessError {
                command: invocation.display_command(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}
