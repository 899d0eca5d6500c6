// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Polls application resources until all of them are synced and healthy.
//!
//! One hard refresh of the aggregate application is requested up front so the
//! first sample is not served from a stale controller cache. Every cycle then
//! takes a single list snapshot, evaluates it, and soft-refreshes the
//! applications reporting a hung sync. Cycles are bounded by a wall-clock
//! deadline and a cancellation token checked at each cycle boundary; an
//! in-flight store call still delays both.

use crate::config::Config;
use crate::constants::gitops;
use crate::convergence::source::{ApplicationSource, RefreshMode, RefreshStrategy};
use crate::error::{Result, RollcallError};
use crate::types::ApplicationStatus;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Poll cadence and overall deadline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollSettings {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(RollcallError::InvalidConfig(
                "poll interval must be positive".to_string(),
            ));
        }
        if self.interval >= self.timeout {
            return Err(RollcallError::InvalidConfig(format!(
                "poll interval {:?} must be smaller than timeout {:?}",
                self.interval, self.timeout
            )));
        }
        Ok(())
    }
}

impl From<&Config> for PollSettings {
    fn from(config: &Config) -> Self {
        Self::new(config.poll_interval, config.poll_timeout)
    }
}

/// Readiness of the tracked applications as seen in one cycle
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConvergenceResult {
    pub cycle: u32,
    pub converged: bool,
    pub not_ready: Vec<String>,
    pub stuck: Vec<String>,
    pub applications: Vec<ApplicationStatus>,
}

impl ConvergenceResult {
    pub fn not_ready_count(&self) -> usize {
        self.not_ready.len()
    }
}

pub struct ConvergencePoller<S, R> {
    source: S,
    refresher: R,
    namespace: String,
    aggregate_application: String,
}

impl<S, R> ConvergencePoller<S, R>
where
    S: ApplicationSource,
    R: RefreshStrategy,
{
    pub fn new(source: S, refresher: R, namespace: impl Into<String>) -> Self {
        Self {
            source,
            refresher,
            namespace: namespace.into(),
            aggregate_application: gitops::AGGREGATE_APPLICATION.to_string(),
        }
    }

    /// Override the application that receives the initial hard refresh
    pub fn with_aggregate_application(mut self, name: impl Into<String>) -> Self {
        self.aggregate_application = name.into();
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Names of every application currently present in the namespace
    pub async fn application_names(&self) -> Result<BTreeSet<String>> {
        let applications = self.source.list_applications(&self.namespace).await?;
        Ok(applications.into_iter().map(|a| a.name).collect())
    }

    /// Fail with a fetch error when any of `applications` does not exist
    pub async fn verify_applications(&self, applications: &BTreeSet<String>) -> Result<()> {
        for name in applications {
            let status = self.source.get_application(&self.namespace, name).await?;
            debug!("Found application {}", status);
        }
        Ok(())
    }

    /// Evaluate readiness once, without requesting any refresh
    pub async fn snapshot(&self, applications: &BTreeSet<String>) -> ConvergenceResult {
        self.evaluate(applications, 0).await
    }

    /// Poll until every application is ready, the deadline passes, or `cancel` fires
    #[instrument(
        skip(self, applications, cancel),
        fields(namespace = %self.namespace, applications = applications.len())
    )]
    pub async fn poll_until_converged(
        &self,
        applications: &BTreeSet<String>,
        settings: &PollSettings,
        cancel: &CancellationToken,
    ) -> Result<ConvergenceResult> {
        settings.validate()?;
        if applications.is_empty() {
            return Err(RollcallError::InvalidConfig(
                "no applications to poll".to_string(),
            ));
        }

        let deadline = Instant::now().checked_add(settings.timeout).ok_or_else(|| {
            RollcallError::InvalidConfig(format!(
                "poll timeout {:?} is too large",
                settings.timeout
            ))
        })?;

        info!(
            "Requesting hard refresh of {}/{}",
            self.namespace, self.aggregate_application
        );
        self.request_refresh(&self.aggregate_application, RefreshMode::Hard)
            .await;

        // First sample one interval after the hard refresh
        let mut ticker = time::interval_at(Instant::now() + settings.interval, settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cycle = 0u32;
        let mut last: Option<ConvergenceResult> = None;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("Polling cancelled after {} cycles", cycle);
                    return Err(RollcallError::Cancelled {
                        namespace: self.namespace.clone(),
                    });
                }
                _ = time::sleep_until(deadline) => {
                    return Err(self.timeout_error(applications, last));
                }
                _ = ticker.tick() => {}
            }

            cycle += 1;
            let result = self.evaluate(applications, cycle).await;

            if !result.stuck.is_empty() {
                self.recover(&result.stuck).await;
            }

            if result.converged {
                info!("All {} applications are ready", applications.len());
                return Ok(result);
            }

            info!(
                "Cycle {}: {} of {} applications not ready ({} stuck)",
                cycle,
                result.not_ready_count(),
                applications.len(),
                result.stuck.len()
            );
            last = Some(result);
        }
    }

    async fn evaluate(&self, applications: &BTreeSet<String>, cycle: u32) -> ConvergenceResult {
        let snapshot: Option<HashMap<String, ApplicationStatus>> =
            match self.source.list_applications(&self.namespace).await {
                Ok(items) => Some(items.into_iter().map(|a| (a.name.clone(), a)).collect()),
                Err(e) => {
                    warn!(
                        "Failed to list applications in {}, treating all as not ready: {}",
                        self.namespace, e
                    );
                    None
                }
            };

        let mut not_ready = Vec::new();
        let mut stuck = Vec::new();
        let mut observed = Vec::new();

        for name in applications {
            let Some(snapshot) = snapshot.as_ref() else {
                not_ready.push(name.clone());
                continue;
            };

            match snapshot.get(name) {
                Some(status) if status.is_ready() => {
                    debug!("Application {} is ready", name);
                    observed.push(status.clone());
                }
                Some(status) => {
                    info!("Application {} not ready", status);
                    not_ready.push(name.clone());
                    if status.is_stuck() {
                        stuck.push(name.clone());
                    }
                    observed.push(status.clone());
                }
                None => {
                    let err = RollcallError::FetchError {
                        application: name.clone(),
                        message: format!("not present in namespace {}", self.namespace),
                    };
                    warn!("{}", err);
                    not_ready.push(name.clone());
                }
            }
        }

        ConvergenceResult {
            cycle,
            converged: not_ready.is_empty(),
            not_ready,
            stuck,
            applications: observed,
        }
    }

    async fn recover(&self, stuck: &[String]) {
        for name in stuck {
            info!("Refreshing stuck application {}/{}", self.namespace, name);
            self.request_refresh(name, RefreshMode::Soft).await;
        }
    }

    /// Best effort; failures are logged and polling carries on
    async fn request_refresh(&self, name: &str, mode: RefreshMode) {
        match self
            .refresher
            .request_refresh(&self.namespace, name, mode)
            .await
        {
            Ok(()) => debug!("Requested {} refresh of {}/{}", mode, self.namespace, name),
            Err(e) => warn!(
                "Failed to request {} refresh of {}/{}: {}",
                mode, self.namespace, name, e
            ),
        }
    }

    fn timeout_error(
        &self,
        applications: &BTreeSet<String>,
        last: Option<ConvergenceResult>,
    ) -> RollcallError {
        let (not_ready, stuck) = match last {
            Some(result) => (result.not_ready, result.stuck),
            None => (applications.iter().cloned().collect(), Vec::new()),
        };

        RollcallError::TimeoutError {
            namespace: self.namespace.clone(),
            not_ready,
            stuck,
        }
    }
}
