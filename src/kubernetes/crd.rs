// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::{Result, RollcallError};
use kube::{discovery::Discovery, Client};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

const GROUP: &str = "argoproj.io";
const VERSION: &str = "v1alpha1";
const KIND: &str = "Application";

/// Wait for the Application CRD to become available in the cluster.
/// Backs off exponentially from POLL_INTERVAL_SECS, giving up after `max_wait`.
pub async fn wait_for_application_crd(client: &Client, max_wait: Duration) -> Result<()> {
    let deadline = Instant::now() + max_wait;
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match check_application_crd_exists(client).await {
            Ok(true) => {
                info!("Application CRD ({}/{}) is available", GROUP, VERSION);
                return Ok(());
            }
            Ok(false) => {
                info!(
                    "Application CRD ({}/{}) not yet available, waiting {} seconds...",
                    GROUP, VERSION, interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for Application CRD: {}, retrying in {} seconds...",
                    e, interval
                );
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(RollcallError::CrdUnavailable(format!(
                "{}/{} {} not served after {}s",
                GROUP,
                VERSION,
                KIND,
                max_wait.as_secs()
            )));
        }
        sleep(Duration::from_secs(interval).min(deadline - now)).await;

        // Exponential backoff with max cap
        interval = (interval * 2).min(POLL_MAX_INTERVAL_SECS);
    }
}

async fn check_application_crd_exists(client: &Client) -> Result<bool> {
    let discovery = Discovery::new(client.clone())
        .filter(&[GROUP])
        .run()
        .await?;

    for group in discovery.groups() {
        if group.name() == GROUP {
            for (ar, _) in group.recommended_resources() {
                if ar.kind == KIND && ar.version == VERSION {
                    return Ok(true);
                }
            }
        }
    }

    Ok(false)
}
