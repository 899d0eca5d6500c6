// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rollcall::config::Config;
use rollcall::convergence::{ConvergencePoller, PollSettings};
use rollcall::install::{InstallationOrchestrator, ScriptRunner};
use rollcall::kubernetes::{
    wait_for_application_crd, KubeApplications, KubeConfigStore, KubeSecretStore,
};

/// Install a preview cluster and wait for its GitOps applications to converge
#[derive(Parser, Debug)]
#[command(name = "rollcall", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bootstrap script, then patch config and provision the registry secret
    Install {
        /// Wait for every application to converge afterwards
        #[arg(long)]
        wait: bool,

        #[command(flatten)]
        poll: PollArgs,
    },

    /// Wait until the applications are synced and healthy
    Wait {
        /// Application to wait for; repeatable. Defaults to every application.
        #[arg(long = "app")]
        apps: Vec<String>,

        #[command(flatten)]
        poll: PollArgs,
    },

    /// Print the current readiness of the applications as YAML
    Status {
        #[arg(long = "app")]
        apps: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct PollArgs {
    /// Seconds between readiness checks [default: POLL_INTERVAL_SECS]
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Seconds before giving up [default: POLL_TIMEOUT_SECS]
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Seconds to wait for the Application CRD to be served
    #[arg(long, default_value_t = 600)]
    crd_wait_secs: u64,
}

impl PollArgs {
    fn settings(&self, config: &Config) -> PollSettings {
        PollSettings::new(
            self.interval_secs
                .map(Duration::from_secs)
                .unwrap_or(config.poll_interval),
            self.timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(config.poll_timeout),
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: install_dir={}, gitops_namespace={}",
        config.install_dir.display(),
        config.gitops_namespace
    );

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    match cli.command {
        Commands::Install { wait, poll } => {
            let orchestrator = InstallationOrchestrator::new(
                config.clone(),
                ScriptRunner,
                KubeConfigStore::new(client.clone()),
                KubeSecretStore::new(client.clone()),
            );
            let report = orchestrator.install().await?;
            info!(
                "Install finished: config override {:?}, registry credential {:?}",
                report.config_override, report.credential
            );

            if wait {
                wait_for_convergence(&client, &config, &[], &poll).await?;
            }
        }
        Commands::Wait { apps, poll } => {
            wait_for_convergence(&client, &config, &apps, &poll).await?;
        }
        Commands::Status { apps } => {
            let poller = poller(&client, &config);
            let names = selected_applications(&poller, &apps).await?;
            let result = poller.snapshot(&names).await;
            print!("{}", serde_yaml::to_string(&result)?);
        }
    }

    Ok(())
}

fn poller(client: &Client, config: &Config) -> ConvergencePoller<KubeApplications, KubeApplications> {
    let applications = KubeApplications::new(client.clone());
    ConvergencePoller::new(
        applications.clone(),
        applications,
        config.gitops_namespace.clone(),
    )
}

async fn selected_applications(
    poller: &ConvergencePoller<KubeApplications, KubeApplications>,
    apps: &[String],
) -> Result<BTreeSet<String>> {
    if apps.is_empty() {
        Ok(poller.application_names().await?)
    } else {
        let names = apps.iter().cloned().collect();
        poller.verify_applications(&names).await?;
        Ok(names)
    }
}

async fn wait_for_convergence(
    client: &Client,
    config: &Config,
    apps: &[String],
    poll: &PollArgs,
) -> Result<()> {
    wait_for_application_crd(client, Duration::from_secs(poll.crd_wait_secs)).await?;

    let poller = poller(client, config);
    let names = selected_applications(&poller, apps).await?;

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping at the next cycle");
            token.cancel();
        }
    });

    let result = poller
        .poll_until_converged(&names, &poll.settings(config), &cancel)
        .await?;
    info!(
        "{} applications converged after {} cycles",
        result.applications.len(),
        result.cycle
    );
    Ok(())
}
