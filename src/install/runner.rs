// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::config::Config;
use crate::constants::install;
use crate::error::{Result, RollcallError};
use crate::install::InstallEnvironment;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, instrument};

/// A fully resolved install command
#[derive(Clone, Debug)]
pub struct InstallInvocation {
    /// Program path, relative to `working_dir`
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: InstallEnvironment,
}

impl InstallInvocation {
    /// The bootstrap script run from the infra-deployments checkout
    pub fn bootstrap(config: &Config, env: InstallEnvironment) -> Self {
        Self {
            program: PathBuf::from(install::SCRIPT),
            args: install::ARGS.iter().map(|a| a.to_string()).collect(),
            working_dir: config.install_dir.clone(),
            env,
        }
    }

    /// Program and arguments for logs and errors, without the environment
    pub fn display_command(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs an install invocation to completion
#[async_trait]
pub trait InstallCommand: Send + Sync {
    async fn run(&self, invocation: &InstallInvocation) -> Result<()>;
}

/// Runs the invocation as a child process, streaming its output to ours
#[derive(Clone, Copy, Debug, Default)]
pub struct ScriptRunner;

#[async_trait]
impl InstallCommand for ScriptRunner {
    #[instrument(skip(self, invocation), fields(command = %invocation.display_command()))]
    async fn run(&self, invocation: &InstallInvocation) -> Result<()> {
        let working_dir =
            std::path::absolute(&invocation.working_dir).map_err(|e| {
                RollcallError::InstallProcessError {
                    command: invocation.display_command(),
                    message: format!(
                        "cannot resolve {}: {}",
                        invocation.working_dir.display(),
                        e
                    ),
                }
            })?;
        let program = working_dir.join(&invocation.program);
        debug!(
            "Executing {} in {} with {} extra variables",
            program.display(),
            working_dir.display(),
            invocation.env.len()
        );

        let status = Command::new(&program)
            .args(&invocation.args)
            .current_dir(&working_dir)
            .envs(invocation.env.iter())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| RollcallError::InstallProcessError {
                command: invocation.display_command(),
                message: format!("failed to start {}: {}", program.display(), e),
            })?;

        if status.success() {
            return Ok(());
        }

        let message = match status.code() {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        };
        Err(RollcallError::InstallProcessError {
            command: invocation.display_command(),
            message,
        })
    }
}
