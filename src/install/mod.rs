// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod environment;
pub mod orchestrator;
pub mod runner;

pub use environment::InstallEnvironment;
pub use orchestrator::{InstallReport, InstallationOrchestrator};
pub use runner::{InstallCommand, InstallInvocation, ScriptRunner};
