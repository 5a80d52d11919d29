// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `oj-worker`: the per-repository ticket-flow worker binary (spec §6).
//!
//! Exit codes (spec §6): `0` on a clean `RunFlow` completion (the run
//! reached `completed`, `paused`, or `stopped` — any non-panicking
//! outcome the engine itself resolved); `2` on a preflight or
//! configuration error; `1` on anything else, including an uncaught
//! panic in this binary's own setup code (every panic *inside* a flow
//! step is already caught by the Flow Controller and turned into
//! `StepOutcome::Fail`, spec §9).

mod backends;
mod cli;
mod commands;
mod config;

use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| run(cli))) {
        Ok(Ok(())) => ExitCode::from(0),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "oj-worker failed");
            if is_config_error(&e) {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(panic = %message, "oj-worker panicked");
            ExitCode::from(1)
        }
    }
}

fn is_config_error(e: &anyhow::Error) -> bool {
    e.downcast_ref::<oj_core::CoreError>()
        .map(|e| matches!(e, oj_core::CoreError::Config(_)))
        .unwrap_or(false)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_async(cli))
}

async fn run_async(cli: Cli) -> anyhow::Result<()> {
    let ctx = commands::build_context(&cli.workspace)?;

    match cli.command {
        Command::Start => {
            let run = commands::start(&ctx).await?;
            print_run(&run);
        }
        Command::Resume { run_id, force } => {
            let run = commands::resume(&ctx, &run_id, force).await?;
            print_run(&run);
        }
        Command::Stop { run_id } => {
            commands::stop(&ctx, &run_id)?;
            println!("stop requested");
        }
        Command::Status { run_id } => {
            let run = commands::status(&ctx, &run_id)?;
            print_run(&run);
        }
        Command::List { status } => {
            let runs = commands::list(&ctx, status.as_deref())?;
            for run in runs {
                print_run(&run);
            }
        }
        Command::Reconcile => {
            let report = commands::reconcile(&ctx)?;
            println!(
                "scanned {} run(s), transitioned {} to stopped",
                report.scanned,
                report.transitioned.len()
            );
        }
    }
    Ok(())
}

fn print_run(run: &oj_core::FlowRun) {
    println!(
        "{}  {:?}  step={}  {}",
        run.id,
        run.status,
        run.current_step.as_deref().unwrap_or("-"),
        run.error_message.as_deref().unwrap_or("")
    );
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
