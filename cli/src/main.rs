//! PERMIT: command-line permission checker
//!
//! Asks the configured remote authority whether actions are allowed and
//! prints one line per check.
//!
//! Usage:
//!   cargo run -p cli -- --base-url http://localhost:8080 check report:view report:edit
//!   cargo run -p cli -- --config permit.toml check-any report:edit report:admin
//!
//! Exit status: 0 when every check is allowed, 2 when any is denied, 1 on a
//! configuration error.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use permit_contracts::{
    action::ActionIdentifier, config::PermissionsOptions, error::PermitResult,
};
use permit_core::PermissionChecker;

// ── CLI definition ────────────────────────────────────────────────────────────

/// PERMIT: ask a remote authority what the current principal may do.
#[derive(Parser)]
#[command(
    name = "permit",
    about = "Check actions against a remote permission authority",
    long_about = "Sends permission lookups to a dashboard-style access endpoint.\n\
                  Repeated actions within one run are answered from the cache."
)]
struct Cli {
    /// TOML file with base_url / endpoint / application / timeout_secs.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Scheme and host of the remote authority.
    #[arg(long)]
    base_url: Option<String>,

    /// Lookup path appended to the base URL.
    #[arg(long)]
    endpoint: Option<String>,

    /// Value of the `Application` header.
    #[arg(long)]
    application: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check each action on its own.
    Check {
        #[arg(required = true)]
        actions: Vec<String>,
    },
    /// Check whether at least one of the actions is allowed (one lookup).
    CheckAny {
        #[arg(required = true)]
        actions: Vec<String>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    // Set RUST_LOG=debug to see cache hits and remote lookups.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let checker = match build_options(&cli).and_then(permit_http::setup_permissions) {
        Ok(checker) => checker,
        Err(e) => {
            eprintln!("permit: {}", e);
            return ExitCode::from(1);
        }
    };

    let actions: Vec<ActionIdentifier> = match cli.command {
        Command::Check { actions } => actions.into_iter().map(ActionIdentifier::from).collect(),
        Command::CheckAny { actions } => vec![ActionIdentifier::Set(actions)],
    };

    if run_checks(&checker, &actions).await {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Load the config file if given, then apply command-line overrides.
fn build_options(cli: &Cli) -> PermitResult<PermissionsOptions> {
    let mut options = match &cli.config {
        Some(path) => PermissionsOptions::from_file(path)?,
        None => PermissionsOptions::default(),
    };

    if let Some(base_url) = &cli.base_url {
        options = options.with_base_url(base_url);
    }
    if let Some(endpoint) = &cli.endpoint {
        options = options.with_endpoint(endpoint);
    }
    if let Some(application) = &cli.application {
        options = options.with_application(application);
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        options = options.with_timeout_secs(timeout_secs);
    }

    Ok(options)
}

// ── Checks ────────────────────────────────────────────────────────────────────

/// Print one line per action; return true if all were allowed.
async fn run_checks(checker: &PermissionChecker, actions: &[ActionIdentifier]) -> bool {
    debug!(checks = actions.len(), "running permission checks");
    let mut all_allowed = true;
    for action in actions {
        let allowed = checker.can(action).await;
        println!("{:<7} {}", if allowed { "ALLOW" } else { "DENY" }, action);
        all_allowed &= allowed;
    }
    all_allowed
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{build_options, Cli, Command};

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "permit",
            "--base-url",
            "http://localhost:8080",
            "--endpoint",
            "/custom",
            "--application",
            "app1",
            "check",
            "edit",
        ])
        .unwrap();

        let options = build_options(&cli).unwrap();
        assert_eq!(options.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(options.endpoint, "/custom");
        assert_eq!(options.application.as_deref(), Some("app1"));
        assert_eq!(options.timeout_secs, 30);
    }

    #[test]
    fn check_any_collects_one_set() {
        let cli = Cli::try_parse_from(["permit", "check-any", "a", "b"]).unwrap();
        match cli.command {
            Command::CheckAny { actions } => assert_eq!(actions, vec!["a", "b"]),
            Command::Check { .. } => panic!("expected check-any"),
        }
    }

    #[test]
    fn check_requires_an_action() {
        assert!(Cli::try_parse_from(["permit", "check"]).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli =
            Cli::try_parse_from(["permit", "--config", "/nonexistent/permit.toml", "check", "x"])
                .unwrap();
        assert!(build_options(&cli).is_err());
    }
}
