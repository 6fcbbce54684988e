mod config;
mod error;
mod host;

use clap::{Parser, Subcommand};
use guard::{CapabilityProvider, Classification, run_guard};
use policy::{Capability, CapabilityStatus};
use tracing_subscriber::EnvFilter;

use config::PolicyArgs;
use error::{Error, Result};
use host::GrantArgs;

/// Exit code for errors, distinct from the guard's abort code.
const ERROR_EXIT_CODE: i32 = 2;
const LOG_ENV: &str = "PERMGUARD_LOG";

#[derive(Parser)]
#[command(name = "permguard")]
#[command(about = "Check live capability grants against a declared policy", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the guard, then an optional command if it passes
    Check {
        #[command(flatten)]
        policy: PolicyArgs,
        #[command(flatten)]
        grants: GrantArgs,
        /// Command to run after the guard passes
        #[arg(last = true)]
        command: Vec<String>,
    },
    /// Show how the grants compare to the policy, without deciding
    Explain {
        #[command(flatten)]
        policy: PolicyArgs,
        #[command(flatten)]
        grants: GrantArgs,
        /// Print the classification as JSON
        #[arg(long)]
        json: bool,
    },
    /// List known capabilities
    Capabilities,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env(LOG_ENV))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(ERROR_EXIT_CODE);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            policy,
            grants,
            command,
        } => cmd_check(&policy, grants, &command).await,
        Commands::Explain {
            policy,
            grants,
            json,
        } => cmd_explain(&policy, grants, json).await,
        Commands::Capabilities => {
            cmd_capabilities();
            Ok(())
        }
    }
}

async fn cmd_check(policy: &PolicyArgs, grants: GrantArgs, command: &[String]) -> Result<()> {
    let (config, source) = policy.resolve()?;
    let host = grants.into_host()?;
    tracing::debug!(%source, %host, "running guard");

    run_guard(config, &host).await?;

    let Some((program, args)) = command.split_first() else {
        return Ok(());
    };

    let status = tokio::process::Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|source| Error::Command {
            command: program.clone(),
            source,
        })?;

    match status.code() {
        Some(0) => Ok(()),
        Some(code) => std::process::exit(code),
        // Killed by a signal.
        None => std::process::exit(ERROR_EXIT_CODE),
    }
}

async fn cmd_explain(policy: &PolicyArgs, grants: GrantArgs, json: bool) -> Result<()> {
    let (config, source) = policy.resolve()?;
    let host = grants.into_host()?;

    let classification = if host.is_supported() {
        guard::reconcile(&config.policy, &host).await?
    } else {
        Classification {
            recommendations: guard::engine::recommendations(&config.policy),
            ..Classification::default()
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&classification)?);
        return Ok(());
    }

    println!("Policy: {source}");
    println!("Grants: {host}");
    print_statuses("Extra", &classification.extra);
    print_statuses("Missing", &classification.missing);

    println!("Recommendations:");
    if classification.recommendations.is_empty() {
        println!("  (none)");
    }
    for descriptor in &classification.recommendations {
        println!("  {} could be scoped", descriptor.flag());
    }

    Ok(())
}

fn print_statuses(title: &str, statuses: &[CapabilityStatus]) {
    println!("{title}:");
    if statuses.is_empty() {
        println!("  (none)");
    }
    for status in statuses {
        println!("  {:<32}  {}", status.descriptor.flag(), status.state);
    }
}

fn cmd_capabilities() {
    println!("{:<8}  {:<16}  SCOPABLE", "NAME", "FLAG");
    println!("{}", "-".repeat(36));
    for capability in Capability::all() {
        let scopable = if capability.supports_scope() { "yes" } else { "no" };
        println!("{:<8}  {:<16}  {scopable}", capability.as_str(), capability.flag());
    }
}
