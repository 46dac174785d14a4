//! The gismo hook binary.
//!
//! Reads one JSON hook message on stdin, lints where the message warrants
//! it, and exits with the code the host understands: 0 approve, 2 block /
//! surface stderr, 1 infrastructure failure.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use gismo_config::GismoConfig;
use gismo_hooks::EXIT_FAILURE;
use gismo_hooks::Handler;
use gismo_hooks::HookConfig;
use gismo_hooks::HookExecutor;
use gismo_hooks::HookRegistry;
use gismo_lint::LintEngine;
use gismo_protocol::HookEventName;

#[derive(Parser)]
#[command(name = "gismo")]
#[command(about = "Code-quality hook for AI coding assistants")]
struct Cli {
    /// Override the processing timeout (e.g. "30s", "2m")
    #[arg(long)]
    timeout: Option<String>,

    /// Extra configuration file merged on top of the standard layers
    #[arg(long)]
    config: Option<PathBuf>,

    /// Silence diagnostic logging even when CCFEEDBACK_DEBUG is set
    #[arg(long)]
    quiet: bool,

    /// Print the registered hook inventory and exit
    #[arg(long)]
    list_hooks: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("- [ccfeedback]: {err:#}");
            std::process::exit(EXIT_FAILURE);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = load_config(&cli)?;

    let timeout = resolve_timeout(&cli, &config)?;
    tracing::debug!(?timeout, "configuration resolved");
    let registry = Arc::new(default_registry(timeout));

    if cli.list_hooks {
        print_inventory(&registry);
        return Ok(0);
    }

    let engine = Arc::new(LintEngine::new(config));
    let handler = Arc::new(Handler::new(engine).with_registry(registry));
    let executor = HookExecutor::new(handler).with_timeout(timeout);

    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let code = executor.execute(&mut stdin, &mut stdout).await?;
    Ok(code)
}

fn load_config(cli: &Cli) -> anyhow::Result<GismoConfig> {
    let mut config = gismo_config::load()?;
    if let Some(path) = &cli.config {
        match gismo_config::load_file(path)? {
            Some(extra) => config = config.merged(extra),
            None => anyhow::bail!("config file not found: {}", path.display()),
        }
    }
    Ok(config)
}

/// Flag beats file beats the 60 s default.
fn resolve_timeout(cli: &Cli, config: &GismoConfig) -> anyhow::Result<Duration> {
    if let Some(text) = &cli.timeout {
        let timeout = humantime::parse_duration(text)
            .map_err(|err| anyhow::anyhow!("invalid --timeout {text:?}: {err}"))?;
        return Ok(timeout);
    }
    Ok(config
        .timeout_duration()
        .unwrap_or(Duration::from_secs(60)))
}

/// The hook inventory this binary answers for, as host tooling sees it.
fn default_registry(timeout: Duration) -> HookRegistry {
    let registry = HookRegistry::new();
    registry.register(
        HookConfig::new("lint", HookEventName::PreToolUse)
            .with_matcher("Write|Edit|MultiEdit")
            .with_timeout(timeout),
    );
    registry.register(
        HookConfig::new("lint", HookEventName::PostToolUse)
            .with_matcher("Write|Edit|MultiEdit")
            .with_timeout(timeout),
    );
    registry
}

fn print_inventory(registry: &HookRegistry) {
    for event in [
        HookEventName::PreToolUse,
        HookEventName::PostToolUse,
        HookEventName::Notification,
        HookEventName::Stop,
        HookEventName::SubagentStop,
        HookEventName::PreCompact,
    ] {
        for entry in registry.lookup(event) {
            println!(
                "{event}\t{}\tmatcher={}\tpriority={}\ttimeout={:?}",
                entry.name, entry.matcher, entry.priority, entry.timeout
            );
        }
    }
}

fn init_tracing(quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let debug = std::env::var("CCFEEDBACK_DEBUG").is_ok_and(|v| !v.is_empty() && v != "0");
    let filter = if quiet || !debug { "error" } else { "debug" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}
