//! Luzia CLI - a terminal client for the Luzia dashboard API.
//!
//! Logs in, prints dashboard views, and watches a view with periodic
//! background refresh until interrupted or the session expires.

mod commands;

use std::io;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Context;

/// When set, logs go to a daily file in this directory instead of stderr
const LOG_DIR_ENV: &str = "LUZIA_LOG_DIR";

const USAGE: &str = "\
Usage: luzia <command>

Commands:
  login [email]                     Log in and store the session
  logout                            Forget the stored session
  overview                          Print the dashboard overview
  orgs                              List organizations
  watch [org_id] [--interval secs]  Keep a view on screen, refreshing in the background

Environment:
  LUZIA_API_BASE_URL   API base URL (default http://localhost:8000/api/v1)
  LUZIA_LOG_DIR        Write logs to a file in this directory
  RUST_LOG             Log filter (default warn)";

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=luzia_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "luzia.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

/// `watch` arguments: optional organization id and `--interval <secs>`.
fn parse_watch_args(args: &[String]) -> Result<(Option<String>, Option<Duration>)> {
    let mut org_id = None;
    let mut interval = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--interval" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--interval needs a value in seconds"))?;
                let secs: u64 = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid interval: {}", value))?;
                if secs == 0 {
                    bail!("Interval must be at least one second");
                }
                interval = Some(Duration::from_secs(secs));
            }
            other if other.starts_with("--") => bail!("Unknown option: {}", other),
            other if org_id.is_none() => org_id = Some(other.to_string()),
            other => bail!("Unexpected argument: {}", other),
        }
    }
    Ok((org_id, interval))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    let ctx = Context::new()?;
    info!(command = %command, base_url = %ctx.client.base_url(), "Luzia CLI starting");

    match command.as_str() {
        "login" => commands::login(ctx, args.get(1).cloned()).await,
        "logout" => commands::logout(&ctx),
        "overview" => commands::overview(&ctx).await,
        "orgs" => commands::organizations(&ctx).await,
        "watch" => {
            let (org_id, interval) = parse_watch_args(&args[1..])?;
            commands::watch(&ctx, org_id, interval).await
        }
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => {
            eprintln!("{}", USAGE);
            bail!("Unknown command: {}", other)
        }
    }
}
