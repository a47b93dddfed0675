//! authgate - command-line front end for the authenticated request gateway.
//!
//! Stores a bearer token in the local session cache and issues requests
//! through the gateway pipeline, so expired credentials are detected and
//! cleared exactly the way an embedding application would see them.

use std::io;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use authgate_core::{FileSession, Gateway, GatewayConfig, MemoryNavigator, Navigator};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Navigation path the CLI pretends to be on when issuing requests
const CLI_LOCATION: &str = "/cli";

const USAGE: &str = "\
Usage: authgate <command>

Commands:
  login <token> [username]   Store a bearer token for later requests
  logout                     Remove the stored session
  health                     Probe the backend health endpoint
  get <path>                 GET a path and print the JSON response
  list <collection>          GET /<collection>
  delete <collection> <id>   DELETE /<collection>/<id>";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    let session = Arc::new(FileSession::new(GatewayConfig::cache_dir()?));

    match (command.as_str(), &args[1..]) {
        ("login", [token, rest @ ..]) => {
            let username = rest.first().map(String::as_str).unwrap_or("cli");
            session
                .store(token, username)
                .context("Failed to store session")?;
            info!(username = username, "Session stored");
            eprintln!("Signed in as {}", username);
            Ok(())
        }
        ("logout", []) => {
            session.clear().context("Failed to clear session")?;
            eprintln!("Signed out");
            Ok(())
        }
        (cmd, rest) => {
            let config = GatewayConfig::load_default()?.apply_env()?;
            let navigator = Arc::new(MemoryNavigator::new(CLI_LOCATION));
            let gateway = Gateway::with_http(config, session, navigator.clone())?;
            let result = run_request(&gateway, cmd, rest).await;
            report_recovery(&gateway, &navigator).await;
            result
        }
    }
}

async fn run_request(gateway: &Gateway, command: &str, args: &[String]) -> Result<()> {
    let value: serde_json::Value = match (command, args) {
        ("health", []) => {
            let healthy = gateway.health().await;
            println!("{}", if healthy { "ok" } else { "unavailable" });
            if !healthy {
                bail!("Backend at {} is not healthy", gateway.config().base_url);
            }
            return Ok(());
        }
        ("get", [path]) => gateway.get_json(path).await?,
        ("list", [collection]) => gateway.get_json(&format!("/{}", collection)).await?,
        ("delete", [collection, id]) => {
            gateway.delete(&format!("/{}/{}", collection, id)).await?;
            eprintln!("Deleted {}/{}", collection, id);
            return Ok(());
        }
        _ => bail!("Unknown command: {}\n\n{}", command, USAGE),
    };

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// If a request triggered recovery, let it finish and tell the user where
/// to sign in again.
async fn report_recovery(gateway: &Gateway, navigator: &MemoryNavigator) {
    if !gateway.is_recovering() {
        return;
    }
    gateway.wait_for_recovery().await;
    match navigator.redirects().last() {
        Some(target) => eprintln!(
            "Session expired. Sign in again via {} (redirect target: {})",
            gateway.config().login_path,
            target
        ),
        None => eprintln!(
            "Session expired. Current location: {}",
            navigator.current_location().path_and_query()
        ),
    }
}
