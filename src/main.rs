//! Campus chat API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────┐
//!                         │                  API GATEWAY                   │
//!                         │                                                │
//!   Client Request        │  ┌──────────┐   ┌────────────┐   ┌──────────┐ │
//!   ──────────────────────┼─▶│  server  │──▶│ RouteTable │──▶│  Path    │ │
//!                         │  │ /health  │   │ first match│   │ Rewriter │ │
//!                         │  └──────────┘   └─────┬──────┘   └────┬─────┘ │
//!                         │                       │ 404            │       │
//!                         │                       ▼                ▼       │
//!                         │                ┌────────────┐   ┌──────────┐  │
//!                         │                │ErrorMapper │◀──│ Request  │──┼──▶ Upstream
//!                         │                │  envelope  │   │Forwarder │  │    service
//!                         │                └────────────┘   └────┬─────┘  │
//!                         │                                      │        │
//!   Client Response       │                              ┌───────▼──────┐ │
//!   ◀─────────────────────┼──────────────────────────────│  Response    │◀┼─── 3xx / 2xx
//!                         │                              │  Rewriter    │ │
//!                         │                              │  (Location)  │ │
//!                         │                              └──────────────┘ │
//!                         └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use campus_gateway::lifecycle::{self, StartupOptions};

#[derive(Parser)]
#[command(name = "campus-gateway")]
#[command(about = "API gateway for the campus chat services", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port; overrides PORT and the config file.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let options = StartupOptions {
        config_path: cli.config,
        port: cli.port,
    };

    match lifecycle::start(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Gateway failed");
            eprintln!("campus-gateway: {e}");
            ExitCode::FAILURE
        }
    }
}
