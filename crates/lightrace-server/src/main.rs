use std::time::Duration;

use clap::Parser;
use lightrace::prelude::*;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Real-time light-trail racing game server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, env = "LIGHTRACE_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "LIGHTRACE_PORT", default_value_t = 8081)]
    port: u16,

    /// Players needed before an arena starts
    #[arg(short, long, env = "MIN_PLAYERS", default_value_t = 8)]
    min_players: usize,

    /// Board width in cells
    #[arg(long, default_value_t = 50)]
    width: usize,

    /// Board height in cells
    #[arg(long, default_value_t = 50)]
    height: usize,

    /// Force-resolve a round after this many milliseconds (off by default)
    #[arg(long, env = "ROUND_TIMEOUT_MS")]
    round_timeout_ms: Option<u64>,

    /// Keep players who disconnect alive instead of forfeiting them
    #[arg(long)]
    no_forfeit: bool,
}

impl Args {
    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn arena_config(&self) -> ArenaConfig {
        ArenaConfig {
            width: self.width,
            height: self.height,
            min_players: self.min_players,
            round_timeout: self.round_timeout_ms.map(Duration::from_millis),
            forfeit_on_disconnect: !self.no_forfeit,
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let server = LightraceServer::builder()
        .bind(&args.addr())
        .arena_config(args.arena_config())
        .build()
        .await?;
    tracing::info!(addr = %server.local_addr()?, "listening");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("interrupt received");
        })
        .await?;
    Ok(())
}
