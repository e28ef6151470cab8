use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Parser, ValueEnum};
use dotenvy::dotenv;

/// Upper bound for `--inactivity` (one week).
pub const MAX_INACTIVITY_SECS: u64 = 7 * 24 * 3600;

/// Player configuration from the command line, falling back to environment
/// variables (a `.env` file is honoured in development).
#[derive(Debug, Clone, Parser)]
#[command(name = "player", about = "Interactive digital signage player")]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .multiple(true)
        .args(["config", "admin_url"])
))]
pub struct Config {
    /// Path to a local campaign config JSON file
    #[arg(long, env = "IDS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the Admin service; takes precedence over --config
    #[arg(long, env = "IDS_ADMIN_URL")]
    pub admin_url: Option<String>,

    /// Config id to fetch from the Admin service (default: latest)
    #[arg(long, env = "IDS_CONFIG_ID", requires = "admin_url")]
    pub config_id: Option<String>,

    #[arg(long, env = "IDS_MODE", value_enum, default_value_t = Mode::Dev)]
    pub mode: Mode,

    /// Run the HTTP event ingress after loading
    #[arg(long)]
    pub serve: bool,

    #[arg(long, default_value_t = 7070, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// Seconds without a non-IDLE event before playback returns to idle
    #[arg(
        long,
        env = "IDS_INACTIVITY_SEC",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..=MAX_INACTIVITY_SECS)
    )]
    pub inactivity: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Dev,
    Prod,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Dev => "dev",
            Mode::Prod => "prod",
        }
    }

    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Mode::Dev => "info,player_core=debug",
            Mode::Prod => "info",
        }
    }
}

impl Config {
    /// Load configuration from `.env`, the environment and argv. Exits with
    /// a usage message (status 2) on invalid arguments.
    pub fn load() -> Self {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::parse()
    }

    pub fn inactivity(&self) -> Duration {
        Duration::from_secs(self.inactivity)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.port))
    }
}
