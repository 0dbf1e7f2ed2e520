pub mod config;
pub mod run;

use clap::{Parser, Subcommand};

/// leadbot: restaurant chat widget backend with lead capture.
#[derive(Debug, Parser)]
#[command(name = "leadbot", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Send one message through the chat pipeline and print the reply.
    Run {
        /// The message to send.
        message: String,
        /// Conversation id (defaults to "cli-run").
        #[arg(long, default_value = "cli-run")]
        session: String,
        /// Print the full response as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },
    /// Re-run lead extraction for a stored conversation.
    Analyze {
        /// Conversation id.
        session: String,
    },
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `LEADBOT_CONFIG` (or
/// `config.toml` by default). A missing file yields the defaults.
/// Returns the parsed config and the path that was used.
pub fn load_config() -> anyhow::Result<(lb_domain::config::Config, String)> {
    let config_path = std::env::var("LEADBOT_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

pub fn load_config_from(path: &str) -> anyhow::Result<lb_domain::config::Config> {
    if !std::path::Path::new(path).exists() {
        return Ok(lb_domain::config::Config::default());
    }
    let raw =
        std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("reading {path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {path}: {e}"))
}
