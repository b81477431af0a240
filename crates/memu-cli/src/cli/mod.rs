//! CLI command definitions for the `memu` binary.
//!
//! Uses clap derive macros for argument parsing. Connection settings given as
//! flags override the config file and `MEMU_*` environment variables.

pub mod categories;
pub mod memorize;
pub mod retrieve;
pub mod status;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use memu_infra::config::ConfigOverrides;

/// Store and query conversational memories with MemU.
#[derive(Parser)]
#[command(name = "memu", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Only log errors and hide progress spinners.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// MemU API key.
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// API base URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, value_parser = parse_secs)]
    pub timeout: Option<Duration>,

    /// Attempts per request, including the first one.
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_retries: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Connection flags as the highest-precedence config layer.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            timeout: self.timeout,
            max_retries: self.max_retries,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a conversation for memory extraction.
    Memorize(MemorizeArgs),

    /// Show the status of a memorize task.
    Status {
        /// Task id returned by `memu memorize`.
        task_id: String,
    },

    /// Retrieve memories relevant to a query.
    #[command(alias = "search")]
    Retrieve {
        /// Free-text query.
        query: String,

        /// User the memories belong to.
        #[arg(long = "user")]
        user_id: String,

        /// Agent the memories belong to.
        #[arg(long = "agent")]
        agent_id: String,
    },

    /// List memory categories for a user.
    #[command(alias = "ls")]
    Categories {
        /// User the categories belong to.
        #[arg(long = "user")]
        user_id: String,

        /// Restrict to one agent.
        #[arg(long = "agent")]
        agent_id: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Args)]
pub struct MemorizeArgs {
    /// User the conversation belongs to.
    #[arg(long = "user")]
    pub user_id: String,

    /// Agent that took part in the conversation.
    #[arg(long = "agent")]
    pub agent_id: String,

    /// Display name of the user.
    #[arg(long)]
    pub user_name: Option<String>,

    /// Display name of the agent.
    #[arg(long)]
    pub agent_name: Option<String>,

    /// Raw conversation text.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub text: Option<String>,

    /// JSON file holding an array of `{"role": ..., "content": ...}` messages.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// ISO-8601 date of the session.
    #[arg(long)]
    pub session_date: Option<String>,

    /// Poll the task until it finishes.
    #[arg(long)]
    pub wait: bool,

    /// Seconds between status polls (with --wait).
    #[arg(long, default_value = "2", value_parser = parse_secs)]
    pub poll_interval: Duration,

    /// Give up waiting after this many seconds (with --wait).
    #[arg(long, default_value = "300", value_parser = parse_secs)]
    pub wait_timeout: Duration,
}

/// Parse a positive, possibly fractional, number of seconds.
pub fn parse_secs(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number of seconds"))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("'{raw}' must be greater than zero"));
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Shorten `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_memorize_requires_exactly_one_source() {
        let missing = Cli::try_parse_from(["memu", "memorize", "--user", "u", "--agent", "a"]);
        assert!(missing.is_err());

        let both = Cli::try_parse_from([
            "memu", "memorize", "--user", "u", "--agent", "a", "--text", "hi", "--file", "c.json",
        ]);
        assert!(both.is_err());

        let cli = Cli::try_parse_from([
            "memu", "memorize", "--user", "u", "--agent", "a", "--text", "hi", "--wait",
        ])
        .unwrap();
        match cli.command {
            Commands::Memorize(args) => {
                assert!(args.wait);
                assert_eq!(args.poll_interval, Duration::from_secs(2));
                assert_eq!(args.wait_timeout, Duration::from_secs(300));
            }
            _ => panic!("expected memorize"),
        }
    }

    #[test]
    fn test_global_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "memu",
            "status",
            "task_1",
            "--api-key",
            "k",
            "--timeout",
            "2.5",
            "--max-retries",
            "5",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.api_key.as_deref(), Some("k"));
        assert_eq!(overrides.timeout, Some(Duration::from_millis(2500)));
        assert_eq!(overrides.max_retries, Some(5));
        assert!(overrides.base_url.is_none());
    }

    #[test]
    fn test_zero_retries_rejected_by_parser() {
        let parsed = Cli::try_parse_from(["memu", "status", "t", "--max-retries", "0"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs("0.5"), Ok(Duration::from_millis(500)));
        assert!(parse_secs("0").is_err());
        assert!(parse_secs("-3").is_err());
        assert!(parse_secs("soon").is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("ééééé", 4), "é...");
    }
}
