//! Command-line and environment configuration for the `rusty-tally` binary.

use chrono::Duration;
use clap::{Parser, ValueEnum};

use crate::statistics::WINDOW_SECS;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, colored output.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Transaction statistics server.
///
/// Records transactions over HTTP and reports count, sum, average, minimum
/// and maximum for those that happened in the last 60 seconds.
#[derive(Parser, Debug, Clone)]
#[command(name = "rusty-tally", version, about)]
pub struct Config {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "TALLY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, short = 'p', env = "TALLY_PORT", default_value_t = 3000)]
    pub port: u16,

    #[arg(long, env = "TALLY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Default filter directives. `RUST_LOG` takes precedence when set.
    #[arg(long, env = "TALLY_LOG_LEVEL", default_value = "rusty_tally=debug,tower_http=debug")]
    pub log_level: String,

    /// Requests accepted per minute across all clients. 0 disables limiting.
    #[arg(long, env = "TALLY_RATE_LIMIT_PER_MINUTE", default_value_t = 100)]
    pub rate_limit_per_minute: u32,

    /// Drop transactions older than this many seconds. Keeps everything when unset.
    #[arg(long, env = "TALLY_RETENTION_SECS", value_parser = clap::value_parser!(u64).range(WINDOW_SECS as u64..=u32::MAX as u64))]
    pub retention_secs: Option<u64>,

    /// How often the pruning task runs when retention is set.
    #[arg(long, env = "TALLY_PRUNE_INTERVAL_SECS", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub prune_interval_secs: u64,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn retention(&self) -> Option<Duration> {
        // Bounded by the value parser, so the cast cannot wrap.
        self.retention_secs.map(|secs| Duration::seconds(secs as i64))
    }

    pub fn prune_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.prune_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        Config::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["rusty-tally"]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.rate_limit_per_minute, 100);
        assert_eq!(config.retention(), None);
        assert_eq!(config.prune_interval(), std::time::Duration::from_secs(30));
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::try_parse_from([
            "rusty-tally",
            "--port",
            "8080",
            "--log-format",
            "json",
            "--retention-secs",
            "300",
            "--rate-limit-per-minute",
            "0",
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.retention(), Some(Duration::seconds(300)));
        assert_eq!(config.rate_limit_per_minute, 0);
    }

    #[test]
    fn test_retention_shorter_than_window_is_rejected() {
        assert!(Config::try_parse_from(["rusty-tally", "--retention-secs", "59"]).is_err());
        assert!(Config::try_parse_from(["rusty-tally", "--retention-secs", "60"]).is_ok());
    }

    #[test]
    fn test_zero_prune_interval_is_rejected() {
        assert!(Config::try_parse_from(["rusty-tally", "--prune-interval-secs", "0"]).is_err());
    }
}
