//! Server configuration (command line with environment fallbacks).

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::usecase::RelayTimeouts;

#[derive(Parser, Debug, Clone)]
#[command(name = "denpo-server")]
#[command(about = "Direct-message relay server with live presence and delivery", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "DENPO_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "DENPO_PORT", default_value = "8080")]
    pub port: u16,

    /// HMAC secret used to verify bearer tokens
    #[arg(long, env = "DENPO_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Upper bound for one identity verification, in milliseconds
    #[arg(long, env = "DENPO_VERIFY_TIMEOUT_MS", default_value = "2000")]
    pub verify_timeout_ms: u64,

    /// Upper bound for one durable store call, in milliseconds
    #[arg(long, env = "DENPO_STORE_TIMEOUT_MS", default_value = "2000")]
    pub store_timeout_ms: u64,

    /// How long a push may wait for queue space before the connection is treated as dead
    #[arg(long, env = "DENPO_SEND_DEADLINE_MS", default_value = "250")]
    pub send_deadline_ms: u64,

    /// Outbound queue capacity per connection
    #[arg(long, env = "DENPO_OUTBOUND_CAPACITY", default_value = "64", value_parser = clap::value_parser!(u64).range(1..))]
    pub outbound_capacity: u64,

    /// JSON file with the participants to load at startup
    #[arg(long, env = "DENPO_SEED_FILE")]
    pub seed_file: Option<PathBuf>,

    /// Print a development token for this seeded participant and exit
    #[arg(long, value_name = "PARTICIPANT_ID")]
    pub issue_token: Option<String>,

    /// Lifetime of tokens printed by `--issue-token`, in seconds
    #[arg(long, default_value = "86400")]
    pub token_ttl_secs: i64,
}

impl ServerConfig {
    pub fn timeouts(&self) -> RelayTimeouts {
        RelayTimeouts {
            verify: Duration::from_millis(self.verify_timeout_ms),
            store: Duration::from_millis(self.store_timeout_ms),
            send: Duration::from_millis(self.send_deadline_ms),
        }
    }

    pub fn outbound_capacity(&self) -> usize {
        usize::try_from(self.outbound_capacity).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // テスト項目: 秘密鍵以外はデフォルト値が使われる
        // given (前提条件):
        let args = ["denpo-server", "--jwt-secret", "s3cret"];

        // when (操作):
        let config = ServerConfig::try_parse_from(args).unwrap();

        // then (期待する結果):
        assert_eq!(config.port, 8080);
        assert_eq!(config.timeouts(), RelayTimeouts::default());
        assert_eq!(config.outbound_capacity(), 64);
        assert!(config.seed_file.is_none());
    }

    #[test]
    fn test_overrides() {
        // テスト項目: コマンドライン引数で上書きできる
        // given (前提条件):
        let args = [
            "denpo-server",
            "--jwt-secret",
            "s3cret",
            "-p",
            "9000",
            "--send-deadline-ms",
            "50",
            "--outbound-capacity",
            "8",
        ];

        // when (操作):
        let config = ServerConfig::try_parse_from(args).unwrap();

        // then (期待する結果):
        assert_eq!(config.port, 9000);
        assert_eq!(config.timeouts().send, Duration::from_millis(50));
        assert_eq!(config.outbound_capacity(), 8);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        // テスト項目: 送信キュー容量 0 は受け付けない
        // given (前提条件):
        let args = [
            "denpo-server",
            "--jwt-secret",
            "s3cret",
            "--outbound-capacity",
            "0",
        ];

        // when (操作):
        let result = ServerConfig::try_parse_from(args);

        // then (期待する結果):
        assert!(result.is_err());
    }
}
