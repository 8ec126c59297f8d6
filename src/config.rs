use crate::domain::Platform;
use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// File of newline-delimited bridge events (reads stdin when omitted)
    #[arg(long, env = "NOTIFICATION_BRIDGE_INPUT")]
    pub input: Option<PathBuf>,

    /// What each input line holds
    #[arg(long, env = "NOTIFICATION_BRIDGE_INPUT_FORMAT", value_enum, default_value_t = InputFormat::Events)]
    pub input_format: InputFormat,

    /// Platform the events originate from
    #[arg(long, env = "NOTIFICATION_BRIDGE_PLATFORM", value_enum, default_value_t = Platform::Android)]
    pub platform: Platform,

    /// Abort on the first invalid event instead of skipping it
    #[arg(long, env = "NOTIFICATION_BRIDGE_STRICT", default_value_t = false)]
    pub strict: bool,

    #[command(flatten)]
    pub bus: BusConfig,

    #[command(flatten)]
    pub inbound: InboundConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Bridge event envelopes (`{"event": ..., "payload": ...}`)
    #[default]
    Events,
    /// Raw remote-message data maps, classified before publishing
    RemoteMessages,
}

#[derive(Clone, Debug, Args)]
pub struct BusConfig {
    /// Events buffered per subscriber before ingest waits for the callback worker
    #[arg(long, env = "NOTIFICATION_BRIDGE_CHANNEL_CAPACITY", default_value_t = 64)]
    pub channel_capacity: usize,

    /// Maximum accepted length of a single event line
    #[arg(long, env = "NOTIFICATION_BRIDGE_MAX_LINE_BYTES", default_value_t = 65_536)]
    pub max_line_bytes: usize,

    /// How long to wait for callbacks to drain on shutdown
    #[arg(long, env = "NOTIFICATION_BRIDGE_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct InboundConfig {
    /// Comma-separated `receiver` values whose pushes belong to third-party SDKs
    #[arg(long, env = "NOTIFICATION_BRIDGE_CLAIMED_RECEIVERS", value_delimiter = ',')]
    pub claimed_receivers: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "NOTIFICATION_BRIDGE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; traces and metrics are exported only when set
    #[arg(long, env = "NOTIFICATION_BRIDGE_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["notification-bridge"]).unwrap();
        assert_eq!(config.input, None);
        assert_eq!(config.input_format, InputFormat::Events);
        assert_eq!(config.platform, Platform::Android);
        assert!(!config.strict);
        assert_eq!(config.bus.channel_capacity, 64);
        assert_eq!(config.bus.max_line_bytes, 65_536);
        assert!(config.inbound.claimed_receivers.is_empty());
        assert_eq!(config.telemetry.log_format, LogFormat::Text);
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "notification-bridge",
            "--platform",
            "ios",
            "--input-format",
            "remote-messages",
            "--strict",
            "--claimed-receivers",
            "intercom_sdk,helpdesk",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(config.platform, Platform::Ios);
        assert_eq!(config.input_format, InputFormat::RemoteMessages);
        assert!(config.strict);
        assert_eq!(config.inbound.claimed_receivers, vec!["intercom_sdk", "helpdesk"]);
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
    }
}
