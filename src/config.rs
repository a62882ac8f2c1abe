use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::conversation::{AssistantScript, DEFAULT_CANNED_REPLY, DEFAULT_GREETING};

/// Prefix for environment overrides, e.g. `HOH_SERVER__PORT=8000`.
const ENV_PREFIX: &str = "HOH";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Delay before the simulated assistant replies, in milliseconds
    #[arg(long, env = "REPLY_DELAY_MS")]
    pub reply_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub assistant: AssistantConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    /// Brand shown in headers and the page title.
    pub name: String,
    pub greeting: String,
    pub canned_reply: String,
    pub reply_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl AssistantConfig {
    #[must_use]
    pub fn script(&self) -> AssistantScript {
        AssistantScript {
            greeting: self.greeting.clone(),
            canned_reply: self.canned_reply.clone(),
        }
    }

    #[must_use]
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 3000,
                host: "127.0.0.1".to_string(),
            },
            assistant: AssistantConfig {
                name: "HOH MIS Assistant".to_string(),
                greeting: DEFAULT_GREETING.to_string(),
                canned_reply: DEFAULT_CANNED_REPLY.to_string(),
                reply_delay_ms: 1500,
            },
            log: LogConfig { json: false },
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Layering, lowest to highest: defaults, config file, `HOH_*`
    /// environment, CLI flags (and their plain env aliases).
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        let defaults = AppConfig::default();

        let mut builder = Config::builder()
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("server.host", defaults.server.host)?
            .set_default("assistant.name", defaults.assistant.name)?
            .set_default("assistant.greeting", defaults.assistant.greeting)?
            .set_default("assistant.canned_reply", defaults.assistant.canned_reply)?
            .set_default("assistant.reply_delay_ms", defaults.assistant.reply_delay_ms)?
            .set_default("log.json", defaults.log.json)?;

        // Explicit file must exist; ./config.{yaml,toml,json} is optional.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(delay) = cli.reply_delay_ms {
            builder = builder.set_override("assistant.reply_delay_ms", delay)?;
        }

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behavior() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.assistant.reply_delay(), Duration::from_millis(1500));
        assert_eq!(config.assistant.script(), AssistantScript::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = AppConfig::load_from_args([
            "hoh-mis-assistant",
            "--config",
            "/definitely/not/here.yaml",
        ]);
        assert!(result.is_err());
    }
}
