use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Serialized},
    Figment,
};
use md_ffprobe::{FormatSet, DEFAULT_OFFSET};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub redis_url: Option<String>,
    pub queue_name: String,

    // Explicit ffprobe path or command name, otherwise found on PATH
    pub ffprobe_path: Option<PathBuf>,
    pub probe_timeout_secs: u64,
    pub seek_offset_secs: u64,

    // Formats whose header duration is never trusted, e.g. "mp3,ogg"
    #[serde(deserialize_with = "list_or_csv")]
    pub untrusted_formats: Vec<String>,

    // How long one blocking queue pop waits before re-checking for shutdown
    pub poll_timeout_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            queue_name: "media_duration".to_string(),
            ffprobe_path: None,
            probe_timeout_secs: 60,
            seek_offset_secs: DEFAULT_OFFSET,
            untrusted_formats: vec!["mp3".to_string()],
            poll_timeout_secs: 5.0,
        }
    }
}

impl Config {
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn untrusted_formats(&self) -> FormatSet {
        self.untrusted_formats.iter().collect()
    }

    /// Rejects values that parse but cannot work. A poll timeout of zero
    /// makes the queue pop block forever, which also blocks shutdown.
    fn validate(&self) -> Result<(), figment::Error> {
        if self.probe_timeout_secs == 0 {
            return Err("PROBE_TIMEOUT_SECS must be positive".into());
        }

        let poll = self.poll_timeout_secs;
        if !poll.is_finite() || poll <= 0.0 {
            return Err(format!(
                "POLL_TIMEOUT_SECS must be a positive number, got {poll}"
            )
            .into());
        }

        Ok(())
    }
}

/// Reads configuration from environment variables, falling back to the
/// defaults above.
///
/// # Errors
/// Returns an error if a variable cannot be converted to its field type, or
/// if a timeout is not positive.
pub fn load_config() -> Result<Config, figment::Error> {
    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::raw());

    let config: Config = figment.extract()?;
    config.validate()?;

    Ok(config)
}

/// Installs the global JSON log subscriber. Logs go to stderr so the `probe`
/// subcommand can print its result on stdout.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .json()
        // allow log level to be overridden by RUST_LOG env var
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_current_span(false)
        .with_ansi(false)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrCsv {
    List(Vec<String>),
    Csv(String),
}

fn list_or_csv<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match ListOrCsv::deserialize(deserializer)? {
        ListOrCsv::List(list) => list,
        ListOrCsv::Csv(csv) => csv.split(',').map(str::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = load_config()?;
            assert_eq!(config.queue_name, "media_duration");
            assert_eq!(config.seek_offset_secs, 432_000);
            assert_eq!(config.probe_timeout(), Duration::from_secs(60));
            assert_eq!(config.untrusted_formats(), FormatSet::parse("mp3"));
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("REDIS_URL", "redis://localhost:6379");
            jail.set_env("QUEUE_NAME", "durations");
            jail.set_env("FFPROBE_PATH", "/opt/ffmpeg/bin/ffprobe");
            jail.set_env("PROBE_TIMEOUT_SECS", "15");
            jail.set_env("UNTRUSTED_FORMATS", "MP3, ogg");

            let config = load_config()?;
            assert_eq!(
                config.redis_url.as_deref(),
                Some("redis://localhost:6379")
            );
            assert_eq!(config.queue_name, "durations");
            assert_eq!(
                config.ffprobe_path,
                Some(PathBuf::from("/opt/ffmpeg/bin/ffprobe"))
            );
            assert_eq!(config.probe_timeout_secs, 15);
            assert_eq!(config.untrusted_formats(), FormatSet::parse("mp3,ogg"));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        Jail::expect_with(|jail| {
            jail.set_env("PROBE_TIMEOUT_SECS", "soon");
            assert!(load_config().is_err());
            Ok(())
        });
    }

    #[test]
    fn test_zero_probe_timeout_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("PROBE_TIMEOUT_SECS", "0");
            let err = load_config().expect_err("zero probe timeout");
            assert!(err.to_string().contains("PROBE_TIMEOUT_SECS"));
            Ok(())
        });
    }

    #[test]
    fn test_poll_timeout_must_be_positive() {
        for value in ["0", "-1"] {
            Jail::expect_with(|jail| {
                jail.set_env("POLL_TIMEOUT_SECS", value);
                let err = load_config().expect_err(value);
                assert!(err.to_string().contains("POLL_TIMEOUT_SECS"));
                Ok(())
            });
        }

        for value in ["NaN", "inf"] {
            Jail::expect_with(|jail| {
                jail.set_env("POLL_TIMEOUT_SECS", value);
                assert!(load_config().is_err());
                Ok(())
            });
        }
    }

    #[test]
    fn test_fractional_poll_timeout_is_accepted() {
        Jail::expect_with(|jail| {
            jail.set_env("POLL_TIMEOUT_SECS", "0.5");
            let config = load_config()?;
            assert_eq!(config.poll_timeout_secs, 0.5);
            Ok(())
        });
    }
}
