//! Configuration module
//!
//! Client and workspace settings, loaded from the environment (and a `.env` file when
//! present) with defaults matching the backend's local development setup.

use std::env;
use std::time::Duration;

use crate::validation::{MAX_UPLOAD_BYTES, PDF_CONTENT_TYPE};

// Common constants
const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/v1";
const HTTP_TIMEOUT_SECS: u64 = 60;
const PROGRESS_INITIAL: u8 = 20;
const PROGRESS_STEP: u8 = 10;
const PROGRESS_CEILING: u8 = 90;
const PROGRESS_TICK_MS: u64 = 200;
const SESSION_RESET_MS: u64 = 1000;
const BYTES_PER_MB: u64 = 1024 * 1024;

/// Remote endpoint settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub http_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            http_timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
        }
    }
}

/// Simulated upload progress: start at `initial`, add `step` every `tick`, stop at `ceiling`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressConfig {
    pub initial: u8,
    pub step: u8,
    pub ceiling: u8,
    pub tick: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            initial: PROGRESS_INITIAL,
            step: PROGRESS_STEP,
            ceiling: PROGRESS_CEILING,
            tick: Duration::from_millis(PROGRESS_TICK_MS),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkspaceConfig {
    pub max_upload_bytes: u64,
    pub accepted_content_type: String,
    pub progress: ProgressConfig,
    /// How long a finished upload session stays visible. `None` keeps it until the next upload.
    pub session_reset_delay: Option<Duration>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: MAX_UPLOAD_BYTES,
            accepted_content_type: PDF_CONTENT_TYPE.to_string(),
            progress: ProgressConfig::default(),
            session_reset_delay: Some(Duration::from_millis(SESSION_RESET_MS)),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub client: ClientConfig,
    pub workspace: WorkspaceConfig,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(variable = name, value = %raw, "Unparseable value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let api_url = env::var("PDFCHAT_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let http_timeout_secs = env_or("PDFCHAT_HTTP_TIMEOUT_SECS", HTTP_TIMEOUT_SECS);

        let max_upload_mb = env_or("PDFCHAT_MAX_UPLOAD_MB", MAX_UPLOAD_BYTES / BYTES_PER_MB);

        let accepted_content_type = env::var("PDFCHAT_ACCEPTED_CONTENT_TYPE")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| PDF_CONTENT_TYPE.to_string());

        let progress = ProgressConfig {
            initial: env_or("PDFCHAT_PROGRESS_INITIAL", PROGRESS_INITIAL),
            step: env_or("PDFCHAT_PROGRESS_STEP", PROGRESS_STEP),
            ceiling: env_or("PDFCHAT_PROGRESS_CEILING", PROGRESS_CEILING),
            tick: Duration::from_millis(env_or("PDFCHAT_PROGRESS_TICK_MS", PROGRESS_TICK_MS)),
        };

        let session_reset_ms = env_or("PDFCHAT_SESSION_RESET_MS", SESSION_RESET_MS);
        let session_reset_delay = (session_reset_ms > 0).then(|| Duration::from_millis(session_reset_ms));

        let config = Config {
            client: ClientConfig {
                api_url,
                http_timeout: Duration::from_secs(http_timeout_secs),
            },
            workspace: WorkspaceConfig {
                max_upload_bytes: max_upload_mb.saturating_mul(BYTES_PER_MB),
                accepted_content_type,
                progress,
                session_reset_delay,
            },
        };

        tracing::debug!(
            api_url = %config.client.api_url,
            max_upload_bytes = config.workspace.max_upload_bytes,
            "Loaded configuration"
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let api_url = &self.client.api_url;
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "PDFCHAT_API_URL must be an http(s) URL, got '{}'",
                api_url
            ));
        }

        if self.client.http_timeout.is_zero() {
            return Err(anyhow::anyhow!(
                "PDFCHAT_HTTP_TIMEOUT_SECS must be greater than 0"
            ));
        }

        if self.workspace.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("PDFCHAT_MAX_UPLOAD_MB must be greater than 0"));
        }

        if self.workspace.accepted_content_type.is_empty() {
            return Err(anyhow::anyhow!(
                "PDFCHAT_ACCEPTED_CONTENT_TYPE must not be empty"
            ));
        }

        let progress = &self.workspace.progress;
        if progress.ceiling >= 100 {
            return Err(anyhow::anyhow!(
                "PDFCHAT_PROGRESS_CEILING must be below 100, got {}",
                progress.ceiling
            ));
        }
        if progress.initial == 0 || progress.initial > progress.ceiling {
            return Err(anyhow::anyhow!(
                "PDFCHAT_PROGRESS_INITIAL must be between 1 and the ceiling ({}), got {}",
                progress.ceiling,
                progress.initial
            ));
        }
        if progress.step == 0 {
            return Err(anyhow::anyhow!("PDFCHAT_PROGRESS_STEP must be greater than 0"));
        }
        if progress.tick.is_zero() {
            return Err(anyhow::anyhow!(
                "PDFCHAT_PROGRESS_TICK_MS must be greater than 0"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "PDFCHAT_API_URL",
        "PDFCHAT_HTTP_TIMEOUT_SECS",
        "PDFCHAT_MAX_UPLOAD_MB",
        "PDFCHAT_ACCEPTED_CONTENT_TYPE",
        "PDFCHAT_PROGRESS_INITIAL",
        "PDFCHAT_PROGRESS_STEP",
        "PDFCHAT_PROGRESS_CEILING",
        "PDFCHAT_PROGRESS_TICK_MS",
        "PDFCHAT_SESSION_RESET_MS",
    ];

    /// Clears the PDFCHAT_* variables and restores their previous values on drop.
    struct EnvGuard {
        saved: Vec<(&'static str, Option<String>)>,
    }

    impl EnvGuard {
        fn clean() -> Self {
            let saved = VARS.iter().map(|name| (*name, env::var(name).ok())).collect();
            for name in VARS {
                env::remove_var(name);
            }
            Self { saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(value) => env::set_var(name, value),
                    None => env::remove_var(name),
                }
            }
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        let _guard = EnvGuard::clean();

        let config = Config::from_env().unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        let _guard = EnvGuard::clean();
        env::set_var("PDFCHAT_API_URL", "https://pdfchat.example.com/api/v1/");
        env::set_var("PDFCHAT_HTTP_TIMEOUT_SECS", "15");
        env::set_var("PDFCHAT_MAX_UPLOAD_MB", "25");
        env::set_var("PDFCHAT_ACCEPTED_CONTENT_TYPE", " application/x-pdf ");
        env::set_var("PDFCHAT_PROGRESS_INITIAL", "10");
        env::set_var("PDFCHAT_PROGRESS_STEP", "5");
        env::set_var("PDFCHAT_PROGRESS_CEILING", "80");
        env::set_var("PDFCHAT_PROGRESS_TICK_MS", "50");
        env::set_var("PDFCHAT_SESSION_RESET_MS", "2500");

        let config = Config::from_env().unwrap();

        assert_eq!(config.client.api_url, "https://pdfchat.example.com/api/v1");
        assert_eq!(config.client.http_timeout, Duration::from_secs(15));
        assert_eq!(config.workspace.max_upload_bytes, 25 * 1024 * 1024);
        assert_eq!(config.workspace.accepted_content_type, "application/x-pdf");
        assert_eq!(
            config.workspace.progress,
            ProgressConfig {
                initial: 10,
                step: 5,
                ceiling: 80,
                tick: Duration::from_millis(50),
            }
        );
        assert_eq!(
            config.workspace.session_reset_delay,
            Some(Duration::from_millis(2500))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_zero_reset_keeps_session() {
        let _guard = EnvGuard::clean();
        env::set_var("PDFCHAT_SESSION_RESET_MS", "0");

        let config = Config::from_env().unwrap();

        assert_eq!(config.workspace.session_reset_delay, None);
    }

    #[test]
    #[serial]
    fn test_from_env_unparseable_values_use_defaults() {
        let _guard = EnvGuard::clean();
        env::set_var("PDFCHAT_MAX_UPLOAD_MB", "ten");
        env::set_var("PDFCHAT_PROGRESS_STEP", "-3");
        env::set_var("PDFCHAT_SESSION_RESET_MS", "soon");

        let config = Config::from_env().unwrap();

        assert_eq!(config.workspace.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.workspace.progress.step, 10);
        assert_eq!(
            config.workspace.session_reset_delay,
            Some(Duration::from_millis(1000))
        );
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.client.api_url, "http://127.0.0.1:8000/api/v1");
        assert_eq!(config.workspace.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.workspace.progress.initial, 20);
        assert_eq!(
            config.workspace.session_reset_delay,
            Some(Duration::from_millis(1000))
        );
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let mut config = Config::default();
        config.client.api_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_full_progress_ceiling() {
        let mut config = Config::default();
        config.workspace.progress.ceiling = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_initial_above_ceiling() {
        let mut config = Config::default();
        config.workspace.progress.initial = 95;
        assert!(config.validate().is_err());

        config.workspace.progress.initial = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_step_and_tick() {
        let mut config = Config::default();
        config.workspace.progress.step = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.workspace.progress.tick = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_upload_limit() {
        let mut config = Config::default();
        config.workspace.max_upload_bytes = 0;
        assert!(config.validate().is_err());
    }
}
