use std::env;
use std::path::PathBuf;

use chrono::Local;

use crate::matcher::{MatchConfig, DEFAULT_MATCH_WINDOW_HOURS};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const DATA_DIR_ENV: &str = "SWIM_TRIBE_DATA_DIR";
const MATCH_WINDOW_ENV: &str = "SWIM_TRIBE_MATCH_WINDOW_HOURS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Missing configuration: {0}")]
  Missing(String),

  #[error("Invalid configuration: {0}")]
  Invalid(String),
}

/// App-level configuration, loaded from the environment (and a `.env` file
/// when present). The shell sets the data directory; the match window has a
/// documented default and exists mainly for QA tuning.
#[derive(Debug, Clone)]
pub struct AppConfig {
  pub data_dir: PathBuf,
  pub match_window_hours: i64,
}

impl AppConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    dotenvy::dotenv().ok();

    let data_dir = env::var(DATA_DIR_ENV)
      .map(PathBuf::from)
      .map_err(|_| ConfigError::Missing(DATA_DIR_ENV.into()))?;

    let match_window_hours = match env::var(MATCH_WINDOW_ENV) {
      Ok(raw) => raw
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|hours| *hours > 0)
        .ok_or_else(|| ConfigError::Invalid(format!("{}={}", MATCH_WINDOW_ENV, raw)))?,
      Err(_) => DEFAULT_MATCH_WINDOW_HOURS,
    };

    Ok(Self {
      data_dir,
      match_window_hours,
    })
  }

  /// Matcher configuration in the host's local offset.
  pub fn match_config(&self) -> MatchConfig {
    MatchConfig::new(self.match_window_hours, *Local::now().offset())
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn test_defaults_apply_when_window_unset() {
    temp_env::with_vars(
      [(DATA_DIR_ENV, Some("/tmp/swim-tribe-test")), (MATCH_WINDOW_ENV, None)],
      || {
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/swim-tribe-test"));
        assert_eq!(config.match_window_hours, DEFAULT_MATCH_WINDOW_HOURS);
      },
    );
  }

  #[test]
  #[serial]
  fn test_window_override() {
    temp_env::with_vars(
      [(DATA_DIR_ENV, Some("/tmp/swim-tribe-test")), (MATCH_WINDOW_ENV, Some("10"))],
      || {
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.match_window_hours, 10);
        assert_eq!(config.match_config().window, chrono::Duration::hours(10));
      },
    );
  }

  #[test]
  #[serial]
  fn test_missing_data_dir_is_an_error() {
    temp_env::with_vars([(DATA_DIR_ENV, None::<&str>)], || {
      assert!(matches!(AppConfig::from_env(), Err(ConfigError::Missing(_))));
    });
  }

  #[test]
  #[serial]
  fn test_invalid_window_is_an_error() {
    temp_env::with_vars(
      [(DATA_DIR_ENV, Some("/tmp/swim-tribe-test")), (MATCH_WINDOW_ENV, Some("soon"))],
      || {
        assert!(matches!(AppConfig::from_env(), Err(ConfigError::Invalid(_))));
      },
    );

    temp_env::with_vars(
      [(DATA_DIR_ENV, Some("/tmp/swim-tribe-test")), (MATCH_WINDOW_ENV, Some("0"))],
      || {
        assert!(matches!(AppConfig::from_env(), Err(ConfigError::Invalid(_))));
      },
    );
  }
}
