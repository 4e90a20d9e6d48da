use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LATENCY_MS: u64 = 500;
const DEFAULT_SECRET: &str = "stagehub-local-signing-key";

/// Runtime settings. Environment variables first, CLI flags override.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    /// Fixed delay of every simulated backend call.
    pub latency: Duration,
    /// Key the backend signs session claims with.
    pub secret: String,
    /// When set, a company "publish" lands in `pending` for admin review
    /// instead of going live.
    pub publish_requires_review: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let db_path = match std::env::var("STAGEHUB_DB") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_db_path(),
        };
        let latency_ms = match std::env::var("STAGEHUB_LATENCY_MS") {
            Ok(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("STAGEHUB_LATENCY_MS is not a number: {}", raw))?,
            Err(_) => DEFAULT_LATENCY_MS,
        };
        let secret = std::env::var("STAGEHUB_SECRET").unwrap_or_else(|_| DEFAULT_SECRET.into());
        let publish_requires_review = std::env::var("STAGEHUB_REQUIRE_REVIEW")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Ok(Self {
            db_path,
            latency: Duration::from_millis(latency_ms),
            secret,
            publish_requires_review,
        })
    }

    pub fn with_overrides(
        mut self,
        db: Option<PathBuf>,
        latency_ms: Option<u64>,
        require_review: bool,
    ) -> Self {
        if let Some(db) = db {
            self.db_path = db;
        }
        if let Some(ms) = latency_ms {
            self.latency = Duration::from_millis(ms);
        }
        if require_review {
            self.publish_requires_review = true;
        }
        self
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            db_path: PathBuf::from(":memory:"),
            latency: Duration::ZERO,
            secret: "test-secret".to_string(),
            publish_requires_review: false,
        }
    }
}

fn default_db_path() -> PathBuf {
    // Use XDG data directory or fallback
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "stagehub") {
        proj_dirs.data_dir().join("stagehub.db")
    } else {
        PathBuf::from("stagehub.db")
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_base_values() {
        let config = Config::for_tests().with_overrides(
            Some(PathBuf::from("/tmp/x.db")),
            Some(20),
            true,
        );
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.latency, Duration::from_millis(20));
        assert!(config.publish_requires_review);
    }

    #[test]
    fn absent_overrides_keep_base_values() {
        let config = Config::for_tests().with_overrides(None, None, false);
        assert_eq!(config.latency, Duration::ZERO);
        assert!(!config.publish_requires_review);
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" 1 "));
        assert!(!parse_flag("off"));
        assert!(!parse_flag(""));
    }
}
