//! Service configuration loaded from the environment
//!
//! Matching constants are deployment-time settings: they are read once at
//! start-up and never accepted per request.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Minimum similarity a best match must reach to be accepted
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.60;
/// Shortest descriptor accepted on either path
pub const DEFAULT_MIN_DIMS: usize = 64;
/// Length descriptors are truncated to before storage and matching
pub const DEFAULT_CANONICAL_DIMS: usize = 128;
/// Longest descriptor accepted on either path
pub const DEFAULT_MAX_DIMS: usize = 256;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const ENV_PREFIX: &str = "ATTENDANCE";

/// Length bounds applied to every incoming descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescriptorLimits {
    pub min_dims: usize,
    pub canonical_dims: usize,
    pub max_dims: usize,
}

impl Default for DescriptorLimits {
    fn default() -> Self {
        Self {
            min_dims: DEFAULT_MIN_DIMS,
            canonical_dims: DEFAULT_CANONICAL_DIMS,
            max_dims: DEFAULT_MAX_DIMS,
        }
    }
}

/// Settings used by the enrollment and check-in operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingConfig {
    pub match_threshold: f64,
    pub limits: DescriptorLimits,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            limits: DescriptorLimits::default(),
        }
    }
}

/// Top-level service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    pub match_threshold: f64,
    pub min_dims: usize,
    pub canonical_dims: usize,
    pub max_dims: usize,
}

impl AppConfig {
    /// Build the configuration from defaults overridden by the environment
    ///
    /// # Environment Variables
    /// - `ATTENDANCE_BIND_ADDR` (default: "0.0.0.0:8000")
    /// - `ATTENDANCE_MATCH_THRESHOLD` (default: 0.60)
    /// - `ATTENDANCE_MIN_DIMS` (default: 64)
    /// - `ATTENDANCE_CANONICAL_DIMS` (default: 128)
    /// - `ATTENDANCE_MAX_DIMS` (default: 256)
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("bind_addr", DEFAULT_BIND_ADDR)?
            .set_default("match_threshold", DEFAULT_MATCH_THRESHOLD)?
            .set_default("min_dims", DEFAULT_MIN_DIMS as i64)?
            .set_default("canonical_dims", DEFAULT_CANONICAL_DIMS as i64)?
            .set_default("max_dims", DEFAULT_MAX_DIMS as i64)?
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Matching settings derived from this configuration
    pub fn matching(&self) -> MatchingConfig {
        MatchingConfig {
            match_threshold: self.match_threshold,
            limits: DescriptorLimits {
                min_dims: self.min_dims,
                canonical_dims: self.canonical_dims,
                max_dims: self.max_dims,
            },
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_dims == 0 {
            return Err(ConfigError::Message(
                "min_dims must be at least 1".to_string(),
            ));
        }
        if self.min_dims > self.canonical_dims || self.canonical_dims > self.max_dims {
            return Err(ConfigError::Message(format!(
                "descriptor bounds must satisfy min_dims <= canonical_dims <= max_dims (got {} / {} / {})",
                self.min_dims, self.canonical_dims, self.max_dims
            )));
        }
        if !(-1.0..=1.0).contains(&self.match_threshold) {
            return Err(ConfigError::Message(format!(
                "match_threshold must lie in [-1, 1] (got {})",
                self.match_threshold
            )));
        }
        Ok(())
    }
}
