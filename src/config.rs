use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{DsxError, Result, Viewport};

/// File-level configuration, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub viewport: Viewport,
    pub timeouts: Timeouts,
    pub retry: RetryPolicy,
    pub colors: ColorThresholds,
    pub limits: Limits,
    /// Directory holding tech-fingerprint rule files.
    pub rules_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    #[serde(with = "humantime_serde")]
    pub navigation: Duration,
    #[serde(with = "humantime_serde")]
    pub settle: Duration,
    #[serde(with = "humantime_serde")]
    pub hover: Duration,
    #[serde(with = "humantime_serde")]
    pub focus: Duration,
    #[serde(with = "humantime_serde")]
    pub process: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(30),
            settle: Duration::from_secs(2),
            hover: Duration::from_millis(1000),
            focus: Duration::from_millis(1000),
            process: Duration::from_secs(120),
        }
    }
}

impl Timeouts {
    /// Multiplies every wait by `factor` (slow mode uses 3).
    pub fn scaled(&self, factor: u32) -> Self {
        Self {
            navigation: self.navigation * factor,
            settle: self.settle * factor,
            hover: self.hover * factor,
            focus: self.focus * factor,
            process: self.process * factor,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total navigation attempts, including the first.
    pub attempts: u32,
    #[serde(with = "humantime_serde")]
    pub backoff: Duration,
    /// Captures with less body text than this are retried while attempts remain.
    pub min_text_length: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            backoff: Duration::from_secs(2),
            min_text_length: 100,
        }
    }
}

/// Empirical constants of the color analyzer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorThresholds {
    /// Euclidean RGB distance under which two colors are merged.
    pub dedup_distance: f32,
    /// Usage share above which an unboosted color counts as structural.
    pub structural_usage_ratio: f32,
    /// A structural color must score below `count * structural_score_factor`.
    pub structural_score_factor: f32,
    pub min_occurrences: usize,
    pub occurrence_ratio: f32,
    /// Colors scoring at least this much are kept regardless of occurrence count.
    pub semantic_inclusion_score: f32,
}

impl Default for ColorThresholds {
    fn default() -> Self {
        Self {
            dedup_distance: 15.0,
            structural_usage_ratio: 0.4,
            structural_score_factor: 1.2,
            min_occurrences: 3,
            occurrence_ratio: 0.01,
            semantic_inclusion_score: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Upper bound on elements captured per pass.
    pub max_elements: usize,
    pub probe_elements: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_elements: 6000,
            probe_elements: 20,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            timeouts: Timeouts::default(),
            retry: RetryPolicy::default(),
            colors: ColorThresholds::default(),
            limits: Limits::default(),
            rules_dir: None,
        }
    }
}

impl Config {
    /// Loads config from `path`, else the central config file, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::central_config_path() {
            Some(central) if central.exists() => Self::from_file(&central),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
            .map_err(|e| DsxError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    pub fn from_toml(raw: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// `$XDG_CONFIG_HOME/dsx/config.toml`, falling back to `~/.config/dsx/config.toml`.
    pub fn central_config_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
        Some(base.join("dsx").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(DsxError::Config("viewport dimensions must be positive".into()));
        }
        if self.retry.attempts == 0 {
            return Err(DsxError::Config("retry.attempts must be at least 1".into()));
        }
        let colors = &self.colors;
        if colors.dedup_distance <= 0.0 {
            return Err(DsxError::Config("colors.dedup_distance must be positive".into()));
        }
        if !(0.0..=1.0).contains(&colors.structural_usage_ratio)
            || !(0.0..=1.0).contains(&colors.occurrence_ratio)
        {
            return Err(DsxError::Config(
                "colors ratios must be between 0.0 and 1.0".into(),
            ));
        }
        if colors.structural_score_factor <= 0.0 {
            return Err(DsxError::Config(
                "colors.structural_score_factor must be positive".into(),
            ));
        }
        if self.limits.max_elements == 0 {
            return Err(DsxError::Config("limits.max_elements must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_match_expected() {
        let cfg = Config::default();

        assert_eq!(cfg.viewport.width, 1440);
        assert_eq!(cfg.timeouts.navigation, Duration::from_secs(30));
        assert_eq!(cfg.retry.attempts, 2);
        assert_eq!(cfg.retry.min_text_length, 100);
        assert!((cfg.colors.dedup_distance - 15.0).abs() < f32::EPSILON);
        assert!((cfg.colors.structural_usage_ratio - 0.4).abs() < f32::EPSILON);
        assert_eq!(cfg.limits.probe_elements, 20);
        assert!(cfg.rules_dir.is_none());
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn parses_partial_toml_over_defaults() {
        let cfg = Config::from_toml(
            r#"
rules_dir = "/etc/dsx/rules"

[viewport]
width = 1280
height = 720

[timeouts]
navigation = "45s"
hover = "500ms"

[colors]
dedup_distance = 20.0
"#,
        )
        .expect("valid toml");

        assert_eq!(cfg.viewport.width, 1280);
        assert_eq!(cfg.timeouts.navigation, Duration::from_secs(45));
        assert_eq!(cfg.timeouts.hover, Duration::from_millis(500));
        assert_eq!(cfg.timeouts.settle, Duration::from_secs(2));
        assert!((cfg.colors.dedup_distance - 20.0).abs() < f32::EPSILON);
        assert_eq!(cfg.colors.min_occurrences, 3);
        assert_eq!(cfg.rules_dir.as_deref(), Some(Path::new("/etc/dsx/rules")));
    }

    #[test]
    fn slow_mode_triples_every_timeout() {
        let base = Timeouts::default();
        let slow = base.scaled(3);
        assert_eq!(slow.navigation, Duration::from_secs(90));
        assert_eq!(slow.hover, Duration::from_secs(3));
        assert_eq!(slow.process, base.process * 3);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.retry.attempts = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.colors.structural_usage_ratio = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.colors.dedup_distance = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dsx.toml");
        std::fs::write(&path, "[limits]\nprobe_elements = 5\n").expect("write config");
        let cfg = Config::load(Some(&path)).expect("load");
        assert_eq!(cfg.limits.probe_elements, 5);
        assert_eq!(cfg.limits.max_elements, 6000);
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "viewport = [").expect("write config");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("broken.toml"), "{err}");
    }
}
