use std::path::{Path, PathBuf};
use std::time::Duration;

use dsx_lib::{Config, DsxError, Viewport};
use tracing::info;

/// Tracks which CLI flags were explicitly provided vs. defaulted.
#[derive(Debug, Default)]
pub struct ExtractFlagSources {
    pub viewport: bool,
    pub nav_timeout: bool,
    pub process_timeout: bool,
}

impl ExtractFlagSources {
    pub fn from_args(args: &[String]) -> Self {
        Self {
            viewport: flag_present(args, "--viewport"),
            nav_timeout: flag_present(args, "--nav-timeout"),
            process_timeout: flag_present(args, "--process-timeout"),
        }
    }
}

/// Checks if a flag was present in the command-line arguments.
pub fn flag_present(args: &[String], flag: &str) -> bool {
    args.iter()
        .any(|arg| arg == flag || arg.starts_with(&format!("{flag}=")))
}

/// Values taken from the command line for `extract`.
#[derive(Debug, Clone)]
pub struct ExtractCliValues {
    pub viewport: Viewport,
    pub nav_timeout: u64,
    pub process_timeout: u64,
    pub rules_dir: Option<PathBuf>,
}

/// Merge CLI arguments into the config, preferring CLI when flags are present.
///
/// `--rules-dir` is an `Option` and wins whenever given; otherwise the
/// config's `rules_dir` stands.
pub fn resolve_extract_settings(
    cli: ExtractCliValues,
    config: &Config,
    flags: &ExtractFlagSources,
) -> Config {
    let mut resolved = config.clone();
    if flags.viewport {
        resolved.viewport = cli.viewport;
    }
    if flags.nav_timeout {
        resolved.timeouts.navigation = Duration::from_secs(cli.nav_timeout);
    }
    if flags.process_timeout {
        resolved.timeouts.process = Duration::from_secs(cli.process_timeout);
    }
    if cli.rules_dir.is_some() {
        resolved.rules_dir = cli.rules_dir;
    }
    resolved
}

/// Load config from a TOML file, central config, or return defaults.
/// Priority: explicit path > ~/.config/dsx/config.toml > defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, DsxError> {
    let cfg = Config::load(path).map_err(|e| {
        let loc = path
            .map(|p| p.display().to_string())
            .or_else(|| Config::central_config_path().map(|p| p.display().to_string()))
            .unwrap_or_else(|| "defaults".to_string());
        DsxError::Config(format!("Failed to read config {}: {}", loc, e))
    })?;

    cfg.validate().map_err(|e| {
        let prefix = path
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {}", e));
        DsxError::Config(prefix)
    })?;
    Ok(cfg)
}

/// Log effective config (visible with --verbose).
pub fn log_effective_config(config_path: Option<&Path>, config: &Config, slow: bool) {
    info!("{}", format_effective_config(config, slow, config_path));
}

fn format_effective_config(config: &Config, slow: bool, config_source: Option<&Path>) -> String {
    let source = config_source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    let t = &config.timeouts;
    let rules = config
        .rules_dir
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in".to_string());
    format!(
        "Effective config [{source}]: viewport={}, timeouts: nav={}s, settle={}ms, hover={}ms, focus={}ms, process={}s{}, retry: attempts={} backoff={}ms, dedup_distance={:.1}, max_elements={}, probe_elements={}, rules={rules}",
        config.viewport,
        t.navigation.as_secs(),
        t.settle.as_millis(),
        t.hover.as_millis(),
        t.focus.as_millis(),
        t.process.as_secs(),
        if slow { " (x3 slow)" } else { "" },
        config.retry.attempts,
        config.retry.backoff.as_millis(),
        config.colors.dedup_distance,
        config.limits.max_elements,
        config.limits.probe_elements,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsx_lib::config::Timeouts;

    fn cli_values() -> ExtractCliValues {
        ExtractCliValues {
            viewport: Viewport {
                width: 999,
                height: 999,
            },
            nav_timeout: 50,
            process_timeout: 70,
            rules_dir: None,
        }
    }

    #[test]
    fn resolve_extract_settings_prefers_config_when_flags_absent() {
        let cfg = Config {
            viewport: Viewport {
                width: 111,
                height: 222,
            },
            timeouts: Timeouts {
                navigation: Duration::from_secs(5),
                process: Duration::from_secs(7),
                ..Timeouts::default()
            },
            rules_dir: Some(PathBuf::from("/etc/dsx/rules")),
            ..Config::default()
        };
        let resolved = resolve_extract_settings(cli_values(), &cfg, &ExtractFlagSources::default());

        assert_eq!(resolved.viewport.width, 111);
        assert_eq!(resolved.viewport.height, 222);
        assert_eq!(resolved.timeouts.navigation, Duration::from_secs(5));
        assert_eq!(resolved.timeouts.process, Duration::from_secs(7));
        assert_eq!(resolved.rules_dir, Some(PathBuf::from("/etc/dsx/rules")));
    }

    #[test]
    fn resolve_extract_settings_prefers_cli_when_flags_present() {
        let cfg = Config {
            rules_dir: Some(PathBuf::from("/etc/dsx/rules")),
            ..Config::default()
        };
        let flags = ExtractFlagSources {
            viewport: true,
            nav_timeout: true,
            process_timeout: true,
        };
        let cli = ExtractCliValues {
            rules_dir: Some(PathBuf::from("rules")),
            ..cli_values()
        };
        let resolved = resolve_extract_settings(cli, &cfg, &flags);

        assert_eq!(resolved.viewport.width, 999);
        assert_eq!(resolved.timeouts.navigation, Duration::from_secs(50));
        assert_eq!(resolved.timeouts.process, Duration::from_secs(70));
        assert_eq!(resolved.rules_dir, Some(PathBuf::from("rules")));
        assert_eq!(resolved.timeouts.settle, cfg.timeouts.settle);
    }

    #[test]
    fn flag_present_accepts_equals_form() {
        let args: Vec<String> = ["dsx", "extract", "--viewport=800x600", "https://a.test"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(flag_present(&args, "--viewport"));
        assert!(!flag_present(&args, "--nav-timeout"));
    }

    #[test]
    fn format_effective_config_includes_key_fields() {
        let summary =
            format_effective_config(&Config::default(), true, Some(Path::new("dsx.toml")));
        assert!(summary.contains("1440x900"), "{summary}");
        assert!(summary.contains("nav=30s"), "{summary}");
        assert!(summary.contains("x3 slow"), "{summary}");
        assert!(summary.contains("attempts=2"), "{summary}");
        assert!(summary.contains("rules=built-in"), "{summary}");
        assert!(summary.contains("dsx.toml"), "{summary}");
    }
}
