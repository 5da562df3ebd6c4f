use clap::{Parser, Subcommand, ValueEnum};
use dsx_lib::Viewport;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dsx")]
#[command(
    version,
    about = "Design System eXtractor - Infer the design system behind a rendered web page",
    long_about = "Design System eXtractor (DSX)\n\nModes:\n- extract: render a URL in headless Chromium and report its colors, typography, spacing, components, accessibility and tech stack.\n- rules: list the technology fingerprint rules that would be used.\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) with viewport/timeouts/retry/color thresholds; CLI flags override config"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract the design system of a live page
    Extract {
        #[arg(help = "Page URL (http or https)")]
        url: String,

        #[arg(
            long,
            default_value = "1440x900",
            help = "Viewport dimensions (WIDTHxHEIGHT)"
        )]
        viewport: Viewport,

        #[arg(long, help = "Also capture a dark color-scheme variant")]
        dark_mode: bool,

        #[arg(long, help = "Also capture a 390x844 mobile variant")]
        mobile: bool,

        #[arg(long, help = "Triple every timeout for heavy or slow sites")]
        slow: bool,

        #[arg(
            long,
            value_delimiter = ',',
            help = "Analyzers to run (colors,typography,spacing,border-radius,borders,shadows,buttons,inputs,links,badges,forms,breakpoints,icons,frameworks,accessibility,tech)"
        )]
        analyzers: Option<Vec<String>>,

        #[arg(
            long,
            value_name = "PATH",
            help = "Directory of tech fingerprint rule files (overrides config and DSX_RULES_DIR)"
        )]
        rules_dir: Option<PathBuf>,

        #[arg(
            long,
            default_value = "30",
            help = "Navigation timeout (seconds)"
        )]
        nav_timeout: u64,

        #[arg(
            long,
            default_value = "120",
            help = "Process timeout (seconds) for the Playwright helper"
        )]
        process_timeout: u64,

        #[arg(long, value_enum, default_value = "json", help = "Output format")]
        format: OutputFormat,

        #[arg(long, short, help = "Output file path (stdout if omitted)")]
        output: Option<PathBuf>,
    },

    /// List the technology fingerprint rules in use
    Rules {
        #[arg(
            long,
            value_name = "PATH",
            help = "Directory of tech fingerprint rule files (overrides config and DSX_RULES_DIR)"
        )]
        rules_dir: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "json", help = "Output format")]
        format: OutputFormat,

        #[arg(long, short, help = "Output file path (stdout if omitted)")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum, Default, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
    /// W3C Design Tokens (extract only)
    Tokens,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, OutputFormat};
    use clap::Parser;

    #[test]
    fn extract_command_uses_defaults() {
        let cli = Cli::parse_from(["dsx", "extract", "https://example.com"]);

        assert!(!cli.verbose);
        assert!(cli.config.is_none());

        match cli.command {
            Commands::Extract {
                url,
                viewport,
                dark_mode,
                mobile,
                slow,
                analyzers,
                rules_dir,
                nav_timeout,
                process_timeout,
                format,
                output,
            } => {
                assert_eq!(url, "https://example.com");
                assert_eq!(viewport.width, 1440);
                assert_eq!(viewport.height, 900);
                assert!(!dark_mode && !mobile && !slow);
                assert!(analyzers.is_none());
                assert!(rules_dir.is_none());
                assert_eq!(nav_timeout, 30);
                assert_eq!(process_timeout, 120);
                assert_eq!(format, OutputFormat::Json);
                assert!(output.is_none());
            }
            _ => panic!("expected extract command"),
        }
    }

    #[test]
    fn extract_command_respects_overrides() {
        let cli = Cli::parse_from([
            "dsx",
            "extract",
            "https://example.com/pricing",
            "--viewport",
            "1280x720",
            "--dark-mode",
            "--mobile",
            "--slow",
            "--analyzers",
            "colors,buttons",
            "--rules-dir",
            "rules",
            "--nav-timeout",
            "45",
            "--format",
            "tokens",
            "--output",
            "tokens.json",
            "--config",
            "dsx.toml",
        ]);

        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("dsx.toml")));
        match cli.command {
            Commands::Extract {
                viewport,
                dark_mode,
                mobile,
                slow,
                analyzers,
                rules_dir,
                nav_timeout,
                format,
                output,
                ..
            } => {
                assert_eq!(viewport.width, 1280);
                assert_eq!(viewport.height, 720);
                assert!(dark_mode && mobile && slow);
                assert_eq!(
                    analyzers,
                    Some(vec![String::from("colors"), String::from("buttons")])
                );
                assert_eq!(rules_dir.as_deref(), Some(std::path::Path::new("rules")));
                assert_eq!(nav_timeout, 45);
                assert_eq!(format, OutputFormat::Tokens);
                assert_eq!(output.as_deref(), Some(std::path::Path::new("tokens.json")));
            }
            _ => panic!("expected extract command with overrides"),
        }
    }

    #[test]
    fn rules_command_sets_verbose() {
        let cli = Cli::parse_from(["dsx", "--verbose", "rules", "--format", "pretty"]);

        assert!(cli.verbose);
        match cli.command {
            Commands::Rules {
                rules_dir,
                format,
                output,
            } => {
                assert!(rules_dir.is_none());
                assert_eq!(format, OutputFormat::Pretty);
                assert!(output.is_none());
            }
            _ => panic!("expected rules command"),
        }
    }

    #[test]
    fn extract_requires_url() {
        assert!(Cli::try_parse_from(["dsx", "extract"]).is_err());
    }
}
