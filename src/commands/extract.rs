use std::path::PathBuf;
use std::process::ExitCode;

use dsx_lib::analysis::{parse_analyzer_list, AnalyzerKind, ExtractionSettings};
use dsx_lib::browser::{BrowserManager, CaptureOptions};
use dsx_lib::fingerprint::RuleLibrary;
use dsx_lib::output::{ExtractOptions, ExtractOutput, DSX_OUTPUT_VERSION};
use dsx_lib::pipeline::extract_design;
use dsx_lib::{DsxError, DsxOutput, Viewport};
use tracing::debug;
use url::Url;

use crate::cli::OutputFormat;
use crate::formatting::{render_error, write_output};
use crate::progress::stderr_progress;
use crate::settings::{
    load_config, log_effective_config, resolve_extract_settings, ExtractCliValues,
    ExtractFlagSources,
};

/// Arguments of the extract subcommand, as parsed.
pub struct ExtractArgs {
    pub url: String,
    pub viewport: Viewport,
    pub dark_mode: bool,
    pub mobile: bool,
    pub slow: bool,
    pub analyzers: Option<Vec<String>>,
    pub rules_dir: Option<PathBuf>,
    pub nav_timeout: u64,
    pub process_timeout: u64,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

/// Run the extract command.
pub async fn run_extract(
    raw_args: &[String],
    config_path: Option<PathBuf>,
    verbose: bool,
    args: ExtractArgs,
) -> ExitCode {
    let format = args.format;
    let output = args.output.clone();
    match extract(raw_args, config_path, verbose, args).await {
        Ok(body) => {
            if let Err(err) = write_output(&body, format, output.clone()) {
                return render_error(DsxError::Config(err.to_string()), format, output);
            }
            ExitCode::SUCCESS
        }
        Err(err) => render_error(err, format, output),
    }
}

async fn extract(
    raw_args: &[String],
    config_path: Option<PathBuf>,
    verbose: bool,
    args: ExtractArgs,
) -> Result<DsxOutput, DsxError> {
    let config = load_config(config_path.as_deref())?;
    let url = validate_url(&args.url)?;
    let selected = match &args.analyzers {
        Some(list) => parse_analyzer_list(&list.join(","))?,
        None => Vec::new(),
    };

    let flags = ExtractFlagSources::from_args(raw_args);
    let resolved = resolve_extract_settings(
        ExtractCliValues {
            viewport: args.viewport,
            nav_timeout: args.nav_timeout,
            process_timeout: args.process_timeout,
            rules_dir: args.rules_dir,
        },
        &config,
        &flags,
    );
    if verbose {
        log_effective_config(config_path.as_deref(), &resolved, args.slow);
    }

    let mut options = CaptureOptions::from_config(&resolved);
    options.dark_mode = args.dark_mode;
    options.mobile = args.mobile;
    options.slow = args.slow;
    options.progress = stderr_progress(verbose);
    let manager = BrowserManager::new(options);
    let page = manager.capture(url.as_str()).await?;
    debug!(
        elements = page.elements.len(),
        text_length = page.text_length,
        "capture received"
    );

    let rules = if selected.is_empty() || selected.contains(&AnalyzerKind::Tech) {
        RuleLibrary::resolve(resolved.rules_dir.as_deref())
    } else {
        RuleLibrary::default()
    };
    let report = extract_design(page, ExtractionSettings::from(&resolved), rules, &selected).await;

    Ok(DsxOutput::Extract(ExtractOutput {
        version: DSX_OUTPUT_VERSION.to_string(),
        url: url.to_string(),
        viewport: resolved.viewport,
        options: ExtractOptions {
            dark_mode: args.dark_mode,
            mobile: args.mobile,
            slow: args.slow,
            analyzers: selected.iter().map(ToString::to_string).collect(),
        },
        report,
    }))
}

/// Only absolute http(s) URLs can be rendered.
fn validate_url(raw: &str) -> Result<Url, DsxError> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DsxError::Config(format!(
            "Unsupported URL scheme '{other}': expected http or https"
        ))),
    }
}
