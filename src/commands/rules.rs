use std::path::PathBuf;
use std::process::ExitCode;

use dsx_lib::fingerprint::RuleLibrary;
use dsx_lib::output::RulesOutput;
use dsx_lib::{DsxError, DsxOutput};

use crate::cli::OutputFormat;
use crate::formatting::{render_error, write_output};
use crate::settings::load_config;

/// Run the rules command: `--rules-dir`, else config `rules_dir`, else `DSX_RULES_DIR`.
pub fn run_rules(
    config_path: Option<PathBuf>,
    verbose: bool,
    rules_dir: Option<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> ExitCode {
    let config = match load_config(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, output),
    };
    let dir = rules_dir.or(config.rules_dir);
    if verbose {
        match &dir {
            Some(dir) => eprintln!("Loading rules from {}\u{2026}", dir.display()),
            None => eprintln!("Loading rules from DSX_RULES_DIR or the built-in set\u{2026}"),
        }
    }
    let library = RuleLibrary::resolve(dir.as_deref());
    let body = DsxOutput::Rules(RulesOutput::from_library(&library));
    if let Err(err) = write_output(&body, format, output.clone()) {
        return render_error(DsxError::Config(err.to_string()), format, output);
    }
    ExitCode::SUCCESS
}
