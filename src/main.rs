mod cli;
mod commands;
mod formatting;
mod progress;
mod settings;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_extract, run_rules, ExtractArgs};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    run().await
}

/// Logs go to stderr so stdout stays a single output document.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().collect();
    let args = cli::parse();
    init_logging(args.verbose);

    match args.command {
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
            run_extract(
                &raw_args,
                args.config,
                args.verbose,
                ExtractArgs {
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
                },
            )
            .await
        }
        Commands::Rules {
            rules_dir,
            format,
            output,
        } => run_rules(args.config, args.verbose, rules_dir, format, output),
    }
}
