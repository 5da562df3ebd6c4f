use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use dsx_lib::output::{ExtractOutput, DSX_OUTPUT_VERSION};
use dsx_lib::tokens::design_tokens;
use dsx_lib::types::{Confidence, IssueSeverity};
use dsx_lib::{DsxError, DsxOutput, ErrorOutput};

use crate::cli::OutputFormat;

/// Write output in the requested format.
pub fn write_output(
    body: &DsxOutput,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match (format, body) {
        (OutputFormat::Tokens, DsxOutput::Extract(out)) => {
            write_tokens_output(out, output.as_deref())?
        }
        // Tokens only make sense for an extraction; other modes stay JSON.
        (OutputFormat::Json | OutputFormat::Tokens, _) => write_json_output(body, output.as_deref())?,
        (OutputFormat::Pretty, _) => write_pretty_output(body, output.as_deref())?,
    };
    Ok(())
}

/// Render an error and return the appropriate exit code.
pub fn render_error(err: DsxError, format: OutputFormat, output: Option<PathBuf>) -> ExitCode {
    let error_payload = err.to_payload();
    let payload = DsxOutput::Error(ErrorOutput {
        version: DSX_OUTPUT_VERSION.to_string(),
        message: Some(error_payload.message.clone()),
        error: error_payload,
    });

    match format {
        OutputFormat::Json | OutputFormat::Tokens => {
            let content =
                serde_json::to_string(&payload).unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
            if let Some(path) = output {
                if let Err(write_err) = std::fs::write(&path, &content) {
                    eprintln!("Failed to write error output: {}", write_err);
                    println!("{content}");
                }
            } else {
                println!("{content}");
            }
        }
        OutputFormat::Pretty => {
            if let Err(write_err) = write_pretty_output(&payload, output.as_deref()) {
                eprintln!("Failed to write error output: {}", write_err);
            }
        }
    };

    ExitCode::from(2)
}

fn write_json_output(body: &DsxOutput, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string(body)?;
    write_content(&content, output)?;
    Ok(())
}

fn write_tokens_output(
    body: &ExtractOutput,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string_pretty(&design_tokens(&body.report))?;
    write_content(&content, output)?;
    Ok(())
}

fn write_content(content: &str, output: Option<&Path>) -> io::Result<()> {
    if let Some(path) = output {
        std::fs::write(path, content)
    } else {
        println!("{content}");
        Ok(())
    }
}

/// Write pretty output to file or stdout.
fn write_pretty_output(body: &DsxOutput, output: Option<&Path>) -> io::Result<()> {
    let stdout_is_tty = std::io::stdout().is_terminal();
    let use_human = output.is_none() && stdout_is_tty;

    if use_human {
        let content = format_pretty(body, true);
        println!("{content}");
        return Ok(());
    }

    // Non-tty or file output: keep JSON shape for pipelines/files.
    let content =
        serde_json::to_string_pretty(body).unwrap_or_else(|_| "{\"mode\":\"error\"}".to_string());
    write_content(&content, output)
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &DsxOutput, colorize: bool) -> String {
    match body {
        DsxOutput::Extract(out) => format_extract(out, colorize),
        DsxOutput::Rules(out) => {
            let mut buf = String::new();
            let header = color("[RULES]", "36", colorize);
            let source = match &out.source {
                dsx_lib::fingerprint::RuleSource::Builtin => "built-in".to_string(),
                dsx_lib::fingerprint::RuleSource::Directory(dir) => dir.display().to_string(),
            };
            writeln!(
                buf,
                "{} {} technologies in {} categories ({})",
                header,
                out.technology_count,
                out.categories.len(),
                source
            )
            .ok();
            for category in &out.categories {
                writeln!(
                    buf,
                    "- {:24} {}",
                    category.name,
                    category.technologies.join(", ")
                )
                .ok();
            }
            if !out.skipped.is_empty() {
                writeln!(buf, "{}", color("Skipped files:", "33", colorize)).ok();
                for skipped in &out.skipped {
                    writeln!(buf, "- {}: {}", skipped.path.display(), skipped.reason).ok();
                }
            }
            buf
        }
        DsxOutput::Error(out) => {
            let mut buf = String::new();
            let header = color("[ERROR]", "31", colorize);
            let message = out
                .message
                .as_deref()
                .unwrap_or_else(|| out.error.message.as_str());
            writeln!(buf, "{} {}", header, message).ok();
            if let Some(cause) = &out.error.cause {
                writeln!(buf, "Cause: {}", cause).ok();
            }
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {}", remediation).ok();
            }
            buf
        }
    }
}

fn format_extract(out: &ExtractOutput, colorize: bool) -> String {
    let report = &out.report;
    let mut buf = String::new();
    let header = color("[EXTRACT]", "36", colorize);
    let title = report.title.as_deref().unwrap_or("untitled");
    writeln!(buf, "{} {} ({}) at {}", header, out.url, title, out.viewport).ok();

    if let Some(note) = &report.note {
        writeln!(buf, "{}", color(note, "33", colorize)).ok();
    }
    if report.is_canvas_only {
        return buf;
    }

    if !report.colors.semantic_colors.is_empty() {
        writeln!(buf, "Semantic colors:").ok();
        for (role, hex) in &report.colors.semantic_colors {
            writeln!(buf, "- {:12} {}", role, hex).ok();
        }
    }
    if !report.colors.palette.is_empty() {
        writeln!(buf, "Palette (top 8 of {}):", report.colors.palette.len()).ok();
        for entry in report.colors.palette.iter().take(8) {
            let tags = if entry.context_tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", entry.context_tags.join(", "))
            };
            writeln!(
                buf,
                "- {} x{} {}{}",
                entry.normalized_hex,
                entry.occurrence_count,
                confidence_label(entry.confidence, colorize),
                tags
            )
            .ok();
        }
    }

    if !report.typography.styles.is_empty() {
        writeln!(buf, "Typography:").ok();
        for style in report.typography.styles.iter().take(6) {
            writeln!(
                buf,
                "- {:?} {} {}px/{}",
                style.context, style.family, style.size_px, style.weight
            )
            .ok();
        }
    }

    if let Some(grid) = report.spacing.grid {
        writeln!(buf, "Spacing grid: {}px", grid).ok();
    }
    let components = &report.components;
    writeln!(
        buf,
        "Components: {} buttons, {} inputs, {} links, {} badges, {} forms",
        components.buttons.len(),
        components.inputs.len(),
        components.links.len(),
        components.badges.len(),
        components.forms.len()
    )
    .ok();

    if !report.breakpoints.is_empty() {
        let names: Vec<String> = report
            .breakpoints
            .iter()
            .map(|b| format!("{}={}px", b.name, b.px))
            .collect();
        writeln!(buf, "Breakpoints: {}", names.join(", ")).ok();
    }
    if let Some(icons) = report.icon_system.primary() {
        writeln!(buf, "Icons: {}", icons).ok();
    }
    if !report.frameworks.is_empty() {
        let names: Vec<&str> = report.frameworks.iter().map(|f| f.name.as_str()).collect();
        writeln!(buf, "CSS frameworks: {}", names.join(", ")).ok();
    }

    let mut tech: Vec<&str> = report.tech_stack.iter().map(|t| t.name.as_str()).collect();
    for detected in &report.detected_tech {
        if !tech.contains(&detected.name.as_str()) {
            tech.push(detected.name.as_str());
        }
    }
    if !tech.is_empty() {
        writeln!(buf, "Tech stack: {}", tech.join(", ")).ok();
    }

    if let Some(audit) = &report.accessibility {
        let status = if audit.summary.passes_minimum_aa {
            color("AA", "32", colorize)
        } else {
            color("below AA", "31", colorize)
        };
        writeln!(
            buf,
            "Accessibility: score {} ({}), {} errors, {} warnings",
            audit.summary.score, status, audit.summary.errors, audit.summary.warnings
        )
        .ok();
        for issue in audit.issues.iter().take(5) {
            let code = match issue.severity {
                IssueSeverity::Error => "31",
                _ => "33",
            };
            writeln!(buf, "- {} {}", color(&issue.kind, code, colorize), issue.message).ok();
        }
    }
    buf
}

fn confidence_label(confidence: Confidence, colorize: bool) -> String {
    let (text, code) = match confidence {
        Confidence::High => ("high", "32"),
        Confidence::Medium => ("medium", "33"),
        Confidence::Low => ("low", "90"),
    };
    color(text, code, colorize)
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsx_lib::output::{ExtractOptions, RulesOutput};
    use dsx_lib::types::{ColorEntry, DesignReport};
    use dsx_lib::{fingerprint::RuleLibrary, Viewport};

    fn extract_output() -> DsxOutput {
        let mut report = DesignReport {
            url: "https://example.com".into(),
            title: Some("Example".into()),
            ..Default::default()
        };
        report
            .colors
            .semantic_colors
            .insert("primary".into(), "#6366f1".into());
        report.colors.palette.push(ColorEntry {
            original_text: "rgb(99, 102, 241)".into(),
            normalized_hex: "#6366f1".into(),
            occurrence_count: 3,
            semantic_score: 75.0,
            confidence: Confidence::High,
            context_tags: vec!["button".into()],
        });
        DsxOutput::Extract(ExtractOutput {
            version: DSX_OUTPUT_VERSION.into(),
            url: "https://example.com".into(),
            viewport: Viewport::default(),
            options: ExtractOptions {
                dark_mode: false,
                mobile: false,
                slow: false,
                analyzers: Vec::new(),
            },
            report,
        })
    }

    #[test]
    fn pretty_extract_lists_semantic_colors() {
        let text = format_pretty(&extract_output(), false);
        assert!(text.starts_with("[EXTRACT] https://example.com (Example) at 1440x900"));
        assert!(text.contains("primary"));
        assert!(text.contains("#6366f1 x3 high [button]"), "{text}");
        assert!(!text.contains("\x1b["));
    }

    #[test]
    fn pretty_rules_counts_technologies() {
        let library = RuleLibrary::builtin().expect("builtin rules");
        let body = DsxOutput::Rules(RulesOutput::from_library(&library));
        let text = format_pretty(&body, false);
        assert!(text.starts_with("[RULES]"));
        assert!(text.contains("built-in"));
        assert!(text.contains("WordPress"), "{text}");
    }

    #[test]
    fn pretty_error_shows_hint() {
        let payload = DsxError::Config("Unknown analyzer: colours".into()).to_payload();
        let body = DsxOutput::Error(ErrorOutput {
            version: DSX_OUTPUT_VERSION.into(),
            message: Some(payload.message.clone()),
            error: payload,
        });
        let text = format_pretty(&body, true);
        assert!(text.contains("\x1b[31m[ERROR]\x1b[0m"));
        assert!(text.contains("Hint:"));
    }

    #[test]
    fn tokens_format_writes_design_tokens_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tokens.json");
        write_output(&extract_output(), OutputFormat::Tokens, Some(path.clone()))
            .expect("write tokens");
        let raw = std::fs::read_to_string(&path).expect("read tokens");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["color"]["semantic"]["primary"]["$value"], "#6366f1");
    }
}
