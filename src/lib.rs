//! Design System eXtractor (DSX) Library
//!
//! Renders a live web page in headless Chromium and infers the design system
//! behind it: color palette and semantic roles, typography scale, spacing grid,
//! radii, borders and shadows, component styles with interaction states,
//! breakpoints, icon and CSS frameworks, an accessibility audit and the
//! technology stack.
//!
//! # Module Overview
//!
//! - [`browser`] - Playwright-driven page capture with retries and mock support
//! - [`analysis`] - Analyzers that turn a capture into report sections
//! - [`fingerprint`] - Technology detection (rule store and built-in table)
//! - [`pipeline`] - Runs the analyzers and merges probe/variant results
//! - [`tokens`] - W3C Design Tokens export
//! - [`config`] - Configuration file support
//! - [`types`] - Capture and report data types
//! - [`output`] - JSON output envelopes
//!
//! # Example
//!
//! ```no_run
//! use dsx_lib::{extract_design, BrowserManager, CaptureOptions, Config, ExtractionSettings};
//! use dsx_lib::fingerprint::RuleLibrary;
//!
//! # async fn example() -> dsx_lib::Result<()> {
//! let config = Config::default();
//! let manager = BrowserManager::new(CaptureOptions::from_config(&config));
//! let page = manager.capture("https://example.com").await?;
//!
//! let report = extract_design(
//!     page,
//!     ExtractionSettings::from(&config),
//!     RuleLibrary::resolve(None),
//!     &[],
//! )
//! .await;
//! println!("{} palette colors", report.colors.palette.len());
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod browser;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod output;
pub mod pipeline;
pub mod tokens;
pub mod types;
pub mod viewport;

pub use analysis::{
    default_analyzers, parse_analyzer_list, Analyzer, AnalyzerKind, AnalyzerOutput,
    ExtractionContext, ExtractionSettings,
};
pub use browser::{BrowserManager, CaptureOptions};
pub use config::Config;
pub use error::{DsxError, ErrorCategory, ErrorPayload, NavigationErrorKind, Result};
pub use fingerprint::RuleLibrary;
pub use output::{
    DsxOutput, ErrorOutput, ExtractOptions, ExtractOutput, RulesOutput, DSX_OUTPUT_VERSION,
};
pub use pipeline::extract_design;
pub use tokens::design_tokens;
pub use types::{DesignReport, PageCapture};
pub use viewport::Viewport;
