//! Technology fingerprinting.
//!
//! Two independent strategies feed the report: the data-driven rule store
//! ([`rules`], evaluated by [`matcher`]) fills `techStack`, and the built-in
//! table ([`builtin`]) fills `detectedTech`.

pub mod builtin;
pub mod matcher;
pub mod rules;

pub use rules::{RuleCheck, RuleLibrary, RuleSource, SkippedFile, TechRule};

use crate::analysis::{Analyzer, AnalyzerKind, AnalyzerOutput, ExtractionContext};
use crate::Result;

pub struct TechAnalyzer;

impl Analyzer for TechAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Tech
    }

    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput> {
        let matches = matcher::match_rules(&ctx.rules, &ctx.page);
        let detected = builtin::detect(&ctx.page);
        tracing::debug!(
            rule_matches = matches.len(),
            builtin = detected.len(),
            "tech fingerprinting done"
        );
        Ok(AnalyzerOutput::Tech { matches, detected })
    }
}
