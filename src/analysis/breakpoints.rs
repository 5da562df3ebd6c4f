use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Analyzer, AnalyzerKind, AnalyzerOutput, ExtractionContext};
use crate::types::Breakpoint;
use crate::Result;

static WIDTH_FEATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:min|max)-width\s*:\s*(\d+(?:\.\d+)?)\s*(px|em|rem)")
        .expect("width feature regex is valid")
});

const ROOT_FONT_PX: f32 = 16.0;

pub struct BreakpointAnalyzer;

impl Analyzer for BreakpointAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Breakpoints
    }

    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Breakpoints(breakpoints(
            &ctx.page.stylesheets.media_queries,
        )))
    }
}

/// Distinct width breakpoints, ascending, with the number of queries using each.
pub fn breakpoints(queries: &[String]) -> Vec<Breakpoint> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for query in queries {
        let mut seen = Vec::new();
        for cap in WIDTH_FEATURE.captures_iter(query) {
            let Ok(value) = cap[1].parse::<f32>() else {
                continue;
            };
            let px = match cap[2].to_ascii_lowercase().as_str() {
                "px" => value,
                _ => value * ROOT_FONT_PX,
            }
            .round() as u32;
            if px == 0 || seen.contains(&px) {
                continue;
            }
            seen.push(px);
            *counts.entry(px).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|(px, queries)| Breakpoint {
            name: conventional_name(px).to_string(),
            px,
            queries,
        })
        .collect()
}

pub fn conventional_name(px: u32) -> &'static str {
    match px {
        0..=640 => "sm",
        641..=768 => "md",
        769..=1024 => "lg",
        1025..=1280 => "xl",
        _ => "2xl",
    }
}
