//! Design-system analyzers.
//!
//! Every analyzer is a pure function of an [`ExtractionContext`]: it reads the
//! captured page and returns one [`AnalyzerOutput`]. Analyzers never mutate the
//! capture, so the passive batch runs concurrently (see [`runner`]). Probe and
//! variant results are folded in afterwards by the extraction pipeline.

pub mod accessibility;
pub mod breakpoints;
pub mod canvas;
pub mod color;
pub mod components;
pub mod context;
pub mod icons;
pub mod layout;
pub mod probe;
pub mod runner;
pub mod stylesheet;
#[cfg(test)]
pub(crate) mod test_support;
pub mod typography;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::DsxError;
use crate::types::{
    AccessibilityAudit, BadgeEntry, BorderCombo, Breakpoint, ButtonStyle, DetectedTech,
    FormDescriptor, FrameworkHint, IconSystem, InputGroups, LinkStyle, PaletteResult,
    SpacingScale, TechMatch, TypographyResult, UsageValue,
};
use crate::Result;

pub use context::{CapturePass, ExtractionContext, ExtractionSettings};
pub use runner::run_passive;

/// The kind of analysis being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalyzerKind {
    Colors,
    Typography,
    Spacing,
    BorderRadius,
    Borders,
    Shadows,
    Buttons,
    Inputs,
    Links,
    Badges,
    Forms,
    Breakpoints,
    Icons,
    Frameworks,
    Accessibility,
    Tech,
}

impl AnalyzerKind {
    pub const fn all() -> [AnalyzerKind; 16] {
        [
            AnalyzerKind::Colors,
            AnalyzerKind::Typography,
            AnalyzerKind::Spacing,
            AnalyzerKind::BorderRadius,
            AnalyzerKind::Borders,
            AnalyzerKind::Shadows,
            AnalyzerKind::Buttons,
            AnalyzerKind::Inputs,
            AnalyzerKind::Links,
            AnalyzerKind::Badges,
            AnalyzerKind::Forms,
            AnalyzerKind::Breakpoints,
            AnalyzerKind::Icons,
            AnalyzerKind::Frameworks,
            AnalyzerKind::Accessibility,
            AnalyzerKind::Tech,
        ]
    }

    /// Analyzers re-run against the dark-mode capture.
    pub const fn dark_variant() -> [AnalyzerKind; 3] {
        [
            AnalyzerKind::Colors,
            AnalyzerKind::Buttons,
            AnalyzerKind::Links,
        ]
    }

    pub const fn mobile_variant() -> [AnalyzerKind; 1] {
        [AnalyzerKind::Colors]
    }
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                AnalyzerKind::Colors => "colors",
                AnalyzerKind::Typography => "typography",
                AnalyzerKind::Spacing => "spacing",
                AnalyzerKind::BorderRadius => "border-radius",
                AnalyzerKind::Borders => "borders",
                AnalyzerKind::Shadows => "shadows",
                AnalyzerKind::Buttons => "buttons",
                AnalyzerKind::Inputs => "inputs",
                AnalyzerKind::Links => "links",
                AnalyzerKind::Badges => "badges",
                AnalyzerKind::Forms => "forms",
                AnalyzerKind::Breakpoints => "breakpoints",
                AnalyzerKind::Icons => "icons",
                AnalyzerKind::Frameworks => "frameworks",
                AnalyzerKind::Accessibility => "accessibility",
                AnalyzerKind::Tech => "tech",
            }
        )
    }
}

impl FromStr for AnalyzerKind {
    type Err = DsxError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "colors" | "color" => Ok(AnalyzerKind::Colors),
            "typography" => Ok(AnalyzerKind::Typography),
            "spacing" => Ok(AnalyzerKind::Spacing),
            "border-radius" | "radius" => Ok(AnalyzerKind::BorderRadius),
            "borders" => Ok(AnalyzerKind::Borders),
            "shadows" => Ok(AnalyzerKind::Shadows),
            "buttons" => Ok(AnalyzerKind::Buttons),
            "inputs" => Ok(AnalyzerKind::Inputs),
            "links" => Ok(AnalyzerKind::Links),
            "badges" => Ok(AnalyzerKind::Badges),
            "forms" => Ok(AnalyzerKind::Forms),
            "breakpoints" => Ok(AnalyzerKind::Breakpoints),
            "icons" => Ok(AnalyzerKind::Icons),
            "frameworks" => Ok(AnalyzerKind::Frameworks),
            "accessibility" | "a11y" => Ok(AnalyzerKind::Accessibility),
            "tech" => Ok(AnalyzerKind::Tech),
            _ => Err(DsxError::Config(format!("Unknown analyzer: {}", s))),
        }
    }
}

/// Parses a comma-separated analyzer list; empty input selects everything.
pub fn parse_analyzer_list(raw: &str) -> Result<Vec<AnalyzerKind>> {
    let mut kinds = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let kind: AnalyzerKind = part.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

/// Trait implemented by every passive analyzer.
pub trait Analyzer: Send + Sync {
    fn kind(&self) -> AnalyzerKind;
    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput>;
}

#[derive(Debug, Clone)]
pub enum AnalyzerOutput {
    Colors(PaletteResult),
    Typography(TypographyResult),
    Spacing(SpacingScale),
    BorderRadius(Vec<UsageValue>),
    Borders(Vec<BorderCombo>),
    Shadows(Vec<UsageValue>),
    Buttons(Vec<ButtonStyle>),
    Inputs(InputGroups),
    Links(Vec<LinkStyle>),
    Badges(Vec<BadgeEntry>),
    Forms(Vec<FormDescriptor>),
    Breakpoints(Vec<Breakpoint>),
    Icons(IconSystem),
    Frameworks(Vec<FrameworkHint>),
    Accessibility(AccessibilityAudit),
    Tech {
        matches: Vec<TechMatch>,
        detected: Vec<DetectedTech>,
    },
}

impl AnalyzerOutput {
    pub fn kind(&self) -> AnalyzerKind {
        match self {
            AnalyzerOutput::Colors(_) => AnalyzerKind::Colors,
            AnalyzerOutput::Typography(_) => AnalyzerKind::Typography,
            AnalyzerOutput::Spacing(_) => AnalyzerKind::Spacing,
            AnalyzerOutput::BorderRadius(_) => AnalyzerKind::BorderRadius,
            AnalyzerOutput::Borders(_) => AnalyzerKind::Borders,
            AnalyzerOutput::Shadows(_) => AnalyzerKind::Shadows,
            AnalyzerOutput::Buttons(_) => AnalyzerKind::Buttons,
            AnalyzerOutput::Inputs(_) => AnalyzerKind::Inputs,
            AnalyzerOutput::Links(_) => AnalyzerKind::Links,
            AnalyzerOutput::Badges(_) => AnalyzerKind::Badges,
            AnalyzerOutput::Forms(_) => AnalyzerKind::Forms,
            AnalyzerOutput::Breakpoints(_) => AnalyzerKind::Breakpoints,
            AnalyzerOutput::Icons(_) => AnalyzerKind::Icons,
            AnalyzerOutput::Frameworks(_) => AnalyzerKind::Frameworks,
            AnalyzerOutput::Accessibility(_) => AnalyzerKind::Accessibility,
            AnalyzerOutput::Tech { .. } => AnalyzerKind::Tech,
        }
    }
}

/// Returns the default set of all analyzers.
pub fn default_analyzers() -> Vec<Arc<dyn Analyzer>> {
    vec![
        Arc::new(color::ColorAnalyzer),
        Arc::new(typography::TypographyAnalyzer),
        Arc::new(layout::SpacingAnalyzer),
        Arc::new(layout::RadiusAnalyzer),
        Arc::new(layout::BorderAnalyzer),
        Arc::new(layout::ShadowAnalyzer),
        Arc::new(components::buttons::ButtonAnalyzer),
        Arc::new(components::inputs::InputAnalyzer),
        Arc::new(components::links::LinkAnalyzer),
        Arc::new(components::badges::BadgeAnalyzer),
        Arc::new(components::forms::FormAnalyzer),
        Arc::new(breakpoints::BreakpointAnalyzer),
        Arc::new(icons::IconAnalyzer),
        Arc::new(icons::FrameworkAnalyzer),
        Arc::new(accessibility::AccessibilityAnalyzer),
        Arc::new(crate::fingerprint::TechAnalyzer),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyzer_names_round_trip() {
        for kind in AnalyzerKind::all() {
            let parsed: AnalyzerKind = kind.to_string().parse().expect("known name");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn default_set_covers_every_kind() {
        let analyzers = default_analyzers();
        for kind in AnalyzerKind::all() {
            assert!(
                analyzers.iter().any(|a| a.kind() == kind),
                "no analyzer for {kind}"
            );
        }
    }

    #[test]
    fn parse_list_rejects_unknown_names() {
        let kinds = parse_analyzer_list("colors, buttons,colors").expect("valid list");
        assert_eq!(kinds, vec![AnalyzerKind::Colors, AnalyzerKind::Buttons]);
        let err = parse_analyzer_list("colours").unwrap_err();
        assert!(err.to_string().contains("Unknown analyzer"));
        assert!(parse_analyzer_list("").expect("empty").is_empty());
    }
}
