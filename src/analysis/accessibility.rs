//! WCAG-oriented accessibility audit.
//!
//! Contrast uses the WCAG 2.x relative luminance formula. Structural checks
//! (alt text, labels, heading order, focus indicators) and ARIA usage counts
//! are read from the captured DOM. The score starts at 100 and loses 15 points
//! per error issue and 5 per warning issue.

use std::collections::HashSet;

use super::color::{parse_color, Rgba};
use super::components::forms::has_label;
use super::components::text_excerpt;
use super::stylesheet::{state_declarations, PseudoState};
use super::typography::parse_weight;
use super::{Analyzer, AnalyzerKind, AnalyzerOutput, ExtractionContext};
use crate::types::{
    ancestors, AccessibilityAudit, AccessibilityIssue, AriaCounts, AuditSummary, ComputedStyle,
    ContrastSample, ElementSnapshot, HeadingEntry, IssueSeverity,
};
use crate::Result;

const MAX_CONTRAST_SAMPLES: usize = 40;
const MAX_FOCUS_SAMPLES: usize = 10;
const HEADING_TEXT_LEN: usize = 60;
const EXAMPLE_LEN: usize = 40;

const AA_NORMAL: f32 = 4.5;
const AA_LARGE: f32 = 3.0;
const AAA_NORMAL: f32 = 7.0;
const AAA_LARGE: f32 = 4.5;

const ERROR_PENALTY: u32 = 15;
const WARNING_PENALTY: u32 = 5;

const LANDMARK_ROLES: &[&str] = &[
    "banner",
    "navigation",
    "main",
    "contentinfo",
    "complementary",
    "search",
    "region",
    "form",
];
const LANDMARK_TAGS: &[&str] = &["header", "nav", "main", "footer", "aside"];
const LIVE_ROLES: &[&str] = &["alert", "status", "log", "marquee", "timer"];

pub struct AccessibilityAnalyzer;

impl Analyzer for AccessibilityAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Accessibility
    }

    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Accessibility(audit(ctx)))
    }
}

pub fn audit(ctx: &ExtractionContext) -> AccessibilityAudit {
    let elements = ctx.elements();
    let color_contrast_samples = contrast_samples(elements);
    let missing_alt_count = elements.iter().filter(|el| is_missing_alt(el)).count();
    let missing_label_count = elements
        .iter()
        .filter(|el| el.is_visible() && is_unlabelled_field(elements, el))
        .count();
    let heading_structure: Vec<HeadingEntry> = elements
        .iter()
        .filter(|el| el.is_visible())
        .filter_map(|el| {
            el.heading_level().map(|level| HeadingEntry {
                level,
                text: text_excerpt(el, HEADING_TEXT_LEN),
            })
        })
        .collect();
    let missing_focus_indicator_count = missing_focus_indicators(ctx);
    let aria_counts = aria_counts(elements);

    let mut issues = Vec::new();
    let failing = color_contrast_samples.iter().filter(|s| !s.passes_aa).count();
    if failing > 0 {
        issues.push(issue(
            IssueSeverity::Error,
            "contrast",
            format!("{failing} text/background color pair(s) fall below WCAG AA contrast"),
            failing,
        ));
    }
    if missing_alt_count > 0 {
        issues.push(issue(
            IssueSeverity::Error,
            "missing-alt",
            format!("{missing_alt_count} image(s) have no alt attribute"),
            missing_alt_count,
        ));
    }
    if missing_label_count > 0 {
        issues.push(issue(
            IssueSeverity::Error,
            "missing-label",
            format!("{missing_label_count} form field(s) have no accessible label"),
            missing_label_count,
        ));
    }
    issues.extend(heading_issues(&heading_structure));
    if missing_focus_indicator_count > 0 {
        issues.push(issue(
            IssueSeverity::Warning,
            "missing-focus-indicator",
            format!(
                "{missing_focus_indicator_count} focusable element(s) show no outline or shadow on focus"
            ),
            missing_focus_indicator_count,
        ));
    }

    let summary = summarize(&issues);
    AccessibilityAudit {
        color_contrast_samples,
        missing_alt_count,
        missing_label_count,
        heading_structure,
        missing_focus_indicator_count,
        aria_counts,
        issues,
        summary,
    }
}

fn issue(severity: IssueSeverity, kind: &str, message: String, count: usize) -> AccessibilityIssue {
    AccessibilityIssue {
        severity,
        kind: kind.to_string(),
        message,
        count,
    }
}

pub fn summarize(issues: &[AccessibilityIssue]) -> AuditSummary {
    let errors = issues
        .iter()
        .filter(|i| i.severity == IssueSeverity::Error)
        .count();
    let warnings = issues.len() - errors;
    let penalty = errors as u32 * ERROR_PENALTY + warnings as u32 * WARNING_PENALTY;
    AuditSummary {
        score: 100u32.saturating_sub(penalty),
        errors,
        warnings,
        passes_minimum_aa: errors == 0,
    }
}

// ============================================================================
// Contrast
// ============================================================================

/// WCAG relative luminance of an opaque color.
pub fn relative_luminance(color: &Rgba) -> f32 {
    let linear = |channel: u8| {
        let c = channel as f32 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(color.r) + 0.7152 * linear(color.g) + 0.0722 * linear(color.b)
}

pub fn contrast_ratio(a: &Rgba, b: &Rgba) -> f32 {
    let (la, lb) = (relative_luminance(a), relative_luminance(b));
    let (lighter, darker) = if la > lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// At least 18px, or 14px and bold.
pub fn is_large_text(size_px: f32, weight: u16) -> bool {
    size_px >= 18.0 || (size_px >= 14.0 && weight >= 700)
}

/// First non-transparent background on the element or its ancestors,
/// composited over white when translucent.
pub fn resolve_background(elements: &[ElementSnapshot], el: &ElementSnapshot) -> Option<Rgba> {
    const WHITE: Rgba = Rgba::opaque(255, 255, 255);
    std::iter::once(el)
        .chain(ancestors(elements, el))
        .filter_map(|node| node.style.get("background-color").and_then(parse_color))
        .find(|c| !c.is_transparent())
        .map(|c| if c.is_opaque() { c } else { c.over(&WHITE) })
}

pub fn contrast_samples(elements: &[ElementSnapshot]) -> Vec<ContrastSample> {
    let mut seen: HashSet<(String, String, bool)> = HashSet::new();
    let mut samples = Vec::new();

    for el in elements {
        if samples.len() >= MAX_CONTRAST_SAMPLES {
            break;
        }
        if !el.is_rendered() || el.own_text.trim().is_empty() {
            continue;
        }
        let Some(background) = resolve_background(elements, el) else {
            continue;
        };
        let Some(foreground) = el.style.get("color").and_then(parse_color) else {
            continue;
        };
        if foreground.is_transparent() {
            continue;
        }
        let foreground = if foreground.is_opaque() {
            foreground
        } else {
            foreground.over(&background)
        };
        let size = el.style.px("font-size").unwrap_or(16.0);
        let weight = parse_weight(el.style.get_or("font-weight", "400"));
        let large_text = is_large_text(size, weight);
        let key = (foreground.to_hex(), background.to_hex(), large_text);
        if !seen.insert(key) {
            continue;
        }

        let ratio = contrast_ratio(&foreground, &background);
        let (aa, aaa) = if large_text {
            (AA_LARGE, AAA_LARGE)
        } else {
            (AA_NORMAL, AAA_NORMAL)
        };
        let example = text_excerpt(el, EXAMPLE_LEN);
        samples.push(ContrastSample {
            foreground: foreground.to_hex(),
            background: background.to_hex(),
            ratio: (ratio * 100.0).round() / 100.0,
            large_text,
            passes_aa: ratio >= aa,
            passes_aaa: ratio >= aaa,
            example: (!example.is_empty()).then_some(example),
        });
    }
    samples
}

// ============================================================================
// Structure
// ============================================================================

fn is_missing_alt(el: &ElementSnapshot) -> bool {
    if el.tag != "img" || !el.is_visible() || el.attr("alt").is_some() {
        return false;
    }
    let presentational = matches!(el.role(), Some("presentation") | Some("none"));
    let hidden = el.attr("aria-hidden") == Some("true");
    !presentational && !hidden
}

fn is_unlabelled_field(elements: &[ElementSnapshot], el: &ElementSnapshot) -> bool {
    let is_field = match el.tag.as_str() {
        "textarea" | "select" => true,
        "input" => !matches!(
            el.attr("type").map(str::to_ascii_lowercase).as_deref(),
            Some("hidden") | Some("submit") | Some("button") | Some("reset") | Some("image")
        ),
        _ => false,
    };
    if !is_field {
        return false;
    }
    let placeholder = el.attr("placeholder").map_or(false, |p| !p.trim().is_empty());
    !placeholder && !has_label(elements, el)
}

pub fn heading_issues(headings: &[HeadingEntry]) -> Vec<AccessibilityIssue> {
    let mut issues = Vec::new();
    if !headings.iter().any(|h| h.level == 1) {
        issues.push(issue(
            IssueSeverity::Warning,
            "missing-h1",
            "The page has no <h1> heading".to_string(),
            1,
        ));
    }
    let skips = headings
        .windows(2)
        .filter(|pair| pair[1].level > pair[0].level + 1)
        .count();
    if skips > 0 {
        issues.push(issue(
            IssueSeverity::Warning,
            "heading-skip",
            format!("{skips} heading level jump(s) skip a level"),
            skips,
        ));
    }
    issues
}

// ============================================================================
// Focus indicators and ARIA
// ============================================================================

fn is_focusable(el: &ElementSnapshot) -> bool {
    match el.tag.as_str() {
        "a" => el.attr("href").is_some(),
        "button" | "select" | "textarea" => true,
        "input" => el.attr("type").map_or(true, |t| !t.eq_ignore_ascii_case("hidden")),
        _ => el
            .attr("tabindex")
            .and_then(|t| t.trim().parse::<i32>().ok())
            .map_or(false, |t| t >= 0),
    }
}

fn shows_indicator(style: &ComputedStyle) -> bool {
    let outline = style.get_or("outline-style", "none") != "none"
        && style.px("outline-width").map_or(false, |w| w > 0.0);
    let shadow = style.get_or("box-shadow", "none") != "none";
    outline || shadow
}

fn declares_indicator(ctx: &ExtractionContext, el: &ElementSnapshot) -> bool {
    state_declarations(ctx.style_rules(), el, PseudoState::Focus).map_or(false, |record| {
        record.iter().any(|(property, value)| {
            let value = value.trim();
            (property.starts_with("outline") || property == "box-shadow" || property.starts_with("border"))
                && value != "none"
                && value != "0"
                && value != "0px"
        })
    })
}

/// Sampled focusable elements with no visible focus treatment, measured when
/// the probe focused them and declared by `:focus` rules otherwise.
pub fn missing_focus_indicators(ctx: &ExtractionContext) -> usize {
    let elements = ctx.elements();
    elements
        .iter()
        .filter(|el| el.is_rendered() && is_focusable(el))
        .take(MAX_FOCUS_SAMPLES)
        .filter(|el| {
            let measured = ctx
                .probe()
                .iter()
                .find(|s| s.element == el.index)
                .and_then(|s| s.focus.as_ref());
            match measured {
                Some(style) => !shows_indicator(style),
                None => !declares_indicator(ctx, el) && !shows_indicator(&el.style),
            }
        })
        .count()
}

pub fn aria_counts(elements: &[ElementSnapshot]) -> AriaCounts {
    let mut counts = AriaCounts::default();
    for el in elements {
        let role = el.role().map(str::to_ascii_lowercase);
        if LANDMARK_TAGS.contains(&el.tag.as_str())
            || role.as_deref().map_or(false, |r| LANDMARK_ROLES.contains(&r))
        {
            counts.landmarks += 1;
        }
        if el.attr("aria-label").is_some() || el.attr("aria-labelledby").is_some() {
            counts.labels += 1;
        }
        if el.attr("aria-describedby").is_some() {
            counts.described_by += 1;
        }
        if el.attr("aria-live").is_some() || role.as_deref().map_or(false, |r| LIVE_ROLES.contains(&r)) {
            counts.live_regions += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{PageBuilder, BODY};

    #[test]
    fn black_on_white_is_21_to_1() {
        let black = Rgba::opaque(0, 0, 0);
        let white = Rgba::opaque(255, 255, 255);
        let ratio = contrast_ratio(&black, &white);
        assert!((ratio - 21.0).abs() < 0.01);
        assert!((contrast_ratio(&white, &black) - ratio).abs() < f32::EPSILON);
    }

    #[test]
    fn gray_body_text_fails_aa() {
        let mut b = PageBuilder::new();
        b.element(BODY, "p")
            .styles(&[("color", "rgb(150, 150, 150)"), ("font-size", "14px"), ("font-weight", "400")])
            .text("Muted copy")
            .done();
        b.element(BODY, "h1")
            .styles(&[("color", "rgb(0, 0, 0)"), ("font-size", "32px"), ("font-weight", "700")])
            .text("Title")
            .done();
        let samples = contrast_samples(&b.build().elements);
        let gray = samples.iter().find(|s| s.foreground == "#969696").expect("gray sample");
        assert!(gray.ratio < 4.5);
        assert!(!gray.passes_aa);
        assert!(!gray.large_text);
        let black = samples.iter().find(|s| s.foreground == "#000000").expect("black sample");
        assert!(black.passes_aa && black.passes_aaa);
        assert!(black.large_text);
    }

    #[test]
    fn background_comes_from_ancestors_and_pairs_dedup() {
        let mut b = PageBuilder::new();
        let dark = b
            .element(BODY, "section")
            .style("background-color", "rgb(17, 24, 39)")
            .done();
        for text in ["One", "Two"] {
            b.element(dark, "p")
                .style("color", "rgb(255, 255, 255)")
                .text(text)
                .done();
        }
        let samples = contrast_samples(&b.build().elements);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].background, "#111827");
    }

    #[test]
    fn structural_checks_and_score() {
        let mut b = PageBuilder::new();
        b.element(BODY, "h2").text("Intro").done();
        b.element(BODY, "h4").text("Detail").done();
        b.element(BODY, "img").attr("src", "/hero.png").done();
        b.element(BODY, "img").attr("src", "/spacer.gif").attr("role", "presentation").done();
        b.element(BODY, "img").attr("src", "/logo.png").attr("alt", "").done();
        b.element(BODY, "input").attr("type", "text").done();
        b.element(BODY, "input").attr("type", "email").attr("placeholder", "Email").done();
        b.element(BODY, "nav").attr("aria-label", "Main").done();
        b.element(BODY, "div").attr("aria-live", "polite").done();

        let report = audit(&b.context());
        assert_eq!(report.missing_alt_count, 1);
        assert_eq!(report.missing_label_count, 1);
        assert_eq!(report.aria_counts.landmarks, 1);
        assert_eq!(report.aria_counts.labels, 1);
        assert_eq!(report.aria_counts.live_regions, 1);
        let kinds: Vec<&str> = report.issues.iter().map(|i| i.kind.as_str()).collect();
        assert!(kinds.contains(&"missing-h1"));
        assert!(kinds.contains(&"heading-skip"));
        assert!(!report.summary.passes_minimum_aa);
        let expected = 100u32.saturating_sub(
            report.summary.errors as u32 * 15 + report.summary.warnings as u32 * 5,
        );
        assert_eq!(report.summary.score, expected);
    }

    #[test]
    fn focus_indicator_from_probe_or_stylesheet() {
        let mut b = PageBuilder::new();
        b.element(BODY, "a").class("nav-link").attr("href", "/").text("Home").done();
        b.element(BODY, "button").text("Go").done();
        b.rule(".nav-link:focus-visible", &[("outline", "2px solid #2563eb")]);
        let report = audit(&b.context());
        assert_eq!(report.missing_focus_indicator_count, 1);
    }

    #[test]
    fn clean_page_passes() {
        let mut b = PageBuilder::new();
        b.element(BODY, "h1").text("Welcome").done();
        let report = audit(&b.context());
        assert!(report.issues.is_empty());
        assert_eq!(report.summary.score, 100);
        assert!(report.summary.passes_minimum_aa);
    }
}
