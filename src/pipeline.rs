//! Assembles a [`DesignReport`] from one page capture.
//!
//! Phase order mirrors the capture: passive analyzers first (concurrently),
//! then live probe results, then the dark and mobile variants, each merged
//! additively into the baseline report.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::analysis::color::{parse_color, Rgba};
use crate::analysis::color::palette::is_represented;
use crate::analysis::{
    canvas, default_analyzers, probe, run_passive, Analyzer, AnalyzerKind, AnalyzerOutput,
    CapturePass, ExtractionContext, ExtractionSettings,
};
use crate::fingerprint::RuleLibrary;
use crate::types::{
    ButtonStyle, ColorEntry, Components, DesignReport, ExtractionStats, LinkStyle, PageCapture,
    PaletteResult, ThemeMode,
};

const DARK_KINDS: &[AnalyzerKind] = &[
    AnalyzerKind::Colors,
    AnalyzerKind::Buttons,
    AnalyzerKind::Links,
];
const MOBILE_KINDS: &[AnalyzerKind] = &[AnalyzerKind::Colors];

/// Runs the analyzers in `selected` (all when empty) over `page`.
pub async fn extract_design(
    page: PageCapture,
    settings: ExtractionSettings,
    rules: RuleLibrary,
    selected: &[AnalyzerKind],
) -> DesignReport {
    let analyzers = default_analyzers();
    extract_with(&analyzers, page, settings, rules, selected).await
}

pub async fn extract_with(
    analyzers: &[Arc<dyn Analyzer>],
    page: PageCapture,
    settings: ExtractionSettings,
    rules: RuleLibrary,
    selected: &[AnalyzerKind],
) -> DesignReport {
    let start = Instant::now();
    let ctx = ExtractionContext::new(page, settings, rules);
    let mut report = DesignReport {
        url: ctx.page.url.clone(),
        title: ctx.page.title.clone(),
        stats: stats(&ctx.page),
        ..Default::default()
    };

    if canvas::is_canvas_only(&ctx.page) {
        info!(url = %report.url, "canvas-rendered page; skipping analysis");
        report.is_canvas_only = true;
        report.note = Some(canvas::CANVAS_NOTE.to_string());
        return report;
    }

    let is_selected = |kind: AnalyzerKind| selected.is_empty() || selected.contains(&kind);

    info!(url = %report.url, elements = ctx.elements().len(), "running passive analyzers");
    for output in run_passive(analyzers, selected, &ctx).await {
        apply_output(&mut report, output);
    }
    if is_selected(AnalyzerKind::Colors) {
        fill_semantic_roles(&mut report.colors, &report.components);
    }

    let measured = probe::measure(ctx.probe());
    if !measured.is_empty() {
        debug!(measured = measured.len(), "merging probe results");
        if is_selected(AnalyzerKind::Colors) {
            probe::merge_into_palette(
                &mut report.colors,
                &measured,
                ctx.settings.colors.dedup_distance,
            );
        }
        probe::merge_into_components(&mut report.components, &measured);
    }

    for (pass, kinds) in [
        (CapturePass::Dark, DARK_KINDS),
        (CapturePass::Mobile, MOBILE_KINDS),
    ] {
        if !ctx.has_pass(pass) {
            continue;
        }
        let kinds: Vec<AnalyzerKind> = kinds.iter().copied().filter(|k| is_selected(*k)).collect();
        if kinds.is_empty() {
            continue;
        }
        info!(pass = ?pass, "analyzing variant");
        let variant_ctx = ctx.for_pass(pass);
        let outputs = run_passive(analyzers, &kinds, &variant_ctx).await;
        merge_variant(&mut report, pass, outputs, ctx.settings.colors.dedup_distance);
    }

    debug!(elapsed_ms = start.elapsed().as_millis() as u64, "extraction finished");
    report
}

fn stats(page: &PageCapture) -> ExtractionStats {
    let mut variants = Vec::new();
    if page.variants.dark.is_some() {
        variants.push("dark".to_string());
    }
    if page.variants.mobile.is_some() {
        variants.push("mobile".to_string());
    }
    ExtractionStats {
        elements: page.elements.len(),
        stylesheet_rules: page.stylesheets.rules.len(),
        blocked_stylesheets: page.stylesheets.blocked,
        probed_elements: page.probe.len(),
        variants,
    }
}

fn apply_output(report: &mut DesignReport, output: AnalyzerOutput) {
    match output {
        AnalyzerOutput::Colors(colors) => report.colors = colors,
        AnalyzerOutput::Typography(typography) => report.typography = typography,
        AnalyzerOutput::Spacing(spacing) => report.spacing = spacing,
        AnalyzerOutput::BorderRadius(radius) => report.border_radius = radius,
        AnalyzerOutput::Borders(borders) => report.borders = borders,
        AnalyzerOutput::Shadows(shadows) => report.shadows = shadows,
        AnalyzerOutput::Buttons(buttons) => report.components.buttons = buttons,
        AnalyzerOutput::Inputs(inputs) => report.components.inputs = inputs,
        AnalyzerOutput::Links(links) => report.components.links = links,
        AnalyzerOutput::Badges(badges) => report.components.badges = badges,
        AnalyzerOutput::Forms(forms) => report.components.forms = forms,
        AnalyzerOutput::Breakpoints(breakpoints) => report.breakpoints = breakpoints,
        AnalyzerOutput::Icons(icons) => report.icon_system = icons,
        AnalyzerOutput::Frameworks(frameworks) => report.frameworks = frameworks,
        AnalyzerOutput::Accessibility(audit) => report.accessibility = Some(audit),
        AnalyzerOutput::Tech { matches, detected } => {
            report.tech_stack = matches;
            report.detected_tech = detected;
        }
    }
}

fn button_background(button: &ButtonStyle) -> Option<Rgba> {
    button
        .states
        .default
        .get("background-color")
        .and_then(|v| parse_color(v))
        .filter(|c| !c.is_transparent())
}

fn button_key(button: &ButtonStyle) -> String {
    button_background(button)
        .map(|c| c.to_hex())
        .unwrap_or_else(|| "transparent".to_string())
}

/// Fills roles the CSS variables left open: primary and secondary from the
/// best-scored button backgrounds, link from the first link color.
pub fn fill_semantic_roles(colors: &mut PaletteResult, components: &Components) {
    let mut backgrounds: Vec<(String, f32)> = Vec::new();
    for button in &components.buttons {
        let Some(bg) = button_background(button) else {
            continue;
        };
        let hex = bg.to_hex();
        if backgrounds.iter().any(|(h, _)| *h == hex) {
            continue;
        }
        let score = colors.find(&hex).map_or(0.0, |entry| entry.semantic_score);
        backgrounds.push((hex, score));
    }
    // stable: equal scores keep document order
    backgrounds.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut ranked = backgrounds.into_iter().map(|(hex, _)| hex);
    for role in ["primary", "secondary"] {
        if colors.semantic_colors.contains_key(role) {
            continue;
        }
        let Some(hex) = ranked.next() else {
            break;
        };
        colors.semantic_colors.insert(role.to_string(), hex);
    }

    if !colors.semantic_colors.contains_key("link") {
        if let Some(link) = components.links.first() {
            colors
                .semantic_colors
                .insert("link".to_string(), link.color.clone());
        }
    }
}

fn merge_variant(
    report: &mut DesignReport,
    pass: CapturePass,
    outputs: Vec<AnalyzerOutput>,
    distance: f32,
) {
    let Some(tag) = pass.tag() else {
        return;
    };
    for output in outputs {
        match output {
            AnalyzerOutput::Colors(variant) => {
                merge_palette(&mut report.colors.palette, variant.palette, tag, distance)
            }
            AnalyzerOutput::Buttons(buttons) => {
                merge_buttons(&mut report.components.buttons, buttons)
            }
            AnalyzerOutput::Links(links) => merge_links(&mut report.components.links, links),
            other => debug!(kind = %other.kind(), "ignoring variant output"),
        }
    }
}

/// Appends variant colors not within `distance` of an existing entry.
pub fn merge_palette(palette: &mut Vec<ColorEntry>, variant: Vec<ColorEntry>, tag: &str, distance: f32) {
    let mut added = 0usize;
    for mut entry in variant {
        let Some(color) = parse_color(&entry.normalized_hex) else {
            continue;
        };
        if is_represented(palette, &color, distance) {
            continue;
        }
        entry.context_tags = vec![tag.to_string()];
        palette.push(entry);
        added += 1;
    }
    debug!(tag, added, "merged variant colors");
}

fn merge_buttons(buttons: &mut Vec<ButtonStyle>, variant: Vec<ButtonStyle>) {
    for mut button in variant {
        let key = button_key(&button);
        if buttons.iter().any(|b| button_key(b) == key) {
            continue;
        }
        button.mode = Some(ThemeMode::Dark);
        button.elements.clear();
        buttons.push(button);
    }
}

fn merge_links(links: &mut Vec<LinkStyle>, variant: Vec<LinkStyle>) {
    for mut link in variant {
        if links.iter().any(|l| l.color == link.color) {
            continue;
        }
        link.mode = Some(ThemeMode::Dark);
        link.elements.clear();
        links.push(link);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{PageBuilder, BODY};
    use crate::types::{CanvasInfo, Confidence, ElementSnapshot, ProbeKind, ProbeSample};

    fn landing_page() -> PageBuilder {
        let mut b = PageBuilder::new();
        b.element(BODY, "h1")
            .styles(&[("font-size", "48px"), ("font-weight", "700"), ("color", "rgb(17, 24, 39)")])
            .text("Build faster")
            .size(600.0, 56.0)
            .done();
        for _ in 0..3 {
            b.element(BODY, "button")
                .class("btn btn-primary")
                .styles(&[
                    ("background-color", "rgb(99, 102, 241)"),
                    ("color", "rgb(255, 255, 255)"),
                    ("font-size", "18px"),
                    ("font-weight", "700"),
                ])
                .text("Get Started")
                .size(140.0, 44.0)
                .done();
        }
        b.element(BODY, "a")
            .attr("href", "/docs")
            .style("color", "rgb(37, 99, 235)")
            .text("Read the docs")
            .done();
        b
    }

    #[tokio::test]
    async fn primary_button_drives_palette_and_roles() {
        let page = landing_page().build();
        let report = extract_design(
            page,
            ExtractionSettings::default(),
            RuleLibrary::default(),
            &[],
        )
        .await;
        let entry = report.colors.find("#6366f1").expect("button color in palette");
        assert_eq!(entry.confidence, Confidence::High);
        assert_eq!(
            report.colors.semantic_colors.get("primary").map(String::as_str),
            Some("#6366f1")
        );
        assert_eq!(
            report.colors.semantic_colors.get("link").map(String::as_str),
            Some("#2563eb")
        );
        assert_eq!(report.components.buttons.len(), 1);
        assert_eq!(report.components.buttons[0].elements.len(), 3);
        let audit = report.accessibility.expect("audit");
        assert_eq!(audit.missing_alt_count, 0);
        assert!(!report.is_canvas_only);
    }

    #[tokio::test]
    async fn canvas_pages_skip_analysis() {
        let mut b = landing_page();
        b.page_mut().canvas = CanvasInfo { count: 5, webgl: 1 };
        let mut page = b.build();
        page.text_length = 50;
        let report =
            extract_design(page, ExtractionSettings::default(), RuleLibrary::default(), &[]).await;
        assert!(report.is_canvas_only);
        assert!(report.note.is_some());
        assert!(report.colors.palette.is_empty());
        assert!(report.components.buttons.is_empty());
    }

    #[tokio::test]
    async fn selection_limits_report_fields() {
        let page = landing_page().build();
        let report = extract_design(
            page,
            ExtractionSettings::default(),
            RuleLibrary::default(),
            &[AnalyzerKind::Buttons],
        )
        .await;
        assert_eq!(report.components.buttons.len(), 1);
        assert!(report.colors.palette.is_empty());
        assert!(report.accessibility.is_none());
    }

    #[tokio::test]
    async fn probe_hover_is_merged() {
        let mut b = landing_page();
        let page = b.page_mut();
        let button = page
            .elements
            .iter()
            .find(|el| el.tag == "button")
            .map(|el| el.index)
            .expect("button");
        let before = page.elements[button].style.clone();
        let mut hover = before.clone();
        hover.insert("background-color", "rgb(79, 70, 229)");
        page.probe.push(ProbeSample {
            element: button,
            kind: ProbeKind::Button,
            before,
            hover: Some(hover),
            focus: None,
            hover_error: None,
            focus_error: None,
        });
        let report = extract_design(
            b.build(),
            ExtractionSettings::default(),
            RuleLibrary::default(),
            &[],
        )
        .await;
        let hover_entry = report.colors.find("#4f46e5").expect("hover color");
        assert_eq!(hover_entry.context_tags, vec!["hover"]);
        assert_eq!(report.components.buttons[0].measured_states, vec!["hover"]);
        assert_eq!(report.stats.probed_elements, 1);
    }

    #[tokio::test]
    async fn dark_variant_adds_only_new_colors_and_buttons() {
        let mut b = landing_page();
        let mut dark: Vec<ElementSnapshot> = b.page_mut().elements.clone();
        for el in dark.iter_mut() {
            match el.tag.as_str() {
                "body" => {
                    el.style.insert("background-color", "rgb(17, 24, 39)");
                    el.style.insert("color", "rgb(243, 244, 246)");
                }
                "button" => el.style.insert("background-color", "rgb(129, 140, 248)"),
                _ => {}
            }
        }
        b.page_mut().variants.dark = Some(dark);
        let report = extract_design(
            b.build(),
            ExtractionSettings::default(),
            RuleLibrary::default(),
            &[],
        )
        .await;

        let dark_button = report
            .components
            .buttons
            .iter()
            .find(|btn| btn.mode == Some(ThemeMode::Dark))
            .expect("dark button");
        assert_eq!(
            dark_button.states.default.get("background-color").map(String::as_str),
            Some("rgb(129, 140, 248)")
        );
        let dark_entry = report.colors.find("#818cf8").expect("dark color");
        assert_eq!(dark_entry.context_tags, vec!["dark"]);
        assert!(report
            .colors
            .palette
            .iter()
            .filter(|c| c.normalized_hex == "#6366f1")
            .all(|c| !c.context_tags.contains(&"dark".to_string())));
        assert_eq!(report.stats.variants, vec!["dark"]);
    }

    #[test]
    fn semantic_roles_keep_variable_choices() {
        let mut colors = PaletteResult::default();
        colors
            .semantic_colors
            .insert("primary".to_string(), "#0ea5e9".to_string());
        let mut components = Components::default();
        components.buttons.push(ButtonStyle {
            tag: "button".into(),
            text: "Go".into(),
            classes: None,
            states: crate::types::ComponentStates {
                default: [("background-color".to_string(), "rgb(220, 38, 38)".to_string())]
                    .into_iter()
                    .collect(),
                ..Default::default()
            },
            confidence: Confidence::High,
            measured_states: Vec::new(),
            mode: None,
            elements: vec![2],
        });
        fill_semantic_roles(&mut colors, &components);
        assert_eq!(colors.semantic_colors["primary"], "#0ea5e9");
        assert_eq!(colors.semantic_colors["secondary"], "#dc2626");
        assert!(!colors.semantic_colors.contains_key("link"));
    }
}
