//! Color palette analyzer.
//!
//! Walks every visible element, tallies each distinct color once per element
//! weighted by the element's semantic context, then filters and dedups the
//! tallies into a [`PaletteResult`].

pub mod palette;
pub mod parse;
pub mod variables;

use std::collections::{BTreeMap, HashMap};

use super::{Analyzer, AnalyzerKind, AnalyzerOutput, ExtractionContext};
use crate::types::{ElementSnapshot, GradientEntry, PaletteResult};
use crate::Result;

pub use self::palette::{inclusion_threshold, is_structural, ColorAccumulator};
pub use parse::{color_tokens, normalize, parse_color, parse_embedded, Rgba};

/// Keyword → context weight, matched against class/id/tag/data attributes.
const KEYWORD_WEIGHTS: &[(&str, f32)] = &[
    ("logo", 5.0),
    ("brand", 5.0),
    ("primary", 4.0),
    ("cta", 4.0),
    ("hero", 3.0),
    ("button", 3.0),
    ("link", 2.0),
    ("header", 2.0),
    ("nav", 1.0),
];

/// Flat score for action elements with a real brand-looking background.
const ACTION_SCORE: f32 = 25.0;

const MAX_GRADIENTS: usize = 10;

pub struct ColorAnalyzer;

impl Analyzer for ColorAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Colors
    }

    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Colors(analyze_palette(ctx)))
    }
}

pub fn analyze_palette(ctx: &ExtractionContext) -> PaletteResult {
    let thresholds = &ctx.settings.colors;
    let mut acc = ColorAccumulator::new();
    let mut gradients: HashMap<String, usize> = HashMap::new();
    let mut total = 0usize;

    for el in ctx.visible_elements() {
        total += 1;
        let (score, keyword) = element_score(el);
        let mut seen: Vec<String> = Vec::new();
        for (property, text, rgba) in element_colors(el) {
            let hex = rgba.to_hex();
            if seen.contains(&hex) {
                continue;
            }
            seen.push(hex);
            acc.record(&text, rgba, score, Some(keyword.unwrap_or(property)));
        }
        if let Some(image) = el.style.get("background-image") {
            if image.contains("gradient(") {
                *gradients.entry(image.to_string()).or_insert(0) += 1;
            }
        }
    }

    let palette = acc.finalize(total, thresholds);

    let declared = variables::collect_variables(&ctx.page);
    let domain = ctx.domain();
    let color_vars = variables::color_variables(&declared, domain.as_deref());
    let css_variables =
        variables::unrepresented_variables(&color_vars, &palette, thresholds.dedup_distance);

    let mut semantic_colors = variables::semantic_roles(&color_vars);
    semantic_colors.extend(page_roles(ctx));

    let mut gradients: Vec<GradientEntry> = gradients
        .into_iter()
        .map(|(value, count)| GradientEntry { value, count })
        .collect();
    gradients.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    gradients.truncate(MAX_GRADIENTS);

    PaletteResult {
        semantic_colors,
        palette,
        css_variables,
        gradients,
    }
}

/// Base score 1, raised to the strongest keyword match; action elements with a
/// colored background score [`ACTION_SCORE`].
pub fn element_score(el: &ElementSnapshot) -> (f32, Option<&'static str>) {
    if is_action_element(el) && has_brand_background(el) {
        return (ACTION_SCORE, Some("button"));
    }
    let descriptor = el.descriptor();
    KEYWORD_WEIGHTS
        .iter()
        .filter(|(keyword, _)| descriptor.contains(keyword))
        .fold((1.0, None), |(best, tag), (keyword, weight)| {
            if *weight > best {
                (*weight, Some(*keyword))
            } else {
                (best, tag)
            }
        })
}

pub fn is_action_element(el: &ElementSnapshot) -> bool {
    if el.tag == "button" || el.role() == Some("button") {
        return true;
    }
    if el.tag == "input"
        && matches!(
            el.attr("type").map(str::to_ascii_lowercase).as_deref(),
            Some("submit") | Some("button")
        )
    {
        return true;
    }
    let classes = el.class_attr().to_ascii_lowercase();
    classes.contains("btn") || classes.contains("button") || classes.contains("cta")
}

fn has_brand_background(el: &ElementSnapshot) -> bool {
    el.style
        .get("background-color")
        .and_then(parse_color)
        .map(|c| !c.is_transparent() && !c.is_white() && !c.is_black())
        .unwrap_or(false)
}

/// Every color literal an element paints with, tagged by source property.
pub fn element_colors(el: &ElementSnapshot) -> Vec<(&'static str, String, Rgba)> {
    let style = &el.style;
    let mut out = Vec::new();
    let mut push = |property: &'static str, value: &str| {
        for token in color_tokens(value) {
            if let Some(rgba) = parse_color(token) {
                if !rgba.is_transparent() {
                    out.push((property, token.to_string(), rgba));
                }
            }
        }
    };

    if let Some(bg) = style.get("background-color") {
        push("background", bg);
    }
    if let Some(color) = style.get("color") {
        push("text", color);
    }
    for token in border_color_tokens(el) {
        push("border", token.as_str());
    }
    if style.get("outline-style").map_or(false, |s| s != "none")
        && style.px("outline-width").map_or(false, |w| w > 0.0)
    {
        if let Some(outline) = style.get("outline-color") {
            push("outline", outline);
        }
    }
    if matches!(el.tag.as_str(), "input" | "textarea") {
        if let Some(caret) = style.get("caret-color") {
            push("caret", caret);
        }
    }
    if style
        .get("text-decoration-line")
        .map_or(false, |line| line != "none")
    {
        if let Some(decoration) = style.get("text-decoration-color") {
            push("decoration", decoration);
        }
    }
    if el.is_svg_shape() {
        if let Some(fill) = style.get("fill") {
            push("fill", fill);
        }
        if let Some(stroke) = style.get("stroke") {
            push("stroke", stroke);
        }
    }
    if let Some(image) = style.get("background-image") {
        if image.contains("gradient(") {
            push("gradient", image);
        }
    }
    if let Some(shadow) = style.get("box-shadow") {
        if shadow != "none" {
            push("shadow", shadow);
        }
    }
    out
}

pub fn has_visible_border(el: &ElementSnapshot) -> bool {
    visible_border_sides(el).next().is_some()
}

fn visible_border_sides(el: &ElementSnapshot) -> impl Iterator<Item = &'static str> + '_ {
    ["top", "right", "bottom", "left"].into_iter().filter(move |side| {
        let width = el
            .style
            .px(&format!("border-{side}-width"))
            .unwrap_or(0.0);
        let style = el
            .style
            .get(&format!("border-{side}-style"))
            .unwrap_or("none");
        width > 0.0 && style != "none" && style != "hidden"
    })
}

/// Distinct color literals across the visible border sides.
fn border_color_tokens(el: &ElementSnapshot) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    for side in visible_border_sides(el) {
        let Some(value) = el.style.get(&format!("border-{side}-color")) else {
            continue;
        };
        for token in color_tokens(value) {
            let Some(rgba) = parse_color(token) else {
                continue;
            };
            let hex = rgba.to_hex();
            if !seen.contains(&hex) {
                seen.push(hex);
                tokens.push(token.to_string());
            }
        }
    }
    tokens
}

/// `text` and `background` from the body, falling back to the root element.
fn page_roles(ctx: &ExtractionContext) -> BTreeMap<String, String> {
    let mut roles = BTreeMap::new();
    let elements = ctx.elements();
    let body = elements
        .iter()
        .find(|el| el.tag == "body")
        .or_else(|| elements.first());
    let root = elements.iter().find(|el| el.tag == "html");

    if let Some(text) = body
        .and_then(|b| b.style.get("color"))
        .and_then(parse_color)
    {
        roles.insert("text".to_string(), text.to_hex());
    }
    let background = [body, root]
        .into_iter()
        .flatten()
        .filter_map(|el| el.style.get("background-color").and_then(parse_color))
        .find(|c| !c.is_transparent());
    if let Some(bg) = background {
        roles.insert("background".to_string(), bg.to_hex());
    }
    roles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{PageBuilder, BODY};
    use crate::types::Confidence;

    #[test]
    fn keyword_weights_pick_strongest_match() {
        let mut b = PageBuilder::new();
        let logo = b.element(BODY, "div").class("site-logo nav-item").done();
        let plain = b.element(BODY, "div").done();
        let page = b.build();
        assert_eq!(element_score(&page.elements[logo]), (5.0, Some("logo")));
        assert_eq!(element_score(&page.elements[plain]), (1.0, None));
    }

    #[test]
    fn cta_button_surfaces_as_high_confidence() {
        let mut b = PageBuilder::new();
        for _ in 0..40 {
            b.element(BODY, "p").style("color", "rgb(0, 0, 0)").text("Body copy").done();
        }
        b.element(BODY, "button")
            .class("btn btn-primary")
            .style("background-color", "rgb(99, 102, 241)")
            .style("color", "rgb(255, 255, 255)")
            .text("Get Started")
            .size(140.0, 44.0)
            .done();
        let result = analyze_palette(&b.context());
        let brand = result.find("#6366f1").expect("brand color in palette");
        assert_eq!(brand.confidence, Confidence::High);
        assert!(brand.context_tags.contains(&"button".to_string()));
        // black text covers nearly every element without a boost
        assert!(result.find("#000000").is_none());
    }

    #[test]
    fn border_colors_come_from_visible_sides() {
        let mut b = PageBuilder::new();
        b.element(BODY, "div")
            .styles(&[
                ("border-top-width", "1px"),
                ("border-top-style", "solid"),
                ("border-top-color", "rgb(255, 0, 0)"),
                ("border-right-width", "1px"),
                ("border-right-style", "solid"),
                ("border-right-color", "rgb(255, 0, 0)"),
                ("border-bottom-width", "2px"),
                ("border-bottom-style", "solid"),
                ("border-bottom-color", "rgb(0, 128, 0)"),
                ("border-left-width", "0px"),
                ("border-left-style", "none"),
                ("border-left-color", "rgb(0, 0, 255)"),
            ])
            .done();
        let ctx = b.context();
        let el = &ctx.page.elements[2];
        let borders: Vec<String> = element_colors(el)
            .into_iter()
            .filter(|(property, _, _)| *property == "border")
            .map(|(_, _, c)| c.to_hex())
            .collect();
        assert_eq!(borders, vec!["#ff0000".to_string(), "#008000".to_string()]);
    }

    #[test]
    fn hidden_borders_contribute_no_color() {
        let mut b = PageBuilder::new();
        b.element(BODY, "div")
            .styles(&[
                ("border-top-width", "0px"),
                ("border-top-style", "none"),
                ("border-top-color", "rgb(255, 0, 0)"),
            ])
            .done();
        let ctx = b.context();
        let el = &ctx.page.elements[2];
        assert!(element_colors(el).iter().all(|(property, _, _)| *property != "border"));
    }

    #[test]
    fn hidden_elements_are_ignored_and_gradients_capped() {
        let mut b = PageBuilder::new();
        for i in 0..12 {
            let gradient = format!("linear-gradient(90deg, rgb({i}, 0, 0), rgb(0, 0, 255))");
            b.element(BODY, "section").style("background-image", &gradient).done();
        }
        for _ in 0..5 {
            b.element(BODY, "div")
                .style("display", "none")
                .style("background-color", "rgb(0, 200, 0)")
                .done();
        }
        let result = analyze_palette(&b.context());
        assert_eq!(result.gradients.len(), 10);
        assert!(result.find("#00c800").is_none());
    }

    #[test]
    fn semantic_roles_from_variables_and_body() {
        let mut b = PageBuilder::new();
        b.page_mut()
            .css_variables
            .insert("--color-primary".into(), "#0ea5e9".into());
        let result = analyze_palette(&b.context());
        assert_eq!(result.semantic_colors.get("primary").map(String::as_str), Some("#0ea5e9"));
        assert_eq!(result.semantic_colors.get("text").map(String::as_str), Some("#000000"));
        assert_eq!(
            result.semantic_colors.get("background").map(String::as_str),
            Some("#ffffff")
        );
        assert!(result.css_variables.contains_key("--color-primary"));
    }
}
