use std::collections::HashMap;

use super::{color_key, component_states, has_background, text_excerpt};
use crate::analysis::icons::is_icon_glyph;
use crate::analysis::stylesheet::PseudoState;
use crate::analysis::{Analyzer, AnalyzerKind, AnalyzerOutput, ExtractionContext};
use crate::types::{children, ButtonStyle, Confidence, ElementSnapshot};
use crate::Result;

pub(crate) const PROPERTIES: &[&str] = &[
    "background-color",
    "color",
    "border-top-width",
    "border-top-style",
    "border-top-color",
    "border-radius",
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
    "font-family",
    "font-size",
    "font-weight",
    "text-transform",
    "box-shadow",
];
const STATES: &[PseudoState] = &[PseudoState::Hover, PseudoState::Active, PseudoState::Focus];

const MAX_BUTTONS: usize = 15;
const MIN_WIDTH: f32 = 10.0;
const MAX_WIDTH: f32 = 600.0;
const MIN_HEIGHT: f32 = 25.0;
const MAX_HEIGHT: f32 = 200.0;
/// Height:width bounds.
const MIN_ASPECT: f32 = 1.0 / 8.0;
const MAX_ASPECT: f32 = 1.2;
const MAX_TEXT: usize = 32;

const INTERACTIVE_ROLES: &[&str] = &["button", "menuitem", "tab", "switch", "option"];

pub struct ButtonAnalyzer;

impl Analyzer for ButtonAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Buttons
    }

    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Buttons(extract_buttons(ctx)))
    }
}

pub fn extract_buttons(ctx: &ExtractionContext) -> Vec<ButtonStyle> {
    let elements = ctx.elements();
    let mut buttons: Vec<ButtonStyle> = Vec::new();
    let mut by_background: HashMap<String, usize> = HashMap::new();

    for el in elements.iter().filter(|el| is_candidate(el)) {
        if !passes_filters(el) || !has_visual_affordance(elements, el) {
            continue;
        }
        let key = color_key(el, "background-color");
        let confidence = confidence(el);
        if let Some(&pos) = by_background.get(&key) {
            let existing = &mut buttons[pos];
            existing.elements.push(el.index);
            existing.confidence = existing.confidence.max(confidence);
            continue;
        }
        if buttons.len() >= MAX_BUTTONS {
            continue;
        }
        by_background.insert(key, buttons.len());
        let classes = el.class_attr().trim();
        buttons.push(ButtonStyle {
            tag: el.tag.clone(),
            text: text_excerpt(el, MAX_TEXT),
            classes: (!classes.is_empty()).then(|| classes.to_string()),
            states: component_states(ctx.style_rules(), el, PROPERTIES, STATES),
            confidence,
            measured_states: Vec::new(),
            mode: None,
            elements: vec![el.index],
        });
    }
    buttons
}

/// Wide net: native buttons, button-like roles, class names and data attributes.
pub fn is_candidate(el: &ElementSnapshot) -> bool {
    if el.tag == "button" || is_native_input_button(el) {
        return true;
    }
    if el.role().map_or(false, |r| r.eq_ignore_ascii_case("button")) {
        return true;
    }
    let classes = el.class_attr().to_ascii_lowercase();
    if classes.contains("btn") || classes.contains("button") || classes.contains("cta") {
        return true;
    }
    el.attributes.iter().any(|(name, value)| {
        name.starts_with("data-") && {
            let haystack = format!("{} {}", name, value).to_ascii_lowercase();
            haystack.contains("button") || haystack.contains("btn")
        }
    })
}

fn is_native_input_button(el: &ElementSnapshot) -> bool {
    el.tag == "input"
        && matches!(
            el.attr("type").map(str::to_ascii_lowercase).as_deref(),
            Some("submit") | Some("button") | Some("reset")
        )
}

/// Size, shape and text exclusions that reject false positives.
pub fn passes_filters(el: &ElementSnapshot) -> bool {
    if !el.is_rendered() {
        return false;
    }
    let (width, height) = (el.bounds.width, el.bounds.height);
    if !(MIN_WIDTH..=MAX_WIDTH).contains(&width) || !(MIN_HEIGHT..=MAX_HEIGHT).contains(&height) {
        return false;
    }
    let aspect = height / width;
    if !(MIN_ASPECT..=MAX_ASPECT).contains(&aspect) {
        return false;
    }

    let text = if is_native_input_button(el) {
        el.attr("value").unwrap_or("").trim()
    } else {
        el.trimmed_text()
    };
    if text.chars().count() > MAX_TEXT || text.contains('\n') {
        return false;
    }
    let lower = text.to_ascii_lowercase();
    if lower == "ad" {
        return false;
    }
    if lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| word == "skip" || word == "jump")
    {
        return false;
    }
    !is_icon_glyph(el)
}

/// Non-transparent background, a border, or a filled child element.
pub fn has_visual_affordance(elements: &[ElementSnapshot], el: &ElementSnapshot) -> bool {
    has_background(el)
        || crate::analysis::color::has_visible_border(el)
        || children(elements, el).any(|child| color_key(child, "background-color") != "transparent")
}

fn confidence(el: &ElementSnapshot) -> Confidence {
    let explicit_role = el
        .role()
        .map(|r| INTERACTIVE_ROLES.contains(&r.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    let aria_state = el.attr("aria-pressed").is_some() || el.attr("aria-expanded").is_some();
    if el.tag == "button" || is_native_input_button(el) || explicit_role || aria_state {
        Confidence::High
    } else {
        Confidence::Medium
    }
}
