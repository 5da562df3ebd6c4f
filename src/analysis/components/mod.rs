//! Component style extractors.
//!
//! Buttons, inputs and links share one recipe: select candidates with
//! structural heuristics, record the default computed style for a fixed
//! property list, recover partial pseudo-states from stylesheet rules, then
//! dedup by a style signature. Badges and forms are structural descriptions.

pub mod badges;
pub mod buttons;
pub mod forms;
pub mod inputs;
pub mod links;

use super::color::parse_color;
use super::stylesheet::{state_declarations, PseudoState};
use crate::types::{ComponentStates, ElementSnapshot, StyleRecord, StyleRule};

/// Default-state record of `properties` (missing values are skipped).
pub fn style_record(el: &ElementSnapshot, properties: &[&str]) -> StyleRecord {
    properties
        .iter()
        .filter_map(|property| {
            el.style
                .get(property)
                .map(|value| (property.to_string(), value.to_string()))
        })
        .collect()
}

/// Default style plus whichever of `states` the stylesheet rules declare.
pub fn component_states(
    rules: &[StyleRule],
    el: &ElementSnapshot,
    properties: &[&str],
    states: &[PseudoState],
) -> ComponentStates {
    let mut out = ComponentStates {
        default: style_record(el, properties),
        ..Default::default()
    };
    for state in states {
        let record = state_declarations(rules, el, *state);
        match state {
            PseudoState::Hover => out.hover = record,
            PseudoState::Active => out.active = record,
            PseudoState::Focus => out.focus = record,
            PseudoState::Visited => out.visited = record,
        }
    }
    out
}

/// Normalized hex of a color property, `"transparent"` when unset or clear.
pub fn color_key(el: &ElementSnapshot, property: &str) -> String {
    el.style
        .get(property)
        .and_then(parse_color)
        .filter(|c| !c.is_transparent())
        .map(|c| c.to_hex())
        .unwrap_or_else(|| "transparent".to_string())
}

pub fn has_background(el: &ElementSnapshot) -> bool {
    color_key(el, "background-color") != "transparent"
        || el
            .style
            .get("background-image")
            .map_or(false, |image| image != "none")
}

/// Shorthand `width style color` from the top border, `none` when absent.
pub fn border_shorthand(el: &ElementSnapshot) -> String {
    let width = el.style.get_or("border-top-width", "0px");
    let style = el.style.get_or("border-top-style", "none");
    if style == "none" || el.style.px("border-top-width").map_or(true, |w| w <= 0.0) {
        return "none".to_string();
    }
    format!("{} {} {}", width, style, color_key(el, "border-top-color"))
}

/// First `max` characters of the element's collapsed text.
pub fn text_excerpt(el: &ElementSnapshot, max: usize) -> String {
    el.trimmed_text()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(max)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{PageBuilder, BODY};

    #[test]
    fn border_shorthand_requires_width_and_style() {
        let mut b = PageBuilder::new();
        let bordered = b
            .element(BODY, "div")
            .styles(&[
                ("border-top-width", "1px"),
                ("border-top-style", "solid"),
                ("border-top-color", "rgb(229, 231, 235)"),
            ])
            .done();
        let dashed_zero = b
            .element(BODY, "div")
            .styles(&[("border-top-width", "0px"), ("border-top-style", "dashed")])
            .done();
        let page = b.build();
        assert_eq!(border_shorthand(&page.elements[bordered]), "1px solid #e5e7eb");
        assert_eq!(border_shorthand(&page.elements[dashed_zero]), "none");
    }

    #[test]
    fn excerpt_collapses_whitespace() {
        let mut b = PageBuilder::new();
        let el = b.element(BODY, "a").text("  Read\n   the   docs  ").done();
        let page = b.build();
        assert_eq!(text_excerpt(&page.elements[el], 8), "Read the");
    }
}
