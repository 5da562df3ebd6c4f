//! Live hover/focus measurements folded back into the palette and components.
//!
//! The browser helper records computed style before and after each
//! interaction; this module diffs those snapshots. Measured states take
//! precedence over stylesheet-derived ones.

use std::collections::BTreeMap;

use super::color::palette::representative_index;
use super::color::{parse_color, Rgba};
use crate::types::{
    ColorEntry, ComponentStates, Components, ComputedStyle, Confidence, PaletteResult,
    ProbeSample, StyleRecord,
};

/// Properties read before and after every interaction.
pub const PROBE_PROPERTIES: &[&str] = &[
    "color",
    "background-color",
    "border-color",
    "outline-color",
    "outline-style",
    "outline-width",
    "box-shadow",
];
const HOVER_PROPERTIES: &[&str] = &["color", "background-color", "border-color"];
const FOCUS_PROPERTIES: &[&str] = &["outline-color", "border-color"];

/// Diffed states for one probed element.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredStates {
    pub element: usize,
    pub hover: Option<StyleRecord>,
    pub focus: Option<StyleRecord>,
}

pub fn measure(samples: &[ProbeSample]) -> Vec<MeasuredStates> {
    samples
        .iter()
        .filter_map(|sample| {
            let hover = sample
                .hover
                .as_ref()
                .map(|after| diff(&sample.before, after, HOVER_PROPERTIES, None))
                .filter(|record| !record.is_empty());
            let focus = if sample.kind.is_focusable_control() {
                sample
                    .focus
                    .as_ref()
                    .map(|after| diff(&sample.before, after, FOCUS_PROPERTIES, hover.as_ref()))
                    .filter(|record| !record.is_empty())
            } else {
                None
            };
            (hover.is_some() || focus.is_some()).then_some(MeasuredStates {
                element: sample.element,
                hover,
                focus,
            })
        })
        .collect()
}

/// Color properties that changed to a visible, different value.
fn diff(
    before: &ComputedStyle,
    after: &ComputedStyle,
    properties: &[&str],
    exclude: Option<&StyleRecord>,
) -> StyleRecord {
    let mut record = StyleRecord::new();
    for property in properties {
        if exclude.map_or(false, |e| e.contains_key(*property)) {
            continue;
        }
        let Some(new) = after.get(property) else {
            continue;
        };
        let Some(new_color) = parse_color(new).filter(|c| !c.is_transparent()) else {
            continue;
        };
        let unchanged = before
            .get(property)
            .and_then(parse_color)
            .map_or(false, |old| old.to_hex() == new_color.to_hex());
        if !unchanged {
            record.insert(property.to_string(), new.to_string());
        }
    }
    record
}

/// Adds measured colors to the palette, tagged `hover` or `focus`.
///
/// Colors already represented only gain the tag; new ones enter with low
/// confidence, medium when seen on two or more elements.
pub fn merge_into_palette(palette: &mut PaletteResult, measured: &[MeasuredStates], distance: f32) {
    for tag in ["hover", "focus"] {
        // hex -> (first original text, color, elements)
        let mut found: BTreeMap<String, (String, Rgba, Vec<usize>)> = BTreeMap::new();
        for m in measured {
            let record = if tag == "hover" { &m.hover } else { &m.focus };
            let Some(record) = record else {
                continue;
            };
            for value in record.values() {
                let Some(color) = parse_color(value) else {
                    continue;
                };
                let entry = found
                    .entry(color.to_hex())
                    .or_insert_with(|| (value.clone(), color, Vec::new()));
                if !entry.2.contains(&m.element) {
                    entry.2.push(m.element);
                }
            }
        }
        for (hex, (original, color, elements)) in found {
            match representative_index(&palette.palette, &color, distance) {
                Some(pos) => {
                    let tags = &mut palette.palette[pos].context_tags;
                    if !tags.iter().any(|t| t == tag) {
                        tags.push(tag.to_string());
                    }
                }
                None => palette.palette.push(ColorEntry {
                    original_text: original,
                    normalized_hex: hex,
                    occurrence_count: elements.len(),
                    semantic_score: elements.len() as f32,
                    confidence: if elements.len() >= 2 {
                        Confidence::Medium
                    } else {
                        Confidence::Low
                    },
                    context_tags: vec![tag.to_string()],
                }),
            }
        }
    }
}

/// Overwrites stylesheet-derived hover/focus records with measured ones.
pub fn merge_into_components(components: &mut Components, measured: &[MeasuredStates]) {
    for m in measured {
        for button in components
            .buttons
            .iter_mut()
            .filter(|b| b.elements.contains(&m.element))
        {
            apply(&mut button.states, &mut button.measured_states, m);
        }
        for link in components
            .links
            .iter_mut()
            .filter(|l| l.elements.contains(&m.element))
        {
            apply(&mut link.states, &mut link.measured_states, m);
        }
        for input in components
            .inputs
            .iter_mut()
            .filter(|i| i.elements.contains(&m.element))
        {
            apply(&mut input.states, &mut input.measured_states, m);
        }
    }
}

fn apply(states: &mut ComponentStates, measured_states: &mut Vec<String>, m: &MeasuredStates) {
    if let Some(hover) = &m.hover {
        overlay(&mut states.hover, hover);
        mark(measured_states, "hover");
    }
    if let Some(focus) = &m.focus {
        overlay(&mut states.focus, focus);
        mark(measured_states, "focus");
    }
}

fn overlay(target: &mut Option<StyleRecord>, measured: &StyleRecord) {
    let record = target.get_or_insert_with(StyleRecord::new);
    for (property, value) in measured {
        record.insert(property.clone(), value.clone());
    }
}

fn mark(measured_states: &mut Vec<String>, state: &str) {
    if !measured_states.iter().any(|s| s == state) {
        measured_states.push(state.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ButtonStyle, ProbeKind};

    fn style(pairs: &[(&str, &str)]) -> ComputedStyle {
        pairs.iter().copied().collect()
    }

    fn sample(element: usize, kind: ProbeKind, hover: &[(&str, &str)], focus: &[(&str, &str)]) -> ProbeSample {
        ProbeSample {
            element,
            kind,
            before: style(&[
                ("color", "rgb(255, 255, 255)"),
                ("background-color", "rgb(99, 102, 241)"),
                ("border-color", "rgb(99, 102, 241)"),
                ("outline-color", "rgb(255, 255, 255)"),
            ]),
            hover: Some(style(hover)),
            focus: Some(style(focus)),
            hover_error: None,
            focus_error: None,
        }
    }

    #[test]
    fn diff_skips_noop_and_transparent_changes() {
        let samples = vec![sample(
            3,
            ProbeKind::Button,
            &[
                ("color", "rgb(255, 255, 255)"),
                ("background-color", "rgb(79, 70, 229)"),
                ("border-color", "rgba(0, 0, 0, 0)"),
            ],
            &[("outline-color", "rgb(165, 180, 252)"), ("border-color", "rgb(99, 102, 241)")],
        )];
        let measured = measure(&samples);
        assert_eq!(measured.len(), 1);
        let hover = measured[0].hover.as_ref().expect("hover diff");
        assert_eq!(hover.len(), 1);
        assert_eq!(hover.get("background-color").map(String::as_str), Some("rgb(79, 70, 229)"));
        let focus = measured[0].focus.as_ref().expect("focus diff");
        assert_eq!(focus.len(), 1);
        assert!(focus.contains_key("outline-color"));
    }

    #[test]
    fn links_are_not_focus_probed() {
        let samples = vec![sample(
            4,
            ProbeKind::Link,
            &[],
            &[("outline-color", "rgb(165, 180, 252)")],
        )];
        assert!(measure(&samples).is_empty());
    }

    #[test]
    fn palette_merge_tags_existing_and_adds_new() {
        let mut palette = PaletteResult {
            palette: vec![ColorEntry {
                original_text: "rgb(99, 102, 241)".into(),
                normalized_hex: "#6366f1".into(),
                occurrence_count: 12,
                semantic_score: 300.0,
                confidence: Confidence::High,
                context_tags: vec!["button".into()],
            }],
            ..Default::default()
        };
        let hover = |element: usize, bg: &str| MeasuredStates {
            element,
            hover: Some([("background-color".to_string(), bg.to_string())].into_iter().collect()),
            focus: None,
        };
        let measured = vec![
            hover(1, "rgb(79, 70, 229)"),
            hover(2, "rgb(79, 70, 229)"),
            hover(3, "rgb(100, 103, 240)"),
        ];
        merge_into_palette(&mut palette, &measured, 15.0);
        assert_eq!(palette.palette.len(), 2);
        assert!(palette.palette[0].context_tags.contains(&"hover".to_string()));
        let added = &palette.palette[1];
        assert_eq!(added.normalized_hex, "#4f46e5");
        assert_eq!(added.confidence, Confidence::Medium);
        assert_eq!(added.context_tags, vec!["hover"]);
    }

    #[test]
    fn measured_states_override_stylesheet_states() {
        let mut components = Components::default();
        components.buttons.push(ButtonStyle {
            tag: "button".into(),
            text: "Buy".into(),
            classes: None,
            states: ComponentStates {
                hover: Some(
                    [
                        ("background-color".to_string(), "#000000".to_string()),
                        ("transform".to_string(), "scale(1.02)".to_string()),
                    ]
                    .into_iter()
                    .collect(),
                ),
                ..Default::default()
            },
            confidence: Confidence::High,
            measured_states: Vec::new(),
            mode: None,
            elements: vec![7, 9],
        });
        let measured = vec![MeasuredStates {
            element: 9,
            hover: Some(
                [("background-color".to_string(), "rgb(79, 70, 229)".to_string())]
                    .into_iter()
                    .collect(),
            ),
            focus: None,
        }];
        merge_into_components(&mut components, &measured);
        let button = &components.buttons[0];
        let hover = button.states.hover.as_ref().expect("hover");
        assert_eq!(hover.get("background-color").map(String::as_str), Some("rgb(79, 70, 229)"));
        assert_eq!(hover.get("transform").map(String::as_str), Some("scale(1.02)"));
        assert_eq!(button.measured_states, vec!["hover"]);
    }
}
