use super::{border_shorthand, color_key, component_states};
use crate::analysis::stylesheet::{placeholder_color, PseudoState};
use crate::analysis::{Analyzer, AnalyzerKind, AnalyzerOutput, ExtractionContext};
use crate::types::{ElementSnapshot, InputGroups, InputKind, InputStyle};
use crate::Result;

pub(crate) const PROPERTIES: &[&str] = &[
    "background-color",
    "color",
    "border-top-width",
    "border-top-style",
    "border-top-color",
    "border-radius",
    "padding-top",
    "padding-left",
    "font-size",
    "height",
    "box-shadow",
    "accent-color",
];

/// Input types that are really buttons or carry no visual field.
const NON_FIELD_TYPES: &[&str] = &["hidden", "submit", "button", "reset", "image"];
const TEXT_ROLES: &[&str] = &["textbox", "searchbox", "spinbutton"];

pub struct InputAnalyzer;

impl Analyzer for InputAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Inputs
    }

    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Inputs(extract_inputs(ctx)))
    }
}

pub fn extract_inputs(ctx: &ExtractionContext) -> InputGroups {
    let mut groups = InputGroups::default();
    let mut signatures: Vec<(InputKind, String)> = Vec::new();

    for el in ctx.visible_elements() {
        let Some(kind) = input_kind(el) else {
            continue;
        };
        let signature = format!(
            "{}|{}|{}",
            border_shorthand(el),
            el.style.get_or("border-radius", "0px"),
            color_key(el, "background-color")
        );
        let group = groups.group_mut(kind);
        if let Some(pos) = signatures
            .iter()
            .filter(|(k, _)| *k == kind)
            .position(|(_, s)| *s == signature)
        {
            if let Some(existing) = group.get_mut(pos) {
                existing.elements.push(el.index);
            }
            continue;
        }
        if group.len() >= kind.cap() {
            continue;
        }
        signatures.push((kind, signature));
        group.push(InputStyle {
            kind,
            tag: el.tag.clone(),
            input_type: el.attr("type").map(str::to_ascii_lowercase),
            states: component_states(ctx.style_rules(), el, PROPERTIES, &[PseudoState::Focus]),
            placeholder_color: placeholder_color(ctx.style_rules(), el),
            measured_states: Vec::new(),
            elements: vec![el.index],
        });
    }
    groups
}

/// Logical group for a form control, `None` for anything else.
pub fn input_kind(el: &ElementSnapshot) -> Option<InputKind> {
    match el.tag.as_str() {
        "textarea" => return Some(InputKind::Text),
        "select" => return Some(InputKind::Select),
        "input" => {}
        _ => {
            let role = el.role()?.to_ascii_lowercase();
            return match role.as_str() {
                "checkbox" | "switch" => Some(InputKind::Checkbox),
                "radio" => Some(InputKind::Radio),
                "listbox" | "combobox" => Some(InputKind::Select),
                "slider" => Some(InputKind::Range),
                r if TEXT_ROLES.contains(&r) => Some(InputKind::Text),
                _ => None,
            };
        }
    }
    let input_type = el
        .attr("type")
        .map(|t| t.trim().to_ascii_lowercase())
        .unwrap_or_else(|| "text".to_string());
    if NON_FIELD_TYPES.contains(&input_type.as_str()) {
        return None;
    }
    Some(match input_type.as_str() {
        "checkbox" => InputKind::Checkbox,
        "radio" => InputKind::Radio,
        "date" | "datetime-local" | "month" | "week" | "time" => InputKind::Date,
        "file" => InputKind::File,
        "range" => InputKind::Range,
        _ => InputKind::Text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{PageBuilder, BODY};

    fn field(b: &mut PageBuilder, tag: &str, input_type: &str) -> usize {
        let mut builder = b.element(BODY, tag).styles(&[
            ("border-top-width", "1px"),
            ("border-top-style", "solid"),
            ("border-top-color", "rgb(209, 213, 219)"),
            ("border-radius", "6px"),
            ("background-color", "rgb(255, 255, 255)"),
        ]);
        if !input_type.is_empty() {
            builder = builder.attr("type", input_type);
        }
        builder.size(240.0, 40.0).done()
    }

    #[test]
    fn groups_by_logical_type() {
        let mut b = PageBuilder::new();
        field(&mut b, "input", "");
        field(&mut b, "input", "email");
        field(&mut b, "textarea", "");
        field(&mut b, "input", "checkbox");
        field(&mut b, "select", "");
        field(&mut b, "input", "datetime-local");
        field(&mut b, "input", "hidden");
        field(&mut b, "input", "submit");
        let groups = extract_inputs(&b.context());
        // text, email and textarea share one signature
        assert_eq!(groups.text.len(), 1);
        assert_eq!(groups.text[0].elements.len(), 3);
        assert_eq!(groups.checkbox.len(), 1);
        assert_eq!(groups.select.len(), 1);
        assert_eq!(groups.date.len(), 1);
        assert_eq!(groups.len(), 4);
    }

    #[test]
    fn text_group_is_capped_at_eight() {
        let mut b = PageBuilder::new();
        for i in 0..12 {
            let radius = format!("{i}px");
            b.element(BODY, "input")
                .attr("type", "text")
                .style("border-radius", &radius)
                .done();
        }
        let groups = extract_inputs(&b.context());
        assert_eq!(groups.text.len(), 8);
    }

    #[test]
    fn focus_and_placeholder_from_stylesheet() {
        let mut b = PageBuilder::new();
        let idx = b
            .element(BODY, "input")
            .class("form-control")
            .attr("type", "search")
            .done();
        b.rule(".form-control:focus", &[("border-color", "#6366f1"), ("outline", "none")]);
        b.rule(".form-control::placeholder", &[("color", "#9ca3af")]);
        let groups = extract_inputs(&b.context());
        let input = &groups.text[0];
        assert_eq!(input.elements, vec![idx]);
        assert_eq!(input.input_type.as_deref(), Some("search"));
        assert_eq!(input.placeholder_color.as_deref(), Some("#9ca3af"));
        let focus = input.states.focus.as_ref().expect("focus state");
        assert_eq!(focus.get("border-color").map(String::as_str), Some("#6366f1"));
    }

    #[test]
    fn aria_roles_map_to_groups() {
        let mut b = PageBuilder::new();
        let search = b.element(BODY, "div").attr("role", "searchbox").done();
        let toggle = b.element(BODY, "div").attr("role", "switch").done();
        let plain = b.element(BODY, "div").done();
        let page = b.build();
        assert_eq!(input_kind(&page.elements[search]), Some(InputKind::Text));
        assert_eq!(input_kind(&page.elements[toggle]), Some(InputKind::Checkbox));
        assert_eq!(input_kind(&page.elements[plain]), None);
    }
}
