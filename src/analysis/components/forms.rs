use super::text_excerpt;
use crate::analysis::{Analyzer, AnalyzerKind, AnalyzerOutput, ExtractionContext};
use crate::types::{
    ancestors, descendants, BoundingBox, ElementSnapshot, FieldDescriptor, FormDescriptor,
    FormLayout,
};
use crate::Result;

const MAX_FORMS: usize = 5;
/// Vertical distance under which two controls count as one row.
const ROW_TOLERANCE: f32 = 8.0;
const SUBMIT_TEXT_LEN: usize = 32;

pub struct FormAnalyzer;

impl Analyzer for FormAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Forms
    }

    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Forms(extract_forms(ctx)))
    }
}

pub fn extract_forms(ctx: &ExtractionContext) -> Vec<FormDescriptor> {
    let elements = ctx.elements();
    let mut forms: Vec<FormDescriptor> = Vec::new();
    let mut signatures: Vec<String> = Vec::new();

    for form in elements.iter().filter(|el| el.tag == "form" && el.is_visible()) {
        let Some(descriptor) = describe_form(elements, form) else {
            continue;
        };
        let signature = format!(
            "{}|{:?}",
            descriptor
                .fields
                .iter()
                .map(|f| f.kind.as_str())
                .collect::<Vec<_>>()
                .join(","),
            descriptor.layout
        );
        if let Some(pos) = signatures.iter().position(|s| *s == signature) {
            forms[pos].count += 1;
            continue;
        }
        if forms.len() >= MAX_FORMS {
            continue;
        }
        signatures.push(signature);
        forms.push(descriptor);
    }
    forms
}

/// `None` for forms without any visible field.
pub fn describe_form(elements: &[ElementSnapshot], form: &ElementSnapshot) -> Option<FormDescriptor> {
    let mut fields = Vec::new();
    let mut boxes: Vec<BoundingBox> = Vec::new();
    let mut submit: Option<&ElementSnapshot> = None;

    for el in descendants(elements, form).filter(|el| el.is_visible()) {
        if is_submit(el) {
            if submit.is_none() {
                submit = Some(el);
            }
            continue;
        }
        let Some(kind) = field_kind(el) else {
            continue;
        };
        fields.push(FieldDescriptor {
            kind,
            name: el.attr("name").map(str::to_string),
            has_label: has_label(elements, el),
            required: el.attr("required").is_some() || el.attr("aria-required") == Some("true"),
            placeholder: el.attr("placeholder").map(str::to_string),
        });
        boxes.push(el.bounds);
    }
    if fields.is_empty() {
        return None;
    }
    if let Some(button) = submit {
        boxes.push(button.bounds);
    }
    let submit_text = submit
        .map(|button| match button.attr("value") {
            Some(value) if button.tag == "input" => value.trim().to_string(),
            _ => text_excerpt(button, SUBMIT_TEXT_LEN),
        })
        .filter(|text| !text.is_empty());

    Some(FormDescriptor {
        has_labels: fields.iter().all(|f| f.has_label),
        fields,
        submit_text,
        layout: layout(&boxes),
        method: form.attr("method").map(|m| m.trim().to_ascii_lowercase()),
        count: 1,
    })
}

fn is_submit(el: &ElementSnapshot) -> bool {
    let input_type = el.attr("type").map(str::to_ascii_lowercase);
    match el.tag.as_str() {
        "button" => !matches!(input_type.as_deref(), Some("button") | Some("reset")),
        "input" => matches!(input_type.as_deref(), Some("submit") | Some("image")),
        _ => false,
    }
}

fn field_kind(el: &ElementSnapshot) -> Option<String> {
    match el.tag.as_str() {
        "textarea" | "select" => Some(el.tag.clone()),
        "input" => {
            let kind = el
                .attr("type")
                .map(|t| t.trim().to_ascii_lowercase())
                .unwrap_or_else(|| "text".to_string());
            (!matches!(kind.as_str(), "hidden" | "button" | "reset")).then_some(kind)
        }
        _ => None,
    }
}

/// Label via ARIA, a `<label for>` pointing at the field, or a wrapping `<label>`.
pub fn has_label(elements: &[ElementSnapshot], el: &ElementSnapshot) -> bool {
    let aria = ["aria-label", "aria-labelledby"]
        .iter()
        .any(|name| el.attr(name).map_or(false, |v| !v.trim().is_empty()));
    if aria {
        return true;
    }
    if let Some(id) = el.id() {
        let labelled = elements
            .iter()
            .any(|other| other.tag == "label" && other.attr("for") == Some(id));
        if labelled {
            return true;
        }
    }
    ancestors(elements, el).any(|a| a.tag == "label")
}

/// One row of a few controls is inline; one control per row is vertical.
pub fn layout(boxes: &[BoundingBox]) -> FormLayout {
    let mut rows: Vec<f32> = Vec::new();
    for b in boxes {
        if !rows.iter().any(|y| (y - b.y).abs() <= ROW_TOLERANCE) {
            rows.push(b.y);
        }
    }
    match rows.len() {
        0 | 1 if boxes.len() <= 3 => FormLayout::Inline,
        0 | 1 => FormLayout::Horizontal,
        n if n == boxes.len() => FormLayout::Vertical,
        _ => FormLayout::Horizontal,
    }
}
