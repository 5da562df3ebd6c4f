//! W3C Design Tokens (DTCG) export of a [`DesignReport`].
//!
//! Groups: `color` (semantic roles and palette), `font` (families and text
//! styles), `spacing`, `radius` and `shadow`. Every token carries `$value`
//! and `$type`.

use serde_json::{json, Map, Value};

use crate::types::{DesignReport, TypographyStyle};

pub fn design_tokens(report: &DesignReport) -> Value {
    let mut root = Map::new();
    root.insert("$description".into(), json!(format!("Design tokens extracted from {}", report.url)));
    insert_group(&mut root, "color", color_group(report));
    insert_group(&mut root, "font", font_group(&report.typography.styles));
    insert_group(
        &mut root,
        "spacing",
        dimension_group(report.spacing.values.iter().map(|v| v.value.as_str())),
    );
    insert_group(
        &mut root,
        "radius",
        dimension_group(report.border_radius.iter().map(|v| v.value.as_str())),
    );
    insert_group(&mut root, "shadow", shadow_group(report));
    Value::Object(root)
}

fn insert_group(root: &mut Map<String, Value>, name: &str, group: Map<String, Value>) {
    if !group.is_empty() {
        root.insert(name.to_string(), Value::Object(group));
    }
}

fn token(value: Value, kind: &str) -> Value {
    json!({ "$value": value, "$type": kind })
}

/// Token names may not contain `.`, `{` or `}`.
fn token_name(raw: &str) -> String {
    let mut name: String = raw
        .trim()
        .trim_start_matches('#')
        .chars()
        .map(|c| match c {
            '.' => '_',
            '{' | '}' | ' ' | ',' | '/' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect();
    while name.contains("--") {
        name = name.replace("--", "-");
    }
    name.trim_matches('-').to_string()
}

fn color_group(report: &DesignReport) -> Map<String, Value> {
    let mut group = Map::new();
    let mut semantic = Map::new();
    for (role, color) in &report.colors.semantic_colors {
        semantic.insert(token_name(role), token(json!(color), "color"));
    }
    if !semantic.is_empty() {
        group.insert("semantic".into(), Value::Object(semantic));
    }
    let mut palette = Map::new();
    for entry in &report.colors.palette {
        let mut t = token(json!(entry.normalized_hex), "color");
        if !entry.context_tags.is_empty() {
            t["$description"] = json!(entry.context_tags.join(", "));
        }
        palette.insert(token_name(&entry.normalized_hex), t);
    }
    if !palette.is_empty() {
        group.insert("palette".into(), Value::Object(palette));
    }
    group
}

fn font_group(styles: &[TypographyStyle]) -> Map<String, Value> {
    let mut group = Map::new();
    let mut families = Map::new();
    let mut text = Map::new();
    let mut per_context: std::collections::HashMap<String, usize> = Default::default();

    for style in styles {
        let family_key = token_name(&style.family);
        if !family_key.is_empty() && !families.contains_key(&family_key) {
            let mut stack = vec![style.family.clone()];
            stack.extend(style.fallbacks.iter().cloned());
            families.insert(family_key, token(json!(stack), "fontFamily"));
        }

        let context = format!("{:?}", style.context).to_ascii_lowercase();
        let n = per_context.entry(context.clone()).or_insert(0);
        *n += 1;
        let mut value = json!({
            "fontFamily": style.family,
            "fontSize": format!("{}px", trim_float(style.size_px)),
            "fontWeight": style.weight,
        });
        if let Some(ratio) = style.line_height_ratio {
            value["lineHeight"] = json!(ratio);
        }
        if let Some(spacing) = &style.letter_spacing {
            value["letterSpacing"] = json!(spacing);
        }
        text.insert(format!("{context}-{n}"), token(value, "typography"));
    }
    if !families.is_empty() {
        group.insert("family".into(), Value::Object(families));
    }
    if !text.is_empty() {
        group.insert("style".into(), Value::Object(text));
    }
    group
}

fn is_dimension(value: &str) -> bool {
    let value = value.trim();
    ["px", "rem", "em"].iter().any(|unit| {
        value
            .strip_suffix(unit)
            .map_or(false, |n| n.parse::<f32>().is_ok())
    })
}

/// Length values only; percentages and multi-value shorthands are skipped.
fn dimension_group<'a>(values: impl Iterator<Item = &'a str>) -> Map<String, Value> {
    let mut group = Map::new();
    for value in values.filter(|v| is_dimension(v)) {
        group.insert(token_name(value), token(json!(value.trim()), "dimension"));
    }
    group
}

fn shadow_group(report: &DesignReport) -> Map<String, Value> {
    report
        .shadows
        .iter()
        .enumerate()
        .map(|(i, shadow)| (format!("shadow-{}", i + 1), token(json!(shadow.value), "shadow")))
        .collect()
}

fn trim_float(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}
