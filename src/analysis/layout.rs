//! Layout metric analyzers: spacing, border radius, borders and shadows.
//!
//! Each tallies literal computed values across visible elements and reports
//! them with a count-based confidence tier.

use std::collections::HashMap;

use super::color::{color_tokens, parse_color};
use super::{Analyzer, AnalyzerKind, AnalyzerOutput, ExtractionContext};
use crate::types::{parse_px, BorderCombo, Confidence, ElementSnapshot, SpacingScale, UsageValue};
use crate::Result;

const SPACING_PROPERTIES: &[&str] = &["margin-top", "margin-bottom", "padding-top", "padding-bottom"];
const MAX_SPACING_VALUES: usize = 20;
const MAX_CONTEXTS: usize = 5;
const MAX_BORDERS: usize = 20;
const MAX_SHADOWS: usize = 20;
/// Share of the top spacing usage that must sit on a grid for it to be reported.
const GRID_SHARE: f32 = 0.7;
const GRID_SAMPLE: usize = 10;

/// Insertion-ordered value tally with sampled element contexts.
#[derive(Default)]
struct Tally {
    counts: HashMap<String, (usize, Vec<&'static str>)>,
    order: Vec<String>,
}

impl Tally {
    fn add(&mut self, value: String, context: Option<&'static str>) {
        if !self.counts.contains_key(&value) {
            self.order.push(value.clone());
        }
        let entry = self.counts.entry(value).or_insert_with(|| (0, Vec::new()));
        entry.0 += 1;
        if let Some(context) = context {
            if entry.1.len() < MAX_CONTEXTS && !entry.1.contains(&context) {
                entry.1.push(context);
            }
        }
    }

    /// Values ordered by count descending, first-seen breaking ties.
    fn into_usage(self) -> Vec<UsageValue> {
        let Tally { mut counts, order } = self;
        let mut values: Vec<UsageValue> = order
            .iter()
            .filter_map(|value| {
                counts.remove(value).map(|(count, contexts)| UsageValue {
                    value: value.clone(),
                    count,
                    confidence: Confidence::from_count(count),
                    element_contexts: contexts.into_iter().map(str::to_string).collect(),
                })
            })
            .collect();
        values.sort_by(|a, b| b.count.cmp(&a.count));
        values
    }
}

/// Coarse component label from tag and class names.
pub fn element_context(el: &ElementSnapshot) -> Option<&'static str> {
    let classes = el.class_attr().to_ascii_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| classes.contains(w));
    if el.tag == "button" || el.role() == Some("button") || has(&["btn", "button"]) {
        Some("button")
    } else if matches!(el.tag.as_str(), "input" | "textarea" | "select") || has(&["input", "field"]) {
        Some("input")
    } else if el.tag == "dialog" || has(&["modal", "dialog"]) {
        Some("modal")
    } else if has(&["badge", "chip", "pill", "tag"]) {
        Some("badge")
    } else if has(&["card", "tile", "panel"]) {
        Some("card")
    } else if matches!(el.tag.as_str(), "img" | "picture" | "video") || has(&["image", "avatar", "thumb"]) {
        Some("image")
    } else {
        None
    }
}

pub struct SpacingAnalyzer;

impl Analyzer for SpacingAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Spacing
    }

    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Spacing(spacing_scale(ctx)))
    }
}

pub fn spacing_scale(ctx: &ExtractionContext) -> SpacingScale {
    let mut tally = Tally::default();
    for el in ctx.visible_elements() {
        for property in SPACING_PROPERTIES {
            if let Some(value) = el.style.get(property) {
                if parse_px(value).map_or(false, |px| px > 0.0) {
                    tally.add(value.to_string(), None);
                }
            }
        }
    }
    let mut values = tally.into_usage();
    values.truncate(MAX_SPACING_VALUES);
    let grid = infer_grid(&values);
    values.sort_by(|a, b| {
        let pa = parse_px(&a.value).unwrap_or(f32::MAX);
        let pb = parse_px(&b.value).unwrap_or(f32::MAX);
        pa.total_cmp(&pb)
    });
    SpacingScale { grid, values }
}

/// 8 when the most used values are multiples of 8, else 4, else none.
pub fn infer_grid(by_count: &[UsageValue]) -> Option<u32> {
    let sample: Vec<(f32, usize)> = by_count
        .iter()
        .take(GRID_SAMPLE)
        .filter_map(|v| parse_px(&v.value).map(|px| (px, v.count)))
        .collect();
    let total: usize = sample.iter().map(|(_, c)| c).sum();
    if total == 0 {
        return None;
    }
    let share = |unit: f32| {
        let on_grid: usize = sample
            .iter()
            .filter(|(px, _)| (px % unit).abs() < 0.01)
            .map(|(_, c)| c)
            .sum();
        on_grid as f32 / total as f32
    };
    if share(8.0) >= GRID_SHARE {
        Some(8)
    } else if share(4.0) >= GRID_SHARE {
        Some(4)
    } else {
        None
    }
}

pub struct RadiusAnalyzer;

impl Analyzer for RadiusAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::BorderRadius
    }

    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::BorderRadius(radius_values(ctx)))
    }
}

pub fn radius_values(ctx: &ExtractionContext) -> Vec<UsageValue> {
    let mut tally = Tally::default();
    for el in ctx.visible_elements() {
        let Some(radius) = el.style.get("border-radius") else {
            continue;
        };
        if radius.split_whitespace().all(|part| parse_px(part) == Some(0.0)) {
            continue;
        }
        tally.add(radius.to_string(), element_context(el));
    }
    let mut values = tally.into_usage();
    values.sort_by(|a, b| {
        let key = |v: &UsageValue| {
            let percent = v.value.contains('%');
            let px = parse_px(v.value.trim_end_matches('%')).unwrap_or(f32::MAX);
            (percent, px)
        };
        let (pa, va) = key(a);
        let (pb, vb) = key(b);
        pa.cmp(&pb).then_with(|| va.total_cmp(&vb))
    });
    values
}

pub struct BorderAnalyzer;

impl Analyzer for BorderAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Borders
    }

    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Borders(border_combos(ctx)))
    }
}

pub fn border_combos(ctx: &ExtractionContext) -> Vec<BorderCombo> {
    let mut tally = Tally::default();
    for el in ctx.visible_elements() {
        let mut seen: Vec<String> = Vec::new();
        for side in ["top", "right", "bottom", "left"] {
            let width = el.style.get_or(&format!("border-{side}-width"), "0px");
            let style = el.style.get_or(&format!("border-{side}-style"), "none");
            if parse_px(width).map_or(true, |w| w <= 0.0) || style == "none" || style == "hidden" {
                continue;
            }
            let color_value = el.style.get_or(&format!("border-{side}-color"), "");
            for token in color_tokens(color_value) {
                let Some(color) = parse_color(token).filter(|c| !c.is_transparent()) else {
                    continue;
                };
                let key = format!("{}|{}|{}", width, style, color.to_hex());
                if !seen.contains(&key) {
                    seen.push(key);
                }
            }
        }
        for key in seen {
            tally.add(key, element_context(el));
        }
    }
    let mut combos: Vec<BorderCombo> = tally
        .into_usage()
        .into_iter()
        .filter_map(|usage| {
            let mut parts = usage.value.splitn(3, '|');
            Some(BorderCombo {
                width: parts.next()?.to_string(),
                style: parts.next()?.to_string(),
                color: parts.next()?.to_string(),
                count: usage.count,
                confidence: usage.confidence,
                element_contexts: usage.element_contexts,
            })
        })
        .collect();
    combos.truncate(MAX_BORDERS);
    combos
}

pub struct ShadowAnalyzer;

impl Analyzer for ShadowAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Shadows
    }

    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Shadows(shadow_values(ctx)))
    }
}

pub fn shadow_values(ctx: &ExtractionContext) -> Vec<UsageValue> {
    let mut tally = Tally::default();
    for el in ctx.visible_elements() {
        if let Some(shadow) = el.style.get("box-shadow").filter(|s| *s != "none") {
            tally.add(shadow.to_string(), element_context(el));
        }
    }
    let mut values = tally.into_usage();
    values.truncate(MAX_SHADOWS);
    values
}
