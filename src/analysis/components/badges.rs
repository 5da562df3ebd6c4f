use std::collections::HashMap;

use super::{color_key, style_record, text_excerpt};
use crate::analysis::color::parse_color;
use crate::analysis::{Analyzer, AnalyzerKind, AnalyzerOutput, ExtractionContext};
use crate::types::{BadgeEntry, BadgeVariant, ElementSnapshot};
use crate::Result;

const KEYWORDS: &[&str] = &["badge", "tag", "chip", "pill", "label", "status"];
pub(crate) const PROPERTIES: &[&str] = &[
    "background-color",
    "color",
    "border-radius",
    "font-size",
    "font-weight",
    "padding-top",
    "padding-left",
    "text-transform",
];
const MAX_BADGES: usize = 10;
const MAX_TEXT: usize = 24;

/// Class words that name a variant outright, checked before hue.
const VARIANT_WORDS: &[(BadgeVariant, &[&str])] = &[
    (BadgeVariant::Success, &["success", "positive", "green", "active", "done"]),
    (BadgeVariant::Warning, &["warning", "warn", "caution", "yellow", "pending"]),
    (BadgeVariant::Error, &["error", "danger", "critical", "destructive", "red", "failed"]),
    (BadgeVariant::Info, &["info", "notice", "blue", "new"]),
    (BadgeVariant::Neutral, &["neutral", "default", "secondary", "gray", "grey"]),
];

pub struct BadgeAnalyzer;

impl Analyzer for BadgeAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Badges
    }

    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Badges(extract_badges(ctx)))
    }
}

pub fn extract_badges(ctx: &ExtractionContext) -> Vec<BadgeEntry> {
    let mut badges: Vec<BadgeEntry> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for el in ctx.elements().iter().filter(|el| is_badge(el)) {
        let signature = format!(
            "{}|{}|{}|{}",
            color_key(el, "background-color"),
            color_key(el, "color"),
            el.style.get_or("border-radius", "0px"),
            el.style.get_or("font-size", "")
        );
        if let Some(&pos) = seen.get(&signature) {
            badges[pos].count += 1;
            continue;
        }
        if badges.len() >= MAX_BADGES {
            continue;
        }
        seen.insert(signature, badges.len());
        badges.push(BadgeEntry {
            text: text_excerpt(el, MAX_TEXT),
            variant: variant(el),
            style: style_record(el, PROPERTIES),
            count: 1,
        });
    }
    badges
}

pub fn is_badge(el: &ElementSnapshot) -> bool {
    if !el.is_rendered() || matches!(el.tag.as_str(), "button" | "input" | "select" | "textarea" | "label") {
        return false;
    }
    let text = el.trimmed_text();
    if text.is_empty() || text.chars().count() > MAX_TEXT {
        return false;
    }
    if color_key(el, "background-color") == "transparent" {
        return false;
    }
    if el.style.px("border-radius").map_or(true, |r| r <= 0.0) {
        return false;
    }
    let mut names = el.class_attr().to_ascii_lowercase();
    if let Some(id) = el.id() {
        names.push(' ');
        names.push_str(&id.to_ascii_lowercase());
    }
    let keyword = KEYWORDS.iter().any(|k| names.contains(k));
    let compact = (14.0..=36.0).contains(&el.bounds.height) && el.bounds.width <= 200.0;
    keyword || compact
}

/// From class words first, then from the background hue.
pub fn variant(el: &ElementSnapshot) -> BadgeVariant {
    let classes = el.class_attr().to_ascii_lowercase();
    let words: Vec<&str> = classes
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    for (variant, names) in VARIANT_WORDS {
        if words.iter().any(|w| names.contains(w)) {
            return *variant;
        }
    }
    let Some(bg) = el.style.get("background-color").and_then(parse_color) else {
        return BadgeVariant::Neutral;
    };
    let (hue, saturation, _) = bg.to_hsl();
    if saturation < 0.2 {
        return BadgeVariant::Neutral;
    }
    match hue {
        h if !(15.0..345.0).contains(&h) => BadgeVariant::Error,
        h if (30.0..70.0).contains(&h) => BadgeVariant::Warning,
        h if (80.0..170.0).contains(&h) => BadgeVariant::Success,
        h if (180.0..260.0).contains(&h) => BadgeVariant::Info,
        _ => BadgeVariant::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{PageBuilder, BODY};

    fn badge(b: &mut PageBuilder, class: &str, bg: &str, text: &str) -> usize {
        b.element(BODY, "span")
            .class(class)
            .styles(&[
                ("background-color", bg),
                ("color", "rgb(255, 255, 255)"),
                ("border-radius", "9999px"),
                ("font-size", "12px"),
            ])
            .text(text)
            .size(60.0, 22.0)
            .done()
    }

    #[test]
    fn detects_and_dedups_by_signature() {
        let mut b = PageBuilder::new();
        badge(&mut b, "badge", "rgb(22, 163, 74)", "Active");
        badge(&mut b, "badge", "rgb(22, 163, 74)", "Live");
        badge(&mut b, "badge badge-danger", "rgb(220, 38, 38)", "Failed");
        // square corners are not a badge
        b.element(BODY, "span")
            .class("tag")
            .style("background-color", "rgb(0, 0, 0)")
            .text("Sale")
            .done();
        let badges = extract_badges(&b.context());
        assert_eq!(badges.len(), 2);
        assert_eq!(badges[0].count, 2);
        assert_eq!(badges[0].variant, BadgeVariant::Success);
        assert_eq!(badges[1].variant, BadgeVariant::Error);
    }

    #[test]
    fn variant_falls_back_to_hue() {
        let mut b = PageBuilder::new();
        let amber = badge(&mut b, "chip", "rgb(245, 158, 11)", "Beta");
        let blue = badge(&mut b, "chip", "rgb(37, 99, 235)", "Docs");
        let gray = badge(&mut b, "chip", "rgb(229, 231, 235)", "v2");
        let page = b.build();
        assert_eq!(variant(&page.elements[amber]), BadgeVariant::Warning);
        assert_eq!(variant(&page.elements[blue]), BadgeVariant::Info);
        assert_eq!(variant(&page.elements[gray]), BadgeVariant::Neutral);
    }

    #[test]
    fn long_text_is_not_a_badge() {
        let mut b = PageBuilder::new();
        badge(&mut b, "badge", "rgb(37, 99, 235)", "This label is far too long for a badge");
        assert!(extract_badges(&b.context()).is_empty());
    }
}
