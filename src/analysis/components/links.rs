use std::collections::HashMap;

use super::{color_key, component_states, has_background, text_excerpt};
use crate::analysis::stylesheet::PseudoState;
use crate::analysis::{Analyzer, AnalyzerKind, AnalyzerOutput, ExtractionContext};
use crate::types::{ancestors, ElementSnapshot, LinkContext, LinkStyle};
use crate::Result;

pub(crate) const PROPERTIES: &[&str] = &[
    "color",
    "text-decoration-line",
    "text-underline-offset",
    "font-weight",
    "font-size",
];
const STATES: &[PseudoState] = &[
    PseudoState::Hover,
    PseudoState::Visited,
    PseudoState::Active,
    PseudoState::Focus,
];
const MAX_LINKS: usize = 12;
const EXAMPLE_LEN: usize = 40;

pub struct LinkAnalyzer;

impl Analyzer for LinkAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Links
    }

    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Links(extract_links(ctx)))
    }
}

pub fn extract_links(ctx: &ExtractionContext) -> Vec<LinkStyle> {
    let elements = ctx.elements();
    let mut links: Vec<LinkStyle> = Vec::new();
    let mut by_color: HashMap<String, usize> = HashMap::new();

    for el in elements.iter().filter(|el| is_link(el) && el.is_rendered()) {
        let color = color_key(el, "color");
        if let Some(&pos) = by_color.get(&color) {
            links[pos].elements.push(el.index);
            continue;
        }
        if links.len() >= MAX_LINKS {
            continue;
        }
        by_color.insert(color.clone(), links.len());
        let example = text_excerpt(el, EXAMPLE_LEN);
        links.push(LinkStyle {
            color,
            context: link_context(elements, el),
            example: (!example.is_empty()).then_some(example),
            states: component_states(ctx.style_rules(), el, PROPERTIES, STATES),
            measured_states: Vec::new(),
            mode: None,
            elements: vec![el.index],
        });
    }
    links
}

pub fn is_link(el: &ElementSnapshot) -> bool {
    (el.tag == "a" && el.attr("href").is_some())
        || el.role().map_or(false, |r| r.eq_ignore_ascii_case("link"))
}

/// Where a link sits, from its own classes and its ancestors.
pub fn link_context(elements: &[ElementSnapshot], el: &ElementSnapshot) -> LinkContext {
    let classes = el.class_attr().to_ascii_lowercase();
    if classes.contains("btn") || classes.contains("button") || has_background(el) {
        return LinkContext::Button;
    }
    for ancestor in std::iter::once(el).chain(ancestors(elements, el)) {
        let descriptor = ancestor.descriptor();
        let label = ancestor.attr("aria-label").unwrap_or("").to_ascii_lowercase();
        if descriptor.contains("breadcrumb") || label.contains("breadcrumb") {
            return LinkContext::Breadcrumb;
        }
        let role = ancestor.role().unwrap_or("");
        if ancestor.tag == "nav" || ancestor.tag == "header" || role == "navigation" || role == "menubar" {
            return LinkContext::Navigation;
        }
        if ancestor.tag == "footer" || role == "contentinfo" {
            return LinkContext::Footer;
        }
    }
    LinkContext::Inline
}
