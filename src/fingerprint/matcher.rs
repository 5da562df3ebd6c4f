//! Evaluates rule-store checks against a captured page.

use std::collections::HashSet;

use super::rules::{RuleCheck, RuleLibrary, TechRule};
use crate::types::{PageCapture, TechMatch};

/// Attributes whose patterns may fall back to a raw HTML search.
const HTML_FALLBACK_ATTRIBUTES: &[&str] = &["src", "href"];

/// Case-insensitive wildcard match: every `*`-separated literal segment must
/// appear somewhere in `haystack`, in any order.
pub fn wildcard_match(haystack: &str, pattern: &str) -> bool {
    let haystack = haystack.to_ascii_lowercase();
    let mut segments = pattern
        .split('*')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .peekable();
    if segments.peek().is_none() {
        return false;
    }
    segments.all(|segment| haystack.contains(&segment.to_ascii_lowercase()))
}

/// Page text prepared once per run.
pub struct MatchTarget<'a> {
    page: &'a PageCapture,
    html: String,
}

impl<'a> MatchTarget<'a> {
    pub fn new(page: &'a PageCapture) -> Self {
        Self {
            page,
            html: page.html.to_ascii_lowercase(),
        }
    }

    fn html_contains(&self, pattern: &str) -> bool {
        wildcard_match(&self.html, pattern)
    }

    pub fn check(&self, check: &RuleCheck) -> bool {
        match check {
            RuleCheck::Tag {
                tag,
                attribute,
                value,
            } => {
                let tag = tag.to_ascii_lowercase();
                let in_tags = self.page.tags_named(&tag).any(|snapshot| match attribute {
                    Some(attr) => snapshot
                        .attr(&attr.to_ascii_lowercase())
                        .map_or(false, |v| wildcard_match(v, value)),
                    None => snapshot
                        .text
                        .as_deref()
                        .map_or(false, |t| wildcard_match(t, value)),
                });
                if in_tags {
                    return true;
                }
                let fallback = match attribute {
                    Some(attr) => HTML_FALLBACK_ATTRIBUTES
                        .iter()
                        .any(|a| a.eq_ignore_ascii_case(attr)),
                    None => true,
                };
                fallback && self.html_contains(value)
            }
            RuleCheck::Header { name, value } => {
                let name = name.to_ascii_lowercase();
                let header = self
                    .page
                    .headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(&name));
                match (header, value) {
                    (Some(_), None) => true,
                    (Some((_, actual)), Some(pattern)) => wildcard_match(actual, pattern),
                    (None, _) => false,
                }
            }
            RuleCheck::Text { value } => self.html_contains(value),
        }
    }

    /// A rule matches when any of its checks does.
    pub fn matches(&self, rule: &TechRule) -> bool {
        rule.checks.iter().any(|check| self.check(check))
    }
}

/// Every technology in the library that matches, in library order.
pub fn match_rules(library: &RuleLibrary, page: &PageCapture) -> Vec<TechMatch> {
    let target = MatchTarget::new(page);
    let mut out = Vec::new();
    for category in library.categories() {
        let mut seen = HashSet::new();
        for rule in &category.rules {
            if seen.contains(rule.id.as_str()) || !target.matches(rule) {
                continue;
            }
            seen.insert(rule.id.as_str());
            out.push(TechMatch {
                id: rule.id.clone(),
                name: rule.name.clone(),
                description: rule.description.clone(),
                category: category.category.clone(),
                icon: rule.icon.clone(),
            });
        }
    }
    out
}
