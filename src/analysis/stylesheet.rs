//! Pseudo-state recovery from stylesheet rules.
//!
//! Computed style cannot report `:hover` or `:focus` without live interaction,
//! so these helpers match an element's tag, id and classes against the
//! selectors of accessible rules and copy only the declarations those rules set
//! explicitly. No specificity or cascade resolution is attempted.

use crate::types::{ElementSnapshot, StyleRecord, StyleRule};

/// Interaction states recoverable from selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoState {
    Hover,
    Active,
    Focus,
    Visited,
}

impl PseudoState {
    fn pseudo(&self) -> &'static str {
        match self {
            PseudoState::Hover => ":hover",
            PseudoState::Active => ":active",
            PseudoState::Focus => ":focus",
            PseudoState::Visited => ":visited",
        }
    }
}

/// Declarations of every rule whose selector targets `el` in `state`, in rule order.
///
/// Properties whose value equals the element's default computed value are dropped.
pub fn state_declarations(
    rules: &[StyleRule],
    el: &ElementSnapshot,
    state: PseudoState,
) -> Option<StyleRecord> {
    let mut record = StyleRecord::new();
    for rule in rules {
        let matched = rule
            .selector
            .split(',')
            .any(|selector| selector_targets_state(selector.trim(), el, state));
        if matched {
            for (property, value) in &rule.declarations {
                if property.starts_with("--") {
                    continue;
                }
                record.insert(property.clone(), value.trim().to_string());
            }
        }
    }
    record.retain(|property, value| el.style.get(property) != Some(value.as_str()));
    (!record.is_empty()).then_some(record)
}

/// `::placeholder` color declared for `el` (or for its tag generically).
pub fn placeholder_color(rules: &[StyleRule], el: &ElementSnapshot) -> Option<String> {
    let mut found = None;
    for rule in rules {
        let matched = rule.selector.split(',').any(|selector| {
            let selector = selector.trim();
            let Some(pos) = selector.find("::placeholder") else {
                return false;
            };
            let compound = last_compound(&selector[..pos]);
            compound.is_empty() || compound_matches(compound, el)
        });
        if matched {
            if let Some(color) = rule.declarations.get("color") {
                found = Some(color.trim().to_string());
            }
        }
    }
    found
}

/// Value of `property` from the last plain (state-free) rule targeting `el`.
pub fn declared_value(rules: &[StyleRule], el: &ElementSnapshot, property: &str) -> Option<String> {
    rules
        .iter()
        .filter(|rule| {
            rule.selector.split(',').any(|selector| {
                let selector = selector.trim();
                !selector.contains(':') && compound_matches(last_compound(selector), el)
            })
        })
        .filter_map(|rule| rule.declarations.get(property))
        .last()
        .map(|v| v.trim().to_string())
}

fn selector_targets_state(selector: &str, el: &ElementSnapshot, state: PseudoState) -> bool {
    let pseudo = state.pseudo();
    let mut search_from = 0;
    while let Some(offset) = selector[search_from..].find(pseudo) {
        let start = search_from + offset;
        let end = start + pseudo.len();
        search_from = end;
        if selector[..start].ends_with('\\') || !pseudo_boundary(&selector[end..], state) {
            continue;
        }
        if !applies_to_subject(&selector[end..]) {
            continue;
        }
        let compound = last_compound(&selector[..start]);
        if !compound.is_empty() && compound_matches(compound, el) {
            return true;
        }
    }
    false
}

/// False when a combinator follows the pseudo-class, i.e. it styles an ancestor.
fn applies_to_subject(rest: &str) -> bool {
    let mut depth = 0usize;
    for c in rest.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ' ' | '>' | '+' | '~' if depth == 0 => return false,
            _ => {}
        }
    }
    true
}

/// `:focus` also covers `:focus-visible`; no state matches a longer identifier.
fn pseudo_boundary(after: &str, state: PseudoState) -> bool {
    if state == PseudoState::Focus && after.starts_with("-visible") {
        return true;
    }
    !after
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Rightmost compound selector of `prefix` (text after the last combinator).
fn last_compound(prefix: &str) -> &str {
    let trimmed = prefix.trim_end();
    let start = trimmed
        .rfind([' ', '>', '+', '~'])
        .map(|i| i + 1)
        .unwrap_or(0);
    trimmed[start..].trim()
}

/// Whether every tag/id/class requirement of `compound` holds for `el`.
/// Attribute selectors and other pseudo-classes are ignored.
fn compound_matches(compound: &str, el: &ElementSnapshot) -> bool {
    let mut tag = String::new();
    let mut classes = Vec::new();
    let mut id = None;
    let mut current = String::new();
    let mut mode = 't';
    let mut bracket_depth = 0;
    let mut escaped = false;

    let flush = |mode: char,
                 current: &mut String,
                 tag: &mut String,
                 classes: &mut Vec<String>,
                 id: &mut Option<String>| {
        if current.is_empty() {
            return;
        }
        match mode {
            't' => *tag = std::mem::take(current),
            '.' => classes.push(std::mem::take(current)),
            '#' => *id = Some(std::mem::take(current)),
            _ => current.clear(),
        }
    };

    for c in compound.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        if bracket_depth > 0 {
            match c {
                ']' | ')' => bracket_depth -= 1,
                '[' | '(' => bracket_depth += 1,
                _ => {}
            }
            continue;
        }
        match c {
            '.' | '#' | ':' => {
                flush(mode, &mut current, &mut tag, &mut classes, &mut id);
                mode = c;
            }
            '[' | '(' => {
                flush(mode, &mut current, &mut tag, &mut classes, &mut id);
                mode = 'x';
                bracket_depth += 1;
            }
            '\\' => escaped = true,
            _ => current.push(c),
        }
    }
    flush(mode, &mut current, &mut tag, &mut classes, &mut id);

    if tag.is_empty() && classes.is_empty() && id.is_none() {
        return false;
    }
    if !tag.is_empty() && tag != "*" && !tag.eq_ignore_ascii_case(&el.tag) {
        return false;
    }
    if let Some(id) = id {
        if el.id() != Some(id.as_str()) {
            return false;
        }
    }
    classes.iter().all(|class| el.has_class(class))
}
