//! Icon system and CSS framework detection from class names, fonts and tags.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Analyzer, AnalyzerKind, AnalyzerOutput, ExtractionContext};
use crate::types::{Confidence, ElementSnapshot, FrameworkHint, IconLibrary, IconSystem, PageCapture};
use crate::Result;

struct IconSignature {
    name: &'static str,
    /// Exact class names or `prefix-` patterns (trailing dash).
    classes: &'static [&'static str],
    font: &'static str,
    /// Substring of a stylesheet or script URL.
    asset: &'static str,
}

const ICON_LIBRARIES: &[IconSignature] = &[
    IconSignature {
        name: "Font Awesome",
        classes: &["fa", "fas", "far", "fab", "fal", "fad", "fa-"],
        font: "font awesome",
        asset: "fontawesome",
    },
    IconSignature {
        name: "Material Icons",
        classes: &["material-icons", "material-icons-", "material-symbols-"],
        font: "material",
        asset: "fonts.googleapis.com/icon",
    },
    IconSignature {
        name: "Bootstrap Icons",
        classes: &["bi", "bi-"],
        font: "bootstrap-icons",
        asset: "bootstrap-icons",
    },
    IconSignature {
        name: "Ionicons",
        classes: &["ion-"],
        font: "ionicons",
        asset: "ionicons",
    },
    IconSignature {
        name: "Feather",
        classes: &["feather", "feather-"],
        font: "feather",
        asset: "feather-icons",
    },
    IconSignature {
        name: "Lucide",
        classes: &["lucide", "lucide-"],
        font: "lucide",
        asset: "lucide",
    },
    IconSignature {
        name: "Heroicons",
        classes: &["heroicon", "heroicon-"],
        font: "heroicons",
        asset: "heroicons",
    },
    IconSignature {
        name: "Glyphicons",
        classes: &["glyphicon", "glyphicon-"],
        font: "glyphicons",
        asset: "glyphicons",
    },
    IconSignature {
        name: "Dashicons",
        classes: &["dashicons", "dashicons-"],
        font: "dashicons",
        asset: "dashicons",
    },
];

impl IconSignature {
    fn matches_class(&self, class: &str) -> bool {
        self.classes.iter().any(|pattern| match pattern.strip_suffix('-') {
            Some(_) => class.starts_with(pattern) && class.len() > pattern.len(),
            None => class == *pattern,
        })
    }

    fn matches_element(&self, el: &ElementSnapshot) -> bool {
        if self.name == "Ionicons" && el.tag == "ion-icon" {
            return true;
        }
        let by_class = el
            .classes()
            .map(str::to_ascii_lowercase)
            .any(|c| self.matches_class(&c));
        let by_data = el
            .attributes
            .keys()
            .any(|k| k == &format!("data-{}", self.name.to_ascii_lowercase()));
        by_class || by_data
    }
}

/// Icon-font glyph carriers (`<i class="fa fa-x">`, `<span class="material-icons">`).
pub fn is_icon_glyph(el: &ElementSnapshot) -> bool {
    matches!(el.tag.as_str(), "i" | "span")
        && ICON_LIBRARIES.iter().any(|lib| lib.matches_element(el))
}

pub struct IconAnalyzer;

impl Analyzer for IconAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Icons
    }

    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Icons(icon_system(ctx)))
    }
}

pub fn icon_system(ctx: &ExtractionContext) -> IconSystem {
    let elements = ctx.elements();
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    let mut inline_svg = 0;
    let mut sprite_refs = 0;

    for el in elements.iter().filter(|el| el.is_visible()) {
        let font = el.style.get_or("font-family", "").to_ascii_lowercase();
        for lib in ICON_LIBRARIES {
            let glyph_font = !font.is_empty() && font.contains(lib.font) && el.tag != "body" && el.tag != "html";
            if lib.matches_element(el) || glyph_font {
                *counts.entry(lib.name).or_insert(0) += 1;
                break;
            }
        }
        match el.tag.as_str() {
            "svg" => {
                let nested = el
                    .parent
                    .and_then(|p| elements.get(p))
                    .map_or(false, |parent| parent.is_svg_shape());
                if !nested {
                    inline_svg += 1;
                }
            }
            "use" if el.attr("href").or_else(|| el.attr("xlink:href")).is_some() => {
                sprite_refs += 1;
            }
            _ => {}
        }
    }
    for lib in ICON_LIBRARIES {
        if counts.contains_key(lib.name) {
            continue;
        }
        if references_asset(&ctx.page, lib.asset) {
            counts.insert(lib.name, 1);
        }
    }

    let mut libraries: Vec<IconLibrary> = counts
        .into_iter()
        .map(|(name, count)| IconLibrary {
            name: name.to_string(),
            count,
        })
        .collect();
    libraries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    IconSystem {
        libraries,
        inline_svg,
        sprite_refs,
    }
}

fn references_asset(page: &PageCapture, asset: &str) -> bool {
    page.tags.iter().any(|tag| {
        ["href", "src"]
            .iter()
            .filter_map(|name| tag.attr(name))
            .any(|url| url.to_ascii_lowercase().contains(asset))
    })
}

// ============================================================================
// CSS frameworks
// ============================================================================

/// Framework → class-name pattern.
static FRAMEWORK_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    let table: &[(&str, &str)] = &[
        (
            "Tailwind CSS",
            r"^(?:[a-z0-9]+:)*(?:-?(?:p|px|py|pt|pb|pl|pr|m|mx|my|mt|mb|ml|mr|gap|space-[xy])-\d+(?:\.5)?|text-(?:xs|sm|base|lg|[2-9]?xl)|(?:bg|text|border|ring)-[a-z]+-\d{2,3}|rounded(?:-[a-z0-9]+)?|shadow-(?:sm|md|lg|xl|2xl)|w-(?:full|screen|\d+)|h-(?:full|screen|\d+)|items-center|justify-between|max-w-[a-z0-9]+)$",
        ),
        (
            "Bootstrap",
            r"^(?:container-fluid|row|col-(?:sm|md|lg|xl|xxl)(?:-\d{1,2})?|col-\d{1,2}|btn-(?:primary|secondary|outline-[a-z]+|lg|sm)|navbar-(?:expand-[a-z]+|brand|nav|toggler)|card-(?:body|title|header)|d-(?:none|flex|block|inline-block)|form-control|form-group|text-(?:muted|center)|bg-(?:light|dark))$",
        ),
        (
            "Bulma",
            r"^(?:is-(?:primary|link|info|success|warning|danger|fullwidth|centered|\d{1,2})|has-text-[a-z-]+|columns|navbar-item|hero-body|is-size-\d)$",
        ),
        (
            "Foundation",
            r"^(?:grid-x|grid-y|grid-container|grid-padding-x|cell|callout|top-bar|(?:small|medium|large)-\d{1,2})$",
        ),
        ("Material UI", r"^Mui[A-Z][A-Za-z]+-[a-zA-Z]+$"),
        ("Chakra UI", r"^chakra-[a-z-]+$"),
        ("Ant Design", r"^ant-[a-z-]+$"),
    ];
    table
        .iter()
        .map(|(name, pattern)| {
            (
                *name,
                Regex::new(pattern).expect("framework class pattern is valid"),
            )
        })
        .collect()
});

/// Elements needed before a framework is reported.
const MIN_ELEMENTS: usize = 3;
const MAX_EVIDENCE: usize = 5;

pub struct FrameworkAnalyzer;

impl Analyzer for FrameworkAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Frameworks
    }

    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Frameworks(css_frameworks(ctx)))
    }
}

pub fn css_frameworks(ctx: &ExtractionContext) -> Vec<FrameworkHint> {
    let mut hits: Vec<(usize, Vec<String>)> = vec![(0, Vec::new()); FRAMEWORK_PATTERNS.len()];
    for el in ctx.elements() {
        for (i, (_, pattern)) in FRAMEWORK_PATTERNS.iter().enumerate() {
            let mut matched = false;
            for class in el.classes().filter(|c| pattern.is_match(c)) {
                matched = true;
                let evidence = &mut hits[i].1;
                if evidence.len() < MAX_EVIDENCE && !evidence.iter().any(|e| e == class) {
                    evidence.push(class.to_string());
                }
            }
            if matched {
                hits[i].0 += 1;
            }
        }
    }

    let mut hints: Vec<FrameworkHint> = FRAMEWORK_PATTERNS
        .iter()
        .zip(hits)
        .filter(|(_, (count, _))| *count >= MIN_ELEMENTS)
        .map(|((name, _), (count, evidence))| FrameworkHint {
            name: name.to_string(),
            confidence: Confidence::from_count(count),
            count,
            evidence,
        })
        .collect();
    hints.sort_by(|a, b| b.count.cmp(&a.count));
    hints
}
