use std::collections::HashMap;

use super::stylesheet::declared_value;
use super::{Analyzer, AnalyzerKind, AnalyzerOutput, ExtractionContext};
use crate::types::{
    ElementSnapshot, FontSource, FontSourceKind, PageCapture, TextContext, TypographyResult,
    TypographyStyle,
};
use crate::Result;

const SAMPLED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "a", "button", "label", "li", "span", "small",
    "blockquote", "figcaption", "td", "th", "dt", "dd",
];

const SYSTEM_STACK_MARKERS: &[&str] = &[
    "-apple-system",
    "blinkmacsystemfont",
    "system-ui",
    "segoe ui",
    "ui-sans-serif",
];

const EXAMPLE_LEN: usize = 40;

pub struct TypographyAnalyzer;

impl Analyzer for TypographyAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Typography
    }

    fn analyze(&self, ctx: &ExtractionContext) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Typography(TypographyResult {
            styles: text_styles(ctx),
            sources: font_sources(&ctx.page),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StyleKey {
    family: String,
    size_tenths: i32,
    weight: u16,
    context: TextContext,
    letter_spacing: Option<String>,
    transform: Option<String>,
}

pub fn text_styles(ctx: &ExtractionContext) -> Vec<TypographyStyle> {
    let mut buckets: HashMap<StyleKey, TypographyStyle> = HashMap::new();
    let mut order: Vec<StyleKey> = Vec::new();

    for el in ctx.visible_elements() {
        if !SAMPLED_TAGS.contains(&el.tag.as_str()) || el.own_text.trim().is_empty() {
            continue;
        }
        let Some(size_px) = el.style.px("font-size").filter(|s| *s > 0.0) else {
            continue;
        };
        let (family, fallbacks) = split_family(el.style.get_or("font-family", "serif"));
        let weight = parse_weight(el.style.get_or("font-weight", "400"));
        let context = classify_context(el, size_px);
        let letter_spacing = el
            .style
            .get("letter-spacing")
            .filter(|v| *v != "normal" && *v != "0px")
            .map(str::to_string);
        let transform = el
            .style
            .get("text-transform")
            .filter(|v| *v != "none")
            .map(str::to_string);

        let key = StyleKey {
            family: family.clone(),
            size_tenths: (size_px * 10.0).round() as i32,
            weight,
            context,
            letter_spacing: letter_spacing.clone(),
            transform: transform.clone(),
        };

        if let Some(existing) = buckets.get_mut(&key) {
            existing.count += 1;
            continue;
        }

        let fluid = is_fluid(ctx, el);
        let style = TypographyStyle {
            context,
            family,
            fallbacks,
            size_px,
            weight,
            line_height_ratio: line_height_ratio(el.style.get_or("line-height", "normal"), size_px),
            letter_spacing,
            transform,
            is_fluid: fluid.then_some(true),
            font_features: el
                .style
                .get("font-feature-settings")
                .filter(|v| *v != "normal")
                .map(str::to_string),
            count: 1,
            example: Some(truncate(el.own_text.trim(), EXAMPLE_LEN)),
        };
        order.push(key.clone());
        buckets.insert(key, style);
    }

    let mut styles: Vec<TypographyStyle> = order
        .into_iter()
        .filter_map(|key| buckets.remove(&key))
        .collect();
    styles.sort_by(|a, b| {
        b.size_px
            .total_cmp(&a.size_px)
            .then_with(|| b.count.cmp(&a.count))
    });
    styles
}

/// Tag-driven classification, first match wins.
pub fn classify_context(el: &ElementSnapshot, size_px: f32) -> TextContext {
    let classes = el.class_attr().to_ascii_lowercase();
    if el.tag == "button"
        || el.role() == Some("button")
        || classes.contains("btn")
        || classes.contains("button")
    {
        TextContext::Button
    } else if el.tag == "a" && el.attr("href").is_some() {
        TextContext::Link
    } else if size_px <= 14.0 {
        TextContext::Caption
    } else {
        TextContext::Heading
    }
}

/// First family plus the remaining fallbacks, quotes stripped.
pub fn split_family(value: &str) -> (String, Vec<String>) {
    let mut families = value
        .split(',')
        .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|f| !f.is_empty());
    let first = families.next().unwrap_or_else(|| "serif".to_string());
    (first, families.collect())
}

pub fn parse_weight(value: &str) -> u16 {
    match value.trim() {
        "normal" => 400,
        "bold" => 700,
        "lighter" => 300,
        "bolder" => 700,
        other => other.parse::<f32>().map(|w| w.round() as u16).unwrap_or(400),
    }
}

/// Unitless ratio for pixel or numeric line-heights; `normal` yields `None`.
pub fn line_height_ratio(value: &str, size_px: f32) -> Option<f32> {
    let value = value.trim();
    if value == "normal" || size_px <= 0.0 {
        return None;
    }
    let ratio = if let Some(px) = value.strip_suffix("px") {
        px.trim().parse::<f32>().ok()? / size_px
    } else {
        value.parse::<f32>().ok()?
    };
    Some((ratio * 100.0).round() / 100.0)
}

fn is_fluid(ctx: &ExtractionContext, el: &ElementSnapshot) -> bool {
    let inline = el
        .attr("style")
        .map(|s| s.to_ascii_lowercase())
        .filter(|s| s.contains("font-size"));
    let declared = declared_value(ctx.style_rules(), el, "font-size");
    [inline, declared].into_iter().flatten().any(|v| {
        v.contains("clamp(") || v.contains("vw") || v.contains("vh") || v.contains("vmin")
    })
}

fn truncate(text: &str, max: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max {
        collapsed
    } else {
        let cut: String = collapsed.chars().take(max).collect();
        format!("{}…", cut.trim_end())
    }
}

/// Hosted services, `@font-face` rules and system stacks.
pub fn font_sources(page: &PageCapture) -> Vec<FontSource> {
    let mut sources: Vec<FontSource> = Vec::new();
    let mut push = |source: FontSource| {
        if !sources
            .iter()
            .any(|s| s.kind == source.kind && s.family.eq_ignore_ascii_case(&source.family))
        {
            sources.push(source);
        }
    };

    for tag in &page.tags {
        let Some(url) = tag.attr("href").or_else(|| tag.attr("src")) else {
            continue;
        };
        for source in hosted_sources(url) {
            push(source);
        }
    }

    for face in &page.stylesheets.font_faces {
        let url = first_url(&face.src);
        let kind = url
            .as_deref()
            .and_then(hosted_kind)
            .unwrap_or(FontSourceKind::SelfHosted);
        push(FontSource {
            kind,
            family: face.family.trim_matches(|c| c == '"' || c == '\'').to_string(),
            format: url.as_deref().and_then(font_format),
            url,
            display: face.display.clone(),
            variable: face
                .weight
                .as_deref()
                .map(|w| w.trim().contains(' '))
                .unwrap_or(false),
        });
    }

    let stack = page
        .body()
        .and_then(|b| b.style.get("font-family"))
        .into_iter()
        .chain(page.root().and_then(|r| r.style.get("font-family")))
        .map(str::to_ascii_lowercase)
        .find(|f| SYSTEM_STACK_MARKERS.iter().any(|m| f.contains(m)));
    if let Some(stack) = stack {
        push(FontSource {
            kind: FontSourceKind::System,
            family: stack,
            url: None,
            format: None,
            display: None,
            variable: false,
        });
    }

    sources
}

fn hosted_kind(url: &str) -> Option<FontSourceKind> {
    let lower = url.to_ascii_lowercase();
    if lower.contains("fonts.googleapis.com") || lower.contains("fonts.gstatic.com") {
        Some(FontSourceKind::GoogleFonts)
    } else if lower.contains("use.typekit.net") || lower.contains("p.typekit.net") {
        Some(FontSourceKind::AdobeFonts)
    } else if lower.contains("fonts.bunny.net") {
        Some(FontSourceKind::BunnyFonts)
    } else if lower.contains("api.fontshare.com") {
        Some(FontSourceKind::Fontshare)
    } else {
        None
    }
}

/// Families named in a hosted font stylesheet URL.
fn hosted_sources(raw: &str) -> Vec<FontSource> {
    let Some(kind) = hosted_kind(raw) else {
        return Vec::new();
    };
    let absolute = if raw.starts_with("//") {
        format!("https:{raw}")
    } else {
        raw.to_string()
    };
    let families: Vec<String> = match url::Url::parse(&absolute) {
        Ok(parsed) => parsed
            .query_pairs()
            .filter(|(k, _)| k == "family" || k == "f[]")
            .flat_map(|(_, v)| {
                v.split('|')
                    .map(|f| {
                        let name = f.split([':', '@']).next().unwrap_or("");
                        name.replace('+', " ").trim().to_string()
                    })
                    .filter(|f| !f.is_empty())
                    .collect::<Vec<_>>()
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    let url = Some(raw.to_string());
    if families.is_empty() {
        if kind == FontSourceKind::GoogleFonts && raw.contains("gstatic") {
            return Vec::new();
        }
        return vec![FontSource {
            kind,
            family: "(kit)".to_string(),
            url,
            format: None,
            display: None,
            variable: false,
        }];
    }
    families
        .into_iter()
        .map(|family| FontSource {
            kind,
            family,
            url: url.clone(),
            format: None,
            display: None,
            variable: raw.contains(".."),
        })
        .collect()
}

fn first_url(src: &str) -> Option<String> {
    let start = src.find("url(")? + 4;
    let end = src[start..].find(')')? + start;
    Some(
        src[start..end]
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .to_string(),
    )
}

fn font_format(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    let ext = path.rsplit('.').next()?;
    let format = match ext {
        "woff2" => "woff2",
        "woff" => "woff",
        "ttf" => "truetype",
        "otf" => "opentype",
        "eot" => "embedded-opentype",
        "svg" => "svg",
        _ => return None,
    };
    Some(format.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{PageBuilder, BODY};
    use crate::types::{FontFaceRule, TagSnapshot};

    #[test]
    fn identical_text_styles_collapse_into_one_entry() {
        let mut b = PageBuilder::new();
        for _ in 0..5 {
            b.element(BODY, "p")
                .styles(&[
                    ("font-family", "\"Inter\", Helvetica, sans-serif"),
                    ("font-size", "16px"),
                    ("font-weight", "400"),
                    ("line-height", "24px"),
                ])
                .text("Paragraph")
                .done();
        }
        b.element(BODY, "h1")
            .styles(&[("font-family", "Inter"), ("font-size", "48px"), ("font-weight", "700")])
            .text("Title")
            .done();
        let styles = text_styles(&b.context());
        assert_eq!(styles.len(), 2);
        assert_eq!(styles[0].size_px, 48.0);
        let body = &styles[1];
        assert_eq!(body.count, 5);
        assert_eq!(body.family, "Inter");
        assert_eq!(body.fallbacks, vec!["Helvetica", "sans-serif"]);
        assert_eq!(body.line_height_ratio, Some(1.5));
        assert_eq!(body.context, TextContext::Heading);
    }

    #[test]
    fn context_classification_is_tag_driven() {
        let mut b = PageBuilder::new();
        let button = b.element(BODY, "a").class("btn").attr("href", "/x").done();
        let link = b.element(BODY, "a").attr("href", "/y").done();
        let small = b.element(BODY, "span").done();
        let page = b.build();
        assert_eq!(classify_context(&page.elements[button], 16.0), TextContext::Button);
        assert_eq!(classify_context(&page.elements[link], 12.0), TextContext::Link);
        assert_eq!(classify_context(&page.elements[small], 12.0), TextContext::Caption);
        assert_eq!(classify_context(&page.elements[small], 18.0), TextContext::Heading);
    }

    #[test]
    fn fluid_sizes_detected_from_rules() {
        let mut b = PageBuilder::new();
        b.element(BODY, "h1")
            .class("display")
            .styles(&[("font-size", "56px")])
            .text("Fluid")
            .done();
        b.rule(".display", &[("font-size", "clamp(2rem, 5vw, 4rem)")]);
        let styles = text_styles(&b.context());
        assert_eq!(styles[0].is_fluid, Some(true));
    }

    #[test]
    fn weights_and_line_heights_parse() {
        assert_eq!(parse_weight("bold"), 700);
        assert_eq!(parse_weight("600"), 600);
        assert_eq!(line_height_ratio("normal", 16.0), None);
        assert_eq!(line_height_ratio("20px", 16.0), Some(1.25));
        assert_eq!(line_height_ratio("1.6", 16.0), Some(1.6));
    }

    #[test]
    fn detects_hosted_self_hosted_and_system_fonts() {
        let mut b = PageBuilder::new();
        {
            let page = b.page_mut();
            page.tags.push(TagSnapshot {
                tag: "link".into(),
                attributes: [(
                    "href".to_string(),
                    "https://fonts.googleapis.com/css2?family=Inter:wght@400;700&family=Roboto+Mono&display=swap".to_string(),
                )]
                .into_iter()
                .collect(),
                text: None,
            });
            page.stylesheets.font_faces.push(FontFaceRule {
                family: "\"Brand Sans\"".into(),
                src: "url(\"/fonts/brand.woff2\") format(\"woff2\")".into(),
                weight: Some("100 900".into()),
                style: None,
                display: Some("swap".into()),
            });
            page.elements[BODY]
                .style
                .insert("font-family", "-apple-system, BlinkMacSystemFont, sans-serif");
        }
        let sources = font_sources(&b.build());
        let google: Vec<&str> = sources
            .iter()
            .filter(|s| s.kind == FontSourceKind::GoogleFonts)
            .map(|s| s.family.as_str())
            .collect();
        assert_eq!(google, vec!["Inter", "Roboto Mono"]);
        let brand = sources
            .iter()
            .find(|s| s.kind == FontSourceKind::SelfHosted)
            .expect("self-hosted face");
        assert_eq!(brand.family, "Brand Sans");
        assert_eq!(brand.format.as_deref(), Some("woff2"));
        assert!(brand.variable);
        assert!(sources.iter().any(|s| s.kind == FontSourceKind::System));
    }
}
