//! Capture types: everything the Playwright helper reads from the live page.
//!
//! A [`PageCapture`] is produced once per extraction run and shared read-only
//! by every analyzer. Element indices are document order and double as the
//! element's position in its element list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fully captured page: baseline elements, stylesheet introspection,
/// interaction probe samples and optional theme/viewport variants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCapture {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    /// Main document response headers, keyed by lower-case name.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub html: String,
    /// Length of the body's rendered text.
    #[serde(default)]
    pub text_length: usize,
    #[serde(default)]
    pub canvas: CanvasInfo,
    #[serde(default)]
    pub elements: Vec<ElementSnapshot>,
    #[serde(default)]
    pub stylesheets: StylesheetSnapshot,
    /// Custom properties declared in accessible stylesheets, resolved on the root element.
    #[serde(default)]
    pub css_variables: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: Vec<TagSnapshot>,
    #[serde(default)]
    pub probe: Vec<ProbeSample>,
    #[serde(default)]
    pub variants: CaptureVariants,
    /// Ids of runtime-global checks that evaluated truthy in page context.
    #[serde(default)]
    pub runtime_globals: Vec<String>,
}

impl PageCapture {
    /// Host of the captured URL, lower-cased.
    pub fn domain(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
    }

    /// The `<body>` element, or the first element when body is missing.
    pub fn body(&self) -> Option<&ElementSnapshot> {
        self.elements
            .iter()
            .find(|el| el.tag == "body")
            .or_else(|| self.elements.first())
    }

    pub fn root(&self) -> Option<&ElementSnapshot> {
        self.elements.iter().find(|el| el.tag == "html")
    }

    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TagSnapshot> + 'a {
        self.tags.iter().filter(move |t| t.tag == name)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasInfo {
    pub count: usize,
    /// Canvases with a WebGL context attached.
    pub webgl: usize,
}

/// Rectangle bounds for an element, in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Computed style property values of one element at one moment.
///
/// Values are kept exactly as the browser reports them (`"rgb(0, 0, 0)"`,
/// `"4px"`, `"0px 0px 4px rgba(...)"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComputedStyle(pub BTreeMap<String, String>);

impl ComputedStyle {
    pub fn get(&self, property: &str) -> Option<&str> {
        self.0
            .get(property)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn get_or<'a>(&'a self, property: &str, default: &'a str) -> &'a str {
        self.get(property).unwrap_or(default)
    }

    /// Leading pixel value of a property (`"12px"` or `"12px 4px"` → 12.0).
    pub fn px(&self, property: &str) -> Option<f32> {
        self.get(property).and_then(parse_px)
    }

    pub fn is_hidden(&self) -> bool {
        let display_none = self.get("display") == Some("none");
        let invisible = matches!(self.get("visibility"), Some("hidden") | Some("collapse"));
        let transparent = self
            .get("opacity")
            .and_then(|o| o.parse::<f32>().ok())
            .map(|o| o <= 0.0)
            .unwrap_or(false);
        display_none || invisible || transparent
    }

    pub fn insert(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.0.insert(property.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ComputedStyle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ComputedStyle(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Parses the first length token of a CSS value as pixels.
pub fn parse_px(value: &str) -> Option<f32> {
    let token = value.split_whitespace().next()?;
    let number = token.strip_suffix("px").unwrap_or(token);
    number.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// One element of the captured DOM.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    pub index: usize,
    #[serde(default)]
    pub parent: Option<usize>,
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Text from the element's own text nodes.
    #[serde(default)]
    pub own_text: String,
    /// Rendered text of the element and its descendants (capped by the capture script).
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub bounds: BoundingBox,
    #[serde(default)]
    pub style: ComputedStyle,
}

impl ElementSnapshot {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    pub fn role(&self) -> Option<&str> {
        self.attr("role").map(str::trim).filter(|r| !r.is_empty())
    }

    pub fn class_attr(&self) -> &str {
        self.attr("class").unwrap_or("")
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.class_attr().split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Lower-cased class, id, tag and data-attribute values used for keyword heuristics.
    pub fn descriptor(&self) -> String {
        let mut out = String::with_capacity(64);
        out.push_str(&self.tag);
        out.push(' ');
        out.push_str(self.class_attr());
        if let Some(id) = self.id() {
            out.push(' ');
            out.push_str(id);
        }
        for (name, value) in &self.attributes {
            if let Some(key) = name.strip_prefix("data-") {
                out.push(' ');
                out.push_str(key);
                out.push(' ');
                out.push_str(value);
            }
        }
        out.to_ascii_lowercase()
    }

    pub fn is_visible(&self) -> bool {
        !self.style.is_hidden()
    }

    /// Visible and occupying space on the page.
    pub fn is_rendered(&self) -> bool {
        self.is_visible() && !self.bounds.is_empty()
    }

    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    pub fn is_svg_shape(&self) -> bool {
        matches!(
            self.tag.as_str(),
            "svg" | "path" | "circle" | "rect" | "ellipse" | "line" | "polyline" | "polygon" | "g" | "use"
        )
    }

    pub fn is_heading(&self) -> bool {
        self.heading_level().is_some()
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self.tag.as_str() {
            "h1" => Some(1),
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            "h5" => Some(5),
            "h6" => Some(6),
            _ => None,
        }
    }
}

/// Walks from an element's parent up to the document root.
pub struct Ancestors<'a> {
    elements: &'a [ElementSnapshot],
    next: Option<usize>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ElementSnapshot;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        let el = self.elements.get(idx)?;
        // guard against malformed parent links pointing forward
        self.next = el.parent.filter(|p| *p < idx);
        Some(el)
    }
}

pub fn ancestors<'a>(elements: &'a [ElementSnapshot], el: &ElementSnapshot) -> Ancestors<'a> {
    Ancestors {
        elements,
        next: el.parent.filter(|p| *p < el.index),
    }
}

pub fn children<'a>(
    elements: &'a [ElementSnapshot],
    el: &'a ElementSnapshot,
) -> impl Iterator<Item = &'a ElementSnapshot> + 'a {
    elements
        .iter()
        .skip(el.index + 1)
        .filter(move |c| c.parent == Some(el.index))
}

/// Descendants in document order (elements after `el` until the subtree ends).
pub fn descendants<'a>(
    elements: &'a [ElementSnapshot],
    el: &'a ElementSnapshot,
) -> impl Iterator<Item = &'a ElementSnapshot> + 'a {
    elements
        .iter()
        .skip(el.index + 1)
        .take_while(move |d| ancestors(elements, d).any(|a| a.index == el.index))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylesheetSnapshot {
    #[serde(default)]
    pub rules: Vec<StyleRule>,
    #[serde(default)]
    pub font_faces: Vec<FontFaceRule>,
    /// Condition text of every `@media` rule.
    #[serde(default)]
    pub media_queries: Vec<String>,
    /// Stylesheets whose rules could not be read (cross-origin).
    #[serde(default)]
    pub blocked: usize,
}

/// A style rule with only the declarations its author explicitly set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRule {
    pub selector: String,
    #[serde(default)]
    pub declarations: BTreeMap<String, String>,
    #[serde(default)]
    pub media: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontFaceRule {
    pub family: String,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
}

/// A `<script>`, `<link>` or `<meta>` tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSnapshot {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl TagSnapshot {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Link,
    Button,
    Input,
    Other,
}

impl ProbeKind {
    /// Input-like and button elements also get a focus interaction.
    pub fn is_focusable_control(&self) -> bool {
        matches!(self, ProbeKind::Button | ProbeKind::Input)
    }
}

/// Styles read before and after a live hover/focus interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeSample {
    /// Index of the probed element in the baseline element list.
    pub element: usize,
    pub kind: ProbeKind,
    pub before: ComputedStyle,
    #[serde(default)]
    pub hover: Option<ComputedStyle>,
    #[serde(default)]
    pub focus: Option<ComputedStyle>,
    #[serde(default)]
    pub hover_error: Option<String>,
    #[serde(default)]
    pub focus_error: Option<String>,
}

/// Element sets re-captured under a forced theme or viewport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureVariants {
    #[serde(default)]
    pub dark: Option<Vec<ElementSnapshot>>,
    #[serde(default)]
    pub mobile: Option<Vec<ElementSnapshot>>,
}
