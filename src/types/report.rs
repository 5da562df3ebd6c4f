//! Report types produced by the analyzers.
//!
//! Field names follow the published report contract (`colors`, `typography`,
//! `spacing`, `borderRadius`, ...), so every struct serializes in camelCase.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Partial style record: property name → value.
pub type StyleRecord = BTreeMap<String, String>;

/// Coarse usage-derived label, not a probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Count tiers used by the layout metrics: >10 high, >3 medium.
    pub fn from_count(count: usize) -> Self {
        if count > 10 {
            Confidence::High
        } else if count > 3 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    /// Score tiers used by the palette: >20 high, >5 medium.
    pub fn from_score(score: f32) -> Self {
        if score > 20.0 {
            Confidence::High
        } else if score > 5.0 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

// ============================================================================
// Colors
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorEntry {
    /// First-seen textual form of the color.
    pub original_text: String,
    pub normalized_hex: String,
    pub occurrence_count: usize,
    pub semantic_score: f32,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradientEntry {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteResult {
    /// Role (primary, secondary, accent, link, text, background) → color.
    pub semantic_colors: BTreeMap<String, String>,
    pub palette: Vec<ColorEntry>,
    pub css_variables: BTreeMap<String, String>,
    pub gradients: Vec<GradientEntry>,
}

impl PaletteResult {
    pub fn find(&self, hex: &str) -> Option<&ColorEntry> {
        self.palette.iter().find(|c| c.normalized_hex == hex)
    }
}

// ============================================================================
// Typography
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextContext {
    Heading,
    Button,
    Link,
    Caption,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypographyStyle {
    pub context: TextContext,
    pub family: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<String>,
    pub size_px: f32,
    pub weight: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height_ratio: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_fluid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_features: Option<String>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontSourceKind {
    GoogleFonts,
    AdobeFonts,
    BunnyFonts,
    Fontshare,
    SelfHosted,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSource {
    pub kind: FontSourceKind,
    pub family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default)]
    pub variable: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypographyResult {
    pub styles: Vec<TypographyStyle>,
    pub sources: Vec<FontSource>,
}

// ============================================================================
// Layout metrics
// ============================================================================

/// A tallied style value (spacing, radius, shadow).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageValue {
    pub value: String,
    pub count: usize,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub element_contexts: Vec<String>,
}

impl UsageValue {
    pub fn new(value: impl Into<String>, count: usize) -> Self {
        Self {
            value: value.into(),
            count,
            confidence: Confidence::from_count(count),
            element_contexts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacingScale {
    /// Base unit when the most frequent values sit on an 8px or 4px grid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<u32>,
    pub values: Vec<UsageValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderCombo {
    pub width: String,
    pub style: String,
    pub color: String,
    pub count: usize,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub element_contexts: Vec<String>,
}

impl BorderCombo {
    pub fn value(&self) -> String {
        format!("{} {} {}", self.width, self.style, self.color)
    }
}

// ============================================================================
// Components
// ============================================================================

/// Default style plus partial pseudo-state records (only differing properties).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStates {
    pub default: StyleRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover: Option<StyleRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<StyleRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<StyleRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visited: Option<StyleRecord>,
}

/// Where a state record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateSource {
    Stylesheet,
    Probe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonStyle {
    pub tag: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<String>,
    pub states: ComponentStates,
    pub confidence: Confidence,
    /// States backed by live interaction rather than stylesheet matching.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measured_states: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ThemeMode>,
    /// Indices of every element collapsed into this entry.
    #[serde(skip)]
    pub elements: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Checkbox,
    Radio,
    Select,
    Date,
    File,
    Range,
}

impl InputKind {
    pub fn cap(&self) -> usize {
        match self {
            InputKind::Text => 8,
            InputKind::Checkbox | InputKind::Radio | InputKind::Select => 5,
            InputKind::Date | InputKind::File | InputKind::Range => 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputStyle {
    pub kind: InputKind,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    pub states: ComponentStates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_color: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measured_states: Vec<String>,
    #[serde(skip)]
    pub elements: Vec<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputGroups {
    pub text: Vec<InputStyle>,
    pub checkbox: Vec<InputStyle>,
    pub radio: Vec<InputStyle>,
    pub select: Vec<InputStyle>,
    pub date: Vec<InputStyle>,
    pub file: Vec<InputStyle>,
    pub range: Vec<InputStyle>,
}

impl InputGroups {
    pub fn group(&self, kind: InputKind) -> &Vec<InputStyle> {
        match kind {
            InputKind::Text => &self.text,
            InputKind::Checkbox => &self.checkbox,
            InputKind::Radio => &self.radio,
            InputKind::Select => &self.select,
            InputKind::Date => &self.date,
            InputKind::File => &self.file,
            InputKind::Range => &self.range,
        }
    }

    pub fn group_mut(&mut self, kind: InputKind) -> &mut Vec<InputStyle> {
        match kind {
            InputKind::Text => &mut self.text,
            InputKind::Checkbox => &mut self.checkbox,
            InputKind::Radio => &mut self.radio,
            InputKind::Select => &mut self.select,
            InputKind::Date => &mut self.date,
            InputKind::File => &mut self.file,
            InputKind::Range => &mut self.range,
        }
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut InputStyle> {
        self.text
            .iter_mut()
            .chain(self.checkbox.iter_mut())
            .chain(self.radio.iter_mut())
            .chain(self.select.iter_mut())
            .chain(self.date.iter_mut())
            .chain(self.file.iter_mut())
            .chain(self.range.iter_mut())
    }

    pub fn len(&self) -> usize {
        self.text.len()
            + self.checkbox.len()
            + self.radio.len()
            + self.select.len()
            + self.date.len()
            + self.file.len()
            + self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkContext {
    Navigation,
    Footer,
    Breadcrumb,
    Button,
    Inline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStyle {
    /// Normalized text color, the dedup key.
    pub color: String,
    pub context: LinkContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    pub states: ComponentStates,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measured_states: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ThemeMode>,
    #[serde(skip)]
    pub elements: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    Success,
    Warning,
    Error,
    Info,
    Neutral,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeEntry {
    pub text: String,
    pub variant: BadgeVariant,
    pub style: StyleRecord,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormLayout {
    Vertical,
    Horizontal,
    Inline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub has_label: bool,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDescriptor {
    pub fields: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_text: Option<String>,
    pub layout: FormLayout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub has_labels: bool,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    pub buttons: Vec<ButtonStyle>,
    pub inputs: InputGroups,
    pub links: Vec<LinkStyle>,
    pub badges: Vec<BadgeEntry>,
    pub forms: Vec<FormDescriptor>,
}

// ============================================================================
// Breakpoints, icons, frameworks
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    pub name: String,
    pub px: u32,
    pub queries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconLibrary {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconSystem {
    pub libraries: Vec<IconLibrary>,
    pub inline_svg: usize,
    pub sprite_refs: usize,
}

impl IconSystem {
    pub fn primary(&self) -> Option<&str> {
        self.libraries.first().map(|l| l.name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkHint {
    pub name: String,
    pub confidence: Confidence,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<String>,
}

// ============================================================================
// Accessibility
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContrastSample {
    pub foreground: String,
    pub background: String,
    pub ratio: f32,
    pub large_text: bool,
    #[serde(rename = "passesAA")]
    pub passes_aa: bool,
    #[serde(rename = "passesAAA")]
    pub passes_aaa: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingEntry {
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AriaCounts {
    pub landmarks: usize,
    pub labels: usize,
    pub described_by: usize,
    pub live_regions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityIssue {
    pub severity: IssueSeverity,
    /// Stable machine-readable kind, e.g. `contrast`, `missing-alt`.
    pub kind: String,
    pub message: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub score: u32,
    pub errors: usize,
    pub warnings: usize,
    #[serde(rename = "passesMinimumAA")]
    pub passes_minimum_aa: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityAudit {
    pub color_contrast_samples: Vec<ContrastSample>,
    pub missing_alt_count: usize,
    pub missing_label_count: usize,
    pub heading_structure: Vec<HeadingEntry>,
    pub missing_focus_indicator_count: usize,
    pub aria_counts: AriaCounts,
    pub issues: Vec<AccessibilityIssue>,
    pub summary: AuditSummary,
}

// ============================================================================
// Tech fingerprinting
// ============================================================================

/// A rule-store match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechMatch {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSource {
    Pattern,
    Runtime,
}

/// A built-in table detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedTech {
    pub category: String,
    pub name: String,
    pub source: DetectionSource,
}

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStats {
    pub elements: usize,
    pub stylesheet_rules: usize,
    pub blocked_stylesheets: usize,
    pub probed_elements: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignReport {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub colors: PaletteResult,
    pub typography: TypographyResult,
    pub spacing: SpacingScale,
    pub border_radius: Vec<UsageValue>,
    pub borders: Vec<BorderCombo>,
    pub shadows: Vec<UsageValue>,
    pub components: Components,
    pub breakpoints: Vec<Breakpoint>,
    pub icon_system: IconSystem,
    pub frameworks: Vec<FrameworkHint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<AccessibilityAudit>,
    pub tech_stack: Vec<TechMatch>,
    pub detected_tech: Vec<DetectedTech>,
    #[serde(default)]
    pub is_canvas_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub stats: ExtractionStats,
}
