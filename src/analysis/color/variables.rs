//! CSS custom property collection and filtering.

use std::collections::BTreeMap;

use super::palette::is_represented;
use super::parse::{parse_embedded, Rgba};
use crate::types::{ColorEntry, PageCapture};

/// Prefixes of variables injected by CMS presets, vendors and UA defaults.
const NOISE_PREFIXES: &[&str] = &[
    "--wp--preset--",
    "--wp-admin-",
    "--wp-block-",
    "--tw-",
    "--system-",
    "--default-",
    "--webkit-",
    "--moz-",
    "--ms-",
    "--swiper-",
    "--toastify-",
];

const CONSENT_MARKERS: &[&str] = &[
    "cookie", "consent", "onetrust", "--ot-", "--cc-", "--cky-", "didomi", "cookiebot", "--cmp-",
];

const DYNAMIC_FUNCTIONS: &[&str] = &["lighten(", "darken(", "saturate(", "color.adjust("];

/// A custom property holding a usable color.
#[derive(Debug, Clone)]
pub struct ColorVariable {
    pub name: String,
    pub value: String,
    pub rgba: Rgba,
}

/// Root-resolved variables plus any declared in accessible rules, first seen wins.
pub fn collect_variables(page: &PageCapture) -> BTreeMap<String, String> {
    let mut vars = page.css_variables.clone();
    for rule in &page.stylesheets.rules {
        for (name, value) in &rule.declarations {
            if name.starts_with("--") {
                vars.entry(name.clone()).or_insert_with(|| value.clone());
            }
        }
    }
    vars
}

/// Drops noise variables and keeps those whose value is a literal color.
pub fn color_variables(vars: &BTreeMap<String, String>, domain: Option<&str>) -> Vec<ColorVariable> {
    let consent_site = domain
        .map(|d| d.contains("cookie") || d.contains("consent"))
        .unwrap_or(false);

    vars.iter()
        .filter(|(name, _)| !is_noise(name, consent_site))
        .filter_map(|(name, value)| {
            let lower = value.to_ascii_lowercase();
            if DYNAMIC_FUNCTIONS.iter().any(|f| lower.contains(f)) {
                return None;
            }
            let rgba = parse_embedded(value)?;
            if rgba.is_transparent() {
                return None;
            }
            Some(ColorVariable {
                name: name.clone(),
                value: value.trim().to_string(),
                rgba,
            })
        })
        .collect()
}

fn is_noise(name: &str, consent_site: bool) -> bool {
    let lower = name.to_ascii_lowercase();
    if NOISE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return true;
    }
    !consent_site && CONSENT_MARKERS.iter().any(|m| lower.contains(m))
}

/// Variables whose color is not yet in the palette, one name per distinct color.
pub fn unrepresented_variables(
    variables: &[ColorVariable],
    palette: &[ColorEntry],
    distance: f32,
) -> BTreeMap<String, String> {
    let mut kept: Vec<&ColorVariable> = Vec::new();
    for var in variables {
        if is_represented(palette, &var.rgba, distance) {
            continue;
        }
        if kept.iter().any(|k| k.rgba.distance(&var.rgba) < distance) {
            continue;
        }
        kept.push(var);
    }
    kept.into_iter()
        .map(|v| (v.name.clone(), v.value.clone()))
        .collect()
}

/// Roles inferred from variable names (`--color-primary`, `--brand-accent`).
pub fn semantic_roles(variables: &[ColorVariable]) -> BTreeMap<String, String> {
    let mut roles = BTreeMap::new();
    for role in ["primary", "secondary", "accent"] {
        if let Some(var) = variables.iter().find(|v| {
            let name = v.name.to_ascii_lowercase();
            name.contains(role) && !name.contains("foreground") && !name.contains("-fg")
        }) {
            roles.insert(role.to_string(), var.rgba.to_hex());
        }
    }
    roles
}
