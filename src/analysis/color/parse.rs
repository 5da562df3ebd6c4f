//! CSS color literal parsing and normalization.

use once_cell::sync::Lazy;
use palette::{FromColor, Hsl, Srgb};
use regex::Regex;

/// `#hex`, `rgb[a](...)` and `hsl[a](...)` literals.
static COLOR_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)#[0-9a-f]{3,8}\b|rgba?\([^)]*\)|hsla?\([^)]*\)")
        .expect("color token regex is valid")
});

/// A parsed color with 8-bit channels and a 0..=1 alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    pub fn is_opaque(&self) -> bool {
        self.a >= 1.0
    }

    pub fn is_white(&self) -> bool {
        self.r >= 250 && self.g >= 250 && self.b >= 250
    }

    pub fn is_black(&self) -> bool {
        self.r <= 5 && self.g <= 5 && self.b <= 5
    }

    /// Lowercase `#rrggbb`, with a trailing alpha byte when translucent.
    pub fn to_hex(&self) -> String {
        if self.a < 1.0 {
            let alpha = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, alpha)
        } else {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        }
    }

    /// Euclidean distance in RGB space.
    pub fn distance(&self, other: &Rgba) -> f32 {
        let dr = self.r as f32 - other.r as f32;
        let dg = self.g as f32 - other.g as f32;
        let db = self.b as f32 - other.b as f32;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Hue in degrees, saturation and lightness in 0..=1.
    pub fn to_hsl(&self) -> (f32, f32, f32) {
        let rgb: Srgb<f32> = Srgb::new(self.r, self.g, self.b).into_format();
        let hsl: Hsl = Hsl::from_color(rgb);
        (
            hsl.hue.into_positive_degrees(),
            hsl.saturation,
            hsl.lightness,
        )
    }

    /// Composites this color over an opaque background.
    pub fn over(&self, background: &Rgba) -> Rgba {
        let a = self.a.clamp(0.0, 1.0);
        let mix = |fg: u8, bg: u8| (fg as f32 * a + bg as f32 * (1.0 - a)).round() as u8;
        Rgba::opaque(
            mix(self.r, background.r),
            mix(self.g, background.g),
            mix(self.b, background.b),
        )
    }
}

/// Splits a style value into its individual color literals.
pub fn color_tokens(value: &str) -> Vec<&str> {
    COLOR_TOKEN.find_iter(value).map(|m| m.as_str()).collect()
}

/// Parses one color: hex, rgb[a], hsl[a], `transparent` or a named color.
pub fn parse_color(text: &str) -> Option<Rgba> {
    let text = text.trim();
    let lower = text.to_ascii_lowercase();
    if lower == "transparent" {
        return Some(Rgba {
            r: 0,
            g: 0,
            b: 0,
            a: 0.0,
        });
    }
    if let Some(hex) = lower.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(args) = function_args(&lower, "rgba").or_else(|| function_args(&lower, "rgb")) {
        return parse_rgb_args(args);
    }
    if let Some(args) = function_args(&lower, "hsla").or_else(|| function_args(&lower, "hsl")) {
        return parse_hsl_args(args);
    }
    palette::named::from_str(&lower).map(|c| Rgba::opaque(c.red, c.green, c.blue))
}

/// Normalized hex key for a color literal.
pub fn normalize(text: &str) -> Option<String> {
    parse_color(text).map(|c| c.to_hex())
}

/// Parses a value that should hold exactly one color, accepting wrapped forms
/// (`var(--x, #fff)`, `calc(...)`) only when they embed a literal.
pub fn parse_embedded(value: &str) -> Option<Rgba> {
    let trimmed = value.trim();
    if let Some(color) = parse_color(trimmed) {
        return Some(color);
    }
    color_tokens(trimmed).first().and_then(|t| parse_color(t))
}

fn function_args<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    text.strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match hex.len() {
        3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    let a = if expanded.len() == 8 {
        channel(6)? as f32 / 255.0
    } else {
        1.0
    };
    Some(Rgba {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
        a,
    })
}

/// Splits `a, b, c` / `a b c / d` argument lists.
fn split_args(args: &str) -> Vec<&str> {
    args.split([',', '/', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_rgb_args(args: &str) -> Option<Rgba> {
    let parts = split_args(args);
    if parts.len() < 3 {
        return None;
    }
    let channel = |s: &str| -> Option<u8> {
        let v = match s.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().ok()? * 2.55,
            None => s.parse::<f32>().ok()?,
        };
        Some(v.round().clamp(0.0, 255.0) as u8)
    };
    Some(Rgba {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
        a: parts.get(3).map_or(Some(1.0), |s| parse_alpha(s))?,
    })
}

fn parse_hsl_args(args: &str) -> Option<Rgba> {
    let parts = split_args(args);
    if parts.len() < 3 {
        return None;
    }
    let hue = parts[0]
        .trim_end_matches("deg")
        .parse::<f32>()
        .ok()?
        .rem_euclid(360.0);
    let pct = |s: &str| -> Option<f32> {
        let v = s.trim_end_matches('%').parse::<f32>().ok()?;
        Some((v / 100.0).clamp(0.0, 1.0))
    };
    let hsl: Hsl = Hsl::new(hue, pct(parts[1])?, pct(parts[2])?);
    let rgb: Srgb = Srgb::from_color(hsl);
    let rgb: Srgb<u8> = rgb.into_format();
    Some(Rgba {
        r: rgb.red,
        g: rgb.green,
        b: rgb.blue,
        a: parts.get(3).map_or(Some(1.0), |s| parse_alpha(s))?,
    })
}

fn parse_alpha(s: &str) -> Option<f32> {
    let v = match s.strip_suffix('%') {
        Some(pct) => pct.parse::<f32>().ok()? / 100.0,
        None => s.parse::<f32>().ok()?,
    };
    Some(v.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_common_forms() {
        assert_eq!(normalize("rgb(99, 102, 241)").as_deref(), Some("#6366f1"));
        assert_eq!(normalize("#FFF").as_deref(), Some("#ffffff"));
        assert_eq!(normalize("#6366F1").as_deref(), Some("#6366f1"));
        assert_eq!(normalize("rgba(0, 0, 0, 0.5)").as_deref(), Some("#00000080"));
        assert_eq!(normalize("rgb(0 0 0 / 50%)").as_deref(), Some("#00000080"));
        assert_eq!(normalize("red").as_deref(), Some("#ff0000"));
        assert_eq!(normalize("hsl(0, 100%, 50%)").as_deref(), Some("#ff0000"));
        assert_eq!(normalize("hsl(120deg 100% 25%)").as_deref(), Some("#008000"));
        assert!(normalize("not-a-color").is_none());
        assert!(normalize("#12345").is_none());
    }

    #[test]
    fn normalization_is_idempotent() {
        for input in [
            "rgb(12, 34, 56)",
            "rgba(200, 10, 10, 0.25)",
            "hsl(210, 40%, 60%)",
            "#abc",
            "#11223380",
        ] {
            let once = normalize(input).expect(input);
            let twice = normalize(&once).expect(&once);
            assert_eq!(once, twice, "{input}");
        }
    }

    #[test]
    fn tokens_split_multi_value_strings() {
        let tokens = color_tokens("rgb(0, 0, 0) rgb(255, 0, 0) #00ff00 rgba(0,0,0,0)");
        assert_eq!(tokens.len(), 4);
        let gradient = color_tokens("linear-gradient(90deg, #ff0000 0%, hsl(240, 100%, 50%) 100%)");
        assert_eq!(gradient, vec!["#ff0000", "hsl(240, 100%, 50%)"]);
    }

    #[test]
    fn embedded_literal_required_in_wrapped_values() {
        assert!(parse_embedded("var(--brand, #112233)").is_some());
        assert!(parse_embedded("var(--brand)").is_none());
        assert!(parse_embedded("calc(1px + 2px)").is_none());
    }

    #[test]
    fn transparency_and_extremes() {
        assert!(parse_color("transparent").map(|c| c.is_transparent()).unwrap_or(false));
        assert!(parse_color("rgba(0, 0, 0, 0)").map(|c| c.is_transparent()).unwrap_or(false));
        assert!(Rgba::opaque(255, 255, 255).is_white());
        assert!(Rgba::opaque(0, 0, 0).is_black());
        let d = Rgba::opaque(0, 0, 0).distance(&Rgba::opaque(3, 4, 0));
        assert!((d - 5.0).abs() < 1e-4);
    }

    #[test]
    fn compositing_over_white() {
        let half_black = Rgba {
            r: 0,
            g: 0,
            b: 0,
            a: 0.5,
        };
        let mixed = half_black.over(&Rgba::opaque(255, 255, 255));
        assert_eq!(mixed.r, 128);
    }
}
