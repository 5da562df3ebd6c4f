use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Browser viewport used for the baseline capture and the mobile re-capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Narrow viewport used by the mobile variant pass.
    pub const MOBILE: Viewport = Viewport {
        width: 390,
        height: 844,
    };
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 900,
        }
    }
}

#[derive(Debug, Error)]
pub enum ViewportParseError {
    #[error("Invalid viewport format: expected WIDTHxHEIGHT (e.g., 1440x900)")]
    InvalidFormat,
    #[error("Invalid width: {0}")]
    InvalidWidth(String),
    #[error("Invalid height: {0}")]
    InvalidHeight(String),
    #[error("Viewport dimensions must be positive")]
    Zero,
}

impl FromStr for Viewport {
    type Err = ViewportParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or(ViewportParseError::InvalidFormat)?;
        if h.contains(['x', 'X']) {
            return Err(ViewportParseError::InvalidFormat);
        }

        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| ViewportParseError::InvalidWidth(w.trim().to_string()))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| ViewportParseError::InvalidHeight(h.trim().to_string()))?;

        if width == 0 || height == 0 {
            return Err(ViewportParseError::Zero);
        }

        Ok(Viewport { width, height })
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_width_and_height() {
        let vp: Viewport = "1440x900".parse().unwrap();
        assert_eq!(vp, Viewport::default());

        let vp: Viewport = " 1920 X 1080 ".parse().unwrap();
        assert_eq!(vp.width, 1920);
        assert_eq!(vp.height, 1080);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("1440".parse::<Viewport>().is_err());
        assert!("1440x900x600".parse::<Viewport>().is_err());
        assert!("abcx900".parse::<Viewport>().is_err());
        assert!("0x900".parse::<Viewport>().is_err());
    }

    #[test]
    fn mobile_preset_displays_as_dimensions() {
        assert_eq!(Viewport::MOBILE.to_string(), "390x844");
    }
}
