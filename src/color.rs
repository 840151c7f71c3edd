use palette::{Hsl, IntoColor, Srgb};
use serde::{Deserialize, Serialize};

use crate::error::VizError;

/// Opaque 8-bit RGB triplet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    #[cfg(test)]
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Attach an opacity, clamped to [0, 1].
    pub fn alpha(self, a: f32) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a: a.clamp(0.0, 1.0),
        }
    }

    pub fn opaque(self) -> Rgba {
        self.alpha(1.0)
    }
}

/// RGB color with straight (non pre-multiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 0.0,
    };

    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    /// Same color, opacity scaled by `factor`.
    pub fn fade(self, factor: f32) -> Rgba {
        Rgba {
            a: (self.a * factor).clamp(0.0, 1.0),
            ..self
        }
    }
}

/// Convert HSL (hue in degrees, saturation/lightness 0.0 to 1.0) to RGB
pub fn hsl(hue: f32, saturation: f32, lightness: f32) -> Rgb {
    let hsl = Hsl::new(hue.rem_euclid(360.0), saturation, lightness);
    let rgb: Srgb = hsl.into_color();

    Rgb::new(
        (rgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

/// Interpolate between two colors
pub fn lerp_color(a: Rgba, b: Rgba, t: f32) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Rgba {
        r: mix(a.r, b.r),
        g: mix(a.g, b.g),
        b: mix(a.b, b.b),
        a: a.a + (b.a - a.a) * t,
    }
}

/// Name of the theme that the bars, circle and spectrum modes special-case
/// into a hue sweep instead of reading the palette.
pub const RAINBOW: &str = "rainbow";

/// A named palette shared by every render mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    pub primary: Rgb,
    pub secondary: Rgb,
    pub accent: Rgb,
    pub background: Rgb,
}

impl Theme {
    /// Whether the strategies should take their rainbow branch.
    ///
    /// Keyed on the name: the RGB fields of a theme called "rainbow" are
    /// never consulted by bars, circle or spectrum.
    pub fn is_rainbow(&self) -> bool {
        self.name == RAINBOW
    }
}

pub const THEMES: &[Theme] = &[
    Theme {
        name: "minimal",
        primary: Rgb::new(255, 255, 255),
        secondary: Rgb::new(170, 170, 170),
        accent: Rgb::new(102, 102, 102),
        background: Rgb::new(0, 0, 0),
    },
    Theme {
        name: "neon",
        primary: Rgb::new(0, 255, 255),
        secondary: Rgb::new(255, 0, 255),
        accent: Rgb::new(255, 255, 0),
        background: Rgb::new(10, 0, 20),
    },
    Theme {
        name: "retro",
        primary: Rgb::new(255, 107, 53),
        secondary: Rgb::new(247, 197, 159),
        accent: Rgb::new(0, 78, 137),
        background: Rgb::new(26, 26, 46),
    },
    Theme {
        name: RAINBOW,
        primary: Rgb::new(255, 0, 0),
        secondary: Rgb::new(0, 255, 0),
        accent: Rgb::new(0, 0, 255),
        background: Rgb::new(0, 0, 0),
    },
    Theme {
        name: "ocean",
        primary: Rgb::new(0, 180, 216),
        secondary: Rgb::new(144, 224, 239),
        accent: Rgb::new(0, 119, 182),
        background: Rgb::new(3, 4, 94),
    },
    Theme {
        name: "fire",
        primary: Rgb::new(255, 84, 0),
        secondary: Rgb::new(255, 189, 0),
        accent: Rgb::new(255, 0, 84),
        background: Rgb::new(20, 4, 0),
    },
];

/// Read-only lookup table of themes, populated once at startup.
#[derive(Debug, Clone, Copy)]
pub struct ThemeRegistry {
    themes: &'static [Theme],
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::new(THEMES)
    }
}

impl ThemeRegistry {
    pub fn new(themes: &'static [Theme]) -> Self {
        Self { themes }
    }

    pub fn resolve(&self, name: &str) -> Result<Theme, VizError> {
        let wanted = name.trim();
        self.themes
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| VizError::UnknownTheme(name.to_string()))
    }

    pub fn all(&self) -> &'static [Theme] {
        self.themes
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.themes.iter().map(|t| t.name).collect()
    }

    /// Theme following `current` in registry order, wrapping around.
    pub fn next(&self, current: &Theme) -> Theme {
        let idx = self
            .themes
            .iter()
            .position(|t| t.name == current.name)
            .map(|i| (i + 1) % self.themes.len())
            .unwrap_or(0);
        self.themes.get(idx).copied().unwrap_or(*current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_builtin_themes() {
        let registry = ThemeRegistry::default();
        for name in ["minimal", "neon", "retro", "rainbow"] {
            assert_eq!(registry.resolve(name).unwrap().name, name);
        }
        assert_eq!(registry.resolve("NEON").unwrap().name, "neon");
    }

    #[test]
    fn unknown_theme_is_an_error() {
        let registry = ThemeRegistry::default();
        assert_eq!(
            registry.resolve("sepia"),
            Err(VizError::UnknownTheme("sepia".to_string()))
        );
    }

    #[test]
    fn next_wraps_around() {
        let registry = ThemeRegistry::default();
        let last = *THEMES.last().unwrap();
        assert_eq!(registry.next(&last).name, THEMES[0].name);
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl(0.0, 1.0, 0.5), Rgb::new(255, 0, 0));
        assert_eq!(hsl(120.0, 1.0, 0.5), Rgb::new(0, 255, 0));
        assert_eq!(hsl(240.0, 1.0, 0.5), Rgb::new(0, 0, 255));
        assert_eq!(hsl(360.0, 1.0, 0.5), hsl(0.0, 1.0, 0.5));
    }
}
