//! Theme configuration and color-mode resolution.
//!
//! A [`ThemeConfig`] is built once at startup and never mutated afterwards. Every render call
//! receives it through a [`RenderContext`] together with the active [`ColorMode`], so components
//! never read a global theme.
//!
//! ```rust
//! use folio_core::theme::{ColorMode, RenderContext, ThemeConfig};
//!
//! let theme = ThemeConfig::default();
//! let mode = theme.color_mode.resolve(Some(ColorMode::Dark));
//! let ctx = RenderContext::new(&theme, mode);
//! assert_eq!(ctx.mode("gray.50", "gray.700"), "gray.700");
//! ```
use std::collections::BTreeMap;

use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use serde::Deserialize;

use crate::error::Result;
use crate::palette;

/// Environment variable that forces a color mode (`light` or `dark`).
pub const COLOR_MODE_ENV: &str = "FOLIO_COLOR_MODE";

const BASE_FONT_STACK: &str = "-apple-system, BlinkMacSystemFont, \"Segoe UI\", Helvetica, Arial, sans-serif, \"Apple Color Emoji\", \"Segoe UI Emoji\", \"Segoe UI Symbol\"";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Light,
    Dark,
}

impl ColorMode {
    /// Selects the value for this mode.
    pub fn pick<T>(self, light: T, dark: T) -> T {
        match self {
            ColorMode::Light => light,
            ColorMode::Dark => dark,
        }
    }

    pub fn toggle(self) -> Self {
        self.pick(ColorMode::Dark, ColorMode::Light)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(ColorMode::Light),
            "dark" => Some(ColorMode::Dark),
            _ => None,
        }
    }

    /// Interprets a `COLORFGBG` value (`"fg;bg"` or `"fg;default;bg"`).
    ///
    /// Background indices 0-6 and 8 are dark, 7 and 9-15 are light.
    pub fn from_colorfgbg(value: &str) -> Option<Self> {
        let bg = value.rsplit(';').next()?.trim().parse::<u8>().ok()?;
        match bg {
            0..=6 | 8 => Some(ColorMode::Dark),
            7 | 9..=15 => Some(ColorMode::Light),
            _ => None,
        }
    }

    /// The terminal's preference, if it advertises one.
    pub fn detect_system() -> Option<Self> {
        std::env::var("COLORFGBG")
            .ok()
            .as_deref()
            .and_then(Self::from_colorfgbg)
    }
}

/// How the initial color mode is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColorModeConfig {
    pub initial_color_mode: ColorMode,
    /// Whether a known system preference overrides `initial_color_mode`.
    pub use_system_color_mode: bool,
}

impl Default for ColorModeConfig {
    fn default() -> Self {
        Self {
            initial_color_mode: ColorMode::Light,
            use_system_color_mode: true,
        }
    }
}

impl ColorModeConfig {
    pub fn resolve(&self, system: Option<ColorMode>) -> ColorMode {
        match system {
            Some(mode) if self.use_system_color_mode => mode,
            _ => self.initial_color_mode,
        }
    }

    /// Resolves against the process environment: [`COLOR_MODE_ENV`] first, then `COLORFGBG`.
    pub fn resolve_from_env(&self) -> ColorMode {
        let forced = std::env::var(COLOR_MODE_ENV)
            .ok()
            .as_deref()
            .and_then(ColorMode::parse);
        if let Some(mode) = forced {
            tracing::debug!(?mode, "color mode forced by {COLOR_MODE_ENV}");
            return mode;
        }
        let mode = self.resolve(ColorMode::detect_system());
        tracing::debug!(?mode, "resolved color mode");
        mode
    }
}

/// A light/dark color pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeColor {
    pub light: Color,
    pub dark: Color,
}

impl ModeColor {
    pub const fn new(light: Color, dark: Color) -> Self {
        Self { light, dark }
    }

    pub fn resolve(self, mode: ColorMode) -> Color {
        mode.pick(self.light, self.dark)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontSize {
    Xs,
    Sm,
    Md,
    Lg,
    Xl,
    Xxl,
    Xxxl,
}

impl FontSize {
    /// Terminal rendition of a font size.
    pub fn modifiers(self) -> Modifier {
        match self {
            FontSize::Xxxl | FontSize::Xxl => Modifier::BOLD | Modifier::UNDERLINED,
            FontSize::Xl | FontSize::Lg | FontSize::Md => Modifier::BOLD,
            FontSize::Sm | FontSize::Xs => Modifier::BOLD | Modifier::ITALIC,
        }
    }
}

/// Named style bundles applied to rich-text elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleBundle {
    H1,
    H2,
    H3,
    H4,
    P,
    Ul,
    Hr,
    Code,
}

impl StyleBundle {
    /// The bundle for a heading level; levels past 4 share the h4 bundle.
    pub fn heading(level: u8) -> Self {
        match level {
            0 | 1 => StyleBundle::H1,
            2 => StyleBundle::H2,
            3 => StyleBundle::H3,
            _ => StyleBundle::H4,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BundleAttrs {
    pub font_size: Option<FontSize>,
    /// Letter spacing in px. Kept for parity with the web theme; terminals cannot honor it.
    pub letter_spacing: Option<f32>,
    /// Blank lines before the element.
    pub margin_top: u16,
    /// Blank lines after the element.
    pub margin_bottom: u16,
}

impl BundleAttrs {
    pub fn modifiers(&self) -> Modifier {
        self.font_size
            .map(FontSize::modifiers)
            .unwrap_or_else(Modifier::empty)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MdxBundles {
    pub h1: BundleAttrs,
    pub h2: BundleAttrs,
    pub h3: BundleAttrs,
    pub h4: BundleAttrs,
    pub p: BundleAttrs,
    pub ul: BundleAttrs,
    pub hr: BundleAttrs,
    pub code: BundleAttrs,
}

impl Default for MdxBundles {
    fn default() -> Self {
        let heading = |font_size, letter_spacing| BundleAttrs {
            font_size: Some(font_size),
            letter_spacing: Some(letter_spacing),
            margin_top: 1,
            margin_bottom: 1,
        };
        Self {
            h1: heading(FontSize::Xxxl, 1.0),
            h2: heading(FontSize::Xl, 0.8),
            h3: heading(FontSize::Md, 0.6),
            h4: heading(FontSize::Xs, 0.5),
            p: BundleAttrs {
                margin_bottom: 1,
                ..BundleAttrs::default()
            },
            ul: BundleAttrs {
                margin_bottom: 1,
                ..BundleAttrs::default()
            },
            hr: BundleAttrs {
                margin_top: 1,
                margin_bottom: 1,
                ..BundleAttrs::default()
            },
            code: BundleAttrs::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Fonts {
    pub heading: String,
    pub body: String,
}

impl Default for Fonts {
    fn default() -> Self {
        Self {
            heading: format!("Cal Sans, {BASE_FONT_STACK}"),
            body: format!("Inter, {BASE_FONT_STACK}"),
        }
    }
}

/// Base styles of the `Heading` and `Text` components.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComponentStyles {
    pub heading: ModeColor,
    pub heading_letter_spacing: f32,
    pub text: ModeColor,
}

impl Default for ComponentStyles {
    fn default() -> Self {
        Self {
            heading: ModeColor::new(palette::GRAY_700, palette::WHITE),
            heading_letter_spacing: 1.0,
            text: ModeColor::new(palette::GRAY_700, palette::WHITE),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThemeColors {
    pub twitter: Color,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            twitter: palette::TWITTER,
        }
    }
}

/// The site theme: color-mode policy, fonts, sizes, component base styles and the rich-text
/// style bundles.
#[derive(Clone, Debug, PartialEq)]
pub struct ThemeConfig {
    pub color_mode: ColorModeConfig,
    pub fonts: Fonts,
    pub sizes: BTreeMap<String, String>,
    pub components: ComponentStyles,
    pub colors: ThemeColors,
    pub mdx: MdxBundles,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            color_mode: ColorModeConfig::default(),
            fonts: Fonts::default(),
            sizes: BTreeMap::from([("18".to_string(), "4.5rem".to_string())]),
            components: ComponentStyles::default(),
            colors: ThemeColors::default(),
            mdx: MdxBundles::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThemeOverrides {
    color_mode: Option<ColorModeConfig>,
    fonts: Option<Fonts>,
    sizes: BTreeMap<String, String>,
}

impl ThemeConfig {
    /// Builds the default theme with overrides from a TOML document.
    ///
    /// Recognized tables: `[color_mode]`, `[fonts]`, `[sizes]`. Unknown keys are ignored.
    pub fn from_toml(source: &str) -> Result<Self> {
        let overrides: ThemeOverrides = toml::from_str(source)?;
        let mut theme = Self::default();
        if let Some(color_mode) = overrides.color_mode {
            theme.color_mode = color_mode;
        }
        if let Some(fonts) = overrides.fonts {
            theme.fonts = fonts;
        }
        theme.sizes.extend(overrides.sizes);
        Ok(theme)
    }

    pub fn bundle(&self, bundle: StyleBundle) -> &BundleAttrs {
        match bundle {
            StyleBundle::H1 => &self.mdx.h1,
            StyleBundle::H2 => &self.mdx.h2,
            StyleBundle::H3 => &self.mdx.h3,
            StyleBundle::H4 => &self.mdx.h4,
            StyleBundle::P => &self.mdx.p,
            StyleBundle::Ul => &self.mdx.ul,
            StyleBundle::Hr => &self.mdx.hr,
            StyleBundle::Code => &self.mdx.code,
        }
    }
}

/// Everything a component needs to pick its styles: the theme and the active color mode.
#[derive(Clone, Copy, Debug)]
pub struct RenderContext<'a> {
    pub color_mode: ColorMode,
    pub theme: &'a ThemeConfig,
}

impl<'a> RenderContext<'a> {
    pub fn new(theme: &'a ThemeConfig, color_mode: ColorMode) -> Self {
        Self { color_mode, theme }
    }

    pub fn with_color_mode(self, color_mode: ColorMode) -> Self {
        Self { color_mode, ..self }
    }

    pub fn mode<T>(&self, light: T, dark: T) -> T {
        self.color_mode.pick(light, dark)
    }

    pub fn color(&self, color: ModeColor) -> Color {
        color.resolve(self.color_mode)
    }

    pub fn heading_style(&self) -> Style {
        Style::default()
            .fg(self.color(self.theme.components.heading))
            .add_modifier(Modifier::BOLD)
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.color(self.theme.components.text))
    }

    pub fn bundle(&self, bundle: StyleBundle) -> &'a BundleAttrs {
        self.theme.bundle(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_preference_wins_only_when_honored() {
        let honored = ColorModeConfig::default();
        assert_eq!(honored.resolve(Some(ColorMode::Dark)), ColorMode::Dark);
        assert_eq!(honored.resolve(None), ColorMode::Light);

        let ignored = ColorModeConfig {
            use_system_color_mode: false,
            ..ColorModeConfig::default()
        };
        assert_eq!(ignored.resolve(Some(ColorMode::Dark)), ColorMode::Light);
    }

    #[test]
    fn parses_colorfgbg() {
        assert_eq!(ColorMode::from_colorfgbg("15;0"), Some(ColorMode::Dark));
        assert_eq!(ColorMode::from_colorfgbg("0;15"), Some(ColorMode::Light));
        assert_eq!(ColorMode::from_colorfgbg("0;default;7"), Some(ColorMode::Light));
        assert_eq!(ColorMode::from_colorfgbg("garbage"), None);
        assert_eq!(ColorMode::from_colorfgbg("0;200"), None);
    }

    #[test]
    fn default_theme_matches_site_config() {
        let theme = ThemeConfig::default();
        assert_eq!(theme.color_mode.initial_color_mode, ColorMode::Light);
        assert!(theme.color_mode.use_system_color_mode);
        assert!(theme.fonts.heading.starts_with("Cal Sans, "));
        assert!(theme.fonts.body.starts_with("Inter, "));
        assert_eq!(theme.sizes.get("18").map(String::as_str), Some("4.5rem"));
        assert_eq!(theme.colors.twitter, Color::Rgb(0x1E, 0xA1, 0xF1));
        assert_eq!(theme.bundle(StyleBundle::H1).font_size, Some(FontSize::Xxxl));
        assert_eq!(theme.bundle(StyleBundle::H2).letter_spacing, Some(0.8));
        assert_eq!(theme.bundle(StyleBundle::H4).font_size, Some(FontSize::Xs));
    }

    #[test]
    fn toml_overrides_keep_other_defaults() {
        let theme = ThemeConfig::from_toml(
            r#"
            [color_mode]
            initial_color_mode = "dark"
            use_system_color_mode = false

            [fonts]
            heading = "Iosevka"
            "#,
        )
        .expect("valid theme");
        assert_eq!(theme.color_mode.resolve(Some(ColorMode::Light)), ColorMode::Dark);
        assert_eq!(theme.fonts.heading, "Iosevka");
        assert!(theme.fonts.body.starts_with("Inter, "));
        assert_eq!(theme.mdx, MdxBundles::default());
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = ThemeConfig::from_toml("[color_mode]\ninitial_color_mode = \"sepia\"\n");
        assert!(matches!(err, Err(crate::error::Error::Config(_))));
    }

    #[test]
    fn context_selects_by_mode() {
        let theme = ThemeConfig::default();
        let light = RenderContext::new(&theme, ColorMode::Light);
        let dark = light.with_color_mode(ColorMode::Dark);
        assert_eq!(light.heading_style().fg, Some(palette::GRAY_700));
        assert_eq!(dark.heading_style().fg, Some(palette::WHITE));
        assert_eq!(light.heading_style().add_modifier, dark.heading_style().add_modifier);
        assert_eq!(dark.color_mode.toggle(), ColorMode::Light);
    }
}
