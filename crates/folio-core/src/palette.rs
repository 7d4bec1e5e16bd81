//! Color tokens used by the folio components.
//!
//! Values follow the Chakra UI default palette so posts look the same in the terminal as they
//! do on the web. Terminals have no alpha channel, so the `*Alpha` tokens are flattened over the
//! surface they are drawn on; each constant names that surface.

use ratatui::style::Color;

pub const WHITE: Color = Color::Rgb(0xFF, 0xFF, 0xFF);
pub const BLACK: Color = Color::Rgb(0x00, 0x00, 0x00);

pub const GRAY_50: Color = Color::Rgb(0xF7, 0xFA, 0xFC);
pub const GRAY_100: Color = Color::Rgb(0xED, 0xF2, 0xF7);
pub const GRAY_200: Color = Color::Rgb(0xE2, 0xE8, 0xF0);
pub const GRAY_300: Color = Color::Rgb(0xCB, 0xD5, 0xE0);
pub const GRAY_400: Color = Color::Rgb(0xA0, 0xAE, 0xC0);
pub const GRAY_500: Color = Color::Rgb(0x71, 0x80, 0x96);
pub const GRAY_600: Color = Color::Rgb(0x4A, 0x55, 0x68);
pub const GRAY_700: Color = Color::Rgb(0x2D, 0x37, 0x48);
pub const GRAY_800: Color = Color::Rgb(0x1A, 0x20, 0x2C);
pub const GRAY_900: Color = Color::Rgb(0x17, 0x19, 0x23);

pub const PURPLE_50: Color = Color::Rgb(0xFA, 0xF5, 0xFF);
pub const PURPLE_100: Color = Color::Rgb(0xE9, 0xD8, 0xFD);
pub const PURPLE_200: Color = Color::Rgb(0xD6, 0xBC, 0xFA);
pub const PURPLE_300: Color = Color::Rgb(0xB7, 0x94, 0xF4);
pub const PURPLE_500: Color = Color::Rgb(0x80, 0x5A, 0xD5);
pub const PURPLE_800: Color = Color::Rgb(0x44, 0x33, 0x7A);
pub const PURPLE_900: Color = Color::Rgb(0x32, 0x26, 0x59);

pub const ORANGE_100: Color = Color::Rgb(0xFE, 0xEB, 0xC8);
pub const ORANGE_200: Color = Color::Rgb(0xFB, 0xD3, 0x8D);
pub const ORANGE_500: Color = Color::Rgb(0xDD, 0x6B, 0x20);
pub const ORANGE_800: Color = Color::Rgb(0x7B, 0x34, 0x1E);

pub const GREEN_100: Color = Color::Rgb(0xC6, 0xF6, 0xD5);
pub const GREEN_200: Color = Color::Rgb(0x9A, 0xE6, 0xB4);
pub const GREEN_800: Color = Color::Rgb(0x22, 0x54, 0x3D);

pub const BLUE_100: Color = Color::Rgb(0xBE, 0xE3, 0xF8);
pub const BLUE_200: Color = Color::Rgb(0x90, 0xCD, 0xF4);
pub const BLUE_800: Color = Color::Rgb(0x2C, 0x52, 0x82);

/// Page background in dark mode.
pub const DARK_SURFACE: Color = GRAY_800;

/// `blackAlpha.500` over `gray.50`.
pub const BLACK_ALPHA_500_ON_GRAY_50: Color = Color::Rgb(0x80, 0x82, 0x83);
/// `whiteAlpha.500` over `gray.900`.
pub const WHITE_ALPHA_500_ON_GRAY_900: Color = Color::Rgb(0x6B, 0x6C, 0x72);
/// `whiteAlpha.100` over the dark page surface.
pub const WHITE_ALPHA_100_ON_DARK: Color = Color::Rgb(0x28, 0x2D, 0x39);
/// `orange.200` at 16% over the dark page surface (warning alert background).
pub const ORANGE_200_16_ON_DARK: Color = Color::Rgb(0x3E, 0x3D, 0x3C);

pub const TWITTER: Color = Color::Rgb(0x1E, 0xA1, 0xF1);
