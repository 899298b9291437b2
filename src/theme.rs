//! Theme colors, with optional overrides from the `[theme]` config table

use ratatui::style::Color;

use crate::config::ThemeConfig;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,       // Active borders, keys, selection marker
    pub success: Color,      // "Copied!" label, verification notes
    pub danger: Color,       // Copy failures
    pub text: Color,         // Primary text
    pub text_dim: Color,     // Descriptions, hints
    pub command: Color,      // Command text
    pub bg_selected: Color,  // Selection background
    pub inactive: Color,     // Inactive borders and tabs
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired
        Self {
            accent: Color::Rgb(250, 179, 135),
            success: Color::Rgb(166, 218, 149),
            danger: Color::Rgb(243, 139, 168),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            command: Color::Rgb(137, 220, 235),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
        }
    }
}

impl Theme {
    /// Defaults with any valid overrides applied
    pub fn from_config(config: &ThemeConfig) -> Self {
        let mut theme = Self::default();

        let overrides = [
            (&config.accent, &mut theme.accent, "accent"),
            (&config.success, &mut theme.success, "success"),
            (&config.danger, &mut theme.danger, "danger"),
            (&config.text, &mut theme.text, "text"),
            (&config.text_dim, &mut theme.text_dim, "text_dim"),
        ];

        for (value, slot, key) in overrides {
            let Some(value) = value else { continue };
            match parse_hex_color(value) {
                Some(color) => *slot = color,
                None => tracing::warn!("Ignoring invalid theme color {} = {:?}", key, value),
            }
        }

        theme
    }
}

/// Parse a hex color string (#RRGGBB or #RGB)
fn parse_hex_color(s: &str) -> Option<Color> {
    let s = s.trim().trim_start_matches('#');

    if s.len() == 6 {
        let r = u8::from_str_radix(s.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(s.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(s.get(4..6)?, 16).ok()?;
        Some(Color::Rgb(r, g, b))
    } else if s.len() == 3 {
        let r = u8::from_str_radix(s.get(0..1)?, 16).ok()? * 17;
        let g = u8::from_str_radix(s.get(1..2)?, 16).ok()? * 17;
        let b = u8::from_str_radix(s.get(2..3)?, 16).ok()? * 17;
        Some(Color::Rgb(r, g, b))
    } else {
        None
    }
}
