//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Piece and UI colours, loadable from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Tetromino colours, one per kind: I, J, L, O, S, T, Z.
    pub pieces: [Color; 7],
    /// Playfield background.
    pub bg: Color,
    /// Borders / dividers.
    pub div_line: Color,
    /// Text (score, lines, level).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text (hints, disabled toggles).
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::neon_default()
    }
}

impl Theme {
    /// Hardcoded neon defaults on a near-black background.
    pub fn neon_default() -> Self {
        Self {
            pieces: [
                parse_hex("#FF0D72").unwrap(), // I / pink
                parse_hex("#0DC2FF").unwrap(), // J / sky
                parse_hex("#0DFF72").unwrap(), // L / green
                parse_hex("#F538FF").unwrap(), // O / magenta
                parse_hex("#FF8E0D").unwrap(), // S / orange
                parse_hex("#FFE138").unwrap(), // T / yellow
                parse_hex("#3877FF").unwrap(), // Z / blue
            ],
            bg: parse_hex("#111111").unwrap(),
            div_line: parse_hex("#444444").unwrap(),
            main_fg: parse_hex("#EEEEEE").unwrap(),
            title: parse_hex("#FFE138").unwrap(),
            inactive_fg: parse_hex("#777777").unwrap(),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to the neon defaults if path is None or file is missing/invalid.
    /// `palette` selects colour variant: Normal (theme), HighContrast, or Colorblind.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Default theme for a palette when no file is loaded.
    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::neon_default();
        t.apply_palette(palette);
        t
    }

    /// Override piece colours for high-contrast or colorblind viewing.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                // Fully saturated colours on dark bg
                self.pieces = [
                    parse_hex("#00FFFF").unwrap(), // I / cyan
                    parse_hex("#0088FF").unwrap(), // J / blue
                    parse_hex("#FF8800").unwrap(), // L / orange
                    parse_hex("#FFFF00").unwrap(), // O / yellow
                    parse_hex("#00FF00").unwrap(), // S / green
                    parse_hex("#FF00FF").unwrap(), // T / magenta
                    parse_hex("#FF0000").unwrap(), // Z / red
                ];
            }
            crate::Palette::Colorblind => {
                // Colorblind-friendly: avoid red/green alone; keep every pair distinct
                self.pieces = [
                    parse_hex("#33BBEE").unwrap(), // I / cyan
                    parse_hex("#0077BB").unwrap(), // J / blue
                    parse_hex("#EE7733").unwrap(), // L / orange
                    parse_hex("#BBBB00").unwrap(), // O / yellow
                    parse_hex("#009988").unwrap(), // S / teal
                    parse_hex("#EE3377").unwrap(), // T / magenta
                    parse_hex("#CC3311").unwrap(), // Z / red
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        // Fallbacks are the neon defaults, per key.
        Self {
            pieces: [
                get("piece_i").unwrap_or_else(|| parse_hex("#FF0D72").unwrap()),
                get("piece_j").unwrap_or_else(|| parse_hex("#0DC2FF").unwrap()),
                get("piece_l").unwrap_or_else(|| parse_hex("#0DFF72").unwrap()),
                get("piece_o").unwrap_or_else(|| parse_hex("#F538FF").unwrap()),
                get("piece_s").unwrap_or_else(|| parse_hex("#FF8E0D").unwrap()),
                get("piece_t").unwrap_or_else(|| parse_hex("#FFE138").unwrap()),
                get("piece_z").unwrap_or_else(|| parse_hex("#3877FF").unwrap()),
            ],
            bg: get("bg").unwrap_or_else(|| parse_hex("#111111").unwrap()),
            div_line: get("div_line").unwrap_or_else(|| parse_hex("#444444").unwrap()),
            main_fg: get("main_fg").unwrap_or_else(|| parse_hex("#EEEEEE").unwrap()),
            title: get("title").unwrap_or_else(|| parse_hex("#FFE138").unwrap()),
            inactive_fg: get("inactive_fg").unwrap_or_else(|| parse_hex("#777777").unwrap()),
        }
    }

    /// Colour for a cell colour index (1..=7, as stored on the board).
    #[inline]
    pub fn piece_color(&self, index: u8) -> Color {
        self.pieces[usize::from(index).saturating_sub(1) % 7]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let (r, g, b) = if s.len() == 6 {
        let r =
            u8::from_str_radix(&s[0..2], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))?;
        let g =
            u8::from_str_radix(&s[2..4], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))?;
        let b =
            u8::from_str_radix(&s[4..6], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))?;
        (r, g, b)
    } else if s.len() == 3 {
        let r = u8::from_str_radix(&s[0..1], 16)
            .map_err(|_| ThemeError::InvalidHex(s.to_string()))?
            * 17;
        let g = u8::from_str_radix(&s[1..2], 16)
            .map_err(|_| ThemeError::InvalidHex(s.to_string()))?
            * 17;
        let b = u8::from_str_radix(&s[2..3], 16)
            .map_err(|_| ThemeError::InvalidHex(s.to_string()))?
            * 17;
        (r, g, b)
    } else {
        return Err(ThemeError::InvalidHex(s.to_string()));
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#FF0D72").unwrap();
        assert!(matches!(c, Color::Rgb(0xFF, 0x0D, 0x72)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#FF0D7").is_err());
        assert!(parse_hex("notahex").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[piece_t]="#AA00AA""##);
        assert_eq!(map.get("piece_t"), Some(&"#AA00AA".to_string()));
    }

    #[test]
    fn test_from_map_overrides_one_piece() {
        let map = parse_theme_file(r##"theme[piece_t]='#AA00AA'"##);
        let theme = Theme::from_map(&map);
        assert!(matches!(theme.pieces[5], Color::Rgb(0xAA, 0x00, 0xAA)));
        // Untouched keys keep their defaults.
        assert_eq!(theme.pieces[0], Theme::neon_default().pieces[0]);
    }

    #[test]
    fn test_piece_color_is_one_based() {
        let theme = Theme::neon_default();
        assert_eq!(theme.piece_color(1), theme.pieces[0]);
        assert_eq!(theme.piece_color(7), theme.pieces[6]);
    }

    #[test]
    fn test_palette_overrides_pieces_not_chrome() {
        let mut theme = Theme::neon_default();
        let bg = theme.bg;
        theme.apply_palette(crate::Palette::Colorblind);
        assert_ne!(theme.pieces[0], Theme::neon_default().pieces[0]);
        assert_eq!(theme.bg, bg);
    }
}
