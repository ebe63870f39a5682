/// Paint colors.
///
/// The core only ever compares colors for equality, so a plain RGB triple is
/// enough. Presentation converts it to whatever its backend needs.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Option<Color> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Palette used by painter tiles in level files.
    pub fn from_palette(ch: char) -> Option<Color> {
        match ch {
            'r' => Some(Color::rgb(0xe8, 0x3f, 0x5b)),
            'g' => Some(Color::rgb(0x3f, 0xc9, 0x6b)),
            'b' => Some(Color::rgb(0x3f, 0x7f, 0xe8)),
            'y' => Some(Color::rgb(0xf2, 0xc9, 0x3a)),
            'c' => Some(Color::rgb(0x3a, 0xd6, 0xe0)),
            'm' => Some(Color::rgb(0xc9, 0x4f, 0xe0)),
            'o' => Some(Color::rgb(0xf2, 0x8a, 0x2e)),
            'p' => Some(Color::rgb(0xf5, 0x8a, 0xc8)),
            _ => None,
        }
    }

    pub fn is_palette_char(ch: char) -> bool {
        Color::from_palette(ch).is_some()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parses_with_and_without_hash() {
        assert_eq!(Color::from_hex("#ff8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(Color::from_hex("FF8000"), Some(Color::rgb(255, 128, 0)));
    }

    #[test]
    fn bad_hex_is_rejected() {
        assert_eq!(Color::from_hex("#ff80"), None);
        assert_eq!(Color::from_hex("#gg8000"), None);
        assert_eq!(Color::from_hex(""), None);
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(Color::rgb(1, 2, 255).to_string(), "#0102ff");
    }

    #[test]
    fn palette_letters_are_distinct() {
        let letters = ['r', 'g', 'b', 'y', 'c', 'm', 'o', 'p'];
        let colors: Vec<Color> = letters.iter().filter_map(|&c| Color::from_palette(c)).collect();
        assert_eq!(colors.len(), letters.len());
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(!Color::is_palette_char('S'));
    }
}
