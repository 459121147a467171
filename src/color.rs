
use std::fmt;
use std::str::FromStr;

use crate::error::ColorError;

const RGB_PREFIX: &str = "rgb:";

/// RGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RgbColor {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parses the `rgb:R,G,B` payload form.
    ///
    /// Components are decimal and must lie in 0..=255. Out-of-range values
    /// are rejected rather than clamped.
    pub fn from_payload(payload: &str) -> Result<Self, ColorError> {
        let body = payload
            .strip_prefix(RGB_PREFIX)
            .ok_or_else(|| ColorError::NotRgb(payload.to_string()))?;
        Self::from_components(body)
    }

    /// Parses a bare `R,G,B` triple.
    pub fn from_components(s: &str) -> Result<Self, ColorError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 3 {
            return Err(ColorError::ComponentCount(parts.len()));
        }
        let red = parse_component(parts[0])?;
        let green = parse_component(parts[1])?;
        let blue = parse_component(parts[2])?;
        Ok(Self::new(red, green, blue))
    }

    /// The command/state payload, e.g. `rgb:255,165,0`.
    pub fn to_payload(&self) -> String {
        format!("{RGB_PREFIX}{},{},{}", self.red, self.green, self.blue)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.red, self.green, self.blue)
    }
}

fn parse_component(s: &str) -> Result<u8, ColorError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ColorError::InvalidComponent(s.to_string()));
    }
    let value: u32 = s
        .parse()
        .map_err(|_| ColorError::InvalidComponent(s.to_string()))?;
    u8::try_from(value).map_err(|_| ColorError::OutOfRange(value))
}

/// Preset colors the strip firmware understands by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedColor {
    Red,
    White,
    Cyan,
    Magenta,
    Green,
    Blue,
}

impl NamedColor {
    pub const ALL: [NamedColor; 6] = [
        Self::Red,
        Self::White,
        Self::Cyan,
        Self::Magenta,
        Self::Green,
        Self::Blue,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::White => "white",
            Self::Cyan => "cyan",
            Self::Magenta => "magenta",
            Self::Green => "green",
            Self::Blue => "blue",
        }
    }

    /// Canonical RGB triple for the preset.
    pub const fn rgb(&self) -> RgbColor {
        match self {
            Self::Red => RgbColor::new(255, 0, 0),
            Self::White => RgbColor::new(255, 255, 255),
            Self::Cyan => RgbColor::new(0, 255, 255),
            Self::Magenta => RgbColor::new(255, 0, 255),
            Self::Green => RgbColor::new(0, 255, 0),
            Self::Blue => RgbColor::new(0, 0, 255),
        }
    }
}

impl fmt::Display for NamedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamedColor {
    type Err = ColorError;

    // Names are matched exactly; the firmware publishes them in lowercase.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ColorError::UnknownName(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_in_range_payload_exactly() {
        let color = RgbColor::from_payload("rgb:255,165,0").unwrap();
        assert_eq!(color, RgbColor::new(255, 165, 0));
        assert_eq!(color.to_payload(), "rgb:255,165,0");
    }

    #[test]
    fn rejects_out_of_range_component() {
        assert_eq!(
            RgbColor::from_payload("rgb:300,0,0"),
            Err(ColorError::OutOfRange(300))
        );
        assert_eq!(
            RgbColor::from_payload("rgb:0,0,256"),
            Err(ColorError::OutOfRange(256))
        );
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert_eq!(
            RgbColor::from_payload("rgb:1,2"),
            Err(ColorError::ComponentCount(2))
        );
        assert!(RgbColor::from_payload("rgb:1,2,3,4").is_err());
        assert!(RgbColor::from_payload("rgb:-1,2,3").is_err());
        assert!(RgbColor::from_payload("rgb: 1,2,3").is_err());
        assert!(RgbColor::from_payload("rgb:,,").is_err());
        assert_eq!(
            RgbColor::from_payload("255,165,0"),
            Err(ColorError::NotRgb("255,165,0".into()))
        );
    }

    #[test]
    fn named_colors_map_to_one_triple_each() {
        let mut seen = std::collections::HashSet::new();
        for color in NamedColor::ALL {
            assert_eq!(color.as_str().parse::<NamedColor>(), Ok(color));
            assert!(seen.insert(color.rgb()), "{color} shares a triple");
        }
        assert_eq!(NamedColor::Cyan.rgb(), RgbColor::new(0, 255, 255));
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!("orange".parse::<NamedColor>().is_err());
        assert!("Red".parse::<NamedColor>().is_err());
        assert!("".parse::<NamedColor>().is_err());
    }

    #[test]
    fn formats_for_display() {
        let color = RgbColor::new(255, 128, 0);
        assert_eq!(color.to_string(), "rgb(255, 128, 0)");
        assert_eq!(color.to_hex(), "#FF8000");
    }
}
