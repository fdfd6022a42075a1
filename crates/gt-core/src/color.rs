use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Couleur RGB 24 bits, sérialisée en `#rrggbb`.
///
/// # Example
/// ```
/// use gt_core::color::Rgb;
/// let c: Rgb = "#ff8847".parse().unwrap();
/// assert_eq!(c, Rgb::new(0xff, 0x88, 0x47));
/// assert_eq!(c.to_string(), "#ff8847");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Pure black.
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// Pure white.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Build a colour from its three channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a colour from a packed `0xRRGGBB` value (upper byte ignored).
    ///
    /// # Example
    /// ```
    /// use gt_core::color::Rgb;
    /// assert_eq!(Rgb::from_u32(0x00ff41), Rgb::new(0, 255, 65));
    /// ```
    #[must_use]
    pub const fn from_u32(packed: u32) -> Self {
        Self {
            r: ((packed >> 16) & 0xff) as u8,
            g: ((packed >> 8) & 0xff) as u8,
            b: (packed & 0xff) as u8,
        }
    }

    /// Parse `#rrggbb`, `rrggbb` or the short `#rgb` form.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] for anything else.
    pub fn parse_hex(text: &str) -> Result<Self, CoreError> {
        let hex = text.trim().trim_start_matches('#');
        let invalid = || CoreError::Config(format!("couleur invalide : {text:?}"));
        if !hex.is_ascii() {
            return Err(invalid());
        }
        match hex.len() {
            6 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
                Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
            }
            3 => {
                let channel = |i: usize| {
                    u8::from_str_radix(&hex[i..=i], 16)
                        .map(|v| v * 17)
                        .map_err(|_| invalid())
                };
                Ok(Self::new(channel(0)?, channel(1)?, channel(2)?))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl std::str::FromStr for Rgb {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl TryFrom<String> for Rgb {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}
