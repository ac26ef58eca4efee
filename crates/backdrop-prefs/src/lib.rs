//! Preference model shared by the settings surface and the lock-screen
//! pipeline.
//!
//! The settings side owns the file; the pipeline only ever reads it. Field and
//! variant names are kebab-case, and the names used by older settings builds
//! are accepted as aliases.

use std::fmt;

use anyhow::{Result, ensure};
use serde::Deserialize;
use serde::de::{self, Deserializer, Visitor};

pub use color::ArgbColor;
pub use tint::Tint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundKind {
    /// Leave the host's own lock-screen background alone.
    #[default]
    Default,
    #[serde(alias = "color")]
    SolidColor,
    #[serde(alias = "image")]
    StaticImage,
    #[serde(alias = "see-through")]
    LiveCapture,
}

impl BackgroundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::SolidColor => "solid-color",
            Self::StaticImage => "static-image",
            Self::LiveCapture => "live-capture",
        }
    }
}

impl fmt::Display for BackgroundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Preferences {
    pub background: BackgroundKind,
    pub color: ArgbColor,
    /// Blur slider position, 0..=100.
    pub blur_percent: u32,
    pub tint: Tint,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            background: BackgroundKind::Default,
            color: ArgbColor::BLACK,
            blur_percent: Self::DEFAULT_BLUR_PERCENT,
            tint: Tint::Dark,
        }
    }
}

impl Preferences {
    pub const DEFAULT_BLUR_PERCENT: u32 = 100;
    pub const MAX_BLUR_PERCENT: u32 = 100;

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.blur_percent <= Self::MAX_BLUR_PERCENT,
            "blur-percent must be between 0 and {} (got {})",
            Self::MAX_BLUR_PERCENT,
            self.blur_percent
        );
        Ok(())
    }
}

mod color {
    use super::*;

    /// 32-bit colour packed as `0xAARRGGBB`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ArgbColor(pub u32);

    impl ArgbColor {
        pub const BLACK: Self = Self(0xFF00_0000);

        pub const fn alpha(self) -> u8 {
            (self.0 >> 24) as u8
        }

        pub const fn red(self) -> u8 {
            (self.0 >> 16) as u8
        }

        pub const fn green(self) -> u8 {
            (self.0 >> 8) as u8
        }

        pub const fn blue(self) -> u8 {
            self.0 as u8
        }

        /// Channels in RGBA order.
        pub const fn to_rgba(self) -> [u8; 4] {
            [self.red(), self.green(), self.blue(), self.alpha()]
        }

        pub fn parse_hex(raw: &str) -> Option<Self> {
            let digits = raw.trim().strip_prefix('#')?;
            let value = u32::from_str_radix(digits, 16).ok()?;
            match digits.len() {
                6 => Some(Self(0xFF00_0000 | value)),
                8 => Some(Self(value)),
                _ => None,
            }
        }
    }

    impl Default for ArgbColor {
        fn default() -> Self {
            Self::BLACK
        }
    }

    impl fmt::Display for ArgbColor {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "#{:08X}", self.0)
        }
    }

    impl<'de> Deserialize<'de> for ArgbColor {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            struct ColorVisitor;

            impl<'de> Visitor<'de> for ColorVisitor {
                type Value = ArgbColor;

                fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                    formatter.write_str("a \"#AARRGGBB\" / \"#RRGGBB\" string or a 32-bit integer")
                }

                fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    ArgbColor::parse_hex(value)
                        .ok_or_else(|| E::invalid_value(de::Unexpected::Str(value), &self))
                }

                fn visit_u64<E>(self, value: u64) -> std::result::Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    u32::try_from(value)
                        .map(ArgbColor)
                        .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))
                }

                // Android stores colours as signed ints, so opaque colours are negative.
                fn visit_i64<E>(self, value: i64) -> std::result::Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    i32::try_from(value)
                        .map(|v| ArgbColor(v as u32))
                        .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
                }
            }

            deserializer.deserialize_any(ColorVisitor)
        }
    }
}

mod tint {
    use super::*;

    /// Overlay applied on top of a blurred live capture.
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub enum Tint {
        #[default]
        Dark,
        Light,
        /// Any other stored value. Rendered untinted.
        Unrecognized(String),
    }

    impl Tint {
        /// Overlay colour in RGBA order, or `None` for a pass-through tint.
        pub fn overlay(&self) -> Option<[u8; 4]> {
            match self {
                Self::Dark => Some([0, 0, 0, 127]),
                Self::Light => Some([255, 255, 255, 127]),
                Self::Unrecognized(_) => None,
            }
        }
    }

    impl From<&str> for Tint {
        fn from(raw: &str) -> Self {
            match raw.trim() {
                "dark" => Self::Dark,
                "light" => Self::Light,
                other => Self::Unrecognized(other.to_string()),
            }
        }
    }

    impl<'de> Deserialize<'de> for Tint {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = String::deserialize(deserializer)?;
            Ok(Tint::from(raw.as_str()))
        }
    }
}
