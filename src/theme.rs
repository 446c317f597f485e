//! The process-wide plotting theme.
//!
//! This is the one piece of global state in the crate: figures read it once
//! when they are created and carry the result with them.

use std::str::FromStr;
use std::sync::RwLock;

use crate::color::Rgb;
use crate::error::PlotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Default,
    Light,
    Dark,
}

static ACTIVE_THEME: RwLock<Theme> = RwLock::new(Theme::Default);

/// Set the theme used by every figure created afterwards.
pub fn set_theme(theme: Theme) {
    match ACTIVE_THEME.write() {
        Ok(mut t) => *t = theme,
        Err(poisoned) => *poisoned.into_inner() = theme,
    }
    log::debug!("Active theme set to {theme:?}");
}

/// The theme new figures will use.
pub fn active_theme() -> Theme {
    match ACTIVE_THEME.read() {
        Ok(t) => *t,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

impl Theme {
    pub fn background(self) -> Rgb {
        match self {
            Theme::Default | Theme::Light => Rgb::new(255, 255, 255),
            Theme::Dark => Rgb::new(0x1e, 0x1e, 0x1e),
        }
    }

    pub fn foreground(self) -> Rgb {
        match self {
            Theme::Default | Theme::Light => Rgb::new(0, 0, 0),
            Theme::Dark => Rgb::new(0xe6, 0xe6, 0xe6),
        }
    }

    pub fn grid(self) -> Rgb {
        match self {
            Theme::Default => Rgb::new(0xff, 0xff, 0xff),
            Theme::Light => Rgb::new(0xdd, 0xdd, 0xdd),
            Theme::Dark => Rgb::new(0x44, 0x44, 0x44),
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }
}

impl FromStr for Theme {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Theme::Default),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(PlotError::UnknownTheme(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn setter_round_trip() {
        set_theme(Theme::Dark);
        assert_eq!(active_theme(), Theme::Dark);
        set_theme(Theme::Default);
        assert_eq!(active_theme(), Theme::Default);
    }

    #[test]
    fn parse_names() {
        assert_eq!("Light".parse::<Theme>().unwrap(), Theme::Light);
        assert!("solarized".parse::<Theme>().is_err());
    }
}
