// Theme identifiers and the palettes behind them.
use crate::error::SiteError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub const ALL: [Theme; 2] = [Theme::Light, Theme::Dark];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn opposite(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn data(self) -> ThemeData {
        match self {
            Theme::Light => ThemeData::morning_coffee(),
            Theme::Dark => ThemeData::evening_tea(),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(SiteError::UnknownTheme(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,
    #[serde(rename = "cardBg")]
    pub card_bg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeData {
    pub name: String,
    pub icon: String, // inline SVG markup
    pub colors: ThemeColors,
}

impl ThemeData {
    pub fn morning_coffee() -> Self {
        Self {
            name: "Morning Coffee".to_string(),
            icon: LIGHT_ICON.to_string(),
            colors: ThemeColors {
                primary: "#2d221b".to_string(),
                secondary: "#a1866f".to_string(),
                accent: "#f7efe2".to_string(),
                background: "rgba(45, 34, 27, 0.85)".to_string(),
                text: "#f7efe2".to_string(),
                card_bg: "rgba(60, 40, 25, 0.18)".to_string(),
            },
        }
    }

    pub fn evening_tea() -> Self {
        Self {
            name: "Evening Tea".to_string(),
            icon: DARK_ICON.to_string(),
            colors: ThemeColors {
                primary: "#1a1a1a".to_string(),
                secondary: "#4a3728".to_string(),
                accent: "#8b7355".to_string(),
                background: "rgba(26, 26, 26, 0.9)".to_string(),
                text: "#d4c4a8".to_string(),
                card_bg: "rgba(40, 30, 20, 0.25)".to_string(),
            },
        }
    }
}

// Coffee with milk.
const LIGHT_ICON: &str = r##"<svg width="28" height="28" viewBox="0 0 24 24" fill="none" xmlns="http://www.w3.org/2000/svg"><path d="M2 21h20v-2H2v2zM20 8h-2V5c0-1.1-.9-2-2-2H4c-1.1 0-2 .9-2 2v3H0v2c0 2.21 1.79 4 4 4h1v3c0 1.1.9 2 2 2h8c1.1 0 2-.9 2-2v-3h1c2.21 0 4-1.79 4-4v-2zM16 5v3H4V5h12zM6 19v-6h6v6H6z" fill="#f7efe2"/><circle cx="9" cy="13" r="1.5" fill="#a1866f" opacity="0.8"/><circle cx="7" cy="15" r="1" fill="#d4c4a8" opacity="0.6"/><circle cx="11" cy="15" r="1" fill="#d4c4a8" opacity="0.6"/></svg>"##;

// Black coffee.
const DARK_ICON: &str = r##"<svg width="28" height="28" viewBox="0 0 24 24" fill="none" xmlns="http://www.w3.org/2000/svg"><path d="M2 21h20v-2H2v2zM20 8h-2V5c0-1.1-.9-2-2-2H4c-1.1 0-2 .9-2 2v3H0v2c0 2.21 1.79 4 4 4h1v3c0 1.1.9 2 2 2h8c1.1 0 2-.9 2-2v-3h1c2.21 0 4-1.79 4-4v-2zM16 5v3H4V5h12zM6 19v-6h6v6H6z" fill="#8b7355"/><rect x="6" y="13" width="6" height="6" rx="1" fill="#2d1b14" opacity="0.9"/><path d="M8 11c0.5-0.5 1-0.8 1.5-0.8s1 0.3 1.5 0.8" stroke="#6b5b47" stroke-width="0.5" fill="none" opacity="0.7"/></svg>"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_unknown() {
        assert_eq!("light".parse::<Theme>().unwrap(), Theme::Light);
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("sepia".parse::<Theme>().is_err());
        assert!("Dark".parse::<Theme>().is_err());
    }

    #[test]
    fn test_opposite_is_involutive() {
        for theme in Theme::ALL {
            assert_eq!(theme.opposite().opposite(), theme);
            assert_ne!(theme.opposite(), theme);
        }
    }

    #[test]
    fn test_theme_data_serializes_card_bg_key() {
        let json = serde_json::to_value(Theme::Dark.data()).unwrap();
        assert_eq!(json["name"], "Evening Tea");
        assert_eq!(json["colors"]["cardBg"], "rgba(40, 30, 20, 0.25)");
        assert_eq!(json["colors"]["primary"], "#1a1a1a");
    }
}
