use std::str::FromStr;

use crate::error::Error;

pub const DEFAULT_NTP_SERVER: &str = "pool.ntp.org";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppTheme {
    #[default]
    System,
    Light,
    Dark,
}

impl AppTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl std::fmt::Display for AppTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppTheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(Error::InvalidInput(format!("Unknown theme: {}", other))),
        }
    }
}

/// `Dynamic` follows the platform wallpaper palette where available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppColorScheme {
    #[default]
    Dynamic,
    Static,
}

impl AppColorScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dynamic => "dynamic",
            Self::Static => "static",
        }
    }
}

impl std::fmt::Display for AppColorScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppColorScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dynamic" => Ok(Self::Dynamic),
            "static" => Ok(Self::Static),
            other => Err(Error::InvalidInput(format!(
                "Unknown color scheme: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPreferences {
    pub member_id: String,
    pub first_name: String,
    pub theme: AppTheme,
    pub color_scheme: AppColorScheme,
    pub qr_on_open: bool,
    pub qr_max_brightness: bool,
    pub pure_black: bool,
    pub use_ntp: bool,
    pub ntp_server: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            member_id: String::new(),
            first_name: String::new(),
            theme: AppTheme::default(),
            color_scheme: AppColorScheme::default(),
            qr_on_open: false,
            qr_max_brightness: true,
            pure_black: false,
            use_ntp: false,
            ntp_server: DEFAULT_NTP_SERVER.to_string(),
        }
    }
}
