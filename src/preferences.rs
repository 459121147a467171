
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PreferencesError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    /// Follow the system color scheme.
    Auto,
}

impl Theme {
    /// The concrete theme to show; never `Auto`.
    pub fn resolve(self, prefers_dark: bool) -> Self {
        match self {
            Self::Auto if prefers_dark => Self::Dark,
            Self::Auto => Self::Light,
            theme => theme,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Auto => "auto",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "auto" => Ok(Self::Auto),
            other => Err(format!("unknown theme '{other}' (expected light, dark or auto)")),
        }
    }
}

/// Whether the environment asks for a dark color scheme (`COLOR_SCHEME=dark`).
pub fn system_prefers_dark() -> bool {
    std::env::var("COLOR_SCHEME").is_ok_and(|v| v.eq_ignore_ascii_case("dark"))
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(default)]
    theme: Theme,
}

/// Theme preference backed by a JSON file, written on every change.
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    prefs: Preferences,
}

impl PreferenceStore {
    /// Loads the preference file; a missing file means defaults.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PreferencesError> {
        let path = path.into();
        let prefs = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preferences at {}, using defaults", path.display());
                Preferences::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, prefs })
    }

    /// Defaults that will still be saved to `path` on change.
    pub fn with_defaults(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            prefs: Preferences::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn theme(&self) -> Theme {
        self.prefs.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), PreferencesError> {
        self.prefs.theme = theme;
        self.save()?;
        info!("Theme set to {}", theme.as_str());
        Ok(())
    }

    /// Switches between light and dark based on what is currently shown.
    pub fn toggle_theme(&mut self, prefers_dark: bool) -> Result<Theme, PreferencesError> {
        let next = match self.theme().resolve(prefers_dark) {
            Theme::Dark => Theme::Light,
            _ => Theme::Dark,
        };
        self.set_theme(next)?;
        Ok(next)
    }

    fn save(&self) -> Result<(), PreferencesError> {
        let content = serde_json::to_string_pretty(&self.prefs)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_light() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::load(dir.path().join("prefs.json")).unwrap();
        assert_eq!(store.theme(), Theme::Light);
    }

    #[test]
    fn theme_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let mut store = PreferenceStore::load(&path).unwrap();
        store.set_theme(Theme::Auto).unwrap();

        let reloaded = PreferenceStore::load(&path).unwrap();
        assert_eq!(reloaded.theme(), Theme::Auto);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\n  \"theme\": \"auto\"\n}"
        );
    }

    #[test]
    fn toggle_flips_the_shown_theme() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PreferenceStore::with_defaults(dir.path().join("prefs.json"));

        assert_eq!(store.toggle_theme(false).unwrap(), Theme::Dark);
        assert_eq!(store.toggle_theme(false).unwrap(), Theme::Light);

        store.set_theme(Theme::Auto).unwrap();
        assert_eq!(store.toggle_theme(true).unwrap(), Theme::Light);
        store.set_theme(Theme::Auto).unwrap();
        assert_eq!(store.toggle_theme(false).unwrap(), Theme::Dark);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            PreferenceStore::load(&path),
            Err(PreferencesError::Json(_))
        ));
    }

    #[test]
    fn resolves_auto() {
        assert_eq!(Theme::Auto.resolve(true), Theme::Dark);
        assert_eq!(Theme::Auto.resolve(false), Theme::Light);
        assert_eq!(Theme::Dark.resolve(false), Theme::Dark);
        assert_eq!("DARK".parse::<Theme>(), Ok(Theme::Dark));
    }
}
