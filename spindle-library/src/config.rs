//! Startup configuration for Spindle
//!
//! A `key=value` text file under the user's config directory, read once at
//! startup and never written. Missing or unreadable files give defaults;
//! unknown keys and bad values are ignored.

use spindle_core::{Rpm, DEFAULT_TEMPO_RANGE};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory searched for bare file names given to `:load`
    pub track_dir: Option<PathBuf>,
    /// Platter speed at startup
    pub default_rpm: Rpm,
    /// Tempo fader range (± percent)
    pub tempo_range: f64,
    /// Tempo change per key press (percent)
    pub tempo_step: f64,
    /// UI frame rate
    pub fps: u32,
    /// Echo time in milliseconds
    pub echo_time_ms: f32,
    /// Echo feedback gain
    pub echo_feedback: f32,
    /// UI theme name
    pub theme: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            track_dir: None,
            default_rpm: Rpm::ThirtyThree,
            tempo_range: DEFAULT_TEMPO_RANGE,
            tempo_step: 0.1,
            fps: 60,
            echo_time_ms: 250.0,
            echo_feedback: 0.35,
            theme: "green".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location
    ///
    /// Returns default config if file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let path = Self::config_path();
        Self::load_from(&path).unwrap_or_default()
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spindle")
            .join("config.txt")
    }

    /// Parse config from key=value lines
    fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "track_dir" => {
                    if !value.is_empty() {
                        config.track_dir = Some(PathBuf::from(value));
                    }
                }
                "default_rpm" => {
                    if let Some(rpm) = Rpm::parse(value) {
                        config.default_rpm = rpm;
                    }
                }
                "tempo_range" => {
                    if let Some(v) = parse_positive::<f64>(value) {
                        config.tempo_range = v;
                    }
                }
                "tempo_step" => {
                    if let Some(v) = parse_positive::<f64>(value) {
                        config.tempo_step = v;
                    }
                }
                "fps" => {
                    if let Ok(v) = value.parse::<u32>() {
                        config.fps = v.clamp(10, 240);
                    }
                }
                "echo_time_ms" => {
                    if let Some(v) = parse_positive::<f32>(value) {
                        config.echo_time_ms = v;
                    }
                }
                "echo_feedback" => {
                    if let Ok(v) = value.parse::<f32>() {
                        if v.is_finite() {
                            config.echo_feedback = v.clamp(0.0, 0.95);
                        }
                    }
                }
                "theme" => {
                    if !value.is_empty() {
                        config.theme = value.to_string();
                    }
                }
                _ => {} // Ignore unknown keys
            }
        }

        config
    }
}

/// Finite, strictly positive number
fn parse_positive<T>(value: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default + Copy + Into<f64>,
{
    let v = value.parse::<T>().ok()?;
    let as_f64: f64 = v.into();
    (as_f64.is_finite() && v > T::default()).then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let config = Config::parse("");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_with_dir() {
        let config = Config::parse("track_dir=/home/user/records");
        assert_eq!(
            config.track_dir,
            Some(PathBuf::from("/home/user/records"))
        );
    }

    #[test]
    fn test_parse_with_comments_and_unknown_keys() {
        let content = "# Comment\ndefault_rpm=45\ncrossfader=hamster\n# Another\nfps=30";
        let config = Config::parse(content);
        assert_eq!(config.default_rpm, Rpm::FortyFive);
        assert_eq!(config.fps, 30);
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let content = "tempo_range=-3\ntempo_step=abc\nfps=0\necho_feedback=NaN\nno_equals_sign";
        let config = Config::parse(content);
        assert_eq!(config.tempo_range, DEFAULT_TEMPO_RANGE);
        assert_eq!(config.tempo_step, 0.1);
        assert_eq!(config.fps, 10);
        assert_eq!(config.echo_feedback, 0.35);
    }

    #[test]
    fn test_load_file() {
        let dir = std::env::temp_dir().join(format!("spindle-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.txt");
        fs::write(
            &path,
            "# Spindle\ntrack_dir=/crates/disco\ntempo_step=0.25\ntheme=amber\n",
        )
        .unwrap();

        let loaded = Config::load_from(&path).unwrap();
        let _ = fs::remove_dir_all(&dir);
        assert_eq!(loaded.track_dir, Some(PathBuf::from("/crates/disco")));
        assert_eq!(loaded.tempo_step, 0.25);
        assert_eq!(loaded.theme, "amber");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir()
            .join(format!("spindle-no-config-{}", std::process::id()))
            .join("config.txt");
        assert!(Config::load_from(&path).is_err());
        assert_eq!(Config::load_from(&path).unwrap_or_default(), Config::default());
    }
}
