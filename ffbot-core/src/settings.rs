//! Generic key→value settings facility.
//!
//! Thresholds and toggles are read through flat, cvar-style keys
//! (`ff_bot_health_critical_ratio`, `ff_bot_chatter`, ...). Sources are
//! layered with the `config` crate: TOML documents first, then programmatic
//! overrides, so a host can map its console variables on top of a file.

use std::path::Path;

use config::{Config, ConfigBuilder, ConfigError, FileFormat, builder::DefaultState};
use tracing::warn;

/// Layered, read-only settings.
#[derive(Debug, Clone)]
pub struct Settings {
    inner: Config,
}

impl Settings {
    /// Start a layered builder.
    #[must_use]
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder {
            inner: Config::builder(),
        }
    }

    /// Settings with no sources; every lookup falls back to its default.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            inner: Config::default(),
        }
    }

    /// Settings from a single TOML document.
    ///
    /// # Errors
    /// Returns `BotError::Settings` if the document cannot be parsed.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        Self::builder().toml(toml_str).build()
    }

    /// Settings from a TOML file on disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Read a float, or `default` if the key is absent or mistyped.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn get_f32(&self, key: &str, default: f32) -> f32 {
        lookup(key, self.inner.get_float(key)).map_or(default, |v| v as f32)
    }

    /// Read an unsigned integer, or `default` if absent, mistyped or negative.
    #[must_use]
    pub fn get_u32(&self, key: &str, default: u32) -> u32 {
        lookup(key, self.inner.get_int(key))
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(default)
    }

    /// Read a boolean, or `default` if absent or mistyped.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        lookup(key, self.inner.get_bool(key)).unwrap_or(default)
    }

    /// Read a string value, if present.
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<String> {
        lookup(key, self.inner.get_string(key))
    }

    /// Whether `key` is set by any source.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.get::<config::Value>(key).is_ok()
    }
}

fn lookup<T>(key: &str, value: Result<T, ConfigError>) -> Option<T> {
    match value {
        Ok(v) => Some(v),
        Err(ConfigError::NotFound(_)) => None,
        Err(err) => {
            warn!(key, error = %err, "Ignoring malformed setting");
            None
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builder for [`Settings`]; later layers win.
#[derive(Debug)]
pub struct SettingsBuilder {
    inner: ConfigBuilder<DefaultState>,
}

impl SettingsBuilder {
    /// Add a TOML document layer.
    #[must_use]
    pub fn toml(self, toml_str: &str) -> Self {
        Self {
            inner: self
                .inner
                .add_source(config::File::from_str(toml_str, FileFormat::Toml)),
        }
    }

    /// Override a single key (console-variable style).
    ///
    /// # Errors
    /// Returns `BotError::Settings` if the key is not a valid path.
    pub fn set(self, key: &str, value: &str) -> crate::error::Result<Self> {
        Ok(Self {
            inner: self.inner.set_override(key, value)?,
        })
    }

    /// Finish building.
    ///
    /// # Errors
    /// Returns `BotError::Settings` if any layer fails to parse.
    pub fn build(self) -> crate::error::Result<Settings> {
        Ok(Settings {
            inner: self.inner.build()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back() {
        let settings = Settings::empty();
        assert!((settings.get_f32("ff_bot_health_critical_ratio", 0.3) - 0.3).abs() < f32::EPSILON);
        assert!(settings.get_bool("ff_bot_force_jump", true));
        assert!(settings.get_string("ff_bot_chatter").is_none());
    }

    #[test]
    fn overrides_win_over_files() {
        let settings = Settings::builder()
            .toml("ff_bot_health_critical_ratio = 0.3")
            .set("ff_bot_health_critical_ratio", "0.45")
            .expect("override")
            .build()
            .expect("build");
        assert!((settings.get_f32("ff_bot_health_critical_ratio", 0.0) - 0.45).abs() < 1e-6);
    }

    #[test]
    fn mistyped_value_uses_default() {
        let settings = Settings::from_toml("ff_bot_max_repath_attempts = \"lots\"").expect("parse");
        assert_eq!(settings.get_u32("ff_bot_max_repath_attempts", 3), 3);
        assert!(settings.contains("ff_bot_max_repath_attempts"));
    }

    #[test]
    fn reads_from_disk() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "ff_bot_force_jump = true").expect("write");
        let settings = Settings::from_file(file.path()).expect("load");
        assert!(settings.get_bool("ff_bot_force_jump", false));
    }
}
