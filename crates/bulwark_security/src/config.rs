//! # Security Configuration
//!
//! `security.toml` holds one section per check, keyed by the check's dotted
//! id, plus a `default` section every check falls back to.
//!
//! ```toml
//! [__meta]
//! version = 2
//!
//! [security_checks.default]
//! mode = "KICK"
//! log_message_in_server_chat = true
//! kick_message = "You were disconnected from the server."
//! distance = 16.0
//!
//! [security_checks.bandage.distance]
//! mode = "KICK"
//! log_message = ["%player_username% bandaged %target_username% from %distance_measured% away."]
//! ```
//!
//! ## Versioning
//!
//! A document older than [`CURRENT_VERSION`] is copied aside as
//! `security_version_<old>_<unix millis>.toml` and replaced by the packaged
//! default before it is read.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::{SecurityError, SecurityResult};
use crate::mode::Mode;

/// Schema version this build understands.
pub const CURRENT_VERSION: i64 = 2;

/// Packaged default document.
pub const DEFAULT_DOCUMENT: &str = include_str!("../assets/security.toml");

/// Kick message when the default section has none.
pub const FALLBACK_KICK_MESSAGE: &str = "You were disconnected from the server.";

/// Distance threshold when the default section has none.
pub const FALLBACK_DISTANCE: f32 = 16.0;

#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    version: i64,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(rename = "__meta", default)]
    meta: Meta,
    #[serde(default)]
    security_checks: toml::Table,
}

#[derive(Debug, Default, Deserialize)]
struct RawDefaults {
    mode: Option<toml::Value>,
    #[serde(alias = "log_message_in_sever_chat")]
    log_message_in_server_chat: Option<toml::Value>,
    kick_message: Option<toml::Value>,
    distance: Option<toml::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSection {
    mode: Option<toml::Value>,
    log_message: Option<toml::Value>,
    #[serde(alias = "log_message_in_sever_chat")]
    log_message_in_server_chat: Option<toml::Value>,
    kick_message: Option<toml::Value>,
    distance: Option<toml::Value>,
}

/// Resolved `default` section.
#[derive(Clone, Debug, PartialEq)]
pub struct DefaultSettings {
    /// Mode for checks that name none.
    pub mode: Mode,
    /// Mirror failures to staff chat.
    pub mirror_to_staff: bool,
    /// Kick template.
    pub kick_message: String,
    /// Distance threshold.
    pub distance: f32,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Ignore,
            mirror_to_staff: false,
            kick_message: FALLBACK_KICK_MESSAGE.to_owned(),
            distance: FALLBACK_DISTANCE,
        }
    }
}

/// Resolved settings of one check.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckSettings {
    /// Enforcement mode.
    pub mode: Mode,
    /// Log templates, at least one.
    pub log_messages: Vec<String>,
    /// Mirror failures to staff chat.
    pub mirror_to_staff: bool,
    /// Kick template.
    pub kick_message: String,
    /// Distance threshold.
    pub distance: f32,
}

/// Extracts an optional key. A value of the wrong type is reported and
/// treated as absent, so the caller's fallback applies.
fn optional<T>(
    id: &str,
    key: &str,
    value: Option<toml::Value>,
    expected: &str,
    extract: impl FnOnce(&toml::Value) -> Option<T>,
) -> Option<T> {
    let value = value?;
    let extracted = extract(&value);
    if extracted.is_none() {
        warn!(
            target: "security",
            "'{key}' in 'security_checks.{id}' should be {expected}, found {}; using the default.",
            value.type_str()
        );
    }
    extracted
}

fn parse_mode(id: &str, raw: Option<toml::Value>, fallback: Mode) -> SecurityResult<Mode> {
    let Some(raw) = optional(id, "mode", raw, "a string", |v| v.as_str().map(str::to_owned)) else {
        return Ok(fallback);
    };
    raw.parse()
        .map_err(|_| SecurityError::EmptyMode { id: id.to_owned() })
}

fn parse_flag(id: &str, raw: Option<toml::Value>, fallback: bool) -> bool {
    optional(id, "log_message_in_server_chat", raw, "a boolean", toml::Value::as_bool)
        .unwrap_or(fallback)
}

fn parse_text(id: &str, raw: Option<toml::Value>, fallback: &str) -> String {
    optional(id, "kick_message", raw, "a string", |v| v.as_str().map(str::to_owned))
        .unwrap_or_else(|| fallback.to_owned())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn parse_distance(id: &str, raw: Option<toml::Value>, fallback: f32) -> f32 {
    optional(id, "distance", raw, "a number", |v| {
        v.as_float().or_else(|| v.as_integer().map(|i| i as f64))
    })
    .map_or(fallback, |d| d as f32)
}

/// A string or a non-empty list of strings; anything else counts as missing.
fn parse_templates(raw: Option<toml::Value>) -> Option<Vec<String>> {
    let lines = match raw? {
        toml::Value::String(line) => vec![line],
        toml::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                toml::Value::String(line) => Some(line),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?,
        _ => return None,
    };
    (!lines.is_empty()).then_some(lines)
}

/// A parsed configuration document.
#[derive(Debug)]
pub struct SecurityDocument {
    version: i64,
    checks: toml::Table,
}

impl SecurityDocument {
    /// Parses document text.
    ///
    /// # Errors
    ///
    /// [`SecurityError::Parse`] for invalid TOML or a mistyped top level.
    pub fn parse(source: &str) -> SecurityResult<Self> {
        let raw: RawDocument = toml::from_str(source)?;
        Ok(Self {
            version: raw.meta.version,
            checks: raw.security_checks,
        })
    }

    /// The packaged default document.
    ///
    /// # Errors
    ///
    /// Only if the packaged document is broken.
    pub fn packaged() -> SecurityResult<Self> {
        Self::parse(DEFAULT_DOCUMENT)
    }

    /// Schema version; `0` when `__meta.version` is absent.
    #[must_use]
    pub const fn version(&self) -> i64 {
        self.version
    }

    /// Section at a dotted path below `security_checks`.
    #[must_use]
    pub fn section(&self, id: &str) -> Option<&toml::Value> {
        let mut parts = id.split('.');
        let mut value = self.checks.get(parts.next()?)?;
        for part in parts {
            value = value.as_table()?.get(part)?;
        }
        Some(value)
    }

    fn deserialize_section<T>(&self, id: &str) -> SecurityResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.section(id)
            .map(|value| {
                value.clone().try_into().map_err(|e: toml::de::Error| {
                    SecurityError::InvalidSection {
                        id: id.to_owned(),
                        reason: e.message().to_owned(),
                    }
                })
            })
            .transpose()
    }

    /// Resolves the `default` section. Absent or mistyped keys use
    /// built-in fallbacks.
    ///
    /// # Errors
    ///
    /// [`SecurityError::EmptyMode`], or [`SecurityError::InvalidSection`]
    /// when `default` is not a table.
    pub fn defaults(&self) -> SecurityResult<DefaultSettings> {
        let raw: RawDefaults = self.deserialize_section("default")?.unwrap_or_default();
        let fallback = DefaultSettings::default();
        Ok(DefaultSettings {
            mode: parse_mode("default", raw.mode, fallback.mode)?,
            mirror_to_staff: parse_flag(
                "default",
                raw.log_message_in_server_chat,
                fallback.mirror_to_staff,
            ),
            kick_message: parse_text("default", raw.kick_message, &fallback.kick_message),
            distance: parse_distance("default", raw.distance, fallback.distance),
        })
    }

    /// Resolves one check's section against the defaults. Optional keys
    /// that are absent or mistyped fall back to `defaults`.
    ///
    /// # Errors
    ///
    /// [`SecurityError::MissingLogMessage`] when the section is absent or
    /// declares no usable `log_message`, [`SecurityError::EmptyMode`], and
    /// [`SecurityError::InvalidSection`] when the section is not a table.
    pub fn check_settings(
        &self,
        id: &str,
        defaults: &DefaultSettings,
    ) -> SecurityResult<CheckSettings> {
        let missing = || SecurityError::MissingLogMessage { id: id.to_owned() };
        let raw: RawSection = self.deserialize_section(id)?.ok_or_else(missing)?;
        let log_messages = parse_templates(raw.log_message).ok_or_else(missing)?;
        Ok(CheckSettings {
            mode: parse_mode(id, raw.mode, defaults.mode)?,
            log_messages,
            mirror_to_staff: parse_flag(id, raw.log_message_in_server_chat, defaults.mirror_to_staff),
            kick_message: parse_text(id, raw.kick_message, &defaults.kick_message),
            distance: parse_distance(id, raw.distance, defaults.distance),
        })
    }
}

/// The on-disk configuration file.
#[derive(Clone, Debug)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    /// Binds to a path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the packaged default if the file is missing. Returns true if
    /// it wrote one.
    ///
    /// # Errors
    ///
    /// [`SecurityError::Io`].
    pub fn ensure_exists(&self) -> SecurityResult<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        self.write_default()?;
        info!("Created {} from the packaged default.", self.path.display());
        Ok(true)
    }

    fn write_default(&self) -> SecurityResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SecurityError::io(parent, e))?;
        }
        fs::write(&self.path, DEFAULT_DOCUMENT).map_err(|e| SecurityError::io(&self.path, e))
    }

    fn read_raw(&self) -> SecurityResult<SecurityDocument> {
        let source =
            fs::read_to_string(&self.path).map_err(|e| SecurityError::io(&self.path, e))?;
        SecurityDocument::parse(&source)
    }

    /// Reads the document, migrating a stale one first.
    ///
    /// # Errors
    ///
    /// [`SecurityError::Io`] or [`SecurityError::Parse`].
    pub fn read(&self) -> SecurityResult<SecurityDocument> {
        let document = self.read_raw()?;
        if document.version() >= CURRENT_VERSION {
            return Ok(document);
        }

        let archive = self.archive_path(document.version());
        error!(
            "security.toml is using version {}. The current version uses {}. \
             The original security.toml is copied to {}. Using default configuration..",
            document.version(),
            CURRENT_VERSION,
            archive.display(),
        );
        fs::copy(&self.path, &archive).map_err(|e| SecurityError::io(&archive, e))?;
        self.write_default()?;
        self.read_raw()
    }

    fn archive_path(&self, version: i64) -> PathBuf {
        let millis = chrono::Utc::now().timestamp_millis();
        let name = format!("security_version_{version}_{millis}.toml");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
[__meta]
version = 2

[security_checks.default]
mode = "kick"
log_message_in_sever_chat = true
kick_message = "Bye %player_username%."
distance = 12.0

[security_checks.bandage.distance]
log_message = "too far"
distance = 20

[security_checks.bandage.offline_player]
mode = "false"
log_message = ["one", "two"]
log_message_in_server_chat = false
kick_message = "offline"

[security_checks.teleport.not_staff]
mode = ""
log_message = "x"

[security_checks.stitch.distance]
mode = "OFF"
"#;

    fn doc() -> SecurityDocument {
        SecurityDocument::parse(DOC).unwrap()
    }

    #[test]
    fn test_defaults_with_typo_alias() {
        let defaults = doc().defaults().unwrap();
        assert_eq!(defaults.mode, Mode::Kick);
        assert!(defaults.mirror_to_staff);
        assert_eq!(defaults.kick_message, "Bye %player_username%.");
        assert!((defaults.distance - 12.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_section_falls_back_to_defaults() {
        let document = doc();
        let defaults = document.defaults().unwrap();
        let settings = document.check_settings("bandage.distance", &defaults).unwrap();
        assert_eq!(settings.mode, Mode::Kick);
        assert_eq!(settings.log_messages, ["too far"]);
        assert!(settings.mirror_to_staff);
        assert_eq!(settings.kick_message, "Bye %player_username%.");
        assert!((settings.distance - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_section_overrides() {
        let document = doc();
        let defaults = document.defaults().unwrap();
        let settings = document
            .check_settings("bandage.offline_player", &defaults)
            .unwrap();
        assert_eq!(settings.mode, Mode::Off);
        assert_eq!(settings.log_messages, ["one", "two"]);
        assert!(!settings.mirror_to_staff);
        assert_eq!(settings.kick_message, "offline");
        assert!((settings.distance - 12.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_log_message_fails() {
        let document = doc();
        let defaults = document.defaults().unwrap();
        let err = document
            .check_settings("stitch.distance", &defaults)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "'log_message' isn't defined for 'security_checks.stitch.distance' in security.toml."
        );
        assert!(matches!(
            document.check_settings("nope.nothing", &defaults),
            Err(SecurityError::MissingLogMessage { .. })
        ));
    }

    #[test]
    fn test_mistyped_optional_keys_fall_back() {
        let document = SecurityDocument::parse(
            r#"
[security_checks.default]
mode = "KICK"
log_message_in_server_chat = "yes"
kick_message = 5
distance = "far"

[security_checks.climate_manager.not_staff]
mode = 3
log_message = "x"
log_message_in_server_chat = 1
kick_message = ["a"]
distance = true
"#,
        )
        .unwrap();
        let defaults = document.defaults().unwrap();
        assert_eq!(defaults, DefaultSettings {
            mode: Mode::Kick,
            ..DefaultSettings::default()
        });

        let settings = document
            .check_settings("climate_manager.not_staff", &defaults)
            .unwrap();
        assert_eq!(settings.mode, Mode::Kick);
        assert_eq!(settings.log_messages, ["x"]);
        assert!(!settings.mirror_to_staff);
        assert_eq!(settings.kick_message, FALLBACK_KICK_MESSAGE);
        assert!((settings.distance - FALLBACK_DISTANCE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unusable_log_message_fails() {
        let document = SecurityDocument::parse(
            r#"
[security_checks.bandage.distance]
log_message = []

[security_checks.stitch.distance]
log_message = ["ok", 7]

[security_checks.splint.distance]
log_message = 7
"#,
        )
        .unwrap();
        let defaults = document.defaults().unwrap();
        for id in ["bandage.distance", "stitch.distance", "splint.distance"] {
            assert!(
                matches!(
                    document.check_settings(id, &defaults),
                    Err(SecurityError::MissingLogMessage { .. })
                ),
                "{id}"
            );
        }
    }

    #[test]
    fn test_empty_mode_rejected() {
        let document = doc();
        let defaults = document.defaults().unwrap();
        assert!(matches!(
            document.check_settings("teleport.not_staff", &defaults),
            Err(SecurityError::EmptyMode { .. })
        ));
    }

    #[test]
    fn test_packaged_document_is_current() {
        let document = SecurityDocument::packaged().unwrap();
        assert_eq!(document.version(), CURRENT_VERSION);
        assert!(document.defaults().is_ok());
    }

    #[test]
    fn test_missing_file_written() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigFile::new(dir.path().join("security.toml"));
        assert!(file.ensure_exists().unwrap());
        assert!(!file.ensure_exists().unwrap());
        assert_eq!(file.read().unwrap().version(), CURRENT_VERSION);
    }

    #[test]
    fn test_stale_version_archived() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("security.toml");
        fs::write(&path, "[__meta]\nversion = 1\n").unwrap();

        let document = ConfigFile::new(&path).read().unwrap();
        assert_eq!(document.version(), CURRENT_VERSION);
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_DOCUMENT);

        let archived: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("security_version_1_"))
            .collect();
        assert_eq!(archived.len(), 1);
        assert!(archived[0].ends_with(".toml"));
    }

    #[test]
    fn test_missing_meta_counts_as_stale() {
        let document = SecurityDocument::parse("").unwrap();
        assert_eq!(document.version(), 0);
    }
}
