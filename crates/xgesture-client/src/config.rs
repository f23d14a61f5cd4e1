//! Client configuration.
//!
//! Settings live in a single `config.toml` file at
//! `~/.config/xgesture/config.toml` by default. Every section is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use xgesture_protocol::{ByteOrder, SerialState, EXTENSION_NAME, NUMBER_ERRORS, NUMBER_EVENTS};

/// Configuration for the xgesture tool and library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Extension negotiation settings.
    #[serde(default)]
    pub extension: ExtensionSettings,

    /// Codec defaults used when no live connection supplies them.
    #[serde(default)]
    pub codec: CodecSettings,
}

/// How the extension is looked up on a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionSettings {
    /// Name the extension is queried under.
    pub name: String,

    /// Run QueryVersion when the capability record is created.
    pub negotiate_version: bool,
}

impl Default for ExtensionSettings {
    fn default() -> Self {
        Self {
            name: EXTENSION_NAME.to_string(),
            negotiate_version: true,
        }
    }
}

/// Offline codec parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecSettings {
    /// First event code assigned to the extension.
    pub first_event: u8,

    /// First error code assigned to the extension.
    pub first_error: u8,

    /// Byte order of the records.
    pub byte_order: ByteOrder,

    /// Serial of the last request read, used to widen sequence numbers.
    pub last_serial: u64,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            first_event: 64,
            first_error: 128,
            byte_order: ByteOrder::LsbFirst,
            last_serial: 0,
        }
    }
}

impl CodecSettings {
    /// Serial state for decoding; nothing is assumed sent past `last_serial`.
    pub fn serial_state(&self) -> SerialState {
        SerialState::new(self.last_serial, self.last_serial)
    }

    /// Checks that the extension's code ranges fit their fields.
    pub fn validate(&self) -> Result<(), String> {
        // Bit 7 of the type byte is the send-flag.
        if u16::from(self.first_event) + u16::from(NUMBER_EVENTS) > 0x80 {
            return Err(format!(
                "first_event {} leaves no room for {} event codes",
                self.first_event, NUMBER_EVENTS
            ));
        }
        if self.first_error.checked_add(NUMBER_ERRORS).is_none() {
            return Err(format!(
                "first_error {} leaves no room for {} error codes",
                self.first_error, NUMBER_ERRORS
            ));
        }
        Ok(())
    }
}

/// Per-connection behaviour of [`GestureConnection`](crate::GestureConnection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureConfig {
    /// Name the extension is queried under.
    pub extension_name: String,
    /// Run QueryVersion when the capability record is created.
    pub negotiate_version: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            extension_name: EXTENSION_NAME.to_string(),
            negotiate_version: true,
        }
    }
}

impl GestureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the extension name.
    pub fn with_extension_name(mut self, name: impl Into<String>) -> Self {
        self.extension_name = name.into();
        self
    }

    /// Builder: enable or disable version negotiation.
    pub fn with_negotiate_version(mut self, negotiate: bool) -> Self {
        self.negotiate_version = negotiate;
        self
    }
}

impl From<&ExtensionSettings> for GestureConfig {
    fn from(settings: &ExtensionSettings) -> Self {
        Self {
            extension_name: settings.name.clone(),
            negotiate_version: settings.negotiate_version,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("xgesture")
    }

    /// Connection settings derived from the `[extension]` section.
    pub fn gesture_config(&self) -> GestureConfig {
        GestureConfig::from(&self.extension)
    }

    /// Checks values the type system cannot.
    pub fn validate(&self) -> Result<(), String> {
        if self.extension.name.trim().is_empty() {
            return Err("extension name must not be empty".to_string());
        }
        self.codec.validate()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert!(!config.debug);
        assert_eq!(config.extension.name, "GESTURE");
        assert!(config.extension.negotiate_version);
        assert_eq!(config.codec.first_event, 64);
        assert_eq!(config.codec.first_error, 128);
        assert_eq!(config.codec.byte_order, ByteOrder::LsbFirst);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_partial_toml() {
        let config: ClientConfig = toml::from_str(
            r#"
            debug = true

            [codec]
            first_event = 90
            byte_order = "msb"
            "#,
        )
        .unwrap();

        assert!(config.debug);
        assert_eq!(config.codec.first_event, 90);
        assert_eq!(config.codec.first_error, 128);
        assert_eq!(config.codec.byte_order, ByteOrder::MsbFirst);
        assert_eq!(config.extension, ExtensionSettings::default());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[extension]\nname = \"GESTURE-TEST\"\nnegotiate_version = false\n\n[codec]\nlast_serial = 70000"
        )
        .unwrap();

        let config = ClientConfig::load_from(file.path()).unwrap();
        assert_eq!(config.extension.name, "GESTURE-TEST");
        assert_eq!(config.codec.serial_state(), SerialState::new(70000, 70000));

        let gesture = config.gesture_config();
        assert_eq!(gesture.extension_name, "GESTURE-TEST");
        assert!(!gesture.negotiate_version);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[codec]\nbyte_order = \"middle\"\n").unwrap();

        let err = ClientConfig::load_from(&path).unwrap_err();
        assert!(err.contains("failed to parse config"));

        let err = ClientConfig::load_from(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.contains("failed to read config"));
    }

    #[test]
    fn validate_rejects_bad_codes() {
        let mut config = ClientConfig::default();
        config.codec.first_event = 0x7A;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.codec.first_error = 254;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.extension.name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn dump_round_trips() {
        let config = ClientConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn gesture_config_builder() {
        let config = GestureConfig::new()
            .with_extension_name("OTHER")
            .with_negotiate_version(false);
        assert_eq!(config.extension_name, "OTHER");
        assert!(!config.negotiate_version);
    }
}
