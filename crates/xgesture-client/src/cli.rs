//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use xgesture_protocol::ByteOrder;

use crate::config::CodecSettings;
use crate::error::{GestureError, GestureResult};

/// xgesture - inspect gesture extension records
#[derive(Debug, Parser)]
#[command(name = "xgesture")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "XGESTURE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode one 32-byte event record given as hex
    Decode {
        /// Record bytes, whitespace or ':' separated hex allowed
        hex: String,

        #[command(flatten)]
        codec: CodecArgs,
    },

    /// Encode a JSON event (from FILE or stdin) as a hex record
    Encode {
        /// JSON file holding one event; stdin if omitted
        file: Option<PathBuf>,

        #[command(flatten)]
        codec: CodecArgs,
    },

    /// Name an extension error code
    Error {
        /// Absolute error code as reported by the server
        code: u8,

        #[command(flatten)]
        codec: CodecArgs,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Overrides for the `[codec]` section of the configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct CodecArgs {
    /// First event code assigned to the extension
    #[arg(long)]
    pub first_event: Option<u8>,

    /// First error code assigned to the extension
    #[arg(long)]
    pub first_error: Option<u8>,

    /// Records are most significant byte first
    #[arg(long)]
    pub msb: bool,

    /// Serial of the last request read, for sequence widening
    #[arg(long)]
    pub last_serial: Option<u64>,
}

impl CodecArgs {
    /// Returns `settings` with the flags given on the command line applied.
    pub fn apply(&self, settings: &CodecSettings) -> CodecSettings {
        CodecSettings {
            first_event: self.first_event.unwrap_or(settings.first_event),
            first_error: self.first_error.unwrap_or(settings.first_error),
            byte_order: if self.msb {
                ByteOrder::MsbFirst
            } else {
                settings.byte_order
            },
            last_serial: self.last_serial.unwrap_or(settings.last_serial),
        }
    }

    /// Applies the overrides and rejects code ranges the wire cannot carry.
    pub fn resolve(&self, settings: &CodecSettings) -> GestureResult<CodecSettings> {
        let settings = self.apply(settings);
        settings.validate().map_err(GestureError::Config)?;
        Ok(settings)
    }
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
