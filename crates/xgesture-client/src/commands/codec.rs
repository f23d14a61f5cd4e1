//! Offline record inspection.
//!
//! There is no live connection here, so the codes a server would assign are
//! taken from the `[codec]` configuration section.

use std::fmt::Write as _;
use std::io;
use std::path::Path;

use tracing::debug;
use xgesture_protocol::{
    ConnectionId, GestureEvent, EVENT_SIZE, MAJOR_VERSION, MINOR_VERSION, PATCH_VERSION,
};

use crate::codec::GestureCodec;
use crate::config::CodecSettings;
use crate::error::{GestureError, GestureResult};
use crate::registry::{CapabilityInfo, ProtocolVersion};
use crate::transport::ExtensionCodes;

/// Decode a hex record and print it as JSON.
pub fn decode(hex: &str, settings: &CodecSettings) -> GestureResult<()> {
    match decode_record(hex, settings)? {
        Some(event) => println!("{}", to_json(&event)?),
        None => println!("not a gesture event"),
    }
    Ok(())
}

/// Read a JSON event from `file` (or stdin) and print its record as hex.
pub fn encode(file: Option<&Path>, settings: &CodecSettings) -> GestureResult<()> {
    let json = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => io::read_to_string(io::stdin())?,
    };
    println!("{}", encode_record(&json, settings)?);
    Ok(())
}

/// Print the name of an extension error code.
pub fn error(code: u8, settings: &CodecSettings) -> GestureResult<()> {
    println!("{}", describe_error(code, settings));
    Ok(())
}

pub fn decode_record(hex: &str, settings: &CodecSettings) -> GestureResult<Option<GestureEvent>> {
    let bytes = parse_hex(hex)?;
    if bytes.len() != EVENT_SIZE {
        return Err(GestureError::InvalidInput(format!(
            "expected {} bytes, got {}",
            EVENT_SIZE,
            bytes.len()
        )));
    }
    debug!(first_event = settings.first_event, order = ?settings.byte_order, "Decoding record");
    offline_codec(settings)
        .decode(&bytes, settings.serial_state())
        .map_err(|e| GestureError::InvalidInput(e.to_string()))
}

pub fn encode_record(json: &str, settings: &CodecSettings) -> GestureResult<String> {
    let event: GestureEvent = serde_json::from_str(json)
        .map_err(|e| GestureError::InvalidInput(format!("not a gesture event: {}", e)))?;
    Ok(to_hex(&offline_codec(settings).encode(&event)))
}

pub fn describe_error(code: u8, settings: &CodecSettings) -> String {
    match offline_codec(settings).error_code(code) {
        Some(error) => format!("{}: {}", error.name(), error.description()),
        None => format!("{} is not a gesture error code", code),
    }
}

/// Parses hex digits, ignoring whitespace, ':' separators and a `0x` prefix.
pub fn parse_hex(input: &str) -> GestureResult<Vec<u8>> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: Vec<u8> = trimmed
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();

    if digits.len() % 2 != 0 {
        return Err(GestureError::InvalidInput(
            "odd number of hex digits".to_string(),
        ));
    }

    digits
        .chunks(2)
        .map(|pair| {
            let high = hex_value(pair[0])?;
            let low = hex_value(pair[1])?;
            Ok((high << 4) | low)
        })
        .collect()
}

pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}

fn hex_value(digit: u8) -> GestureResult<u8> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        _ => Err(GestureError::InvalidInput(format!(
            "invalid hex digit {:?}",
            char::from(digit)
        ))),
    }
}

fn offline_codec(settings: &CodecSettings) -> GestureCodec {
    let info = CapabilityInfo::new(ExtensionCodes {
        major_opcode: 0,
        first_event: settings.first_event,
        first_error: settings.first_error,
    })
    .with_version(ProtocolVersion::new(MAJOR_VERSION, MINOR_VERSION, PATCH_VERSION));
    GestureCodec::new(ConnectionId::default(), info, settings.byte_order)
}

fn to_json(event: &GestureEvent) -> GestureResult<String> {
    serde_json::to_string_pretty(event)
        .map_err(|e| GestureError::InvalidInput(format!("failed to serialize event: {}", e)))
}

#[cfg(test)]
mod tests {
    use xgesture_protocol::ByteOrder;

    use super::*;

    const FLICK: &str = "41020700 e8030000 00000000 02037800 fa000000 00800100 00000000 00000000";

    #[test]
    fn parse_hex_accepts_separators() {
        assert_eq!(parse_hex("0x41:02 07").unwrap(), vec![0x41, 0x02, 0x07]);
        assert_eq!(parse_hex("  ABcd\n").unwrap(), vec![0xab, 0xcd]);
        assert!(parse_hex("").unwrap().is_empty());
    }

    #[test]
    fn parse_hex_rejects_garbage() {
        assert!(matches!(parse_hex("abc"), Err(GestureError::InvalidInput(_))));
        assert!(matches!(parse_hex("zz"), Err(GestureError::InvalidInput(_))));
    }

    #[test]
    fn decodes_flick_record() {
        let event = decode_record(FLICK, &CodecSettings::default())
            .unwrap()
            .unwrap();
        let GestureEvent::Flick(flick) = event else {
            panic!("expected flick, got {event:?}");
        };
        assert_eq!(flick.header.serial, 7);
        assert_eq!(flick.header.time, 1000);
        assert_eq!(flick.header.kind, 2);
        assert_eq!(flick.num_finger, 2);
        assert_eq!(flick.direction, 3);
        assert_eq!(flick.distance, 120);
        assert_eq!(flick.duration, 250);
        assert_eq!(flick.angle.to_f64(), 1.5);
    }

    #[test]
    fn foreign_record_is_not_an_event() {
        let settings = CodecSettings {
            first_event: 90,
            ..CodecSettings::default()
        };
        assert_eq!(decode_record(FLICK, &settings).unwrap(), None);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let err = decode_record("4102", &CodecSettings::default()).unwrap_err();
        assert!(err.to_string().contains("expected 32 bytes"));
    }

    #[test]
    fn encode_reverses_decode() {
        let settings = CodecSettings::default();
        let event = decode_record(FLICK, &settings).unwrap().unwrap();
        let json = to_json(&event).unwrap();

        let hex = encode_record(&json, &settings).unwrap();
        assert_eq!(hex, FLICK.replace(' ', ""));
    }

    #[test]
    fn encode_follows_byte_order() {
        let settings = CodecSettings::default();
        let event = decode_record(FLICK, &settings).unwrap().unwrap();
        let json = to_json(&event).unwrap();

        let msb = CodecSettings {
            byte_order: ByteOrder::MsbFirst,
            ..CodecSettings::default()
        };
        let hex = encode_record(&json, &msb).unwrap();
        assert!(hex.starts_with("41020007000003e8"));
    }

    #[test]
    fn encode_rejects_unknown_json() {
        let err = encode_record(r#"{"type":"swipe"}"#, &CodecSettings::default()).unwrap_err();
        assert!(matches!(err, GestureError::InvalidInput(_)));
    }

    #[test]
    fn describes_error_codes() {
        let settings = CodecSettings::default();
        assert!(describe_error(129, &settings).starts_with("InValidMask:"));
        assert_eq!(
            describe_error(131, &settings),
            "131 is not a gesture error code"
        );
    }
}
