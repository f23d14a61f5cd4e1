//! Per-connection capability cache.
//!
//! The first operation on a connection negotiates the extension's base codes
//! and protocol version; every later operation reads the cached record. The
//! record lives in the connection object and goes away with it.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use xgesture_protocol::NUMBER_ERRORS;

use crate::error::{GestureError, GestureResult};
use crate::transport::ExtensionCodes;

/// Protocol version reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProtocolVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl ProtocolVersion {
    pub fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Negotiated extension metadata of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityInfo {
    /// Base codes assigned by the server's extension registry.
    pub codes: ExtensionCodes,
    /// Version reported by the server, if negotiation succeeded.
    pub version: Option<ProtocolVersion>,
    /// Number of extension error codes that can be named.
    pub num_errors: u8,
}

impl CapabilityInfo {
    /// Creates a record without version information.
    pub fn new(codes: ExtensionCodes) -> Self {
        Self {
            codes,
            version: None,
            num_errors: 0,
        }
    }

    /// Builder: record the negotiated version.
    ///
    /// Error codes only get names once the version is known.
    pub fn with_version(mut self, version: ProtocolVersion) -> Self {
        self.version = Some(version);
        self.num_errors = NUMBER_ERRORS;
        self
    }

    pub fn is_version_supported(&self) -> bool {
        self.version.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
enum Entry {
    Absent,
    Present(CapabilityInfo),
}

/// Lazily filled, connection-scoped capability cache.
///
/// The slot lock is held while a record is created, so concurrent first
/// resolutions produce a single creation.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    slot: Mutex<Option<Entry>>,
    creations: AtomicUsize,
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached record, running `create` if there is none yet.
    ///
    /// `create` returns `Ok(None)` when the server lacks the extension; that
    /// outcome is cached and reported as [`GestureError::NotSupported`] from
    /// then on. Errors from `create` are not cached.
    pub fn resolve_with<F>(&self, extension: &str, create: F) -> GestureResult<CapabilityInfo>
    where
        F: FnOnce() -> GestureResult<Option<CapabilityInfo>>,
    {
        let mut slot = self.lock();
        match *slot {
            Some(Entry::Present(info)) => {
                trace!(extension, "capability cache hit");
                return Ok(info);
            }
            Some(Entry::Absent) => return Err(GestureError::not_supported(extension)),
            None => {}
        }

        self.creations.fetch_add(1, Ordering::Relaxed);
        match create()? {
            Some(info) => {
                *slot = Some(Entry::Present(info));
                debug!(
                    extension,
                    major_opcode = info.codes.major_opcode,
                    first_event = info.codes.first_event,
                    first_error = info.codes.first_error,
                    version = ?info.version,
                    "Cached extension capability"
                );
                Ok(info)
            }
            None => {
                *slot = Some(Entry::Absent);
                debug!(extension, "Extension absent, cached");
                Err(GestureError::not_supported(extension))
            }
        }
    }

    /// Returns the cached record without creating one.
    pub fn cached(&self) -> Option<CapabilityInfo> {
        match *self.lock() {
            Some(Entry::Present(info)) => Some(info),
            _ => None,
        }
    }

    /// Returns true if resolution already ran to completion.
    pub fn is_resolved(&self) -> bool {
        self.lock().is_some()
    }

    /// Drops the cached record; the next resolution negotiates again.
    pub fn forget(&self) -> bool {
        let removed = self.lock().take().is_some();
        if removed {
            debug!("Removed capability cache entry");
        }
        removed
    }

    /// Number of times a record was created.
    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Entry>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    fn codes() -> ExtensionCodes {
        ExtensionCodes {
            major_opcode: 140,
            first_event: 64,
            first_error: 128,
        }
    }

    #[test]
    fn resolution_is_idempotent() {
        let registry = CapabilityRegistry::new();
        let info = CapabilityInfo::new(codes()).with_version(ProtocolVersion::new(0, 1, 0));

        let first = registry.resolve_with("GESTURE", || Ok(Some(info))).unwrap();
        let second = registry
            .resolve_with("GESTURE", || panic!("must not create twice"))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.creations(), 1);
        assert_eq!(registry.cached(), Some(info));
    }

    #[test]
    fn absence_is_cached() {
        let registry = CapabilityRegistry::new();

        let err = registry.resolve_with("GESTURE", || Ok(None)).unwrap_err();
        assert!(matches!(err, GestureError::NotSupported { .. }));

        let err = registry
            .resolve_with("GESTURE", || panic!("must not create twice"))
            .unwrap_err();
        assert!(matches!(err, GestureError::NotSupported { .. }));
        assert!(registry.is_resolved());
        assert_eq!(registry.cached(), None);
    }

    #[test]
    fn creation_errors_are_not_cached() {
        let registry = CapabilityRegistry::new();

        let result = registry.resolve_with("GESTURE", || Err(GestureError::Config("boom".into())));
        assert!(result.is_err());
        assert!(!registry.is_resolved());

        let info = registry
            .resolve_with("GESTURE", || Ok(Some(CapabilityInfo::new(codes()))))
            .unwrap();
        assert_eq!(info.codes, codes());
        assert_eq!(registry.creations(), 2);
    }

    #[test]
    fn forget_allows_renegotiation() {
        let registry = CapabilityRegistry::new();
        registry
            .resolve_with("GESTURE", || Ok(Some(CapabilityInfo::new(codes()))))
            .unwrap();

        assert!(registry.forget());
        assert!(!registry.forget());
        assert!(!registry.is_resolved());

        registry
            .resolve_with("GESTURE", || Ok(Some(CapabilityInfo::new(codes()))))
            .unwrap();
        assert_eq!(registry.creations(), 2);
    }

    #[test]
    fn concurrent_resolution_creates_once() {
        let registry = CapabilityRegistry::new();
        let calls = AtomicUsize::new(0);

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    registry
                        .resolve_with("GESTURE", || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(10));
                            Ok(Some(CapabilityInfo::new(codes())))
                        })
                        .unwrap()
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.creations(), 1);
    }

    #[test]
    fn error_names_require_version() {
        let info = CapabilityInfo::new(codes());
        assert!(!info.is_version_supported());
        assert_eq!(info.num_errors, 0);

        let info = info.with_version(ProtocolVersion::new(0, 1, 0));
        assert!(info.is_version_supported());
        assert_eq!(info.num_errors, NUMBER_ERRORS);
        assert_eq!(info.version.unwrap().to_string(), "0.1.0");
    }
}
