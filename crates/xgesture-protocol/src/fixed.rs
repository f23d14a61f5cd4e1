//! 16.16 signed fixed-point values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 16.16 signed fixed-point number as carried on the wire.
///
/// The stored integer is the real value multiplied by 65536. The raw value
/// is kept so that decoding and re-encoding never loses precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed(pub i32);

impl Fixed {
    /// One in 16.16 representation.
    pub const ONE: Fixed = Fixed(1 << 16);

    /// Returns the raw wire value.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Converts a real value, truncating toward zero.
    pub fn from_f64(value: f64) -> Self {
        Self((value * 65536.0) as i32)
    }

    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / 65536.0
    }
}

impl From<i32> for Fixed {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}
