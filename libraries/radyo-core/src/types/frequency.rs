//! FM dial position

use crate::error::{RadyoError, Result};
use serde::{Deserialize, Serialize};

/// FM broadcast frequency in the 76.0 - 108.0 MHz band
///
/// Stored as tenths of a MHz so repeated stepping never accumulates
/// floating point error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Frequency(u16);

impl Frequency {
    /// Lowest tunable frequency (76.0 MHz)
    pub const MIN: Self = Self(760);

    /// Highest tunable frequency (108.0 MHz)
    pub const MAX: Self = Self(1080);

    /// Create a frequency from a MHz value, rounded to the nearest 0.1 MHz
    pub fn from_mhz(mhz: f32) -> Result<Self> {
        if !mhz.is_finite() {
            return Err(RadyoError::invalid_input(format!(
                "frequency must be finite, got {mhz}"
            )));
        }

        let tenths = (mhz * 10.0).round();
        if tenths < f32::from(Self::MIN.0) || tenths > f32::from(Self::MAX.0) {
            return Err(RadyoError::invalid_input(format!(
                "frequency {mhz} MHz is outside the FM band ({} - {})",
                Self::MIN,
                Self::MAX
            )));
        }

        Ok(Self(tenths as u16))
    }

    /// Frequency in MHz
    pub fn as_mhz(self) -> f32 {
        f32::from(self.0) / 10.0
    }

    /// Tune up by 0.1 MHz, stopping at the top of the band
    #[must_use]
    pub fn step_up(self) -> Self {
        Self((self.0 + 1).min(Self::MAX.0))
    }

    /// Tune down by 0.1 MHz, stopping at the bottom of the band
    #[must_use]
    pub fn step_down(self) -> Self {
        Self(self.0.saturating_sub(1).max(Self::MIN.0))
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Self::MIN
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{} MHz", self.0 / 10, self.0 % 10)
    }
}

impl TryFrom<f32> for Frequency {
    type Error = RadyoError;

    fn try_from(mhz: f32) -> Result<Self> {
        Self::from_mhz(mhz)
    }
}

impl From<Frequency> for f32 {
    fn from(frequency: Frequency) -> Self {
        frequency.as_mhz()
    }
}
