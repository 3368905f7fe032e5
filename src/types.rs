//! Core types for mode tables and press handling.

use crate::calibration::Calibration;

/// How long the light was off before this boot, as seen by the off-time capacitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressClass {
    /// The capacitor drained: the light was off for a while.
    Long,

    /// Partially drained: go back one mode or into the hidden modes.
    Medium,

    /// Barely drained: advance to the next mode.
    Short,
}

impl PressClass {
    /// Classifies a raw off-time reading. Higher readings mean shorter off-times.
    ///
    /// Readings below `cap_med` are long presses, readings in
    /// `[cap_med, cap_short)` medium presses and everything else short presses.
    #[inline]
    pub fn classify(signal: u8, calibration: &Calibration) -> Self {
        if signal < calibration.cap_med {
            PressClass::Long
        } else if signal < calibration.cap_short {
            PressClass::Medium
        } else {
            PressClass::Short
        }
    }
}

/// Special-effect and utility modes outside the normal rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Special {
    /// Full output with a timed step-down.
    Turbo,

    /// 10Hz tactical strobe.
    Strobe,

    /// Blinks out the battery level.
    BatteryCheck,

    /// Strobe burst followed by a steady secondary-channel hold.
    Beacon,

    /// Morse SOS.
    Sos,

    /// Records the current temperature as the thermal ceiling, until power is removed.
    TempCalibration,
}

/// What a mode table entry is, fixed when the table is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeKind {
    /// Regular brightness level in the short-press rotation.
    Solid,

    /// Reachable only through medium presses.
    Hidden(Special),
}

/// A single entry in a mode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mode {
    /// Primary channel level (0 = off, 255 = max).
    pub primary: u8,

    /// Secondary channel level.
    pub secondary: u8,

    pub kind: ModeKind,
}

impl Mode {
    /// Creates a solid brightness level.
    #[inline]
    pub const fn solid(primary: u8, secondary: u8) -> Self {
        Self {
            primary,
            secondary,
            kind: ModeKind::Solid,
        }
    }

    /// Creates a hidden mode. Only turbo renders its levels directly.
    #[inline]
    pub const fn hidden(special: Special) -> Self {
        let primary = match special {
            Special::Turbo | Special::TempCalibration => u8::MAX,
            _ => 0,
        };
        Self {
            primary,
            secondary: 0,
            kind: ModeKind::Hidden(special),
        }
    }

    #[inline]
    pub const fn is_solid(&self) -> bool {
        matches!(self.kind, ModeKind::Solid)
    }

    #[inline]
    pub const fn is_hidden(&self) -> bool {
        !self.is_solid()
    }

    /// True for modes that drive the primary channel flat out and are subject
    /// to the turbo timeout.
    #[inline]
    pub const fn is_turbo(&self) -> bool {
        match self.kind {
            ModeKind::Hidden(Special::Turbo) => true,
            ModeKind::Solid => self.primary == u8::MAX,
            ModeKind::Hidden(_) => false,
        }
    }
}

/// Mode table validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeTableError {
    /// No solid modes provided.
    NoSolidModes,

    /// More than [`MAX_MODES`](crate::modes::MAX_MODES) entries in total.
    CapacityExceeded,
}

impl core::fmt::Display for ModeTableError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ModeTableError::NoSolidModes => {
                write!(f, "mode table must have at least one solid mode")
            }
            ModeTableError::CapacityExceeded => {
                write!(f, "mode table capacity exceeded")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ModeTableError {}
