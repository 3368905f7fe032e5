//! Board calibration and EEPROM layout.
//!
//! The defaults were measured on a FET+1 driver with an off-time capacitor
//! on the star pin. Other boards should measure their own capacitor and
//! voltage-divider readings rather than derive them from theory.

/// Battery voltage thresholds, as raw 8-bit ADC readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryThresholds {
    /// 100% full (4.2V resting).
    pub adc_100: u8,
    /// 75% full (4.0V resting).
    pub adc_75: u8,
    /// 50% full (3.8V resting).
    pub adc_50: u8,
    /// 25% full (3.5V resting).
    pub adc_25: u8,
    /// 0% full (3.0V resting).
    pub adc_0: u8,
    /// Below this the control loop starts counting toward a step-down (2.8V).
    pub adc_low: u8,
    /// Below this the light refuses to start (2.7V).
    pub adc_crit: u8,
}

impl BatteryThresholds {
    /// Battery-check readout boundaries: one extra blink per threshold exceeded.
    #[inline]
    pub const fn readout(&self) -> [u8; 5] {
        [self.adc_0, self.adc_25, self.adc_50, self.adc_75, self.adc_100]
    }

    /// Number of battery-check blinks for a reading (0..=5).
    pub fn readout_blinks(&self, level: u8) -> u8 {
        self.readout().iter().take_while(|&&t| level > t).count() as u8
    }
}

impl Default for BatteryThresholds {
    fn default() -> Self {
        Self {
            adc_100: 170,
            adc_75: 162,
            adc_50: 154,
            adc_25: 141,
            adc_0: 121,
            adc_low: 113,
            adc_crit: 109,
        }
    }
}

/// Per-board constants consumed by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Off-time readings at or above this are short presses.
    pub cap_short: u8,
    /// Off-time readings at or above this (and below `cap_short`) are medium presses.
    pub cap_med: u8,
    pub battery: BatteryThresholds,
    /// Config menu opens once the fast-press tally exceeds this.
    pub fast_press_limit: u8,
    /// Consecutive low-battery or overheat ticks before a step-down.
    pub stepdown_ticks: u8,
    /// Ticks of continuous turbo before the forced step-down.
    pub turbo_timeout: u8,
    /// Time in a mode before lock mode engages.
    pub lock_delay_ms: u32,
    /// Thermal ceiling used while the ceiling cell is still zero.
    pub default_max_temp: u8,
}

impl Calibration {
    /// Checks that the thresholds are ordered so classification is monotonic.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if self.cap_med >= self.cap_short {
            return Err(CalibrationError::ThresholdsOutOfOrder);
        }

        let b = &self.battery;
        let ordered = b.adc_crit <= b.adc_low
            && b.adc_low <= b.adc_0
            && b.adc_0 <= b.adc_25
            && b.adc_25 <= b.adc_50
            && b.adc_50 <= b.adc_75
            && b.adc_75 <= b.adc_100;
        if !ordered {
            return Err(CalibrationError::ThresholdsOutOfOrder);
        }

        if self.stepdown_ticks == 0 {
            return Err(CalibrationError::ZeroStepdownTicks);
        }

        Ok(())
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            cap_short: 230,
            cap_med: 160,
            battery: BatteryThresholds::default(),
            fast_press_limit: 15,
            stepdown_ticks: 8,
            turbo_timeout: 60,
            lock_delay_ms: 3000,
            default_max_temp: 79,
        }
    }
}

/// Calibration validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Capacitor or battery thresholds are not in ascending order.
    ThresholdsOutOfOrder,

    /// A step-down would fire on every tick.
    ZeroStepdownTicks,
}

impl core::fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CalibrationError::ThresholdsOutOfOrder => {
                write!(f, "calibration thresholds must be in ascending order")
            }
            CalibrationError::ZeroStepdownTicks => {
                write!(f, "step-down tick count must be non-zero")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CalibrationError {}

/// Placement of the persisted cells inside a byte-addressable EEPROM.
///
/// Cells `0..mode_cells` form the rotating mode region. The last cell holds
/// the config and the one before it the thermal ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EepromLayout {
    len: u16,
    mode_cells: u16,
}

impl EepromLayout {
    /// ATtiny13: 64 bytes, limited to 63.
    pub const ATTINY13: EepromLayout = EepromLayout { len: 63, mode_cells: 61 };
    /// ATtiny25: 128 bytes, limited to 127.
    pub const ATTINY25: EepromLayout = EepromLayout { len: 127, mode_cells: 125 };
    /// ATtiny85: limited to the 8-bit addressable space.
    pub const ATTINY85: EepromLayout = EepromLayout { len: 255, mode_cells: 253 };

    /// Creates a layout using `len` bytes with `mode_cells` of them rotating.
    ///
    /// # Errors
    /// * `TooSmall` - no room for at least one mode cell plus the two fixed cells
    pub const fn new(len: u16, mode_cells: u16) -> Result<Self, LayoutError> {
        if mode_cells == 0 || mode_cells as u32 + 2 > len as u32 {
            return Err(LayoutError::TooSmall);
        }
        Ok(Self { len, mode_cells })
    }

    /// Total bytes used.
    #[inline]
    pub const fn size(&self) -> u16 {
        self.len
    }

    /// Size of the wear-leveled mode region.
    #[inline]
    pub const fn mode_cells(&self) -> u16 {
        self.mode_cells
    }

    /// Address of the config cell.
    #[inline]
    pub const fn config_cell(&self) -> u16 {
        self.len - 1
    }

    /// Address of the thermal ceiling cell.
    #[inline]
    pub const fn max_temp_cell(&self) -> u16 {
        self.len - 2
    }
}

impl Default for EepromLayout {
    fn default() -> Self {
        EepromLayout::ATTINY13
    }
}

/// EEPROM layout errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayoutError {
    /// The rotating region and fixed cells do not fit.
    TooSmall,
}

impl core::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LayoutError::TooSmall => {
                write!(f, "EEPROM layout needs at least one mode cell plus two fixed cells")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LayoutError {}
