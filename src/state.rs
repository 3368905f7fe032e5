//! Mutable device state threaded through boot and the control loop.

use crate::config::Config;
use crate::modes::ModeTable;
use crate::types::{ModeKind, Special};

/// State that has to survive a brief power-off.
///
/// On hardware this lives in a `.noinit` RAM section: its contents outlast a
/// press of the clicky switch but are garbage after a true cold start. A long
/// press always clears it, and a cold start reads as a long press, so garbage
/// never reaches the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetainedState {
    /// Consecutive short presses, saturating at [`RetainedState::FAST_PRESS_MAX`].
    pub fast_presses: u8,
    /// Mode is locked in (only honored while lock mode is enabled).
    pub locked: bool,
}

impl RetainedState {
    /// Upper bound of the fast-press tally.
    pub const FAST_PRESS_MAX: u8 = 31;

    pub const fn new() -> Self {
        Self {
            fast_presses: 0,
            locked: false,
        }
    }

    /// Counts one more short press.
    #[inline]
    pub fn record_fast_press(&mut self) {
        self.fast_presses = self
            .fast_presses
            .saturating_add(1)
            .min(Self::FAST_PRESS_MAX);
    }
}

/// What the control loop does next, derived from the mode index, the
/// fast-press tally and the calibration flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeState {
    /// A solid level at this index.
    Solid(u8),

    /// A hidden mode at this index.
    Hidden(u8, Special),

    /// The config menu is due.
    ConfigEdit,

    /// Temperature calibration has started and runs until power is removed.
    Calibrating,
}

/// Everything the state machine reads and writes, in one place.
pub struct DeviceState<'r> {
    /// User config, fixed for the session except inside the config menu.
    pub config: Config,
    /// Index into the mode table.
    pub mode_index: u8,
    /// Counters that survive a short power-off.
    pub retained: &'r mut RetainedState,
    /// Consecutive ticks under voltage or over temperature.
    pub lowbatt_ticks: u8,
    /// Ticks spent rendering solid output this session.
    pub ticks: u16,
    /// Thermal ceiling (raw sensor units).
    pub max_temp: u8,
    /// Temperature calibration is running; protection is suspended.
    pub calibrating: bool,
}

impl<'r> DeviceState<'r> {
    /// Fresh session state with mode 0.
    pub fn new(config: Config, retained: &'r mut RetainedState) -> Self {
        Self {
            config,
            mode_index: 0,
            retained,
            lowbatt_ticks: 0,
            ticks: 0,
            max_temp: u8::MAX,
            calibrating: false,
        }
    }

    /// Classifies the current index against the table.
    ///
    /// `fast_press_limit` is the tally above which the config menu takes over.
    /// A running temperature calibration outranks the mode index.
    pub fn mode_state(&self, table: &ModeTable, fast_press_limit: u8) -> ModeState {
        if self.retained.fast_presses > fast_press_limit {
            return ModeState::ConfigEdit;
        }
        if self.calibrating {
            return ModeState::Calibrating;
        }

        let index = table.clamp(self.mode_index);
        match table.kind(index) {
            ModeKind::Solid => ModeState::Solid(index),
            ModeKind::Hidden(special) => ModeState::Hidden(index, special),
        }
    }
}
